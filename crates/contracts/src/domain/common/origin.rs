use serde::{Deserialize, Serialize};

/// Where an aggregate's data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Supplied by a partner organization (factory uploads, API key access)
    #[serde(rename = "partner")]
    Partner,
    /// Created in the portal
    #[serde(rename = "self")]
    Self_,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Partner => "partner",
            Origin::Self_ => "self",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_lowercase_names() {
        assert_eq!(serde_json::to_string(&Origin::Partner).unwrap(), "\"partner\"");
        assert_eq!(serde_json::to_string(&Origin::Self_).unwrap(), "\"self\"");
        assert_eq!(Origin::Partner.to_string(), Origin::Partner.as_str());
    }
}
