use crate::shared::config::env_secret;

use super::types::{AmazonCredentials, ConfigStatus, SpApiError};

const REQUIRED_VARS: [&str; 5] = [
    "AMAZON_CLIENT_ID",
    "AMAZON_CLIENT_SECRET",
    "AMAZON_REFRESH_TOKEN",
    "AMAZON_ACCESS_KEY",
    "AMAZON_SECRET_KEY",
];

pub fn from_env() -> Result<AmazonCredentials, SpApiError> {
    from_lookup(env_secret)
}

pub fn config_status() -> ConfigStatus {
    status_from_lookup(env_secret)
}

fn from_lookup<F>(lookup: F) -> Result<AmazonCredentials, SpApiError>
where
    F: Fn(&str) -> Option<String>,
{
    let status = status_from_lookup(&lookup);
    if !status.configured {
        return Err(SpApiError::new(
            "CREDENTIALS_MISSING",
            format!(
                "Missing required Amazon SP-API credentials. Please set: {}",
                status.missing_fields.join(", ")
            ),
        ));
    }

    let get = |name: &str| lookup(name).unwrap_or_default();
    Ok(AmazonCredentials {
        client_id: get("AMAZON_CLIENT_ID"),
        client_secret: get("AMAZON_CLIENT_SECRET"),
        refresh_token: get("AMAZON_REFRESH_TOKEN"),
        access_key: get("AMAZON_ACCESS_KEY"),
        secret_key: get("AMAZON_SECRET_KEY"),
        region: lookup("AMAZON_REGION").unwrap_or_else(|| "us-east-1".to_string()),
        seller_id: lookup("AMAZON_SELLER_ID"),
    })
}

fn status_from_lookup<F>(lookup: F) -> ConfigStatus
where
    F: Fn(&str) -> Option<String>,
{
    let missing_fields: Vec<String> = REQUIRED_VARS
        .iter()
        .copied()
        .filter(|name| lookup(*name).is_none())
        .map(|name| name.to_string())
        .collect();
    ConfigStatus {
        configured: missing_fields.is_empty(),
        missing_fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reports_missing_fields() {
        let vars = env(&[("AMAZON_CLIENT_ID", "id"), ("AMAZON_SECRET_KEY", "s")]);
        let status = status_from_lookup(|k| vars.get(k).cloned());
        assert!(!status.configured);
        assert_eq!(
            status.missing_fields,
            vec!["AMAZON_CLIENT_SECRET", "AMAZON_REFRESH_TOKEN", "AMAZON_ACCESS_KEY"]
        );

        let err = from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.message.contains("AMAZON_REFRESH_TOKEN"));
    }

    #[test]
    fn region_defaults_to_us_east() {
        let vars = env(&[
            ("AMAZON_CLIENT_ID", "id"),
            ("AMAZON_CLIENT_SECRET", "secret"),
            ("AMAZON_REFRESH_TOKEN", "Atzr|x"),
            ("AMAZON_ACCESS_KEY", "AKID"),
            ("AMAZON_SECRET_KEY", "sk"),
        ]);
        let creds = from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(creds.region, "us-east-1");
        assert!(creds.seller_id.is_none());
    }
}
