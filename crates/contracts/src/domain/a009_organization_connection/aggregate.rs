use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationConnectionId(pub Uuid);

impl OrganizationConnectionId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for OrganizationConnectionId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(OrganizationConnectionId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    #[default]
    Messaging,
    DataSharing,
    Full,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Messaging => "messaging",
            ConnectionType::DataSharing => "data_sharing",
            ConnectionType::Full => "full",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "data_sharing" => ConnectionType::DataSharing,
            "full" => ConnectionType::Full,
            _ => ConnectionType::Messaging,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Active,
    Suspended,
    Revoked,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Active => "active",
            ConnectionStatus::Suspended => "suspended",
            ConnectionStatus::Revoked => "revoked",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "suspended" => ConnectionStatus::Suspended,
            "revoked" => ConnectionStatus::Revoked,
            _ => ConnectionStatus::Active,
        }
    }
}

/// Directed link granting a source organization access to a target organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConnection {
    #[serde(flatten)]
    pub base: BaseAggregate<OrganizationConnectionId>,

    pub source_organization_id: String,
    pub target_organization_id: String,
    pub connection_type: ConnectionType,
    pub status: ConnectionStatus,
    pub permissions: serde_json::Value,
    pub notes: Option<String>,
}

impl OrganizationConnection {
    pub fn new_for_insert(dto: &OrganizationConnectionDto) -> Self {
        let id = OrganizationConnectionId::new_v4();
        let connection_type = dto.connection_type.unwrap_or_default();
        let code = format!("CON-{}", &id.as_string()[..8]).to_uppercase();
        let description = format!(
            "{} -> {} ({})",
            dto.source_organization_id,
            dto.target_organization_id,
            connection_type.as_str()
        );
        let mut base = BaseAggregate::new(id, code, description);
        base.comment = dto.comment.clone();

        Self {
            base,
            source_organization_id: dto.source_organization_id.clone(),
            target_organization_id: dto.target_organization_id.clone(),
            connection_type,
            status: dto.status.unwrap_or_default(),
            permissions: dto
                .permissions
                .clone()
                .unwrap_or_else(|| serde_json::json!({})),
            notes: dto.notes.clone(),
        }
    }

    pub fn update(&mut self, dto: &OrganizationConnectionDto) {
        if let Some(kind) = dto.connection_type {
            self.connection_type = kind;
        }
        if let Some(status) = dto.status {
            self.status = status;
        }
        if let Some(permissions) = &dto.permissions {
            self.permissions = permissions.clone();
        }
        self.notes = dto.notes.clone();
        self.base.comment = dto.comment.clone();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.source_organization_id.is_empty() || self.target_organization_id.is_empty() {
            return Err("Source and target organizations are required".into());
        }
        if self.source_organization_id == self.target_organization_id {
            return Err("An organization cannot connect to itself".into());
        }
        if !self.permissions.is_object() {
            return Err("Permissions must be an object".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }

    pub fn involves(&self, organization_id: &str) -> bool {
        self.source_organization_id == organization_id
            || self.target_organization_id == organization_id
    }
}

impl AggregateRoot for OrganizationConnection {
    type Id = OrganizationConnectionId;

    fn id(&self) -> Self::Id {
        self.base.id
    }

    fn code(&self) -> &str {
        &self.base.code
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.base.metadata
    }

    fn aggregate_index() -> &'static str {
        "a009"
    }

    fn collection_name() -> &'static str {
        "organization_connection"
    }

    fn element_name() -> &'static str {
        "Organization connection"
    }

    fn list_name() -> &'static str {
        "Organization connections"
    }

    fn origin() -> Origin {
        Origin::Self_
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrganizationConnectionDto {
    pub id: Option<String>,
    pub source_organization_id: String,
    pub target_organization_id: String,
    pub connection_type: Option<ConnectionType>,
    pub status: Option<ConnectionStatus>,
    pub permissions: Option<serde_json::Value>,
    pub notes: Option<String>,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_connection_is_rejected() {
        let connection = OrganizationConnection::new_for_insert(&OrganizationConnectionDto {
            source_organization_id: "a".into(),
            target_organization_id: "a".into(),
            ..Default::default()
        });
        assert!(connection.validate().is_err());
    }

    #[test]
    fn defaults_to_active_messaging() {
        let connection = OrganizationConnection::new_for_insert(&OrganizationConnectionDto {
            source_organization_id: "a".into(),
            target_organization_id: "b".into(),
            ..Default::default()
        });
        assert_eq!(connection.connection_type, ConnectionType::Messaging);
        assert_eq!(connection.status, ConnectionStatus::Active);
        assert!(connection.involves("b"));
        assert!(connection.validate().is_ok());
    }
}
