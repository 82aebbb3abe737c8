use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Member,
    Sales,
    Admin,
    SuperAdmin,
    Developer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Member => "member",
            UserRole::Sales => "sales",
            UserRole::Admin => "admin",
            UserRole::SuperAdmin => "super_admin",
            UserRole::Developer => "developer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "member" => Some(UserRole::Member),
            "sales" => Some(UserRole::Sales),
            "admin" => Some(UserRole::Admin),
            "super_admin" => Some(UserRole::SuperAdmin),
            "developer" => Some(UserRole::Developer),
            _ => None,
        }
    }
}

/// Role inside the user's organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationRole {
    Owner,
    Admin,
    #[default]
    Member,
    Viewer,
}

impl OrganizationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationRole::Owner => "owner",
            OrganizationRole::Admin => "admin",
            OrganizationRole::Member => "member",
            OrganizationRole::Viewer => "viewer",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "owner" => OrganizationRole::Owner,
            "admin" => OrganizationRole::Admin,
            "viewer" => OrganizationRole::Viewer,
            _ => OrganizationRole::Member,
        }
    }
}

pub const SUPPORTED_LANGUAGES: [&str; 4] = ["en", "zh", "vi", "es"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub organization_id: Option<String>,
    pub organization_role: OrganizationRole,
    pub preferred_language: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub last_login_at: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserDto {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    pub organization_id: Option<String>,
    #[serde(default)]
    pub organization_role: OrganizationRole,
    pub preferred_language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserDto {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub organization_id: Option<String>,
    pub organization_role: OrganizationRole,
    pub preferred_language: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordDto {
    pub user_id: String,
    pub old_password: Option<String>, // None when a super admin resets someone else's password
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguagePreferenceDto {
    pub preferred_language: String,
}
