pub mod api_keys;
pub mod auth;
pub mod users;
pub mod whatsapp_config;
