pub mod api;
pub mod api_keys;
pub mod auth;
pub mod initialization;
pub mod middleware;
pub mod tracing;
pub mod users;
pub mod whatsapp_config;
