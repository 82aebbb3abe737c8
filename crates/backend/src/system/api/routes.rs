use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use super::handlers;
use crate::system::auth;

/// Auth, user, API key and WhatsApp configuration routes
pub fn configure_system_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // Auth (public)
        .route("/api/system/auth/login", post(handlers::auth::login))
        .route("/api/system/auth/refresh", post(handlers::auth::refresh))
        .route("/api/system/auth/logout", post(handlers::auth::logout))
        .route(
            "/api/system/auth/me",
            get(handlers::auth::current_user)
                .layer(middleware::from_fn(auth::middleware::require_auth)),
        )
        // Users (admin)
        .route(
            "/api/system/users",
            get(handlers::users::list)
                .post(handlers::users::create)
                .layer(middleware::from_fn(auth::middleware::require_admin)),
        )
        .route(
            "/api/system/users/:id",
            get(handlers::users::get_by_id)
                .put(handlers::users::update)
                .delete(handlers::users::delete)
                .layer(middleware::from_fn(auth::middleware::require_admin)),
        )
        .route(
            "/api/system/users/:id/change-password",
            post(handlers::users::change_password)
                .layer(middleware::from_fn(auth::middleware::require_auth)),
        )
        .route(
            "/api/user/language",
            put(handlers::users::set_language)
                .layer(middleware::from_fn(auth::middleware::require_auth)),
        )
        // Partner API keys (admin)
        .route(
            "/api/system/api-keys",
            get(handlers::api_keys::list)
                .post(handlers::api_keys::create)
                .layer(middleware::from_fn(auth::middleware::require_admin)),
        )
        .route(
            "/api/system/api-keys/:id",
            delete(handlers::api_keys::deactivate)
                .layer(middleware::from_fn(auth::middleware::require_admin)),
        )
        // WhatsApp sender settings (admin)
        .route(
            "/api/admin/whatsapp-config",
            get(handlers::whatsapp_config::get)
                .put(handlers::whatsapp_config::upsert)
                .layer(middleware::from_fn(auth::middleware::require_admin)),
        )
        .route(
            "/api/admin/whatsapp-config/test",
            post(handlers::whatsapp_config::send_test)
                .layer(middleware::from_fn(auth::middleware::require_admin)),
        )
}
