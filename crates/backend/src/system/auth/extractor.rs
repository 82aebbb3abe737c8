use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use contracts::system::api_keys::ApiKeyContext;
use contracts::system::auth::TokenClaims;

/// Claims of the signed-in user, set by `require_auth` / `require_admin`.
/// Usage: `async fn handler(CurrentUser(claims): CurrentUser)`
pub struct CurrentUser(pub TokenClaims);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TokenClaims>()
            .cloned()
            .map(CurrentUser)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// Partner key context, set by `require_api_key`
pub struct CurrentApiKey(pub ApiKeyContext);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentApiKey
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ApiKeyContext>()
            .cloned()
            .map(CurrentApiKey)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
