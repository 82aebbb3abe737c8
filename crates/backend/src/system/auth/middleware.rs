use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use contracts::system::auth::TokenClaims;

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn claims_from_headers(headers: &HeaderMap) -> Result<TokenClaims, StatusCode> {
    let token = bearer_token(headers).ok_or(StatusCode::UNAUTHORIZED)?;
    super::jwt::validate_token(&token)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

/// Requires a valid access token; claims are stored in request extensions
pub async fn require_auth(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let claims = claims_from_headers(req.headers()).await?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Requires an admin or super_admin access token
pub async fn require_admin(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let claims = claims_from_headers(req.headers()).await?;
    if !claims.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Requires a partner API key; the resolved key context is stored in request extensions
pub async fn require_api_key(mut req: Request<Body>, next: Next) -> Result<Response, Response> {
    use axum::response::IntoResponse;
    use axum::Json;

    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let context = match super::api_key::authenticate(header.as_deref()).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::warn!("API key rejected: {}", e);
            let status = match e {
                super::api_key::ApiKeyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                super::api_key::ApiKeyError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            };
            return Err((
                status,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response());
        }
    };

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    fn guarded() -> Router {
        Router::new()
            .route("/user", get(|| async { "ok" }))
            .layer(middleware::from_fn(require_auth))
            .merge(
                Router::new()
                    .route("/partner", get(|| async { "ok" }))
                    .layer(middleware::from_fn(require_api_key)),
            )
            .merge(
                Router::new()
                    .route("/admin", get(|| async { "ok" }))
                    .layer(middleware::from_fn(require_admin)),
            )
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert("Authorization", "Token abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
        headers.insert("Authorization", "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn requests_without_token_are_unauthorized() {
        for path in ["/user", "/admin", "/partner"] {
            let response = guarded()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", path);
        }
    }
}
