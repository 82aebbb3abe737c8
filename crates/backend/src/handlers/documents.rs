use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use contracts::system::auth::TokenClaims;
use contracts::system::documents::StoredDocument;
use serde_json::json;

use crate::domain::{a004_purchase_order, a005_invoice};
use crate::shared::documents::{processor, repository, storage};
use crate::shared::errors::{ServiceError, ServiceResult};
use crate::system::auth::extractor::CurrentUser;

const OWNER_PURCHASE_ORDER: &str = "purchase_order";
/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;
const OWNER_INVOICE: &str = "invoice";

/// Maps the URL segment to the stored owner type
fn owner_type(segment: &str) -> ServiceResult<&'static str> {
    match segment {
        "purchase-orders" => Ok(OWNER_PURCHASE_ORDER),
        "invoices" => Ok(OWNER_INVOICE),
        other => Err(ServiceError::bad_request(format!(
            "Documents are not supported for {}",
            other
        ))),
    }
}

/// The owning record must exist and be visible to the caller
async fn ensure_owner_visible(owner: &str, owner_id: &str, claims: &TokenClaims) -> ServiceResult<()> {
    let id = uuid::Uuid::parse_str(owner_id).map_err(|_| ServiceError::bad_request("Invalid ID"))?;
    let visible = match owner {
        OWNER_PURCHASE_ORDER => a004_purchase_order::service::get_visible(id, claims)
            .await?
            .is_some(),
        OWNER_INVOICE => a005_invoice::service::get_visible(id, claims).await?.is_some(),
        _ => false,
    };
    if visible {
        Ok(())
    } else {
        Err(ServiceError::not_found("Record not found"))
    }
}

async fn document_for(id: &str, claims: &TokenClaims) -> ServiceResult<StoredDocument> {
    let doc = repository::get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Document not found"))?;
    ensure_owner_visible(&doc.owner_type, &doc.owner_id, claims).await?;
    Ok(doc)
}

struct Upload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Request body limit for upload routes. The file size itself is checked
/// again in `storage::save`.
pub fn body_limit(max_upload_mb: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_upload_mb * 1024 * 1024 + MULTIPART_OVERHEAD)
}

/// Reads the first `file` field of a multipart body
async fn read_upload(multipart: &mut Multipart) -> ServiceResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::bad_request(e.to_string()))?;
        return Ok(Upload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(ServiceError::bad_request("No file provided"))
}

/// POST /api/cpfr/documents/:owner/:id
pub async fn upload(
    CurrentUser(claims): CurrentUser,
    Path((segment, owner_id)): Path<(String, String)>,
    mut multipart: Multipart,
) -> ServiceResult<(StatusCode, Json<StoredDocument>)> {
    let owner = owner_type(&segment)?;
    ensure_owner_visible(owner, &owner_id, &claims).await?;

    let upload = read_upload(&mut multipart).await?;
    let doc = storage::save(
        owner,
        &owner_id,
        &upload.file_name,
        &upload.content_type,
        &upload.bytes,
        &claims.sub,
    )
    .await
    .map_err(|e| ServiceError::bad_request(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// GET /api/cpfr/documents/:owner/:id
pub async fn list(
    CurrentUser(claims): CurrentUser,
    Path((segment, owner_id)): Path<(String, String)>,
) -> ServiceResult<Json<Vec<StoredDocument>>> {
    let owner = owner_type(&segment)?;
    ensure_owner_visible(owner, &owner_id, &claims).await?;
    Ok(Json(repository::list_by_owner(owner, &owner_id).await?))
}

/// GET /api/documents/:id/download
pub async fn download(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> ServiceResult<Response> {
    let doc = document_for(&id, &claims).await?;
    let bytes = storage::read(&doc).await?;
    Response::builder()
        .header(header::CONTENT_TYPE, doc.file_type.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                storage::sanitize_file_name(&doc.file_name)
            ),
        )
        .body(Body::from(bytes))
        .map_err(|e| ServiceError::Internal(e.into()))
}

/// DELETE /api/documents/:id
pub async fn delete(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> ServiceResult<StatusCode> {
    let doc = document_for(&id, &claims).await?;
    if storage::remove(&doc).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServiceError::not_found("Document not found"))
    }
}

/// POST /api/documents/extract
///
/// Parses an uploaded vendor quote and returns the line items found.
pub async fn extract(
    CurrentUser(claims): CurrentUser,
    mut multipart: Multipart,
) -> ServiceResult<Json<serde_json::Value>> {
    let upload = read_upload(&mut multipart).await?;
    let extracted = processor::process(&upload.bytes, &upload.content_type)
        .map_err(|e| ServiceError::bad_request(e.to_string()))?;
    let rows = processor::format_for_database(&extracted, &claims.sub);
    tracing::info!(
        "Extracted {} line items from {}",
        extracted.line_items.len(),
        upload.file_name
    );
    Ok(Json(json!({
        "success": true,
        "fileName": upload.file_name,
        "document": extracted,
        "lineItems": rows,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::post, Extension, Router};
    use contracts::system::users::UserRole;
    use tower::ServiceExt;

    const BOUNDARY: &str = "portal-upload-boundary";

    fn member() -> TokenClaims {
        TokenClaims {
            sub: "user-1".into(),
            username: "member".into(),
            role: UserRole::Member,
            organization_id: Some("org-1".into()),
            exp: usize::MAX,
            iat: 0,
        }
    }

    fn pdf_request(size: usize) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"quote.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend(std::iter::repeat(b'x').take(size));
        body.extend(format!("\r\n--{BOUNDARY}--\r\n").into_bytes());
        Request::post("/extract")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn extract_app(max_upload_mb: usize) -> Router {
        Router::new().route(
            "/extract",
            post(extract)
                .layer::<_, std::convert::Infallible>(body_limit(max_upload_mb))
                .layer(Extension(member())),
        )
    }

    #[tokio::test]
    async fn uploads_above_default_axum_limit_are_accepted() {
        let three_mb = 3 * 1024 * 1024;
        let response = extract_app(25).oneshot(pdf_request(three_mb)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn uploads_above_configured_limit_are_rejected() {
        let two_mb = 2 * 1024 * 1024;
        let response = extract_app(1).oneshot(pdf_request(two_mb)).await.unwrap();
        assert_ne!(response.status(), StatusCode::OK);
    }

    #[test]
    fn owner_segments() {
        assert_eq!(owner_type("purchase-orders").unwrap(), "purchase_order");
        assert_eq!(owner_type("invoices").unwrap(), "invoice");
        assert!(matches!(owner_type("shipments"), Err(ServiceError::BadRequest(_))));
    }
}
