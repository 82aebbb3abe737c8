use axum::{
    body::Body,
    extract::{Multipart, Path},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use contracts::domain::a010_production_file::aggregate::ProductionFile;

use crate::domain::a010_production_file::service::{self, UploadForm};
use crate::shared::documents::storage;
use crate::shared::errors::{ServiceError, ServiceResult};
use crate::system::auth::extractor::CurrentUser;

fn parse_id(id: &str) -> ServiceResult<uuid::Uuid> {
    uuid::Uuid::parse_str(id).map_err(|_| ServiceError::bad_request("Invalid ID"))
}

/// Collects the `file` part and the known text fields of an upload form
pub async fn read_form(multipart: &mut Multipart) -> ServiceResult<UploadForm> {
    let mut form = UploadForm::default();
    let mut has_file = false;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            form.file_name = field.file_name().unwrap_or("upload").to_string();
            form.content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            form.bytes = field
                .bytes()
                .await
                .map_err(|e| ServiceError::bad_request(e.to_string()))?
                .to_vec();
            has_file = true;
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|e| ServiceError::bad_request(e.to_string()))?;
        let slot = match name.as_str() {
            "fileType" => &mut form.file_type,
            "shipmentNumber" | "bdiShipmentNumber" => &mut form.shipment_number,
            "forecastId" => &mut form.forecast_id,
            "description" => &mut form.description,
            "tags" => &mut form.tags,
            "deviceMetadata" => &mut form.device_metadata,
            "deviceType" => &mut form.device_type,
            "manufacturingDate" => &mut form.manufacturing_date,
            _ => continue,
        };
        *slot = Some(value);
    }
    if !has_file {
        return Err(ServiceError::bad_request("No file provided"));
    }
    Ok(form)
}

/// Attachment response carrying the stored bytes
pub fn file_response(file: &ProductionFile, bytes: Vec<u8>) -> ServiceResult<Response> {
    Response::builder()
        .header(header::CONTENT_TYPE, file.content_type.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                storage::sanitize_file_name(&file.file_name)
            ),
        )
        .body(Body::from(bytes))
        .map_err(|e| ServiceError::Internal(e.into()))
}

/// GET /api/inventory/production-files
pub async fn list(CurrentUser(claims): CurrentUser) -> ServiceResult<Json<Vec<ProductionFile>>> {
    Ok(Json(service::list_for_user(&claims).await?))
}

/// POST /api/inventory/production-files
pub async fn upload(
    CurrentUser(claims): CurrentUser,
    mut multipart: Multipart,
) -> ServiceResult<(StatusCode, Json<serde_json::Value>)> {
    let form = read_form(&mut multipart).await?;
    let file = service::upload_for_user(&claims, &form).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "File uploaded successfully",
            "file": file,
        })),
    ))
}

/// GET /api/inventory/production-files/:id/download
pub async fn download(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> ServiceResult<Response> {
    let (file, bytes) = service::download_for_user(&claims, parse_id(&id)?).await?;
    file_response(&file, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::Request, routing::post, Router};
    use tower::ServiceExt;

    const BOUNDARY: &str = "production-form";

    fn part(name: &str, value: &str) -> String {
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
    }

    async fn echo_form(mut multipart: Multipart) -> ServiceResult<Json<serde_json::Value>> {
        let form = read_form(&mut multipart).await?;
        Ok(Json(serde_json::json!({
            "fileName": form.file_name,
            "contentType": form.content_type,
            "size": form.bytes.len(),
            "shipment": form.shipment_number,
            "deviceType": form.device_type,
            "tags": form.tags,
        })))
    }

    fn request(body: String) -> Request<Body> {
        Request::post("/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn form_fields_are_collected() {
        let mut body = part("shipmentNumber", "BDI-2025-001234");
        body.push_str(&part("deviceType", "Cable Modem"));
        body.push_str(&part("tags", "q1,mtn"));
        body.push_str(&part("unrelated", "ignored"));
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"run.csv\"\r\nContent-Type: text/csv\r\n\r\nserial\nSN1\r\n--{BOUNDARY}--\r\n"
        ));

        let response = Router::new()
            .route("/", post(echo_form))
            .oneshot(request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["fileName"], "run.csv");
        assert_eq!(json["contentType"], "text/csv");
        assert_eq!(json["size"], 10);
        assert_eq!(json["shipment"], "BDI-2025-001234");
        assert_eq!(json["deviceType"], "Cable Modem");
        assert_eq!(json["tags"], "q1,mtn");
    }

    #[tokio::test]
    async fn form_without_file_is_rejected() {
        let mut body = part("description", "no file");
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        let response = Router::new()
            .route("/", post(echo_form))
            .oneshot(request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
