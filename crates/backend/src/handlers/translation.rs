use axum::{http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

use crate::shared::llm::openai_provider::OpenAiProvider;
use crate::shared::llm::translation::{
    BatchTranslationRequest, TranslationError, TranslationRequest, TranslationResponse,
    Translator,
};

type ApiError = (StatusCode, Json<serde_json::Value>);

fn error_response(e: TranslationError) -> ApiError {
    let status = match e {
        TranslationError::InvalidLanguage => StatusCode::BAD_REQUEST,
        TranslationError::EmptyResponse | TranslationError::Provider(_) => {
            tracing::error!("Translation error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({"error": e.to_string()})))
}

fn translator() -> Result<Translator, ApiError> {
    let provider = OpenAiProvider::from_env().map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": e.to_string()})),
        )
    })?;
    Ok(Translator::new(Arc::new(provider)))
}

/// POST /api/translate
pub async fn translate(
    Json(request): Json<TranslationRequest>,
) -> Result<Json<TranslationResponse>, ApiError> {
    if request.text.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Text is required"})),
        ));
    }
    translator()?
        .translate(
            &request.text,
            &request.from_language,
            &request.to_language,
            request.context,
        )
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /api/translate/batch
pub async fn translate_batch(
    Json(request): Json<BatchTranslationRequest>,
) -> Result<Json<Vec<TranslationResponse>>, ApiError> {
    translator()?
        .translate_batch(
            &request.texts,
            &request.from_language,
            &request.to_language,
            request.context,
        )
        .await
        .map(Json)
        .map_err(error_response)
}
