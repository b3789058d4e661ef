use axum::{
    extract::{
        multipart::MultipartError, rejection::JsonRejection, DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::TranslatorError;
use crate::orchestrator::DocumentUpload;
use crate::state::AppState;
use crate::translate::{TranslationRequest, TranslationResponse};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/translate", post(translate))
        .route("/translate-file", post(translate_file))
        .route("/languages", get(list_languages))
        .route("/health", get(health_check))
}

/// Full application with middleware and state attached
pub fn build_app(state: AppState) -> Router {
    let max_upload_bytes = state.config.translation_config.max_upload_bytes;
    Router::new()
        .merge(create_routes())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn translate(
    State(state): State<AppState>,
    payload: Result<Json<TranslationRequest>, JsonRejection>,
) -> Result<Json<TranslationResponse>, TranslatorError> {
    let Json(request) = payload.map_err(|e| TranslatorError::InvalidRequest(e.body_text()))?;
    let response = state.translation.translate_text(request).await?;
    Ok(Json(response))
}

async fn translate_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TranslationResponse>, TranslatorError> {
    let upload = read_upload(&mut multipart).await?;
    let response = state.translation.translate_document(upload).await?;
    Ok(Json(response))
}

/// Collect the `file` part (and an optional `from_lang` part) of a multipart body
async fn read_upload(multipart: &mut Multipart) -> Result<DocumentUpload, TranslatorError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut from_lang = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(upload_error)?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(upload_error)?;
                file = Some((filename, data.to_vec()));
            }
            "from_lang" => {
                let value = field
                    .text()
                    .await
                    .map_err(upload_error)?;
                from_lang = Some(value);
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or(TranslatorError::MissingFile)?;
    Ok(DocumentUpload {
        filename,
        bytes,
        from_lang,
    })
}

fn upload_error(err: MultipartError) -> TranslatorError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        TranslatorError::PayloadTooLarge
    } else {
        TranslatorError::InvalidUpload(err.body_text())
    }
}

async fn list_languages(State(state): State<AppState>) -> Result<Json<Value>, TranslatorError> {
    let installed = state.registry.installed_languages().await?;
    let available = state.registry.available_packages().await?;
    Ok(Json(json!({
        "supported": state.translation.supported_languages(),
        "target": state.translation.default_target(),
        "installed": installed,
        "available": available,
    })))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let engine_healthy = state.engine.health_check().await.unwrap_or(false);
    Json(json!({
        "status": "ok",
        "engine": engine_healthy
    }))
}
