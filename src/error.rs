use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

use crate::language::{LanguageCode, LanguagePair, SupportedLanguages};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageRole {
    Source,
    Target,
}

impl fmt::Display for LanguageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageRole::Source => f.write_str("source"),
            LanguageRole::Target => f.write_str("target"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("Unsupported file type. Upload .txt or .pdf only.")]
    UnsupportedFileType,

    #[error("No extractable text found in the file.")]
    EmptyExtraction,

    #[error("No file provided")]
    MissingFile,

    #[error("Text must not be empty")]
    EmptyText,

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Upload exceeds the maximum allowed size")]
    PayloadTooLarge,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported {role} language '{code}'. Supported: {supported}")]
    UnsupportedLanguage {
        role: LanguageRole,
        code: LanguageCode,
        supported: SupportedLanguages,
    },

    #[error("No translation model found for {0}")]
    ModelNotFound(LanguagePair),

    #[error("Language pair {0} not found after installation")]
    InstallationInconsistency(LanguagePair),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Language detection failed: {0}")]
    Detection(String),

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Translation engine error: {0}")]
    Engine(String),

    #[error("Timed out during {stage}")]
    Timeout { stage: &'static str },
}

impl TranslatorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TranslatorError::UnsupportedFileType
            | TranslatorError::EmptyExtraction
            | TranslatorError::MissingFile
            | TranslatorError::EmptyText
            | TranslatorError::InvalidUpload(_)
            | TranslatorError::InvalidRequest(_)
            | TranslatorError::UnsupportedLanguage { .. } => StatusCode::BAD_REQUEST,
            TranslatorError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            TranslatorError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TranslatorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.to_string();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, detail);
        } else {
            warn!("Rejected request ({}): {}", status, detail);
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, TranslatorError>;
