pub mod config;
pub mod engine_service;
pub mod error;
pub mod extract;
pub mod language;
pub mod orchestrator;
pub mod registry;
pub mod routes;
pub mod state;
pub mod translate;

pub use config::Config;
pub use error::{Result, TranslatorError};
pub use orchestrator::{DocumentUpload, TranslationService};
pub use registry::ModelRegistry;
pub use state::AppState;
