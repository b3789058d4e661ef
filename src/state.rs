use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::engine_service::EngineServiceClient;
use crate::extract::{DocumentExtractor, TextExtractor};
use crate::orchestrator::TranslationService;
use crate::registry::ModelRegistry;
use crate::translate::{LanguageDetector, TranslationEngine};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<dyn TranslationEngine>,
    pub registry: Arc<ModelRegistry>,
    pub translation: Arc<TranslationService>,
}

impl AppState {
    /// Wire the service against the engine sidecar named in the config
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = Arc::new(EngineServiceClient::from_config(&config.engine_config)?);
        let engine: Arc<dyn TranslationEngine> = client.clone();
        let detector: Arc<dyn LanguageDetector> = client;
        Self::with_components(config, engine, detector, Arc::new(DocumentExtractor::new()))
    }

    pub fn with_components(
        config: Config,
        engine: Arc<dyn TranslationEngine>,
        detector: Arc<dyn LanguageDetector>,
        extractor: Arc<dyn TextExtractor>,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let registry = Arc::new(ModelRegistry::new(
            engine.clone(),
            Duration::from_secs(config.engine_config.install_timeout_secs),
        ));
        let translation = Arc::new(TranslationService::new(
            registry.clone(),
            engine.clone(),
            detector,
            extractor,
            config.supported_languages()?,
            config.target_language()?,
            Duration::from_secs(config.engine_config.request_timeout_secs),
        ));

        Ok(Self {
            config: Arc::new(config),
            engine,
            registry,
            translation,
        })
    }
}
