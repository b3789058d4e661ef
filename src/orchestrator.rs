use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::{LanguageRole, Result, TranslatorError};
use crate::extract::{DocumentKind, TextExtractor};
use crate::language::{LanguageCode, LanguagePair, SupportedLanguages};
use crate::registry::{find_installed, ModelRegistry};
use crate::translate::{LanguageDetector, TranslationEngine, TranslationRequest, TranslationResponse};

/// Per-request lifecycle. Every request walks these in order; any step may end it with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Received,
    Extracted,
    LanguageResolved,
    ModelEnsured,
    Translated,
    Responded,
}

/// File received through `/translate-file`
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub from_lang: Option<String>,
}

struct Lifecycle {
    stage: RequestStage,
}

impl Lifecycle {
    fn start() -> Self {
        debug!("stage: {:?}", RequestStage::Received);
        Self {
            stage: RequestStage::Received,
        }
    }

    fn advance(&mut self, next: RequestStage) {
        debug!("stage: {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    fn fail(&self, err: TranslatorError) -> TranslatorError {
        debug!("stage: {:?} -> Errored ({})", self.stage, err);
        err
    }
}

/// Runs extraction, language resolution, model installation and translation for each request
pub struct TranslationService {
    registry: Arc<ModelRegistry>,
    engine: Arc<dyn TranslationEngine>,
    detector: Arc<dyn LanguageDetector>,
    extractor: Arc<dyn TextExtractor>,
    supported: SupportedLanguages,
    default_target: LanguageCode,
    request_timeout: Duration,
}

impl TranslationService {
    pub fn new(
        registry: Arc<ModelRegistry>,
        engine: Arc<dyn TranslationEngine>,
        detector: Arc<dyn LanguageDetector>,
        extractor: Arc<dyn TextExtractor>,
        supported: SupportedLanguages,
        default_target: LanguageCode,
        request_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            engine,
            detector,
            extractor,
            supported,
            default_target,
            request_timeout,
        }
    }

    pub fn supported_languages(&self) -> &SupportedLanguages {
        &self.supported
    }

    pub fn default_target(&self) -> &LanguageCode {
        &self.default_target
    }

    /// Translate text given directly in the request body
    pub async fn translate_text(&self, request: TranslationRequest) -> Result<TranslationResponse> {
        let span = info_span!("translate", request_id = %Uuid::new_v4());
        async move {
            let mut lifecycle = Lifecycle::start();
            if request.text.trim().is_empty() {
                return Err(lifecycle.fail(TranslatorError::EmptyText));
            }
            lifecycle.advance(RequestStage::Extracted);

            let target = match request.to_lang.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                Some(code) => LanguageCode::normalize(code),
                None => self.default_target.clone(),
            };
            let translated = self
                .run(&mut lifecycle, &request.text, request.from_lang.as_deref(), target)
                .await
                .map_err(|e| lifecycle.fail(e))?;

            lifecycle.advance(RequestStage::Responded);
            Ok::<_, TranslatorError>(TranslationResponse {
                original_text: request.text,
                translated_text: translated,
            })
        }
        .instrument(span)
        .await
    }

    /// Extract the text of an uploaded document and translate it into the default target
    pub async fn translate_document(&self, upload: DocumentUpload) -> Result<TranslationResponse> {
        let span = info_span!(
            "translate_file",
            request_id = %Uuid::new_v4(),
            filename = %upload.filename
        );
        async move {
            let mut lifecycle = Lifecycle::start();
            let kind = DocumentKind::from_filename(&upload.filename)
                .ok_or_else(|| lifecycle.fail(TranslatorError::UnsupportedFileType))?;

            let text = self
                .extract(upload.bytes, kind)
                .await
                .map_err(|e| lifecycle.fail(e))?;
            if text.trim().is_empty() {
                return Err(lifecycle.fail(TranslatorError::EmptyExtraction));
            }
            lifecycle.advance(RequestStage::Extracted);

            let target = self.default_target.clone();
            let translated = self
                .run(&mut lifecycle, &text, upload.from_lang.as_deref(), target)
                .await
                .map_err(|e| lifecycle.fail(e))?;

            lifecycle.advance(RequestStage::Responded);
            Ok::<_, TranslatorError>(TranslationResponse {
                original_text: text,
                translated_text: translated,
            })
        }
        .instrument(span)
        .await
    }

    async fn extract(&self, bytes: Vec<u8>, kind: DocumentKind) -> Result<String> {
        let extractor = self.extractor.clone();
        tokio::task::spawn_blocking(move || extractor.extract(&bytes, kind))
            .await
            .map_err(|e| TranslatorError::Extraction(format!("extractor aborted: {}", e)))?
            .map_err(|e| TranslatorError::Extraction(e.to_string()))
    }

    async fn run(
        &self,
        lifecycle: &mut Lifecycle,
        text: &str,
        declared_source: Option<&str>,
        target: LanguageCode,
    ) -> Result<String> {
        let source = self.resolve_source(declared_source, text).await?;
        self.check_supported(&source, LanguageRole::Source)?;
        self.check_supported(&target, LanguageRole::Target)?;
        lifecycle.advance(RequestStage::LanguageResolved);
        info!("Translating {} → {}", source, target);

        if source == target {
            lifecycle.advance(RequestStage::ModelEnsured);
            lifecycle.advance(RequestStage::Translated);
            return Ok(text.to_string());
        }

        self.registry.ensure_model_installed(&source, &target).await?;
        lifecycle.advance(RequestStage::ModelEnsured);

        let translated = self.translate_with_installed(text, &source, &target).await?;
        lifecycle.advance(RequestStage::Translated);
        Ok(translated)
    }

    async fn resolve_source(&self, declared: Option<&str>, text: &str) -> Result<LanguageCode> {
        let raw = match declared.map(str::trim).filter(|s| !s.is_empty()) {
            Some(code) => code.to_string(),
            None => {
                let detected = tokio::time::timeout(self.request_timeout, self.detector.detect(text))
                    .await
                    .map_err(|_| TranslatorError::Timeout {
                        stage: "language detection",
                    })?
                    .map_err(|e| TranslatorError::Detection(e.to_string()))?;
                debug!("Detected source language: {}", detected);
                detected
            }
        };
        Ok(LanguageCode::normalize(&raw))
    }

    fn check_supported(&self, code: &LanguageCode, role: LanguageRole) -> Result<()> {
        if self.supported.contains(code) {
            Ok(())
        } else {
            Err(TranslatorError::UnsupportedLanguage {
                role,
                code: code.clone(),
                supported: self.supported.clone(),
            })
        }
    }

    async fn translate_with_installed(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String> {
        let installed = self.registry.installed_languages().await?;
        let (source_lang, target_lang) =
            match (find_installed(&installed, source), find_installed(&installed, target)) {
                (Some(s), Some(t)) => (s, t),
                _ => {
                    return Err(TranslatorError::InstallationInconsistency(LanguagePair::new(
                        source.clone(),
                        target.clone(),
                    )))
                }
            };

        let translator = self.engine.translator(source_lang, target_lang);
        tokio::time::timeout(self.request_timeout, translator.translate(text))
            .await
            .map_err(|_| TranslatorError::Timeout {
                stage: "translation",
            })?
            .map_err(|e| TranslatorError::Translation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::document::blank_page_pdf;
    use crate::extract::DocumentExtractor;
    use crate::registry::testing::FakeEngine;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedDetector {
        language: String,
        calls: AtomicUsize,
    }

    impl FixedDetector {
        fn new(language: &str) -> Self {
            Self {
                language: language.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LanguageDetector for FixedDetector {
        async fn detect(&self, _text: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.language.clone())
        }
    }

    /// Treats every upload as UTF-8 text regardless of kind
    struct PlainExtractor;

    impl TextExtractor for PlainExtractor {
        fn extract(&self, bytes: &[u8], _kind: DocumentKind) -> anyhow::Result<String> {
            Ok(String::from_utf8_lossy(bytes).trim().to_string())
        }
    }

    struct SlowDetector {
        delay: Duration,
    }

    #[async_trait]
    impl LanguageDetector for SlowDetector {
        async fn detect(&self, _text: &str) -> anyhow::Result<String> {
            tokio::time::sleep(self.delay).await;
            Ok("fr".to_string())
        }
    }

    fn service(engine: Arc<FakeEngine>, detector: Arc<FixedDetector>) -> TranslationService {
        service_with(engine, detector, Arc::new(PlainExtractor), Duration::from_secs(5))
    }

    fn service_with(
        engine: Arc<FakeEngine>,
        detector: Arc<dyn LanguageDetector>,
        extractor: Arc<dyn TextExtractor>,
        request_timeout: Duration,
    ) -> TranslationService {
        let registry = Arc::new(ModelRegistry::new(engine.clone(), Duration::from_secs(5)));
        TranslationService::new(
            registry,
            engine,
            detector,
            extractor,
            SupportedLanguages::default(),
            LanguageCode::parse("en").unwrap(),
            request_timeout,
        )
    }

    fn text_request(text: &str, from_lang: Option<&str>) -> TranslationRequest {
        TranslationRequest {
            text: text.to_string(),
            from_lang: from_lang.map(|s| s.to_string()),
            to_lang: None,
        }
    }

    fn upload(filename: &str, content: &str) -> DocumentUpload {
        DocumentUpload {
            filename: filename.to_string(),
            bytes: content.as_bytes().to_vec(),
            from_lang: None,
        }
    }

    #[tokio::test]
    async fn test_declared_source_skips_detection() {
        let engine = Arc::new(FakeEngine::new(&[], &[("fr", "en")]));
        let detector = Arc::new(FixedDetector::new("es"));
        let service = service(engine.clone(), detector.clone());

        let response = service
            .translate_text(text_request("Bonjour le monde", Some("fr")))
            .await
            .unwrap();
        assert_eq!(response.original_text, "Bonjour le monde");
        assert_eq!(response.translated_text, "[fr->en] Bonjour le monde");
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.install_count(), 1);
    }

    #[tokio::test]
    async fn test_detected_locale_is_normalized() {
        let engine = Arc::new(FakeEngine::new(&[("es", "en")], &[]));
        let detector = Arc::new(FixedDetector::new("es-MX"));
        let service = service(engine, detector.clone());

        let response = service.translate_text(text_request("Hola mundo", None)).await.unwrap();
        assert_eq!(response.translated_text, "[es->en] Hola mundo");
        assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_uppercase_declared_source() {
        let engine = Arc::new(FakeEngine::new(&[("fr", "en")], &[]));
        let service = service(engine, Arc::new(FixedDetector::new("en")));

        let response = service.translate_text(text_request("Salut", Some("FR"))).await.unwrap();
        assert_eq!(response.translated_text, "[fr->en] Salut");
    }

    #[tokio::test]
    async fn test_empty_declared_source_falls_back_to_detection() {
        let engine = Arc::new(FakeEngine::new(&[("ja", "en")], &[]));
        let detector = Arc::new(FixedDetector::new("ja"));
        let service = service(engine, detector.clone());

        service.translate_text(text_request("こんにちは", Some(""))).await.unwrap();
        assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsupported_source_lists_allow_list() {
        let engine = Arc::new(FakeEngine::new(&[], &[("de", "en")]));
        let service = service(engine.clone(), Arc::new(FixedDetector::new("en")));

        let err = service
            .translate_text(text_request("Hallo Welt", Some("de")))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'de'"));
        assert!(message.contains("[en, fr, es, ja]"));
        assert_eq!(engine.install_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_target() {
        let engine = Arc::new(FakeEngine::new(&[], &[]));
        let service = service(engine, Arc::new(FixedDetector::new("en")));

        let mut request = text_request("Bonjour", Some("fr"));
        request.to_lang = Some("zh".to_string());
        let err = service.translate_text(request).await.unwrap_err();
        assert!(matches!(
            err,
            TranslatorError::UnsupportedLanguage {
                role: LanguageRole::Target,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_explicit_target_language() {
        let engine = Arc::new(FakeEngine::new(&[], &[("en", "ja")]));
        let service = service(engine, Arc::new(FixedDetector::new("en")));

        let mut request = text_request("Good morning", None);
        request.to_lang = Some("ja".to_string());
        let response = service.translate_text(request).await.unwrap();
        assert_eq!(response.translated_text, "[en->ja] Good morning");
    }

    #[tokio::test]
    async fn test_same_language_is_returned_unchanged() {
        let engine = Arc::new(FakeEngine::new(&[], &[]));
        let service = service(engine.clone(), Arc::new(FixedDetector::new("en-US")));

        let response = service.translate_text(text_request("Hello", None)).await.unwrap();
        assert_eq!(response.translated_text, "Hello");
        assert_eq!(engine.install_count(), 0);
    }

    #[tokio::test]
    async fn test_model_not_found_propagates() {
        let engine = Arc::new(FakeEngine::new(&[], &[]));
        let service = service(engine, Arc::new(FixedDetector::new("en")));

        let err = service
            .translate_text(text_request("Bonjour", Some("fr")))
            .await
            .unwrap_err();
        assert!(matches!(err, TranslatorError::ModelNotFound(_)));
    }

    #[tokio::test]
    async fn test_installation_inconsistency() {
        let mut engine = FakeEngine::new(&[], &[("fr", "en")]);
        engine.install_is_noop = true;
        let service = service(Arc::new(engine), Arc::new(FixedDetector::new("en")));

        let err = service
            .translate_text(text_request("Bonjour", Some("fr")))
            .await
            .unwrap_err();
        assert!(matches!(err, TranslatorError::InstallationInconsistency(_)));
        assert!(err.to_string().contains("fr → en"));
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        let engine = Arc::new(FakeEngine::new(&[], &[]));
        let detector = Arc::new(FixedDetector::new("en"));
        let service = service(engine, detector.clone());

        let err = service.translate_text(text_request("   ", None)).await.unwrap_err();
        assert!(matches!(err, TranslatorError::EmptyText));
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_document_detects_and_translates() {
        let engine = Arc::new(FakeEngine::new(&[], &[("es", "en")]));
        let service = service(engine, Arc::new(FixedDetector::new("es")));

        let response = service
            .translate_document(upload("saludo.TXT", "  Hola mundo \n"))
            .await
            .unwrap();
        assert_eq!(response.original_text, "Hola mundo");
        assert_eq!(response.translated_text, "[es->en] Hola mundo");
    }

    #[tokio::test]
    async fn test_document_unsupported_extension() {
        let engine = Arc::new(FakeEngine::new(&[], &[]));
        let detector = Arc::new(FixedDetector::new("en"));
        let service = service(engine, detector.clone());

        let err = service
            .translate_document(upload("report.docx", "text"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranslatorError::UnsupportedFileType));
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_document_without_text() {
        let engine = Arc::new(FakeEngine::new(&[], &[]));
        let service = service(engine, Arc::new(FixedDetector::new("en")));

        let err = service
            .translate_document(upload("scan.pdf", " \n\t "))
            .await
            .unwrap_err();
        assert!(matches!(err, TranslatorError::EmptyExtraction));
    }

    #[tokio::test]
    async fn test_blank_pdf_page_is_empty_extraction() {
        let engine = Arc::new(FakeEngine::new(&[], &[]));
        let detector = Arc::new(FixedDetector::new("en"));
        let service = service_with(
            engine,
            detector.clone(),
            Arc::new(DocumentExtractor::new()),
            Duration::from_secs(5),
        );

        let upload = DocumentUpload {
            filename: "scan.pdf".to_string(),
            bytes: blank_page_pdf(),
            from_lang: None,
        };
        let err = service.translate_document(upload).await.unwrap_err();
        assert!(matches!(err, TranslatorError::EmptyExtraction));
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_slow_detection_times_out() {
        let engine = Arc::new(FakeEngine::new(&[("fr", "en")], &[]));
        let detector = Arc::new(SlowDetector {
            delay: Duration::from_millis(200),
        });
        let service = service_with(
            engine,
            detector,
            Arc::new(PlainExtractor),
            Duration::from_millis(20),
        );

        let err = service.translate_text(text_request("Bonjour", None)).await.unwrap_err();
        assert!(matches!(
            err,
            TranslatorError::Timeout {
                stage: "language detection"
            }
        ));
        assert_eq!(err.status_code(), axum::http::StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_slow_translation_times_out() {
        let mut engine = FakeEngine::new(&[("fr", "en")], &[]);
        engine.translate_delay = Duration::from_millis(200);
        let service = service_with(
            Arc::new(engine),
            Arc::new(FixedDetector::new("fr")),
            Arc::new(PlainExtractor),
            Duration::from_millis(20),
        );

        let err = service
            .translate_text(text_request("Bonjour", Some("fr")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TranslatorError::Timeout {
                stage: "translation"
            }
        ));
    }
}
