use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::translate::{InstalledLanguage, LanguageDetector, ModelPackage, TranslationEngine, Translator};

/// HTTP client for the local translation engine sidecar
#[derive(Debug, Clone)]
pub struct EngineServiceClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InstallRequest {
    pub from_code: String,
    pub to_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InstallResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetectRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetectResponse {
    pub language: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EngineTranslateRequest {
    pub text: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EngineTranslateResponse {
    #[serde(default)]
    pub translated_text: String,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_success() -> bool {
    true
}

impl EngineServiceClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(
                config.install_timeout_secs.max(config.request_timeout_secs),
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn list_installed_languages(&self) -> Result<Vec<InstalledLanguage>> {
        let url = format!("{}/languages", self.base_url);
        let response = self.client.get(&url).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    pub async fn list_available_packages(&self) -> Result<Vec<ModelPackage>> {
        let url = format!("{}/packages/available", self.base_url);
        let response = self.client.get(&url).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    pub async fn update_index(&self) -> Result<()> {
        let url = format!("{}/packages/update-index", self.base_url);
        let response = self.client.post(&url).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    pub async fn install(&self, request: InstallRequest) -> Result<()> {
        let url = format!("{}/packages/install", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;
        let response = Self::check_status(response).await?;
        let result: InstallResponse = response.json().await?;

        if result.success {
            Ok(())
        } else {
            let error_msg = result.error.unwrap_or_else(|| "Unknown error".to_string());
            Err(anyhow::anyhow!(
                "Installing {} → {} failed: {}",
                request.from_code,
                request.to_code,
                error_msg
            ))
        }
    }

    pub async fn detect_language(&self, request: DetectRequest) -> Result<DetectResponse> {
        let url = format!("{}/detect", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    pub async fn translate(&self, request: EngineTranslateRequest) -> Result<String> {
        let url = format!("{}/translate", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;
        let response = Self::check_status(response).await?;
        let result: EngineTranslateResponse = response.json().await?;

        if result.success {
            Ok(result.translated_text)
        } else {
            let error_msg = result.error.unwrap_or_else(|| "Unknown error".to_string());
            Err(anyhow::anyhow!("{}", error_msg))
        }
    }

    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }

    /// Turn a non-2xx reply into an error carrying the sidecar's message
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("detail")
                    .or_else(|| v.get("error"))
                    .and_then(|d| d.as_str())
                    .map(|s| s.to_string())
            })
            .unwrap_or(body);
        Err(anyhow::anyhow!("Engine returned {}: {}", status, message))
    }
}

/// Translator bound to one installed (source, target) pair on the sidecar
pub struct EngineTranslator {
    engine: EngineServiceClient,
    source: String,
    target: String,
}

#[async_trait]
impl Translator for EngineTranslator {
    async fn translate(&self, text: &str) -> Result<String, anyhow::Error> {
        debug!(
            "Translating {} chars: {} → {}",
            text.chars().count(),
            self.source,
            self.target
        );
        self.engine
            .translate(EngineTranslateRequest {
                text: text.to_string(),
                source: self.source.clone(),
                target: self.target.clone(),
            })
            .await
    }
}

#[async_trait]
impl TranslationEngine for EngineServiceClient {
    async fn installed_languages(&self) -> Result<Vec<InstalledLanguage>, anyhow::Error> {
        self.list_installed_languages().await
    }

    async fn available_packages(&self) -> Result<Vec<ModelPackage>, anyhow::Error> {
        self.list_available_packages().await
    }

    async fn install_package(&self, package: &ModelPackage) -> Result<(), anyhow::Error> {
        self.install(InstallRequest {
            from_code: package.from_code.clone(),
            to_code: package.to_code.clone(),
        })
        .await
    }

    async fn update_package_index(&self) -> Result<(), anyhow::Error> {
        self.update_index().await
    }

    async fn health_check(&self) -> Result<bool, anyhow::Error> {
        EngineServiceClient::health_check(self).await
    }

    fn translator(
        &self,
        source: &InstalledLanguage,
        target: &InstalledLanguage,
    ) -> Box<dyn Translator> {
        Box::new(EngineTranslator {
            engine: self.clone(),
            source: source.code.clone(),
            target: target.code.clone(),
        })
    }
}

#[async_trait]
impl LanguageDetector for EngineServiceClient {
    async fn detect(&self, text: &str) -> Result<String, anyhow::Error> {
        let response = self
            .detect_language(DetectRequest {
                text: text.to_string(),
            })
            .await?;
        debug!(
            "Detected language {} (confidence {:?})",
            response.language, response.confidence
        );
        Ok(response.language)
    }
}
