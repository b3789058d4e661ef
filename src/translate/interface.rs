/// Translate interfaces - actual inference happens in the engine sidecar

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::language::LanguageCode;

/// Request body for `POST /translate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    #[serde(default)]
    pub from_lang: Option<String>,
    #[serde(default)]
    pub to_lang: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub original_text: String,
    pub translated_text: String,
}

/// A language the engine can currently translate from, with the targets it has models for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledLanguage {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub targets: Vec<String>,
}

impl InstalledLanguage {
    pub fn matches(&self, code: &LanguageCode) -> bool {
        self.code == code.as_str()
    }

    pub fn translates_to(&self, target: &InstalledLanguage) -> bool {
        self.targets.iter().any(|t| *t == target.code)
    }
}

/// An installable (from_code -> to_code) model listed in the engine's package index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPackage {
    pub from_code: String,
    pub to_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_version: Option<String>,
}

impl ModelPackage {
    pub fn provides(&self, source: &LanguageCode, target: &LanguageCode) -> bool {
        self.from_code == source.as_str() && self.to_code == target.as_str()
    }
}

/// Translates text for one fixed (source, target) pair
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, anyhow::Error>;
}

/// Local translation engine holding the installed-model set
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    /// Snapshot of languages with locally installed models
    async fn installed_languages(&self) -> Result<Vec<InstalledLanguage>, anyhow::Error>;

    /// Packages listed in the engine's index, installed or not
    async fn available_packages(&self) -> Result<Vec<ModelPackage>, anyhow::Error>;

    /// Install a package. Installing an already installed package is a no-op.
    async fn install_package(&self, package: &ModelPackage) -> Result<(), anyhow::Error>;

    /// Refresh the package index from its remote source
    async fn update_package_index(&self) -> Result<(), anyhow::Error>;

    /// Whether the engine is reachable and answering
    async fn health_check(&self) -> Result<bool, anyhow::Error>;

    /// Translator from `source` into `target`
    fn translator(
        &self,
        source: &InstalledLanguage,
        target: &InstalledLanguage,
    ) -> Box<dyn Translator>;
}

/// Statistical language identification
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// Best-guess language identifier, possibly locale-qualified (`en-US`)
    async fn detect(&self, text: &str) -> Result<String, anyhow::Error>;
}
