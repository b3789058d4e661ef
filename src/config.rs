use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::Result;
use regex::Regex;

use crate::language::{LanguageCode, SupportedLanguages};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub engine_config: EngineConfig,
    #[serde(default)]
    pub translation_config: TranslationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Connection settings for the local translation engine sidecar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_engine_url")]
    pub base_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Model downloads can take minutes, so installation gets its own bound
    #[serde(default = "default_install_timeout")]
    pub install_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub update_index_on_startup: bool,
}

fn default_engine_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    120
}

fn default_install_timeout() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "default_supported_languages")]
    pub supported_languages: Vec<String>,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_supported_languages() -> Vec<String> {
    ["en", "fr", "es", "ja"].iter().map(|s| s.to_string()).collect()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_engine_url(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            install_timeout_secs: default_install_timeout(),
            update_index_on_startup: default_true(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            supported_languages: default_supported_languages(),
            target_language: default_target_language(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let content = substitute_env_vars(&read_text_file(path)?);

        // Determine file type by extension
        let path_lower = path.to_lowercase();
        let config: Config = if path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let supported = self.supported_languages()?;
        let target = self.target_language()?;
        if !supported.contains(&target) {
            anyhow::bail!(
                "Target language '{}' is not in supported_languages {}",
                target,
                supported
            );
        }

        let engine = &self.engine_config;
        if engine.request_timeout_secs == 0 || engine.install_timeout_secs == 0 {
            anyhow::bail!("Engine timeouts must be greater than zero");
        }
        if self.translation_config.max_upload_bytes == 0 {
            anyhow::bail!("max_upload_bytes must be greater than zero");
        }
        Ok(())
    }

    pub fn supported_languages(&self) -> Result<SupportedLanguages> {
        let codes = self
            .translation_config
            .supported_languages
            .iter()
            .map(|code| LanguageCode::parse(code))
            .collect::<Result<Vec<_>>>()?;
        if codes.is_empty() {
            anyhow::bail!("supported_languages must not be empty");
        }
        Ok(SupportedLanguages::new(codes))
    }

    pub fn target_language(&self) -> Result<LanguageCode> {
        LanguageCode::parse(&self.translation_config.target_language)
    }

    /// Environment overrides applied after the file is read
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TRANSLATOR_ENGINE_URL") {
            self.engine_config.base_url = url;
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.system_config.port = port;
        }
    }
}

/// Replace `${VAR_NAME}` placeholders with environment values, leaving unknown ones as-is
pub fn substitute_env_vars(content: &str) -> String {
    let pattern = Regex::new(r"\$\{(\w+)\}").expect("static regex");
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

fn read_text_file(path: &str) -> Result<String> {
    let bytes = fs::read(path)?;
    let (content, _) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
    Ok(content.into_owned())
}
