use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Result, TranslatorError};
use crate::language::{LanguageCode, LanguagePair};
use crate::translate::{InstalledLanguage, ModelPackage, TranslationEngine};

/// Tracks installed translation models and installs missing pairs on demand.
///
/// Installation of a given pair is single-flight: concurrent callers for the
/// same pair wait on one guard and re-check the installed set once they hold
/// it. Different pairs never contend.
pub struct ModelRegistry {
    engine: Arc<dyn TranslationEngine>,
    install_guards: DashMap<LanguagePair, Arc<Mutex<()>>>,
    install_timeout: Duration,
}

impl ModelRegistry {
    pub fn new(engine: Arc<dyn TranslationEngine>, install_timeout: Duration) -> Self {
        Self {
            engine,
            install_guards: DashMap::new(),
            install_timeout,
        }
    }

    pub async fn installed_languages(&self) -> Result<Vec<InstalledLanguage>> {
        self.engine
            .installed_languages()
            .await
            .map_err(|e| TranslatorError::Engine(format!("Listing installed languages failed: {}", e)))
    }

    pub async fn available_packages(&self) -> Result<Vec<ModelPackage>> {
        self.engine
            .available_packages()
            .await
            .map_err(|e| TranslatorError::Engine(format!("Listing available packages failed: {}", e)))
    }

    pub async fn refresh_index(&self) -> Result<()> {
        self.engine
            .update_package_index()
            .await
            .map_err(|e| TranslatorError::Engine(format!("Updating package index failed: {}", e)))
    }

    /// Make sure a model for `source` → `target` is installed, installing it if needed
    pub async fn ensure_model_installed(
        &self,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<()> {
        if self.is_installed(source, target).await? {
            return Ok(());
        }

        let pair = LanguagePair::new(source.clone(), target.clone());
        let guard = self
            .install_guards
            .entry(pair.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _lock = guard.lock().await;

        // Another request may have finished the install while we waited
        if self.is_installed(source, target).await? {
            debug!("Model for {} installed by a concurrent request", pair);
            return Ok(());
        }

        let packages = self.available_packages().await?;
        let package = packages
            .iter()
            .find(|p| p.provides(source, target))
            .ok_or_else(|| TranslatorError::ModelNotFound(pair.clone()))?;

        info!("Installing model for {} ...", pair);
        tokio::time::timeout(self.install_timeout, self.engine.install_package(package))
            .await
            .map_err(|_| TranslatorError::Timeout {
                stage: "model installation",
            })?
            .map_err(|e| TranslatorError::Engine(format!("Installing model for {} failed: {}", pair, e)))?;
        info!("Installed model for {}", pair);

        Ok(())
    }

    async fn is_installed(&self, source: &LanguageCode, target: &LanguageCode) -> Result<bool> {
        let installed = self.installed_languages().await?;
        let has_source = installed.iter().any(|l| l.matches(source));
        let has_target = installed.iter().any(|l| l.matches(target));
        Ok(has_source && has_target)
    }
}

/// Handle for `code` in an installed-language snapshot
pub fn find_installed<'a>(
    installed: &'a [InstalledLanguage],
    code: &LanguageCode,
) -> Option<&'a InstalledLanguage> {
    installed.iter().find(|l| l.matches(code))
}
