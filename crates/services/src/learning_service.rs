use tracing::debug;

use prep_core::catalog;
use prep_core::model::{
    AccessibilityProfile, EmergencyContact, LearningModule, ModuleKey, Needs, ProgressStats,
    Region,
};
use storage::ProgressStore;

use crate::error::LearningServiceError;

/// A module as listed on the learn screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleOverview {
    pub key: ModuleKey,
    pub title: &'static str,
    pub completed: bool,
}

/// Reading modules, accessibility profile, contacts and headline stats.
#[derive(Clone)]
pub struct LearningService {
    progress: ProgressStore,
}

impl LearningService {
    #[must_use]
    pub fn new(progress: ProgressStore) -> Self {
        Self { progress }
    }

    #[must_use]
    pub fn module(&self, key: ModuleKey) -> &'static LearningModule {
        catalog::module(key)
    }

    /// # Errors
    ///
    /// Returns `LearningServiceError::Storage` if progress cannot be read.
    pub async fn modules_overview(&self) -> Result<Vec<ModuleOverview>, LearningServiceError> {
        let modules = self.progress.load_modules().await?;
        Ok(catalog::modules()
            .iter()
            .map(|module| ModuleOverview {
                key: module.key,
                title: module.title,
                completed: modules.is_completed(module.key),
            })
            .collect())
    }

    /// Mark a module as read. Completing it again is a no-op write.
    ///
    /// # Errors
    ///
    /// Returns `LearningServiceError::Storage` if progress cannot be saved.
    pub async fn complete_module(&self, key: ModuleKey) -> Result<usize, LearningServiceError> {
        let mut modules = self.progress.load_modules().await?;
        modules.mark_completed(key);
        self.progress.save_modules(&modules).await?;
        debug!(module = key.as_str(), "module completed");
        Ok(modules.completed_count())
    }

    /// # Errors
    ///
    /// Returns `LearningServiceError::Storage` if progress cannot be read.
    pub async fn profile(&self) -> Result<AccessibilityProfile, LearningServiceError> {
        Ok(self.progress.load_profile().await?)
    }

    /// # Errors
    ///
    /// Returns `LearningServiceError::Storage` if progress cannot be saved.
    pub async fn save_profile(
        &self,
        needs: Needs,
    ) -> Result<AccessibilityProfile, LearningServiceError> {
        let profile = AccessibilityProfile { needs };
        self.progress.save_profile(&profile).await?;
        debug!(needs = needs.as_str(), "profile saved");
        Ok(profile)
    }

    /// Contacts for a region name; empty when the region is unknown.
    #[must_use]
    pub fn contacts(&self, region: &str) -> &'static [EmergencyContact] {
        region
            .parse::<Region>()
            .map(catalog::regional_contacts)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn national_helplines(&self) -> &'static [EmergencyContact] {
        catalog::national_helplines()
    }

    /// # Errors
    ///
    /// Returns `LearningServiceError::Storage` if progress cannot be read.
    pub async fn stats(&self) -> Result<ProgressStats, LearningServiceError> {
        Ok(self.progress.load().await?.stats())
    }
}
