use std::sync::Arc;

use tracing::info;

use prep_core::catalog;
use storage::{ProgressStore, Storage};

use crate::Clock;
use crate::assistant::{AssistantService, RemoteGenerator, RemoteGeneratorConfig};
use crate::drill_service::DrillService;
use crate::error::AppServicesError;
use crate::learning_service::LearningService;
use crate::quiz_service::QuizService;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    progress: ProgressStore,
    quiz: Arc<QuizService>,
    drills: Arc<DrillService>,
    assistant: Arc<AssistantService>,
    learning: Arc<LearningService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization, the built-in
    /// question bank or the HTTP client fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        remote: Option<RemoteGeneratorConfig>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        info!(db_url, "progress storage ready");
        Self::from_storage(&storage, clock, remote)
    }

    /// Build services over a throwaway in-memory store, keyword assistant only.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Quiz` if the built-in question bank is malformed.
    pub fn in_memory(clock: Clock) -> Result<Self, AppServicesError> {
        Self::from_storage(&Storage::in_memory(), clock, None)
    }

    /// # Errors
    ///
    /// See [`AppServices::new_sqlite`].
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        remote: Option<RemoteGeneratorConfig>,
    ) -> Result<Self, AppServicesError> {
        let progress = ProgressStore::new(Arc::clone(&storage.kv));

        let mut assistant = AssistantService::local(catalog::knowledge_base());
        if let Some(config) = remote {
            let timeout = config.timeout;
            info!(model = %config.model, base_url = %config.base_url, "remote assistant enabled");
            let generator = RemoteGenerator::new(config)?;
            assistant = assistant.with_generator(Arc::new(generator), timeout);
        }

        Ok(Self {
            quiz: Arc::new(QuizService::new(progress.clone())?),
            drills: Arc::new(DrillService::new(clock, progress.clone())),
            assistant: Arc::new(assistant),
            learning: Arc::new(LearningService::new(progress.clone())),
            progress,
        })
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn drills(&self) -> Arc<DrillService> {
        Arc::clone(&self.drills)
    }

    #[must_use]
    pub fn assistant(&self) -> Arc<AssistantService> {
        Arc::clone(&self.assistant)
    }

    #[must_use]
    pub fn learning(&self) -> Arc<LearningService> {
        Arc::clone(&self.learning)
    }
}
