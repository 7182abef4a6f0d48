//! Shared error types for the services crate.

use thiserror::Error;

use prep_core::model::{DrillError, QuestionError};
use prep_core::quiz::QuizError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors from the remote text-generation collaborator.
///
/// Every variant is recoverable: the assistant falls back to the keyword table.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("remote assistant is not configured")]
    Disabled,
    #[error("remote assistant returned an empty response")]
    EmptyResponse,
    #[error("remote assistant request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("remote assistant timed out")]
    Timeout,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors while reading remote assistant configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssistantConfigError {
    #[error("invalid assistant base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid assistant timeout: {0}")]
    InvalidTimeout(String),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `DrillService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DrillServiceError {
    #[error(transparent)]
    Drill(#[from] DrillError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LearningService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LearningServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Quiz(#[from] QuizServiceError),
    #[error(transparent)]
    Config(#[from] AssistantConfigError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}
