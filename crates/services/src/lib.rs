#![forbid(unsafe_code)]

pub mod app_services;
pub mod assistant;
pub mod drill_service;
pub mod drill_timer;
pub mod error;
pub mod learning_service;
pub mod quiz_service;

pub use prep_core::Clock;

pub use app_services::AppServices;
pub use assistant::{
    AssistantReply, AssistantService, PendingReply, RemoteGenerator, RemoteGeneratorConfig,
    ReplySource, TextGenerator,
};
pub use drill_service::{DrillOutcome, DrillService, DrillSession};
pub use drill_timer::DrillTimer;
pub use error::{
    AppServicesError, AssistantConfigError, DrillServiceError, GenerationError,
    LearningServiceError, QuizServiceError,
};
pub use learning_service::{LearningService, ModuleOverview};
pub use quiz_service::{LevelStatus, QuizAdvance, QuizResult, QuizService};
