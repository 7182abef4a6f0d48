mod drill;
mod guide;
mod keys;
mod knowledge;
mod progress;
mod question;

pub use keys::{DisasterType, LEVEL_COUNT, Level, LevelError, ModuleKey, ParseKeyError, Region};

pub use drill::{DrillChecklist, DrillError, DrillStep};
pub use guide::{EmergencyContact, LearningModule, ModuleSection};
pub use knowledge::{
    ActionTarget, EMPTY_QUESTION_REPLY, FALLBACK_REPLY, KnowledgeBase, KnowledgeEntry,
    KnowledgeReply, SuggestedAction,
};
pub use progress::{
    AccessibilityProfile, ModuleProgress, Needs, ProgressError, ProgressRecord, ProgressStats,
    QuizProgress,
};
pub use question::{Question, QuestionBank, QuestionError};
