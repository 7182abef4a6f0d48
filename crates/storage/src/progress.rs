//! Progress record persistence over four independent keys.
//!
//! Each field lives under its own key so a failed write leaves the others
//! intact. Missing or undecodable values fall back to that field's default.

use std::collections::BTreeMap;
use std::sync::Arc;

use prep_core::model::{AccessibilityProfile, ModuleProgress, ProgressRecord, QuizProgress};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::repository::{KeyValueStore, StorageError};

pub const MODULES_KEY: &str = "modules";
pub const DRILLS_COMPLETED_KEY: &str = "drillsCompleted";
pub const QUIZ_KEY: &str = "quiz";
pub const PROFILE_KEY: &str = "userProfile";

/// Persisted shape of quiz progress.
///
/// Older records used `level` for the unlocked level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizProgressRecord {
    #[serde(rename = "unlockedLevel", alias = "level", default = "first_level")]
    pub unlocked_level: u8,
    #[serde(default)]
    pub scores: BTreeMap<u8, u8>,
}

fn first_level() -> u8 {
    1
}

impl QuizProgressRecord {
    #[must_use]
    pub fn from_progress(progress: &QuizProgress) -> Self {
        Self {
            unlocked_level: progress.unlocked_level().value(),
            scores: progress
                .scores()
                .iter()
                .map(|(level, score)| (level.value(), *score))
                .collect(),
        }
    }
}

/// Loads and saves the learner's `ProgressRecord`.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load the record, substituting defaults for missing or malformed fields.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself fails.
    pub async fn load(&self) -> Result<ProgressRecord, StorageError> {
        Ok(ProgressRecord {
            modules: self.load_modules().await?,
            drills_completed: self.load_drills_completed().await?,
            quiz: self.load_quiz().await?,
            profile: self.load_profile().await?,
        })
    }

    /// Write every field of `record`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any key cannot be written; keys written
    /// before the failure keep their new values.
    pub async fn save(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        self.save_modules(&record.modules).await?;
        self.save_drills_completed(record.drills_completed).await?;
        self.save_quiz(&record.quiz).await?;
        self.save_profile(&record.profile).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn load_modules(&self) -> Result<ModuleProgress, StorageError> {
        let flags: Option<BTreeMap<String, bool>> = self.read_json(MODULES_KEY).await?;
        Ok(flags.map(ModuleProgress::from_persisted).unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn load_drills_completed(&self) -> Result<u32, StorageError> {
        let Some(raw) = self.kv.get(DRILLS_COMPLETED_KEY).await? else {
            return Ok(0);
        };
        match raw.trim().parse::<u32>() {
            Ok(count) => Ok(count),
            Err(err) => {
                warn!(key = DRILLS_COMPLETED_KEY, %err, "ignoring malformed drill count");
                Ok(0)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn load_quiz(&self) -> Result<QuizProgress, StorageError> {
        let Some(record) = self.read_json::<QuizProgressRecord>(QUIZ_KEY).await? else {
            return Ok(QuizProgress::default());
        };
        match QuizProgress::from_persisted(record.unlocked_level, &record.scores) {
            Ok(progress) => Ok(progress),
            Err(err) => {
                warn!(key = QUIZ_KEY, %err, "ignoring invalid quiz progress");
                Ok(QuizProgress::default())
            }
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn load_profile(&self) -> Result<AccessibilityProfile, StorageError> {
        let profile: Option<AccessibilityProfile> = self.read_json(PROFILE_KEY).await?;
        Ok(profile.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the write fails.
    pub async fn save_modules(&self, modules: &ModuleProgress) -> Result<(), StorageError> {
        self.write_json(MODULES_KEY, modules.as_map()).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn save_drills_completed(&self, count: u32) -> Result<(), StorageError> {
        self.kv.set(DRILLS_COMPLETED_KEY, &count.to_string()).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the write fails.
    pub async fn save_quiz(&self, quiz: &QuizProgress) -> Result<(), StorageError> {
        self.write_json(QUIZ_KEY, &QuizProgressRecord::from_progress(quiz))
            .await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the write fails.
    pub async fn save_profile(&self, profile: &AccessibilityProfile) -> Result<(), StorageError> {
        self.write_json(PROFILE_KEY, profile).await
    }

    /// `None` when the key is absent or its value does not decode.
    async fn read_json<T: for<'de> Deserialize<'de>>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.kv.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, %err, "ignoring malformed stored value");
                Ok(None)
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(value)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.set(key, &encoded).await
    }
}
