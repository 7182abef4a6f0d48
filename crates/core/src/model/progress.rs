use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::keys::{Level, ModuleKey, ParseKeyError};
use crate::quiz::QuizRules;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("unlocked level {0} is not a valid level")]
    InvalidUnlockedLevel(u8),

    #[error("score recorded for unknown level {0}")]
    InvalidScoreLevel(u8),

    #[error("score {score} for level {level} exceeds 100")]
    ScoreOutOfRange { level: u8, score: u8 },
}

//
// ─── QUIZ PROGRESS ─────────────────────────────────────────────────────────────
//

/// Unlock state and best-known scores across quiz levels.
///
/// `unlocked_level` never decreases; a level's score is replaced only by a
/// finished attempt at that level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    unlocked_level: Level,
    scores: BTreeMap<Level, u8>,
}

impl Default for QuizProgress {
    fn default() -> Self {
        Self {
            unlocked_level: Level::FIRST,
            scores: BTreeMap::new(),
        }
    }
}

impl QuizProgress {
    /// Rehydrate quiz progress from persisted primitives.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if a level is out of range or a score exceeds 100.
    pub fn from_persisted(
        unlocked_level: u8,
        scores: &BTreeMap<u8, u8>,
    ) -> Result<Self, ProgressError> {
        let unlocked_level = Level::new(unlocked_level)
            .map_err(|_| ProgressError::InvalidUnlockedLevel(unlocked_level))?;

        let mut validated = BTreeMap::new();
        for (&level, &score) in scores {
            let level_key =
                Level::new(level).map_err(|_| ProgressError::InvalidScoreLevel(level))?;
            if score > 100 {
                return Err(ProgressError::ScoreOutOfRange { level, score });
            }
            validated.insert(level_key, score);
        }

        Ok(Self {
            unlocked_level,
            scores: validated,
        })
    }

    #[must_use]
    pub fn unlocked_level(&self) -> Level {
        self.unlocked_level
    }

    #[must_use]
    pub fn is_unlocked(&self, level: Level) -> bool {
        level <= self.unlocked_level
    }

    #[must_use]
    pub fn score(&self, level: Level) -> Option<u8> {
        self.scores.get(&level).copied()
    }

    #[must_use]
    pub fn scores(&self) -> &BTreeMap<Level, u8> {
        &self.scores
    }

    /// Store the result of a finished attempt and unlock the next level on a pass.
    ///
    /// Returns the unlocked level after the update.
    pub fn record_attempt(&mut self, level: Level, percent: u8, rules: &QuizRules) -> Level {
        self.scores.insert(level, percent.min(100));
        if rules.is_pass(percent) && level.value() < rules.level_count {
            if let Some(next) = level.next() {
                self.unlocked_level = self.unlocked_level.max(next);
            }
        }
        self.unlocked_level
    }

    /// Rounded mean of recorded scores, 0 when nothing is recorded.
    #[must_use]
    pub fn average_score(&self) -> u8 {
        let total: u32 = self.scores.values().map(|s| u32::from(*s)).sum();
        let count = u32::try_from(self.scores.len()).unwrap_or(u32::MAX);
        if count == 0 {
            return 0;
        }
        // Mean of values <= 100 stays <= 100.
        u8::try_from((2 * total + count) / (2 * count)).unwrap_or(100)
    }
}

//
// ─── MODULE PROGRESS ───────────────────────────────────────────────────────────
//

/// Completion flags for learning modules, keyed by module name.
///
/// Stored as a plain name → flag map so unknown names written by other
/// versions survive a load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleProgress {
    flags: BTreeMap<String, bool>,
}

impl ModuleProgress {
    #[must_use]
    pub fn from_persisted(flags: BTreeMap<String, bool>) -> Self {
        Self { flags }
    }

    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<String, bool> {
        &self.flags
    }

    #[must_use]
    pub fn is_completed(&self, key: ModuleKey) -> bool {
        self.flags.get(key.as_str()).copied().unwrap_or(false)
    }

    pub fn mark_completed(&mut self, key: ModuleKey) {
        self.flags.insert(key.as_str().to_string(), true);
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.flags.values().filter(|done| **done).count()
    }
}

//
// ─── ACCESSIBILITY PROFILE ─────────────────────────────────────────────────────
//

/// Assistance a user needs during an emergency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Needs {
    #[default]
    None,
    Wheelchair,
    Visual,
    Hearing,
    Elderly,
    Medical,
}

impl Needs {
    pub const ALL: [Needs; 6] = [
        Needs::None,
        Needs::Wheelchair,
        Needs::Visual,
        Needs::Hearing,
        Needs::Elderly,
        Needs::Medical,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Needs::None => "none",
            Needs::Wheelchair => "wheelchair",
            Needs::Visual => "visual",
            Needs::Hearing => "hearing",
            Needs::Elderly => "elderly",
            Needs::Medical => "medical",
        }
    }

    /// Message shown to responders for this need.
    #[must_use]
    pub fn alert_message(&self) -> &'static str {
        match self {
            Needs::None => "General Assistance Needed",
            Needs::Wheelchair => "Wheelchair Assistance Required (Ramp/Lift)",
            Needs::Visual => "User is Visually Impaired - Voice guidance needed",
            Needs::Hearing => "User is Hearing Impaired - Use Visual Signals",
            Needs::Elderly => "Elderly User - Mobility Support Needed",
            Needs::Medical => "Medical Emergency - Power/Oxygen Required",
        }
    }
}

impl fmt::Display for Needs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Needs {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Needs::ALL
            .into_iter()
            .find(|needs| needs.as_str() == needle)
            .ok_or_else(|| ParseKeyError::new("needs", s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibilityProfile {
    pub needs: Needs,
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// Everything persisted about a learner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    pub modules: ModuleProgress,
    pub drills_completed: u32,
    pub quiz: QuizProgress,
    pub profile: AccessibilityProfile,
}

/// Headline numbers for the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStats {
    pub modules_completed: usize,
    pub average_quiz_score: u8,
    pub drills_completed: u32,
}

impl ProgressRecord {
    #[must_use]
    pub fn stats(&self) -> ProgressStats {
        ProgressStats {
            modules_completed: self.modules.completed_count(),
            average_quiz_score: self.quiz.average_score(),
            drills_completed: self.drills_completed,
        }
    }
}
