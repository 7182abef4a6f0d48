use std::sync::{Arc, Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use prep_core::catalog;
use prep_core::model::{Level, QuestionBank};
use prep_core::quiz::{
    AnswerFeedback, QuestionView, QuizError, QuizOutcome, QuizRules, QuizSession,
};
use storage::ProgressStore;

use crate::error::QuizServiceError;

/// Unlock and score state of one level, for the level picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelStatus {
    pub level: Level,
    pub unlocked: bool,
    pub score: Option<u8>,
    pub question_count: usize,
}

/// Result of a finished quiz after it was persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizResult {
    pub outcome: QuizOutcome,
    pub unlocked_level: Level,
}

/// What the learner sees after pressing "next".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizAdvance {
    Next(QuestionView),
    Finished(QuizResult),
}

/// Runs quiz sessions against the persisted progress record.
pub struct QuizService {
    progress: ProgressStore,
    bank: Arc<QuestionBank>,
    rules: QuizRules,
    rng: Mutex<StdRng>,
}

impl QuizService {
    /// Quiz service over the built-in question bank.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Question` if the built-in bank is malformed.
    pub fn new(progress: ProgressStore) -> Result<Self, QuizServiceError> {
        Ok(Self::with_bank(progress, catalog::question_bank()?))
    }

    #[must_use]
    pub fn with_bank(progress: ProgressStore, bank: QuestionBank) -> Self {
        Self {
            progress,
            bank: Arc::new(bank),
            rules: QuizRules::default(),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: QuizRules) -> Self {
        self.rules = rules;
        self
    }

    /// Use a deterministic shuffle.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    #[must_use]
    pub fn rules(&self) -> QuizRules {
        self.rules
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Status of every level, lowest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if progress cannot be read.
    pub async fn levels(&self) -> Result<Vec<LevelStatus>, QuizServiceError> {
        let quiz = self.progress.load_quiz().await?;
        Ok(Level::all()
            .map(|level| LevelStatus {
                level,
                unlocked: quiz.is_unlocked(level),
                score: quiz.score(level),
                question_count: self.bank.question_count(level),
            })
            .collect())
    }

    /// Make `level` the active level if it is unlocked.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Locked` for a level above the unlocked one.
    pub async fn select_level(&self, level: Level) -> Result<LevelStatus, QuizServiceError> {
        let quiz = self.progress.load_quiz().await?;
        if !quiz.is_unlocked(level) {
            return Err(QuizError::Locked(level).into());
        }
        Ok(LevelStatus {
            level,
            unlocked: true,
            score: quiz.score(level),
            question_count: self.bank.question_count(level),
        })
    }

    /// Start a shuffled attempt at `level`. Any previous session is simply dropped.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Locked` for a locked level, `QuizError::EmptyLevel`
    /// when the bank has nothing for it, or a storage error.
    pub async fn start_quiz(&self, level: Level) -> Result<QuizSession, QuizServiceError> {
        self.select_level(level).await?;
        let session = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            QuizSession::start(level, &self.bank, self.rules, &mut *rng)?
        };
        debug!(level = level.value(), questions = session.total(), "quiz started");
        Ok(session)
    }

    /// Start again at the same level.
    ///
    /// # Errors
    ///
    /// See [`QuizService::start_quiz`].
    pub async fn retry(&self, session: &QuizSession) -> Result<QuizSession, QuizServiceError> {
        self.start_quiz(session.level()).await
    }

    /// Start the level after `level`, staying on the last level at the top.
    ///
    /// # Errors
    ///
    /// See [`QuizService::start_quiz`].
    pub async fn next_level(&self, level: Level) -> Result<QuizSession, QuizServiceError> {
        self.start_quiz(level.next().unwrap_or(Level::LAST)).await
    }

    /// Grade the current question. Nothing is persisted until the quiz finishes.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AlreadyAnswered`, `QuizError::InvalidOption` or
    /// `QuizError::Finished`.
    pub fn answer(
        &self,
        session: &mut QuizSession,
        option: usize,
    ) -> Result<AnswerFeedback, QuizServiceError> {
        Ok(session.answer(option)?)
    }

    /// Move past the answered question; on the last one, record the score and
    /// unlock the next level when passed.
    ///
    /// The session only finishes once the score is stored, so a failed write
    /// can be retried with another `advance`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Unanswered` / `QuizError::Finished` or a storage error.
    pub async fn advance(
        &self,
        session: &mut QuizSession,
    ) -> Result<QuizAdvance, QuizServiceError> {
        let Some(outcome) = session.pending_outcome() else {
            session.advance()?;
            let view = session.view().ok_or(QuizError::Finished)?;
            return Ok(QuizAdvance::Next(view));
        };

        let mut quiz = self.progress.load_quiz().await?;
        let unlocked_level = quiz.record_attempt(outcome.level, outcome.percent, &self.rules);
        self.progress.save_quiz(&quiz).await?;
        session.advance()?;
        debug!(
            level = outcome.level.value(),
            percent = outcome.percent,
            passed = outcome.passed,
            unlocked = unlocked_level.value(),
            "quiz finished"
        );

        Ok(QuizAdvance::Finished(QuizResult {
            outcome,
            unlocked_level,
        }))
    }
}
