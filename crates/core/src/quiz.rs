//! Quiz session state machine.
//!
//! A session walks a shuffled copy of one level's questions:
//! `InProgress(index, score)` until the last question is answered and
//! advanced past, then `Finished(percent, passed)`. Persisting the result is
//! left to the caller.

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::model::{LEVEL_COUNT, Level, Question, QuestionBank};

/// Minimum percentage that counts as a pass.
pub const PASS_THRESHOLD_PERCENT: u8 = 70;

/// Scoring and progression parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizRules {
    pub pass_threshold: u8,
    pub level_count: u8,
}

impl Default for QuizRules {
    fn default() -> Self {
        Self {
            pass_threshold: PASS_THRESHOLD_PERCENT,
            level_count: LEVEL_COUNT,
        }
    }
}

impl QuizRules {
    #[must_use]
    pub fn is_pass(&self, percent: u8) -> bool {
        percent >= self.pass_threshold
    }
}

/// `round(100 * correct / total)` with halves rounded up; 0 for an empty quiz.
#[must_use]
pub fn round_percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total);
    let percent = (200 * correct + total) / (2 * total);
    u8::try_from(percent).unwrap_or(100)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("level {0} is locked")]
    Locked(Level),

    #[error("no questions available for level {0}")]
    EmptyLevel(Level),

    #[error("question already answered")]
    AlreadyAnswered,

    #[error("answer the current question before moving on")]
    Unanswered,

    #[error("option {option} does not exist (question has {len} options)")]
    InvalidOption { option: usize, len: usize },

    #[error("quiz already finished")]
    Finished,
}

/// Feedback for the answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub chosen: usize,
    pub correct_option: usize,
    pub is_correct: bool,
    pub score: usize,
}

/// Final result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOutcome {
    pub level: Level,
    pub correct: usize,
    pub total: usize,
    pub percent: u8,
    pub passed: bool,
}

/// What `advance` moved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizStep<'a> {
    Next(&'a Question),
    Finished(QuizOutcome),
}

/// Snapshot of the current question for a rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub number: usize,
    pub total: usize,
    pub prompt: String,
    pub options: Vec<String>,
    pub chosen: Option<usize>,
    /// Revealed once the question has been answered.
    pub correct_option: Option<usize>,
    pub score: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    InProgress,
    Finished(QuizOutcome),
}

/// In-memory quiz attempt for one level.
#[derive(Debug, Clone)]
pub struct QuizSession {
    level: Level,
    rules: QuizRules,
    questions: Vec<Question>,
    current: usize,
    score: usize,
    chosen: Option<usize>,
    phase: Phase,
}

impl QuizSession {
    /// Start an attempt at `level` with every question of that level, shuffled.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyLevel` if the bank has no questions for `level`.
    pub fn start<R: Rng + ?Sized>(
        level: Level,
        bank: &QuestionBank,
        rules: QuizRules,
        rng: &mut R,
    ) -> Result<Self, QuizError> {
        let mut questions = bank.questions(level).to_vec();
        if questions.is_empty() {
            return Err(QuizError::EmptyLevel(level));
        }
        questions.shuffle(rng);

        Ok(Self {
            level,
            rules,
            questions,
            current: 0,
            score: 0,
            chosen: None,
            phase: Phase::InProgress,
        })
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    /// Option picked for the current question, if answered.
    #[must_use]
    pub fn chosen(&self) -> Option<usize> {
        self.chosen
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    #[must_use]
    pub fn outcome(&self) -> Option<QuizOutcome> {
        match self.phase {
            Phase::Finished(outcome) => Some(outcome),
            Phase::InProgress => None,
        }
    }

    /// The question being asked, `None` once finished.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::InProgress => self.questions.get(self.current),
            Phase::Finished(_) => None,
        }
    }

    #[must_use]
    pub fn view(&self) -> Option<QuestionView> {
        let question = self.current_question()?;
        Some(QuestionView {
            number: self.current + 1,
            total: self.total(),
            prompt: question.prompt().to_string(),
            options: question.options().to_vec(),
            chosen: self.chosen,
            correct_option: self.chosen.map(|_| question.correct()),
            score: self.score,
        })
    }

    /// Grade `option` for the current question. Each question takes one answer.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AlreadyAnswered` on a second answer (score unchanged),
    /// `QuizError::InvalidOption` for an unknown option, `QuizError::Finished`
    /// after the session ended.
    pub fn answer(&mut self, option: usize) -> Result<AnswerFeedback, QuizError> {
        let question = self.current_question().ok_or(QuizError::Finished)?;
        if self.chosen.is_some() {
            return Err(QuizError::AlreadyAnswered);
        }
        let len = question.options().len();
        if option >= len {
            return Err(QuizError::InvalidOption { option, len });
        }

        let correct_option = question.correct();
        let is_correct = question.is_correct(option);
        if is_correct {
            self.score += 1;
        }
        self.chosen = Some(option);

        Ok(AnswerFeedback {
            chosen: option,
            correct_option,
            is_correct,
            score: self.score,
        })
    }

    /// Move to the next question, or finish after the last one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Unanswered` if the current question has no answer yet
    /// and `QuizError::Finished` after the session ended.
    pub fn advance(&mut self) -> Result<QuizStep<'_>, QuizError> {
        if self.is_finished() {
            return Err(QuizError::Finished);
        }
        if self.chosen.is_none() {
            return Err(QuizError::Unanswered);
        }

        if let Some(outcome) = self.pending_outcome() {
            self.phase = Phase::Finished(outcome);
            return Ok(QuizStep::Finished(outcome));
        }

        self.current += 1;
        self.chosen = None;
        Ok(QuizStep::Next(&self.questions[self.current]))
    }

    /// Outcome the next `advance` will finish with: `Some` only while the
    /// last question is answered and the session is still in progress.
    #[must_use]
    pub fn pending_outcome(&self) -> Option<QuizOutcome> {
        if self.is_finished() || self.chosen.is_none() || self.current + 1 < self.questions.len()
        {
            return None;
        }
        let total = self.questions.len();
        let percent = round_percent(self.score, total);
        Some(QuizOutcome {
            level: self.level,
            correct: self.score,
            total,
            percent,
            passed: self.rules.is_pass(percent),
        })
    }
}
