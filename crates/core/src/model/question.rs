use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::keys::{Level, LevelError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("a question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("correct option {correct} is out of range for {len} options")]
    CorrectOutOfRange { correct: usize, len: usize },

    #[error(transparent)]
    Level(#[from] LevelError),
}

/// A multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct: usize,
}

impl Question {
    /// Creates a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, fewer than two options are
    /// given, or `correct` does not index an option.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: usize,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into().trim().to_string();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions(options.len()));
        }
        if correct >= options.len() {
            return Err(QuestionError::CorrectOutOfRange {
                correct,
                len: options.len(),
            });
        }

        Ok(Self {
            prompt,
            options,
            correct,
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct
    }
}

/// Questions grouped by level. Every level present holds at least one question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    levels: BTreeMap<Level, Vec<Question>>,
}

impl QuestionBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a question to a level.
    #[must_use]
    pub fn with_question(mut self, level: Level, question: Question) -> Self {
        self.levels.entry(level).or_default().push(question);
        self
    }

    /// Questions for a level in declaration order; empty for unknown levels.
    #[must_use]
    pub fn questions(&self, level: Level) -> &[Question] {
        self.levels.get(&level).map_or(&[], Vec::as_slice)
    }

    /// Number of questions a quiz at `level` draws.
    #[must_use]
    pub fn question_count(&self, level: Level) -> usize {
        self.questions(level).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn rejects_blank_prompt() {
        let err = Question::new("   ", opts(&["a", "b"]), 0).unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt);
    }

    #[test]
    fn rejects_single_option() {
        let err = Question::new("Q?", opts(&["only"]), 0).unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions(1));
    }

    #[test]
    fn rejects_correct_index_out_of_range() {
        let err = Question::new("Q?", opts(&["a", "b"]), 2).unwrap_err();
        assert_eq!(err, QuestionError::CorrectOutOfRange { correct: 2, len: 2 });
    }

    #[test]
    fn bank_groups_by_level() {
        let q = Question::new("Q?", opts(&["a", "b"]), 1).unwrap();
        let bank = QuestionBank::new()
            .with_question(Level::FIRST, q.clone())
            .with_question(Level::FIRST, q);
        assert_eq!(bank.question_count(Level::FIRST), 2);
        assert!(bank.questions(Level::LAST).is_empty());
    }
}
