use thiserror::Error;

use crate::model::keys::DisasterType;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DrillError {
    #[error("complete all steps first ({remaining} remaining)")]
    Incomplete { remaining: usize },

    #[error("step {index} does not exist (drill has {len} steps)")]
    StepOutOfRange { index: usize, len: usize },

    #[error("drill already finished")]
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillStep {
    pub label: String,
    pub done: bool,
}

/// Ordered checklist for one drill run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillChecklist {
    disaster: DisasterType,
    steps: Vec<DrillStep>,
}

impl DrillChecklist {
    /// Builds a checklist with every step incomplete.
    #[must_use]
    pub fn new<I, S>(disaster: DisasterType, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            disaster,
            steps: labels
                .into_iter()
                .map(|label| DrillStep {
                    label: label.into(),
                    done: false,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn disaster(&self) -> DisasterType {
        self.disaster
    }

    #[must_use]
    pub fn steps(&self) -> &[DrillStep] {
        &self.steps
    }

    /// Flip the completion flag of one step; returns the new flag.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::StepOutOfRange` for an unknown index.
    pub fn toggle(&mut self, index: usize) -> Result<bool, DrillError> {
        let len = self.steps.len();
        let step = self
            .steps
            .get_mut(index)
            .ok_or(DrillError::StepOutOfRange { index, len })?;
        step.done = !step.done;
        Ok(step.done)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.steps.iter().filter(|step| !step.done).count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// # Errors
    ///
    /// Returns `DrillError::Incomplete` while any step is still open.
    pub fn ensure_complete(&self) -> Result<(), DrillError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(DrillError::Incomplete { remaining }),
        }
    }
}
