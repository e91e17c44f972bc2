//! Assessment error types.
//!
//! Configuration errors are fatal and never retried. Input errors reject a
//! single event and leave the session untouched, so the driver can keep going.

use thiserror::Error;

use crate::ladder::Level;
use crate::model::Stage;

/// Errors raised by the bank, the ladder, and the stage engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssessError {
    /// A pick was requested from a level with no questions.
    #[error("no questions available for level {0}")]
    EmptyLevel(Level),

    /// A question bank entry is malformed.
    #[error("invalid question at index {index}: {reason}")]
    InvalidQuestion { index: usize, reason: String },

    /// The level is not part of the ladder.
    #[error("unknown level: {0}")]
    UnknownLevel(Level),

    /// The configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An input event arrived in a stage that does not accept it.
    #[error("event '{event}' is not accepted in the {stage} stage")]
    OutOfStage { stage: Stage, event: &'static str },

    /// An event arrived while no question was active.
    #[error("no active question")]
    NoActiveQuestion,

    /// A help modality was already chosen for this question.
    #[error("help modality already chosen")]
    HelpAlreadyChosen,

    /// A second answer arrived before any help modality was chosen.
    #[error("second answer submitted before choosing hint or example")]
    NoHelpChosen,
}

impl AssessError {
    /// Returns `true` if this error indicates a broken bank, ladder, or config.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            AssessError::EmptyLevel(_)
                | AssessError::InvalidQuestion { .. }
                | AssessError::UnknownLevel(_)
                | AssessError::InvalidConfig(_)
        )
    }

    /// Returns `true` if this error rejects a single input event.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AssessError::OutOfStage { .. }
                | AssessError::NoActiveQuestion
                | AssessError::HelpAlreadyChosen
                | AssessError::NoHelpChosen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_disjoint() {
        let config = [
            AssessError::EmptyLevel(Level::new("B1")),
            AssessError::InvalidQuestion {
                index: 3,
                reason: "missing field".into(),
            },
            AssessError::UnknownLevel(Level::new("Z9")),
            AssessError::InvalidConfig("quota".into()),
        ];
        for e in &config {
            assert!(e.is_config_error(), "{e}");
            assert!(!e.is_input_error(), "{e}");
        }

        let input = [
            AssessError::OutOfStage {
                stage: Stage::Ask,
                event: "choose_help",
            },
            AssessError::NoActiveQuestion,
            AssessError::HelpAlreadyChosen,
            AssessError::NoHelpChosen,
        ];
        for e in &input {
            assert!(e.is_input_error(), "{e}");
            assert!(!e.is_config_error(), "{e}");
        }
    }

    #[test]
    fn messages_name_the_offender() {
        let e = AssessError::InvalidQuestion {
            index: 7,
            reason: "answer not in options".into(),
        };
        assert_eq!(
            e.to_string(),
            "invalid question at index 7: answer not in options"
        );
        assert_eq!(
            AssessError::EmptyLevel(Level::new("C2")).to_string(),
            "no questions available for level C2"
        );
    }
}
