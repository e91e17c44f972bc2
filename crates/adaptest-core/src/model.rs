//! Core data model types for adaptest.
//!
//! These are the types that flow between the stage engine, the session
//! driver, and the presentation layer.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ladder::Level;
use crate::policy::Outcome;

/// A single multiple-choice question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Level this question belongs to.
    pub level: Level,
    /// Question text.
    pub text: String,
    /// Answer options in display order. At least two.
    pub options: Vec<String>,
    /// The correct option; appears exactly once in `options`.
    pub answer: String,
    /// Hint shown when the test-taker chooses hint help.
    pub hint: String,
    /// Worked example shown when the test-taker chooses example help.
    pub example: String,
}

impl Question {
    pub fn is_correct(&self, answer: &str) -> bool {
        self.answer == answer
    }

    /// Text of the chosen help modality.
    pub fn assistance(&self, modality: HelpModality) -> &str {
        match modality {
            HelpModality::Hint => &self.hint,
            HelpModality::Example => &self.example,
        }
    }
}

/// Stage a question is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Ask,
    Help,
    Final,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Ask => write!(f, "ask"),
            Stage::Help => write!(f, "help"),
            Stage::Final => write!(f, "final"),
        }
    }
}

/// Assistance type selected in the help stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HelpModality {
    Hint,
    Example,
}

impl fmt::Display for HelpModality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HelpModality::Hint => write!(f, "hint"),
            HelpModality::Example => write!(f, "example"),
        }
    }
}

impl FromStr for HelpModality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "h" | "hint" => Ok(HelpModality::Hint),
            "e" | "example" => Ok(HelpModality::Example),
            other => Err(format!("unknown help modality: {other}")),
        }
    }
}

/// Self-reported confidence attached to the first answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Confidence {
    #[default]
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "High"),
            Confidence::Medium => write!(f, "Medium"),
            Confidence::Low => write!(f, "Low"),
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" | "h" => Ok(Confidence::High),
            "medium" | "med" | "m" => Ok(Confidence::Medium),
            "low" | "l" => Ok(Confidence::Low),
            other => Err(format!("unknown confidence: {other}")),
        }
    }
}

/// One input to the stage engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Timer tick with no test-taker input.
    Tick,
    /// First answer, accepted in `Ask`.
    SubmitAnswer {
        answer: String,
        confidence: Confidence,
    },
    /// Help modality choice, accepted in `Help`.
    ChooseHelp(HelpModality),
    /// Second answer, accepted in `Help` after a choice.
    SubmitSecondAnswer { answer: String },
}

impl SessionEvent {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Tick => "tick",
            SessionEvent::SubmitAnswer { .. } => "submit_answer",
            SessionEvent::ChooseHelp(_) => "choose_help",
            SessionEvent::SubmitSecondAnswer { .. } => "submit_second_answer",
        }
    }
}

/// Why an `Ask` submission was sent to `Help`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    Wrong,
    Slow,
    WrongAndSlow,
}

/// What an accepted event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A tick crossed no threshold.
    Waiting,
    /// `Ask` ran out of time and moved to `Help` on its own.
    AutoEscalated,
    /// A first answer moved the question to `Help`.
    Escalated { reason: EscalationReason },
    /// A help modality was selected.
    HelpChosen(HelpModality),
    /// The question reached `Final`.
    Finalized {
        outcome: Outcome,
        score_delta: i32,
        level: Level,
    },
}

/// Everything the presentation layer needs to render the current stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageView {
    Ask {
        /// 1-based question number.
        number: u32,
        quota: u32,
        score: i32,
        level: Level,
        text: String,
        options: Vec<String>,
        /// Time left in the ask budget.
        remaining: Duration,
    },
    Help {
        text: String,
        options: Vec<String>,
        /// Chosen modality and its text, once picked.
        assistance: Option<(HelpModality, String)>,
        /// Time left in the help window.
        remaining: Duration,
    },
    Final,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modality_and_confidence_parse() {
        assert_eq!("h".parse::<HelpModality>().unwrap(), HelpModality::Hint);
        assert_eq!(
            "Example".parse::<HelpModality>().unwrap(),
            HelpModality::Example
        );
        assert!("video".parse::<HelpModality>().is_err());

        assert_eq!("LOW".parse::<Confidence>().unwrap(), Confidence::Low);
        assert_eq!("med".parse::<Confidence>().unwrap(), Confidence::Medium);
        assert!("sure".parse::<Confidence>().is_err());
        assert_eq!(Confidence::default(), Confidence::High);
    }

    #[test]
    fn assistance_matches_modality() {
        let q = Question {
            level: Level::new("B1"),
            text: "Pick the animal".into(),
            options: vec!["cat".into(), "car".into()],
            answer: "cat".into(),
            hint: "It meows".into(),
            example: "The cat sat on the mat.".into(),
        };
        assert_eq!(q.assistance(HelpModality::Hint), "It meows");
        assert_eq!(q.assistance(HelpModality::Example), "The cat sat on the mat.");
        assert!(q.is_correct("cat"));
        assert!(!q.is_correct("Cat"));
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Help.to_string(), "help");
        assert_eq!(
            serde_json::to_string(&HelpModality::Example).unwrap(),
            "\"example\""
        );
    }
}
