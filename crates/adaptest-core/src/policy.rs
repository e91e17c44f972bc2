//! Scoring, leveling, and timing policy.
//!
//! The outcome table is fixed: each terminal outcome of a question maps to
//! exactly one score delta and one level move.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ladder::LevelMove;
use crate::model::HelpModality;

/// How a question ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    CorrectFirstTry,
    CorrectAfterHint,
    WrongAfterHint,
    CorrectAfterExample,
    WrongAfterExample,
    HelpTimeout,
}

/// Score change and level move applied when a question finalizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    pub score_delta: i32,
    pub level_move: LevelMove,
}

impl Outcome {
    /// Outcome of a second answer given with `modality`.
    pub fn after_help(modality: HelpModality, correct: bool) -> Self {
        match (modality, correct) {
            (HelpModality::Hint, true) => Outcome::CorrectAfterHint,
            (HelpModality::Hint, false) => Outcome::WrongAfterHint,
            (HelpModality::Example, true) => Outcome::CorrectAfterExample,
            (HelpModality::Example, false) => Outcome::WrongAfterExample,
        }
    }

    /// The example path never moves the level up, even when correct.
    pub fn effect(self) -> Effect {
        let (score_delta, level_move) = match self {
            Outcome::CorrectFirstTry => (5, LevelMove::Up),
            Outcome::CorrectAfterHint => (3, LevelMove::Up),
            Outcome::WrongAfterHint => (-2, LevelMove::Down),
            Outcome::CorrectAfterExample => (2, LevelMove::Stay),
            Outcome::WrongAfterExample => (-2, LevelMove::Down),
            Outcome::HelpTimeout => (-2, LevelMove::Down),
        };
        Effect {
            score_delta,
            level_move,
        }
    }

    pub fn is_correct(self) -> bool {
        matches!(
            self,
            Outcome::CorrectFirstTry | Outcome::CorrectAfterHint | Outcome::CorrectAfterExample
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::CorrectFirstTry => "correct on first attempt",
            Outcome::CorrectAfterHint => "correct with hint",
            Outcome::WrongAfterHint => "wrong with hint",
            Outcome::CorrectAfterExample => "correct with example",
            Outcome::WrongAfterExample => "wrong with example",
            Outcome::HelpTimeout => "help time expired",
        };
        f.write_str(s)
    }
}

/// Timing thresholds for the ask and help stages.
///
/// `reward_deadline` and `auto_escalate` are independent: a correct answer
/// after the deadline but before auto-escalation still goes to help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingPolicy {
    /// Displayed budget for the ask stage.
    pub ask_budget: Duration,
    /// Ask-stage elapsed time at which help is offered automatically.
    pub auto_escalate: Duration,
    /// Latest first-answer time that still earns the first-try reward.
    pub reward_deadline: Duration,
    /// Longest help-stage time before the question times out.
    pub help_window: Duration,
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self {
            ask_budget: Duration::from_secs(180),
            auto_escalate: Duration::from_secs(178),
            reward_deadline: Duration::from_secs(120),
            help_window: Duration::from_secs(60),
        }
    }
}

impl TimingPolicy {
    pub fn should_auto_escalate(&self, ask_elapsed: Duration) -> bool {
        ask_elapsed >= self.auto_escalate
    }

    pub fn within_reward_deadline(&self, ask_elapsed: Duration) -> bool {
        ask_elapsed <= self.reward_deadline
    }

    pub fn help_expired(&self, help_elapsed: Duration) -> bool {
        help_elapsed > self.help_window
    }

    /// Time left in the ask budget, clamped at zero.
    pub fn ask_remaining(&self, ask_elapsed: Duration) -> Duration {
        self.ask_budget.saturating_sub(ask_elapsed)
    }

    pub fn help_remaining(&self, help_elapsed: Duration) -> Duration {
        self.help_window.saturating_sub(help_elapsed)
    }
}
