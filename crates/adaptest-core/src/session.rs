//! Mutable state of one test-taker's run.
//!
//! A `SessionState` has exactly one owner. Every mutation goes through
//! `&mut self`, so two inputs can never race on the same session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::ladder::Level;
use crate::model::{Confidence, HelpModality, Question, Stage, StageView};
use crate::policy::{Outcome, TimingPolicy};
use crate::record::QuestionRecord;

/// Per-question answers and timings gathered on the way to `Final`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttemptDraft {
    pub initial_answer: Option<String>,
    pub confidence: Option<Confidence>,
    pub initial_time: Option<Duration>,
    pub second_answer: Option<String>,
    pub second_time: Option<Duration>,
    pub outcome: Option<Outcome>,
}

/// State of a single session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub score: i32,
    pub level: Level,
    /// Questions fully completed.
    pub question_index: u32,
    pub quota: u32,
    pub current_question: Option<Arc<Question>>,
    pub stage: Stage,
    pub ask_started_at: Option<Instant>,
    pub help_started_at: Option<Instant>,
    pub pending_choice: Option<HelpModality>,
    pub draft: AttemptDraft,
    pub log: Vec<QuestionRecord>,
}

impl SessionState {
    pub fn new(start_level: Level, quota: u32) -> Self {
        Self {
            score: 0,
            level: start_level,
            question_index: 0,
            quota,
            current_question: None,
            stage: Stage::Ask,
            ask_started_at: None,
            help_started_at: None,
            pending_choice: None,
            draft: AttemptDraft::default(),
            log: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.question_index >= self.quota
    }

    /// Make `question` active in a fresh `Ask` stage started at `now`.
    pub fn begin_question(&mut self, question: Arc<Question>, now: Instant) {
        self.current_question = Some(question);
        self.stage = Stage::Ask;
        self.ask_started_at = Some(now);
        self.help_started_at = None;
        self.pending_choice = None;
        self.draft = AttemptDraft::default();
    }

    /// Append the record of a question that reached `Final` and release it.
    ///
    /// Returns `None` when no question is active or it has not reached `Final`.
    pub fn finalize_question(&mut self) -> Option<&QuestionRecord> {
        if self.stage != Stage::Final {
            return None;
        }
        let outcome = self.draft.outcome?;
        let question = self.current_question.take()?;

        let record = QuestionRecord {
            number: self.question_index + 1,
            question: question.text.clone(),
            level: question.level.clone(),
            initial_answer: self.draft.initial_answer.take(),
            confidence: self.draft.confidence,
            initial_time: self.draft.initial_time.map(round_secs),
            hint_binary: u8::from(self.pending_choice == Some(HelpModality::Hint)),
            example_binary: u8::from(self.pending_choice == Some(HelpModality::Example)),
            second_answer: self.draft.second_answer.take(),
            second_time: self.draft.second_time.map(round_secs),
            outcome,
            score_after: self.score,
            level_after: self.level.clone(),
        };

        self.log.push(record);
        self.question_index += 1;
        self.ask_started_at = None;
        self.help_started_at = None;
        self.pending_choice = None;
        self.draft = AttemptDraft::default();
        self.log.last()
    }

    /// Render data for the active stage at `now`.
    pub fn view(&self, timing: &TimingPolicy, now: Instant) -> Option<StageView> {
        let question = self.current_question.as_ref()?;
        let view = match self.stage {
            Stage::Ask => StageView::Ask {
                number: self.question_index + 1,
                quota: self.quota,
                score: self.score,
                level: self.level.clone(),
                text: question.text.clone(),
                options: question.options.clone(),
                remaining: timing.ask_remaining(elapsed_since(self.ask_started_at, now)),
            },
            Stage::Help => StageView::Help {
                text: question.text.clone(),
                options: question.options.clone(),
                assistance: self
                    .pending_choice
                    .map(|m| (m, question.assistance(m).to_string())),
                remaining: timing.help_remaining(elapsed_since(self.help_started_at, now)),
            },
            Stage::Final => StageView::Final,
        };
        Some(view)
    }
}

/// Elapsed time since `start`, zero if unset.
pub(crate) fn elapsed_since(start: Option<Instant>, now: Instant) -> Duration {
    start.map_or(Duration::ZERO, |s| now.saturating_duration_since(s))
}

/// Seconds rounded to two decimals, as stored in the record.
fn round_secs(d: Duration) -> f64 {
    (d.as_secs_f64() * 100.0).round() / 100.0
}
