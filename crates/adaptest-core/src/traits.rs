//! Trait seams to the presentation layer and the export sink.
//!
//! The core never renders anything or writes files itself; the CLI and the
//! `adaptest-report` crate implement these.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::model::{SessionEvent, StageView, Transition};
use crate::record::{QuestionRecord, SessionLog};
use crate::AssessError;

// ---------------------------------------------------------------------------
// Presentation layer
// ---------------------------------------------------------------------------

/// Renders stages and turns test-taker actions into events.
#[async_trait]
pub trait Presenter: Send {
    /// Show the current stage.
    async fn render(&mut self, view: &StageView) -> anyhow::Result<()>;

    /// Wait for the next input event. `Ok(None)` means the input closed.
    ///
    /// The driver drops this future when a timer tick is due, so it must be
    /// cancel-safe: dropping it must not lose input.
    async fn next_input(&mut self) -> anyhow::Result<Option<SessionEvent>>;

    /// Report what an accepted event did.
    async fn feedback(&mut self, transition: &Transition) -> anyhow::Result<()>;

    /// Report a rejected event.
    async fn rejected(&mut self, _error: &AssessError) -> anyhow::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Export sink
// ---------------------------------------------------------------------------

/// Receives the finished session log exactly once.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Persist the log, returning the paths written.
    async fn export(&self, log: &SessionLog) -> anyhow::Result<Vec<PathBuf>>;
}

/// Discards the log.
pub struct NoopExport;

#[async_trait]
impl ExportSink for NoopExport {
    async fn export(&self, _: &SessionLog) -> anyhow::Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Session-level progress callbacks.
pub trait ProgressReporter: Send + Sync {
    fn on_question_start(&self, number: u32, quota: u32, level: &str);
    fn on_question_complete(&self, record: &QuestionRecord);
    fn on_input_rejected(&self, error: &AssessError);
    fn on_session_complete(&self, log: &SessionLog);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_question_start(&self, _: u32, _: u32, _: &str) {}
    fn on_question_complete(&self, _: &QuestionRecord) {}
    fn on_input_rejected(&self, _: &AssessError) {}
    fn on_session_complete(&self, _: &SessionLog) {}
}
