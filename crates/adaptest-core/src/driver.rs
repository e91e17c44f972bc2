//! Session driver.
//!
//! Runs repeated question cycles: pick a question for the current level,
//! feed input events and timer ticks to the stage engine one at a time until
//! the question is final, record it, and stop at the quota. The finished log
//! goes to the export sink exactly once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::bank::QuestionBank;
use crate::clock::Clock;
use crate::engine::StageEngine;
use crate::ladder::Level;
use crate::model::{SessionEvent, Stage, Transition};
use crate::record::SessionLog;
use crate::session::SessionState;
use crate::traits::{ExportSink, Presenter, ProgressReporter};

/// Per-session settings.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Questions to complete.
    pub quota: u32,
    /// Level of the first question.
    pub start_level: Level,
    /// Test-taker name, if given.
    pub participant: Option<String>,
}

/// Drives one or more sessions against a shared, read-only bank.
pub struct SessionDriver {
    bank: Arc<QuestionBank>,
    engine: StageEngine,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    tick_interval: Duration,
}

impl SessionDriver {
    pub fn new(bank: Arc<QuestionBank>, engine: StageEngine, clock: Arc<dyn Clock>) -> Self {
        Self {
            bank,
            engine,
            clock,
            rng: StdRng::from_os_rng(),
            tick_interval: Duration::from_millis(500),
        }
    }

    /// Make question selection reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Longest wait for input before a timer tick is evaluated.
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn engine(&self) -> &StageEngine {
        &self.engine
    }

    /// Run a full session and hand the log to `sink`.
    pub async fn run_session(
        &mut self,
        options: SessionOptions,
        presenter: &mut dyn Presenter,
        progress: &dyn ProgressReporter,
        sink: &dyn ExportSink,
    ) -> Result<SessionLog> {
        self.engine.ladder().position(&options.start_level)?;

        let started_at = chrono::Utc::now();
        let wall_start = Instant::now();
        let id = Uuid::new_v4();
        let mut state = SessionState::new(options.start_level, options.quota);

        tracing::info!(%id, quota = options.quota, level = %state.level, "session started");

        while !state.is_complete() {
            let question = self.bank.pick(&state.level, &mut self.rng)?;
            progress.on_question_start(
                state.question_index + 1,
                state.quota,
                state.level.as_str(),
            );
            state.begin_question(question, self.clock.now());

            self.drive_question(&mut state, presenter, progress).await?;

            if let Some(record) = state.finalize_question() {
                tracing::info!(
                    number = record.number,
                    outcome = %record.outcome,
                    score = record.score_after,
                    level = %record.level_after,
                    "question finalized"
                );
                progress.on_question_complete(record);
            }
        }

        let log = SessionLog {
            id,
            participant: options.participant,
            started_at,
            finished_at: chrono::Utc::now(),
            quota: state.quota,
            final_score: state.score,
            final_level: state.level.clone(),
            records: std::mem::take(&mut state.log),
            duration_ms: wall_start.elapsed().as_millis() as u64,
        };

        tracing::info!(%id, score = log.final_score, level = %log.final_level, "session complete");
        progress.on_session_complete(&log);

        let paths = sink.export(&log).await?;
        tracing::info!(%id, files = paths.len(), "session log exported");

        Ok(log)
    }

    /// Feed events to the engine until the active question is final.
    async fn drive_question(
        &self,
        state: &mut SessionState,
        presenter: &mut dyn Presenter,
        progress: &dyn ProgressReporter,
    ) -> Result<()> {
        let timing = *self.engine.timing();
        let mut needs_render = true;

        while state.stage != Stage::Final {
            if needs_render {
                if let Some(view) = state.view(&timing, self.clock.now()) {
                    presenter.render(&view).await?;
                }
            }

            let event = match tokio::time::timeout(self.tick_interval, presenter.next_input()).await
            {
                Ok(Ok(Some(event))) => event,
                Ok(Ok(None)) => {
                    anyhow::bail!(
                        "input closed after {} of {} questions",
                        state.question_index,
                        state.quota
                    )
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => SessionEvent::Tick,
            };

            // One clock reading per event; it is the value recorded.
            let now = self.clock.now();
            match self.engine.handle(state, &event, now) {
                Ok(transition) => {
                    needs_render = !matches!(transition, Transition::Waiting);
                    presenter.feedback(&transition).await?;
                }
                Err(e) if e.is_input_error() => {
                    tracing::warn!(event = event.name(), stage = %state.stage, "rejected input: {e}");
                    progress.on_input_rejected(&e);
                    presenter.rejected(&e).await?;
                    needs_render = false;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }
}
