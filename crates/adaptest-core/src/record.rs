//! Per-question records and the session log, with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ladder::Level;
use crate::model::Confidence;
use crate::policy::Outcome;

/// The finalized log entry for one question.
///
/// `hint_binary` and `example_binary` are mutually exclusive: both are 0 when
/// no modality was chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// 1-based position in the session.
    pub number: u32,
    pub question: String,
    /// Level the question was drawn from.
    pub level: Level,
    /// Absent when the ask stage auto-escalated before an answer.
    pub initial_answer: Option<String>,
    pub confidence: Option<Confidence>,
    /// Seconds to the first answer, two decimals.
    pub initial_time: Option<f64>,
    pub hint_binary: u8,
    pub example_binary: u8,
    pub second_answer: Option<String>,
    /// Seconds into the help stage at the second answer, two decimals.
    pub second_time: Option<f64>,
    pub outcome: Outcome,
    pub score_after: i32,
    pub level_after: Level,
}

impl QuestionRecord {
    pub fn used_help(&self) -> bool {
        self.hint_binary == 1 || self.example_binary == 1
    }
}

/// A completed session: metadata plus the ordered question records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    /// Unique session identifier.
    pub id: Uuid,
    /// Test-taker name, if given.
    #[serde(default)]
    pub participant: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub quota: u32,
    pub final_score: i32,
    pub final_level: Level,
    pub records: Vec<QuestionRecord>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl SessionLog {
    /// Participant name lowercased for file names. Anything other than
    /// alphanumerics, `-` and `_` becomes `_`, so the slug is always a
    /// single path component.
    pub fn participant_slug(&self) -> Option<String> {
        self.participant
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| {
                n.chars()
                    .map(|c| {
                        if c.is_alphanumeric() || c == '-' || c == '_' {
                            c
                        } else {
                            '_'
                        }
                    })
                    .collect::<String>()
                    .to_lowercase()
            })
    }

    /// Save the log as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize session log")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write session log to {}", path.display()))?;
        Ok(())
    }

    /// Load a log from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session log from {}", path.display()))?;
        let log: SessionLog =
            serde_json::from_str(&content).context("failed to parse session log JSON")?;
        Ok(log)
    }
}
