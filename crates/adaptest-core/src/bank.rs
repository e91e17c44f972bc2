//! Question bank loading, indexing, and validation.
//!
//! Loads a JSON array of question objects, groups them by level while keeping
//! input order, and checks the bank against the level ladder.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Deserialize;

use crate::error::AssessError;
use crate::ladder::{Level, LevelLadder};
use crate::model::Question;

/// One entry of the question bank file, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestion {
    pub level: String,
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub hint: String,
    pub example: String,
}

/// Questions grouped by level. Never mutated after load, so it can be shared
/// between concurrent sessions behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    by_level: HashMap<Level, Vec<Arc<Question>>>,
    total: usize,
}

impl QuestionBank {
    /// Validate and group `raw` questions. Order within a level is preserved.
    pub fn load<I>(raw: I, ladder: &LevelLadder) -> Result<Self, AssessError>
    where
        I: IntoIterator<Item = RawQuestion>,
    {
        let mut bank = QuestionBank::default();
        for (index, entry) in raw.into_iter().enumerate() {
            let question = validate_entry(index, entry, ladder)?;
            bank.by_level
                .entry(question.level.clone())
                .or_default()
                .push(Arc::new(question));
            bank.total += 1;
        }
        Ok(bank)
    }

    /// Questions at `level`, in input order.
    pub fn questions_for(&self, level: &Level) -> Result<&[Arc<Question>], AssessError> {
        match self.by_level.get(level) {
            Some(qs) if !qs.is_empty() => Ok(qs),
            _ => Err(AssessError::EmptyLevel(level.clone())),
        }
    }

    /// Pick a question uniformly at random from `level`.
    pub fn pick<R: Rng + ?Sized>(
        &self,
        level: &Level,
        rng: &mut R,
    ) -> Result<Arc<Question>, AssessError> {
        self.questions_for(level)?
            .choose(rng)
            .cloned()
            .ok_or_else(|| AssessError::EmptyLevel(level.clone()))
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Question count per ladder level, lowest first. Missing levels count 0.
    pub fn level_counts(&self, ladder: &LevelLadder) -> Vec<(Level, usize)> {
        ladder
            .levels()
            .iter()
            .map(|l| (l.clone(), self.by_level.get(l).map_or(0, Vec::len)))
            .collect()
    }
}

fn validate_entry(
    index: usize,
    raw: RawQuestion,
    ladder: &LevelLadder,
) -> Result<Question, AssessError> {
    let invalid = |reason: String| AssessError::InvalidQuestion { index, reason };

    let level = Level::new(raw.level);
    if !ladder.contains(&level) {
        return Err(invalid(format!("level {level} is not on the ladder")));
    }
    if raw.question.trim().is_empty() {
        return Err(invalid("question text is empty".into()));
    }
    if raw.options.len() < 2 {
        return Err(invalid(format!(
            "expected at least 2 options, found {}",
            raw.options.len()
        )));
    }
    match raw.options.iter().filter(|o| **o == raw.answer).count() {
        1 => {}
        0 => {
            return Err(invalid(format!(
                "answer '{}' is not one of the options",
                raw.answer
            )))
        }
        n => {
            return Err(invalid(format!(
                "answer '{}' appears {n} times in the options",
                raw.answer
            )))
        }
    }

    Ok(Question {
        level,
        text: raw.question,
        options: raw.options,
        answer: raw.answer,
        hint: raw.hint,
        example: raw.example,
    })
}

/// Parse a JSON question bank (useful for testing).
pub fn parse_bank_str(content: &str, ladder: &LevelLadder) -> Result<QuestionBank> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(content).context("question bank must be a JSON array")?;

    let raw = entries
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value::<RawQuestion>(value).map_err(|e| {
                AssessError::InvalidQuestion {
                    index,
                    reason: e.to_string(),
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QuestionBank::load(raw, ladder)?)
}

/// Load a JSON question bank file.
pub fn load_bank_file(path: &Path, ladder: &LevelLadder) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    let bank = parse_bank_str(&content, ladder)
        .with_context(|| format!("failed to load question bank: {}", path.display()))?;

    for (level, count) in bank.level_counts(ladder) {
        tracing::info!(%level, count, "loaded questions");
    }
    Ok(bank)
}

/// A non-fatal problem found in a loaded bank.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The level concerned (if applicable).
    pub level: Option<Level>,
    /// Warning message.
    pub message: String,
}

/// Check a loaded bank for problems that surface mid-session.
pub fn validate_bank(bank: &QuestionBank, ladder: &LevelLadder) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // A session that reaches an empty level fails on the next pick
    for (level, count) in bank.level_counts(ladder) {
        if count == 0 {
            warnings.push(ValidationWarning {
                level: Some(level.clone()),
                message: format!("level {level} has no questions"),
            });
        }
    }

    for level in ladder.levels() {
        let Some(questions) = bank.by_level.get(level) else {
            continue;
        };

        let mut seen = HashSet::new();
        for q in questions {
            if !seen.insert(q.text.as_str()) {
                warnings.push(ValidationWarning {
                    level: Some(level.clone()),
                    message: format!("duplicate question: {}", q.text),
                });
            }
            if q.hint.trim().is_empty() {
                warnings.push(ValidationWarning {
                    level: Some(level.clone()),
                    message: format!("empty hint for: {}", q.text),
                });
            }
            if q.example.trim().is_empty() {
                warnings.push(ValidationWarning {
                    level: Some(level.clone()),
                    message: format!("empty example for: {}", q.text),
                });
            }
        }
    }

    warnings
}
