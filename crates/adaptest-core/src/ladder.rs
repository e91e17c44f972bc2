//! Proficiency levels and the bounded ladder the adaptive logic walks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AssessError;

/// A proficiency level name, e.g. `"B1"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(String);

impl Level {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Level {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Direction a policy row moves the current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelMove {
    Up,
    Down,
    Stay,
}

/// The default CEFR-style ladder.
pub const DEFAULT_LEVELS: [&str; 4] = ["B1", "B2", "C1", "C2"];

/// An ordered, fixed set of levels from lowest to highest proficiency.
///
/// Stepping past either end clamps instead of wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelLadder {
    levels: Vec<Level>,
}

impl LevelLadder {
    /// Build a ladder from names ordered lowest first.
    ///
    /// Fails on an empty ladder or a repeated level.
    pub fn new<I, S>(levels: I) -> Result<Self, AssessError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let levels: Vec<Level> = levels.into_iter().map(Level::new).collect();
        if levels.is_empty() {
            return Err(AssessError::InvalidConfig("level ladder is empty".into()));
        }
        for (i, level) in levels.iter().enumerate() {
            if levels[..i].contains(level) {
                return Err(AssessError::InvalidConfig(format!(
                    "level {level} appears twice in the ladder"
                )));
            }
        }
        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn lowest(&self) -> &Level {
        &self.levels[0]
    }

    pub fn highest(&self) -> &Level {
        &self.levels[self.levels.len() - 1]
    }

    pub fn contains(&self, level: &Level) -> bool {
        self.levels.contains(level)
    }

    /// Position of `level`, lowest = 0.
    pub fn position(&self, level: &Level) -> Result<usize, AssessError> {
        self.levels
            .iter()
            .position(|l| l == level)
            .ok_or_else(|| AssessError::UnknownLevel(level.clone()))
    }

    /// Next higher level, or the same level at the top.
    pub fn step_up(&self, level: &Level) -> Result<Level, AssessError> {
        let idx = self.position(level)?;
        Ok(self.levels[(idx + 1).min(self.levels.len() - 1)].clone())
    }

    /// Next lower level, or the same level at the bottom.
    pub fn step_down(&self, level: &Level) -> Result<Level, AssessError> {
        let idx = self.position(level)?;
        Ok(self.levels[idx.saturating_sub(1)].clone())
    }

    pub fn apply(&self, level: &Level, movement: LevelMove) -> Result<Level, AssessError> {
        match movement {
            LevelMove::Up => self.step_up(level),
            LevelMove::Down => self.step_down(level),
            LevelMove::Stay => {
                self.position(level)?;
                Ok(level.clone())
            }
        }
    }
}

impl Default for LevelLadder {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS.iter().map(|s| Level::new(*s)).collect(),
        }
    }
}
