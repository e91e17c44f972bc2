//! Assessment configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::AssessError;
use crate::ladder::{Level, LevelLadder, DEFAULT_LEVELS};
use crate::policy::TimingPolicy;

/// Stage timing thresholds, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_ask_budget")]
    pub ask_budget_secs: u64,
    #[serde(default = "default_auto_escalate")]
    pub auto_escalate_secs: u64,
    #[serde(default = "default_reward_deadline")]
    pub reward_deadline_secs: u64,
    #[serde(default = "default_help_window")]
    pub help_window_secs: u64,
}

fn default_ask_budget() -> u64 {
    180
}
fn default_auto_escalate() -> u64 {
    178
}
fn default_reward_deadline() -> u64 {
    120
}
fn default_help_window() -> u64 {
    60
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            ask_budget_secs: default_ask_budget(),
            auto_escalate_secs: default_auto_escalate(),
            reward_deadline_secs: default_reward_deadline(),
            help_window_secs: default_help_window(),
        }
    }
}

impl TimingConfig {
    pub fn policy(&self) -> TimingPolicy {
        TimingPolicy {
            ask_budget: Duration::from_secs(self.ask_budget_secs),
            auto_escalate: Duration::from_secs(self.auto_escalate_secs),
            reward_deadline: Duration::from_secs(self.reward_deadline_secs),
            help_window: Duration::from_secs(self.help_window_secs),
        }
    }
}

/// Top-level adaptest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentConfig {
    /// Questions per session.
    #[serde(default = "default_quota")]
    pub quota: u32,
    /// Level ladder, lowest first.
    #[serde(default = "default_levels")]
    pub levels: Vec<String>,
    /// Starting level; the lowest level when unset.
    #[serde(default)]
    pub start_level: Option<String>,
    /// Question bank JSON file.
    #[serde(default)]
    pub bank: Option<PathBuf>,
    /// Output directory for exported logs.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Export formats: csv, json, html.
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
    /// Seed for question selection.
    #[serde(default)]
    pub seed: Option<u64>,
    /// How often the driver checks timers without input.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub timing: TimingConfig,
}

fn default_quota() -> u32 {
    20
}
fn default_levels() -> Vec<String> {
    DEFAULT_LEVELS.iter().map(|s| s.to_string()).collect()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./adaptest-results")
}
fn default_formats() -> Vec<String> {
    vec!["csv".to_string()]
}
fn default_tick_interval() -> u64 {
    500
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            quota: default_quota(),
            levels: default_levels(),
            start_level: None,
            bank: None,
            output_dir: default_output_dir(),
            formats: default_formats(),
            seed: None,
            tick_interval_ms: default_tick_interval(),
            timing: TimingConfig::default(),
        }
    }
}

impl AssessmentConfig {
    pub fn ladder(&self) -> Result<LevelLadder, AssessError> {
        LevelLadder::new(self.levels.iter().cloned())
    }

    pub fn start_level(&self) -> Result<Level, AssessError> {
        let ladder = self.ladder()?;
        match &self.start_level {
            Some(name) => {
                let level = Level::new(name.clone());
                ladder.position(&level)?;
                Ok(level)
            }
            None => Ok(ladder.lowest().clone()),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Check that the configuration can drive a session.
    pub fn validate(&self) -> Result<(), AssessError> {
        self.ladder()?;
        self.start_level()?;
        let invalid = |msg: &str| Err(AssessError::InvalidConfig(msg.to_string()));
        if self.quota == 0 {
            return invalid("quota must be at least 1");
        }
        if self.tick_interval_ms == 0 {
            return invalid("tick_interval_ms must be at least 1");
        }
        let t = &self.timing;
        if t.auto_escalate_secs > t.ask_budget_secs {
            return invalid("auto_escalate_secs must not exceed ask_budget_secs");
        }
        if t.help_window_secs == 0 {
            return invalid("help_window_secs must be at least 1");
        }
        Ok(())
    }
}

/// Expand `${VAR_NAME}` references from the environment.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `adaptest.toml` in the current directory
/// 2. `~/.config/adaptest/config.toml`
///
/// Environment overrides: `ADAPTEST_BANK`, `ADAPTEST_QUOTA`.
pub fn load_config_from(path: Option<&Path>) -> Result<AssessmentConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("adaptest.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<AssessmentConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => AssessmentConfig::default(),
    };

    if let Ok(bank) = std::env::var("ADAPTEST_BANK") {
        config.bank = Some(PathBuf::from(bank));
    }
    if let Ok(quota) = std::env::var("ADAPTEST_QUOTA") {
        config.quota = quota
            .trim()
            .parse()
            .with_context(|| format!("invalid ADAPTEST_QUOTA: '{quota}'"))?;
    }

    config.bank = config
        .bank
        .map(|p| PathBuf::from(resolve_env_vars(&p.to_string_lossy())));

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("adaptest"))
}
