//! Tracker configuration
//!
//! Defaults reproduce the stock regression policy; every field can be
//! overridden from the environment with [`TrackerConfig::from_env`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DATA_DIR_ENV: &str = "PERFTRACK_DATA_DIR";
pub const HISTORY_LIMIT_ENV: &str = "PERFTRACK_HISTORY_LIMIT";
pub const GIT_COMMIT_ENV: &str = "PERFTRACK_GIT_COMMIT";
pub const BUILD_NUMBER_ENV: &str = "PERFTRACK_BUILD_NUMBER";
pub const ENVIRONMENT_ENV: &str = "PERFTRACK_ENVIRONMENT";

/// Default directory holding history and baseline files
pub const DEFAULT_DATA_DIR: &str = "performance-history";

/// Default number of history entries retained per test
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Where a recorded run came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub git_commit: String,
    pub build_number: String,
    pub environment: String,
}

impl Provenance {
    pub(crate) fn default_git_commit() -> String {
        "unknown".to_string()
    }

    pub(crate) fn default_build_number() -> String {
        "local".to_string()
    }

    pub(crate) fn default_environment() -> String {
        "test".to_string()
    }

    /// Read provenance from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str, default: fn() -> String| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(default)
        };

        Self {
            git_commit: read(GIT_COMMIT_ENV, Self::default_git_commit),
            build_number: read(BUILD_NUMBER_ENV, Self::default_build_number),
            environment: read(ENVIRONMENT_ENV, Self::default_environment),
        }
    }
}

impl Default for Provenance {
    fn default() -> Self {
        Self {
            git_commit: Self::default_git_commit(),
            build_number: Self::default_build_number(),
            environment: Self::default_environment(),
        }
    }
}

/// Thresholds used by the regression analyzer.
///
/// Percentages are relative changes against the baseline value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionThresholds {
    /// Performance score drop that counts as a regression
    pub score_drop_percent: f64,
    /// LCP/FCP increase that counts as a regression
    pub timing_increase_percent: f64,
    /// CLS increase that counts as a regression
    pub layout_shift_increase_percent: f64,
    /// Absolute change above which severity is HIGH
    pub severe_change_percent: f64,
    /// Number of recent history points inspected for a trend
    pub trend_window: usize,
    /// Fewer points than this skips the trend check
    pub min_trend_points: usize,
    /// Fraction of downward moves that constitutes a trend
    pub downward_trend_ratio: f64,
}

impl Default for RegressionThresholds {
    fn default() -> Self {
        Self {
            score_drop_percent: 10.0,
            timing_increase_percent: 20.0,
            layout_shift_increase_percent: 50.0,
            severe_change_percent: 30.0,
            trend_window: 5,
            min_trend_points: 3,
            downward_trend_ratio: 0.7,
        }
    }
}

/// Top-level tracker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub data_dir: PathBuf,
    pub history_limit: usize,
    pub thresholds: RegressionThresholds,
    pub provenance: Provenance,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            history_limit: DEFAULT_HISTORY_LIMIT,
            thresholds: RegressionThresholds::default(),
            provenance: Provenance::default(),
        }
    }
}

impl TrackerConfig {
    /// Defaults overridden by `PERFTRACK_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self {
            provenance: Provenance::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(limit) = lookup(HISTORY_LIMIT_ENV) {
            config.history_limit = limit.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("{} must be a positive integer, got '{}'", HISTORY_LIMIT_ENV, limit))
            })?;
            if config.history_limit == 0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be greater than zero",
                    HISTORY_LIMIT_ENV
                )));
            }
        }

        Ok(config)
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }
}
