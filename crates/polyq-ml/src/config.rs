//! Classifier configuration.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML or JSON, chosen by extension)
//! 2. Environment variables (with POLYQ_ prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MlError, MlResult};
use crate::optimizer::Method;

/// Training and inference settings of a [`Classifier`](crate::Classifier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Shots per evaluation; `None` runs exact.
    #[serde(default)]
    pub nbshots: Option<u32>,

    /// Shot growth during training
    #[serde(default)]
    pub shot_schedule: ShotSchedule,

    /// Maximum number of loss evaluations per fit
    #[serde(default = "default_budget")]
    pub budget: usize,

    /// Seed of the initial parameters, mini-batches and stochastic optimizers
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Optimization method
    #[serde(default)]
    pub method: Method,

    /// Training rows per evaluation; `None` uses the whole training set.
    #[serde(default)]
    pub batch_size: Option<usize>,
}

/// Shot count growth over the course of a fit.
///
/// Evaluation `e` uses `nbshots + increment · ⌊e / delay⌋` shots, capped at
/// `max_shots` when set. Exact runs (`nbshots = None`) are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotSchedule {
    /// Shots added every `delay` evaluations
    #[serde(default)]
    pub increment: u32,

    /// Evaluations between two increments
    #[serde(default = "default_delay")]
    pub delay: usize,

    /// Upper bound on the shot count
    #[serde(default)]
    pub max_shots: Option<u32>,
}

impl ShotSchedule {
    /// Shots to use at evaluation `evaluation` given the base count.
    pub fn shots_at(&self, base: Option<u32>, evaluation: usize) -> Option<u32> {
        let base = base?;
        let steps = u32::try_from(evaluation / self.delay.max(1)).unwrap_or(u32::MAX);
        let shots = base.saturating_add(self.increment.saturating_mul(steps));
        Some(match self.max_shots {
            Some(max) => shots.min(max),
            None => shots,
        })
    }
}

impl Default for ShotSchedule {
    fn default() -> Self {
        Self {
            increment: 0,
            delay: default_delay(),
            max_shots: None,
        }
    }
}

// Default value functions
fn default_budget() -> usize {
    100
}

fn default_seed() -> u64 {
    42
}

fn default_delay() -> usize {
    20
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            nbshots: None,
            shot_schedule: ShotSchedule::default(),
            budget: default_budget(),
            seed: default_seed(),
            method: Method::default(),
            batch_size: None,
        }
    }
}

impl ClassifierConfig {
    /// Set the shot count.
    pub fn with_nbshots(mut self, nbshots: Option<u32>) -> Self {
        self.nbshots = nbshots;
        self
    }

    /// Set the evaluation budget.
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the optimization method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the mini-batch size.
    pub fn with_batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the shot schedule.
    pub fn with_shot_schedule(mut self, shot_schedule: ShotSchedule) -> Self {
        self.shot_schedule = shot_schedule;
        self
    }

    /// Load configuration from a YAML (`.yaml`, `.yml`) or JSON (`.json`) file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> MlResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let config: ClassifierConfig = match extension.as_deref() {
            Some("yaml" | "yml") => serde_yaml_ng::from_str(&contents)?,
            Some("json") => serde_json::from_str(&contents)?,
            _ => {
                return Err(MlError::InvalidConfig(format!(
                    "cannot tell the format of '{}' (expected .yaml, .yml or .json)",
                    path.display()
                )));
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> MlResult<Self> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let config = config.merge_env_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `POLYQ_*` overrides read through `lookup`.
    ///
    /// Recognized keys: `POLYQ_NBSHOTS` (`exact` or a count), `POLYQ_BUDGET`,
    /// `POLYQ_SEED`, `POLYQ_METHOD`, `POLYQ_BATCH_SIZE`.
    pub fn merge_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> MlResult<Self> {
        if let Some(v) = lookup("POLYQ_NBSHOTS") {
            self.nbshots = match v.trim() {
                "" | "exact" | "none" => None,
                n => Some(parse_env("POLYQ_NBSHOTS", n)?),
            };
        }
        if let Some(v) = lookup("POLYQ_BUDGET") {
            self.budget = parse_env("POLYQ_BUDGET", &v)?;
        }
        if let Some(v) = lookup("POLYQ_SEED") {
            self.seed = parse_env("POLYQ_SEED", &v)?;
        }
        if let Some(v) = lookup("POLYQ_METHOD") {
            self.method = v.parse()?;
        }
        if let Some(v) = lookup("POLYQ_BATCH_SIZE") {
            self.batch_size = Some(parse_env("POLYQ_BATCH_SIZE", &v)?);
        }
        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> MlResult<()> {
        if self.budget == 0 {
            return Err(MlError::InvalidConfig("budget must be at least 1".into()));
        }
        if self.nbshots == Some(0) {
            return Err(MlError::InvalidConfig(
                "nbshots must be positive; use null for exact execution".into(),
            ));
        }
        if self.batch_size == Some(0) {
            return Err(MlError::InvalidConfig("batch_size must be positive".into()));
        }
        if self.shot_schedule.delay == 0 {
            return Err(MlError::InvalidConfig("shot_schedule.delay must be positive".into()));
        }
        if let (Some(base), Some(max)) = (self.nbshots, self.shot_schedule.max_shots) {
            if max < base {
                return Err(MlError::InvalidConfig(format!(
                    "shot_schedule.max_shots ({max}) is below nbshots ({base})"
                )));
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> MlResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| MlError::InvalidConfig(format!("{key}: cannot parse '{value}'")))
}
