//! Evaluation configuration

use crate::error::{Result, TmdError};
use crate::imputation::{ImputationOrder, InitialStrategy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Column-keep pattern used by the activity tracker
pub const DEFAULT_KEEP_COLUMNS: &str = "accelerometer|sound|gyroscope";

/// Settings for the iterative imputer built into every pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputerConfig {
    /// Maximum number of imputation rounds
    pub max_iter: usize,
    /// Stopping tolerance, relative to the largest observed magnitude
    pub tol: f64,
    /// Seed for the random visiting order
    pub seed: u64,
    /// How missing values are filled before the first round
    pub initial_strategy: InitialStrategy,
    /// Order in which features are regressed
    pub order: ImputationOrder,
    /// L2 penalty of the per-feature ridge regressions
    pub ridge_alpha: f64,
}

impl Default for ImputerConfig {
    fn default() -> Self {
        Self {
            max_iter: 30,
            tol: 1e-3,
            seed: 0,
            initial_strategy: InitialStrategy::Mean,
            order: ImputationOrder::Ascending,
            ridge_alpha: 1e-3,
        }
    }
}

/// Cross-validation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvConfig {
    /// Number of folds (at least 2)
    pub n_splits: usize,
    /// Keep class proportions in every fold
    pub stratified: bool,
    /// Shuffle before splitting
    pub shuffle: bool,
    /// Seed used when shuffling
    pub seed: Option<u64>,
}

impl Default for CvConfig {
    fn default() -> Self {
        Self {
            n_splits: 5,
            stratified: true,
            shuffle: false,
            seed: None,
        }
    }
}

/// Train/test split settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of rows held out for testing, in (0, 1)
    pub test_fraction: f64,
    pub seed: u64,
    /// Keep class proportions in both halves
    pub stratify: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 0,
            stratify: true,
        }
    }
}

/// Top-level configuration for a comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Label column
    pub target_column: String,
    /// Regex matched against normalized column names
    pub keep_columns: String,
    /// Columns with a higher missing percentage are dropped
    pub missing_threshold: f64,
    pub imputer: ImputerConfig,
    pub cv: CvConfig,
    pub split: SplitConfig,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            target_column: "target".to_string(),
            keep_columns: DEFAULT_KEEP_COLUMNS.to_string(),
            missing_threshold: 40.0,
            imputer: ImputerConfig::default(),
            cv: CvConfig::default(),
            split: SplitConfig::default(),
        }
    }
}

impl EvaluationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; missing fields take their defaults.
    ///
    /// Not validated here: callers apply their overrides first, then call
    /// [`EvaluationConfig::validate`] on the merged result.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }

    pub fn with_keep_columns(mut self, pattern: impl Into<String>) -> Self {
        self.keep_columns = pattern.into();
        self
    }

    pub fn with_missing_threshold(mut self, threshold: f64) -> Self {
        self.missing_threshold = threshold;
        self
    }

    pub fn with_cv_folds(mut self, n_splits: usize) -> Self {
        self.cv.n_splits = n_splits;
        self
    }

    pub fn with_imputer(mut self, imputer: ImputerConfig) -> Self {
        self.imputer = imputer;
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.split.test_fraction = fraction;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.cv.n_splits < 2 {
            return Err(invalid("cv.n_splits", self.cv.n_splits, "must be at least 2"));
        }
        if self.imputer.max_iter == 0 {
            return Err(invalid("imputer.max_iter", self.imputer.max_iter, "must be positive"));
        }
        if !(self.imputer.tol.is_finite() && self.imputer.tol >= 0.0) {
            return Err(invalid("imputer.tol", self.imputer.tol, "must be a non-negative number"));
        }
        if !(self.split.test_fraction > 0.0 && self.split.test_fraction < 1.0) {
            return Err(invalid(
                "split.test_fraction",
                self.split.test_fraction,
                "must lie strictly between 0 and 1",
            ));
        }
        if !self.missing_threshold.is_finite() {
            return Err(invalid("missing_threshold", self.missing_threshold, "must be finite"));
        }
        if self.target_column.is_empty() {
            return Err(TmdError::ConfigError("target_column must not be empty".to_string()));
        }
        regex::Regex::new(&self.keep_columns)?;
        Ok(())
    }
}

fn invalid(name: &str, value: impl ToString, reason: &str) -> TmdError {
    TmdError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
