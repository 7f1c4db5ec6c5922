//! Missing-value imputation
//!
//! The pipelines use [`IterativeImputer`]: each incomplete feature is modeled
//! as a ridge regression on the others, refined over a bounded number of
//! rounds.

mod iterative;

pub use iterative::IterativeImputer;

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Strategy for the fill used before the first regression round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitialStrategy {
    /// Mean imputation
    Mean,
    /// Median imputation
    Median,
    /// Most frequent value (smallest on ties)
    MostFrequent,
    /// Constant value (0)
    Constant,
}

/// Order in which incomplete features are regressed within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImputationOrder {
    /// Fewest missing values first
    Ascending,
    /// Most missing values first
    Descending,
    /// Left to right
    Roman,
    /// Seeded shuffle, redrawn every round
    Random,
}

/// Trait for imputers
pub trait Imputer: Send + Sync {
    /// Learn imputation parameters from data with missing values.
    ///
    /// Non-convergence is reported in the returned diagnostics, not as an error.
    fn fit(&mut self, x: &Array2<f64>) -> Result<Diagnostics>;

    /// Fill missing values using the learned parameters
    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Fit and transform in one step
    fn fit_transform(&mut self, x: &Array2<f64>) -> Result<(Array2<f64>, Diagnostics)> {
        let diagnostics = self.fit(x)?;
        Ok((self.transform(x)?, diagnostics))
    }
}

/// Check if value is missing (NaN)
#[inline]
pub fn is_missing(v: f64) -> bool {
    v.is_nan()
}
