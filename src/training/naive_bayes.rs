//! Naive Bayes classifiers
//!
//! Implements Gaussian Naive Bayes for continuous features.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::diagnostics::Diagnostics;
use crate::error::{Result, TmdError};
use crate::training::models::{check_width, check_xy, classes_of, Estimator};

/// Gaussian Naive Bayes Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    /// Mean of each feature, one row per class
    means: Option<Array2<f64>>,
    /// Variance of each feature, one row per class
    variances: Option<Array2<f64>>,
    /// Prior probability of each class
    priors: Vec<f64>,
    /// Sorted class codes
    classes: Vec<f64>,
    /// Portion of the largest feature variance added to all variances
    var_smoothing: f64,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNaiveBayes {
    pub fn new() -> Self {
        Self {
            means: None,
            variances: None,
            priors: Vec::new(),
            classes: Vec::new(),
            var_smoothing: 1e-9,
        }
    }

    /// Set variance smoothing parameter
    pub fn with_var_smoothing(mut self, smoothing: f64) -> Self {
        self.var_smoothing = smoothing;
        self
    }

    /// Predict log probabilities, one column per class
    pub fn predict_log_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (means, vars) = match (&self.means, &self.variances) {
            (Some(m), Some(v)) => (m, v),
            _ => return Err(TmdError::ModelNotFitted),
        };
        check_width(means.ncols(), x)?;

        let n_classes = self.classes.len();
        let mut log_probs = Array2::zeros((x.nrows(), n_classes));

        for (i, row) in x.rows().into_iter().enumerate() {
            for j in 0..n_classes {
                log_probs[[i, j]] =
                    self.priors[j].ln() + log_likelihood(row, means.row(j), vars.row(j));
            }
        }

        // Normalize (log-sum-exp trick)
        for mut row in log_probs.rows_mut() {
            let max_val = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let log_sum: f64 = row.iter().map(|&v| (v - max_val).exp()).sum::<f64>().ln();
            for val in row.iter_mut() {
                *val = *val - max_val - log_sum;
            }
        }

        Ok(log_probs)
    }

    /// Predict probabilities
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        Ok(self.predict_log_proba(x)?.mapv(f64::exp))
    }

    /// Class priors in class order
    pub fn class_priors(&self) -> &[f64] {
        &self.priors
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }
}

impl Estimator for GaussianNaiveBayes {
    fn name(&self) -> &'static str {
        "gaussian_nb"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Diagnostics> {
        check_xy(x, y)?;
        let n_samples = x.nrows();
        let n_features = x.ncols();

        let classes = classes_of(y);
        let mut means = Array2::zeros((classes.len(), n_features));
        let mut vars = Array2::zeros((classes.len(), n_features));
        let mut priors = Vec::with_capacity(classes.len());

        for (c, &class) in classes.iter().enumerate() {
            // Single-pass Welford's algorithm for mean and variance
            let mut count = 0usize;
            let mut m2 = vec![0.0; n_features];
            for (row, _) in x.rows().into_iter().zip(y.iter()).filter(|(_, &yi)| yi == class) {
                count += 1;
                for (j, &val) in row.iter().enumerate() {
                    let delta = val - means[[c, j]];
                    means[[c, j]] += delta / count as f64;
                    let delta2 = val - means[[c, j]];
                    m2[j] += delta * delta2;
                }
            }
            for j in 0..n_features {
                vars[[c, j]] = m2[j] / count as f64;
            }
            priors.push(count as f64 / n_samples as f64);
        }

        // Smoothing is relative to the widest feature over the whole training set
        let max_var = x
            .columns()
            .into_iter()
            .map(|col| col.var(0.0))
            .fold(0.0, f64::max);
        let epsilon = (self.var_smoothing * max_var).max(f64::MIN_POSITIVE);
        vars.mapv_inplace(|v| v + epsilon);

        self.means = Some(means);
        self.variances = Some(vars);
        self.priors = priors;
        self.classes = classes;
        Ok(Diagnostics::new())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let log_probs = self.predict_log_proba(x)?;

        Ok(log_probs
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (j, &v) in row.iter().enumerate() {
                    if v > row[best] {
                        best = j;
                    }
                }
                self.classes[best]
            })
            .collect())
    }

    fn unfitted(&self) -> Box<dyn Estimator> {
        Box::new(Self::new().with_var_smoothing(self.var_smoothing))
    }
}

fn log_likelihood(x: ArrayView1<f64>, means: ArrayView1<f64>, vars: ArrayView1<f64>) -> f64 {
    x.iter()
        .zip(means.iter())
        .zip(vars.iter())
        .map(|((&xi, &mean), &var)| -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln()))
        .sum()
}
