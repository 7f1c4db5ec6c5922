//! Linear classifiers

use crate::diagnostics::{Diagnostic, Diagnostics, Stage};
use crate::error::{Result, TmdError};
use crate::training::models::{check_width, check_xy, classes_of, Estimator};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Multinomial logistic regression trained by full-batch gradient descent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted weights, one column per class
    pub coefficients: Option<Array2<f64>>,
    /// Fitted intercepts, one per class
    pub intercepts: Option<Array1<f64>>,
    /// Class codes in column order
    pub classes: Vec<f64>,
    /// Regularization strength (L2)
    pub alpha: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    /// Learning rate
    pub learning_rate: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercepts: None,
            classes: Vec::new(),
            alpha: 0.01,
            max_iter: 1000,
            tol: 1e-4,
            learning_rate: 0.1,
        }
    }

    /// Set regularization strength
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    /// Set tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Row-wise softmax, shifted by the row max for stability
    fn softmax(z: &mut Array2<f64>) {
        for mut row in z.rows_mut() {
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
    }

    /// Class probabilities, columns ordered as [`LogisticRegression::classes`]
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (coefficients, intercepts) = match (&self.coefficients, &self.intercepts) {
            (Some(w), Some(b)) => (w, b),
            _ => return Err(TmdError::ModelNotFitted),
        };
        check_width(coefficients.nrows(), x)?;

        let mut z = x.dot(coefficients) + intercepts;
        Self::softmax(&mut z);
        Ok(z)
    }
}

impl Estimator for LogisticRegression {
    fn name(&self) -> &'static str {
        "logistic_regression"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Diagnostics> {
        check_xy(x, y)?;
        let (n_samples, n_features) = x.dim();

        let classes = classes_of(y);
        let n_classes = classes.len();

        // One-hot targets
        let mut targets = Array2::<f64>::zeros((n_samples, n_classes));
        for (i, label) in y.iter().enumerate() {
            if let Some(k) = classes.iter().position(|c| c == label) {
                targets[[i, k]] = 1.0;
            }
        }

        let mut weights = Array2::<f64>::zeros((n_features, n_classes));
        let mut bias = Array1::<f64>::zeros(n_classes);
        let lr = self.learning_rate;
        let mut converged = false;
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;

            let mut probs = x.dot(&weights) + &bias;
            Self::softmax(&mut probs);

            let errors = probs - &targets;
            let dw = x.t().dot(&errors) / n_samples as f64 + self.alpha * &weights;
            let db = errors.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_classes));

            let grad_norm = (dw.mapv(|v| v * v).sum() + db.mapv(|v| v * v).sum()).sqrt();
            if grad_norm < self.tol {
                converged = true;
                break;
            }

            weights = weights - lr * dw;
            bias = bias - lr * db;
        }

        self.coefficients = Some(weights);
        self.intercepts = Some(bias);
        self.classes = classes;

        let mut diagnostics = Diagnostics::new();
        if !converged {
            diagnostics.push(Diagnostic::ConvergenceNotReached {
                stage: Stage::Model,
                iterations,
            });
        }
        Ok(diagnostics)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;

        Ok(proba
            .rows()
            .into_iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |acc, (k, &p)| if p > acc.1 { (k, p) } else { acc })
                    .0;
                self.classes[best]
            })
            .collect())
    }

    fn unfitted(&self) -> Box<dyn Estimator> {
        Box::new(Self {
            coefficients: None,
            intercepts: None,
            classes: Vec::new(),
            ..self.clone()
        })
    }
}
