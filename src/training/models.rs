//! Estimator trait and classification metrics

use crate::diagnostics::Diagnostics;
use crate::error::{Result, TmdError};
use ndarray::{Array1, Array2};
use std::fmt;

/// A trainable classifier over dense feature matrices.
///
/// Class labels are encoded as `f64` codes (see
/// [`LabelEncoder`](crate::preprocessing::LabelEncoder)).
pub trait Estimator: Send + Sync + fmt::Debug {
    /// Short identifier of the algorithm
    fn name(&self) -> &'static str;

    /// Fit to training data. Iteration-bound shortfalls are reported as
    /// diagnostics; anything else that goes wrong is an error.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Diagnostics>;

    /// Predict class codes
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Fresh copy with the same hyper-parameters and no learned state
    fn unfitted(&self) -> Box<dyn Estimator>;
}

/// Fraction of exact matches between true and predicted labels
pub fn accuracy_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(TmdError::shape("prediction length", y_true.len(), y_pred.len()));
    }
    if y_true.is_empty() {
        return Err(TmdError::ValidationError(
            "accuracy is undefined for zero samples".to_string(),
        ));
    }

    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();

    Ok(correct as f64 / y_true.len() as f64)
}

/// Shared fit-time check that `x` and `y` agree on sample count
pub(crate) fn check_xy(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(TmdError::shape("y length", x.nrows(), y.len()));
    }
    if x.nrows() == 0 {
        return Err(TmdError::TrainingError("cannot fit on zero samples".to_string()));
    }
    Ok(())
}

/// Shared predict-time check of feature count
pub(crate) fn check_width(expected: usize, x: &Array2<f64>) -> Result<()> {
    if x.ncols() != expected {
        return Err(TmdError::shape("n_features", expected, x.ncols()));
    }
    Ok(())
}

/// Sorted distinct class codes
pub(crate) fn classes_of(y: &Array1<f64>) -> Vec<f64> {
    let mut classes: Vec<f64> = y.to_vec();
    classes.sort_by(|a, b| a.total_cmp(b));
    classes.dedup();
    classes
}
