//! Baseline classifier that ignores its features

use crate::diagnostics::Diagnostics;
use crate::error::{Result, TmdError};
use crate::training::models::{check_width, check_xy, classes_of, Estimator};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// What the baseline predicts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DummyStrategy {
    /// Most frequent training label (smallest code on ties)
    MostFrequent,
    /// Always the given class code
    Constant(f64),
}

/// Constant-prediction classifier, useful as a comparison floor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DummyClassifier {
    strategy: DummyStrategy,
    prediction: Option<f64>,
    n_features: usize,
}

impl DummyClassifier {
    pub fn new(strategy: DummyStrategy) -> Self {
        Self {
            strategy,
            prediction: None,
            n_features: 0,
        }
    }

    pub fn most_frequent() -> Self {
        Self::new(DummyStrategy::MostFrequent)
    }

    pub fn constant(code: f64) -> Self {
        Self::new(DummyStrategy::Constant(code))
    }
}

impl Default for DummyClassifier {
    fn default() -> Self {
        Self::most_frequent()
    }
}

impl Estimator for DummyClassifier {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Diagnostics> {
        check_xy(x, y)?;

        let prediction = match self.strategy {
            DummyStrategy::Constant(code) => code,
            DummyStrategy::MostFrequent => {
                let mut best = 0.0;
                let mut best_count = 0;
                for class in classes_of(y) {
                    let count = y.iter().filter(|&&v| v == class).count();
                    if count > best_count {
                        best = class;
                        best_count = count;
                    }
                }
                best
            }
        };

        self.prediction = Some(prediction);
        self.n_features = x.ncols();
        Ok(Diagnostics::new())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let prediction = self.prediction.ok_or(TmdError::ModelNotFitted)?;
        check_width(self.n_features, x)?;
        Ok(Array1::from_elem(x.nrows(), prediction))
    }

    fn unfitted(&self) -> Box<dyn Estimator> {
        Box::new(Self::new(self.strategy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_most_frequent() {
        let x = Array2::zeros((5, 2));
        let y = array![1.0, 2.0, 2.0, 1.0, 2.0];
        let mut model = DummyClassifier::most_frequent();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&Array2::zeros((2, 2))).unwrap(), array![2.0, 2.0]);
    }

    #[test]
    fn test_tie_prefers_smallest() {
        let x = Array2::zeros((4, 1));
        let y = array![3.0, 1.0, 3.0, 1.0];
        let mut model = DummyClassifier::most_frequent();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&Array2::zeros((1, 1))).unwrap()[0], 1.0);
    }

    #[test]
    fn test_constant_and_unfitted() {
        let mut model = DummyClassifier::constant(7.0);
        assert!(matches!(model.predict(&Array2::zeros((1, 1))), Err(TmdError::ModelNotFitted)));

        model.fit(&Array2::zeros((2, 1)), &array![0.0, 1.0]).unwrap();
        assert_eq!(model.predict(&Array2::zeros((3, 1))).unwrap(), array![7.0, 7.0, 7.0]);

        let fresh = model.unfitted();
        assert!(fresh.predict(&Array2::zeros((1, 1))).is_err());
    }
}
