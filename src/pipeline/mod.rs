//! Impute -> scale -> model pipelines.
//!
//! Each pipeline owns its own imputer, scaler and estimator. Nothing is shared
//! between pipelines, so fitting one never changes another.

use crate::config::ImputerConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{Result, TmdError};
use crate::imputation::{Imputer, IterativeImputer};
use crate::preprocessing::StandardScaler;
use crate::registry::Registry;
use crate::training::{Estimator, ModelRegistry};
use ndarray::{Array1, Array2};
use tracing::debug;

/// Step names, in execution order
pub const STEP_NAMES: [&str; 3] = ["imputer", "scaler", "model"];

/// Ordered composition of imputer, scaler and classifier
#[derive(Debug)]
pub struct Pipeline {
    imputer: IterativeImputer,
    scaler: StandardScaler,
    model: Box<dyn Estimator>,
    n_features: Option<usize>,
}

impl Pipeline {
    /// Build an unfitted pipeline around `model`
    pub fn new(model: Box<dyn Estimator>, imputer: &ImputerConfig) -> Self {
        Self {
            imputer: IterativeImputer::from_config(imputer),
            scaler: StandardScaler::new(),
            model,
            n_features: None,
        }
    }

    /// Names of the steps, in execution order
    pub fn steps(&self) -> [&'static str; 3] {
        STEP_NAMES
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    pub fn model(&self) -> &dyn Estimator {
        self.model.as_ref()
    }

    pub fn imputer(&self) -> &IterativeImputer {
        &self.imputer
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn is_fitted(&self) -> bool {
        self.n_features.is_some()
    }

    /// Fresh copy of the definition with no learned state
    pub fn unfitted(&self) -> Pipeline {
        Pipeline {
            imputer: self.imputer.unfitted(),
            scaler: StandardScaler::new(),
            model: self.model.unfitted(),
            n_features: None,
        }
    }

    /// Fit every step in order; returns the merged diagnostics
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Diagnostics> {
        if x.nrows() != y.len() {
            return Err(TmdError::shape("y length", x.nrows(), y.len()));
        }
        self.n_features = None;

        let (imputed, mut diagnostics) = self.imputer.fit_transform(x)?;
        let scaled = self.scaler.fit_transform(&imputed)?;
        diagnostics.extend(self.model.fit(&scaled, y)?);

        self.n_features = Some(x.ncols());
        debug!(
            model = self.model.name(),
            rows = x.nrows(),
            cols = x.ncols(),
            warnings = diagnostics.len(),
            "pipeline fitted"
        );
        Ok(diagnostics)
    }

    /// Impute, scale, predict
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let expected = self.n_features.ok_or(TmdError::ModelNotFitted)?;
        if x.ncols() != expected {
            return Err(TmdError::shape("n_features", expected, x.ncols()));
        }

        let imputed = self.imputer.transform(x)?;
        let scaled = self.scaler.transform(&imputed)?;
        self.model.predict(&scaled)
    }
}

/// Wrap every registered model in its own fresh pipeline, keeping names and order
pub fn build_pipelines(models: &ModelRegistry, imputer: &ImputerConfig) -> Registry<Pipeline> {
    models.map(|_, model| Pipeline::new(model.unfitted(), imputer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{default_registry, DummyClassifier, LogisticRegression};
    use ndarray::array;

    fn data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [1.0, 10.0],
            [1.2, f64::NAN],
            [0.8, 11.0],
            [5.0, 50.0],
            [f64::NAN, 52.0],
            [5.2, 49.0],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_steps_are_fixed() {
        let p = Pipeline::new(Box::new(DummyClassifier::most_frequent()), &ImputerConfig::default());
        assert_eq!(p.steps(), ["imputer", "scaler", "model"]);
        assert!(!p.is_fitted());
    }

    #[test]
    fn test_fit_predict_with_missing_values() {
        let (x, y) = data();
        let mut p = Pipeline::new(Box::new(LogisticRegression::new()), &ImputerConfig::default());
        p.fit(&x, &y).unwrap();

        assert!(p.is_fitted());
        assert!(p.imputer().is_fitted());
        assert!(p.scaler().is_fitted());
        assert_eq!(p.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_predict_before_fit() {
        let (x, _) = data();
        let p = Pipeline::new(Box::new(DummyClassifier::most_frequent()), &ImputerConfig::default());
        assert!(matches!(p.predict(&x), Err(TmdError::ModelNotFitted)));
    }

    #[test]
    fn test_unfitted_copy_is_independent() {
        let (x, y) = data();
        let mut p = Pipeline::new(Box::new(DummyClassifier::most_frequent()), &ImputerConfig::default());
        p.fit(&x, &y).unwrap();

        let fresh = p.unfitted();
        assert!(!fresh.is_fitted());
        assert!(p.is_fitted());
        assert_eq!(fresh.model_name(), "dummy");
    }

    #[test]
    fn test_build_pipelines_keeps_names_and_order() {
        let models = default_registry().unwrap();
        let pipelines = build_pipelines(&models, &ImputerConfig::default());

        let names: Vec<&str> = pipelines.names().collect();
        let model_names: Vec<&str> = models.names().collect();
        assert_eq!(names, model_names);
        assert!(pipelines.iter().all(|(_, p)| !p.is_fitted()));
    }

    #[test]
    fn test_pipelines_share_no_state() {
        let (x, y) = data();
        let models = default_registry().unwrap();
        let mut pipelines = build_pipelines(&models, &ImputerConfig::default());

        pipelines.get_mut("knn").unwrap().fit(&x, &y).unwrap();
        assert!(pipelines.get("knn").unwrap().is_fitted());
        assert!(!pipelines.get("dummy").unwrap().is_fitted());
    }
}
