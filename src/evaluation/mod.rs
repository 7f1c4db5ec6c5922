//! Model comparison: fit every pipeline, score it, rank the results.

use crate::config::CvConfig;
use crate::diagnostics::{Evaluated, Phase};
use crate::error::{Result, TmdError};
use crate::pipeline::Pipeline;
use crate::registry::Registry;
use crate::training::{accuracy_score, cross_val_score, CrossValidator};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{info, warn};

/// Scores and timings for one pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub name: String,
    /// Mean cross-validated accuracy on the training data
    pub mean_score: f64,
    /// Population std of the fold accuracies
    pub std_score: f64,
    /// Accuracy on the held-out test data
    pub test_accuracy: f64,
    /// Seconds spent fitting on the full training data
    pub training_time: f64,
    /// Seconds spent predicting the test data
    pub predicting_time: f64,
}

/// Records sorted by descending test accuracy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceTable {
    records: Vec<PerformanceRecord>,
}

impl PerformanceTable {
    /// Sorts `records` by test accuracy, highest first. Ties keep their order.
    pub fn new(mut records: Vec<PerformanceRecord>) -> Self {
        records.sort_by(|a, b| b.test_accuracy.total_cmp(&a.test_accuracy));
        Self { records }
    }

    pub fn records(&self) -> &[PerformanceRecord] {
        &self.records
    }

    pub fn get(&self, name: &str) -> Option<&PerformanceRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Highest test accuracy
    pub fn best(&self) -> Option<&PerformanceRecord> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }
}

impl fmt::Display for PerformanceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .records
            .iter()
            .map(|r| r.name.len())
            .max()
            .unwrap_or(0)
            .max("model".len());

        writeln!(
            f,
            "{:<width$}  {:>10}  {:>9}  {:>13}  {:>13}  {:>15}",
            "model", "mean_score", "std_score", "test_accuracy", "training_time", "predicting_time",
            width = width
        )?;
        for r in &self.records {
            writeln!(
                f,
                "{:<width$}  {:>10.4}  {:>9.4}  {:>13.4}  {:>13.4}  {:>15.4}",
                r.name, r.mean_score, r.std_score, r.test_accuracy, r.training_time, r.predicting_time,
                width = width
            )?;
        }
        Ok(())
    }
}

fn validate_shapes(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<()> {
    if x_train.nrows() != y_train.len() {
        return Err(TmdError::shape("y_train length", x_train.nrows(), y_train.len()));
    }
    if x_test.nrows() != y_test.len() {
        return Err(TmdError::shape("y_test length", x_test.nrows(), y_test.len()));
    }
    if x_train.ncols() != x_test.ncols() {
        return Err(TmdError::shape("x_test columns", x_train.ncols(), x_test.ncols()));
    }
    if x_train.nrows() == 0 || x_test.nrows() == 0 {
        return Err(TmdError::ValidationError(
            "training and test sets must both be non-empty".to_string(),
        ));
    }
    Ok(())
}

/// Fit, time, cross-validate and score every pipeline in registry order.
///
/// Shapes are checked before any fitting. Each pipeline is left fitted on the
/// full training data. Non-convergence never aborts the run; it is returned
/// in the diagnostics tagged with the registry name. Any estimator error
/// aborts the whole comparison.
pub fn evaluate_performance(
    pipelines: &mut Registry<Pipeline>,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
    cv: &CvConfig,
) -> Result<Evaluated<PerformanceTable>> {
    validate_shapes(x_train, y_train, x_test, y_test)?;
    let validator = CrossValidator::from_config(cv);

    let mut records = Vec::with_capacity(pipelines.len());
    let mut evaluated = Evaluated::new(PerformanceTable::default());

    for (name, pipeline) in pipelines.iter_mut() {
        let start = Instant::now();
        let fit_diagnostics = pipeline.fit(x_train, y_train)?;
        let training_time = start.elapsed().as_secs_f64();

        let start = Instant::now();
        let predictions = pipeline.predict(x_test)?;
        let predicting_time = start.elapsed().as_secs_f64();

        let cv_results = cross_val_score(pipeline, x_train, y_train, &validator)?;
        let test_accuracy = accuracy_score(y_test, &predictions)?;

        if !fit_diagnostics.is_empty() || cv_results.is_degraded() {
            warn!(model = name, "fitted with convergence warnings");
        }
        evaluated.record(name, Phase::Training, fit_diagnostics);
        for mut diagnostic in cv_results.diagnostics {
            diagnostic.model = name.to_string();
            evaluated.diagnostics.push(diagnostic);
        }

        info!(
            model = name,
            test_accuracy,
            cv_mean = cv_results.value.mean_score,
            training_time,
            "model evaluated"
        );

        records.push(PerformanceRecord {
            name: name.to_string(),
            mean_score: cv_results.value.mean_score,
            std_score: cv_results.value.std_score,
            test_accuracy,
            training_time,
            predicting_time,
        });
    }

    evaluated.value = PerformanceTable::new(records);
    Ok(evaluated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, acc: f64) -> PerformanceRecord {
        PerformanceRecord {
            name: name.to_string(),
            mean_score: 0.0,
            std_score: 0.0,
            test_accuracy: acc,
            training_time: 0.0,
            predicting_time: 0.0,
        }
    }

    #[test]
    fn test_table_sorted_stable() {
        let table = PerformanceTable::new(vec![
            record("a", 0.5),
            record("b", 0.9),
            record("c", 0.5),
        ]);
        let names: Vec<&str> = table.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(table.best().unwrap().name, "b");
    }

    #[test]
    fn test_display_has_header_and_rows() {
        let table = PerformanceTable::new(vec![record("dummy", 0.25)]);
        let text = table.to_string();
        assert!(text.starts_with("model"));
        assert!(text.contains("dummy"));
        assert!(text.contains("0.2500"));
    }

    #[test]
    fn test_to_json() {
        let table = PerformanceTable::new(vec![record("dummy", 1.0)]);
        let json = table.to_json().unwrap();
        let parsed: Vec<PerformanceRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0].name, "dummy");
    }

    #[test]
    fn test_empty_registry_gives_empty_table() {
        let mut pipelines = Registry::new();
        let x = Array2::zeros((4, 1));
        let y = Array1::zeros(4);
        let result = evaluate_performance(&mut pipelines, &x, &y, &x, &y, &CvConfig::default()).unwrap();
        assert!(result.value.is_empty());
        assert!(!result.is_degraded());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut pipelines = Registry::new();
        let x = Array2::zeros((4, 2));
        let y = Array1::zeros(3);
        let err = evaluate_performance(&mut pipelines, &x, &y, &x, &Array1::zeros(4), &CvConfig::default());
        assert!(matches!(err, Err(TmdError::ShapeError { .. })));
    }
}
