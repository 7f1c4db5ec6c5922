//! Label encoding for the activity target column

use crate::error::{Result, TmdError};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Maps class labels to dense codes `0..n_classes` in sorted label order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the distinct labels of `column`
    pub fn fit(&mut self, column: &Column) -> Result<&mut Self> {
        let mut classes = column_labels(column)?;
        classes.sort();
        classes.dedup();

        if classes.is_empty() {
            return Err(TmdError::PreprocessingError(
                "cannot fit label encoder on an empty column".to_string(),
            ));
        }

        self.classes = classes;
        Ok(self)
    }

    /// Encode `column` to class codes
    pub fn transform(&self, column: &Column) -> Result<Array1<f64>> {
        if self.classes.is_empty() {
            return Err(TmdError::ModelNotFitted);
        }

        column_labels(column)?
            .iter()
            .map(|label| {
                self.code(label)
                    .map(|c| c as f64)
                    .ok_or_else(|| TmdError::DataError(format!("unseen label '{}'", label)))
            })
            .collect()
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, column: &Column) -> Result<Array1<f64>> {
        self.fit(column)?;
        self.transform(column)
    }

    /// Label for a class code, if the code is known
    pub fn label(&self, code: f64) -> Option<&str> {
        if code < 0.0 || code.fract() != 0.0 {
            return None;
        }
        self.classes.get(code as usize).map(|s| s.as_str())
    }

    /// Class code for a label
    pub fn code(&self, label: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(label)).ok()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

fn column_labels(column: &Column) -> Result<Vec<String>> {
    if column.null_count() > 0 {
        return Err(TmdError::DataError(format!(
            "label column '{}' has {} missing values",
            column.name(),
            column.null_count()
        )));
    }

    let as_str = column.as_materialized_series().cast(&DataType::String)?;
    let labels = as_str
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect();

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_codes() {
        let column = Column::new("target".into(), &["walking", "still", "car", "still"]);
        let mut encoder = LabelEncoder::new();
        let codes = encoder.fit_transform(&column).unwrap();

        assert_eq!(encoder.classes(), &["car", "still", "walking"]);
        assert_eq!(codes.to_vec(), vec![2.0, 1.0, 0.0, 1.0]);
        assert_eq!(encoder.label(2.0), Some("walking"));
        assert_eq!(encoder.label(3.0), None);
        assert_eq!(encoder.label(0.5), None);
    }

    #[test]
    fn test_unseen_label() {
        let mut encoder = LabelEncoder::new();
        encoder
            .fit(&Column::new("target".into(), &["walking", "still"]))
            .unwrap();

        let result = encoder.transform(&Column::new("target".into(), &["bus"]));
        assert!(matches!(result, Err(TmdError::DataError(_))));
    }

    #[test]
    fn test_missing_labels_rejected() {
        let column = Column::new("target".into(), &[Some("walking"), None]);
        let mut encoder = LabelEncoder::new();
        assert!(encoder.fit(&column).is_err());
    }

    #[test]
    fn test_numeric_labels() {
        let column = Column::new("target".into(), &[1i64, 0, 1]);
        let mut encoder = LabelEncoder::new();
        let codes = encoder.fit_transform(&column).unwrap();
        assert_eq!(codes.to_vec(), vec![1.0, 0.0, 1.0]);
    }
}
