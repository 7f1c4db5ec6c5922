//! Loading sensor tables and turning them into model inputs

use crate::config::SplitConfig;
use crate::error::{Result, TmdError};
use crate::training::models::classes_of;
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Load a CSV file with a header row, inferring column types
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| TmdError::DataError(format!("{}: {}", path.display(), e)))?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file)
        .finish()?;

    debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded CSV");
    Ok(df)
}

/// Separate the target column from the features
pub fn split_features_target(df: &DataFrame, target: &str) -> Result<(DataFrame, Column)> {
    let y = df
        .column(target)
        .map_err(|_| TmdError::FeatureNotFound(target.to_string()))?
        .clone();
    let x = df.drop(target)?;
    Ok((x, y))
}

/// Row-major f64 matrix of every column; nulls and unparseable values become NaN
pub fn features_to_array(df: &DataFrame) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = df.width();

    let col_data: Vec<Vec<f64>> = df
        .get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series().cast(&DataType::Float64)?;
            let values: Vec<f64> = series
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_data[c][r]))
}

/// Output of [`train_test_split`]
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Seeded shuffle split. With `stratify`, each class contributes its own
/// share of test rows (at least one, leaving at least one for training).
pub fn train_test_split(x: &Array2<f64>, y: &Array1<f64>, config: &SplitConfig) -> Result<TrainTestSplit> {
    let n = x.nrows();
    if n != y.len() {
        return Err(TmdError::shape("y length", n, y.len()));
    }
    if !(config.test_fraction > 0.0 && config.test_fraction < 1.0) {
        return Err(TmdError::InvalidParameter {
            name: "test_fraction".to_string(),
            value: config.test_fraction.to_string(),
            reason: "must be in (0, 1)".to_string(),
        });
    }
    if n < 2 {
        return Err(TmdError::ValidationError(format!(
            "need at least 2 rows to split, got {}",
            n
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let (mut train_idx, mut test_idx) = (Vec::new(), Vec::new());

    if config.stratify {
        for class in classes_of(y) {
            let mut members: Vec<usize> = (0..n).filter(|&i| y[i] == class).collect();
            members.shuffle(&mut rng);
            if members.len() == 1 {
                train_idx.extend(members);
                continue;
            }
            let n_test = ((members.len() as f64 * config.test_fraction).round() as usize)
                .clamp(1, members.len() - 1);
            test_idx.extend_from_slice(&members[..n_test]);
            train_idx.extend_from_slice(&members[n_test..]);
        }
        train_idx.shuffle(&mut rng);
        test_idx.shuffle(&mut rng);
    } else {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);
        let n_test = ((n as f64 * config.test_fraction).ceil() as usize).clamp(1, n - 1);
        test_idx = indices[..n_test].to_vec();
        train_idx = indices[n_test..].to_vec();
    }

    if test_idx.is_empty() {
        return Err(TmdError::DataError(
            "stratified split resulted in an empty test set".to_string(),
        ));
    }

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), &train_idx),
        x_test: x.select(Axis(0), &test_idx),
        y_train: y.select(Axis(0), &train_idx),
        y_test: y.select(Axis(0), &test_idx),
    })
}
