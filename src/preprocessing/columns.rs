//! Column selection and missing-value column filtering on data frames

use crate::error::{Result, TmdError};
use polars::prelude::*;
use regex::Regex;
use std::sync::LazyLock;

/// Sensor namespace prefix and statistic tokens stripped before matching.
/// The dots are regex wildcards, as in the column names the sensors emit.
const NAME_NOISE: &str = r"android.sensor.|mean|std|min|max|#";

static NAME_NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NAME_NOISE).expect("static pattern is valid"));

/// Strip the sensor prefix and statistic markers from a column name.
///
/// `android.sensor.accelerometer#mean` becomes `accelerometer`.
pub fn normalize_column_name(name: &str) -> String {
    NAME_NOISE_RE.replace_all(name, "").into_owned()
}

/// Keep only the columns whose normalized name fully matches `pattern`.
///
/// Row count and column order are preserved. A pattern matching nothing
/// yields a frame with no columns rather than an error.
pub fn select_columns(df: &DataFrame, pattern: &str) -> Result<DataFrame> {
    let matcher = Regex::new(&format!("^(?:{})$", pattern))?;

    let keep: Vec<PlSmallStr> = df
        .get_column_names()
        .into_iter()
        .filter(|name| matcher.is_match(&normalize_column_name(name.as_str())))
        .cloned()
        .collect();

    Ok(df.select(keep)?)
}

/// Number of missing entries in a column; nulls and float NaNs both count
pub fn missing_count(column: &Column) -> Result<usize> {
    let nulls = column.null_count();
    if !column.dtype().is_float() {
        return Ok(nulls);
    }

    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    let nans = series
        .f64()?
        .into_iter()
        .filter(|v| matches!(v, Some(x) if x.is_nan()))
        .count();

    Ok(nulls + nans)
}

/// Percentage (0-100) of missing entries per column, in column order
pub fn missing_percentages(df: &DataFrame) -> Result<Vec<(String, f64)>> {
    let height = df.height();

    df.get_columns()
        .iter()
        .map(|column| {
            let pct = if height == 0 {
                0.0
            } else {
                missing_count(column)? as f64 / height as f64 * 100.0
            };
            Ok((column.name().to_string(), pct))
        })
        .collect()
}

/// Drop every column whose missing percentage is strictly greater than
/// `threshold` (0-100). A column sitting exactly at the threshold is kept.
pub fn drop_missing_columns(df: &DataFrame, threshold: f64) -> Result<DataFrame> {
    if threshold.is_nan() {
        return Err(TmdError::InvalidParameter {
            name: "threshold".to_string(),
            value: threshold.to_string(),
            reason: "must be a number".to_string(),
        });
    }

    let keep: Vec<String> = missing_percentages(df)?
        .into_iter()
        .filter(|(_, pct)| *pct <= threshold)
        .map(|(name, _)| name)
        .collect();

    let dropped = df.width() - keep.len();
    if dropped > 0 {
        tracing::debug!(dropped, threshold, "Dropped sparse columns");
    }

    Ok(df.select(keep)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor_df() -> DataFrame {
        df!(
            "android.sensor.accelerometer#mean" => &[1.0, 2.0, 3.0, 4.0],
            "android.sensor.accelerometer#std" => &[0.1, 0.2, 0.3, 0.4],
            "android.sensor.gyroscope#max" => &[5.0, 6.0, 7.0, 8.0],
            "sound#min" => &[0.5, 0.6, 0.7, 0.8],
            "time" => &[10.0, 20.0, 30.0, 40.0],
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("android.sensor.accelerometer#mean"), "accelerometer");
        assert_eq!(normalize_column_name("android.sensor.gyroscope_uncalibrated#std"), "gyroscope_uncalibrated");
        assert_eq!(normalize_column_name("sound#max"), "sound");
        assert_eq!(normalize_column_name("time"), "time");
    }

    #[test]
    fn test_select_full_match_only() {
        let df = sensor_df();
        let selected = select_columns(&df, "accelerometer").unwrap();

        assert_eq!(selected.height(), 4);
        let names: Vec<&str> = selected.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            vec!["android.sensor.accelerometer#mean", "android.sensor.accelerometer#std"]
        );
    }

    #[test]
    fn test_select_alternation_keeps_order() {
        let df = sensor_df();
        let selected = select_columns(&df, "sound|accelerometer").unwrap();
        let names: Vec<&str> = selected.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "android.sensor.accelerometer#mean",
                "android.sensor.accelerometer#std",
                "sound#min",
            ]
        );
    }

    #[test]
    fn test_select_partial_name_does_not_match() {
        let df = sensor_df();
        let selected = select_columns(&df, "accel").unwrap();
        assert_eq!(selected.width(), 0);
    }

    #[test]
    fn test_select_invalid_pattern() {
        let df = sensor_df();
        assert!(matches!(select_columns(&df, "(gyro"), Err(TmdError::InvalidPattern(_))));
    }

    #[test]
    fn test_missing_percentages_counts_nan_and_null() {
        let df = df!(
            "a" => &[Some(1.0), None, Some(f64::NAN), Some(4.0)],
            "b" => &[1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();

        let pct = missing_percentages(&df).unwrap();
        assert_eq!(pct[0].0, "a");
        assert!((pct[0].1 - 50.0).abs() < 1e-10);
        assert!(pct[1].1.abs() < 1e-10);
    }

    #[test]
    fn test_drop_threshold_is_strict() {
        let df = df!(
            "full" => &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
            "half" => &[Some(1.0), None, Some(3.0), None],
        )
        .unwrap();

        let kept_at_50 = drop_missing_columns(&df, 50.0).unwrap();
        assert_eq!(kept_at_50.width(), 2);

        let kept_at_40 = drop_missing_columns(&df, 40.0).unwrap();
        let names: Vec<&str> = kept_at_40.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["full"]);
        assert_eq!(kept_at_40.height(), 4);
    }

    #[test]
    fn test_drop_rejects_nan_threshold() {
        let df = sensor_df();
        assert!(drop_missing_columns(&df, f64::NAN).is_err());
    }
}
