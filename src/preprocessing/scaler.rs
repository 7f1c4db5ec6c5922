//! Standard scaling of feature matrices

use crate::error::{Result, TmdError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column parameters learned during fit
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: Array1<f64>,
    scale: Array1<f64>,
}

/// Standardizes each column to zero mean and unit variance.
///
/// Mean and standard deviation (population, ddof = 0) come from the fit data
/// only; constant columns get a scale of 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Option<ScalerParams>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    /// Learn column means and standard deviations
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(TmdError::PreprocessingError(
                "cannot fit scaler on zero rows".to_string(),
            ));
        }

        let center = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });

        self.params = Some(ScalerParams { center, scale });
        Ok(self)
    }

    /// Apply the learned scaling
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let params = self.params.as_ref().ok_or(TmdError::ModelNotFitted)?;
        check_width(params, x)?;
        Ok((x - &params.center) / &params.scale)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Undo the scaling
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let params = self.params.as_ref().ok_or(TmdError::ModelNotFitted)?;
        check_width(params, x)?;
        Ok(x * &params.scale + &params.center)
    }

    /// Learned column means
    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.params.as_ref().map(|p| &p.center)
    }

    /// Learned column scales
    pub fn scale(&self) -> Option<&Array1<f64>> {
        self.params.as_ref().map(|p| &p.scale)
    }
}

fn check_width(params: &ScalerParams, x: &Array2<f64>) -> Result<()> {
    if x.ncols() != params.center.len() {
        return Err(TmdError::shape("n_features", params.center.len(), x.ncols()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0], [5.0, 50.0]];

        let mut scaler = StandardScaler::new();
        let result = scaler.fit_transform(&x).unwrap();

        for col in result.columns() {
            let mean = col.mean().unwrap();
            let std = col.std(0.0);
            assert!(mean.abs() < 1e-10); // Mean should be ~0
            assert!((std - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_uses_fit_statistics_only() {
        let train = array![[0.0], [2.0]];
        let test = array![[100.0]];

        let mut scaler = StandardScaler::new();
        scaler.fit(&train).unwrap();
        let out = scaler.transform(&test).unwrap();

        // mean 1, population std 1
        assert!((out[[0, 0]] - 99.0).abs() < 1e-10);
    }

    #[test]
    fn test_constant_column() {
        let x = array![[3.0], [3.0], [3.0]];
        let mut scaler = StandardScaler::new();
        let out = scaler.fit_transform(&x).unwrap();
        assert!(out.iter().all(|v| v.abs() < 1e-10));
    }

    #[test]
    fn test_inverse_transform() {
        let x = array![[1.0, -2.0], [2.0, 0.5], [3.0, 7.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        for (o, r) in x.iter().zip(restored.iter()) {
            assert!((o - r).abs() < 1e-10);
        }
    }

    #[test]
    fn test_transform_errors() {
        let scaler = StandardScaler::new();
        assert!(matches!(scaler.transform(&array![[1.0]]), Err(TmdError::ModelNotFitted)));

        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[1.0, 2.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(TmdError::ShapeError { .. })
        ));
    }
}
