//! Round-robin regression imputer

use crate::config::ImputerConfig;
use crate::diagnostics::{Diagnostic, Diagnostics, Stage};
use crate::error::{Result, TmdError};
use crate::imputation::{is_missing, ImputationOrder, Imputer, InitialStrategy};
use crate::utils::ridge_fit;
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// One learned regression: `feature` predicted from `predictors`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ImputationStep {
    feature: usize,
    predictors: Vec<usize>,
    coefficients: Array1<f64>,
    intercept: f64,
}

impl ImputationStep {
    /// Overwrite the entries of `feature` at `rows` with predictions
    fn apply(&self, data: &mut Array2<f64>, rows: &[usize]) {
        if rows.is_empty() {
            return;
        }
        let inputs = data.select(Axis(0), rows).select(Axis(1), &self.predictors);
        let predictions = inputs.dot(&self.coefficients) + self.intercept;
        for (&row, &value) in rows.iter().zip(predictions.iter()) {
            data[[row, self.feature]] = value;
        }
    }
}

/// Parameters learned by `fit`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FittedState {
    initial_fill: Array1<f64>,
    steps: Vec<ImputationStep>,
    n_iter: usize,
    converged: bool,
}

/// Iterative imputer.
///
/// `fit` records the ordered sequence of per-feature regressions from every
/// round; `transform` replays that sequence, so data imputed after fitting
/// only ever sees parameters learned from the fit data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterativeImputer {
    /// Maximum rounds
    max_iter: usize,
    /// Convergence tolerance
    tol: f64,
    /// Random seed
    seed: u64,
    initial_strategy: InitialStrategy,
    order: ImputationOrder,
    /// Ridge regularization parameter
    ridge_alpha: f64,
    state: Option<FittedState>,
}

impl IterativeImputer {
    /// Create new iterative imputer with the default settings
    pub fn new() -> Self {
        Self::from_config(&ImputerConfig::default())
    }

    /// Create an unfitted imputer from configuration
    pub fn from_config(config: &ImputerConfig) -> Self {
        Self {
            max_iter: config.max_iter.max(1),
            tol: config.tol.max(0.0),
            seed: config.seed,
            initial_strategy: config.initial_strategy,
            order: config.order,
            ridge_alpha: config.ridge_alpha.max(0.0),
            state: None,
        }
    }

    /// Set max iterations
    pub fn with_max_iter(mut self, n: usize) -> Self {
        self.max_iter = n.max(1);
        self
    }

    /// Set tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol.max(0.0);
        self
    }

    /// Set initial strategy
    pub fn with_initial_strategy(mut self, strategy: InitialStrategy) -> Self {
        self.initial_strategy = strategy;
        self
    }

    /// Set the visiting order
    pub fn with_order(mut self, order: ImputationOrder) -> Self {
        self.order = order;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set ridge alpha
    pub fn with_ridge_alpha(mut self, alpha: f64) -> Self {
        self.ridge_alpha = alpha.max(0.0);
        self
    }

    /// Copy of the settings without any learned state
    pub fn unfitted(&self) -> Self {
        Self {
            state: None,
            ..self.clone()
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Rounds run by the last fit
    pub fn n_iter(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.n_iter)
    }

    /// Whether the last fit met its tolerance
    pub fn converged(&self) -> Option<bool> {
        self.state.as_ref().map(|s| s.converged)
    }

    /// Initial value for a column
    fn initial_value(&self, column: &[f64]) -> f64 {
        let mut observed: Vec<f64> = column.iter().copied().filter(|v| !is_missing(*v)).collect();

        if observed.is_empty() {
            return 0.0;
        }

        match self.initial_strategy {
            InitialStrategy::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
            InitialStrategy::Median => {
                observed.sort_by(|a, b| a.total_cmp(b));
                let mid = observed.len() / 2;
                if observed.len() % 2 == 0 {
                    (observed[mid - 1] + observed[mid]) / 2.0
                } else {
                    observed[mid]
                }
            }
            InitialStrategy::MostFrequent => {
                observed.sort_by(|a, b| a.total_cmp(b));
                let mut best = observed[0];
                let mut best_run = 0;
                let mut i = 0;
                while i < observed.len() {
                    let mut j = i;
                    while j < observed.len() && observed[j] == observed[i] {
                        j += 1;
                    }
                    if j - i > best_run {
                        best_run = j - i;
                        best = observed[i];
                    }
                    i = j;
                }
                best
            }
            InitialStrategy::Constant => 0.0,
        }
    }

    /// Features regressed in one round, in visiting order
    fn round_order(&self, missing_counts: &[usize], n_rows: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        // Complete columns still get a step so later gaps are regressed.
        // Fully missing columns have nothing to learn from and keep their initial fill.
        let mut features: Vec<usize> = (0..missing_counts.len())
            .filter(|&j| missing_counts[j] < n_rows)
            .collect();

        match self.order {
            ImputationOrder::Ascending => features.sort_by_key(|&j| missing_counts[j]),
            ImputationOrder::Descending => {
                features.sort_by_key(|&j| std::cmp::Reverse(missing_counts[j]))
            }
            ImputationOrder::Roman => {}
            ImputationOrder::Random => features.shuffle(rng),
        }

        features
    }
}

impl IterativeImputer {
    /// Regress `feature` on every other column over the rows where it was observed
    fn learn_step(&self, data: &Array2<f64>, mask: &Array2<bool>, feature: usize) -> ImputationStep {
        let (_, observed_rows) = split_rows(mask, feature);
        let predictors: Vec<usize> = (0..data.ncols()).filter(|&c| c != feature).collect();

        let x_obs = data.select(Axis(0), &observed_rows).select(Axis(1), &predictors);
        let y_obs = data.column(feature).select(Axis(0), &observed_rows);
        let (coefficients, intercept) = ridge_fit(x_obs.view(), y_obs.view(), self.ridge_alpha);

        ImputationStep {
            feature,
            predictors,
            coefficients,
            intercept,
        }
    }
}

impl Default for IterativeImputer {
    fn default() -> Self {
        Self::new()
    }
}

/// Row indices where column `j` is missing / observed
fn split_rows(mask: &Array2<bool>, j: usize) -> (Vec<usize>, Vec<usize>) {
    let mut missing = Vec::new();
    let mut observed = Vec::new();
    for (i, &m) in mask.column(j).iter().enumerate() {
        if m {
            missing.push(i);
        } else {
            observed.push(i);
        }
    }
    (missing, observed)
}

/// Maximum absolute row sum
fn inf_norm(delta: &Array2<f64>) -> f64 {
    delta
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

impl Imputer for IterativeImputer {
    fn fit(&mut self, x: &Array2<f64>) -> Result<Diagnostics> {
        let n_rows = x.nrows();
        if n_rows == 0 {
            return Err(TmdError::PreprocessingError(
                "cannot fit imputer on zero rows".to_string(),
            ));
        }

        let mask = x.mapv(is_missing);
        let missing_counts: Vec<usize> = mask
            .columns()
            .into_iter()
            .map(|c| c.iter().filter(|&&m| m).count())
            .collect();

        let initial_fill: Array1<f64> = x
            .columns()
            .into_iter()
            .map(|c| self.initial_value(&c.to_vec()))
            .collect();

        let mut data = x.clone();
        for ((i, j), value) in data.indexed_iter_mut() {
            if mask[[i, j]] {
                *value = initial_fill[j];
            }
        }

        let max_observed = x
            .iter()
            .filter(|v| !is_missing(**v))
            .fold(0.0f64, |acc, v| acc.max(v.abs()));
        let threshold = self.tol * max_observed;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut steps = Vec::new();
        let mut n_iter = 0;
        let mut converged = false;

        if missing_counts.iter().all(|&c| c == 0) {
            // Nothing to fill here, one pass learns the steps for later data
            for feature in self.round_order(&missing_counts, n_rows, &mut rng) {
                steps.push(self.learn_step(&data, &mask, feature));
            }
            converged = true;
        } else {
            for round in 1..=self.max_iter {
                let previous = data.clone();

                for feature in self.round_order(&missing_counts, n_rows, &mut rng) {
                    let step = self.learn_step(&data, &mask, feature);
                    let (missing_rows, _) = split_rows(&mask, feature);
                    step.apply(&mut data, &missing_rows);
                    steps.push(step);
                }

                n_iter = round;
                let change = inf_norm(&(&data - &previous));
                tracing::trace!(round, change, threshold, "Imputation round finished");

                if change < threshold {
                    converged = true;
                    break;
                }
            }
        }

        let mut diagnostics = Diagnostics::new();
        if !converged {
            tracing::debug!(max_iter = self.max_iter, "Imputer stopped before reaching tolerance");
            diagnostics.push(Diagnostic::ConvergenceNotReached {
                stage: Stage::Imputer,
                iterations: n_iter,
            });
        }

        self.state = Some(FittedState {
            initial_fill,
            steps,
            n_iter,
            converged,
        });

        Ok(diagnostics)
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let state = self.state.as_ref().ok_or(TmdError::ModelNotFitted)?;
        if x.ncols() != state.initial_fill.len() {
            return Err(TmdError::shape("n_features", state.initial_fill.len(), x.ncols()));
        }

        let mask = x.mapv(is_missing);
        let mut result = x.clone();
        for ((i, j), value) in result.indexed_iter_mut() {
            if mask[[i, j]] {
                *value = state.initial_fill[j];
            }
        }

        for step in &state.steps {
            let (missing_rows, _) = split_rows(&mask, step.feature);
            step.apply(&mut result, &missing_rows);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlated_with_gaps() -> Array2<f64> {
        Array2::from_shape_vec(
            (6, 3),
            vec![
                1.0, 2.0, 3.0,
                f64::NAN, 4.0, 6.0,
                3.0, f64::NAN, 9.0,
                4.0, 8.0, 12.0,
                5.0, 10.0, f64::NAN,
                6.0, 12.0, 18.0,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_fills_every_gap() {
        let data = correlated_with_gaps();
        let mut imputer = IterativeImputer::new().with_max_iter(10);

        let (result, _) = imputer.fit_transform(&data).unwrap();
        assert!(!result.iter().any(|v| v.is_nan()));
        assert_eq!(result.dim(), data.dim());
    }

    #[test]
    fn test_recovers_linear_relation() {
        let data = correlated_with_gaps();
        let mut imputer = IterativeImputer::new().with_max_iter(50).with_ridge_alpha(0.0);

        let (result, _) = imputer.fit_transform(&data).unwrap();
        // Row 1 lies on x, 2x, 3x with x = 2
        assert!((result[[1, 0]] - 2.0).abs() < 0.25);
        assert!((result[[2, 1]] - 6.0).abs() < 0.25);
    }

    #[test]
    fn test_observed_values_untouched() {
        let data = correlated_with_gaps();
        let mut imputer = IterativeImputer::new();
        let (result, _) = imputer.fit_transform(&data).unwrap();

        for (orig, out) in data.iter().zip(result.iter()) {
            if !orig.is_nan() {
                assert_eq!(orig, out);
            }
        }
    }

    #[test]
    fn test_non_convergence_is_a_diagnostic() {
        let data = correlated_with_gaps();
        let mut imputer = IterativeImputer::new().with_max_iter(1).with_tolerance(0.0);

        let diagnostics = imputer.fit(&data).unwrap();
        assert!(diagnostics.has_convergence_warnings());
        assert_eq!(imputer.converged(), Some(false));
        assert_eq!(imputer.n_iter(), Some(1));
        assert!(imputer.transform(&data).is_ok());
    }

    #[test]
    fn test_complete_data_converges_immediately() {
        let data = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let mut imputer = IterativeImputer::new();
        let diagnostics = imputer.fit(&data).unwrap();

        assert!(diagnostics.is_empty());
        assert_eq!(imputer.n_iter(), Some(0));
        assert_eq!(imputer.transform(&data).unwrap(), data);
    }

    #[test]
    fn test_transform_uses_fit_parameters() {
        let train = Array2::from_shape_vec((4, 2), vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0]).unwrap();
        let mut imputer = IterativeImputer::new();
        imputer.fit(&train).unwrap();

        // Column 1 is 10x column 0 in the fit data, even though it had no gaps there
        let test = Array2::from_shape_vec((1, 2), vec![100.0, f64::NAN]).unwrap();
        let out = imputer.transform(&test).unwrap();
        assert!((out[[0, 1]] - 1000.0).abs() < 1.0, "got {}", out[[0, 1]]);
        assert_eq!(out[[0, 0]], 100.0);
    }

    #[test]
    fn test_gap_in_column_complete_at_fit_time() {
        let train = Array2::from_shape_vec(
            (5, 2),
            vec![1.0, 3.0, 2.0, 5.0, f64::NAN, 7.0, 4.0, 9.0, 5.0, 11.0],
        )
        .unwrap();
        let mut imputer = IterativeImputer::new().with_max_iter(20);
        imputer.fit(&train).unwrap();

        // Column 1 = 2 * column 0 + 1; a regression fill, not the column mean of 7
        let test = Array2::from_shape_vec((2, 2), vec![10.0, f64::NAN, 2.0, 5.0]).unwrap();
        let out = imputer.transform(&test).unwrap();
        assert!((out[[0, 1]] - 21.0).abs() < 1.0, "got {}", out[[0, 1]]);
        assert_eq!(out[[1, 1]], 5.0);
    }

    #[test]
    fn test_fully_missing_column_kept() {
        let data = Array2::from_shape_vec(
            (3, 2),
            vec![1.0, f64::NAN, 2.0, f64::NAN, 3.0, f64::NAN],
        )
        .unwrap();
        let mut imputer = IterativeImputer::new();
        let (result, _) = imputer.fit_transform(&data).unwrap();

        assert_eq!(result.ncols(), 2);
        assert!(result.column(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_initial_strategies() {
        let imputer = IterativeImputer::new().with_initial_strategy(InitialStrategy::Median);
        assert_eq!(imputer.initial_value(&[1.0, f64::NAN, 3.0, 10.0]), 3.0);

        let imputer = imputer.with_initial_strategy(InitialStrategy::MostFrequent);
        assert_eq!(imputer.initial_value(&[2.0, 1.0, 2.0, 1.0, 5.0]), 1.0);

        let imputer = imputer.with_initial_strategy(InitialStrategy::Constant);
        assert_eq!(imputer.initial_value(&[2.0, 4.0]), 0.0);
    }

    #[test]
    fn test_random_order_is_seeded() {
        let data = correlated_with_gaps();
        let mut a = IterativeImputer::new().with_order(ImputationOrder::Random).with_seed(7);
        let mut b = IterativeImputer::new().with_order(ImputationOrder::Random).with_seed(7);

        let (ra, _) = a.fit_transform(&data).unwrap();
        let (rb, _) = b.fit_transform(&data).unwrap();
        assert_eq!(ra, rb);
    }

    #[test]
    fn test_transform_before_fit() {
        let imputer = IterativeImputer::new();
        let data = correlated_with_gaps();
        assert!(matches!(imputer.transform(&data), Err(TmdError::ModelNotFitted)));
    }
}
