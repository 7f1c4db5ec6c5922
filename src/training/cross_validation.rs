//! Cross-validation implementations

use crate::config::CvConfig;
use crate::diagnostics::{Evaluated, Phase};
use crate::error::{Result, TmdError};
use crate::pipeline::Pipeline;
use crate::training::models::{accuracy_score, classes_of};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Cross-validation strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CVStrategy {
    /// K-Fold cross-validation
    KFold { n_splits: usize, shuffle: bool },
    /// Stratified K-Fold (maintains class distribution)
    StratifiedKFold { n_splits: usize, shuffle: bool },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::StratifiedKFold { n_splits: 5, shuffle: false }
    }
}

impl CVStrategy {
    pub fn n_splits(&self) -> usize {
        match self {
            CVStrategy::KFold { n_splits, .. } | CVStrategy::StratifiedKFold { n_splits, .. } => {
                *n_splits
            }
        }
    }
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation splitter
#[derive(Debug, Clone, Default)]
pub struct CrossValidator {
    strategy: CVStrategy,
    random_state: Option<u64>,
}

impl CrossValidator {
    /// Create a new cross-validator
    pub fn new(strategy: CVStrategy) -> Self {
        Self {
            strategy,
            random_state: None,
        }
    }

    pub fn from_config(config: &CvConfig) -> Self {
        let strategy = if config.stratified {
            CVStrategy::StratifiedKFold { n_splits: config.n_splits, shuffle: config.shuffle }
        } else {
            CVStrategy::KFold { n_splits: config.n_splits, shuffle: config.shuffle }
        };
        Self {
            strategy,
            random_state: config.seed,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn strategy(&self) -> &CVStrategy {
        &self.strategy
    }

    /// Generate train/test splits
    pub fn split(&self, n_samples: usize, y: Option<&Array1<f64>>) -> Result<Vec<CVSplit>> {
        let n_splits = self.strategy.n_splits();
        if n_splits < 2 {
            return Err(TmdError::ValidationError(format!(
                "n_splits must be at least 2, got {}",
                n_splits
            )));
        }
        if n_samples < n_splits {
            return Err(TmdError::ValidationError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }

        let folds = match &self.strategy {
            CVStrategy::KFold { shuffle, .. } => self.k_fold(n_samples, n_splits, *shuffle),
            CVStrategy::StratifiedKFold { shuffle, .. } => {
                let y = y.ok_or_else(|| {
                    TmdError::ValidationError("StratifiedKFold requires target array".to_string())
                })?;
                if y.len() != n_samples {
                    return Err(TmdError::shape("y length", n_samples, y.len()));
                }
                self.stratified_k_fold(y, n_splits, *shuffle)
            }
        };

        Ok(folds_to_splits(folds))
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    fn k_fold(&self, n_samples: usize, n_splits: usize, shuffle: bool) -> Vec<Vec<usize>> {
        let mut indices: Vec<usize> = (0..n_samples).collect();
        if shuffle {
            indices.shuffle(&mut self.rng());
        }

        // The first n_samples % n_splits folds get one extra sample
        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;
        let mut folds = Vec::with_capacity(n_splits);
        let mut current = 0;
        for i in 0..n_splits {
            let size = if i < remainder { base + 1 } else { base };
            folds.push(indices[current..current + size].to_vec());
            current += size;
        }
        folds
    }

    fn stratified_k_fold(&self, y: &Array1<f64>, n_splits: usize, shuffle: bool) -> Vec<Vec<usize>> {
        let classes = classes_of(y);
        let mut rng = shuffle.then(|| self.rng());

        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
        // Round-robin continues across classes so fold sizes stay balanced
        let mut next_fold = 0;
        for class in classes {
            let mut members: Vec<usize> = y
                .iter()
                .enumerate()
                .filter(|(_, &v)| v == class)
                .map(|(i, _)| i)
                .collect();
            if members.len() < n_splits {
                warn!(
                    class,
                    members = members.len(),
                    n_splits,
                    "least populated class has fewer members than folds"
                );
            }
            if let Some(rng) = rng.as_mut() {
                members.shuffle(rng);
            }
            for idx in members {
                folds[next_fold].push(idx);
                next_fold = (next_fold + 1) % n_splits;
            }
        }
        folds
    }
}

fn folds_to_splits(mut folds: Vec<Vec<usize>>) -> Vec<CVSplit> {
    for fold in &mut folds {
        fold.sort_unstable();
    }
    (0..folds.len())
        .map(|fold_idx| {
            let mut train_indices: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, f)| f.iter().copied())
                .collect();
            train_indices.sort_unstable();
            CVSplit {
                train_indices,
                test_indices: folds[fold_idx].clone(),
                fold_idx,
            }
        })
        .collect()
}

/// Cross-validation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        if n_folds == 0 {
            return Self {
                scores,
                mean_score: f64::NAN,
                std_score: f64::NAN,
                n_folds,
            };
        }
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;
        let std_score = variance.sqrt();

        Self {
            scores,
            mean_score,
            std_score,
            n_folds,
        }
    }
}

/// Score a pipeline definition with cross-validated accuracy.
///
/// Every fold fits a fresh copy of `pipeline`, so the caller's instance is
/// left untouched. Diagnostics are tagged with the model's own name.
pub fn cross_val_score(
    pipeline: &Pipeline,
    x: &Array2<f64>,
    y: &Array1<f64>,
    validator: &CrossValidator,
) -> Result<Evaluated<CVResults>> {
    if x.nrows() != y.len() {
        return Err(TmdError::shape("y length", x.nrows(), y.len()));
    }

    let splits = validator.split(x.nrows(), Some(y))?;
    let model = pipeline.model_name();
    let mut scores = Vec::with_capacity(splits.len());
    let mut fold_diagnostics = Vec::new();

    for split in &splits {
        let x_train = x.select(Axis(0), &split.train_indices);
        let y_train = y.select(Axis(0), &split.train_indices);
        let x_test = x.select(Axis(0), &split.test_indices);
        let y_test = y.select(Axis(0), &split.test_indices);

        let mut fold_pipeline = pipeline.unfitted();
        let diagnostics = fold_pipeline.fit(&x_train, &y_train)?;
        let predictions = fold_pipeline.predict(&x_test)?;
        let score = accuracy_score(&y_test, &predictions)?;

        debug!(model, fold = split.fold_idx, score, "cv fold scored");
        scores.push(score);
        fold_diagnostics.push((split.fold_idx, diagnostics));
    }

    let mut evaluated = Evaluated::new(CVResults::from_scores(scores));
    for (fold, diagnostics) in fold_diagnostics {
        evaluated.record(model, Phase::CrossValidation { fold }, diagnostics);
    }
    Ok(evaluated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k_fold() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 5, shuffle: false });
        let splits = cv.split(100, None).unwrap();

        assert_eq!(splits.len(), 5);

        // Each test set should have 20 samples
        for split in &splits {
            assert_eq!(split.test_indices.len(), 20);
            assert_eq!(split.train_indices.len(), 80);
        }

        // All indices should be covered exactly once in test sets
        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort();
        assert_eq!(all_test, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_k_fold_uneven() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 3, shuffle: false });
        let sizes: Vec<usize> = cv.split(10, None).unwrap().iter().map(|s| s.test_indices.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
    }

    #[test]
    fn test_stratified_k_fold() {
        let y = Array1::from_vec(vec![
            0.0, 0.0, 0.0, 0.0, 0.0, // 5 samples of class 0
            1.0, 1.0, 1.0, 1.0, 1.0, // 5 samples of class 1
        ]);

        let cv = CrossValidator::new(CVStrategy::StratifiedKFold { n_splits: 5, shuffle: false });
        let splits = cv.split(10, Some(&y)).unwrap();

        assert_eq!(splits.len(), 5);

        // Each fold should have 1 sample from each class
        for split in &splits {
            assert_eq!(split.test_indices.len(), 2);
            let classes: Vec<f64> = split.test_indices.iter().map(|&i| y[i]).collect();
            assert!(classes.contains(&0.0) && classes.contains(&1.0));
        }
    }

    #[test]
    fn test_stratified_is_deterministic_without_shuffle() {
        let y = Array1::from_vec(vec![2.0, 1.0, 0.0, 2.0, 1.0, 0.0, 2.0, 1.0, 0.0]);
        let cv = CrossValidator::new(CVStrategy::StratifiedKFold { n_splits: 3, shuffle: false });
        let a = cv.split(9, Some(&y)).unwrap();
        let b = cv.split(9, Some(&y)).unwrap();
        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.test_indices, sb.test_indices);
        }
    }

    #[test]
    fn test_single_fold_rejected() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 1, shuffle: false });
        assert!(matches!(cv.split(10, None), Err(TmdError::ValidationError(_))));
    }

    #[test]
    fn test_too_few_samples() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 5, shuffle: false });
        assert!(cv.split(3, None).is_err());
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 4, shuffle: true }).with_random_state(7);
        let a = cv.split(20, None).unwrap();
        let b = cv.split(20, None).unwrap();
        assert_eq!(a[0].test_indices, b[0].test_indices);
    }

    #[test]
    fn test_cv_results_population_std() {
        let results = CVResults::from_scores(vec![0.5, 1.0]);
        assert_eq!(results.mean_score, 0.75);
        assert!((results.std_score - 0.25).abs() < 1e-12);
        assert_eq!(results.n_folds, 2);
    }
}
