//! Model training module
//!
//! Provides the classifiers compared by the evaluator:
//! - Baseline (most frequent / constant)
//! - Multinomial logistic regression
//! - K-Nearest Neighbors
//! - Gaussian Naive Bayes
//! - Decision tree (CART)
//!
//! plus stratified and plain k-fold cross-validation.

pub(crate) mod models;
pub mod cross_validation;
pub mod decision_tree;
pub mod dummy;
pub mod knn;
pub mod linear_models;
pub mod naive_bayes;

pub use cross_validation::{cross_val_score, CVResults, CVSplit, CVStrategy, CrossValidator};
pub use decision_tree::{Criterion, DecisionTreeClassifier, TreeNode};
pub use dummy::{DummyClassifier, DummyStrategy};
pub use knn::{DistanceMetric, KNNClassifier, KNNConfig, WeightScheme};
pub use linear_models::LogisticRegression;
pub use models::{accuracy_score, Estimator};
pub use naive_bayes::GaussianNaiveBayes;

use crate::error::Result;
use crate::registry::Registry;

/// Named, ordered set of unfitted estimators
pub type ModelRegistry = Registry<Box<dyn Estimator>>;

/// The built-in comparison set, in a fixed order
pub fn default_registry() -> Result<ModelRegistry> {
    Registry::new()
        .with("dummy", Box::new(DummyClassifier::most_frequent()) as Box<dyn Estimator>)?
        .with("logistic_regression", Box::new(LogisticRegression::new()))?
        .with("knn", Box::new(KNNClassifier::default()))?
        .with("gaussian_nb", Box::new(GaussianNaiveBayes::new()))?
        .with("decision_tree", Box::new(DecisionTreeClassifier::new()))
}
