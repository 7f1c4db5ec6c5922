//! tmd-fit - model comparison for transportation-mode detection
//!
//! Smartphone sensor windows (accelerometer, gyroscope, sound, ...) labelled
//! with an activity are used to compare classifiers. Each classifier is
//! wrapped in an impute -> scale -> model pipeline and scored by
//! cross-validation on the training data and accuracy on held-out data.
//!
//! # Modules
//!
//! ## Core
//! - [`preprocessing`] - Column selection, sparse-column removal, scaling, label encoding
//! - [`imputation`] - Iterative (round-robin regression) imputation
//! - [`training`] - Classifiers and cross-validation
//! - [`pipeline`] - Impute -> scale -> model composition
//! - [`evaluation`] - Fitting, timing and ranking pipelines
//!
//! ## Support
//! - [`config`] - Run configuration
//! - [`diagnostics`] - Non-fatal convergence reports
//! - [`registry`] - Ordered named collections
//! - [`data`] - CSV loading and train/test splitting
//! - [`activity`] - Activity labels and calorie estimates
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod imputation;
pub mod training;
pub mod pipeline;
pub mod evaluation;

// Support
pub mod config;
pub mod diagnostics;
pub mod registry;
pub mod data;
pub mod activity;
pub mod utils;

// Services
pub mod cli;

pub use error::{Result, TmdError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, TmdError};

    // Configuration
    pub use crate::config::{CvConfig, EvaluationConfig, ImputerConfig, SplitConfig};

    // Diagnostics
    pub use crate::diagnostics::{Diagnostic, Diagnostics, Evaluated, ModelDiagnostic, Phase, Stage};

    // Preprocessing
    pub use crate::preprocessing::{
        drop_missing_columns, missing_percentages, normalize_column_name, select_columns,
        LabelEncoder, StandardScaler,
    };

    // Imputation
    pub use crate::imputation::{ImputationOrder, Imputer, InitialStrategy, IterativeImputer};

    // Training
    pub use crate::training::{
        accuracy_score, cross_val_score, default_registry, CVResults, CVStrategy, CrossValidator,
        DecisionTreeClassifier, DummyClassifier, Estimator, GaussianNaiveBayes, KNNClassifier,
        LogisticRegression, ModelRegistry,
    };

    // Pipelines and evaluation
    pub use crate::evaluation::{evaluate_performance, PerformanceRecord, PerformanceTable};
    pub use crate::pipeline::{build_pipelines, Pipeline};
    pub use crate::registry::Registry;

    // Data
    pub use crate::data::{features_to_array, load_csv, split_features_target, train_test_split};

    // Activity
    pub use crate::activity::{activity_calories, Activity, CalorieTracker};
}
