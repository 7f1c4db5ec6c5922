//! Command-line interface: compare models, inspect data, replay calorie tracking.

use clap::{Parser, Subcommand};
use colored::*;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::activity::{Activity, CalorieTracker};
use crate::config::EvaluationConfig;
use crate::data::{features_to_array, load_csv, split_features_target, train_test_split};
use crate::diagnostics::ModelDiagnostic;
use crate::evaluation::evaluate_performance;
use crate::pipeline::{build_pipelines, Pipeline};
use crate::preprocessing::{drop_missing_columns, missing_percentages, select_columns, LabelEncoder};
use crate::training::default_registry;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn print_diagnostics(diagnostics: &[ModelDiagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    section("Warnings");
    for d in diagnostics {
        println!("  {} {}", "!".yellow(), d);
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tmd-fit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compare transportation-mode classifiers on smartphone sensor data")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit every built-in pipeline and rank them by test accuracy
    Evaluate {
        /// Training data (CSV)
        #[arg(short, long)]
        data: PathBuf,

        /// Held-out test data; when absent the training data is split
        #[arg(long)]
        test: Option<PathBuf>,

        /// Target column name
        #[arg(short, long)]
        target: Option<String>,

        /// Regex over normalized column names to keep
        #[arg(short, long)]
        keep: Option<String>,

        /// Drop columns with more than this percentage missing
        #[arg(long)]
        threshold: Option<f64>,

        /// Number of cross-validation folds
        #[arg(long)]
        cv_folds: Option<usize>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the ranked table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show rows, columns and missing percentages
    Inspect {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Predict activities for a recording and total the calories burnt
    Track {
        /// Labelled training data (CSV)
        #[arg(long)]
        train: PathBuf,

        /// Recording to classify (CSV)
        #[arg(short, long)]
        data: PathBuf,

        /// Body weight in kilograms
        #[arg(short, long)]
        weight: f64,

        /// Model to use; defaults to the best by test accuracy
        #[arg(short, long)]
        model: Option<String>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

// ─── Data preparation ──────────────────────────────────────────────────────────

/// Labelled features after column selection and sparse-column removal
struct Prepared {
    feature_names: Vec<String>,
    x: Array2<f64>,
    y: Array1<f64>,
    encoder: LabelEncoder,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EvaluationConfig> {
    let config = match path {
        Some(p) => EvaluationConfig::from_json_file(p)?,
        None => EvaluationConfig::default(),
    };
    Ok(config)
}

fn prepare_training(df: &DataFrame, config: &EvaluationConfig) -> anyhow::Result<Prepared> {
    let (features, target) = split_features_target(df, &config.target_column)?;
    let features = select_columns(&features, &config.keep_columns)?;
    let features = drop_missing_columns(&features, config.missing_threshold)?;
    if features.width() == 0 {
        anyhow::bail!(
            "no feature columns left after selecting '{}' and dropping columns over {}% missing",
            config.keep_columns,
            config.missing_threshold
        );
    }

    let mut encoder = LabelEncoder::new();
    let y = encoder.fit_transform(&target)?;

    Ok(Prepared {
        feature_names: features.get_column_names().iter().map(|s| s.to_string()).collect(),
        x: features_to_array(&features)?,
        y,
        encoder,
    })
}

/// Same columns as the training features, in the same order
fn align_features(df: &DataFrame, feature_names: &[String]) -> anyhow::Result<Array2<f64>> {
    let aligned = df.select(feature_names.iter().map(|s| s.as_str()))?;
    Ok(features_to_array(&aligned)?)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_evaluate(
    data_path: &Path,
    test_path: Option<&Path>,
    target: Option<&str>,
    keep: Option<&str>,
    threshold: Option<f64>,
    cv_folds: Option<usize>,
    config_path: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(t) = target {
        config = config.with_target(t);
    }
    if let Some(k) = keep {
        config = config.with_keep_columns(k);
    }
    if let Some(t) = threshold {
        config = config.with_missing_threshold(t);
    }
    if let Some(k) = cv_folds {
        config = config.with_cv_folds(k);
    }
    config.validate()?;

    // With --json, stdout carries only the table
    let progress = !json;
    if progress {
        section("Evaluate");
        step_run("Loading data");
    }
    let start = Instant::now();
    let df = load_csv(data_path)?;
    if progress {
        step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));
        step_run("Selecting features");
    }
    let prepared = prepare_training(&df, &config)?;
    if progress {
        step_done(&format!(
            "{} features, {} classes",
            prepared.feature_names.len(),
            prepared.encoder.classes().len()
        ));
    }

    let (x_train, y_train, x_test, y_test) = match test_path {
        Some(path) => {
            let test_df = load_csv(path)?;
            let (_, test_target) = split_features_target(&test_df, &config.target_column)?;
            let x_test = align_features(&test_df, &prepared.feature_names)?;
            let y_test = prepared.encoder.transform(&test_target)?;
            (prepared.x, prepared.y, x_test, y_test)
        }
        None => {
            let split = train_test_split(&prepared.x, &prepared.y, &config.split)?;
            (split.x_train, split.y_train, split.x_test, split.y_test)
        }
    };

    if progress {
        step_run("Fitting pipelines");
    }
    let start = Instant::now();
    let models = default_registry()?;
    let mut pipelines = build_pipelines(&models, &config.imputer);
    let evaluated = evaluate_performance(
        &mut pipelines,
        &x_train,
        &y_train,
        &x_test,
        &y_test,
        &config.cv,
    )?;
    if progress {
        step_done(&format!("{} models in {:?}", pipelines.len(), start.elapsed()));
    }

    if json {
        println!("{}", evaluated.value.to_json()?);
        return Ok(());
    }

    section("Results");
    for line in evaluated.value.to_string().lines() {
        println!("  {}", line);
    }

    if let Some(best) = evaluated.value.best() {
        println!();
        println!(
            "  {} {} {} {:.4}",
            ok("best"),
            best.name.white().bold(),
            muted("test accuracy:"),
            best.test_accuracy
        );
    }

    print_diagnostics(&evaluated.diagnostics);
    println!();
    Ok(())
}

pub fn cmd_inspect(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let df = load_csv(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    let width = df
        .get_column_names()
        .iter()
        .map(|n| n.len())
        .max()
        .unwrap_or(6)
        .max(6);

    println!(
        "  {:<width$} {:<12} {:>9}",
        muted("Column"),
        muted("Type"),
        muted("Missing %"),
        width = width
    );
    println!("  {}", dim(&"─".repeat(width + 23)));

    for ((name, pct), col) in missing_percentages(&df)?.into_iter().zip(df.get_columns()) {
        let pct_text = format!("{:.1}", pct);
        let pct_text = if pct > 0.0 { pct_text.yellow() } else { pct_text.normal() };
        println!(
            "  {:<width$} {:<12} {:>9}",
            name,
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            pct_text,
            width = width
        );
    }

    println!();
    Ok(())
}

pub fn cmd_track(
    train_path: &Path,
    data_path: &Path,
    weight: f64,
    model: Option<&str>,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    config.validate()?;
    let mut tracker = CalorieTracker::new(weight)?;

    section("Track");

    step_run("Loading training data");
    let df = load_csv(train_path)?;
    let prepared = prepare_training(&df, &config)?;
    step_done(&format!("{} rows, {} features", prepared.x.nrows(), prepared.feature_names.len()));

    let models = default_registry()?;
    let model_name = match model {
        Some(name) => {
            if !models.contains(name) {
                let known: Vec<&str> = models.names().collect();
                anyhow::bail!("unknown model '{}', expected one of: {}", name, known.join(", "));
            }
            name.to_string()
        }
        None => {
            step_run("Choosing best model");
            let split = train_test_split(&prepared.x, &prepared.y, &config.split)?;
            let mut pipelines = build_pipelines(&models, &config.imputer);
            let evaluated = evaluate_performance(
                &mut pipelines,
                &split.x_train,
                &split.y_train,
                &split.x_test,
                &split.y_test,
                &config.cv,
            )?;
            let best = evaluated
                .value
                .best()
                .ok_or_else(|| anyhow::anyhow!("no models to choose from"))?;
            step_done(&format!("{} ({:.4})", best.name, best.test_accuracy));
            best.name.clone()
        }
    };

    step_run(&format!("Fitting {}", model_name.cyan()));
    let estimator = models
        .get(&model_name)
        .ok_or_else(|| anyhow::anyhow!("unknown model '{}'", model_name))?;
    let mut pipeline = Pipeline::new(estimator.unfitted(), &config.imputer);
    let diagnostics = pipeline.fit(&prepared.x, &prepared.y)?;
    step_done(if diagnostics.is_empty() { "" } else { "with convergence warnings" });

    let recording = load_csv(data_path)?;
    let x = align_features(&recording, &prepared.feature_names)?;
    let predictions = pipeline.predict(&x)?;

    section("Activity");
    println!(
        "  {:>6} {:<10} {:>9} {:>12}",
        muted("Window"),
        muted("Activity"),
        muted("Time (s)"),
        muted("Total kcal")
    );
    for (i, &code) in predictions.iter().enumerate() {
        let label = prepared.encoder.label(code).unwrap_or("");
        let report = tracker.record(Activity::from(label));
        println!(
            "  {:>6} {:<10} {:>9.0} {:>12.3}",
            i + 1,
            label,
            report.elapsed_seconds,
            report.total_calories
        );
    }

    let summary = tracker.summary();
    println!();
    println!(
        "  {} {} {}",
        ok("total"),
        format!("{:.3} kcal", summary.total_calories).white().bold(),
        dim(&format!(
            "walking {} · still {} · vehicle {}",
            summary.walking, summary.still, summary.vehicle
        ))
    );
    println!();
    Ok(())
}
