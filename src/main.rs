//! tmd-fit - Main Entry Point

use clap::Parser;
use tmd_fit::cli::{cmd_evaluate, cmd_inspect, cmd_track, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tmd_fit=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate { data, test, target, keep, threshold, cv_folds, config, json } => {
            cmd_evaluate(
                &data,
                test.as_deref(),
                target.as_deref(),
                keep.as_deref(),
                threshold,
                cv_folds,
                config.as_deref(),
                json,
            )?;
        }
        Commands::Inspect { data } => {
            cmd_inspect(&data)?;
        }
        Commands::Track { train, data, weight, model, config } => {
            cmd_track(&train, &data, weight, model.as_deref(), config.as_deref())?;
        }
    }

    Ok(())
}
