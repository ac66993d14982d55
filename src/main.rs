//! phenoboost - Main Entry Point

use clap::Parser;
use colored::Colorize;
use phenoboost::data::TableLoader;
use phenoboost::pipeline::{Orchestrator, RunConfig};
use std::path::PathBuf;

/// Fit and explain phenology-shift regression models.
#[derive(Parser)]
#[command(name = "phenoboost", version, about)]
struct Cli {
    /// Observation-site table (CSV or Parquet)
    data: PathBuf,

    /// Output directory for figures, tables and summaries
    #[arg(short, long, default_value = "phenoboost_out")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phenoboost=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let df = TableLoader::load(&cli.data)?;

    // Seed and trial count are fixed here, not configurable.
    let config = RunConfig::default();
    let outcomes = Orchestrator::new(config).run(&df, &cli.out)?;

    for outcome in &outcomes {
        match &outcome.result {
            Ok(_) => println!("  {} {}", "✓".green(), outcome.spec.code),
            Err(failure) => println!("  {} {} {}", "✗".red(), outcome.spec.code, failure),
        }
    }

    if outcomes.iter().all(|o| o.result.is_err()) {
        anyhow::bail!("all targets failed");
    }
    if outcomes.iter().any(|o| o.result.is_err()) {
        println!("{}", "Finished with per-target failures".yellow());
    }
    println!(
        "{} All done – outputs saved to: {}",
        "✓".green(),
        cli.out.display()
    );

    Ok(())
}
