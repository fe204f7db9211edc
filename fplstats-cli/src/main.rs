//! FPL Stats CLI: season aggregation and reference merge commands.
//!
//! Commands:
//! - `run`: list every player of a season, fetch their gameweek files,
//!   aggregate, and write the CSV/HTML (optionally Parquet) artifacts
//! - `merge`: left-join the aggregated CSV with reference player data
//! - `config`: print the default TOML configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fplstats_core::aggregate::Preset;
use fplstats_core::data::{GithubSource, LocationLoader, StdoutProgress};
use fplstats_runner::{run_merge, FsWriter, Pipeline, PipelineConfig, RunSummary};

#[derive(Parser)]
#[command(
    name = "fplstats",
    version,
    about = "FPL Stats: season aggregates from weekly player histories"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every player's gw.csv, aggregate, and write the artifacts.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Season directory, e.g. 2022-23.
        #[arg(long)]
        season: Option<String>,

        /// Directory the artifacts are written to.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Players fetched at once.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Aggregation preset: season_summary, with_team_scores.
        #[arg(long)]
        preset: Option<Preset>,

        /// Also write the combined weekly table as HTML.
        #[arg(long, default_value_t = false)]
        combined: bool,

        /// Also write the aggregated table as Parquet.
        #[arg(long, default_value_t = false)]
        parquet: bool,
    },
    /// Merge the aggregated CSV with reference player attributes.
    Merge {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Aggregated CSV (path or URL).
        #[arg(long)]
        filtered: Option<String>,

        /// Reference players CSV (path or URL).
        #[arg(long)]
        reference: Option<String>,

        /// Output CSV path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the default configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            season,
            output_dir,
            concurrency,
            preset,
            combined,
            parquet,
        } => {
            let mut cfg = load_config(config)?;
            if let Some(season) = season {
                cfg.source.season = season;
            }
            if let Some(dir) = output_dir {
                cfg.output.dir = dir;
            }
            if let Some(n) = concurrency {
                cfg.source.concurrency = n;
            }
            if let Some(preset) = preset {
                cfg.aggregation.preset = preset;
            }
            cfg.output.write_combined |= combined;
            cfg.output.write_parquet |= parquet;
            run_season(&cfg)
        }
        Commands::Merge {
            config,
            filtered,
            reference,
            output,
        } => {
            let mut cfg = load_config(config)?;
            if let Some(filtered) = filtered {
                cfg.merge.filtered = filtered;
            }
            if let Some(reference) = reference {
                cfg.merge.reference = reference;
            }
            if let Some(output) = output {
                cfg.merge.output = output;
            }
            run_merge_cmd(&cfg)
        }
        Commands::Config => {
            print!("{}", PipelineConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(&path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn run_season(cfg: &PipelineConfig) -> Result<()> {
    let source = GithubSource::new(&cfg.source).context("building data source")?;
    let progress = StdoutProgress;

    let summary = Pipeline::new(&source, &FsWriter, &progress, cfg).run()?;
    print_summary(&summary);

    if !summary.is_complete() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_merge_cmd(cfg: &PipelineConfig) -> Result<()> {
    let http = cfg.source.http_client().context("building HTTP client")?;
    let loader = LocationLoader::new(http);

    let summary = run_merge(&loader, &FsWriter, &cfg.merge)?;
    println!(
        "Data has been merged and saved to '{}' ({} rows)",
        summary.output.display(),
        summary.rows
    );
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("=== Season Summary ===");
    println!("Players listed:   {}", summary.listed);
    println!("Players fetched:  {}", summary.fetched);
    println!("Aggregated rows:  {}", summary.aggregated_rows);
    println!("Skipped:          {}", summary.skipped.len());
    for path in &summary.artifacts {
        println!("Wrote {}", path.display());
    }

    if !summary.skipped.is_empty() {
        eprintln!();
        eprintln!("Skipped players:");
        for skipped in &summary.skipped {
            eprintln!("  {}: {}", skipped.entity, skipped.reason);
        }
    }
}
