//! Shelterscope — Earthquake shelter site suitability.
//! Entry point for the `shelterscope` binary.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shelterscope_agent::config::{Config, CONFIG_ENV, DEFAULT_CONFIG_FILE};
use shelterscope_agent::pipeline::{self, Pipeline};

#[derive(Parser)]
#[command(
    name = "shelterscope",
    version,
    about = "Rank candidate earthquake shelter sites with AHP weights and MCDA scoring",
    long_about = None,
)]
struct Cli {
    /// Configuration file (defaults to ./shelterscope.toml).
    #[arg(long, short, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Full pipeline: weights, scoring, exports, map and reports.
    Run,

    /// Derive AHP weights, save them and print the weight table.
    Weights,

    /// Normalise and score a GeoJSON file with an existing weights file.
    Score(ScoreArgs),

    /// Build the candidate-site table from the raw enrichment layers.
    Enrich,

    /// Validate the pairwise matrix and print its consistency ratio.
    CheckMatrix,
}

#[derive(Args)]
struct ScoreArgs {
    /// Candidate sites GeoJSON carrying the raw criterion columns.
    #[arg(long)]
    input: PathBuf,

    /// Scored GeoJSON to write.
    #[arg(long)]
    output: PathBuf,

    /// Weights JSON (structured or legacy flat form).
    #[arg(long)]
    weights: PathBuf,

    /// Also write a flattened CSV here.
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Config::load_from(p),
        None => Config::load(),
    }
}

fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run => {
            let config = load_config(cli.config.as_ref())?;
            let report = Pipeline::run(&config)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Weights => {
            let config = load_config(cli.config.as_ref())?;
            let result = pipeline::derive_weights(&config)?;
            let weights = pipeline::persist_weights(&config, &result)?;
            println!("{:<24} {:>8}  direction", "criterion", "weight");
            for w in &weights {
                println!("{:<24} {:>8.4}  {}", w.name, w.weight, w.direction);
            }
            println!("lambda_max = {:.4}  CI = {:.4}  CR = {:.4}", result.lambda_max, result.ci, result.cr);
        }
        Command::Score(args) => {
            let bounds = Config::scoring_bounds(cli.config.as_deref(), Path::new(DEFAULT_CONFIG_FILE))?;
            let table = pipeline::score_file(&args.input, &args.output, &args.weights, args.csv.as_deref(), &bounds)?;
            for site in table.top(5) {
                println!(
                    "{:>4}  {:<20} {:.4}",
                    site.rank().unwrap_or_default(),
                    site.id,
                    site.score().unwrap_or_default()
                );
            }
        }
        Command::Enrich => {
            let config = load_config(cli.config.as_ref())?;
            let enrichment = config
                .enrichment
                .as_ref()
                .context("No [enrichment] section in the configuration")?;
            let (table, _) = pipeline::enrich(&config, enrichment)?;
            println!("{} sites written to {}", table.len(), config.paths.sites.display());
        }
        Command::CheckMatrix => {
            let config = load_config(cli.config.as_ref())?;
            let result = pipeline::derive_weights(&config)?;
            let verdict = if result.is_consistent_at(config.ahp.consistency_threshold) {
                "consistent"
            } else {
                "INCONSISTENT"
            };
            for (name, weight) in result.rounded_weights(4) {
                println!("{name:<24} {weight:>8.4}");
            }
            println!(
                "n = {}  lambda_max = {:.4}  CI = {:.4}  CR = {:.4} ({verdict})",
                result.criteria.len(),
                result.lambda_max,
                result.ci,
                result.cr
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shelterscope=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Shelterscope {}", env!("CARGO_PKG_VERSION"));

    tokio::task::spawn_blocking(move || dispatch(cli))
        .await
        .context("Pipeline task panicked")?
}
