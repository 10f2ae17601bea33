use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use steam_pipeline::database_ops::games::{GameLoader, LoaderConfig};
use steam_pipeline::database_ops::steam::{CollectorConfig, SteamCollector};
use steam_pipeline::pipeline::{clean_file, collect_to_file, load_file};
use steam_pipeline::util::env::{init_env, preflight_check};

const DEFAULT_RAW: &str = "data/raw/games_raw.json";
const DEFAULT_CLEAN: &str = "data/processed/games_clean.csv";

#[derive(Parser, Debug)]
#[command(
    name = "steam-pipeline",
    version,
    about = "Collect Steam catalog stats, clean them, and load them into Postgres"
)]
struct Cli {
    /// Log per-item fetch detail (debug level) unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Sample the Steam catalog and write the raw JSON snapshot
    Collect {
        #[arg(long, default_value = DEFAULT_RAW)]
        output: PathBuf,
        /// Override COLLECT_MAX_GAMES
        #[arg(long)]
        max_games: Option<usize>,
    },
    /// Filter and feature-engineer a raw snapshot into the clean CSV
    Clean {
        #[arg(long, default_value = DEFAULT_RAW)]
        input: PathBuf,
        #[arg(long, default_value = DEFAULT_CLEAN)]
        output: PathBuf,
    },
    /// Replace the games table with the clean CSV
    Load {
        #[arg(long, default_value = DEFAULT_CLEAN)]
        input: PathBuf,
        /// Create the table first if it does not exist
        #[arg(long, default_value_t = false)]
        create_table: bool,
    },
    /// Collect, clean and load in one go
    Run {
        #[arg(long, default_value = DEFAULT_RAW)]
        raw: PathBuf,
        #[arg(long, default_value = DEFAULT_CLEAN)]
        clean: PathBuf,
        #[arg(long)]
        max_games: Option<usize>,
        #[arg(long, default_value_t = false)]
        create_table: bool,
    },
}

const COLLECT_ENV: [&str; 6] = [
    "STEAM_API_KEY",
    "COLLECT_MAX_GAMES",
    "COLLECT_ITEM_PAUSE_MS",
    "STEAM_HTTP_TIMEOUT_SECS",
    "STEAM_REGION",
    "STEAM_LANGUAGE",
];

const LOAD_ENV: [&str; 6] = [
    "DATABASE_URL",
    "PGHOST",
    "PGPORT",
    "PGDATABASE",
    "PGUSER",
    "GAMES_TABLE",
];

async fn run_collect(output: &PathBuf, max_games: Option<usize>) -> Result<()> {
    preflight_check("collect", &["STEAM_API_KEY"], &COLLECT_ENV)?;
    let config = CollectorConfig::from_env().context("collector configuration")?;
    let max_games = max_games.unwrap_or(config.max_games);
    let collector = SteamCollector::with_http(config)?;
    let collected = collect_to_file(&collector, max_games, output)
        .await
        .context("collect stage failed")?;
    info!(collected, "collect: done");
    Ok(())
}

fn run_clean(input: &PathBuf, output: &PathBuf) -> Result<()> {
    let retained = clean_file(input, output).context("clean stage failed")?;
    info!(retained, "clean: done");
    Ok(())
}

async fn run_load(input: &PathBuf, create_table: bool) -> Result<()> {
    preflight_check("load", &[], &LOAD_ENV)?;
    let config = LoaderConfig::from_env().context("loader configuration")?;
    let loader = GameLoader::connect(&config)
        .await
        .context("connecting to destination database")?;
    if create_table {
        loader.ensure_schema().await.context("creating games table")?;
    }
    let inserted = load_file(&loader, input).await.context("load stage failed")?;
    info!(inserted, table = loader.table(), "load: done");
    Ok(())
}

/// Logs go to stderr. `RUST_LOG` overrides `--verbose`.
fn init_tracing(verbose: bool) -> Result<()> {
    let default_filter = if verbose {
        "debug,sqlx=warn,reqwest=info,hyper=info"
    } else {
        "info,sqlx=warn,reqwest=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_env();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Collect { output, max_games } => run_collect(&output, max_games).await?,
        Commands::Clean { input, output } => run_clean(&input, &output)?,
        Commands::Load {
            input,
            create_table,
        } => run_load(&input, create_table).await?,
        Commands::Run {
            raw,
            clean,
            max_games,
            create_table,
        } => {
            run_collect(&raw, max_games).await?;
            run_clean(&raw, &clean)?;
            run_load(&clean, create_table).await?;
        }
    }
    Ok(())
}
