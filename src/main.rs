use anyhow::Context;
use clap::{Parser, Subcommand};
use showings_aggregator::apis::create_api;
use showings_aggregator::config::Config;
use showings_aggregator::refresh::{list_active_showings, RefreshReport, RefreshWorkflow};
use showings_aggregator::storage::{InMemoryStorage, Storage};
use showings_aggregator::{logging, metrics, CinemaApi, RawTitle, Source, TitleMatcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "showings")]
#[command(about = "Cinema showtimes aggregator for Grand, Prime and Taj")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match raw title lists and print the canonical titles as JSON
    Match {
        /// JSON list of Grand titles
        #[arg(long)]
        grand: Option<PathBuf>,
        /// JSON list of Prime titles
        #[arg(long)]
        prime: Option<PathBuf>,
        /// JSON list of Taj titles
        #[arg(long)]
        taj: Option<PathBuf>,
    },
    /// Run a refresh against the source snapshots
    Refresh {
        /// Specific sources to refresh (comma-separated). Available: grand, prime, taj
        #[arg(long)]
        sources: Option<String>,
        /// Directory holding <source>.json snapshots
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
    /// Run a refresh and list the showings still on
    Active {
        #[arg(long)]
        sources: Option<String>,
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
}

fn read_titles(path: Option<&Path>) -> anyhow::Result<Vec<RawTitle>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading titles from {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing titles in {}", path.display()))
}

fn select_sources(config: &Config, sources: Option<&str>) -> anyhow::Result<Vec<Source>> {
    match sources {
        Some(list) => list
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Source>().map_err(anyhow::Error::from))
            .collect(),
        None => Ok(config.sources.enabled_sources()?),
    }
}

async fn run_refresh(
    config: &Config,
    storage: Arc<dyn Storage>,
    sources: Option<&str>,
    fixtures: Option<&Path>,
) -> anyhow::Result<RefreshReport> {
    let fixtures_dir = fixtures
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.sources.fixtures_dir));

    let apis: Vec<Box<dyn CinemaApi>> = select_sources(config, sources)?
        .into_iter()
        .map(|source| create_api(source, &fixtures_dir))
        .collect();
    if apis.is_empty() {
        warn!("No sources selected");
    }

    let report = RefreshWorkflow::new(storage, apis)
        .with_matcher(TitleMatcher::new(config.matching.fuzzy_threshold))
        .run()
        .await?;
    Ok(report)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::load()?;
    logging::init_logging(&config.logging);
    metrics::init_metrics();

    let cli = Cli::parse();

    match cli.command {
        Commands::Match { grand, prime, taj } => {
            let grand = read_titles(grand.as_deref())?;
            let prime = read_titles(prime.as_deref())?;
            let taj = read_titles(taj.as_deref())?;

            let matcher = TitleMatcher::new(config.matching.fuzzy_threshold);
            let canonical = matcher.match_titles(&grand, &prime, &taj)?;
            info!("Matched {} canonical titles", canonical.len());
            println!("{}", serde_json::to_string_pretty(&canonical)?);
        }
        Commands::Refresh { sources, fixtures } => {
            let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
            let report = run_refresh(&config, storage, sources.as_deref(), fixtures.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Active { sources, fixtures } => {
            let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
            run_refresh(&config, storage.clone(), sources.as_deref(), fixtures.as_deref()).await?;
            let active = list_active_showings(storage.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&active)?);
        }
    }

    Ok(())
}
