use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use pitchsync::database_ops::Db;
use pitchsync::progress::{ProgressEvent, ProgressReporter};
use pitchsync::provider::{ApiFootballClient, FootballApi};
use pitchsync::sync::{BatchItem, CareerSync, EventCatchUp, LeagueImporter, LeagueRef, SyncConfig};
use pitchsync::telemetry::{init_tracing, DEFAULT_FILTER};
use pitchsync::util::env;

#[derive(Parser, Debug)]
#[command(name = "pitchsync", version, about = "Football data import and reconciliation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Import teams, players, standings, fixtures and events for one league season
    ImportLeague {
        /// Provider league id (or local id with --local-id)
        league_id: i64,
        season: i32,
        /// Try the id as a local league id first
        #[arg(long, default_value_t = false)]
        local_id: bool,
    },
    /// Import several league seasons in sequence, e.g. `61:2023,2024 39:2024`
    ImportBatch {
        #[arg(required = true, value_parser = parse_batch_item)]
        items: Vec<BatchItem>,
    },
    /// Reconcile a local player's full career against the provider
    SyncCareer { player_id: i64 },
    /// Backfill events for finished fixtures of a local league season
    SyncEvents {
        /// Local league id
        league_id: i64,
        season: i32,
        /// Maximum fixtures to process (defaults to SYNC_EVENT_LIMIT)
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Replace the stored events of one local fixture
    SyncFixtureEvents { fixture_id: i64 },
    /// List provider seasons of a league with their local import status
    Seasons { league_api_id: i64 },
    /// List competitions found through career syncs that were never fully imported
    Discovered,
}

fn parse_batch_item(raw: &str) -> Result<BatchItem, String> {
    let (league, seasons) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected <league_id>:<season>[,<season>..], got {raw:?}"))?;
    let league_id: i64 = league
        .trim()
        .parse()
        .map_err(|_| format!("invalid league id {league:?}"))?;
    let seasons = seasons
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().parse::<i32>().map_err(|_| format!("invalid season {s:?}")))
        .collect::<Result<Vec<_>, _>>()?;
    if seasons.is_empty() {
        return Err(format!("no seasons given for league {league_id}"));
    }
    Ok(BatchItem {
        league: LeagueRef::Api(league_id),
        seasons,
    })
}

fn provider(config: &SyncConfig) -> Result<Arc<dyn FootballApi>> {
    env::preflight_check(
        "pitchsync provider",
        &["API_FOOTBALL_KEY"],
        &[
            "API_FOOTBALL_KEY",
            "API_FOOTBALL_BASE_URL",
            "DATABASE_URL",
            "SYNC_MAX_ATTEMPTS",
            "SYNC_BACKOFF_MS",
            "SYNC_EVENT_DELAY_MS",
            "SYNC_IMPORT_EVENT_LIMIT",
            "SYNC_EVENT_LIMIT",
        ],
    )?;
    let client = ApiFootballClient::from_env(config.retry.clone())
        .context("API_FOOTBALL_KEY is required for commands that call the provider")?;
    Ok(Arc::new(client))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn print_progress(mut rx: UnboundedReceiver<ProgressEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::Log { message, severity } => eprintln!("[{severity:?}] {message}"),
            ProgressEvent::Scouting { total, years } => {
                eprintln!("[Scouting] {total} seasons: {years:?}")
            }
            ProgressEvent::Fetching {
                year,
                current,
                total,
            } => eprintln!("[Fetching] {year} ({current}/{total})"),
        }
    }
}

async fn run(command: Commands, db: Db, config: SyncConfig, progress: ProgressReporter) -> Result<()> {
    match command {
        Commands::ImportLeague {
            league_id,
            season,
            local_id,
        } => {
            let league = if local_id {
                LeagueRef::Auto(league_id)
            } else {
                LeagueRef::Api(league_id)
            };
            let importer = LeagueImporter::new(db, provider(&config)?, progress, config);
            let summary = importer.run(league, season).await?;
            print_json(&summary)?;
        }
        Commands::ImportBatch { items } => {
            let importer = LeagueImporter::new(db, provider(&config)?, progress, config);
            let outcomes = importer.import_batch(&items).await;
            let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(summary) => print_json(summary)?,
                    Err(message) => eprintln!(
                        "league {} season {} failed: {message}",
                        outcome.league_id, outcome.season
                    ),
                }
            }
            info!(jobs = outcomes.len(), failed, "batch finished");
            if failed == outcomes.len() {
                bail!("all {failed} import jobs failed");
            }
        }
        Commands::SyncCareer { player_id } => {
            let sync = CareerSync::new(db, provider(&config)?, progress);
            let summary = sync.sync_player(player_id).await?;
            print_json(&summary)?;
        }
        Commands::SyncEvents {
            league_id,
            season,
            limit,
        } => {
            let limit = limit.unwrap_or(config.event_limit);
            let events = EventCatchUp::new(db, provider(&config)?, progress, config.event_delay_ms);
            let report = events.sync_league_events(league_id, season, limit).await?;
            print_json(&report)?;
        }
        Commands::SyncFixtureEvents { fixture_id } => {
            let events = EventCatchUp::new(db, provider(&config)?, progress, config.event_delay_ms);
            let stored = events.sync_fixture_events(fixture_id, None).await?;
            println!("stored {stored} events for fixture {fixture_id}");
        }
        Commands::Seasons { league_api_id } => {
            let importer = LeagueImporter::new(db, provider(&config)?, progress, config);
            print_json(&importer.available_seasons(league_api_id).await?)?;
        }
        Commands::Discovered => {
            let mut conn = db.acquire().await?;
            let leagues = pitchsync::database_ops::repository::discovered_leagues(&mut conn).await?;
            print_json(&leagues)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env::init_env();
    init_tracing(DEFAULT_FILTER)?;

    let cli = Cli::parse();
    let config = SyncConfig::from_env();
    let max_conns = env::env_parse("DB_MAX_CONNS", 1u32);
    let db = Db::connect(&env::db_url(), max_conns).await?;

    let (progress, rx) = ProgressReporter::channel();
    let printer = tokio::spawn(print_progress(rx));

    // `run` owns the only reporter handles, so the printer ends once it returns.
    let result = run(cli.command, db.clone(), config, progress).await;
    let _ = printer.await;
    db.pool.close().await;
    result
}
