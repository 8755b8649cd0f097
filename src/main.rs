mod config;
mod loader;
mod models;
mod pipeline;
mod scraper;
mod storage;
mod utils;

use anyhow::{Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::config::games::{self, CATALOG};
use crate::pipeline::{Pipeline, RunReport, parse_date_arg, target_date};
use crate::storage::HistoryStore;

#[derive(Parser)]
#[command(name = "lotto-ingest", about = "Lottery draw result ingestion", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch one draw date for every game and append it (nightly mode)
    Update {
        /// Draw date to fetch, YYYY-MM-DD (default: today)
        #[arg(long, env = "TARGET_DATE")]
        date: Option<String>,

        /// Only re-check recent entries whose winner count is unknown
        #[arg(long, env = "WINNERS_ONLY")]
        winners_only: bool,

        /// Restrict to these games (display name or storage key)
        #[arg(short, long = "game")]
        games: Vec<String>,
    },

    /// Fetch every missing draw in a date range
    History {
        /// First date, YYYY-MM-DD
        #[arg(long)]
        from: String,

        /// Last date, YYYY-MM-DD (default and upper bound: today)
        #[arg(long)]
        to: Option<String>,

        #[arg(short, long = "game")]
        games: Vec<String>,
    },

    /// Merge JSON files written by earlier tooling into the history store
    Import {
        #[arg(short, long)]
        dir: PathBuf,
    },

    /// Show per-game history statistics
    Stats {
        #[arg(short, long = "game")]
        games: Vec<String>,
    },

    /// List the tracked games
    Games,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "lotto_ingest=info,warn",
        1 => "lotto_ingest=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Update {
            date,
            winners_only,
            games: ids,
        } => {
            let selected = games::select(&ids)?;
            let date = target_date(date.as_deref(), Local::now().date_naive())?;
            let pipeline = Pipeline::from_config(&config)?;

            let report = if winners_only || config.pipeline.winners_only {
                pipeline.backfill_winners(&selected).await
            } else {
                pipeline.nightly(&selected, date).await
            };
            finish(report)?;
        }

        Command::History { from, to, games: ids } => {
            let selected = games::select(&ids)?;
            let today = Local::now().date_naive();
            let from = parse_date_arg(&from)?;
            let to = match to {
                Some(s) => parse_date_arg(&s)?.min(today),
                None => today,
            };
            if from > to {
                bail!("--from {} is after --to {}", from, to);
            }

            let report = Pipeline::from_config(&config)?
                .history(&selected, from, to)
                .await;
            finish(report)?;
        }

        Command::Import { dir } => {
            let _t = utils::Timer::start(format!("Import from {:?}", dir));
            let store = HistoryStore::open(&config.storage.data_dir);
            let stats = loader::import_dir(&store, &dir)?;
            info!(
                "Done: {} files, {} draws added, {} already present, {} errors",
                stats.files, stats.added, stats.skipped, stats.errors
            );
        }

        Command::Stats { games: ids } => {
            let selected = games::select(&ids)?;
            let store = HistoryStore::open(&config.storage.data_dir);
            let dash = || "—".to_string();

            println!("─────────────────────────────────");
            println!("  Lotto history — {:?}", config.storage.data_dir);
            println!("─────────────────────────────────");
            for game in selected {
                let history = store.load(game)?;
                if history.is_empty() {
                    println!("  {}: no draws yet", game.name);
                    continue;
                }
                let summary = history.summary(6);
                let hot: Vec<String> = summary
                    .hot
                    .iter()
                    .map(|n| format!("{}×{}", n.number, n.count))
                    .collect();

                println!("  {}", game.name);
                println!("    Draws   : {}", summary.draws);
                println!("    Newest  : {}", summary.newest.map(|d| d.to_string()).unwrap_or_else(dash));
                println!("    Oldest  : {}", summary.oldest.map(|d| d.to_string()).unwrap_or_else(dash));
                println!(
                    "    Winners unknown : {} ({})",
                    summary.unknown_winners,
                    utils::percent(summary.unknown_winners, summary.draws)
                );
                println!("    Hot     : {}", if hot.is_empty() { dash() } else { hot.join("  ") });
            }
            println!("─────────────────────────────────");
        }

        Command::Games => {
            for game in CATALOG {
                println!(
                    "  {:<18} {:<18} 1–{:<3} fallbacks: {}",
                    game.name,
                    game.key,
                    game.max_number,
                    game.fallback_slugs.join(", ")
                );
            }
        }
    }

    Ok(())
}

/// Log the run outcome; store or configuration failures make the exit non-zero.
fn finish(report: RunReport) -> Result<()> {
    info!(
        "Done: {} games | {} added | {} patched | {} already stored | {} misses | {} failures",
        report.games,
        report.appended,
        report.patched,
        report.skipped,
        report.misses,
        report.failures.len()
    );

    if !report.is_success() {
        for f in &report.failures {
            warn!("  {}", f);
        }
        bail!("{} game(s) failed", report.failures.len());
    }
    Ok(())
}
