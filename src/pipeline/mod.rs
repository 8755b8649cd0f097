//! Reconciler: ties scraper → history store together.
//!
//! ## Run modes
//!
//! `nightly()`: default / cron use:
//!   For each game, skip if the target date is already stored, otherwise walk
//!   the URL tiers and append the first parsed draw. Idempotent: re-running
//!   for the same date fetches nothing.
//!
//! `backfill_winners()`: winners-only patch:
//!   Look at the newest `backfill_window` entries per game; re-scrape those
//!   whose winner count is still a placeholder and patch only `winners`.
//!
//! `history()`: seed or repair a date range, oldest to newest.
//!
//! Games run strictly one after another, and so do fetches; misses are
//! logged and counted, never fatal. Store and configuration errors are
//! collected in [`RunReport::failures`].

use crate::config::AppConfig;
use crate::config::games::Game;
use crate::models::DrawResult;
use crate::scraper::cleaner::parse_iso_date;
use crate::scraper::http_client::HttpClient;
use crate::scraper::{PageFetcher, ScrapeError, Scraper};
use crate::storage::{History, HistoryStore};
use crate::utils::Timer;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

pub struct Pipeline<F> {
    scraper: Scraper<F>,
    store: HistoryStore,
    backfill_window: usize,
}

impl Pipeline<HttpClient> {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let scraper = Scraper::from_config(&config.scraper).context("Failed to build scraper")?;
        Ok(Self::new(
            scraper,
            HistoryStore::open(&config.storage.data_dir),
            config.pipeline.backfill_window,
        ))
    }
}

impl<F: PageFetcher> Pipeline<F> {
    pub fn new(scraper: Scraper<F>, store: HistoryStore, backfill_window: usize) -> Self {
        Self {
            scraper,
            store,
            backfill_window,
        }
    }

    // ── Nightly append ────────────────────────────────────────────────────────

    pub async fn nightly(&self, games: &[&Game], date: NaiveDate) -> RunReport {
        let _t = Timer::start(format!("Nightly append for {}", date));
        let mut report = RunReport::default();

        for game in games {
            report.games += 1;
            if let Err(e) = self.nightly_game(game, date, &mut report).await {
                error!("{}: {:#}", game, e);
                report.failures.push(format!("{}: {:#}", game, e));
            }
        }
        report
    }

    async fn nightly_game(&self, game: &Game, date: NaiveDate, report: &mut RunReport) -> Result<()> {
        let mut history = self.load(game)?;
        if history.contains_date(date) {
            info!("{}: already have {}", game, date);
            report.skipped += 1;
            return Ok(());
        }

        let Some(result) = self.scrape(game, date).await? else {
            warn!("{}: no result found for {}", game, date);
            report.misses += 1;
            return Ok(());
        };

        let source = result.source.clone();
        history.upsert_append(result)?;
        self.save(game, &history)?;
        report.appended += 1;
        info!("{}: added {} from {}", game, date, source);
        Ok(())
    }

    // ── Winners backfill ──────────────────────────────────────────────────────

    pub async fn backfill_winners(&self, games: &[&Game]) -> RunReport {
        let _t = Timer::start(format!("Winners backfill (last {})", self.backfill_window));
        let mut report = RunReport::default();

        for game in games {
            report.games += 1;
            if let Err(e) = self.backfill_game(game, &mut report).await {
                error!("{}: {:#}", game, e);
                report.failures.push(format!("{}: {:#}", game, e));
            }
        }
        report
    }

    async fn backfill_game(&self, game: &Game, report: &mut RunReport) -> Result<()> {
        let mut history = self.load(game)?;

        let pending: Vec<(NaiveDate, String)> = history
            .entries()
            .iter()
            .take(self.backfill_window)
            .filter(|e| e.has_placeholder_winners())
            .map(|e| (e.date, e.winners.clone()))
            .collect();

        if pending.is_empty() {
            debug!("{}: recent winners all known", game);
            return Ok(());
        }

        let mut patched = 0usize;
        for (date, stored) in pending {
            let fresh = self
                .scraper
                .scrape_until(game.name, date, |r| {
                    !r.has_placeholder_winners() && r.winners != stored
                })
                .await;

            match fresh {
                Ok(r) => {
                    if history.patch_winners(date, &r.winners)? {
                        info!("{}: winners for {} → {}", game, date, r.winners);
                        patched += 1;
                    }
                }
                Err(ScrapeError::NotFound { .. }) => {
                    debug!("{}: winners for {} still unpublished", game, date);
                    report.misses += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if patched > 0 {
            self.save(game, &history)?;
            report.patched += patched;
        }
        Ok(())
    }

    // ── Date range ────────────────────────────────────────────────────────────

    pub async fn history(&self, games: &[&Game], from: NaiveDate, to: NaiveDate) -> RunReport {
        let _t = Timer::start(format!("History {} → {}", from, to));
        let mut report = RunReport::default();

        for game in games {
            report.games += 1;
            if let Err(e) = self.history_game(game, from, to, &mut report).await {
                error!("{}: {:#}", game, e);
                report.failures.push(format!("{}: {:#}", game, e));
            }
        }
        report
    }

    async fn history_game(
        &self,
        game: &Game,
        from: NaiveDate,
        to: NaiveDate,
        report: &mut RunReport,
    ) -> Result<()> {
        let mut history = self.load(game)?;
        let mut added = 0usize;

        for date in from.iter_days().take_while(|d| *d <= to) {
            if history.contains_date(date) {
                report.skipped += 1;
                continue;
            }
            match self.scrape(game, date).await? {
                Some(result) => {
                    history.upsert_append(result)?;
                    added += 1;
                }
                None => {
                    debug!("{}: nothing for {}", game, date);
                    report.misses += 1;
                }
            }
        }

        if added > 0 {
            self.save(game, &history)?;
            report.appended += added;
        }
        info!("{}: {} draws added for {} → {}", game, added, from, to);
        Ok(())
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// `None` when every tier was exhausted.
    async fn scrape(&self, game: &Game, date: NaiveDate) -> Result<Option<DrawResult>> {
        match self.scraper.scrape(game.name, date).await {
            Ok(r) => Ok(Some(r)),
            Err(ScrapeError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn load(&self, game: &Game) -> Result<History> {
        self.store
            .load(game)
            .with_context(|| format!("load history for {}", game))
    }

    fn save(&self, game: &Game, history: &History) -> Result<()> {
        self.store
            .save(game, history)
            .with_context(|| format!("save history for {}", game))
    }
}

/// Outcome counters for one run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub games: usize,
    pub appended: usize,
    pub skipped: usize,
    pub misses: usize,
    pub patched: usize,
    pub failures: Vec<String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Operator date override (`--date` / `TARGET_DATE`), strict YYYY-MM-DD.
pub fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    parse_iso_date(s).with_context(|| format!("Invalid date {:?}, expected YYYY-MM-DD", s))
}

/// The override when given, otherwise `today`.
pub fn target_date(arg: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    arg.map_or(Ok(today), parse_date_arg)
}
