pub mod cleaner;
pub mod http_client;
pub mod parsers;
pub mod resolver;

use crate::config::ScraperConfig;
use crate::config::games::UnknownGame;
use crate::models::DrawResult;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use self::http_client::{FetchError, HttpClient};
use self::parsers::extract;
use self::resolver::UrlResolver;

// ── Fetcher trait ─────────────────────────────────────────────────────────────

/// Swappable page source.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url).await
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    UnknownGame(#[from] UnknownGame),

    #[error("no result for {game} on {date} after {tried} candidate(s)")]
    NotFound {
        game: String,
        date: NaiveDate,
        tried: usize,
    },
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// Walks the candidate tiers for one (game, date) until a page yields a draw.
pub struct Scraper<F> {
    fetcher: F,
    resolver: UrlResolver,
}

impl Scraper<HttpClient> {
    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        Ok(Self::new(
            HttpClient::new(config)?,
            UrlResolver::new(&config.base_url)?,
        ))
    }
}

impl<F: PageFetcher> Scraper<F> {
    pub fn new(fetcher: F, resolver: UrlResolver) -> Self {
        Self { fetcher, resolver }
    }

    /// First candidate that extracts a non-empty winning combination wins.
    pub async fn scrape(&self, game: &str, date: NaiveDate) -> Result<DrawResult, ScrapeError> {
        self.scrape_until(game, date, |_| true).await
    }

    /// Like [`Scraper::scrape`], but a parsed draw only ends the tier walk
    /// when `accept` approves it; otherwise the next tier is tried.
    pub async fn scrape_until<P>(
        &self,
        game: &str,
        date: NaiveDate,
        accept: P,
    ) -> Result<DrawResult, ScrapeError>
    where
        P: Fn(&DrawResult) -> bool,
    {
        let candidates = self.resolver.resolve(game, date)?;
        let tried = candidates.len();

        for candidate in candidates {
            debug!("{} {}: tier {} → {}", game, date, candidate.tier, candidate.url);

            let html = match self.fetcher.fetch(&candidate.url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("{} {}: fetch failed for {}: {}", game, date, candidate.url, e);
                    continue;
                }
            };

            let fields = match extract(&html) {
                Ok(fields) => fields,
                Err(e) => {
                    warn!("{} {}: {} ({})", game, date, e, candidate.url);
                    continue;
                }
            };

            let result = DrawResult::from_fields(date, fields, &candidate.url);
            if !accept(&result) {
                debug!("{} {}: tier {} not accepted, trying next", game, date, candidate.tier);
                continue;
            }

            info!(
                "{} {}: {} from tier {}",
                game,
                date,
                result.numbers.join("-"),
                candidate.tier
            );
            return Ok(result);
        }

        Err(ScrapeError::NotFound {
            game: game.to_string(),
            date,
            tried,
        })
    }
}

// ── Test double ───────────────────────────────────────────────────────────────
