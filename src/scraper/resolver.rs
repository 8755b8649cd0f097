//! Candidate URL construction.
//!
//! Primary:  `{base}/{game-slug}-results-for-{month}-{day}-{year}/`
//! Fallback: `{base}/{short-slug}-lotto-results-for-{month}-{day}-{year}/`

use crate::config::games::{self, Game, UnknownGame};
use crate::models::Candidate;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use url::Url;

pub struct UrlResolver {
    base: Url,
}

impl UrlResolver {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .with_context(|| format!("Invalid base URL {:?}", base_url))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    /// Ordered candidates for a game identifier; primary first.
    pub fn resolve(&self, game: &str, date: NaiveDate) -> Result<Vec<Candidate>, UnknownGame> {
        let game = games::lookup(game)?;
        Ok(self.candidates(game, date))
    }

    pub fn candidates(&self, game: &Game, date: NaiveDate) -> Vec<Candidate> {
        let when = date_slug(date);

        let primary = format!("{}-results-for-{}/", slugify(game.name), when);
        let fallbacks = game
            .fallback_slugs
            .iter()
            .map(|short| format!("{}-lotto-results-for-{}/", short, when));

        std::iter::once(primary)
            .chain(fallbacks)
            .enumerate()
            .filter_map(|(tier, path)| {
                self.base.join(&path).ok().map(|url| Candidate {
                    url: url.to_string(),
                    tier,
                })
            })
            .collect()
    }
}

/// "Ultra Lotto 6/58" → "ultra-lotto-6-58"
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .replace('/', "-")
        .to_lowercase()
}

/// English month name regardless of locale: 2025-10-04 → "october-4-2025"
pub fn date_slug(date: NaiveDate) -> String {
    date.format("%B-%-d-%Y").to_string().to_lowercase()
}
