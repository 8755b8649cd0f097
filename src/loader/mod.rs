//! Import of draw files written by earlier tooling.
//!
//! Two shapes are understood:
//! - a plain array of results (current schema, possibly oldest-first)
//! - an envelope `{ "latest": {...}, "history": [...], "frequency": {...} }`
//!
//! The file stem names the game: a storage key (`ultra-lotto-6-58`) or a
//! short slug (`6-58`).

use crate::config::games::{self, Game};
use crate::models::{DrawResult, JACKPOT_UNKNOWN};
use crate::scraper::cleaner::{collapse_whitespace, parse_loose_date, parse_winners};
use crate::storage::HistoryStore;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyFile {
    Plain(Vec<LegacyEntry>),
    Envelope {
        #[serde(default)]
        latest: Option<LegacyEntry>,
        #[serde(default)]
        history: Vec<LegacyEntry>,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LegacyEntry {
    date: String,
    numbers: Vec<Value>,
    jackpot: Option<String>,
    winners: Option<String>,
    source: Option<String>,
}

impl LegacyEntry {
    fn into_result(self) -> Option<DrawResult> {
        let date = parse_loose_date(&self.date)?;

        let numbers: Vec<String> = self
            .numbers
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect();
        if numbers.is_empty() {
            return None;
        }

        let jackpot = self
            .jackpot
            .map(|j| collapse_whitespace(&j))
            .filter(|j| !j.is_empty() && j != "—" && j != "-")
            .unwrap_or_else(|| JACKPOT_UNKNOWN.to_string());

        Some(DrawResult {
            date,
            numbers,
            jackpot,
            winners: parse_winners(self.winners.as_deref().unwrap_or_default()),
            source: self.source.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub files: usize,
    pub added: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Parse one legacy file into draws for the game its name points at.
pub fn load_legacy(path: &Path) -> Result<(&'static Game, Vec<DrawResult>)> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("No file stem in {:?}", path))?;
    let game = games::lookup_by_stem(stem)
        .with_context(|| format!("{:?} does not name a known game", path))?;

    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let parsed: LegacyFile =
        serde_json::from_slice(&bytes).with_context(|| format!("Unrecognised layout in {:?}", path))?;

    let raw = match parsed {
        LegacyFile::Plain(entries) => entries,
        LegacyFile::Envelope { latest, history } => latest.into_iter().chain(history).collect(),
    };

    let total = raw.len();
    let results: Vec<DrawResult> = raw.into_iter().filter_map(LegacyEntry::into_result).collect();
    if results.len() < total {
        warn!(
            "{:?}: dropped {} entries without a usable date or numbers",
            path,
            total - results.len()
        );
    }

    debug!("{}: {} entries parsed from {:?}", game, results.len(), path);
    Ok((game, results))
}

pub fn discover_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to list {:?}", dir))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Merge every recognisable file in `dir` into the store; dates already
/// present are left as they are.
pub fn import_dir(store: &HistoryStore, dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    for path in discover_json_files(dir)? {
        stats.files += 1;
        let (game, results) = match load_legacy(&path) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Skipping {:?}: {:#}", path, e);
                stats.errors += 1;
                continue;
            }
        };

        let mut history = match store.load(game) {
            Ok(h) => h,
            Err(e) => {
                warn!("Skipping {:?}: {}", path, e);
                stats.errors += 1;
                continue;
            }
        };
        let mut added = 0usize;
        for result in results {
            if history.contains_date(result.date) {
                stats.skipped += 1;
                continue;
            }
            history.upsert_append(result)?;
            added += 1;
        }

        if added > 0 {
            store.save(game, &history)?;
        }
        info!("{}: {} draws imported from {:?}", game, added, path);
        stats.added += added;
    }

    Ok(stats)
}
