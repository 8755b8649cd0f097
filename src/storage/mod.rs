//! Per-game draw history persisted as one JSON array per file.
//!
//! Ordering: newest first, by draw date. Every mutation keeps that order and
//! `load` restores it for files written by older tooling, so `entries()[0]`
//! is always the latest draw.

pub mod summary;

use crate::config::games::Game;
use crate::models::{DrawResult, is_placeholder_winners};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("{path:?} is not a valid history file: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    #[error("a result for {0} is already stored")]
    DuplicateDate(NaiveDate),

    #[error("no stored result for {0}")]
    MissingDate(NaiveDate),
}

// ── History ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<DrawResult>,
}

impl History {
    pub fn new(mut entries: Vec<DrawResult>) -> Self {
        // stable: equal dates keep file order
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Self { entries }
    }

    pub fn entries(&self) -> &[DrawResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&DrawResult> {
        self.entries.first()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DrawResult> {
        self.entries.iter().find(|e| e.date == date)
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.get(date).is_some()
    }

    /// Insert a draw for a new date at its newest-first position.
    pub fn upsert_append(&mut self, result: DrawResult) -> Result<(), StoreError> {
        if self.contains_date(result.date) {
            return Err(StoreError::DuplicateDate(result.date));
        }
        let at = self.entries.partition_point(|e| e.date > result.date);
        self.entries.insert(at, result);
        Ok(())
    }

    /// Replace only `winners` of the entry at `date`.
    /// Returns whether anything changed; placeholders and equal values are no-ops.
    pub fn patch_winners(&mut self, date: NaiveDate, winners: &str) -> Result<bool, StoreError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.date == date)
            .ok_or(StoreError::MissingDate(date))?;

        if is_placeholder_winners(winners) || entry.winners == winners {
            return Ok(false);
        }
        entry.winners = winners.to_string();
        Ok(true)
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn open(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn path_for(&self, game: &Game) -> PathBuf {
        self.dir.join(format!("{}.json", game.key))
    }

    /// Empty history when the game has never been ingested.
    pub fn load(&self, game: &Game) -> Result<History, StoreError> {
        let path = self.path_for(game);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{}: no history at {:?}", game, path);
                return Ok(History::default());
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        let entries: Vec<DrawResult> = serde_json::from_slice(&bytes)
            .map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;

        let mut history = History::new(entries);
        let before = history.len();
        // sorted and stable, so the first of each date is the one from file order
        history.entries.dedup_by_key(|e| e.date);
        if history.len() < before {
            warn!(
                "{}: dropped {} duplicate-date entries from {:?}",
                game,
                before - history.len(),
                path
            );
        }
        debug!("{}: loaded {} entries", game, history.len());
        Ok(history)
    }

    /// Overwrite the game's file via temp file + rename; the previous file
    /// survives any failure before the rename.
    pub fn save(&self, game: &Game, history: &History) -> Result<(), StoreError> {
        let path = self.path_for(game);
        let tmp = path.with_extension("json.tmp");

        let result = self.write_replace(&tmp, &path, history);
        if result.is_err() && tmp.exists() {
            let _ = fs::remove_file(&tmp);
        }
        result.map_err(|source| StoreError::WriteFailed {
            path: path.clone(),
            source,
        })?;

        info!("{}: saved {} entries to {:?}", game, history.len(), path);
        Ok(())
    }

    fn write_replace(&self, tmp: &Path, path: &Path, history: &History) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let mut json = serde_json::to_vec_pretty(history).map_err(io::Error::other)?;
        json.push(b'\n');

        let mut file = fs::File::create(tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
        drop(file);

        fs::rename(tmp, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::games::CATALOG;
    use tempfile::TempDir;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    fn draw(day: u32, winners: &str) -> DrawResult {
        DrawResult {
            date: d(day),
            numbers: vec!["04".into(), "15".into(), "22".into(), "31".into(), "40".into(), "58".into()],
            jackpot: "₱50,000,000.00".into(),
            winners: winners.into(),
            source: format!("https://lotto.test/day-{}/", day),
        }
    }

    #[test]
    fn append_keeps_newest_first() {
        let mut h = History::default();
        h.upsert_append(draw(10, "0")).unwrap();
        h.upsert_append(draw(14, "0")).unwrap();
        h.upsert_append(draw(12, "0")).unwrap();

        let dates: Vec<_> = h.entries().iter().map(|e| e.date).collect();
        assert_eq!(dates, [d(14), d(12), d(10)]);
        assert_eq!(h.latest().unwrap().date, d(14));
    }

    #[test]
    fn append_rejects_existing_date() {
        let mut h = History::new(vec![draw(14, "0")]);
        assert!(matches!(
            h.upsert_append(draw(14, "3")),
            Err(StoreError::DuplicateDate(_))
        ));
        assert_eq!(h.len(), 1);
        assert_eq!(h.entries()[0].winners, "0");
    }

    #[test]
    fn patch_touches_only_winners() {
        let mut h = History::new(vec![draw(14, "*"), draw(12, "0")]);
        let before = h.get(d(14)).unwrap().clone();

        assert!(h.patch_winners(d(14), "2").unwrap());

        let after = h.get(d(14)).unwrap();
        assert_eq!(after.winners, "2");
        assert_eq!(after.date, before.date);
        assert_eq!(after.numbers, before.numbers);
        assert_eq!(after.jackpot, before.jackpot);
        assert_eq!(after.source, before.source);
        assert_eq!(h.get(d(12)).unwrap().winners, "0");
    }

    #[test]
    fn patch_noops() {
        let mut h = History::new(vec![draw(14, "5")]);
        assert!(!h.patch_winners(d(14), "5").unwrap());
        assert!(!h.patch_winners(d(14), "*").unwrap());
        assert!(!h.patch_winners(d(14), "0").unwrap());
        assert_eq!(h.entries()[0].winners, "5");
        assert!(matches!(h.patch_winners(d(1), "3"), Err(StoreError::MissingDate(_))));
    }

    #[test]
    fn missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = HistoryStore::open(&tmp.path().join("nested"));
        assert!(store.load(&CATALOG[0]).unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = TempDir::new().unwrap();
        let store = HistoryStore::open(tmp.path());
        let game = &CATALOG[1];

        let h = History::new(vec![draw(14, "0"), draw(12, "7"), draw(9, "*")]);
        store.save(game, &h).unwrap();

        let loaded = store.load(game).unwrap();
        assert_eq!(loaded, h);
        assert!(!tmp.path().join("grand-lotto-6-55.json.tmp").exists());
    }

    #[test]
    fn ascending_files_are_reordered_on_load() {
        let tmp = TempDir::new().unwrap();
        let store = HistoryStore::open(tmp.path());
        let game = &CATALOG[4];

        let ascending = vec![draw(3, "1"), draw(5, "0"), draw(7, "2")];
        fs::write(store.path_for(game), serde_json::to_string(&ascending).unwrap()).unwrap();

        let loaded = store.load(game).unwrap();
        assert_eq!(loaded.latest().unwrap().date, d(7));
        assert_eq!(loaded.entries()[2].date, d(3));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        let store = HistoryStore::open(tmp.path());
        let game = &CATALOG[2];
        fs::write(store.path_for(game), b"{ not json").unwrap();

        assert!(matches!(store.load(game), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn failed_write_leaves_previous_file() {
        let tmp = TempDir::new().unwrap();
        let store = HistoryStore::open(tmp.path());
        let game = &CATALOG[3];

        let good = History::new(vec![draw(14, "0")]);
        store.save(game, &good).unwrap();

        // a directory squatting on the temp path makes File::create fail
        fs::create_dir(store.path_for(game).with_extension("json.tmp")).unwrap();
        let mut bigger = good.clone();
        bigger.upsert_append(draw(15, "0")).unwrap();

        assert!(matches!(
            store.save(game, &bigger),
            Err(StoreError::WriteFailed { .. })
        ));
        assert_eq!(store.load(game).unwrap(), good);
    }

    #[test]
    fn duplicate_dates_keep_first_in_file() {
        let tmp = TempDir::new().unwrap();
        let store = HistoryStore::open(tmp.path());
        let game = &CATALOG[1];

        let raw = vec![draw(14, "3"), draw(12, "0"), draw(14, "0"), draw(12, "1")];
        fs::write(store.path_for(game), serde_json::to_string(&raw).unwrap()).unwrap();

        let loaded = store.load(game).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(d(14)).unwrap().winners, "3");
        assert_eq!(loaded.get(d(12)).unwrap().winners, "0");
    }
}
