//! Game catalog: the closed set of tracked draws.
//!
//! Each entry carries the display name used to build the primary URL, the
//! storage key (history file stem), the ordered fallback slugs and the ball
//! cap consumed by the reporting side.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Game {
    pub name: &'static str,
    pub key: &'static str,
    pub fallback_slugs: &'static [&'static str],
    pub max_number: u8,
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown game: {0}")]
pub struct UnknownGame(pub String);

pub const CATALOG: &[Game] = &[
    Game {
        name: "Ultra Lotto 6/58",
        key: "ultra-lotto-6-58",
        fallback_slugs: &["6-58-ultra-lotto", "6-58"],
        max_number: 58,
    },
    Game {
        name: "Grand Lotto 6/55",
        key: "grand-lotto-6-55",
        fallback_slugs: &["6-55-grand-lotto", "6-55"],
        max_number: 55,
    },
    Game {
        name: "Super Lotto 6/49",
        key: "super-lotto-6-49",
        fallback_slugs: &["6-49-super-lotto", "6-49"],
        max_number: 49,
    },
    Game {
        name: "Mega Lotto 6/45",
        key: "mega-lotto-6-45",
        fallback_slugs: &["6-45-mega-lotto", "6-45"],
        max_number: 45,
    },
    Game {
        name: "Lotto 6/42",
        key: "lotto-6-42",
        fallback_slugs: &["6-42-lotto", "6-42"],
        max_number: 42,
    },
];

/// Resolve a display name (any case) or a storage key.
pub fn lookup(id: &str) -> Result<&'static Game, UnknownGame> {
    let id = id.trim();
    CATALOG
        .iter()
        .find(|g| g.name.eq_ignore_ascii_case(id) || g.key == id)
        .ok_or_else(|| UnknownGame(id.to_string()))
}

/// Like [`lookup`], but also accepts a bare short slug such as `6-58`.
/// Used to map legacy data files onto games.
pub fn lookup_by_stem(stem: &str) -> Option<&'static Game> {
    lookup(stem)
        .ok()
        .or_else(|| CATALOG.iter().find(|g| g.fallback_slugs.contains(&stem)))
}

/// Selected games in catalog order; all of them when `ids` is empty.
pub fn select(ids: &[String]) -> Result<Vec<&'static Game>, UnknownGame> {
    if ids.is_empty() {
        return Ok(CATALOG.iter().collect());
    }
    let mut picked = ids
        .iter()
        .map(|id| lookup(id))
        .collect::<Result<Vec<_>, _>>()?;
    picked.sort_by_key(|g| CATALOG.iter().position(|c| c.key == g.key));
    picked.dedup_by_key(|g| g.key);
    Ok(picked)
}
