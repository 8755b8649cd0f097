use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Sentinels ─────────────────────────────────────────────────────────────────

pub const JACKPOT_UNKNOWN: &str = "N/A";
pub const WINNERS_UNKNOWN: &str = "0";

/// "0", "*" and blank all mean the winner count was not published yet.
pub fn is_placeholder_winners(s: &str) -> bool {
    matches!(s.trim(), "" | "0" | "*")
}

// ── Draw result ───────────────────────────────────────────────────────────────

/// One persisted draw outcome. Field order is the on-disk JSON order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrawResult {
    pub date: NaiveDate,
    pub numbers: Vec<String>,
    pub jackpot: String,
    pub winners: String,
    pub source: String,
}

impl DrawResult {
    pub fn from_fields(date: NaiveDate, fields: DrawFields, source: &str) -> Self {
        Self {
            date,
            numbers: fields.numbers,
            jackpot: fields.jackpot,
            winners: fields.winners,
            source: source.to_string(),
        }
    }

    pub fn has_placeholder_winners(&self) -> bool {
        is_placeholder_winners(&self.winners)
    }
}

// ── Extracted page fields ─────────────────────────────────────────────────────

/// What the extractor pulls off one results page, before date/source are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawFields {
    pub numbers: Vec<String>,
    pub jackpot: String,
    pub winners: String,
}

impl Default for DrawFields {
    fn default() -> Self {
        Self {
            numbers: Vec::new(),
            jackpot: JACKPOT_UNKNOWN.to_string(),
            winners: WINNERS_UNKNOWN.to_string(),
        }
    }
}

// ── Fetch candidate ───────────────────────────────────────────────────────────

/// One URL to try; tier 0 is the primary page, fallbacks follow in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub tier: usize,
}
