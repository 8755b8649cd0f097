use crate::models::WINNERS_UNKNOWN;
use chrono::NaiveDate;

// ── Cell text ─────────────────────────────────────────────────────────────────

/// Trim and squeeze runs of whitespace (incl. &nbsp;) into one space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "04-15-22-31-40-58" → ["04", "15", "22", "31", "40", "58"]
/// Leading zeros are kept; empty parts are dropped.
pub fn parse_number_list(s: &str) -> Vec<String> {
    s.split('-')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Digits only; "*", blanks and other markers become "0".
/// "2 winners" → "2" | "1,024" → "1024" | "*" → "0"
pub fn parse_winners(s: &str) -> String {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        WINNERS_UNKNOWN.to_string()
    } else {
        digits
    }
}

// ── Dates ─────────────────────────────────────────────────────────────────────

/// Strict ISO form used for operator input and on disk.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Lenient parse for dates lifted from older data files:
/// "2025-10-14" | "Oct 14, 2025" | "October 14, 2025" | "10/14/2025"
pub fn parse_loose_date(s: &str) -> Option<NaiveDate> {
    let s = collapse_whitespace(s);
    ["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%m/%d/%Y", "%d %B %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&s, fmt).ok())
}
