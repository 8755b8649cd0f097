use crate::models::DrawFields;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, trace};

use super::cleaner::{collapse_whitespace, parse_number_list, parse_winners};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no results table on page")]
    NoTable,

    #[error("results table has no winning combination")]
    NoNumbers,

    #[error("bad selector {0:?}")]
    Selector(String),
}

// ── Label rules ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Numbers,
    Jackpot,
    Winners,
}

struct Rule {
    matches: fn(&str) -> bool,
    field: Field,
    first_match_wins: bool,
}

/// Evaluated top to bottom against the lowercased label; a row feeds the
/// first rule it matches.
const RULES: &[Rule] = &[
    Rule {
        matches: |label| label.contains("combination"),
        field: Field::Numbers,
        first_match_wins: true,
    },
    // "Jackpot Winners" is a winner count, not a prize
    Rule {
        matches: |label| label.contains("jackpot") && !label.contains("winner"),
        field: Field::Jackpot,
        first_match_wins: true,
    },
    Rule {
        matches: |label| label.contains("winner"),
        field: Field::Winners,
        first_match_wins: true,
    },
];

/// Content wrappers seen on the results site, most specific first.
const CONTENT_REGIONS: &[&str] = &["div.post_content", "div.entry-content", "article", "main"];

const TABLE_MARKER: &str = "winning combination";

// ── Extraction ────────────────────────────────────────────────────────────────

pub fn extract(html: &str) -> Result<DrawFields, ExtractError> {
    let doc = Html::parse_document(html);
    let region = content_region(&doc)?;
    let table = results_table(region)?;

    let row_sel = selector("tbody > tr")?;
    let mut fields = DrawFields::default();
    let mut seen: Vec<Field> = Vec::with_capacity(RULES.len());

    for tr in table.select(&row_sel) {
        let cells: Vec<String> = tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "td" | "th"))
            .map(|c| collapse_whitespace(&c.text().collect::<String>()))
            .collect();

        if cells.len() < 2 {
            continue;
        }

        let label = cells[0].to_lowercase();
        let value = cells[1].as_str();

        let Some(rule) = RULES.iter().find(|r| (r.matches)(label.as_str())) else {
            continue;
        };
        if rule.first_match_wins && seen.contains(&rule.field) {
            trace!("Ignoring repeated {:?} row {:?}", rule.field, label);
            continue;
        }

        let applied = match rule.field {
            Field::Numbers => {
                let numbers = parse_number_list(value);
                let ok = !numbers.is_empty();
                if ok {
                    fields.numbers = numbers;
                }
                ok
            }
            Field::Jackpot => {
                let ok = !value.is_empty();
                if ok {
                    fields.jackpot = value.to_string();
                }
                ok
            }
            Field::Winners => {
                fields.winners = parse_winners(value);
                true
            }
        };
        if applied {
            seen.push(rule.field);
        }
    }

    if fields.numbers.is_empty() {
        return Err(ExtractError::NoNumbers);
    }

    debug!(
        "Extracted {} numbers, jackpot={:?}, winners={:?}",
        fields.numbers.len(),
        fields.jackpot,
        fields.winners
    );
    Ok(fields)
}

/// First known content wrapper, or the whole document when the page has none.
fn content_region(doc: &Html) -> Result<ElementRef<'_>, ExtractError> {
    for css in CONTENT_REGIONS {
        let sel = selector(css)?;
        if let Some(el) = doc.select(&sel).next() {
            return Ok(el);
        }
    }
    Ok(doc.root_element())
}

/// The first table mentioning the winning combination, else the first table.
fn results_table(region: ElementRef<'_>) -> Result<ElementRef<'_>, ExtractError> {
    let table_sel = selector("table")?;
    let mut first = None;

    for table in region.select(&table_sel) {
        let text = collapse_whitespace(&table.text().collect::<Vec<_>>().join(" ")).to_lowercase();
        if text.contains(TABLE_MARKER) {
            return Ok(table);
        }
        if first.is_none() {
            first = Some(table);
        }
    }

    first.ok_or(ExtractError::NoTable)
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::Selector(css.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> String {
        format!("<html><head><title>Results</title></head><body>{}</body></html>", body)
    }

    const RESULTS_TABLE: &str = r#"
        <div class="post_content">
          <p>Ultra Lotto 6/58 result for October 14, 2025.</p>
          <table>
            <tbody>
              <tr><td>Winning Combination</td><td>04-15-22-31-40-58</td></tr>
              <tr><td>Jackpot Prize</td><td>₱50,000,000.00</td></tr>
              <tr><td>Number of Winners</td><td>*</td></tr>
            </tbody>
          </table>
        </div>"#;

    #[test]
    fn extracts_all_three_fields() {
        let fields = extract(&page(RESULTS_TABLE)).unwrap();
        assert_eq!(fields.numbers, ["04", "15", "22", "31", "40", "58"]);
        assert_eq!(fields.jackpot, "₱50,000,000.00");
        assert_eq!(fields.winners, "0");
    }

    #[test]
    fn prefers_table_with_winning_combination() {
        let html = page(
            r#"<div class="post_content">
                 <table><tr><td>Jackpot Prize</td><td>₱1.00</td></tr>
                        <tr><td>Combination</td><td>99-98</td></tr></table>
                 <table>
                   <tr><th>Winning Combination</th><td>01 - 02 - 03 - 04 - 05 - 06</td></tr>
                   <tr><th>Jackpot Prize</th><td> ₱29,700,000.00 </td></tr>
                   <tr><th>Number of Winners</th><td>2 winners</td></tr>
                 </table>
               </div>"#,
        );
        let fields = extract(&html).unwrap();
        assert_eq!(fields.numbers, ["01", "02", "03", "04", "05", "06"]);
        assert_eq!(fields.jackpot, "₱29,700,000.00");
        assert_eq!(fields.winners, "2");
    }

    #[test]
    fn falls_back_to_first_table_in_region() {
        let html = page(
            r#"<div class="post_content">
                 <table>
                   <tr><td>Combination</td><td>12-07-33-41-02-19</td></tr>
                   <tr><td>Winners</td><td></td></tr>
                 </table>
               </div>"#,
        );
        let fields = extract(&html).unwrap();
        assert_eq!(fields.numbers, ["12", "07", "33", "41", "02", "19"]);
        assert_eq!(fields.jackpot, "N/A");
        assert_eq!(fields.winners, "0");
    }

    #[test]
    fn first_jackpot_row_wins() {
        let html = page(
            r#"<article><table>
                 <tr><td>Winning Combination</td><td>1-2-3-4-5-6</td></tr>
                 <tr><td>Jackpot Prize</td><td>₱5,940,000.00</td></tr>
                 <tr><td>Next Jackpot</td><td>₱8,000,000.00</td></tr>
               </table></article>"#,
        );
        assert_eq!(extract(&html).unwrap().jackpot, "₱5,940,000.00");
    }

    #[test]
    fn table_outside_region_is_ignored() {
        let html = page(
            r#"<table><tr><td>Winning Combination</td><td>1-2-3-4-5-6</td></tr></table>
               <div class="post_content"><p>No draw tonight.</p></div>"#,
        );
        assert_eq!(extract(&html), Err(ExtractError::NoTable));
    }

    #[test]
    fn no_table_at_all() {
        let html = page("<div class=\"post_content\"><p>Results will be posted soon.</p></div>");
        assert_eq!(extract(&html), Err(ExtractError::NoTable));
    }

    #[test]
    fn page_without_region_uses_any_table() {
        let html = page("<table><tr><td>Winning Combination</td><td>08-16-24</td></tr></table>");
        assert_eq!(extract(&html).unwrap().numbers, ["08", "16", "24"]);
    }

    #[test]
    fn table_without_combination_row_has_no_numbers() {
        let html = page(
            r#"<div class="post_content"><table>
                 <tr><td>Game</td><td>Lotto 6/42</td></tr>
                 <tr><td>Jackpot Prize</td><td>₱5,000,000.00</td></tr>
               </table></div>"#,
        );
        assert_eq!(extract(&html), Err(ExtractError::NoNumbers));
    }

    #[test]
    fn placeholder_dashes_are_no_numbers() {
        let html = page(
            r#"<div class="post_content"><table>
                 <tr><td>Winning Combination</td><td>- - -</td></tr>
               </table></div>"#,
        );
        assert_eq!(extract(&html), Err(ExtractError::NoNumbers));
    }

    #[test]
    fn single_cell_rows_are_skipped() {
        let html = page(
            r#"<div class="post_content"><table>
                 <tr><td colspan="2">Winning Combination</td></tr>
                 <tr><td>Winning Combination</td><td>10-20-30-40-50-55</td></tr>
               </table></div>"#,
        );
        assert_eq!(extract(&html).unwrap().numbers.len(), 6);
    }

    const DECOY_TABLE: &str = "<table><tr><td>Draw Days</td><td>Tue-Thu-Sun</td></tr></table>";

    #[test]
    fn marker_matches_across_nbsp() {
        let html = page(&format!(
            r#"<div class="post_content">{}
                 <table><tr><td>Winning&nbsp;Combination</td><td>04-15-22-31-40-58</td></tr></table>
               </div>"#,
            DECOY_TABLE
        ));
        assert_eq!(extract(&html).unwrap().numbers, ["04", "15", "22", "31", "40", "58"]);
    }

    #[test]
    fn marker_matches_across_line_break() {
        let html = page(&format!(
            r#"<div class="post_content">{}
                 <table><tr><td>Winning<br>Combination</td><td>04-15-22-31-40-58</td></tr></table>
               </div>"#,
            DECOY_TABLE
        ));
        assert_eq!(extract(&html).unwrap().numbers, ["04", "15", "22", "31", "40", "58"]);
    }

    #[test]
    fn jackpot_winners_row_feeds_winners() {
        let html = page(
            r#"<div class="post_content"><table>
                 <tr><td>Winning Combination</td><td>1-2-3-4-5-6</td></tr>
                 <tr><td>Jackpot Prize</td><td>₱5,940,000.00</td></tr>
                 <tr><td>Jackpot Winners</td><td>2</td></tr>
               </table></div>"#,
        );
        let fields = extract(&html).unwrap();
        assert_eq!(fields.jackpot, "₱5,940,000.00");
        assert_eq!(fields.winners, "2");
    }
}
