//! Read-only roll-ups over a stored history for the `stats` command.
//! Frequency ranking only; nothing here predicts a draw.

use super::History;
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberCount {
    pub number: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySummary {
    pub draws: usize,
    pub newest: Option<NaiveDate>,
    pub oldest: Option<NaiveDate>,
    pub unknown_winners: usize,
    pub hot: Vec<NumberCount>,
}

impl History {
    /// How often each ball label was drawn, most frequent first; ties by label.
    pub fn number_frequency(&self) -> Vec<NumberCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in self.entries() {
            for n in &entry.numbers {
                *counts.entry(n.as_str()).or_default() += 1;
            }
        }

        let mut ranked: Vec<NumberCount> = counts
            .into_iter()
            .map(|(number, count)| NumberCount {
                number: number.to_string(),
                count,
            })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.number.cmp(&b.number)));
        ranked
    }

    pub fn summary(&self, hot: usize) -> HistorySummary {
        let mut frequency = self.number_frequency();
        frequency.truncate(hot);

        HistorySummary {
            draws: self.len(),
            newest: self.latest().map(|e| e.date),
            oldest: self.entries().last().map(|e| e.date),
            unknown_winners: self
                .entries()
                .iter()
                .filter(|e| e.has_placeholder_winners())
                .count(),
            hot: frequency,
        }
    }
}
