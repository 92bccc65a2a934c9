use chrono::{DateTime, Utc};
use cinelist_models::WatchlistEntry;
use serde::Serialize;

/// Summary figures shown alongside the watchlist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistStats {
    pub total: usize,
    /// Mean `vote_average`, rounded to one decimal. `None` when empty.
    pub average_rating: Option<f64>,
    /// `addedAt` of the most recently inserted entry
    pub last_added: Option<DateTime<Utc>>,
}

impl WatchlistStats {
    pub fn from_entries(entries: &[WatchlistEntry]) -> Self {
        let average_rating = if entries.is_empty() {
            None
        } else {
            let sum: f64 = entries.iter().map(|e| e.movie.vote_average).sum();
            Some(round_one_decimal(sum / entries.len() as f64))
        };

        Self {
            total: entries.len(),
            average_rating,
            last_added: entries.last().map(|e| e.added_at),
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Newest first by `addedAt`; entries with equal timestamps keep the later insertion first
pub fn sort_recently_added(entries: &[WatchlistEntry]) -> Vec<WatchlistEntry> {
    let mut sorted: Vec<WatchlistEntry> = entries.iter().rev().cloned().collect();
    sorted.sort_by(|a, b| b.added_at.cmp(&a.added_at));
    sorted
}
