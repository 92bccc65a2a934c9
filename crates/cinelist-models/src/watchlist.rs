use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::movie::MovieSummary;

/// A movie saved to the watchlist, snapshotted at the time it was added.
///
/// Serializes flat: the summary fields followed by `addedAt`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    #[serde(flatten)]
    pub movie: MovieSummary,
    #[serde(rename = "addedAt")]
    pub added_at: DateTime<Utc>,
}

impl WatchlistEntry {
    pub fn new(movie: MovieSummary, added_at: DateTime<Utc>) -> Self {
        Self { movie, added_at }
    }

    pub fn id(&self) -> u64 {
        self.movie.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_serializes_flat_with_added_at() {
        let added_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let entry = WatchlistEntry::new(MovieSummary::new(7, "Se7en"), added_at);

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["title"], "Se7en");
        assert_eq!(value["poster_path"], serde_json::Value::Null);
        assert_eq!(value["addedAt"], "2024-03-01T12:00:00Z");
        assert!(value.get("movie").is_none());
    }

    #[test]
    fn test_entry_requires_added_at() {
        let json = r#"{"id": 7, "title": "Se7en"}"#;
        assert!(serde_json::from_str::<WatchlistEntry>(json).is_err());
    }
}
