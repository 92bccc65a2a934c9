use serde::{Deserialize, Serialize};

/// A movie as it appears in catalog listings (popular, search results).
///
/// Field names follow the TMDB wire format so the same type decodes catalog
/// responses and encodes watchlist entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: String, // ISO date, empty when unknown
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

impl MovieSummary {
    /// Create a summary with only the required fields set
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            release_date: String::new(),
            vote_average: 0.0,
            vote_count: 0,
            genre_ids: Vec::new(),
        }
    }

    /// Check value constraints that serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        if !self.vote_average.is_finite() || self.vote_average < 0.0 {
            return Err(format!(
                "movie {} has invalid vote_average {}",
                self.id, self.vote_average
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_sparse_catalog_item() {
        let json = r#"{"id": 550, "title": "Fight Club", "poster_path": null}"#;
        let movie: MovieSummary = serde_json::from_str(json).unwrap();
        assert_eq!(movie.id, 550);
        assert_eq!(movie.overview, "");
        assert_eq!(movie.poster_path, None);
        assert_eq!(movie.release_date, "");
        assert!(movie.genre_ids.is_empty());
    }

    #[test]
    fn test_decode_requires_id() {
        let json = r#"{"title": "No Id"}"#;
        assert!(serde_json::from_str::<MovieSummary>(json).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_rating() {
        let mut movie = MovieSummary::new(1, "Bad");
        movie.vote_average = -0.5;
        assert!(movie.validate().is_err());

        movie.vote_average = 0.0;
        assert!(movie.validate().is_ok());
    }
}
