/// Failures talking to the movie metadata service
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("TMDB api_key is not configured")]
    MissingApiKey,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TMDB request failed: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode TMDB response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::Status { status: 404, .. })
    }
}
