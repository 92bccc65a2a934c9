use async_trait::async_trait;
use cinelist_models::{CatalogPage, MovieDetails};
use crate::error::CatalogError;

/// Remote catalog of browsable movies.
///
/// Plain request/response: implementations fetch and decode, nothing more.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Popular movies, one page at a time (pages start at 1)
    async fn fetch_popular(&self, page: u32) -> Result<CatalogPage, CatalogError>;

    /// Title search. A blank query yields an empty page without a request.
    async fn search(&self, query: &str, page: u32) -> Result<CatalogPage, CatalogError>;

    async fn fetch_details(&self, movie_id: u64) -> Result<MovieDetails, CatalogError>;
}
