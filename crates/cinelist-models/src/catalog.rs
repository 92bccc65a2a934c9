use serde::{Deserialize, Serialize};
use crate::movie::MovieSummary;

/// One page of a paginated catalog listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogPage {
    pub page: u32,
    pub results: Vec<MovieSummary>,
    pub total_pages: u32,
    pub total_results: u64,
}

impl CatalogPage {
    /// Page returned for a blank search query
    pub fn empty() -> Self {
        Self {
            page: 1,
            results: Vec::new(),
            total_pages: 0,
            total_results: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}
