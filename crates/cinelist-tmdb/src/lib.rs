pub mod client;
pub mod error;
pub mod format;
pub mod traits;

pub use client::TmdbClient;
pub use error::CatalogError;
pub use format::{format_currency, format_release_year, format_runtime, image_url, PLACEHOLDER_IMAGE};
pub use traits::CatalogSource;
