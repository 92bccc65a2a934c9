pub mod config;
pub mod paths;

pub use config::{Config, TmdbConfig, WatchlistConfig, DEFAULT_TMDB_BASE_URL, DEFAULT_TMDB_IMAGE_BASE_URL};
pub use paths::{PathManager, home_override};
