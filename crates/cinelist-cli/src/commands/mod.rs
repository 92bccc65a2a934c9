pub mod catalog;
pub mod config;
pub mod render;
pub mod watchlist;

use cinelist_config::{Config, PathManager};
use cinelist_store::{JsonFileStorage, WatchlistStore};
use cinelist_tmdb::TmdbClient;
use color_eyre::eyre::eyre;
use color_eyre::Result;

pub(crate) fn load_config(path_manager: &PathManager) -> Result<Config> {
    Config::load(path_manager).map_err(|e| eyre!("{}", e))
}

/// Open the watchlist persisted under the configured location
pub(crate) fn open_store(config: &Config, path_manager: &PathManager) -> WatchlistStore {
    let file = config.watchlist_file(path_manager);
    tracing::debug!("Opening watchlist at {}", file.display());
    WatchlistStore::initialize(JsonFileStorage::new(file))
}

pub(crate) fn catalog_client(config: &Config) -> Result<TmdbClient> {
    config
        .validate()
        .map_err(|e| eyre!("{}. Run 'cinelist config init' to create a config file.", e))?;
    TmdbClient::new(&config.tmdb).map_err(|e| eyre!("Failed to create TMDB client: {}", e))
}
