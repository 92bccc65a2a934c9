use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use crate::paths::PathManager;

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub watchlist: WatchlistConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchlistConfig {
    /// Overrides the default `<data_dir>/watchlist.json`
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_TMDB_BASE_URL.to_string()
}

fn default_image_base_url() -> String {
    DEFAULT_TMDB_IMAGE_BASE_URL.to_string()
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            image_base_url: default_image_base_url(),
            language: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load the config file if present (defaults otherwise), then apply environment overrides
    pub fn load(path_manager: &PathManager) -> anyhow::Result<Self> {
        Self::load_with(path_manager, |key| std::env::var(key).ok())
    }

    /// Like [`load`](Self::load), with overrides read from `lookup` instead of the environment
    pub fn load_with<F>(path_manager: &PathManager, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path_manager.config_file();
        let mut config = if path.exists() {
            Self::load_from_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to parse config at {}: {}", path.display(), e))?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_overrides_from(lookup);
        Ok(config)
    }

    /// Apply `TMDB_*` overrides from an arbitrary lookup (non-empty values only)
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(api_key) = get("TMDB_API_KEY") {
            self.tmdb.api_key = api_key;
        }
        if let Some(base_url) = get("TMDB_BASE_URL") {
            self.tmdb.base_url = base_url;
        }
        if let Some(image_base_url) = get("TMDB_IMAGE_BASE_URL") {
            self.tmdb.image_base_url = image_base_url;
        }
    }

    /// Catalog commands need an API key and a usable base URL
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tmdb.api_key.trim().is_empty() || self.tmdb.api_key == "YOUR_API_KEY" {
            return Err(anyhow::anyhow!(
                "TMDB api_key is not configured (set [tmdb].api_key or TMDB_API_KEY)"
            ));
        }
        if !self.tmdb.base_url.starts_with("http://") && !self.tmdb.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!("Invalid TMDB base_url: {}", self.tmdb.base_url));
        }
        Ok(())
    }

    pub fn is_tmdb_configured(&self) -> bool {
        self.validate().is_ok()
    }

    /// Resolve where the watchlist is persisted
    pub fn watchlist_file(&self, path_manager: &PathManager) -> PathBuf {
        self.watchlist
            .file
            .clone()
            .unwrap_or_else(|| path_manager.watchlist_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.tmdb.api_key = "test_key".to_string();
        config.tmdb.language = Some("en-US".to_string());
        config.watchlist.file = Some(PathBuf::from("/tmp/wl.json"));

        config.save_to_file(file.path()).unwrap();

        let loaded = Config::load_from_file(file.path()).unwrap();
        assert_eq!(loaded.tmdb.api_key, "test_key");
        assert_eq!(loaded.tmdb.base_url, DEFAULT_TMDB_BASE_URL);
        assert_eq!(loaded.tmdb.language.as_deref(), Some("en-US"));
        assert_eq!(loaded.watchlist.file, Some(PathBuf::from("/tmp/wl.json")));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[tmdb]\napi_key = \"abc\"\n").unwrap();
        assert_eq!(config.tmdb.api_key, "abc");
        assert_eq!(config.tmdb.image_base_url, DEFAULT_TMDB_IMAGE_BASE_URL);
        assert!(config.watchlist.file.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = PathManager::from_base(dir.path());
        let config = Config::load_with(&paths, |_| None).unwrap();

        assert!(config.tmdb.api_key.is_empty());
        assert_eq!(config.tmdb.base_url, DEFAULT_TMDB_BASE_URL);
        assert_eq!(config.tmdb.image_base_url, DEFAULT_TMDB_IMAGE_BASE_URL);
        assert_eq!(config.watchlist_file(&paths), paths.watchlist_file());
        assert!(!config.is_tmdb_configured());
    }

    #[test]
    fn test_load_applies_overrides_over_file() {
        let dir = TempDir::new().unwrap();
        let paths = PathManager::from_base(dir.path());
        std::fs::write(paths.config_file(), "[tmdb]\napi_key = \"from_file\"\nlanguage = \"de-DE\"\n").unwrap();

        let config = Config::load_with(&paths, |key| {
            (key == "TMDB_API_KEY").then(|| "from_env".to_string())
        })
        .unwrap();

        assert_eq!(config.tmdb.api_key, "from_env");
        assert_eq!(config.tmdb.language.as_deref(), Some("de-DE"));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("TMDB_API_KEY", "from_env"),
            ("TMDB_BASE_URL", "http://localhost:8080"),
            ("TMDB_IMAGE_BASE_URL", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.tmdb.api_key, "from_env");
        assert_eq!(config.tmdb.base_url, "http://localhost:8080");
        assert_eq!(config.tmdb.image_base_url, DEFAULT_TMDB_IMAGE_BASE_URL);
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_err());
        assert!(!config.is_tmdb_configured());

        config.tmdb.api_key = "YOUR_API_KEY".to_string();
        assert!(config.validate().is_err());

        config.tmdb.api_key = "real_key".to_string();
        assert!(config.validate().is_ok());

        config.tmdb.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }
}
