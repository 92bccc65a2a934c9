use crate::output::Output;
use crate::ConfigCommands;
use cinelist_config::{Config, PathManager};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use dialoguer::Password;
use serde_json::json;
use tracing::info;

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    match cmd {
        ConfigCommands::Show { full } => show_config(&path_manager, full, output),
        ConfigCommands::Init { api_key, force } => init_config(&path_manager, api_key, force, output),
    }
}

fn show_config(path_manager: &PathManager, full: bool, output: &Output) -> Result<()> {
    let config_file = path_manager.config_file();
    let config = super::load_config(path_manager)?;

    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'cinelist config init' to create one. Showing defaults and environment overrides.");
    }

    let api_key = if full {
        config.tmdb.api_key.clone()
    } else {
        mask_string(&config.tmdb.api_key)
    };
    let watchlist_file = config.watchlist_file(path_manager);
    let log_file = path_manager.log_file();

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Setting").fg(Color::Cyan).add_attribute(Attribute::Bold),
        Cell::new("Value").fg(Color::Cyan).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![Cell::new("Config File"), Cell::new(config_file.display())]);
    table.add_row(vec![Cell::new("TMDB API Key"), Cell::new(&api_key)]);
    table.add_row(vec![Cell::new("TMDB Base URL"), Cell::new(&config.tmdb.base_url)]);
    table.add_row(vec![Cell::new("Image Base URL"), Cell::new(&config.tmdb.image_base_url)]);
    table.add_row(vec![
        Cell::new("Language"),
        Cell::new(config.tmdb.language.as_deref().unwrap_or("<default>")),
    ]);
    table.add_row(vec![Cell::new("Watchlist File"), Cell::new(watchlist_file.display())]);
    table.add_row(vec![Cell::new("Log File"), Cell::new(log_file.display())]);
    output.block(table.to_string());

    if !config.is_tmdb_configured() {
        output.warn("TMDB is not configured; catalog commands will fail until an API key is set");
    }

    output.json(&json!({
        "config_file": config_file,
        "tmdb": {
            "api_key": api_key,
            "base_url": config.tmdb.base_url,
            "image_base_url": config.tmdb.image_base_url,
            "language": config.tmdb.language,
        },
        "watchlist": {
            "file": watchlist_file,
        },
        "log_file": log_file,
        "configured": config.is_tmdb_configured(),
    }));
    Ok(())
}

fn init_config(
    path_manager: &PathManager,
    api_key: Option<String>,
    force: bool,
    output: &Output,
) -> Result<()> {
    let config_file = path_manager.config_file();
    if config_file.exists() && !force {
        return Err(eyre!(
            "Config file already exists at {}. Use --force to overwrite it.",
            config_file.display()
        ));
    }

    let api_key = match api_key {
        Some(key) => key,
        None => Password::new()
            .with_prompt("TMDB API key")
            .interact()
            .map_err(|e| eyre!("Failed to read API key: {}", e))?,
    };
    validate_api_key(&api_key).map_err(|e| eyre!("{}", e))?;

    let mut config = Config::default();
    config.tmdb.api_key = api_key.trim().to_string();

    path_manager
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create directories: {}", e))?;
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to write {}: {}", config_file.display(), e))?;

    info!("Wrote config to {}", config_file.display());
    output.success(format!("Configuration saved to {}", config_file.display()));
    output.json(&json!({ "config_file": config_file }));
    Ok(())
}

fn validate_api_key(input: &str) -> Result<(), &'static str> {
    let input = input.trim();
    if input.is_empty() {
        return Err("API key cannot be empty");
    }
    if input.chars().any(char::is_whitespace) {
        return Err("API key cannot contain whitespace");
    }
    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() || s == "YOUR_API_KEY" {
        return "<not set>".to_string();
    }
    let len = s.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }
    let head: String = s.chars().take(2).collect();
    let tail: String = s.chars().skip(len - 2).collect();
    format!("{}***{}", head, tail)
}
