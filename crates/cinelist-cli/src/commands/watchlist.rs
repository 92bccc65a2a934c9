use super::{catalog_client, load_config, open_store, render};
use crate::output::Output;
use crate::WatchlistCommands;
use cinelist_config::PathManager;
use cinelist_store::{WatchlistSnapshot, WatchlistStore};
use cinelist_tmdb::CatalogSource;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::Confirm;
use futures::future::join_all;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

pub async fn run_watchlist(cmd: WatchlistCommands, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    let store = open_store(&config, &path_manager);
    debug!("{:?}", store);

    match cmd {
        WatchlistCommands::List { recent } => list(&store, recent, output),
        WatchlistCommands::Stats => stats(&store, output),
        WatchlistCommands::Add { ids } => {
            let client = catalog_client(&config)?;
            add(&store, &client, &ids, output).await
        }
        WatchlistCommands::Remove { ids } => remove(&store, &ids, output),
        WatchlistCommands::Clear { yes } => clear(&store, yes, output),
    }
}

fn list(store: &WatchlistStore, recent: bool, output: &Output) -> Result<()> {
    let entries = if recent {
        store.recently_added()
    } else {
        store.list()
    };

    if entries.is_empty() {
        output.info("Your watchlist is empty. Add movies with 'cinelist watchlist add <id>'.");
    } else {
        output.block(render::watchlist_table(&entries).to_string());
        output.block(format!("{} movies", entries.len()));
    }
    output.json(&json!({ "entries": entries }));
    Ok(())
}

fn stats(store: &WatchlistStore, output: &Output) -> Result<()> {
    let stats = store.stats();
    output.block(render::stats_table(&stats).to_string());
    output.json(&json!({ "stats": stats }));
    Ok(())
}

/// Tracks the live entry count while mutations run
struct CountBadge {
    count: Arc<AtomicUsize>,
}

impl CountBadge {
    fn attach(store: &WatchlistStore) -> (Self, cinelist_store::Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let badge_count = Arc::clone(&count);
        let subscription = store.subscribe(move |snapshot: &WatchlistSnapshot| {
            debug!("Watchlist v{}: {} entries", snapshot.version(), snapshot.len());
            badge_count.store(snapshot.len(), Ordering::SeqCst);
        });
        (Self { count }, subscription)
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

async fn add<C: CatalogSource>(
    store: &WatchlistStore,
    client: &C,
    ids: &[u64],
    output: &Output,
) -> Result<()> {
    if ids.is_empty() {
        return Err(eyre!("No movie ids given"));
    }

    let (badge, _subscription) = CountBadge::attach(store);

    let pending: Vec<u64> = ids
        .iter()
        .copied()
        .filter(|id| {
            if store.contains(*id) {
                output.info(format!("Movie {} is already in your watchlist", id));
                false
            } else {
                true
            }
        })
        .collect();

    let fetched = join_all(pending.iter().map(|id| client.fetch_details(*id))).await;

    let mut added = Vec::new();
    let mut failed = Vec::new();
    for (id, result) in pending.iter().zip(fetched) {
        match result {
            Ok(details) => {
                let title = details.title.clone();
                if store.add(details.to_summary()).is_applied() {
                    output.success(format!("Added {} ({})", title, id));
                    added.push(*id);
                } else {
                    output.info(format!("{} is already in your watchlist", title));
                }
            }
            Err(e) => {
                warn!("Failed to fetch movie {} from {}: {}", id, client.source_name(), e);
                output.error(format!("Could not add movie {}: {}", id, e));
                failed.push(*id);
            }
        }
    }

    report(store, badge.get(), output);
    output.json(&json!({
        "added": added,
        "failed": failed,
        "total": badge.get(),
    }));

    if !failed.is_empty() && added.is_empty() {
        return Err(eyre!("No movies were added"));
    }
    Ok(())
}

fn remove(store: &WatchlistStore, ids: &[u64], output: &Output) -> Result<()> {
    if ids.is_empty() {
        return Err(eyre!("No movie ids given"));
    }

    let (badge, _subscription) = CountBadge::attach(store);

    let mut removed = Vec::new();
    for id in ids {
        let title = store.get(*id).map(|e| e.movie.title);
        if store.remove(*id).is_applied() {
            output.success(format!(
                "Removed {} ({})",
                title.unwrap_or_else(|| "movie".to_string()),
                id
            ));
            removed.push(*id);
        } else {
            output.info(format!("Movie {} is not in your watchlist", id));
        }
    }

    report(store, badge.get(), output);
    output.json(&json!({
        "removed": removed,
        "total": badge.get(),
    }));
    Ok(())
}

fn clear(store: &WatchlistStore, yes: bool, output: &Output) -> Result<()> {
    if store.is_empty() {
        output.info("Your watchlist is already empty");
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove all {} movies from your watchlist?", store.len()))
            .default(false)
            .interact()
            .map_err(|e| eyre!("Failed to read confirmation: {}", e))?;
        if !confirmed {
            output.info("Cancelled");
            return Ok(());
        }
    }

    let count = store.len();
    store.clear();
    output.success(format!("Removed {} movies from your watchlist", count));
    report(store, store.len(), output);
    output.json(&json!({ "cleared": count }));
    Ok(())
}

fn report(store: &WatchlistStore, count: usize, output: &Output) {
    output.block(format!("Watchlist now has {} movies", count));
    if store.has_unsaved_changes() {
        output.warn(format!(
            "Changes could not be saved to {}; they will be lost when cinelist exits",
            store.storage_location()
        ));
    }
}
