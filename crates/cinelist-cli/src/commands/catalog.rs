use super::{catalog_client, load_config, open_store, render};
use crate::output::Output;
use cinelist_config::PathManager;
use cinelist_models::CatalogPage;
use cinelist_tmdb::CatalogSource;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use tracing::info;

pub async fn run_popular(page: u32, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    let client = catalog_client(&config)?;

    info!("Fetching popular movies from {} (page {})", client.source_name(), page);
    let results = client
        .fetch_popular(page)
        .await
        .map_err(|e| eyre!("Failed to fetch popular movies: {}", e))?;

    let store = open_store(&config, &path_manager);
    print_page(&results, |id| store.contains(id), output);
    Ok(())
}

pub async fn run_search(query: &str, page: u32, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    let client = catalog_client(&config)?;

    info!("Searching {} for '{}' (page {})", client.source_name(), query, page);
    let results = client
        .search(query, page)
        .await
        .map_err(|e| eyre!("Search failed: {}", e))?;

    if results.results.is_empty() {
        output.info(format!("No movies found for '{}'", query.trim()));
        if !output.is_human() {
            output.json(&json!({ "query": query, "page": results }));
        }
        return Ok(());
    }

    let store = open_store(&config, &path_manager);
    print_page(&results, |id| store.contains(id), output);
    Ok(())
}

pub async fn run_details(id: u64, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config = load_config(&path_manager)?;
    let client = catalog_client(&config)?;

    let details = match client.fetch_details(id).await {
        Ok(details) => details,
        Err(e) if e.is_not_found() => return Err(eyre!("Movie {} not found", id)),
        Err(e) => return Err(eyre!("Failed to fetch movie {}: {}", id, e)),
    };

    let store = open_store(&config, &path_manager);
    let listed = store.contains(details.id);
    let poster_url = client.image_url(details.poster_path.as_deref());

    output.block(render::details_view(&details, &poster_url, listed));
    output.json(&json!({
        "movie": details,
        "poster_url": poster_url,
        "backdrop_url": client.image_url(details.backdrop_path.as_deref()),
        "in_watchlist": listed,
    }));
    Ok(())
}

fn print_page<F>(page: &CatalogPage, listed: F, output: &Output)
where
    F: Fn(u64) -> bool,
{
    output.block(render::movie_table(&page.results, &listed).to_string());
    output.block(render::page_footer(page));

    let results: Vec<_> = page
        .results
        .iter()
        .map(|movie| {
            json!({
                "movie": movie,
                "in_watchlist": listed(movie.id),
            })
        })
        .collect();
    output.json(&json!({
        "page": page.page,
        "total_pages": page.total_pages,
        "total_results": page.total_results,
        "results": results,
    }));
}
