use cinelist_models::{CatalogPage, MovieDetails, MovieSummary, WatchlistEntry};
use cinelist_store::WatchlistStats;
use cinelist_tmdb::{format_currency, format_release_year, format_runtime};
use comfy_table::{Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn rating(vote_average: f64) -> String {
    format!("{:.1}", vote_average)
}

/// Catalog listing; `listed` marks movies already on the watchlist
pub fn movie_table<F>(movies: &[MovieSummary], listed: F) -> Table
where
    F: Fn(u64) -> bool,
{
    let mut table = new_table(&["ID", "Title", "Year", "Rating", "Votes", "Watchlist"]);
    for movie in movies {
        let marker = if listed(movie.id) {
            Cell::new("♥").fg(Color::Cyan)
        } else {
            Cell::new("")
        };
        table.add_row(vec![
            Cell::new(movie.id),
            Cell::new(&movie.title),
            Cell::new(format_release_year(&movie.release_date)),
            Cell::new(rating(movie.vote_average)),
            Cell::new(movie.vote_count),
            marker,
        ]);
    }
    table
}

pub fn watchlist_table(entries: &[WatchlistEntry]) -> Table {
    let mut table = new_table(&["ID", "Title", "Year", "Rating", "Added"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.id()),
            Cell::new(&entry.movie.title),
            Cell::new(format_release_year(&entry.movie.release_date)),
            Cell::new(rating(entry.movie.vote_average)),
            Cell::new(entry.added_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }
    table
}

pub fn stats_table(stats: &WatchlistStats) -> Table {
    let mut table = new_table(&["Total Movies", "Average Rating", "Last Added"]);
    table.add_row(vec![
        Cell::new(stats.total),
        Cell::new(
            stats
                .average_rating
                .map(rating)
                .unwrap_or_else(|| "-".to_string()),
        ),
        Cell::new(
            stats
                .last_added
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
    ]);
    table
}

pub fn page_footer(page: &CatalogPage) -> String {
    format!(
        "Page {} of {} ({} results)",
        page.page, page.total_pages, page.total_results
    )
}

/// Multi-line detail view
pub fn details_view(details: &MovieDetails, poster_url: &str, listed: bool) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "{} ({})",
        details.title.bright_cyan().bold(),
        format_release_year(&details.release_date)
    ));
    if let Some(tagline) = details.tagline.as_deref().filter(|t| !t.is_empty()) {
        lines.push(format!("\"{}\"", tagline).italic().to_string());
    }
    lines.push(String::new());

    let mut facts = new_table(&["Rating", "Runtime", "Budget", "Revenue"]);
    facts.add_row(vec![
        Cell::new(format!("{} ({} votes)", rating(details.vote_average), details.vote_count)),
        Cell::new(format_runtime(details.runtime)),
        Cell::new(format_currency(details.budget)),
        Cell::new(format_currency(details.revenue)),
    ]);
    lines.push(facts.to_string());

    let genres = details.genre_names();
    if !genres.is_empty() {
        lines.push(format!("Genres: {}", genres.join(", ")));
    }
    if !details.overview.is_empty() {
        lines.push(String::new());
        lines.push(details.overview.clone());
    }

    let cast = details.top_cast(8);
    if !cast.is_empty() {
        lines.push(String::new());
        lines.push("Cast".bold().to_string());
        for member in cast {
            if member.character.is_empty() {
                lines.push(format!("  {}", member.name));
            } else {
                lines.push(format!("  {} as {}", member.name, member.character));
            }
        }
    }

    lines.push(String::new());
    lines.push(format!("Poster: {}", poster_url));
    lines.push(if listed {
        format!("{} In your watchlist", "♥".cyan())
    } else {
        format!("Not in your watchlist (cinelist watchlist add {})", details.id)
    });

    lines.join("\n")
}
