use clap::{ArgAction, Parser, Subcommand};
use commands::{catalog, config, watchlist};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "cinelist")]
#[command(about = "Cinelist - Browse movies and keep a watchlist")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Write logs to a daily-rotated file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List popular movies
    Popular {
        /// Page number (starts at 1)
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Search movies by title
    Search {
        /// Title to search for
        query: String,

        /// Page number (starts at 1)
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show details, cast and watchlist status for a movie
    Details {
        /// TMDB movie ID
        id: u64,
    },
    /// Manage the watchlist
    #[command(long_about = "Manage the local watchlist. Entries are stored in the data directory and survive across sessions. Use 'cinelist watchlist list' to see what is saved.")]
    Watchlist {
        #[command(subcommand)]
        cmd: WatchlistCommands,
    },
    /// Show or create configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub(crate) enum WatchlistCommands {
    /// List saved movies in the order they were added
    List {
        /// Most recently added first
        #[arg(long, action = ArgAction::SetTrue)]
        recent: bool,
    },
    /// Add movies by TMDB ID (already listed movies are skipped)
    Add {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Remove movies by TMDB ID
    Remove {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Remove every movie from the watchlist
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short, action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Count, average rating and last added date
    Stats,
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommands {
    /// Show current configuration (masks the API key)
    Show {
        /// Show the API key unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a config file with the given API key
    Init {
        /// TMDB API key (prompted for when omitted)
        #[arg(long)]
        api_key: Option<String>,

        /// Overwrite an existing config file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Popular { page } => catalog::run_popular(page, &output).await,
        Commands::Search { query, page } => catalog::run_search(&query, page, &output).await,
        Commands::Details { id } => catalog::run_details(id, &output).await,
        Commands::Watchlist { cmd } => watchlist::run_watchlist(cmd, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &output),
    }
}
