use assetcache_cache::{CacheConfig, FetchOptions, FetchStrategy};
use clap::Subcommand;
use std::path::PathBuf;

pub mod cache;
pub mod preload;
pub mod state;

use self::state::StateCommands;

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a URL through the cache
    Fetch {
        url: String,

        /// Write the body to this file instead of printing a summary
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Serve an expired entry if the network fails
        #[arg(long)]
        stale_on_error: bool,
    },

    /// Read a cached entry without touching the network
    Get {
        url: String,

        /// Write the payload to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Remove one entry
    Delete { url: String },

    /// Remove every expired entry
    Purge,

    /// Remove every entry
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show entry count and size per kind
    Stats {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List cached entries
    #[command(visible_alias = "ls")]
    List,

    /// Warm the cache with a set of assets
    Preload {
        #[arg(required = true)]
        urls: Vec<String>,

        /// Serve expired entries for assets the network cannot provide
        #[arg(long)]
        stale_on_error: bool,
    },

    /// Inspect or reset the persisted warm state
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
}

impl Commands {
    pub async fn execute(self, config: CacheConfig) -> eyre::Result<()> {
        match self {
            Commands::Fetch {
                url,
                output,
                stale_on_error,
            } => cache::fetch(&config, &url, output, fetch_options(stale_on_error)).await,
            Commands::Get { url, output } => cache::get(&config, &url, output).await,
            Commands::Delete { url } => cache::delete(&config, &url).await,
            Commands::Purge => cache::purge(&config).await,
            Commands::Clear { yes } => cache::clear(&config, yes).await,
            Commands::Stats { json } => cache::stats(&config, json).await,
            Commands::List => cache::list(&config).await,
            Commands::Preload {
                urls,
                stale_on_error,
            } => preload::execute(&config, urls, fetch_options(stale_on_error)).await,
            Commands::State { command } => command.execute(&config).await,
        }
    }
}

fn fetch_options(stale_on_error: bool) -> FetchOptions {
    let strategy = if stale_on_error {
        FetchStrategy::CacheFirstStaleOnError
    } else {
        FetchStrategy::CacheFirst
    };
    FetchOptions::default().with_strategy(strategy)
}
