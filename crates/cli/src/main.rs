use assetcache_cache::{CacheConfigLoader, CacheConfigOverrides, StoreBackend};
use clap::Parser;
use std::path::PathBuf;

mod commands;

use commands::Commands;

#[derive(Parser)]
#[command(name = "assetcache")]
#[command(about = "Expiring cache for network-fetched assets", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the disk store
    #[arg(long, global = true, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Age in seconds after which entries expire
    #[arg(long, global = true, value_name = "SECS")]
    retention_secs: Option<u64>,

    /// Keep entries in memory for this invocation only
    #[arg(long, global = true)]
    memory: bool,

    /// Bypass the cache entirely
    #[arg(long, global = true)]
    no_cache: bool,

    /// Log filter, e.g. `debug` or `assetcache_cache=trace` (overrides RUST_LOG)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn config_overrides(&self) -> CacheConfigOverrides {
        CacheConfigOverrides {
            enabled: self.no_cache.then_some(false),
            base_dir: self.cache_dir.clone(),
            retention_secs: self.retention_secs,
            store: self.memory.then_some(StoreBackend::Memory),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    if let Err(e) = assetcache_utils::tracing::init(cli.log_level.as_deref(), "info") {
        eprintln!("assetcache: failed to initialize logging: {e}");
    }

    let config = CacheConfigLoader::load()?;
    let config = CacheConfigLoader::apply_cli_args(config, cli.config_overrides())?;
    tracing::debug!(source = ?config.source, base_dir = %config.base_dir.display(), "configuration loaded");

    cli.command.execute(config).await
}
