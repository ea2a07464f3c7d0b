use assetcache_cache::{CacheConfig, SystemClock, WarmState};
use clap::Subcommand;
use std::sync::Arc;

#[derive(Subcommand)]
pub enum StateCommands {
    /// Print the warm state and whether it is still fresh
    Show {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget the warm state
    Reset,
}

impl StateCommands {
    pub async fn execute(self, config: &CacheConfig) -> eyre::Result<()> {
        let state = WarmState::load(&config.state_file, Arc::new(SystemClock), config.ready_window).await;

        match self {
            StateCommands::Show { json } => {
                let snapshot = state.snapshot();
                if json {
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                    return Ok(());
                }

                println!("Warm state ({}):", state.path().display());
                println!("  Ready:           {}", state.is_cache_ready());
                println!("  Initialized:     {}", snapshot.is_initialized);
                println!("  Model loaded:    {}", snapshot.is_model_loaded);
                println!("  Resources ready: {}", snapshot.resources_ready);
                match state.cache_age() {
                    Some(minutes) => println!("  Age:             {minutes} min"),
                    None => println!("  Age:             never loaded"),
                }
                println!(
                    "  Hits/misses:     {}/{}",
                    snapshot.cache_stats.hits, snapshot.cache_stats.misses
                );
                println!(
                    "  Cached size:     {}",
                    assetcache_utils::format_bytes(snapshot.cache_stats.total_size)
                );
                Ok(())
            }
            StateCommands::Reset => {
                state.reset().await;
                tracing::info!(path = %state.path().display(), "warm state reset");
                println!("Warm state reset");
                Ok(())
            }
        }
    }
}
