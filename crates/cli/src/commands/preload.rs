use assetcache_cache::{
    AssetPreloader, CacheConfig, CacheEvent, FetchOptions, ResourceCache, ResponseSource,
    SystemClock, WarmState,
};
use assetcache_utils::{format_bytes, format_speed};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

pub async fn execute(
    config: &CacheConfig,
    urls: Vec<String>,
    options: FetchOptions,
) -> eyre::Result<()> {
    let cache = ResourceCache::open(config).await?;
    let state = WarmState::load(&config.state_file, Arc::new(SystemClock), config.ready_window).await;

    // Ends once the last cache handle is dropped
    let mut events = cache.subscribe();
    let progress = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => eprintln!("  ({skipped} progress events skipped)"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let preloader = AssetPreloader::new(cache, urls)
        .with_warm_state(Arc::new(state))
        .with_options(options);
    let result = preloader.start().await;
    drop(preloader);
    let _ = progress.await;
    let report = result?;

    for asset in &report.assets {
        let source = match asset.source {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::StaleCache => "stale",
        };
        println!(
            "  {:>10}  {:<7}  {:>12}  {}",
            format_bytes(asset.bytes),
            source,
            format_speed(asset.bytes, asset.elapsed.as_millis() as u64),
            asset.url
        );
    }
    println!(
        "Preloaded {} assets ({}), {} from cache, {} expired entries purged",
        report.assets.len(),
        format_bytes(report.total_bytes()),
        report.served_from_cache(),
        report.purged
    );
    if report.served_stale() > 0 {
        println!("{} assets were served from expired entries", report.served_stale());
    }
    Ok(())
}

fn print_event(event: &CacheEvent) {
    match event {
        CacheEvent::Hit { url, bytes } => eprintln!("  hit       {url} ({})", format_bytes(*bytes)),
        CacheEvent::DownloadStarted { url } => eprintln!("  download  {url}"),
        CacheEvent::Stored { url, bytes } => {
            eprintln!("  stored    {url} ({})", format_bytes(*bytes))
        }
        CacheEvent::DownloadFailed { url, error } => eprintln!("  failed    {url}: {error}"),
        CacheEvent::StaleServed { url, bytes } => {
            eprintln!("  stale     {url} ({})", format_bytes(*bytes))
        }
    }
}
