use assetcache_cache::{
    CacheConfig, Clock, FetchOptions, ResourceCache, ResourceKind, ResponseSource, SystemClock,
};
use assetcache_core::ResultExt;
use assetcache_utils::{format_bytes, format_speed, write_atomic};
use eyre::{bail, eyre};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

pub async fn fetch(
    config: &CacheConfig,
    url: &str,
    output: Option<PathBuf>,
    options: FetchOptions,
) -> eyre::Result<()> {
    let cache = ResourceCache::open(config).await?;
    let started = Instant::now();
    let response = cache.intercept_fetch(url, &options).await?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    cache.flush().await;

    if !response.is_success() {
        bail!("{url} returned HTTP {}", response.status());
    }

    let body = response.bytes();
    if let Some(path) = output {
        write_atomic(&path, &body)
            .with_context(|| format!("writing response body to {}", path.display()))?;
    }

    let source = match response.source() {
        ResponseSource::Network => "network",
        ResponseSource::Cache => "cache",
        ResponseSource::StaleCache => "stale cache",
    };
    println!(
        "{url}: {} from {source} ({}, {})",
        format_bytes(body.len() as u64),
        ResourceKind::classify(url),
        format_speed(body.len() as u64, elapsed_ms)
    );
    Ok(())
}

pub async fn get(config: &CacheConfig, url: &str, output: Option<PathBuf>) -> eyre::Result<()> {
    let cache = ResourceCache::open(config).await?;
    let payload = match cache.get(url).await {
        Some(payload) => payload,
        None => return Err(eyre!("{url} is not cached")),
    };
    let bytes = payload
        .to_bytes()
        .with_context(|| format!("encoding cached payload for {url}"))?;

    match output {
        Some(path) => {
            write_atomic(&path, &bytes)
                .with_context(|| format!("writing cached payload to {}", path.display()))?;
            println!("{url}: wrote {} to {}", format_bytes(bytes.len() as u64), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

pub async fn delete(config: &CacheConfig, url: &str) -> eyre::Result<()> {
    let cache = ResourceCache::open(config).await?;
    if !cache.delete(url).await {
        bail!("failed to delete {url}");
    }
    println!("Deleted {url}");
    Ok(())
}

pub async fn purge(config: &CacheConfig) -> eyre::Result<()> {
    let cache = ResourceCache::open(config).await?;
    let purged = cache.purge_expired().await;
    println!("Purged {purged} expired entries");
    Ok(())
}

pub async fn clear(config: &CacheConfig, yes: bool) -> eyre::Result<()> {
    let cache = ResourceCache::open(config).await?;

    if !yes {
        let stats = cache.stats().await;
        if stats.count == 0 {
            println!("Cache is already empty");
            return Ok(());
        }
        let prompt = format!(
            "Remove {} cached resources ({})?",
            stats.count,
            stats.formatted_size()
        );
        if !confirm(&prompt)? {
            println!("Aborted");
            return Ok(());
        }
    }

    if !cache.clear().await {
        bail!("failed to clear the cache");
    }
    println!("Cache cleared");
    Ok(())
}

pub async fn stats(config: &CacheConfig, json: bool) -> eyre::Result<()> {
    let cache = ResourceCache::open(config).await?;
    let stats = cache.stats().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Cache Statistics:");
    println!("  Location:  {}", config.base_dir.display());
    println!("  Store:     {:?}", cache.store_type());
    println!("  Entries:   {}", stats.count);
    println!("  Size:      {}", stats.formatted_size());
    println!("  Retention: {}s", config.retention.as_secs());
    for kind in ResourceKind::ALL {
        if let Some(count) = stats.by_kind.get(&kind) {
            println!("  {:<10} {count}", format!("{kind}:"));
        }
    }
    Ok(())
}

pub async fn list(config: &CacheConfig) -> eyre::Result<()> {
    let cache = ResourceCache::open(config).await?;
    let entries = cache.entries().await;
    if entries.is_empty() {
        println!("No cached entries");
        return Ok(());
    }

    let now = SystemClock.now_millis();
    let retention = cache.retention_millis();
    for entry in entries {
        let stored = match chrono::DateTime::from_timestamp_millis(entry.stored_at as i64) {
            Some(at) => at.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => "-".to_string(),
        };
        let marker = if entry.is_expired(now, retention) { " (expired)" } else { "" };
        println!(
            "{:<7} {:>10}  {stored}  {}{marker}",
            entry.kind.as_str(),
            format_bytes(entry.byte_size),
            entry.key
        );
    }
    Ok(())
}

fn confirm(prompt: &str) -> eyre::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
