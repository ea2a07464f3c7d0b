//! File-system store shared by every process that points at the same directory
//!
//! Each entry is two files: the payload under `objects/` and a JSON sidecar
//! under `metadata/`. Every write mints a new object name, writes the payload,
//! then commits the sidecar naming it through temp-file + rename. The sidecar
//! is the commit point: until it lands, readers keep seeing the previous
//! entry, and the previous object is only deleted afterwards. The sidecars are
//! the index: there is no in-memory copy that could go stale when another
//! process writes to the directory.
//!
//! Removal renames the sidecar to a private tombstone before looking at it,
//! so the entry that gets deleted is exactly the one that was inspected.
//! Objects no sidecar references (left by crashes or lost races) are swept
//! during expiry scans once they are older than the orphan grace period.

use super::paths::{
    content_hash, metadata_path, new_object_name, object_dir, object_path, tombstone_path,
    GENERATION_FILE, METADATA_DIR, METADATA_EXT, OBJECTS_DIR,
};
use super::ResourceStore;
use crate::entry::{CacheEntry, EntryMetadata, Payload};
use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp, StoreType};
use assetcache_utils::write_atomic_async;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;

/// Bumped whenever the sidecar or object layout changes. Opening a directory
/// written by another generation deletes its contents.
pub const FORMAT_VERSION: u32 = 2;

/// How old an unreferenced file must be before a sweep deletes it
pub const DEFAULT_ORPHAN_GRACE: Duration = Duration::from_secs(60 * 60);

/// A reader racing a rewrite may find its object already replaced
const READ_ATTEMPTS: usize = 3;

#[derive(Debug, Serialize, Deserialize)]
struct DiskMetadata {
    format_version: u32,
    /// File name of the payload under the key's object shard
    #[serde(default)]
    object: String,
    #[serde(flatten)]
    entry: EntryMetadata,
}

/// Payload written under a fresh name whose sidecar has not been committed
#[derive(Debug)]
struct StagedWrite {
    key: String,
    object: String,
    object_path: PathBuf,
    sidecar: Vec<u8>,
}

#[derive(Debug, Default)]
struct SidecarScan {
    sidecars: Vec<DiskMetadata>,
    damaged: Vec<PathBuf>,
    /// False when some shard or sidecar could not be read
    complete: bool,
}

/// Sharded on-disk store with integrity verification
#[derive(Debug, Clone)]
pub struct DiskStore {
    base_dir: PathBuf,
    orphan_grace: Duration,
}

impl DiskStore {
    /// Open (creating if needed) a store rooted at `base_dir`
    ///
    /// A directory left behind by another format generation is emptied.
    pub async fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();

        for dir in [base_dir.join(OBJECTS_DIR), base_dir.join(METADATA_DIR)] {
            match fs::create_dir_all(&dir).await {
                Ok(()) => {}
                Err(e) => {
                    return Err(CacheError::Io {
                        path: dir.clone(),
                        operation: "create cache directory",
                        source: e,
                        recovery_hint: RecoveryHint::CheckPermissions { path: dir },
                    });
                }
            }
        }

        let store = Self {
            base_dir,
            orphan_grace: DEFAULT_ORPHAN_GRACE,
        };
        store.retire_old_generation().await?;

        tracing::debug!(base_dir = %store.base_dir.display(), "Opened disk store");
        Ok(store)
    }

    pub fn with_orphan_grace(mut self, grace: Duration) -> Self {
        self.orphan_grace = grace;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    async fn retire_old_generation(&self) -> Result<()> {
        let marker = self.base_dir.join(GENERATION_FILE);
        let current = FORMAT_VERSION.to_string();

        let stale = match fs::read_to_string(&marker).await {
            Ok(found) if found.trim() == current => return Ok(()),
            Ok(found) => {
                tracing::info!(
                    found = found.trim(),
                    current = FORMAT_VERSION,
                    "Deleting old cache generation"
                );
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let populated = self.is_populated().await;
                if populated {
                    tracing::info!(current = FORMAT_VERSION, "Deleting unversioned cache contents");
                }
                populated
            }
            Err(e) => {
                return Err(CacheError::Io {
                    path: marker,
                    operation: "read cache generation marker",
                    source: e,
                    recovery_hint: RecoveryHint::CheckPermissions {
                        path: self.base_dir.clone(),
                    },
                });
            }
        };

        if stale {
            Self::recreate_dir(self.base_dir.join(METADATA_DIR), "clear metadata directory").await?;
            Self::recreate_dir(self.base_dir.join(OBJECTS_DIR), "clear cache directory").await?;
        }
        Self::write_file(&marker, current.as_bytes(), "write cache generation marker").await
    }

    async fn is_populated(&self) -> bool {
        for dir in [METADATA_DIR, OBJECTS_DIR] {
            if let Ok(mut entries) = fs::read_dir(self.base_dir.join(dir)).await {
                if let Ok(Some(_)) = entries.next_entry().await {
                    return true;
                }
            }
        }
        false
    }

    async fn write_file(path: &Path, data: &[u8], operation: &'static str) -> Result<()> {
        match write_atomic_async(path, data).await {
            Ok(()) => Ok(()),
            Err(assetcache_core::Error::FileSystem { path, source, .. }) => Err(CacheError::Io {
                path,
                operation,
                source,
                recovery_hint: RecoveryHint::CheckDiskSpace,
            }),
            Err(e) => Err(CacheError::StoreUnavailable {
                store_type: StoreType::FileSystem,
                reason: e.to_string(),
                recovery_hint: RecoveryHint::CheckDiskSpace,
            }),
        }
    }

    async fn remove_file(path: &Path, operation: &'static str) -> Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io {
                path: path.to_path_buf(),
                operation,
                source: e,
                recovery_hint: RecoveryHint::Retry {
                    after: Duration::from_millis(100),
                },
            }),
        }
    }

    fn decode_sidecar(key: &str, raw: &[u8]) -> Result<DiskMetadata> {
        let decoded: DiskMetadata = match serde_json::from_slice(raw) {
            Ok(m) => m,
            Err(e) => {
                return Err(CacheError::Serialization {
                    key: key.to_string(),
                    operation: SerializationOp::Decode,
                    source: Box::new(e),
                    recovery_hint: RecoveryHint::ClearAndRetry,
                });
            }
        };

        if decoded.format_version != FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                key: key.to_string(),
                expected_version: FORMAT_VERSION,
                actual_version: decoded.format_version,
                recovery_hint: RecoveryHint::ClearAndRetry,
            });
        }

        Ok(decoded)
    }

    async fn read_sidecar_file(path: &Path, key: &str) -> Result<Option<DiskMetadata>> {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    operation: "read metadata file",
                    source: e,
                    recovery_hint: RecoveryHint::Retry {
                        after: Duration::from_millis(100),
                    },
                });
            }
        };

        Self::decode_sidecar(key, &raw).map(Some)
    }

    /// Current sidecar of `key`
    async fn load_sidecar(&self, key: &str) -> Result<Option<DiskMetadata>> {
        let path = metadata_path(&self.base_dir, key);
        match Self::read_sidecar_file(&path, key).await {
            Ok(Some(sidecar)) if sidecar.entry.key != key => Err(CacheError::Corruption {
                key: key.to_string(),
                reason: format!("Sidecar belongs to '{}'", sidecar.entry.key),
                recovery_hint: RecoveryHint::ClearAndRetry,
            }),
            other => other,
        }
    }

    fn resolve_object(&self, key: &str, object: &str) -> Result<PathBuf> {
        match object_path(&self.base_dir, key, object) {
            Some(path) => Ok(path),
            None => Err(CacheError::Corruption {
                key: key.to_string(),
                reason: format!("Sidecar names an invalid object '{object}'"),
                recovery_hint: RecoveryHint::ClearAndRetry,
            }),
        }
    }

    /// Whether `key`'s sidecar no longer names `object`
    async fn sidecar_moved(&self, key: &str, object: &str) -> bool {
        !matches!(self.load_sidecar(key).await, Ok(Some(ref s)) if s.object == object)
    }

    fn verify(key: &str, metadata: EntryMetadata, data: Vec<u8>) -> Result<CacheEntry> {
        if data.len() as u64 != metadata.byte_size {
            return Err(CacheError::Corruption {
                key: key.to_string(),
                reason: format!(
                    "Size mismatch: metadata says {} bytes, found {}",
                    metadata.byte_size,
                    data.len()
                ),
                recovery_hint: RecoveryHint::ClearAndRetry,
            });
        }

        if content_hash(&data) != metadata.content_hash {
            return Err(CacheError::Corruption {
                key: key.to_string(),
                reason: "Content hash mismatch".to_string(),
                recovery_hint: RecoveryHint::ClearAndRetry,
            });
        }

        let payload = match Payload::from_bytes(key, metadata.encoding, Bytes::from(data)) {
            Ok(p) => p,
            Err(e) => return Err(e),
        };

        Ok(CacheEntry { metadata, payload })
    }

    /// Write the payload under a fresh object name
    async fn stage(&self, entry: CacheEntry) -> Result<StagedWrite> {
        let CacheEntry {
            mut metadata,
            payload,
        } = entry;

        let data = match payload.to_bytes() {
            Ok(d) => d,
            Err(e) => return Err(e),
        };
        metadata.content_hash = content_hash(&data);

        let key = metadata.key.clone();
        let object = new_object_name(&key);
        let sidecar = DiskMetadata {
            format_version: FORMAT_VERSION,
            object: object.clone(),
            entry: metadata,
        };
        let sidecar = match serde_json::to_vec_pretty(&sidecar) {
            Ok(b) => b,
            Err(e) => {
                return Err(CacheError::Serialization {
                    key,
                    operation: SerializationOp::Encode,
                    source: Box::new(e),
                    recovery_hint: RecoveryHint::Ignore,
                });
            }
        };

        let object_path = object_dir(&self.base_dir, &key).join(&object);
        Self::write_file(&object_path, &data, "write cache data file").await?;

        Ok(StagedWrite {
            key,
            object,
            object_path,
            sidecar,
        })
    }

    /// Publish a staged write, then drop the object it replaced
    async fn commit(&self, staged: StagedWrite) -> Result<()> {
        let previous = match self.load_sidecar(&staged.key).await {
            Ok(Some(sidecar)) => Some(sidecar.object),
            _ => None,
        };

        let sidecar_path = metadata_path(&self.base_dir, &staged.key);
        if let Err(e) = Self::write_file(&sidecar_path, &staged.sidecar, "write metadata file").await
        {
            self.abort(staged).await;
            return Err(e);
        }

        if let Some(previous) = previous.filter(|p| *p != staged.object) {
            self.remove_object(&staged.key, &previous).await;
        }
        Ok(())
    }

    /// Discard a staged write; the committed entry is untouched
    async fn abort(&self, staged: StagedWrite) {
        if let Err(e) = fs::remove_file(&staged.object_path).await {
            tracing::debug!(
                path = %staged.object_path.display(),
                error = %e,
                "Leaving staged object for the orphan sweep"
            );
        }
    }

    async fn remove_object(&self, key: &str, object: &str) {
        let Some(path) = object_path(&self.base_dir, key, object) else {
            return;
        };
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::debug!(
                path = %path.display(),
                error = %e,
                "Leaving object for the orphan sweep"
            ),
        }
    }

    /// Move `key`'s sidecar out of the way; readers see a miss from here on
    async fn take_sidecar(&self, key: &str) -> Result<Option<PathBuf>> {
        let sidecar = metadata_path(&self.base_dir, key);
        let tomb = tombstone_path(&sidecar);
        match fs::rename(&sidecar, &tomb).await {
            Ok(()) => Ok(Some(tomb)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io {
                path: sidecar,
                operation: "take metadata file",
                source: e,
                recovery_hint: RecoveryHint::Retry {
                    after: Duration::from_millis(100),
                },
            }),
        }
    }

    /// Put a taken sidecar back unless a newer write has landed meanwhile
    async fn restore_sidecar(&self, key: &str, tomb: &Path, object: &str) {
        let sidecar = metadata_path(&self.base_dir, key);
        match fs::hard_link(tomb, &sidecar).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                self.remove_object(key, object).await;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Hard link unavailable, restoring sidecar by rename");
                if fs::rename(tomb, &sidecar).await.is_ok() {
                    return;
                }
            }
        }
        let _ = fs::remove_file(tomb).await;
    }

    /// Second half of a conditional removal, after the cheap metadata check
    async fn remove_taken_if_stored_before(&self, key: &str, cutoff: u64) -> Result<bool> {
        let tomb = match self.take_sidecar(key).await? {
            Some(tomb) => tomb,
            None => return Ok(false),
        };

        let taken = match Self::read_sidecar_file(&tomb, key).await {
            Ok(Some(sidecar)) => sidecar,
            // Its object is left to the orphan sweep
            _ => {
                Self::remove_file(&tomb, "remove metadata file").await?;
                return Ok(true);
            }
        };

        if taken.entry.stored_at > cutoff {
            tracing::debug!(url = %key, "Entry was refreshed during removal, keeping it");
            self.restore_sidecar(key, &tomb, &taken.object).await;
            return Ok(false);
        }

        self.remove_object(key, &taken.object).await;
        Self::remove_file(&tomb, "remove metadata file").await?;
        Ok(true)
    }

    async fn scan_sidecars(&self) -> Result<SidecarScan> {
        let metadata_dir = self.base_dir.join(METADATA_DIR);
        let mut shards = match fs::read_dir(&metadata_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SidecarScan::default()),
            Err(e) => {
                return Err(CacheError::Io {
                    path: metadata_dir,
                    operation: "scan metadata directory",
                    source: e,
                    recovery_hint: RecoveryHint::CheckPermissions {
                        path: self.base_dir.clone(),
                    },
                });
            }
        };

        let mut scan = SidecarScan {
            complete: true,
            ..SidecarScan::default()
        };
        loop {
            let shard = match shards.next_entry().await {
                Ok(Some(shard)) => shard,
                Ok(None) => break,
                Err(_) => {
                    scan.complete = false;
                    break;
                }
            };
            let mut entries = match fs::read_dir(shard.path()).await {
                Ok(dir) => dir,
                Err(_) => {
                    scan.complete = false;
                    continue;
                }
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.extension().and_then(|s| s.to_str()) != Some(METADATA_EXT) {
                    continue;
                }
                let raw = match fs::read(&path).await {
                    Ok(raw) => raw,
                    Err(_) => {
                        scan.complete = false;
                        continue;
                    }
                };
                match Self::decode_sidecar(&path.display().to_string(), &raw) {
                    Ok(sidecar) => scan.sidecars.push(sidecar),
                    Err(e) => {
                        tracing::debug!("Unreadable sidecar {}: {}", path.display(), e);
                        scan.damaged.push(path);
                    }
                }
            }
        }
        Ok(scan)
    }

    /// Delete old files that no sidecar references
    async fn sweep_orphans(&self, live: &[DiskMetadata]) -> usize {
        let Some(cutoff) = SystemTime::now().checked_sub(self.orphan_grace) else {
            return 0;
        };
        let live: HashSet<&str> = live.iter().map(|s| s.object.as_str()).collect();

        let mut removed = 0;
        for dir in [OBJECTS_DIR, METADATA_DIR] {
            let Ok(mut shards) = fs::read_dir(self.base_dir.join(dir)).await else {
                continue;
            };
            while let Ok(Some(shard)) = shards.next_entry().await {
                let Ok(mut entries) = fs::read_dir(shard.path()).await else {
                    continue;
                };
                while let Ok(Some(entry)) = entries.next_entry().await {
                    let path = entry.path();
                    let name = entry.file_name();
                    let name = name.to_string_lossy();
                    let referenced = if dir == OBJECTS_DIR {
                        live.contains(name.as_ref())
                    } else {
                        // Tombstones and abandoned temp files
                        path.extension().and_then(|s| s.to_str()) == Some(METADATA_EXT)
                    };
                    if referenced {
                        continue;
                    }
                    let old_enough = match entry.metadata().await.and_then(|m| m.modified()) {
                        Ok(modified) => modified <= cutoff,
                        Err(_) => false,
                    };
                    if old_enough && fs::remove_file(&path).await.is_ok() {
                        removed += 1;
                    }
                }
            }
        }

        if removed > 0 {
            tracing::debug!(removed, "Swept orphaned cache files");
        }
        removed
    }

    async fn recreate_dir(dir: PathBuf, operation: &'static str) -> Result<()> {
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CacheError::Io {
                    path: dir.clone(),
                    operation,
                    source: e,
                    recovery_hint: RecoveryHint::CheckPermissions { path: dir },
                });
            }
        }

        match fs::create_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) => Err(CacheError::Io {
                path: dir.clone(),
                operation: "recreate cache directory",
                source: e,
                recovery_hint: RecoveryHint::CheckPermissions { path: dir },
            }),
        }
    }
}

#[async_trait]
impl ResourceStore for DiskStore {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
        let mut attempts = 0;
        loop {
            let sidecar = match self.load_sidecar(key).await {
                Ok(Some(sidecar)) => sidecar,
                Ok(None) => return Ok(None),
                Err(e) => return Err(e),
            };

            let data_path = self.resolve_object(key, &sidecar.object)?;
            match fs::read(&data_path).await {
                Ok(data) => return Self::verify(key, sidecar.entry, data).map(Some),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    attempts += 1;
                    if attempts < READ_ATTEMPTS && self.sidecar_moved(key, &sidecar.object).await {
                        continue;
                    }
                    return Err(CacheError::Corruption {
                        key: key.to_string(),
                        reason: "Metadata exists but data is missing".to_string(),
                        recovery_hint: RecoveryHint::ClearAndRetry,
                    });
                }
                Err(e) => {
                    return Err(CacheError::Io {
                        path: data_path,
                        operation: "read cache data file",
                        source: e,
                        recovery_hint: RecoveryHint::Retry {
                            after: Duration::from_millis(100),
                        },
                    });
                }
            }
        }
    }

    async fn read_metadata(&self, key: &str) -> Result<Option<EntryMetadata>> {
        self.load_sidecar(key)
            .await
            .map(|sidecar| sidecar.map(|s| s.entry))
    }

    async fn write(&self, entry: CacheEntry) -> Result<()> {
        let staged = self.stage(entry).await?;
        self.commit(staged).await
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let tomb = match self.take_sidecar(key).await? {
            Some(tomb) => tomb,
            None => return Ok(false),
        };
        if let Ok(Some(sidecar)) = Self::read_sidecar_file(&tomb, key).await {
            self.remove_object(key, &sidecar.object).await;
        }
        Self::remove_file(&tomb, "remove metadata file").await?;
        Ok(true)
    }

    async fn remove_if_stored_before(&self, key: &str, cutoff: u64) -> Result<bool> {
        match self.read_metadata(key).await {
            Ok(Some(metadata)) if metadata.stored_at <= cutoff => {
                self.remove_taken_if_stored_before(key, cutoff).await
            }
            Ok(_) => Ok(false),
            // Unreadable sidecars are swept along with expired entries
            Err(e) if e.is_corruption() => self.remove(key).await,
            Err(e) => Err(e),
        }
    }

    async fn stored_before(&self, cutoff: u64) -> Result<Vec<String>> {
        let scan = self.scan_sidecars().await?;

        for path in &scan.damaged {
            tracing::debug!("Removing unreadable sidecar {}", path.display());
            let _ = fs::remove_file(path).await;
        }

        let keys = scan
            .sidecars
            .iter()
            .filter(|s| s.entry.stored_at <= cutoff)
            .map(|s| s.entry.key.clone())
            .collect();

        // A partial scan could mistake live objects for orphans
        if scan.complete {
            self.sweep_orphans(&scan.sidecars).await;
        }
        Ok(keys)
    }

    async fn list_metadata(&self) -> Result<Vec<EntryMetadata>> {
        let scan = self.scan_sidecars().await?;
        Ok(scan.sidecars.into_iter().map(|s| s.entry).collect())
    }

    async fn clear(&self) -> Result<()> {
        Self::recreate_dir(self.base_dir.join(METADATA_DIR), "clear metadata directory").await?;
        Self::recreate_dir(self.base_dir.join(OBJECTS_DIR), "clear cache directory").await
    }

    fn store_type(&self) -> StoreType {
        StoreType::FileSystem
    }
}
