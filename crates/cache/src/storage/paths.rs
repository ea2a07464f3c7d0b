//! Path generation for the sharded on-disk layout

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub(super) const OBJECTS_DIR: &str = "objects";
pub(super) const METADATA_DIR: &str = "metadata";
pub(super) const METADATA_EXT: &str = "meta";
pub(super) const GENERATION_FILE: &str = "VERSION";

/// Hash a cache key (a URL) into a file-system safe name
pub(super) fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

fn shard(key_hash: &str) -> &str {
    &key_hash[..2]
}

/// `<base>/objects/<first byte>`
pub(super) fn object_dir(base_dir: &Path, key: &str) -> PathBuf {
    base_dir.join(OBJECTS_DIR).join(shard(&hash_key(key)))
}

/// A fresh object name for one write of `key`: `<key hash>-<write id>`
pub(super) fn new_object_name(key: &str) -> String {
    format!("{}-{}", hash_key(key), Uuid::new_v4().simple())
}

/// Resolve an object name taken from a sidecar
///
/// Only names minted by [`new_object_name`] for this key resolve, so a
/// tampered sidecar cannot point outside the key's shard.
pub(super) fn object_path(base_dir: &Path, key: &str, object: &str) -> Option<PathBuf> {
    let key_hash = hash_key(key);
    let write_id = object.strip_prefix(key_hash.as_str())?.strip_prefix('-')?;
    if write_id.len() != 32 || !write_id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some(
        base_dir
            .join(OBJECTS_DIR)
            .join(shard(&key_hash))
            .join(object),
    )
}

/// `<base>/metadata/<first byte>/<hash>.meta`
pub(super) fn metadata_path(base_dir: &Path, key: &str) -> PathBuf {
    let hash = hash_key(key);
    base_dir
        .join(METADATA_DIR)
        .join(shard(&hash))
        .join(format!("{hash}.{METADATA_EXT}"))
}

/// Private name a sidecar is renamed to while it is being removed
pub(super) fn tombstone_path(sidecar: &Path) -> PathBuf {
    let mut name = sidecar.as_os_str().to_owned();
    name.push(format!(".{}.purge", Uuid::new_v4().simple()));
    PathBuf::from(name)
}

/// Hex SHA-256 of a payload
pub(super) fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
