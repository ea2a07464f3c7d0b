//! Atomic file operations to prevent torn cache and state files

use assetcache_core::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

fn temp_path_for(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let parent = path.parent().ok_or_else(|| {
        Error::configuration(format!(
            "Invalid file path '{}': no parent directory",
            path.display()
        ))
    })?;
    let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));
    Ok((parent.to_path_buf(), temp_path))
}

/// Write data to a file atomically by writing to a temporary file and renaming
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let (parent, temp_path) = temp_path_for(path)?;

    fs::create_dir_all(&parent)
        .map_err(|e| Error::file_system(parent.clone(), "create parent directory", e))?;

    let result = (|| -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::file_system(&temp_path, "create temporary file", e))?;

        file.write_all(content)
            .map_err(|e| Error::file_system(&temp_path, "write to temporary file", e))?;

        file.sync_all()
            .map_err(|e| Error::file_system(&temp_path, "sync temporary file", e))?;

        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
        return result;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::file_system(path.to_path_buf(), "atomic rename", e)
    })?;

    Ok(())
}

/// Async counterpart of [`write_atomic`] built on `tokio::fs`
pub async fn write_atomic_async(path: &Path, content: &[u8]) -> Result<()> {
    let (parent, temp_path) = temp_path_for(path)?;

    tokio::fs::create_dir_all(&parent)
        .await
        .map_err(|e| Error::file_system(parent.clone(), "create parent directory", e))?;

    let result = async {
        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::file_system(&temp_path, "create temporary file", e))?;

        file.write_all(content)
            .await
            .map_err(|e| Error::file_system(&temp_path, "write to temporary file", e))?;

        file.sync_all()
            .await
            .map_err(|e| Error::file_system(&temp_path, "sync temporary file", e))?;

        Ok::<(), Error>(())
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return result;
    }

    match tokio::fs::rename(&temp_path, path).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = tokio::fs::remove_file(&temp_path).await;
            Err(Error::file_system(path.to_path_buf(), "atomic rename", e))
        }
    }
}

/// Write string content to a file atomically
pub fn write_atomic_string(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}
