//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't corrupt data on failure or
//! cancellation: a file is either completely replaced or left untouched.
//! Writers in other processes are kept out with an advisory lock file.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use tokio::fs;

use crate::error::{PrefsError, PrefsResult};

/// Lock file guarding updates of `path`
pub fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Exclusive advisory lock, released when dropped
#[derive(Debug)]
pub struct FileLock {
    _file: File,
}

/// Take the exclusive lock for `path`, waiting for other holders
///
/// The lock covers every process that goes through this function, not
/// just the current one.
pub async fn lock_exclusive(path: &Path) -> PrefsResult<FileLock> {
    let lock_path = lock_path(path);

    tokio::task::spawn_blocking(move || {
        create_parent(&lock_path)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| {
                PrefsError::storage(format!(
                    "Failed to open lock file {}: {}",
                    lock_path.display(),
                    e
                ))
            })?;

        file.lock().map_err(|e| {
            PrefsError::storage(format!("Failed to lock {}: {}", lock_path.display(), e))
        })?;

        Ok(FileLock { _file: file })
    })
    .await
    .map_err(|e| PrefsError::storage(format!("Lock task failed: {}", e)))?
}

/// Read JSON from a file, returning a default value if file doesn't exist
pub async fn read_json<T, P>(path: P) -> PrefsResult<T>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let contents = match fs::read(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => {
            return Err(PrefsError::storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    serde_json::from_slice(&contents)
        .map_err(|e| PrefsError::storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to a fresh temp file, then rename)
pub async fn write_json_atomic<T, P>(path: P, data: &T) -> PrefsResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref().to_path_buf();

    let contents = serde_json::to_vec_pretty(data)
        .map_err(|e| PrefsError::storage(format!("Failed to serialize data: {}", e)))?;

    tokio::task::spawn_blocking(move || replace_file(&path, &contents))
        .await
        .map_err(|e| PrefsError::storage(format!("Write task failed: {}", e)))?
}

fn replace_file(path: &Path, contents: &[u8]) -> PrefsResult<()> {
    let parent = create_parent(path)?;

    // Uniquely named and in the same directory, so the rename is atomic and
    // no two writers ever share a temp file
    let mut temp = NamedTempFile::new_in(&parent)
        .map_err(|e| PrefsError::storage(format!("Failed to create temp file: {}", e)))?;

    temp.write_all(contents)
        .map_err(|e| PrefsError::storage(format!("Failed to write data: {}", e)))?;

    temp.as_file()
        .sync_all()
        .map_err(|e| PrefsError::storage(format!("Failed to sync data: {}", e)))?;

    // On failure the temp file is removed when the returned handle drops
    temp.persist(path).map_err(|e| {
        PrefsError::storage(format!("Failed to replace {}: {}", path.display(), e.error))
    })?;

    Ok(())
}

/// Create the directory holding `path` and return it
fn create_parent(path: &Path) -> PrefsResult<PathBuf> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    std::fs::create_dir_all(&parent).map_err(|e| {
        PrefsError::storage(format!(
            "Failed to create directory {}: {}",
            parent.display(),
            e
        ))
    })?;

    Ok(parent)
}
