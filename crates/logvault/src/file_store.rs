//! File-based log storage.
//!
//! This module provides:
//! - [`FileLogStore`]: Durable store holding the whole collection as one JSON array
//! - Atomic replace on every append (temp file, `fsync`, rename, directory `fsync`)
//! - Auto-initialization of a missing file to `[]`
//! - Implementation of [`LogStore`]
//!
//! Every append re-reads and re-writes the full collection. That keeps the
//! on-disk format trivial at the cost of O(n) appends.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::error::{LogError, Result};
use crate::traits::LogStore;
use crate::types::LogEntry;

/// Configuration for file-based log storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLogStoreConfig {
    /// Location of the JSON collection.
    pub path: PathBuf,
    /// Write indented JSON.
    pub pretty: bool,
}

impl Default for FileLogStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/logs.json"),
            pretty: true,
        }
    }
}

impl FileLogStoreConfig {
    /// Creates a new config for the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Sets whether the collection is written indented.
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Durable log store backed by a single JSON file.
///
/// Appends hold `writer` for the whole read-modify-write span, including
/// the blocking write, even if the append future is dropped. Readers never
/// take it; they rely on the rename being atomic.
#[derive(Debug)]
pub struct FileLogStore {
    config: FileLogStoreConfig,
    writer: Arc<Mutex<()>>,
    /// Monotonic counter for unique temp file names.
    temp_seq: AtomicU64,
}

impl FileLogStore {
    /// Creates a store without touching disk. The file is created on first access.
    #[must_use]
    pub fn new(config: FileLogStoreConfig) -> Self {
        Self {
            config,
            writer: Arc::new(Mutex::new(())),
            temp_seq: AtomicU64::new(0),
        }
    }

    /// Creates a store and initializes the file if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the empty collection cannot be written.
    pub async fn open(config: FileLogStoreConfig) -> Result<Self> {
        let store = Self::new(config);
        store.initialize().await?;
        Ok(store)
    }

    /// Creates a store for `path` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be initialized.
    pub async fn at(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(FileLogStoreConfig::new(path)).await
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &FileLogStoreConfig {
        &self.config
    }

    /// Returns the collection file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Writes an empty collection if the file is missing.
    async fn initialize(&self) -> Result<()> {
        let writer = Arc::clone(&self.writer).lock_owned().await;
        let exists = fs::try_exists(&self.config.path)
            .await
            .map_err(|e| LogError::read_failed(self.describe(&e)))?;
        if !exists {
            self.write_collection(writer, &[]).await?;
            info!(path = %self.config.path.display(), "initialized empty log collection");
        }
        Ok(())
    }

    /// Reads the collection. `None` means the file does not exist.
    async fn load(&self) -> Result<Option<Vec<LogEntry>>> {
        let bytes = match fs::read(&self.config.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LogError::read_failed(self.describe(&e))),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| LogError::read_failed(self.describe(&e)))
    }

    /// Atomically replaces the collection.
    ///
    /// The write runs on a blocking thread that owns `writer`, so once
    /// started it finishes and releases the lock on its own.
    async fn write_collection(&self, writer: OwnedMutexGuard<()>, entries: &[LogEntry]) -> Result<()> {
        let bytes = if self.config.pretty {
            serde_json::to_vec_pretty(entries)
        } else {
            serde_json::to_vec(entries)
        }
        .map_err(|e| LogError::write_failed(self.describe(&e)))?;

        let path = self.config.path.clone();
        let temp = TempFile::new(self.temp_path());
        tokio::task::spawn_blocking(move || {
            let _writer = writer;
            replace_atomically(&path, temp, &bytes)
        })
        .await
        .map_err(|e| LogError::write_failed(self.describe(&e)))?
        .map_err(|e| LogError::write_failed(self.describe(&e)))
    }

    fn temp_path(&self) -> PathBuf {
        let seq = self.temp_seq.fetch_add(1, Ordering::Relaxed);
        let name = self
            .config
            .path
            .file_name()
            .map_or_else(|| "logs".into(), |n| n.to_string_lossy().into_owned());
        self.config
            .path
            .with_file_name(format!(".{name}.{}.{seq}.tmp", std::process::id()))
    }

    fn describe(&self, err: &dyn std::fmt::Display) -> String {
        format!("{}: {err}", self.config.path.display())
    }
}

/// Writes `bytes` to `temp`, syncs it and renames it over `path`, then
/// syncs the directory so the rename itself survives a crash.
fn replace_atomically(path: &Path, temp: TempFile, bytes: &[u8]) -> std::io::Result<()> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(dir)?;

    let mut file = std::fs::File::create(temp.path())?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(temp.path(), path)?;
    temp.persist();
    sync_dir(dir);
    Ok(())
}

/// The new contents are already synced, so a failure here only weakens
/// crash durability and is logged.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = std::fs::File::open(dir).and_then(|d| d.sync_all()) {
        warn!(dir = %dir.display(), error = %e, "failed to sync log directory");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

/// Directory holding `path`; `.` for a bare file name.
fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// A temp file that is removed on drop unless it was renamed into place.
///
/// Covers error returns and panics on the blocking writer.
#[derive(Debug)]
struct TempFile {
    path: PathBuf,
    armed: bool,
}

impl TempFile {
    const fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn persist(mut self) {
        self.armed = false;
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                warn!(path = %self.path.display(), error = %e, "failed to remove temp file");
            }
            _ => {}
        }
    }
}

// ============================================================================
// Trait Implementations
// ============================================================================

impl LogStore for FileLogStore {
    async fn read_all(&self) -> Result<Vec<LogEntry>> {
        if let Some(entries) = self.load().await? {
            return Ok(entries);
        }
        self.initialize().await?;
        Ok(Vec::new())
    }

    async fn append(&self, entry: LogEntry) -> Result<LogEntry> {
        let writer = Arc::clone(&self.writer).lock_owned().await;

        let mut entries = self.load().await?.unwrap_or_default();
        entries.push(entry);
        self.write_collection(writer, &entries).await?;

        debug!(
            path = %self.config.path.display(),
            entries = entries.len(),
            "persisted log collection"
        );

        entries
            .pop()
            .ok_or_else(|| LogError::write_failed("collection empty after append"))
    }
}
