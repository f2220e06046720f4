//! Durable storage for the history file.

use super::error::HistoryError;
use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Backend that holds the encoded history file.
pub trait HistoryStorage: Send + Sync {
    /// Read the history file, or `None` if it does not exist yet.
    fn read(&self) -> Result<Option<Vec<u8>>, HistoryError>;

    /// Replace the history file.
    fn write(&self, bytes: &[u8]) -> Result<(), HistoryError>;
}

impl<T: HistoryStorage + ?Sized> HistoryStorage for Arc<T> {
    fn read(&self) -> Result<Option<Vec<u8>>, HistoryError> {
        (**self).read()
    }

    fn write(&self, bytes: &[u8]) -> Result<(), HistoryError> {
        (**self).write(bytes)
    }
}

/// History file on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Store the history at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the history file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl HistoryStorage for LocalStorage {
    fn read(&self) -> Result<Option<Vec<u8>>, HistoryError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<(), HistoryError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        // Write then rename so a crash never leaves a truncated history.
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(bytes).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }
}

/// In-memory history storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<Option<Vec<u8>>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage holding an existing history file.
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            data: Mutex::new(Some(bytes)),
            ..Self::default()
        }
    }

    /// Make subsequent writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current contents.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.data.lock().clone()
    }
}

impl HistoryStorage for MemoryStorage {
    fn read(&self) -> Result<Option<Vec<u8>>, HistoryError> {
        Ok(self.data.lock().clone())
    }

    fn write(&self, bytes: &[u8]) -> Result<(), HistoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HistoryError::Unavailable("writes disabled".to_string()));
        }
        *self.data.lock() = Some(bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
