use crate::history::ImageRecord;

use std::{
    collections::VecDeque,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use tracing::{debug, info, instrument, warn};

/// Maximum number of screenshots kept before the oldest is evicted.
pub const MAX_HISTORY_SIZE: usize = 50;

/// Bounded, ordered history of captured images.
///
/// Positions are zero-based, oldest first. They shift down after
/// [`delete_at`](Self::delete_at), so a position cached by a client may point
/// at a different record (or nothing) after a delete. Use
/// [`ImageRecord::sequence`] for a stable identity.
///
/// Cloning is cheap and yields a handle to the same store.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    inner: Arc<RwLock<HistoryInner>>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct HistoryInner {
    records: VecDeque<ImageRecord>,
    next_sequence: u64,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    /// Create an empty store holding at most [`MAX_HISTORY_SIZE`] records.
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_SIZE)
    }

    /// Create an empty store with a custom capacity (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HistoryInner {
                records: VecDeque::with_capacity(capacity),
                next_sequence: 1,
            })),
            capacity: capacity.max(1),
        }
    }

    /// Maximum number of records held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a new image, evicting (and deleting) the oldest if over capacity.
    ///
    /// The append and the eviction happen under a single write lock, so
    /// readers never observe more than `capacity` records.
    #[instrument(skip(self, path))]
    pub fn append(&self, path: impl Into<PathBuf>) -> ImageRecord {
        let path = path.into();

        let (record, evicted) = {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

            let record = ImageRecord {
                path,
                sequence: inner.next_sequence,
            };
            inner.next_sequence += 1;
            inner.records.push_back(record.clone());

            let evicted = if inner.records.len() > self.capacity {
                inner.records.pop_front()
            } else {
                None
            };

            (record, evicted)
        };

        if let Some(old) = evicted {
            debug!(sequence = old.sequence, path = ?old.path, "Evicting oldest image");
            remove_backing_file(&old.path);
        }

        info!(sequence = record.sequence, path = ?record.path, "Image appended to history");

        record
    }

    /// Record at `position` (zero-based, oldest first).
    pub fn get(&self, position: usize) -> Option<ImageRecord> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.records.get(position).cloned()
    }

    /// Most recently appended record still in the history.
    pub fn latest(&self) -> Option<ImageRecord> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.records.back().cloned()
    }

    /// Snapshot of every record, oldest first.
    pub fn records(&self) -> Vec<ImageRecord> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.records.iter().cloned().collect()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.records.len()
    }

    /// Whether the history holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove the record at `position` and delete its file.
    ///
    /// Later records shift down by one. Returns `false` if `position` is out
    /// of range.
    #[instrument(skip(self))]
    pub fn delete_at(&self, position: usize) -> bool {
        let removed = {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            inner.records.remove(position)
        };

        match removed {
            Some(record) => {
                remove_backing_file(&record.path);
                info!(position, sequence = record.sequence, "Image deleted from history");
                true
            }
            None => {
                debug!(position, "Delete ignored, position out of range");
                false
            }
        }
    }

    /// Delete every backing file and empty the history.
    ///
    /// Returns the number of records removed.
    #[instrument(skip(self))]
    pub fn clear(&self) -> usize {
        let drained: Vec<ImageRecord> = {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            inner.records.drain(..).collect()
        };

        for record in &drained {
            remove_backing_file(&record.path);
        }

        info!(removed = drained.len(), "History cleared");

        drained.len()
    }
}

/// Best-effort delete; a file that is already gone is not an error.
fn remove_backing_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = ?path, "Backing file removed"),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = ?path, "Backing file already missing")
        }
        Err(e) => warn!(path = ?path, error = ?e, "Failed to remove backing file"),
    }
}
