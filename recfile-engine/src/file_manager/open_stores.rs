//! Open store table - shares record stores that are currently open
//!
//! A [`RecordStore`] is single-owner. When several callers must work on the
//! same file, the table keeps one store per canonical path and hands out
//! reference-counted, mutex-guarded handles to it.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{RecordError, RecordResult};
use crate::storage::{RecordStore, StoreOptions};

/// Handle on a store shared through an [`OpenStoreTable`]
pub type SharedStore = Arc<Mutex<RecordStore>>;

struct OpenStore {
    store: SharedStore,
    /// Number of opens not yet matched by a close
    ref_count: u32,
}

/// Table of all open stores
pub struct OpenStoreTable {
    stores: RwLock<HashMap<PathBuf, OpenStore>>,
}

impl OpenStoreTable {
    pub fn new() -> Self {
        OpenStoreTable {
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Open a store (or increment its ref count if already open)
    ///
    /// Reopening with a different record size fails with
    /// [`RecordError::AlreadyOpen`]. The auto-flush policy of an already
    /// open store is left as is.
    pub fn open(&self, path: &Path, options: StoreOptions) -> RecordResult<SharedStore> {
        let key = canonical(path);

        let mut stores = self.stores.write();
        if let Some(open) = stores.get_mut(&key) {
            let record_size = open.store.lock().record_size();
            if record_size != options.record_size {
                return Err(RecordError::AlreadyOpen {
                    path: key,
                    record_size,
                });
            }
            open.ref_count += 1;
            return Ok(open.store.clone());
        }

        let store = Arc::new(Mutex::new(RecordStore::open_with(path, options)?));
        debug!(path = %key.display(), "registered open store");
        stores.insert(
            key,
            OpenStore {
                store: store.clone(),
                ref_count: 1,
            },
        );

        Ok(store)
    }

    /// Close a store (decrement ref count)
    ///
    /// Returns `true` when this was the last reference and the store was
    /// closed. Handles still held elsewhere then fail with
    /// [`RecordError::Closed`].
    pub fn close(&self, path: &Path) -> RecordResult<bool> {
        let key = canonical(path);

        let mut stores = self.stores.write();
        let Some(open) = stores.get_mut(&key) else {
            return Ok(false);
        };

        open.ref_count = open.ref_count.saturating_sub(1);
        if open.ref_count > 0 {
            return Ok(false);
        }

        if let Some(open) = stores.remove(&key) {
            open.store.lock().close()?;
        }
        Ok(true)
    }

    /// Get an open store
    pub fn get(&self, path: &Path) -> Option<SharedStore> {
        let key = canonical(path);
        let stores = self.stores.read();
        stores.get(&key).map(|open| open.store.clone())
    }

    /// Get number of open stores
    pub fn len(&self) -> usize {
        self.stores.read().len()
    }

    /// Check if any stores are open
    pub fn is_empty(&self) -> bool {
        self.stores.read().is_empty()
    }

    /// Close all stores regardless of ref count
    pub fn close_all(&self) {
        let mut stores = self.stores.write();
        for (path, open) in stores.drain() {
            if let Err(e) = open.store.lock().close() {
                warn!(path = %path.display(), error = %e, "failed to close record store");
            }
        }
    }
}

impl Default for OpenStoreTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical form of `path`, which need not exist yet
fn canonical(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    // A bare file name has an empty parent, which does not canonicalize
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    parent
        .canonicalize()
        .unwrap_or_else(|_| parent.to_path_buf())
        .join(path.file_name().unwrap_or_default())
}
