//! Options for opening a record store

use serde::{Deserialize, Serialize};

/// How a [`RecordStore`](super::RecordStore) is opened
///
/// Deserializable so front ends can read it straight from a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Size of every record in bytes
    pub record_size: usize,
    /// Flush after every mutating operation
    #[serde(default = "default_auto_flush")]
    pub auto_flush: bool,
}

fn default_auto_flush() -> bool {
    true
}

impl StoreOptions {
    pub fn new(record_size: usize) -> Self {
        StoreOptions {
            record_size,
            auto_flush: default_auto_flush(),
        }
    }

    pub fn auto_flush(mut self, auto_flush: bool) -> Self {
        self.auto_flush = auto_flush;
        self
    }
}
