//! recfile engine - fixed-size random-access record files
//!
//! This crate provides a file-backed store that behaves like an indexable,
//! mutable sequence of equally sized binary records.

pub mod error;
pub mod storage;
pub mod file_manager;

pub use error::{ErrorKind, RecordError, RecordResult};
pub use file_manager::{OpenStoreTable, SharedStore};
pub use storage::{RecordStore, Records, StoreOptions};
