//! Storage layer for fixed-size record files
//!
//! This module handles the on-disk side of a record store:
//! - Record layout (offset and bounds arithmetic)
//! - The owned data file handle
//! - The record store itself

pub mod layout;
pub mod data_file;
pub mod options;
pub mod store;

pub use layout::Layout;
pub use data_file::DataFile;
pub use options::StoreOptions;
pub use store::{RecordStore, Records};
