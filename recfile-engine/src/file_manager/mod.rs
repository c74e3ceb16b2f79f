//! File manager for record stores
//!
//! Shares open stores between callers behind a mutex.

pub mod open_stores;

pub use open_stores::{OpenStoreTable, SharedStore};
