//! Configuration file support
//!
//! ```toml
//! log_level = "debug"
//! encoding = "text"
//!
//! [store]
//! record_size = 16
//! auto_flush = true
//! ```
//!
//! Command line flags take precedence over anything set here.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use recfile_engine::StoreOptions;
use serde::Deserialize;

use crate::codec::Encoding;

/// Contents of a `recfile.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub log_level: Option<String>,
    pub encoding: Option<Encoding>,
    pub store: Option<StoreOptions>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Merge command line overrides into the configured store options
    pub fn store_options(
        &self,
        record_size: Option<usize>,
        no_auto_flush: bool,
    ) -> Result<StoreOptions> {
        let record_size = match (record_size, self.store) {
            (Some(size), _) => size,
            (None, Some(store)) => store.record_size,
            (None, None) => bail!("no record size given: pass --record-size or set store.record_size"),
        };
        let auto_flush = !no_auto_flush && self.store.map_or(true, |store| store.auto_flush);

        Ok(StoreOptions::new(record_size).auto_flush(auto_flush))
    }
}
