// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Read and deserialize a DAG file without checking it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let raw: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), nodes = raw.node.len(), "parsed DAG config");
    Ok(raw)
}

/// [`load_from_path`] followed by full validation: field sanity, then the
/// same duplicate/unknown-dependency/cycle checks a run performs.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    ConfigFile::try_from(load_from_path(path)?)
}
