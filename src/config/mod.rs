// src/config/mod.rs

//! TOML DAG definitions.
//!
//! A file is deserialized into [`RawConfigFile`] (`model.rs`, `loader.rs`)
//! and only becomes a [`ConfigFile`] after `validate.rs` has checked field
//! ranges and the dependency graph.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, GuardSection, NodeConfig, RawConfigFile, SchedulerSection};
pub use validate::validate_config;
