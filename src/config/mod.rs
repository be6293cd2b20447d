// src/config/mod.rs

//! Configuration loading and validation for taskexplorer.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate invariants like glob/regex syntax and group limits (`validate.rs`).
//! - Keep the last valid configuration and classify updates (`store.rs`).

pub mod loader;
pub mod model;
pub mod store;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, ConfigSection, GroupSection, RawConfigFile, SpecialFoldersSection,
};
pub use store::{ConfigChange, ConfigStore};
