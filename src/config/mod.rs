//! Configuration for the downscaler
//!
//! Provides the `pxdown.toml` schema plus loaders for TOML files, JSON
//! settings objects and flat key/value maps.

pub mod loader;
pub mod schema;

pub use loader::{
    config_from_json, config_from_map, find_config, find_config_from, load_config,
    merge_cli_overrides, CliOverrides, ConfigError,
};
pub use schema::*;
