//! Configuration loading for lodestar.
//!
//! Config files: `lodestar.toml`, `lodestar.yaml`, or `lodestar.json`
//! Searched in `./` then `~/.config/lodestar/`.

pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    schema::{LodestarConfig, ProviderEntry, ProviderOption, ProvidersConfig, StatusConfig},
};
