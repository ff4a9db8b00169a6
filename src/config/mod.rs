//! Configuration module
//!
//! Handles loading, validating and stage-qualifying configuration from TOML
//! files and environment variables.

pub mod loader;
pub mod schema;
pub mod types;

pub use loader::{LoadOptions, load_config, load_config_from_path, load_config_from_str};
pub use schema::{ConfigDocument, Schema, VPC_ID_PATTERN};
pub use types::*;
