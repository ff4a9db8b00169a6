//! Infrastructure configuration loader
//!
//! Reads the deployment configuration for a set of containerized services,
//! validates it, qualifies the namespace with the deployment stage and
//! derives the stack manifest that every resource declaration hangs off.
//!
//! ## Example Configuration
//!
//! ```toml
//! [app]
//! ns = "Demo"
//! stage = "Dev"                   # namespace becomes "DemoDev"
//!
//! [aws]
//! account = 123456789012
//! region = "ap-northeast-2"
//!
//! [vpc]
//! id = "vpc-0123456789abcdef"     # "vpc-" + 16 lowercase hex digits
//!
//! [service.common]
//! port = 8080
//! tag = "latest"
//!
//! [service.chatbot]
//! name = "Chatbot"
//! repositoryName = "demo-chatbot"
//! ```
//!
//! The configuration is built once with [`load_config`] and handed to
//! consumers by reference; there is no global instance.

pub mod config;
pub mod error;
pub mod manifest;

// Re-export main types
pub use config::{LoadOptions, ValidatedConfig, load_config, load_config_from_str};
pub use error::{AppError, ConfigError, Result};
pub use manifest::StackManifest;
