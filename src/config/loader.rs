//! Configuration loader with layered sources
//!
//! Loads configuration from the following sources (highest precedence first):
//! 1. CLI override (`--stage`)
//! 2. Environment variables (INFRA_CONFIG__*)
//! 3. Configuration file (TOML)
//!
//! The merged document is validated as a whole and the namespace is then
//! qualified with the stage. Any failure is returned to the caller, which is
//! expected to stop before declaring anything.

use crate::config::schema::{ConfigDocument, Schema};
use crate::config::types::{AppSection, ValidatedConfig};
use crate::error::ConfigError;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default configuration file paths to check (in order)
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    ".toml",
    "infra.toml",
    "~/.config/infra-config/config.toml",
];

/// Prefix for environment overrides, e.g. `INFRA_CONFIG__APP__STAGE`
pub const ENV_PREFIX: &str = "INFRA_CONFIG";

/// Caller-supplied loading options
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit configuration file; must exist when set
    pub config_path: Option<String>,

    /// Replaces `app.stage` after the file and environment are merged
    pub stage: Option<String>,
}

impl LoadOptions {
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            config_path: Some(path.into()),
            stage: None,
        }
    }
}

/// Load configuration from a TOML string (useful for testing)
///
/// No file discovery and no environment overlay.
pub fn load_config_from_str(toml_str: &str) -> Result<ValidatedConfig, ConfigError> {
    let builder = Config::builder().add_source(File::from_str(toml_str, FileFormat::Toml));
    finish(builder)
}

/// Load configuration from an explicit file, without environment overlay
pub fn load_config_from_path(path: &Path) -> Result<ValidatedConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.display().to_string(),
        });
    }

    let builder = Config::builder().add_source(File::from(path).format(FileFormat::Toml));
    finish(builder)
}

/// Load configuration from files, environment and overrides
pub fn load_config(options: &LoadOptions) -> Result<ValidatedConfig, ConfigError> {
    let path = resolve_config_path(options.config_path.as_deref())?;
    info!(path = %path.display(), "Loading configuration");

    let mut builder = Config::builder()
        .add_source(File::from(path.as_path()).format(FileFormat::Toml))
        // Double underscore (__) maps to nested keys (app.stage).
        // Values stay strings; the schema converts digit strings where a number is expected.
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    if let Some(stage) = options.stage.as_deref() {
        debug!(stage, "Overriding app.stage");
        builder = builder
            .set_override("app.stage", stage)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    finish(builder)
}

/// Pick the configuration file to read
fn resolve_config_path(config_path: Option<&str>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        let expanded = PathBuf::from(shellexpand::tilde(path).as_ref());
        if !expanded.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_string(),
            });
        }
        return Ok(expanded);
    }

    // First existing default wins
    DEFAULT_CONFIG_PATHS
        .iter()
        .map(|path| PathBuf::from(shellexpand::tilde(path).as_ref()))
        .find(|path| path.exists())
        .ok_or_else(|| ConfigError::NotFound {
            path: DEFAULT_CONFIG_PATHS.join(", "),
        })
}

/// Build, validate and qualify
fn finish(builder: ConfigBuilder<DefaultState>) -> Result<ValidatedConfig, ConfigError> {
    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let raw: serde_json::Value = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let schema = Schema::new()?;
    let document = schema.validate(&raw).map_err(|errors| {
        for violation in errors.violations() {
            warn!(field = %violation.field, reason = %violation.kind, "Invalid configuration value");
        }
        ConfigError::Validation(errors)
    })?;

    if document.service.services.is_empty() {
        warn!("No named services configured");
    }

    let config = qualify_namespace(document);
    debug!(
        ns = %config.app().ns,
        stage = %config.app().stage,
        services = config.services().len(),
        "Configuration validated"
    );

    Ok(config)
}

/// Replace `app.ns` with `app.ns + app.stage`
fn qualify_namespace(document: ConfigDocument) -> ValidatedConfig {
    let ConfigDocument {
        app,
        aws,
        vpc,
        service,
        extra,
    } = document;

    let app = AppSection {
        ns: format!("{}{}", app.ns, app.stage),
        stage: app.stage,
    };

    ValidatedConfig::new(app, aws, vpc, service, extra)
}
