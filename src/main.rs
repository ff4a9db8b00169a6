//! Infrastructure configuration CLI
//!
//! Validates the deployment configuration and prints the resolved
//! configuration or the stack manifest derived from it.

use clap::{Parser, Subcommand, ValueEnum};
use infra_config::{AppError, LoadOptions, StackManifest, ValidatedConfig, config::load_config};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Infrastructure configuration - validate and inspect deployment settings
#[derive(Parser, Debug)]
#[command(name = "infra-config")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "INFRA_CONFIG_PATH")]
    config: Option<String>,

    /// Override the deployment stage
    #[arg(long, env = "INFRA_CONFIG_STAGE")]
    stage: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "INFRA_CONFIG_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration
    Check,
    /// Print the validated configuration
    Show {
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Print the stack manifest as JSON
    Manifest,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Toml,
}

fn init_logging(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    match args.log_format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }
}

fn render_config(config: &ValidatedConfig, format: OutputFormat) -> infra_config::Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(config).map_err(|e| AppError::Output(e.to_string()))
        }
        OutputFormat::Toml => {
            toml::to_string_pretty(config).map_err(|e| AppError::Output(e.to_string()))
        }
    }
}

fn render_manifest(config: &ValidatedConfig) -> infra_config::Result<String> {
    let manifest = StackManifest::from_config(config);
    serde_json::to_string_pretty(&manifest).map_err(|e| AppError::Output(e.to_string()))
}

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    init_logging(&args);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting infra-config");

    let options = LoadOptions {
        config_path: args.config.clone(),
        stage: args.stage.clone(),
    };

    // Built once here, borrowed by everything below
    let config = load_config(&options)
        .map_err(AppError::from)
        .inspect_err(|e| error!(error = %e, "Failed to load configuration"))?;

    match args.command {
        Command::Check => {
            info!(
                ns = %config.app().ns,
                stage = %config.app().stage,
                region = %config.aws().region,
                vpc = %config.vpc().id,
                services = config.services().len(),
                "Configuration is valid"
            );
        }
        Command::Show { format } => {
            println!("{}", render_config(&config, format)?);
        }
        Command::Manifest => {
            println!("{}", render_manifest(&config)?);
        }
    }

    Ok(())
}
