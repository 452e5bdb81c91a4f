//! varanno web service
//!
//! REST API for cached HGVS variant annotation: annotate single variants by
//! path or JSON body, plus health and cache statistics endpoints.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use varanno::service::{server, ServiceConfig};

#[derive(Parser)]
#[command(name = "varanno-web")]
#[command(about = "HGVS variant annotation web service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web service
    Serve {
        /// Configuration file path (defaults used when missing)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override host address
        #[arg(long)]
        host: Option<String>,

        /// Override port
        #[arg(short, long)]
        port: Option<u16>,

        /// Log level (trace, debug, info, warn, error)
        #[arg(long, default_value = "info")]
        log_level: String,
    },

    /// Generate a sample configuration file
    Config {
        /// Output path for configuration file
        #[arg(short, long, default_value = "varanno-web.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Check a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "varanno-web.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            log_level,
        } => serve_command(config, host, port, log_level).await,
        Commands::Config { output, force } => config_command(output, force),
        Commands::Check { config } => check_command(config),
    }
}

async fn serve_command(
    config_path: Option<PathBuf>,
    host_override: Option<String>,
    port_override: Option<u16>,
    log_level: String,
) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(&log_level)?;

    info!("starting varanno web service");

    let mut config = match config_path {
        Some(path) => ServiceConfig::from_file(&path)?,
        None => ServiceConfig::default(),
    };

    if let Some(host) = host_override {
        config.server.host = host;
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }

    if let Err(e) = config.validate() {
        error!("configuration validation failed: {e}");
        return Err(e.into());
    }

    info!(
        provider = %config.annotator.provider.base_url,
        cache_capacity = config.annotator.cache.capacity,
        "configuration loaded"
    );

    server::run(config).await?;
    Ok(())
}

fn config_command(output: PathBuf, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if output.exists() && !force {
        eprintln!("Configuration file already exists: {}", output.display());
        eprintln!("Use --force to overwrite");
        std::process::exit(1);
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    ServiceConfig::default().to_file(&output)?;
    println!("Sample configuration file created: {}", output.display());
    Ok(())
}

fn check_command(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::from_file(&config_path)?;
    match config.validate() {
        Ok(()) => {
            println!("Configuration is valid");
            println!(
                "Server will bind {}:{}",
                config.server.host, config.server.port
            );
            println!("Provider base URL: {}", config.annotator.provider.base_url);
            Ok(())
        }
        Err(e) => {
            println!("Configuration validation failed: {e}");
            Err(e.into())
        }
    }
}

fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_new(level).map_err(|e| format!("invalid log level '{level}': {e}"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    Ok(())
}
