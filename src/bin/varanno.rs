//! varanno CLI
//!
//! Command-line interface for annotating HGVS variants through the Ensembl
//! VEP REST API, with cached lookups and TSV output.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use varanno::batch::{process_input_line, read_variants, BatchRunner};
use varanno::config::AnnotatorConfig;
use varanno::{AnnotationService, VepClient};

#[derive(Parser)]
#[command(name = "varanno")]
#[command(author, version, about = "HGVS variant annotator with cached VEP lookups")]
#[command(
    long_about = "Annotate HGVS variant descriptions with Ensembl VEP consequences.

Examples:
  varanno annotate --variant 'NC_000006.12:g.152387156G>A'
  varanno annotate --input variants.txt --output annotated.tsv
  echo 'NC_000006.12:g.152387156G>A' | varanno annotate"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate one variant or a file of variants
    Annotate {
        /// A single HGVS variant to annotate
        #[arg(short, long, conflicts_with = "input")]
        variant: Option<String>,

        /// Input file with one variant per line (stdin if neither
        /// --variant nor --input is given)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output TSV file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Enable debug logging
        #[arg(long)]
        verbose: bool,
    },

    /// Generate a sample configuration file
    Config {
        /// Output path for the configuration file
        #[arg(short, long, default_value = "varanno.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Annotate {
            variant,
            input,
            output,
            config,
            verbose,
        } => annotate_command(variant, input, output, config, verbose).await,
        Commands::Config { output, force } => config_command(output, force),
    }
}

async fn annotate_command(
    variant: Option<String>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(verbose)?;

    let config = match config_path {
        Some(path) => AnnotatorConfig::from_file(path)?,
        None => AnnotatorConfig::default(),
    };
    config.validate()?;

    let variants = match (variant, input) {
        (Some(v), _) => vec![v],
        (None, Some(path)) => read_variants(&path)?,
        (None, None) => read_stdin_variants()?,
    };
    info!("annotating {} variant(s)", variants.len());

    let provider = Arc::new(VepClient::new(&config.provider)?);
    let service = AnnotationService::new(provider, config.cache_config());
    let runner = BatchRunner::new(service);

    let (tsv, summary) = runner.annotate_to_tsv(&variants).await;

    match output {
        Some(path) => std::fs::write(&path, tsv)?,
        None => io::stdout().write_all(tsv.as_bytes())?,
    }

    info!(
        "annotated {}/{} variants ({} failed) in {:.2}s",
        summary.annotated,
        summary.total,
        summary.failed,
        summary.duration.as_secs_f64()
    );

    if summary.annotated == 0 && summary.total > 0 {
        std::process::exit(1);
    }
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

    AnnotatorConfig::default().to_file(&output)?;
    println!("Sample configuration file created: {}", output.display());
    Ok(())
}

fn read_stdin_variants() -> Result<Vec<String>, io::Error> {
    let stdin = io::stdin();
    let mut variants = Vec::new();
    for (i, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        if let Some(variant) = process_input_line(&line, i == 0) {
            variants.push(variant.to_string());
        }
    }
    Ok(variants)
}

fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    Ok(())
}
