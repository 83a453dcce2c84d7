use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};
use tubegen_core::config::{self, AppConfig};

#[derive(Parser)]
#[command(name = "tubegen")]
#[command(about = "Procedurally generate a transit network with seeded station names")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the configured seed
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Also append logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grow the configured network and print it as JSON
    Generate {
        /// Write the JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a batch of raw names without building a network
    Names {
        /// Number of names
        #[arg(default_value_t = 10)]
        count: usize,
        /// Growth index the batch seed is derived from
        #[arg(long, default_value_t = 1)]
        index: u64,
    },
    /// Write the default configuration file if it is missing
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    match cli.command {
        Commands::Init => {
            let path = config::ensure_default_config()?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Generate { output } => {
            let config = load_config(cli.config, cli.seed)?;
            let mut engine = config.build_engine()?;
            config.grow(&mut engine)?;

            let json = engine
                .snapshot()
                .to_json_pretty()
                .context("failed to serialize network")?;
            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), "network written");
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        Commands::Names { count, index } => {
            let config = load_config(cli.config, cli.seed)?;
            let engine = config.build_engine()?;
            let names = engine
                .names_for(index, count)
                .context("failed to synthesize names")?;
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>, seed: Option<u64>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    Ok(config)
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .compact()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
