// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rfetch::config::{self, Config, Settings};
use rfetch::error::{listing_error, remotes_error};
use rfetch::utils::format_size;
use rfetch::{App, RcloneClient};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// rfetch - browse rclone remotes and download in batches.
#[derive(Parser)]
#[command(name = "rfetch")]
#[command(version = VERSION)]
#[command(about = "Browse rclone remotes and queue batch downloads.")]
#[command(long_about = "rfetch - terminal browser for rclone remotes\n\n\
    Browse and download:  rfetch\n\
    Download elsewhere:   rfetch --dest ~/Downloads\n\
    List remotes:         rfetch remotes\n\
    List a directory:     rfetch ls gdrive photos/2024\n\n\
    Logs are written to ~/.rfetch/rfetch.log.")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory downloads are copied into (default: current directory)
    #[arg(short, long, global = true, value_name = "DIR")]
    dest: Option<PathBuf>,

    /// rclone binary to run
    #[arg(long, global = true, value_name = "PATH")]
    rclone: Option<String>,

    /// Config file (default: ~/.rfetch/config.json)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print configured remotes, one per line
    Remotes,

    /// List a directory on a remote
    Ls {
        /// Remote name (without the trailing colon)
        remote: String,

        /// Path inside the remote (default: root)
        #[arg(default_value = "")]
        path: String,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };
    if let Some(dest) = &cli.dest {
        config.destination = Some(dest.clone());
    }
    if let Some(binary) = &cli.rclone {
        config.rclone_binary = binary.clone();
    }
    Ok(config)
}

/// Send logs to the log file; the terminal belongs to the UI.
fn init_logging(config: &Config, verbose: bool) -> Result<()> {
    let path = config::log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {:?}", path))?;

    let default_level = if verbose {
        "debug".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "info".to_string())
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rfetch={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn print_remotes(client: &RcloneClient) -> Result<()> {
    match client.list_remotes().await {
        Ok(remotes) => {
            for remote in remotes {
                println!("{}", remote);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", remotes_error(&format!("{:#}", e)));
            Err(e)
        }
    }
}

async fn print_listing(client: &RcloneClient, remote: &str, path: &str) -> Result<()> {
    match client.list_files(remote, path).await {
        Ok(files) => {
            for file in files {
                let flag = if file.is_dir { 'd' } else { '-' };
                let size = if file.is_dir {
                    "-".to_string()
                } else {
                    format_size(file.byte_size())
                };
                println!("{} {:>10}  {}", flag, size, file.path);
            }
            Ok(())
        }
        Err(e) => {
            let location = rfetch::rclone::remote_spec(remote, path);
            eprintln!("{}", listing_error(&location, &format!("{:#}", e)));
            Err(e)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    if let Err(e) = init_logging(&config, cli.verbose) {
        eprintln!("[!] Logging disabled: {:#}", e);
    }
    tracing::debug!(?config, "loaded configuration");

    let client = Arc::new(config.client());
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    match cli.command {
        Some(Commands::Remotes) => runtime.block_on(print_remotes(&client)),
        Some(Commands::Ls { remote, path }) => {
            runtime.block_on(print_listing(&client, &remote, &path))
        }
        None => {
            let settings = Settings::from_config(&config);
            tracing::info!(
                version = VERSION,
                rclone = %client.binary().display(),
                destination = %settings.destination.display(),
                "starting session"
            );
            runtime.block_on(rfetch::ui::run(App::new(settings), client))
        }
    }
}
