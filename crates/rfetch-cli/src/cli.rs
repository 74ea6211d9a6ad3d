use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use rfetch_core::config;
use rfetch_core::job::{SourceLocator, TransferJob};

use crate::credentials_env::EnvCredentialProvider;
use crate::finalize;
use crate::metadata;

/// Top-level CLI for the rfetch parallel object-store fetcher.
#[derive(Debug, Parser)]
#[command(name = "rfetch")]
#[command(about = "Parallel ranged-fetch transfer of a large object to a local sink", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch a URL to a local file, atomically renamed into place on success.
    Cp {
        /// Direct HTTPS URL supporting Range requests.
        url: String,
        /// Destination file path.
        destination: PathBuf,
    },

    /// Fetch a URL and stream it to standard output.
    Cat {
        /// Direct HTTPS URL supporting Range requests.
        url: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Cp { url, destination } => run_cp(&cfg, url, destination).await,
            CliCommand::Cat { url } => run_cat(&cfg, url).await,
        }
    }
}

async fn build_job(cfg: &config::TransferConfig, url: String) -> Result<TransferJob> {
    let client = reqwest::Client::new();
    let total_size = metadata::resolve_size(&client, &url)
        .await
        .context("resolving object size")?;
    let (concurrency_cap, memory_cap) = cfg.resolved_caps();

    Ok(TransferJob {
        source: SourceLocator {
            bucket: String::new(),
            key: String::new(),
            url,
        },
        total_size,
        segment_size: cfg.segment_size,
        concurrency_cap,
        memory_cap,
        fetch_timeout: cfg.fetch_timeout(),
        refresh_margin: cfg.refresh_margin(),
        credentials: Arc::new(EnvCredentialProvider),
    })
}

async fn run_cp(cfg: &config::TransferConfig, url: String, destination: PathBuf) -> Result<()> {
    let job = build_job(cfg, url).await?;
    if !cfg.quiet {
        eprintln!(
            "fetching {} bytes in {} segments of {} bytes",
            job.total_size,
            job.segment_count(),
            job.segment_size
        );
    }

    let (file, temp_path) = finalize::create_temp(&destination).await?;
    let mut sink = file;
    let outcome = rfetch_core::engine::run_transfer(&job, &mut sink).await;

    match outcome.fault {
        None => {
            finalize::finalize(sink, &temp_path, &destination).await?;
            if !cfg.quiet {
                eprintln!("wrote {} bytes to {}", outcome.bytes_written, destination.display());
            }
            Ok(())
        }
        Some(fault) => {
            drop(sink);
            finalize::cleanup(&temp_path).await;
            anyhow::bail!("transfer failed after {} bytes: {fault}", outcome.bytes_written)
        }
    }
}

async fn run_cat(cfg: &config::TransferConfig, url: String) -> Result<()> {
    let job = build_job(cfg, url).await?;
    let mut stdout = tokio::io::stdout();
    let outcome = rfetch_core::engine::run_transfer(&job, &mut stdout).await;
    stdout.flush().await.ok();

    match outcome.fault {
        None => Ok(()),
        Some(fault) => {
            anyhow::bail!("transfer failed after {} bytes: {fault}", outcome.bytes_written)
        }
    }
}
