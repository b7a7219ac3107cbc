//! CLI for proxyfetch.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use proxyfetch_core::config::{self, FetchConfig};
use std::path::{Path, PathBuf};

use commands::{run_completions, run_fetch, run_man, run_show_config, FetchArgs};

/// Top-level CLI for proxyfetch.
#[derive(Debug, Parser)]
#[command(name = "proxyfetch")]
#[command(
    about = "proxyfetch: fetch URLs through an authenticated proxy with bounded concurrency and retries",
    long_about = None
)]
pub struct Cli {
    /// Config file to use instead of ~/.config/proxyfetch/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch URLs (default: target_urls from config) and print one result per URL.
    Fetch {
        /// HTTP/HTTPS URLs to fetch, in order.
        urls: Vec<String>,
        /// Maximum requests in flight at once (overrides config).
        #[arg(long, short = 'c', value_name = "N")]
        concurrency: Option<usize>,
        /// Per-attempt timeout in seconds (overrides config).
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// Total attempts per URL, including the first (overrides config).
        #[arg(long, value_name = "N")]
        max_retries: Option<u32>,
        /// Print results as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration (password redacted) and its path.
    Config,

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },

    /// Print the man page (roff) to stdout.
    Man,
}

fn load_config(path: Option<&Path>) -> Result<(FetchConfig, PathBuf)> {
    let (mut cfg, path) = match path {
        Some(p) => (config::load_from_path(p)?, p.to_path_buf()),
        None => {
            let p = config::config_path()?;
            (config::load_or_init_at(&p)?, p)
        }
    };
    cfg.apply_env();
    tracing::debug!("loaded config: {:?}", cfg);
    Ok((cfg, path))
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Fetch {
                urls,
                concurrency,
                timeout,
                max_retries,
                json,
            } => {
                let (cfg, _) = load_config(cli.config.as_deref())?;
                let args = FetchArgs {
                    urls,
                    concurrency,
                    timeout_secs: timeout,
                    max_retries,
                    json,
                };
                run_fetch(cfg, args).await?;
            }
            CliCommand::Config => {
                let (cfg, path) = load_config(cli.config.as_deref())?;
                run_show_config(&cfg, &path)?;
            }
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
