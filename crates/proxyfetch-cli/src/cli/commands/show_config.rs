//! `proxyfetch config` – show the effective configuration.

use anyhow::Result;
use proxyfetch_core::config::FetchConfig;
use std::path::Path;

pub fn run_show_config(cfg: &FetchConfig, path: &Path) -> Result<()> {
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(&cfg.redacted())?);
    Ok(())
}
