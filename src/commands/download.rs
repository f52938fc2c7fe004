//! Download command - fetch and verify a base image without building.

use anyhow::Result;

use crate::config::Config;
use crate::download;

/// Execute the download command.
pub fn cmd_download(url: &str, sha256: &str, config: &Config) -> Result<()> {
    let path = download::fetch(url, sha256, &config.downloads_dir)?;
    println!("Base image: {} [OK]", path.display());
    Ok(())
}
