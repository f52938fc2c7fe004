//! Build artifact cleaning.

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::Config;

/// Clean build outputs and the work directory (preserves downloads).
pub fn clean_outputs(base_dir: &Path, config: &Config) -> Result<()> {
    let mut cleaned = false;

    if config.output_dir.exists() {
        println!("Removing {}...", config.output_dir.display());
        fs::remove_dir_all(&config.output_dir)?;
        cleaned = true;
    }

    let work_dir = base_dir.join("work");
    if work_dir.exists() {
        println!("Removing {}...", work_dir.display());
        fs::remove_dir_all(&work_dir)?;
        cleaned = true;
    }

    if cleaned {
        println!("Clean complete (downloads preserved).");
    } else {
        println!("Nothing to clean.");
    }
    Ok(())
}

/// Clean the download cache (base images are multi-GB).
pub fn clean_downloads(config: &Config) -> Result<()> {
    if config.downloads_dir.exists() {
        println!(
            "Removing download cache {}...",
            config.downloads_dir.display()
        );
        fs::remove_dir_all(&config.downloads_dir)?;
        println!("Downloads cleaned.");
    } else {
        println!("No downloads to clean.");
    }

    Ok(())
}

/// Clean everything (downloads + outputs + work).
pub fn clean_all(base_dir: &Path, config: &Config) -> Result<()> {
    clean_downloads(config)?;
    clean_outputs(base_dir, config)?;
    println!("\nFull clean complete.");
    Ok(())
}
