//! Base image download and caching.
//!
//! Base images are fetched with curl into a per-user cache and verified
//! against the operator-supplied SHA-256. A cached image that fails its
//! checksum is thrown away and re-downloaded exactly once.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::checksum::verify_checksum;
use crate::process::Cmd;

/// Fetch the base image for `url`, using the cache when possible.
///
/// Returns the path of a file whose checksum matched `expected_sha256`.
/// No other build state is touched before verification succeeds.
pub fn fetch(url: &str, expected_sha256: &str, downloads_dir: &Path) -> Result<PathBuf> {
    let dest = downloads_dir.join(file_name_from_url(url)?);
    fs::create_dir_all(downloads_dir).with_context(|| {
        format!(
            "Failed to create download cache {}",
            downloads_dir.display()
        )
    })?;

    if dest.exists() {
        println!("Base image already cached at {}", dest.display());
        match verify_checksum(&dest, expected_sha256) {
            Ok(()) => return Ok(dest),
            Err(e) => {
                // verify_checksum already removed the corrupt file
                eprintln!("  [WARN] Cached image failed verification: {:#}", e);
                println!("Re-downloading once...");
            }
        }
    }

    download(url, &dest)?;
    verify_checksum(&dest, expected_sha256)?;

    println!("Base image ready at {}", dest.display());
    Ok(dest)
}

/// Download `url` to `dest` with curl.
fn download(url: &str, dest: &Path) -> Result<()> {
    println!("Downloading {}...", url);

    let result = Cmd::new("curl")
        .args(["-L", "--fail", "--progress-bar", "-o"])
        .arg_path(dest)
        .arg(url)
        .error_msg("Base image download failed")
        .run_interactive();

    if result.is_err() {
        // A partial file must never be mistaken for a cached image.
        let _ = fs::remove_file(dest);
    }
    result.map(|_| ())
}

/// Derive the cache filename from the final URL path segment.
pub fn file_name_from_url(url: &str) -> Result<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let without_scheme = without_query
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_query);
    let name = without_scheme.rsplit('/').next().unwrap_or("");

    if name.is_empty() || !without_scheme.contains('/') {
        bail!("Cannot derive an image filename from URL: {}", url);
    }
    Ok(name.to_string())
}
