//! Build command - runs the whole image assembly pipeline.

use anyhow::Result;
use std::path::Path;
use std::time::Instant;

use crate::common::temp;
use crate::config::Config;
use crate::download;
use crate::image::{self, BuildRequest};
use crate::preflight;
use crate::unpack;
use crate::version;

/// Execute the build command.
pub fn cmd_build(
    base_dir: &Path,
    url: &str,
    sha256: &str,
    suffix: &str,
    config: &Config,
) -> Result<()> {
    println!("=== piforge image build ===\n");
    let build_start = Instant::now();

    // Fail before any download or OS state if the host can't finish.
    preflight::require_build_tools(config)?;

    let tag = version::version_tag(base_dir);
    println!("  Version tag: {}", tag);
    println!("  Suffix:      {}", suffix);
    println!("  Base image:  {}\n", url);

    println!("=== Fetching base image ===");
    let cached = download::fetch(url, sha256, &config.downloads_dir)?;

    println!("\n=== Unpacking ===");
    let work_dir = temp::prepare_work_dir(base_dir, "work")?;
    let raw_img = unpack::unpack(&cached, &work_dir)?;

    let request = BuildRequest {
        url: url.to_string(),
        sha256: sha256.to_string(),
        suffix: suffix.to_string(),
        tag,
    };
    let artifact = image::build_image(&request, config, &raw_img, &work_dir)?;

    if config.keep_work {
        println!("\n  Work directory preserved: {}", work_dir.display());
    } else {
        temp::cleanup_work_dir(&work_dir);
    }

    let total = build_start.elapsed().as_secs_f64();
    if total >= 60.0 {
        println!("\n=== Build Complete ({:.1}m) ===", total / 60.0);
    } else {
        println!("\n=== Build Complete ({:.1}s) ===", total);
    }
    println!("  Output: {}", artifact.display());

    Ok(())
}
