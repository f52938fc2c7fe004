//! Image finalization: zero free space, compress, manifest.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::checksum::sha256_file;
use crate::process::Cmd;

/// Overwrite unused blocks of the (unmounted) root filesystem with zeros
/// so the compressed image shrinks.
pub fn zero_free_blocks(device: &str) -> Result<()> {
    println!("  Zeroing free blocks on {}...", device);
    Cmd::new("zerofree")
        .arg(device)
        .error_msg("zerofree failed")
        .run()?;
    Ok(())
}

/// Compress the raw image into `output_dir/<artifact>`.
///
/// xz compresses in place (raw -> raw.xz in the work dir), then the
/// result moves to the output directory under its versioned name.
pub fn compress_image(raw: &Path, output_dir: &Path, artifact: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    println!("  Compressing image with xz (this may take a while)...");
    Cmd::new("xz")
        .args(["-T0", "-f"])
        .arg_path(raw)
        .error_msg("Image compression failed")
        .run_interactive()?;

    let compressed = xz_output_path(raw);
    if !compressed.exists() {
        bail!("xz finished but {} does not exist", compressed.display());
    }

    let dest = output_dir.join(artifact);
    fs::rename(&compressed, &dest).with_context(|| {
        format!(
            "Failed to move {} to {}",
            compressed.display(),
            dest.display()
        )
    })?;

    Ok(dest)
}

/// Compute the SHA-256 of the finished artifact (for the manifest).
pub fn output_checksum(artifact: &Path) -> Result<String> {
    println!("  Hashing {}...", artifact.display());
    sha256_file(artifact)
}

fn xz_output_path(raw: &Path) -> PathBuf {
    let mut name = raw.as_os_str().to_os_string();
    name.push(".xz");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xz_output_path() {
        assert_eq!(
            xz_output_path(Path::new("/work/base.img")),
            Path::new("/work/base.img.xz")
        );
    }
}
