//! Overlay injection and version-info.
//!
//! The skeleton tree is copied onto the mounted root first, then the
//! optional custom overlay on top, so custom files win any conflict.
//! Both copies preserve ownership and modes (rsync -a).

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::process::Cmd;

/// Copy an overlay tree onto the mounted root filesystem.
///
/// The trailing slash on the source makes rsync copy the tree's contents
/// rather than the tree directory itself.
pub fn apply_overlay(source: &Path, root: &Path, label: &str) -> Result<()> {
    if !source.is_dir() {
        bail!(
            "{} overlay directory not found at {}",
            label,
            source.display()
        );
    }

    println!(
        "  Applying {} overlay ({} files)...",
        label,
        file_count(source)
    );

    Cmd::new("rsync")
        .args(["-a", "--keep-dirlinks"])
        .arg(format!("{}/", source.display()))
        .arg_path(root)
        .error_msg(format!("Failed to copy {} overlay", label))
        .run()?;

    Ok(())
}

/// Count regular files in an overlay tree.
pub fn file_count(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}

/// Render the version-info file content.
pub fn render_version_info(dist_name: &str, tag: &str, suffix: &str, base_url: &str) -> String {
    format!(
        "DIST_NAME={}\nVERSION={}\nSUFFIX={}\nBASE_IMAGE_URL={}\n",
        dist_name, tag, suffix, base_url
    )
}

/// Write `/etc/version-info` inside the mounted image.
pub fn write_version_info(
    root: &Path,
    dist_name: &str,
    tag: &str,
    suffix: &str,
    base_url: &str,
) -> Result<()> {
    let etc = root.join("etc");
    fs::create_dir_all(&etc)
        .with_context(|| format!("Failed to create {}", etc.display()))?;

    let path = etc.join("version-info");
    fs::write(&path, render_version_info(dist_name, tag, suffix, base_url))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("  Wrote /etc/version-info ({})", tag);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_version_info() {
        let info = render_version_info(
            "piforge",
            "v2.0.1",
            "armhf",
            "https://example.com/base.img.xz",
        );
        assert_eq!(
            info,
            "DIST_NAME=piforge\nVERSION=v2.0.1\nSUFFIX=armhf\n\
             BASE_IMAGE_URL=https://example.com/base.img.xz\n"
        );
    }

    #[test]
    fn test_write_version_info_destination() {
        let dir = tempfile::tempdir().unwrap();
        write_version_info(dir.path(), "piforge", "v1.0", "arm64", "http://x/y.img").unwrap();

        let content = std::fs::read_to_string(dir.path().join("etc/version-info")).unwrap();
        assert!(content.contains("VERSION=v1.0"));
        assert!(content.contains("SUFFIX=arm64"));
    }

    #[test]
    fn test_file_count() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("etc/profile.d")).unwrap();
        std::fs::write(dir.path().join("etc/motd"), "hi").unwrap();
        std::fs::write(dir.path().join("etc/profile.d/a.sh"), "true").unwrap();

        assert_eq!(file_count(dir.path()), 2);
    }

    #[test]
    fn test_apply_overlay_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = apply_overlay(&dir.path().join("nope"), dir.path(), "skeleton").unwrap_err();
        assert!(err.to_string().contains("overlay directory not found"));
    }
}
