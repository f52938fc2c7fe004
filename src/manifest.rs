//! Build manifest written next to every finished image.
//!
//! Machine-readable record of what was built from what, so operators can
//! audit an artifact without digging through build logs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything worth knowing about one finished image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildManifest {
    /// Distribution name (PIFORGE_DIST_NAME).
    pub dist_name: String,
    /// Source-control version tag embedded in the filename.
    pub version_tag: String,
    /// Architecture / image-suffix tag from the command line.
    pub suffix: String,
    /// URL the base image was fetched from.
    pub base_url: String,
    /// Expected SHA-256 of the base image.
    pub base_sha256: String,
    /// Filename of the compressed output image.
    pub output: String,
    /// SHA-256 of the compressed output image.
    pub output_sha256: String,
    /// Uncompressed image size in bytes.
    pub raw_size_bytes: u64,
}

impl BuildManifest {
    /// Write the manifest as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize build manifest")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
        Ok(())
    }

    /// Read a manifest back from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BuildManifest {
        BuildManifest {
            dist_name: "piforge".to_string(),
            version_tag: "v0.3.0".to_string(),
            suffix: "arm64".to_string(),
            base_url: "https://example.com/base.img.xz".to_string(),
            base_sha256: "ab".repeat(32),
            output: "piforge-v0.3.0-arm64.img.xz".to_string(),
            output_sha256: "cd".repeat(32),
            raw_size_bytes: 4 * 1024 * 1024 * 1024,
        }
    }

    #[test]
    fn test_manifest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.manifest.json");

        let manifest = sample();
        manifest.write(&path).unwrap();
        let back = BuildManifest::read(&path).unwrap();

        assert_eq!(back, manifest);
    }

    #[test]
    fn test_manifest_is_readable_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.manifest.json");
        sample().write(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"version_tag\": \"v0.3.0\""));
        assert!(raw.contains("\"suffix\": \"arm64\""));
    }
}
