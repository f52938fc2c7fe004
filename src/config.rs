//! Configuration management for piforge.
//!
//! Reads configuration from a .env file and environment variables.
//! Environment variables take precedence over the .env file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default amount of zero-fill appended to the base image, in MiB.
pub const DEFAULT_EXPAND_MB: u64 = 1024;

/// Piforge configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Distribution name embedded in artifact filenames and version-info.
    pub dist_name: String,
    /// Fixed overlay tree copied into every image (default: skeleton/)
    pub skeleton_dir: PathBuf,
    /// Optional second overlay tree, applied after the skeleton.
    pub custom_overlay_dir: Option<PathBuf>,
    /// Provisioning script executed inside the chroot.
    pub provision_script: PathBuf,
    /// MiB of zeros appended before the root partition is grown.
    pub expand_mb: u64,
    /// Mount point of the boot partition inside the root filesystem.
    pub boot_mount: String,
    /// Optional static emulator copied into the image for foreign-arch chroots.
    pub qemu_binary: Option<PathBuf>,
    /// Keep the work directory after a successful build.
    pub keep_work: bool,
    /// Where downloaded base images are cached.
    pub downloads_dir: PathBuf,
    /// Where finished artifacts are written.
    pub output_dir: PathBuf,
}

impl Config {
    /// Load configuration from .env file and environment.
    ///
    /// The .env file is looked up in the piforge base directory; real
    /// environment variables override anything it defines.
    pub fn load(base_dir: &Path) -> Self {
        let mut env_vars = HashMap::new();

        // Try to load .env file
        let env_path = base_dir.join(".env");
        if env_path.exists() {
            if let Ok(content) = fs::read_to_string(&env_path) {
                for line in content.lines() {
                    let line = line.trim();
                    // Skip comments and empty lines
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    // Parse KEY=value
                    if let Some((key, value)) = line.split_once('=') {
                        let key = key.trim();
                        let value = value.trim();
                        // Remove quotes if present
                        let value = value.trim_matches('"').trim_matches('\'');
                        env_vars.insert(key.to_string(), value.to_string());
                    }
                }
            }
        }

        // Environment variables override .env file
        for (key, value) in std::env::vars() {
            env_vars.insert(key, value);
        }

        let resolve = |s: &String| {
            let path = PathBuf::from(s);
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        };

        let dist_name = env_vars
            .get("PIFORGE_DIST_NAME")
            .cloned()
            .unwrap_or_else(|| "piforge".to_string());

        let skeleton_dir = env_vars
            .get("PIFORGE_SKELETON_DIR")
            .map(resolve)
            .unwrap_or_else(|| base_dir.join("skeleton"));

        let custom_overlay_dir = env_vars
            .get("PIFORGE_CUSTOM_OVERLAY_DIR")
            .filter(|s| !s.is_empty())
            .map(resolve);

        let provision_script = env_vars
            .get("PIFORGE_PROVISION_SCRIPT")
            .map(resolve)
            .unwrap_or_else(|| base_dir.join("provision/provision.sh"));

        let expand_mb = env_vars
            .get("PIFORGE_EXPAND_MB")
            .map(|s| match s.parse::<u64>() {
                Ok(mb) => mb,
                Err(_) => {
                    eprintln!(
                        "  [WARN] PIFORGE_EXPAND_MB is not a number ({}), using {} MiB",
                        s, DEFAULT_EXPAND_MB
                    );
                    DEFAULT_EXPAND_MB
                }
            })
            .unwrap_or(DEFAULT_EXPAND_MB);

        let boot_mount = env_vars
            .get("PIFORGE_BOOT_MOUNT")
            .cloned()
            .unwrap_or_else(|| "boot".to_string());

        let qemu_binary = env_vars
            .get("PIFORGE_QEMU_BINARY")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let keep_work = env_vars
            .get("PIFORGE_KEEP_WORK")
            .map(|s| s == "1" || s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes"))
            .unwrap_or(false);

        // Base images are multi-GB; cache them per-user so every checkout
        // shares one copy.
        let downloads_dir = env_vars
            .get("PIFORGE_DOWNLOAD_DIR")
            .map(resolve)
            .unwrap_or_else(|| {
                dirs::cache_dir()
                    .map(|c| c.join("piforge/downloads"))
                    .unwrap_or_else(|| base_dir.join("downloads"))
            });

        let output_dir = env_vars
            .get("PIFORGE_OUTPUT_DIR")
            .map(resolve)
            .unwrap_or_else(|| base_dir.join("output"));

        Self {
            dist_name,
            skeleton_dir,
            custom_overlay_dir,
            provision_script,
            expand_mb,
            boot_mount,
            qemu_binary,
            keep_work,
            downloads_dir,
            output_dir,
        }
    }

    /// Print configuration for `show config`.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  PIFORGE_DIST_NAME: {}", self.dist_name);
        println!("  PIFORGE_SKELETON_DIR: {}", self.skeleton_dir.display());
        match &self.custom_overlay_dir {
            Some(dir) => println!("  PIFORGE_CUSTOM_OVERLAY_DIR: {}", dir.display()),
            None => println!("  PIFORGE_CUSTOM_OVERLAY_DIR: (unset)"),
        }
        println!(
            "  PIFORGE_PROVISION_SCRIPT: {}",
            self.provision_script.display()
        );
        println!("  PIFORGE_EXPAND_MB: {}", self.expand_mb);
        println!("  PIFORGE_BOOT_MOUNT: {}", self.boot_mount);
        match &self.qemu_binary {
            Some(bin) => println!("  PIFORGE_QEMU_BINARY: {}", bin.display()),
            None => println!("  PIFORGE_QEMU_BINARY: (unset)"),
        }
        println!("  PIFORGE_KEEP_WORK: {}", self.keep_work);
        println!("  PIFORGE_DOWNLOAD_DIR: {}", self.downloads_dir.display());
        println!("  PIFORGE_OUTPUT_DIR: {}", self.output_dir.display());
        if self.skeleton_dir.is_dir() {
            println!("  Skeleton: FOUND");
        } else {
            println!("  Skeleton: NOT FOUND");
        }
        if self.provision_script.is_file() {
            println!("  Provision script: FOUND");
        } else {
            println!("  Provision script: NOT FOUND");
        }
    }
}
