//! Image assembly pipeline.
//!
//! Linear, host-privileged sequence over one raw image:
//! grow -> repartition -> loop-attach -> filesystem resize -> mount ->
//! overlay -> chroot provision -> unmount -> zerofree -> detach ->
//! compress. Every step is a direct invocation of a standard OS utility;
//! the cleanup guard plays the role of a shell EXIT trap.

pub mod chroot;
pub mod cleanup;
pub mod expand;
pub mod finalize;
pub mod loopdev;
pub mod mount;
pub mod overlay;

pub use cleanup::CleanupGuard;
pub use loopdev::LoopDevice;
pub use mount::MountStack;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::manifest::BuildManifest;
use crate::version;

/// Host directories bind-mounted into the image for the chroot.
const BIND_MOUNTS: [&str; 4] = ["dev", "dev/pts", "proc", "sys"];

/// What to build, straight from the command line plus the version tag.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Source image URL (recorded in version-info and the manifest).
    pub url: String,
    /// Expected SHA-256 of the base image.
    pub sha256: String,
    /// Architecture / image-suffix tag.
    pub suffix: String,
    /// Source-control version tag.
    pub tag: String,
}

/// Run the whole pipeline on an unpacked raw image.
///
/// Returns the path of the compressed output artifact.
pub fn build_image(
    req: &BuildRequest,
    config: &Config,
    raw_img: &Path,
    work_dir: &Path,
) -> Result<PathBuf> {
    println!("\n=== Expanding base image ===");
    expand::grow_image(raw_img, config.expand_mb)?;
    let table = expand::read_partition_table(raw_img)?;
    expand::expand_root_partition(raw_img, &table)?;

    // From here on there is OS state to undo. The guard tears it down
    // exactly once, on whichever path leaves this function.
    let mut guard = CleanupGuard::new();
    let root_part = stage_and_provision(&mut guard, req, config, raw_img, work_dir, &table)?;

    println!("\n=== Finalizing image ===");
    guard.unmount_all();
    finalize::zero_free_blocks(&root_part)?;
    guard.run();

    let raw_size = fs::metadata(raw_img)
        .with_context(|| format!("Failed to stat {}", raw_img.display()))?
        .len();

    let artifact = version::artifact_name(&config.dist_name, &req.tag, &req.suffix);
    let dest = finalize::compress_image(raw_img, &config.output_dir, &artifact)?;
    let output_sha256 = finalize::output_checksum(&dest)?;

    let manifest = BuildManifest {
        dist_name: config.dist_name.clone(),
        version_tag: req.tag.clone(),
        suffix: req.suffix.clone(),
        base_url: req.url.clone(),
        base_sha256: req.sha256.trim().to_ascii_lowercase(),
        output: artifact.clone(),
        output_sha256,
        raw_size_bytes: raw_size,
    };
    let manifest_path = config.output_dir.join(manifest_name(&artifact));
    manifest.write(&manifest_path)?;
    println!("  Manifest: {}", manifest_path.display());

    Ok(dest)
}

/// Attach, resize, mount, overlay and provision. Returns the root
/// partition device for the later zerofree pass.
fn stage_and_provision(
    guard: &mut CleanupGuard,
    req: &BuildRequest,
    config: &Config,
    raw_img: &Path,
    work_dir: &Path,
    table: &expand::PartitionTable,
) -> Result<String> {
    println!("\n=== Attaching image ===");
    let loop_dev = LoopDevice::attach(raw_img)?;
    let root_n = table.root_partition_number();
    let root_part = loop_dev.partition(root_n);
    let boot_part = (root_n > 1).then(|| loop_dev.partition(1));
    guard.set_loop(loop_dev);

    expand::resize_filesystem(&root_part)?;

    println!("\n=== Mounting partitions ===");
    let root = work_dir.join("mnt");
    guard.mounts.mount(&root_part, &root)?;
    if let Some(boot) = &boot_part {
        guard.mounts.mount(boot, &root.join(&config.boot_mount))?;
    }
    for bind in BIND_MOUNTS {
        guard.mounts.bind(&format!("/{}", bind), &root.join(bind))?;
    }

    println!("\n=== Injecting overlays ===");
    overlay::apply_overlay(&config.skeleton_dir, &root, "skeleton")?;
    if let Some(custom) = &config.custom_overlay_dir {
        overlay::apply_overlay(custom, &root, "custom")?;
    }
    overlay::write_version_info(&root, &config.dist_name, &req.tag, &req.suffix, &req.url)?;

    println!("\n=== Provisioning (chroot) ===");
    chroot::provision(&root, &config.provision_script, config.qemu_binary.as_deref())?;

    Ok(root_part)
}

/// Manifest filename for an artifact: base.img.xz -> base.manifest.json.
pub fn manifest_name(artifact: &str) -> String {
    format!(
        "{}.manifest.json",
        artifact.trim_end_matches(".img.xz")
    )
}
