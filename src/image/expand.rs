//! Image growth and root partition expansion.
//!
//! The base image is enlarged by appending zeros, then the partition
//! table is rewritten with sfdisk so the last (root) partition runs to
//! the end of the image. sfdisk works directly on files, so no loop
//! device is needed yet.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::process::Cmd;

#[derive(Debug, Deserialize)]
struct SfdiskOutput {
    partitiontable: PartitionTable,
}

/// Partition table as reported by `sfdisk --json`.
#[derive(Debug, Clone, Deserialize)]
pub struct PartitionTable {
    /// Table label: "dos" or "gpt".
    pub label: String,
    pub partitions: Vec<Partition>,
}

/// One partition entry, in sectors.
#[derive(Debug, Clone, Deserialize)]
pub struct Partition {
    pub node: String,
    pub start: u64,
    pub size: u64,
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(default)]
    pub bootable: bool,
}

impl PartitionTable {
    /// Index (1-based) of the root partition: by convention the last one.
    pub fn root_partition_number(&self) -> usize {
        self.partitions.len()
    }
}

/// Append `expand_mb` MiB of zeros to the raw image (sparse).
pub fn grow_image(img: &Path, expand_mb: u64) -> Result<()> {
    let file = fs::OpenOptions::new()
        .write(true)
        .open(img)
        .with_context(|| format!("Failed to open {} for growing", img.display()))?;
    let current = file
        .metadata()
        .with_context(|| format!("Failed to stat {}", img.display()))?
        .len();
    let target = current + expand_mb * 1024 * 1024;

    file.set_len(target)
        .with_context(|| format!("Failed to grow {} to {} bytes", img.display(), target))?;

    println!(
        "  Image grown by {} MiB ({} MiB total)",
        expand_mb,
        target / 1024 / 1024
    );
    Ok(())
}

/// Read the partition table of a raw image via `sfdisk --json`.
pub fn read_partition_table(img: &Path) -> Result<PartitionTable> {
    let result = Cmd::new("sfdisk")
        .arg("--json")
        .arg_path(img)
        .error_msg("Failed to read partition table")
        .run()?;

    parse_partition_table(&result.stdout)
}

/// Parse `sfdisk --json` output.
pub fn parse_partition_table(json: &str) -> Result<PartitionTable> {
    let output: SfdiskOutput =
        serde_json::from_str(json).context("Failed to parse sfdisk --json output")?;
    let table = output.partitiontable;

    if table.partitions.is_empty() {
        bail!("Base image has no partitions");
    }
    Ok(table)
}

/// Render the sfdisk script that re-creates the table with the last
/// partition unsized, so it extends to the new end of the image.
pub fn render_expand_script(table: &PartitionTable) -> String {
    let mut script = format!("label: {}\n", table.label);

    let last = table.partitions.len() - 1;
    for (i, p) in table.partitions.iter().enumerate() {
        script.push_str(&format!("start={}", p.start));
        if i != last {
            script.push_str(&format!(", size={}", p.size));
        }
        script.push_str(&format!(", type={}", p.part_type));
        if p.bootable {
            script.push_str(", bootable");
        }
        script.push('\n');
    }
    script
}

/// Rewrite the partition table so the root partition fills the image.
pub fn expand_root_partition(img: &Path, table: &PartitionTable) -> Result<()> {
    let script = render_expand_script(table);
    println!(
        "  Expanding partition {} to fill the image...",
        table.root_partition_number()
    );

    Cmd::new("sfdisk")
        .arg_path(img)
        .stdin(script)
        .error_msg("Partition table rewrite failed")
        .run()?;

    Ok(())
}

/// Grow the root filesystem to match its expanded partition.
///
/// e2fsck exit codes 1 and 2 mean "errors corrected" and are fine;
/// 4 and above are real failures.
pub fn resize_filesystem(device: &str) -> Result<()> {
    println!("  Checking filesystem on {}...", device);
    let fsck = Cmd::new("e2fsck")
        .args(["-p", "-f"])
        .arg(device)
        .allow_fail()
        .run()?;
    if fsck.code() >= 4 {
        bail!(
            "e2fsck reported unrecoverable errors on {} (exit code {}):\n{}",
            device,
            fsck.code(),
            fsck.stderr_trimmed()
        );
    }

    println!("  Resizing filesystem on {}...", device);
    Cmd::new("resize2fs")
        .arg(device)
        .error_msg("Filesystem resize failed")
        .run()?;

    Ok(())
}
