//! Host tool availability checks.

use crate::config::Config;
use crate::process;

use super::types::CheckResult;

/// Tools every build step depends on, with package hints.
pub const REQUIRED_TOOLS: [(&str, &str, &str); 12] = [
    ("curl", "curl", "Required to download the base image"),
    ("xz", "xz-utils", "Required to decompress and compress images"),
    ("sfdisk", "util-linux", "Required to rewrite the partition table"),
    ("losetup", "util-linux", "Required to attach the image as a loop device"),
    ("mount", "util-linux", "Required to mount image partitions"),
    ("umount", "util-linux", "Required to unmount image partitions"),
    ("chroot", "coreutils", "Required to run the provisioning script"),
    ("rsync", "rsync", "Required to copy overlay trees"),
    ("e2fsck", "e2fsprogs", "Required to check the root filesystem"),
    ("resize2fs", "e2fsprogs", "Required to grow the root filesystem"),
    ("zerofree", "zerofree", "Required to zero free blocks before compression"),
    ("udevadm", "systemd", "Required to wait for loop partition nodes"),
];

/// Check host tools are installed.
pub fn check_host_tools(config: &Config) -> Vec<CheckResult> {
    let mut results = Vec::new();

    for (tool, package, purpose) in REQUIRED_TOOLS {
        results.push(check_tool_exists(tool, package, purpose, true));
    }

    // Optional tools
    let optional_tools = [
        ("unzip", "unzip", "Required only for .zip base images"),
        ("gzip", "gzip", "Required only for .img.gz base images"),
        ("git", "git", "Used to derive the version tag"),
    ];

    for (tool, package, purpose) in optional_tools {
        results.push(check_tool_exists(tool, package, purpose, false));
    }

    // Configured QEMU binary, when set
    if let Some(qemu) = &config.qemu_binary {
        if qemu.is_file() {
            results.push(CheckResult::pass_with(
                "qemu binary",
                &qemu.display().to_string(),
            ));
        } else {
            results.push(CheckResult::fail(
                "qemu binary",
                &format!(
                    "PIFORGE_QEMU_BINARY is set but {} does not exist",
                    qemu.display()
                ),
            ));
        }
    }

    results
}

/// Check if a tool exists in PATH.
fn check_tool_exists(tool: &str, package: &str, purpose: &str, required: bool) -> CheckResult {
    match process::which(tool) {
        Some(path) => CheckResult::pass_with(tool, &path),
        None => {
            let msg = format!("Not found. Install '{}' package. {}", package, purpose);
            if required {
                CheckResult::fail(tool, &msg)
            } else {
                CheckResult::warn(tool, &msg)
            }
        }
    }
}
