//! Mount bookkeeping for the image build.
//!
//! Every successful mount is recorded so teardown can unmount in reverse
//! order. Unmounting is unconditional and ignores individual failures;
//! an already-unmounted path is tolerated, not treated as an error.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::process::Cmd;

/// Stack of active mount points, unwound in reverse order.
#[derive(Debug, Default)]
pub struct MountStack {
    mounted: Vec<PathBuf>,
}

impl MountStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a block device at `target`, creating the mount point.
    pub fn mount(&mut self, device: &str, target: &Path) -> Result<()> {
        fs::create_dir_all(target)
            .with_context(|| format!("Failed to create mount point {}", target.display()))?;

        Cmd::new("mount")
            .arg(device)
            .arg_path(target)
            .error_msg(format!("Failed to mount {}", device))
            .run()?;

        println!("  Mounted {} at {}", device, target.display());
        self.mounted.push(target.to_path_buf());
        Ok(())
    }

    /// Bind-mount a host directory at `target` (for the chroot).
    pub fn bind(&mut self, source: &str, target: &Path) -> Result<()> {
        fs::create_dir_all(target)
            .with_context(|| format!("Failed to create bind point {}", target.display()))?;

        Cmd::new("mount")
            .arg("--bind")
            .arg(source)
            .arg_path(target)
            .error_msg(format!("Failed to bind mount {}", source))
            .run()?;

        self.mounted.push(target.to_path_buf());
        Ok(())
    }

    /// Unmount everything in reverse order, ignoring failures.
    ///
    /// Drains the stack, so calling this twice is a no-op the second time.
    pub fn unmount_all(&mut self) {
        while let Some(target) = self.mounted.pop() {
            let _ = Cmd::new("umount").arg_path(&target).allow_fail().run();
        }
    }

    /// Number of currently recorded mounts.
    pub fn depth(&self) -> usize {
        self.mounted.len()
    }
}
