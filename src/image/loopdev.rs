//! Loop device lifecycle.
//!
//! The raw image is attached with partition scanning so the kernel
//! exposes /dev/loopNp1, /dev/loopNp2, ... for mounting. Detach is
//! best-effort on drop; the cleanup guard calls it explicitly first.

use anyhow::{bail, Result};
use std::path::Path;

use crate::process::Cmd;

/// An attached loop device. Detached on drop if not detached explicitly.
#[derive(Debug)]
pub struct LoopDevice {
    device: String,
    detached: bool,
}

impl LoopDevice {
    /// Attach `img` to a free loop device with partition scanning.
    pub fn attach(img: &Path) -> Result<Self> {
        let result = Cmd::new("losetup")
            .args(["--find", "--show", "--partscan"])
            .arg_path(img)
            .error_msg("Failed to attach loop device")
            .run()?;

        let device = result.stdout_trimmed().to_string();
        if !device.starts_with("/dev/loop") {
            bail!("losetup returned an unexpected device name: {}", device);
        }
        println!("  Image attached at {}", device);

        // Give udev a chance to surface the partition nodes (best-effort).
        let _ = Cmd::new("udevadm").arg("settle").allow_fail().run();

        Ok(Self {
            device,
            detached: false,
        })
    }

    /// The loop device path, e.g. /dev/loop3.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Path of partition `n` (1-based), e.g. /dev/loop3p2.
    pub fn partition(&self, n: usize) -> String {
        format!("{}p{}", self.device, n)
    }

    /// Best-effort detach, ignoring failures. Used by cleanup.
    pub fn detach_quiet(mut self) {
        self.detached = true;
        let _ = Cmd::new("losetup")
            .arg("-d")
            .arg(&self.device)
            .allow_fail()
            .run();
    }
}

impl Drop for LoopDevice {
    fn drop(&mut self) {
        if !self.detached {
            let _ = Cmd::new("losetup")
                .arg("-d")
                .arg(&self.device)
                .allow_fail()
                .run();
        }
    }
}
