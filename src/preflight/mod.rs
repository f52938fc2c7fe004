//! Preflight checks for piforge builds.
//!
//! Validates host tools, privileges and configured inputs before any
//! OS-level state is touched. Run with `piforge preflight`.

mod environment;
mod host_tools;
mod types;

use anyhow::{bail, Result};

use crate::config::Config;
use crate::process;

pub use types::{CheckResult, CheckStatus, PreflightReport};

/// Run all preflight checks.
pub fn run_preflight(config: &Config) -> PreflightReport {
    let mut checks = Vec::new();

    println!("Running preflight checks...\n");

    println!("Checking host tools...");
    checks.extend(host_tools::check_host_tools(config));

    println!("Checking build environment...");
    checks.extend(environment::check_build_environment(config));

    println!();

    PreflightReport { checks }
}

/// Fast fail-first subset run at the start of every build: all required
/// tools present and effective uid 0.
pub fn require_build_tools(config: &Config) -> Result<()> {
    let mut missing = Vec::new();
    for (tool, package, _) in host_tools::REQUIRED_TOOLS {
        if !process::exists(tool) {
            missing.push(format!("{} (install '{}')", tool, package));
        }
    }

    if !missing.is_empty() {
        bail!(
            "Missing required host tools:\n  {}\n\
             Run 'piforge preflight' for the full report.",
            missing.join("\n  ")
        );
    }

    if environment::effective_uid() != 0 {
        bail!("piforge build must run as root (losetup/mount/chroot). Re-run under sudo.");
    }

    if !config.skeleton_dir.is_dir() {
        bail!(
            "Skeleton directory not found at {}",
            config.skeleton_dir.display()
        );
    }
    if !config.provision_script.is_file() {
        bail!(
            "Provisioning script not found at {}",
            config.provision_script.display()
        );
    }

    Ok(())
}
