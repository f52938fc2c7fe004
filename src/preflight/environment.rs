//! Build environment checks: privileges, inputs, directories.

use crate::config::Config;

use super::types::CheckResult;

/// Check the build environment is usable.
pub fn check_build_environment(config: &Config) -> Vec<CheckResult> {
    let mut results = Vec::new();

    // Loop devices, mounts and chroot all need root.
    if effective_uid() == 0 {
        results.push(CheckResult::pass("running as root"));
    } else {
        results.push(CheckResult::fail(
            "running as root",
            "losetup/mount/chroot require root. Re-run under sudo.",
        ));
    }

    if config.skeleton_dir.is_dir() {
        results.push(CheckResult::pass_with(
            "skeleton directory",
            &config.skeleton_dir.display().to_string(),
        ));
    } else {
        results.push(CheckResult::fail(
            "skeleton directory",
            &format!("{} not found", config.skeleton_dir.display()),
        ));
    }

    match &config.custom_overlay_dir {
        Some(dir) if dir.is_dir() => {
            results.push(CheckResult::pass_with(
                "custom overlay",
                &dir.display().to_string(),
            ));
        }
        Some(dir) => {
            results.push(CheckResult::fail(
                "custom overlay",
                &format!(
                    "PIFORGE_CUSTOM_OVERLAY_DIR is set but {} does not exist",
                    dir.display()
                ),
            ));
        }
        None => {}
    }

    if config.provision_script.is_file() {
        results.push(CheckResult::pass_with(
            "provisioning script",
            &config.provision_script.display().to_string(),
        ));
    } else {
        results.push(CheckResult::fail(
            "provisioning script",
            &format!("{} not found", config.provision_script.display()),
        ));
    }

    results
}

/// Effective UID of this process.
pub fn effective_uid() -> u32 {
    // geteuid can never fail
    unsafe { libc::geteuid() }
}
