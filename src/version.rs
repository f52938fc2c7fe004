//! Version tagging from source-control metadata.
//!
//! Output images are named after the current git describe of the piforge
//! checkout, so every artifact can be traced back to the commit that
//! produced it.

use crate::process::Cmd;

/// Fallback tag when git is unavailable or the base dir is not a checkout.
pub const UNTAGGED: &str = "untagged";

/// Derive the version tag from source-control metadata.
///
/// Uses `git describe --tags --always --dirty`; falls back to `untagged`
/// when that fails for any reason.
pub fn version_tag(base_dir: &std::path::Path) -> String {
    let result = Cmd::new("git")
        .arg("-C")
        .arg_path(base_dir)
        .args(["describe", "--tags", "--always", "--dirty"])
        .allow_fail()
        .run();

    match result {
        Ok(r) if r.success() && !r.stdout_trimmed().is_empty() => {
            r.stdout_trimmed().to_string()
        }
        _ => UNTAGGED.to_string(),
    }
}

/// Compose the output artifact filename.
pub fn artifact_name(dist_name: &str, tag: &str, suffix: &str) -> String {
    format!("{}-{}-{}.img.xz", dist_name, tag, suffix)
}
