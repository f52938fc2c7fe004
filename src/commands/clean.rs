//! Clean command - removes build artifacts.

use anyhow::Result;
use std::path::Path;

use crate::clean;
use crate::config::Config;

/// Clean target for the clean command.
pub enum CleanTarget {
    /// Outputs and work directory (preserves downloads)
    Outputs,
    /// Download cache only
    Downloads,
    /// Everything
    All,
}

/// Execute the clean command.
pub fn cmd_clean(base_dir: &Path, target: CleanTarget, config: &Config) -> Result<()> {
    match target {
        CleanTarget::Outputs => clean::clean_outputs(base_dir, config),
        CleanTarget::Downloads => clean::clean_downloads(config),
        CleanTarget::All => clean::clean_all(base_dir, config),
    }
}
