//! Show command - displays information.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::version;

/// Show target for the show command.
pub enum ShowTarget {
    /// Current configuration
    Config,
    /// Version tag the next build would embed
    Version,
}

/// Execute the show command.
pub fn cmd_show(base_dir: &Path, target: ShowTarget, config: &Config) -> Result<()> {
    match target {
        ShowTarget::Config => {
            config.print();
        }
        ShowTarget::Version => {
            println!("{}", version::version_tag(base_dir));
        }
    }
    Ok(())
}
