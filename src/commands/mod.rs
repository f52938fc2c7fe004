//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `build` - Assemble a custom image from a base image URL
//! - `download` - Fetch and verify a base image only
//! - `clean` - Clean build artifacts
//! - `show` - Display information
//! - `preflight` - Run preflight checks

pub mod build;
pub mod clean;
pub mod download;
mod preflight;
pub mod show;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use download::cmd_download;
pub use preflight::cmd_preflight;
pub use show::cmd_show;
