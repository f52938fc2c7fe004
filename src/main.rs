//! Piforge - custom bootable disk image builder for single-board computers.
//!
//! One linear, host-privileged pipeline:
//! download -> verify -> repartition -> loop-mount -> overlay copy ->
//! chroot provision -> zerofree -> compress
#![allow(dead_code, unused_imports)]

mod checksum;
mod clean;
mod commands;
mod common;
mod config;
mod download;
mod image;
mod manifest;
mod preflight;
mod process;
mod unpack;
mod version;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use config::Config;

#[derive(Parser)]
#[command(name = "piforge")]
#[command(about = "Custom bootable disk image builder for single-board computers")]
#[command(
    after_help = "QUICK START:\n  piforge preflight                  Check host tools and privileges\n  sudo piforge build URL SHA256 TAG  Build a provisioned image\n  piforge clean                      Remove build artifacts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a provisioned image from a base image (requires root)
    Build {
        /// Source base image URL
        url: String,
        /// Expected SHA-256 checksum of the base image
        sha256: String,
        /// Architecture / image-suffix tag embedded in the output name
        suffix: String,
    },

    /// Download and verify a base image (usually automatic)
    Download {
        /// Source base image URL
        url: String,
        /// Expected SHA-256 checksum of the base image
        sha256: String,
    },

    /// Clean build artifacts (default: preserves downloads)
    Clean {
        #[command(subcommand)]
        what: Option<CleanTarget>,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },

    /// Run preflight checks (verify host tools before build)
    Preflight {
        /// Fail if any checks fail (exit code 1)
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum CleanTarget {
    /// Clean downloaded base images (~/.cache/piforge/)
    Downloads,
    /// Clean everything (downloads + outputs + work)
    All,
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show current configuration
    Config,
    /// Show the version tag the next build would embed
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let base_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    // Load .env if present
    dotenvy::dotenv().ok();
    let config = Config::load(&base_dir);

    match cli.command {
        Commands::Build {
            url,
            sha256,
            suffix,
        } => {
            commands::cmd_build(&base_dir, &url, &sha256, &suffix, &config)?;
        }

        Commands::Download { url, sha256 } => {
            commands::cmd_download(&url, &sha256, &config)?;
        }

        Commands::Clean { what } => {
            let clean_target = match what {
                None => commands::clean::CleanTarget::Outputs,
                Some(CleanTarget::Downloads) => commands::clean::CleanTarget::Downloads,
                Some(CleanTarget::All) => commands::clean::CleanTarget::All,
            };
            commands::cmd_clean(&base_dir, clean_target, &config)?;
        }

        Commands::Show { what } => {
            let show_target = match what {
                ShowTarget::Config => commands::show::ShowTarget::Config,
                ShowTarget::Version => commands::show::ShowTarget::Version,
            };
            commands::cmd_show(&base_dir, show_target, &config)?;
        }

        Commands::Preflight { strict } => {
            commands::cmd_preflight(&config, strict)?;
        }
    }

    Ok(())
}
