//! Base image unpacking.
//!
//! Vendors ship SBC images as .img.xz, .zip, .img.gz or bare .img.
//! Whatever arrives, the work directory ends up with one raw image file.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::process::Cmd;

/// Compression wrapper around the raw image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseFormat {
    Xz,
    Zip,
    Gzip,
    Raw,
}

/// Classify a downloaded base image by file extension.
pub fn detect_format(path: &Path) -> Result<BaseFormat> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if name.ends_with(".img.xz") || name.ends_with(".xz") {
        Ok(BaseFormat::Xz)
    } else if name.ends_with(".zip") {
        Ok(BaseFormat::Zip)
    } else if name.ends_with(".img.gz") || name.ends_with(".gz") {
        Ok(BaseFormat::Gzip)
    } else if name.ends_with(".img") {
        Ok(BaseFormat::Raw)
    } else {
        bail!(
            "Unsupported base image format: {} (expected .img, .img.xz, .img.gz or .zip)",
            path.display()
        );
    }
}

/// Unpack the cached base image into `work_dir`, returning the raw image path.
///
/// The cached download is never modified; decompression happens on a copy
/// inside the work directory.
pub fn unpack(source: &Path, work_dir: &Path) -> Result<PathBuf> {
    let format = detect_format(source)?;
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "base.img".to_string());

    match format {
        BaseFormat::Raw => {
            let dest = work_dir.join(&file_name);
            println!("Copying raw base image into work directory...");
            fs::copy(source, &dest).with_context(|| {
                format!("Failed to copy {} into work directory", source.display())
            })?;
            Ok(dest)
        }
        BaseFormat::Xz => {
            let compressed = work_dir.join(&file_name);
            fs::copy(source, &compressed)?;
            println!("Decompressing {} (xz)...", file_name);
            Cmd::new("xz")
                .args(["-d", "-T0"])
                .arg_path(&compressed)
                .error_msg("xz decompression failed")
                .run()?;
            let raw = compressed.with_extension("");
            ensure_unpacked(&raw)
        }
        BaseFormat::Gzip => {
            let compressed = work_dir.join(&file_name);
            fs::copy(source, &compressed)?;
            println!("Decompressing {} (gzip)...", file_name);
            Cmd::new("gzip")
                .arg("-d")
                .arg_path(&compressed)
                .error_msg("gzip decompression failed")
                .run()?;
            let raw = compressed.with_extension("");
            ensure_unpacked(&raw)
        }
        BaseFormat::Zip => {
            println!("Extracting {} (zip)...", file_name);
            Cmd::new("unzip")
                .arg("-o")
                .arg_path(source)
                .arg("-d")
                .arg_path(work_dir)
                .error_msg("zip extraction failed")
                .run()?;
            find_extracted_img(work_dir)
        }
    }
}

fn ensure_unpacked(raw: &Path) -> Result<PathBuf> {
    if !raw.exists() {
        bail!(
            "Decompression finished but {} does not exist",
            raw.display()
        );
    }
    Ok(raw.to_path_buf())
}

/// Locate the single .img file a zip archive extracted into the work dir.
fn find_extracted_img(work_dir: &Path) -> Result<PathBuf> {
    let mut images = Vec::new();
    for entry in walkdir::WalkDir::new(work_dir)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .map(|e| e.eq_ignore_ascii_case("img"))
                .unwrap_or(false)
        {
            images.push(entry.path().to_path_buf());
        }
    }

    match images.len() {
        0 => bail!("Zip archive did not contain a .img file"),
        1 => Ok(images.remove(0)),
        n => bail!("Zip archive contained {} .img files, expected exactly one", n),
    }
}
