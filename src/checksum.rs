//! SHA-256 checksum helpers.
//!
//! Streaming hashing so multi-GB base images never have to fit in memory.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Compute the SHA-256 of a file as lower-case hex.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open {} for hashing", path.display()))?;
    let mut reader = std::io::BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read {} while hashing", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Verify the SHA-256 checksum of a downloaded file.
///
/// On mismatch the file is deleted so a corrupt download is never reused,
/// and an error describing both checksums is returned.
pub fn verify_checksum(file_path: &Path, expected_sha256: &str) -> Result<()> {
    println!("Verifying SHA256 checksum...");

    let expected = expected_sha256.trim().to_ascii_lowercase();
    let actual = sha256_file(file_path)?;

    if actual != expected {
        fs::remove_file(file_path).with_context(|| {
            format!(
                "Failed to delete corrupt download {}",
                file_path.display()
            )
        })?;
        bail!(
            "Checksum mismatch!\n  Expected: {}\n  Got: {}\n\
             The download may be corrupted. Deleted partial file.",
            expected,
            actual
        );
    }

    println!("Checksum verified OK");
    Ok(())
}
