//! Shared test utilities for piforge tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment with temporary directories for overlays and a fake
/// mounted root.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Base directory (project root simulation)
    pub base_dir: PathBuf,
    /// Skeleton overlay source
    pub skeleton: PathBuf,
    /// Custom overlay source
    pub custom: PathBuf,
    /// Stands in for the mounted image root
    pub root: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let base_dir = base.to_path_buf();
        let skeleton = base.join("skeleton");
        let custom = base.join("custom");
        let root = base.join("root");

        for dir in [&skeleton, &custom, &root] {
            fs::create_dir_all(dir).expect("Failed to create test dir");
        }

        Self {
            _temp_dir: temp_dir,
            base_dir,
            skeleton,
            custom,
            root,
        }
    }
}

/// Write a file, creating parent directories as needed.
pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    fs::write(path, content).expect("Failed to write test file");
}

/// Assert a file exists and contains the given substring.
pub fn assert_file_contains(path: &Path, needle: &str) {
    assert!(path.is_file(), "expected file at {}", path.display());
    let content = fs::read_to_string(path).expect("Failed to read file");
    assert!(
        content.contains(needle),
        "{} does not contain {:?}\ncontent: {}",
        path.display(),
        needle,
        content
    );
}
