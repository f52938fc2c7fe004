//! Unit tests for the piforge pipeline pieces.
//!
//! These exercise the pure and filesystem-only parts: checksum gating,
//! download caching, partition table handling, naming, and the cleanup
//! guard. Nothing here needs root or touches loop devices.

mod helpers;

use helpers::write_file;
use piforge::checksum::{sha256_file, verify_checksum};
use piforge::download::{fetch, file_name_from_url};
use piforge::image::cleanup::CleanupGuard;
use piforge::image::expand::{parse_partition_table, render_expand_script};
use piforge::image::manifest_name;
use piforge::manifest::BuildManifest;
use piforge::unpack::{detect_format, BaseFormat};
use piforge::version::{artifact_name, version_tag, UNTAGGED};
use std::fs;
use std::path::Path;

const BASE_CONTENT: &str = "base image contents\n";

fn sha_of(content: &[u8]) -> String {
    use std::io::Write;
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("f");
    let mut f = fs::File::create(&p).unwrap();
    f.write_all(content).unwrap();
    drop(f);
    sha256_file(&p).unwrap()
}

// =============================================================================
// Checksum gating (mismatch must halt before any state mutation)
// =============================================================================

#[test]
fn test_checksum_mismatch_halts_and_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let img = dir.path().join("base.img");
    fs::write(&img, BASE_CONTENT).unwrap();

    let err = verify_checksum(&img, &"f".repeat(64)).unwrap_err();

    assert!(err.to_string().contains("Checksum mismatch"));
    assert!(!img.exists(), "corrupt file must not be reused");
}

#[test]
fn test_checksum_match_keeps_file() {
    let dir = tempfile::tempdir().unwrap();
    let img = dir.path().join("base.img");
    fs::write(&img, BASE_CONTENT).unwrap();

    verify_checksum(&img, &sha_of(BASE_CONTENT.as_bytes())).unwrap();
    assert!(img.exists());
}

// =============================================================================
// Download cache
// =============================================================================

#[test]
fn test_fetch_uses_valid_cache_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let downloads = dir.path().join("downloads");
    fs::create_dir_all(&downloads).unwrap();
    fs::write(downloads.join("base.img"), BASE_CONTENT).unwrap();

    // URL is unreachable; a cache hit must not touch it.
    let path = fetch(
        "http://127.0.0.1:9/base.img",
        &sha_of(BASE_CONTENT.as_bytes()),
        &downloads,
    )
    .unwrap();

    assert_eq!(path, downloads.join("base.img"));
}

#[test]
fn test_fetch_discards_corrupt_cache_before_redownload() {
    let dir = tempfile::tempdir().unwrap();
    let downloads = dir.path().join("downloads");
    fs::create_dir_all(&downloads).unwrap();
    let cached = downloads.join("base.img");
    fs::write(&cached, "corrupted bytes").unwrap();

    // Cached checksum fails, the single re-download attempt hits an
    // unreachable URL, so fetch must fail overall...
    let result = fetch(
        "http://127.0.0.1:9/base.img",
        &sha_of(BASE_CONTENT.as_bytes()),
        &downloads,
    );
    assert!(result.is_err());

    // ...and the corrupt file must be gone either way.
    assert!(!cached.exists());
}

#[test]
fn test_file_name_from_url_variants() {
    assert_eq!(
        file_name_from_url("https://downloads.example.org/a/b/base-lite.img.xz").unwrap(),
        "base-lite.img.xz"
    );
    assert_eq!(
        file_name_from_url("https://example.org/base.zip?sha=abc").unwrap(),
        "base.zip"
    );
    assert!(file_name_from_url("https://example.org/").is_err());
}

// =============================================================================
// Partition table handling
// =============================================================================

#[test]
fn test_partition_table_parse_and_resize_script() {
    let json = r#"{
        "partitiontable": {
            "label": "dos",
            "unit": "sectors",
            "partitions": [
                {"node": "img1", "start": 8192, "size": 524288, "type": "c", "bootable": true},
                {"node": "img2", "start": 532480, "size": 3293184, "type": "83"}
            ]
        }
    }"#;

    let table = parse_partition_table(json).unwrap();
    assert_eq!(table.root_partition_number(), 2);

    let script = render_expand_script(&table);
    // boot partition keeps its size, root partition loses it
    assert!(script.contains("start=8192, size=524288, type=c, bootable\n"));
    assert!(script.ends_with("start=532480, type=83\n"));
}

#[test]
fn test_empty_partition_table_is_fatal() {
    let json = r#"{"partitiontable": {"label": "gpt", "partitions": []}}"#;
    assert!(parse_partition_table(json).is_err());
}

// =============================================================================
// Artifact naming
// =============================================================================

#[test]
fn test_output_name_embeds_tag_and_suffix() {
    assert_eq!(
        artifact_name("piforge", "v0.9.1-5-gf00dfee", "armhf"),
        "piforge-v0.9.1-5-gf00dfee-armhf.img.xz"
    );
    assert_eq!(
        manifest_name("piforge-v0.9.1-5-gf00dfee-armhf.img.xz"),
        "piforge-v0.9.1-5-gf00dfee-armhf.manifest.json"
    );
}

#[test]
fn test_version_tag_fallback() {
    assert_eq!(
        version_tag(Path::new("/nonexistent_piforge_checkout")),
        UNTAGGED
    );
}

// =============================================================================
// Cleanup guard (must run exactly once, whatever the exit path)
// =============================================================================

#[test]
fn test_cleanup_guard_runs_exactly_once() {
    let mut guard = CleanupGuard::new();
    assert!(guard.run(), "first pass must run");
    assert!(!guard.run(), "second pass must be a no-op");
}

#[test]
fn test_cleanup_guard_survives_early_unmount() {
    let mut guard = CleanupGuard::new();
    guard.unmount_all();
    guard.unmount_all();
    assert!(guard.run());
}

// =============================================================================
// Unpack format detection
// =============================================================================

#[test]
fn test_unpack_format_detection() {
    assert_eq!(
        detect_format(Path::new("dl/base.img.xz")).unwrap(),
        BaseFormat::Xz
    );
    assert_eq!(
        detect_format(Path::new("dl/base.zip")).unwrap(),
        BaseFormat::Zip
    );
    assert_eq!(
        detect_format(Path::new("dl/base.img.gz")).unwrap(),
        BaseFormat::Gzip
    );
    assert_eq!(
        detect_format(Path::new("dl/base.img")).unwrap(),
        BaseFormat::Raw
    );
    assert!(detect_format(Path::new("dl/base.iso")).is_err());
}

// =============================================================================
// Manifest
// =============================================================================

#[test]
fn test_manifest_round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("piforge-v1-armhf.manifest.json");

    let manifest = BuildManifest {
        dist_name: "piforge".to_string(),
        version_tag: "v1".to_string(),
        suffix: "armhf".to_string(),
        base_url: "https://example.org/base.img.xz".to_string(),
        base_sha256: "00".repeat(32),
        output: "piforge-v1-armhf.img.xz".to_string(),
        output_sha256: "11".repeat(32),
        raw_size_bytes: 123456789,
    };
    manifest.write(&path).unwrap();

    let back = BuildManifest::read(&path).unwrap();
    assert_eq!(back, manifest);
}

// =============================================================================
// Version info rendering
// =============================================================================

#[test]
fn test_version_info_written_to_etc() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir_all(&root).unwrap();

    piforge::image::overlay::write_version_info(
        &root,
        "piforge",
        "v2.1",
        "arm64",
        "https://example.org/base.img.xz",
    )
    .unwrap();

    helpers::assert_file_contains(&root.join("etc/version-info"), "VERSION=v2.1");
    helpers::assert_file_contains(&root.join("etc/version-info"), "SUFFIX=arm64");
}

#[test]
fn test_overlay_file_count_ignores_dirs() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("etc/motd"), "hello");
    write_file(&dir.path().join("usr/local/bin/tool"), "#!/bin/sh\n");
    fs::create_dir_all(dir.path().join("var/empty")).unwrap();

    assert_eq!(piforge::image::overlay::file_count(dir.path()), 2);
}
