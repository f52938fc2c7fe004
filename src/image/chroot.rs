//! Chrooted provisioning.
//!
//! The provisioning script is staged into the image, executed with the
//! image as filesystem root, and removed again. For foreign-arch images
//! a static QEMU binary can be copied in first so binfmt_misc can run
//! target binaries.

use anyhow::{bail, Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::process::Cmd;

/// Run the provisioning script inside the mounted image.
pub fn provision(root: &Path, script: &Path, qemu_binary: Option<&Path>) -> Result<()> {
    if !script.is_file() {
        bail!("Provisioning script not found at {}", script.display());
    }

    if let Some(qemu) = qemu_binary {
        install_qemu(root, qemu)?;
    }

    let script_name = script
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "provision.sh".to_string());
    let staged = root.join("tmp").join(&script_name);

    fs::create_dir_all(root.join("tmp"))?;
    fs::copy(script, &staged)
        .with_context(|| format!("Failed to stage {} into the image", script.display()))?;
    fs::set_permissions(&staged, fs::Permissions::from_mode(0o755))?;

    println!("  Running /tmp/{} inside the chroot...", script_name);
    let run = Cmd::new("chroot")
        .arg_path(root)
        .args(["/bin/sh", &format!("/tmp/{}", script_name)])
        .error_msg("Provisioning script failed")
        .run_interactive();

    // The staged script never ships in the image, success or not.
    let _ = fs::remove_file(&staged);
    run?;

    println!("  Provisioning complete");
    Ok(())
}

/// Copy a static emulator into the image's /usr/bin.
fn install_qemu(root: &Path, qemu: &Path) -> Result<()> {
    if !qemu.is_file() {
        bail!("QEMU binary not found at {}", qemu.display());
    }
    let name = qemu
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "qemu-arm-static".to_string());

    let dest_dir = root.join("usr/bin");
    fs::create_dir_all(&dest_dir)?;
    let dest = dest_dir.join(&name);
    fs::copy(qemu, &dest)
        .with_context(|| format!("Failed to copy {} into the image", qemu.display()))?;
    fs::set_permissions(&dest, fs::Permissions::from_mode(0o755))?;

    println!("  Installed {} for foreign-arch chroot", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provision_missing_script() {
        let dir = tempfile::tempdir().unwrap();
        let err = provision(dir.path(), &dir.path().join("no.sh"), None).unwrap_err();
        assert!(err.to_string().contains("Provisioning script not found"));
    }

    #[test]
    fn test_install_qemu_lands_in_usr_bin() {
        let dir = tempfile::tempdir().unwrap();
        let qemu = dir.path().join("qemu-arm-static");
        fs::write(&qemu, b"\x7fELF").unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(&root).unwrap();

        install_qemu(&root, &qemu).unwrap();

        let dest = root.join("usr/bin/qemu-arm-static");
        assert!(dest.is_file());
        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
