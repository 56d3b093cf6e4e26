//! Installation state detection and post-install verification

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use super::error::InstallError;

/// State of the install target before the pipeline touches it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallationState {
    /// Nothing at the target path
    NotInstalled,
    /// An executable is present and will be replaced
    Installed,
    /// Something is present but is not an executable file
    Damaged,
}

pub fn check_installation_state(target: &Path) -> InstallationState {
    match target.metadata() {
        Err(_) => InstallationState::NotInstalled,
        Ok(meta) if meta.is_file() && meta.permissions().mode() & 0o111 != 0 => {
            InstallationState::Installed
        }
        Ok(_) => InstallationState::Damaged,
    }
}

/// Confirm the installed file exists and carries an execute bit
pub fn verify_installed(target: &Path) -> Result<(), InstallError> {
    let metadata = std::fs::metadata(target)
        .map_err(|e| InstallError::verification(target, format!("installed file not found: {e}")))?;

    if !metadata.is_file() {
        return Err(InstallError::verification(target, "installed path is not a regular file"));
    }

    if metadata.permissions().mode() & 0o111 == 0 {
        return Err(InstallError::verification(
            target,
            format!("binary not executable, run: chmod +x {}", target.display()),
        ));
    }

    Ok(())
}
