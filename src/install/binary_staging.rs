//! Preparing the downloaded binary before it is installed
//!
//! The staged file lives in a directory owned by the invoking user, so this
//! step never needs elevation.

use std::fs;
use std::os::unix::fs::PermissionsExt;

use super::download::StagedBinary;
use super::error::InstallError;

/// Set executable permissions (755) on the staged download
pub fn make_executable(staged: &StagedBinary) -> Result<(), InstallError> {
    let path = staged.path();
    let mut perms = fs::metadata(path)
        .map_err(|e| InstallError::download(path.display().to_string(), format!("cannot read metadata: {e}")))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).map_err(|e| {
        InstallError::download(path.display().to_string(), format!("cannot mark as executable: {e}"))
    })
}
