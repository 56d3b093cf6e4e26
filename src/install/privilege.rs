//! Privilege detection and privileged file operations
//!
//! The install directory is the same whether or not we run as root. As root
//! the file operations touch the filesystem directly; otherwise each one is
//! wrapped with the elevation command (`sudo` by default), which may prompt
//! for a password on the controlling terminal.

use std::ffi::OsStr;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use super::error::InstallError;

const EXECUTABLE_MODE: u32 = 0o755;

/// Effective privilege of the installer process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegeMode {
    /// Running as root, operate directly
    Root,
    /// Unprivileged, wrap mutating operations with the elevation command
    Elevated,
}

impl PrivilegeMode {
    pub fn detect() -> Self {
        if nix::unistd::geteuid().is_root() {
            Self::Root
        } else {
            Self::Elevated
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Root => "Running as root, installing directly",
            Self::Elevated => "Not running as root, privileged steps will use elevation",
        }
    }
}

/// Filesystem mutations that may need elevated privileges
pub trait PrivilegedFileOp {
    fn mode(&self) -> PrivilegeMode;

    /// Create `dir` and its parents if missing
    fn ensure_dir(&self, dir: &Path) -> Result<(), InstallError>;

    /// Copy `src` to `dst`, replacing any existing file
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), InstallError>;

    /// Set mode 0755 on `path`
    fn set_executable(&self, path: &Path) -> Result<(), InstallError>;
}

/// Select the file operations for the detected privilege
pub fn file_ops_for(
    mode: PrivilegeMode,
    elevation_command: &str,
) -> Result<Box<dyn PrivilegedFileOp>, InstallError> {
    match mode {
        PrivilegeMode::Root => Ok(Box::new(DirectFileOps)),
        PrivilegeMode::Elevated => Ok(Box::new(ElevatedFileOps::locate(elevation_command)?)),
    }
}

/// Direct filesystem access, used when running as root
#[derive(Debug, Default)]
pub struct DirectFileOps;

impl PrivilegedFileOp for DirectFileOps {
    fn mode(&self) -> PrivilegeMode {
        PrivilegeMode::Root
    }

    fn ensure_dir(&self, dir: &Path) -> Result<(), InstallError> {
        fs::create_dir_all(dir).map_err(|e| InstallError::install(dir, format!("cannot create directory: {e}")))
    }

    /// Copies beside the destination and renames into place, so a running
    /// binary at `dst` is replaced rather than rewritten.
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), InstallError> {
        let file_name = dst
            .file_name()
            .ok_or_else(|| InstallError::install(dst, "destination has no file name"))?;
        let temp_path = dst.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

        if let Err(e) = fs::copy(src, &temp_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(InstallError::install(dst, format!("copy failed: {e}")));
        }

        if let Err(e) = fs::rename(&temp_path, dst) {
            let _ = fs::remove_file(&temp_path);
            return Err(InstallError::install(dst, format!("could not move binary into place: {e}")));
        }

        Ok(())
    }

    fn set_executable(&self, path: &Path) -> Result<(), InstallError> {
        fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_MODE))
            .map_err(|e| InstallError::install(path, format!("cannot set permissions: {e}")))
    }
}

/// File operations run through an elevation program such as `sudo`
#[derive(Debug)]
pub struct ElevatedFileOps {
    program: PathBuf,
}

impl ElevatedFileOps {
    /// Find the elevation command on `PATH`
    pub fn locate(command: &str) -> Result<Self, InstallError> {
        let program = which::which(command).map_err(|e| {
            InstallError::Config(format!("elevation command '{command}' not found: {e}"))
        })?;
        Ok(Self { program })
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, target: &Path, args: &[&OsStr]) -> Result<(), InstallError> {
        debug!("{} {:?}", self.program.display(), args);

        let status = Command::new(&self.program)
            .args(args)
            .status()
            .map_err(|e| {
                InstallError::install(target, format!("failed to execute {}: {e}", self.program.display()))
            })?;

        if !status.success() {
            return Err(InstallError::install(
                target,
                format!(
                    "elevated command exited with code {} (elevation denied or insufficient permissions)",
                    status.code().unwrap_or(-1)
                ),
            ));
        }
        Ok(())
    }
}

impl PrivilegedFileOp for ElevatedFileOps {
    fn mode(&self) -> PrivilegeMode {
        PrivilegeMode::Elevated
    }

    fn ensure_dir(&self, dir: &Path) -> Result<(), InstallError> {
        if dir.is_dir() {
            return Ok(());
        }
        self.run(dir, &[OsStr::new("mkdir"), OsStr::new("-p"), dir.as_os_str()])
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<(), InstallError> {
        self.run(dst, &[OsStr::new("cp"), OsStr::new("-f"), src.as_os_str(), dst.as_os_str()])
    }

    fn set_executable(&self, path: &Path) -> Result<(), InstallError> {
        self.run(path, &[OsStr::new("chmod"), OsStr::new("755"), path.as_os_str()])
    }
}
