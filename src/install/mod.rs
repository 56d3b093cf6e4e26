//! PortableSource binary installation
//!
//! Downloads the latest `portablesource-rs` release asset from GitHub,
//! installs it as `/usr/local/bin/portablesource` and runs its `setup-env`
//! subcommand once.

mod binary_staging;
mod bootstrap;
pub mod console;
mod detection;
pub mod download;
mod error;
mod orchestration;
pub mod privilege;
mod runners;

pub use bootstrap::BootstrapStatus;
pub use detection::{InstallationState, check_installation_state, verify_installed};
pub use error::{InstallError, ResolutionError};
pub use orchestration::{InstallOutcome, Installer, resolve_asset};
pub use privilege::{DirectFileOps, ElevatedFileOps, PrivilegeMode, PrivilegedFileOp};
pub use runners::{run_dry_run, run_install};
