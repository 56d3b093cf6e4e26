//! PortableSource release installer library
//!
//! Resolves the latest PortableSource release from GitHub, downloads the
//! platform binary, installs it into a system binary directory (elevating
//! through `sudo` when not running as root) and runs its one-time
//! environment setup.

pub mod cli;
pub mod config;
pub mod install;
