//! GitHub release discovery and binary download
//!
//! ## Module Organization
//!
//! - `platform` - OS/architecture tokens used to tell assets apart
//! - `github` - release index client and repository references
//! - `asset` - picking exactly one asset out of a release
//! - `core` - streaming the asset into a scoped staging directory

mod asset;
mod core;
mod github;
mod platform;

pub use asset::{ResolvedAsset, select_asset};
pub use self::core::{StagedBinary, download_asset, download_client};
pub use github::{GitHubAsset, GitHubRelease, ReleaseClient, RepositoryRef, RepositoryRefError};
pub use platform::{Arch, Os, Platform};
