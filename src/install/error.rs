//! Error taxonomy for the installation pipeline
//!
//! Every variant of [`InstallError`] is terminal: the run aborts, the staging
//! directory is dropped and the process exits non-zero. A failing bootstrap
//! subcommand is not an error, see [`super::BootstrapStatus`].

use std::path::PathBuf;

use thiserror::Error;

/// Failure while turning a repository reference into a download URL
///
/// Messages never repeat their `source`; callers print the whole chain with
/// `{:#}`.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("release index request for {repo} failed")]
    Request {
        repo: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("release index for {repo} returned HTTP {status}")]
    Status {
        repo: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed release index response for {repo}")]
    Malformed {
        repo: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no asset matching '{pattern}' in release {tag}")]
    NoMatchingAsset { pattern: String, tag: String },

    #[error("ambiguous asset match for '{pattern}' in release {tag}: {}", candidates.join(", "))]
    AmbiguousAsset {
        pattern: String,
        tag: String,
        candidates: Vec<String>,
    },
}

/// Installer error type
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Failed to get latest release URL")]
    Resolution(#[from] ResolutionError),

    #[error("Failed to download {asset}: {reason}")]
    Download { asset: String, reason: String },

    #[error("Failed to install {}: {reason}", target.display())]
    Install { target: PathBuf, reason: String },

    #[error("Installation verification failed for {}: {reason}", target.display())]
    Verification { target: PathBuf, reason: String },

    #[error("Invalid installer configuration: {0}")]
    Config(String),
}

impl InstallError {
    pub(crate) fn download(asset: impl Into<String>, reason: impl ToString) -> Self {
        Self::Download {
            asset: asset.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn install(target: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Install {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn verification(target: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Verification {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// Short name of the pipeline step that failed
    pub fn step(&self) -> &'static str {
        match self {
            Self::Resolution(_) => "resolve",
            Self::Download { .. } => "download",
            Self::Install { .. } => "install",
            Self::Verification { .. } => "verify",
            Self::Config(_) => "configure",
        }
    }
}
