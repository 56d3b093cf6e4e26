//! Release asset selection
//!
//! Candidates are the assets whose name contains the configured binary name,
//! minus checksum and signature sidecars. A single candidate wins outright.
//! Otherwise an exact name match wins, then the candidates are narrowed by
//! the current OS and then architecture tokens. Anything still ambiguous is
//! reported rather than guessed.

use url::Url;

use super::github::{GitHubAsset, GitHubRelease};
use super::platform::Platform;
use crate::install::error::ResolutionError;

const SIDECAR_SUFFIXES: &[&str] = &[".sha256", ".sha512", ".md5", ".sig", ".asc", ".minisig"];

/// Asset chosen for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub release_tag: String,
    pub name: String,
    pub url: Url,
    pub size: u64,
}

impl ResolvedAsset {
    fn from_asset(tag: &str, asset: &GitHubAsset) -> Self {
        Self {
            release_tag: tag.to_string(),
            name: asset.name.clone(),
            url: asset.browser_download_url.clone(),
            size: asset.size,
        }
    }
}

fn is_sidecar(name: &str) -> bool {
    let lower = name.to_lowercase();
    SIDECAR_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

fn narrow<'a>(assets: &[&'a GitHubAsset], tokens: &[&str]) -> Vec<&'a GitHubAsset> {
    if tokens.is_empty() {
        return Vec::new();
    }
    assets
        .iter()
        .copied()
        .filter(|a| {
            let lower = a.name.to_lowercase();
            tokens.iter().any(|t| lower.contains(t))
        })
        .collect()
}

/// Pick exactly one asset whose name contains `pattern`
pub fn select_asset(
    release: &GitHubRelease,
    pattern: &str,
    platform: Platform,
) -> Result<ResolvedAsset, ResolutionError> {
    let tag = release.tag_name.as_str();
    let candidates: Vec<&GitHubAsset> = release
        .assets
        .iter()
        .filter(|a| a.name.contains(pattern) && !is_sidecar(&a.name))
        .collect();

    match candidates.as_slice() {
        [] => {
            return Err(ResolutionError::NoMatchingAsset {
                pattern: pattern.to_string(),
                tag: tag.to_string(),
            });
        }
        [only] => return Ok(ResolvedAsset::from_asset(tag, only)),
        _ => {}
    }

    if let Some(exact) = candidates.iter().find(|a| a.name == pattern) {
        return Ok(ResolvedAsset::from_asset(tag, exact));
    }

    let mut narrowest = candidates;
    let by_os = narrow(&narrowest, platform.os_tokens());
    if !by_os.is_empty() {
        narrowest = by_os;
        if let [only] = narrowest.as_slice() {
            return Ok(ResolvedAsset::from_asset(tag, only));
        }
    }

    let by_arch = narrow(&narrowest, platform.arch_tokens());
    if let [only] = by_arch.as_slice() {
        return Ok(ResolvedAsset::from_asset(tag, only));
    }
    if !by_arch.is_empty() {
        narrowest = by_arch;
    }

    Err(ResolutionError::AmbiguousAsset {
        pattern: pattern.to_string(),
        tag: tag.to_string(),
        candidates: narrowest.iter().map(|a| a.name.clone()).collect(),
    })
}
