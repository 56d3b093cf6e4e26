//! GitHub release API interaction

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::NetworkConfig;
use crate::install::error::{InstallError, ResolutionError};

const USER_AGENT: &str = concat!("portablesource-installer/", env!("CARGO_PKG_VERSION"));
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(30);

/// Repository reference in `owner/name` form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryRef {
    owner: String,
    name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid repository reference '{0}', expected owner/name")]
pub struct RepositoryRefError(String);

impl RepositoryRef {
    /// The PortableSource release repository
    pub fn upstream() -> Self {
        Self {
            owner: "PortableSource".to_string(),
            name: "portablesource".to_string(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepositoryRef {
    type Err = RepositoryRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RepositoryRefError(s.to_string());
        let (owner, name) = s.split_once('/').ok_or_else(invalid)?;
        let valid_part = |part: &str| {
            !part.is_empty() && !part.contains('/') && !part.chars().any(char::is_whitespace)
        };
        if !valid_part(owner) || !valid_part(name) {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl TryFrom<String> for RepositoryRef {
    type Error = RepositoryRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RepositoryRef> for String {
    fn from(value: RepositoryRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// GitHub release metadata from API
#[derive(Deserialize, Debug, Clone)]
pub struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

/// GitHub release asset metadata
#[derive(Deserialize, Debug, Clone)]
pub struct GitHubAsset {
    pub name: String,
    pub browser_download_url: Url,
    #[serde(default)]
    pub size: u64,
}

/// Release index client with bounded retry
pub struct ReleaseClient {
    http: reqwest::Client,
    api_base: Url,
    max_attempts: u32,
    backoff: Duration,
}

impl ReleaseClient {
    pub fn new(api_base: &str, network: &NetworkConfig) -> Result<Self, InstallError> {
        let api_base = Url::parse(api_base)
            .map_err(|e| InstallError::Config(format!("invalid api_base '{api_base}': {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(InstallError::Config(format!("api_base '{api_base}' cannot hold a path")));
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(network.connect_timeout_secs))
            .timeout(Duration::from_secs(network.request_timeout_secs))
            .build()
            .map_err(|e| InstallError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base,
            max_attempts: network.max_attempts.max(1),
            backoff: Duration::from_millis(network.retry_backoff_ms),
        })
    }

    /// Endpoint for the latest release, or for a pinned tag
    ///
    /// Each piece is pushed as its own path segment, so a tag containing `/`
    /// or spaces is percent-encoded instead of changing the route.
    pub fn release_url(&self, repo: &RepositoryRef, tag: Option<&str>) -> Url {
        let mut url = self.api_base.clone();
        // `new` rejects cannot-be-a-base URLs
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", repo.owner(), repo.name(), "releases"]);
            match tag {
                Some(tag) => segments.extend(["tags", tag]),
                None => segments.push("latest"),
            };
        }
        url
    }

    /// Delay before retry number `attempt` (1-based), doubling up to a cap
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff
            .checked_mul(factor)
            .map_or(MAX_RETRY_BACKOFF, |delay| delay.min(MAX_RETRY_BACKOFF))
    }

    /// Fetch release metadata, retrying transport errors, 5xx and 429
    pub async fn fetch_release(
        &self,
        repo: &RepositoryRef,
        tag: Option<&str>,
    ) -> Result<GitHubRelease, ResolutionError> {
        let url = self.release_url(repo, tag);
        let mut attempt = 1;

        loop {
            debug!("Querying release index {} (attempt {}/{})", url, attempt, self.max_attempts);

            let err = match self.fetch_once(repo, &url).await {
                Ok(release) => return Ok(release),
                Err(err) => err,
            };

            if attempt >= self.max_attempts || !is_retryable(&err) {
                return Err(err);
            }

            let delay = self.backoff_delay(attempt);
            let cause = std::error::Error::source(&err)
                .map(|source| format!(": {source}"))
                .unwrap_or_default();
            warn!("Release index query failed ({err}{cause}), retrying in {}ms", delay.as_millis());
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn fetch_once(&self, repo: &RepositoryRef, url: &Url) -> Result<GitHubRelease, ResolutionError> {
        let response = self
            .http
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|source| ResolutionError::Request {
                repo: repo.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionError::Status {
                repo: repo.to_string(),
                status,
            });
        }

        response.json::<GitHubRelease>().await.map_err(|source| {
            if source.is_decode() {
                ResolutionError::Malformed {
                    repo: repo.to_string(),
                    source,
                }
            } else {
                ResolutionError::Request {
                    repo: repo.to_string(),
                    source,
                }
            }
        })
    }
}

fn is_retryable(err: &ResolutionError) -> bool {
    match err {
        ResolutionError::Request { .. } => true,
        ResolutionError::Status { status, .. } => {
            status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_name() {
        let repo: RepositoryRef = "PortableSource/portablesource".parse().unwrap();
        assert_eq!(repo.owner(), "PortableSource");
        assert_eq!(repo.name(), "portablesource");
        assert_eq!(repo.to_string(), "PortableSource/portablesource");
    }

    #[test]
    fn rejects_malformed_references() {
        for bad in ["", "owner", "/name", "owner/", "a/b/c", "own er/name"] {
            assert!(bad.parse::<RepositoryRef>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn builds_latest_and_tagged_endpoints() {
        let client = ReleaseClient::new("https://api.github.com/", &NetworkConfig::default()).unwrap();
        let repo: RepositoryRef = "o/r".parse().unwrap();
        assert_eq!(
            client.release_url(&repo, None).as_str(),
            "https://api.github.com/repos/o/r/releases/latest"
        );
        assert_eq!(
            client.release_url(&repo, Some("v2.0.1")).as_str(),
            "https://api.github.com/repos/o/r/releases/tags/v2.0.1"
        );
    }

    #[test]
    fn tag_is_encoded_as_one_segment() {
        let client = ReleaseClient::new("http://127.0.0.1:8080", &NetworkConfig::default()).unwrap();
        let repo: RepositoryRef = "o/r".parse().unwrap();
        assert_eq!(
            client.release_url(&repo, Some("v1/../latest x")).as_str(),
            "http://127.0.0.1:8080/repos/o/r/releases/tags/v1%2F..%2Flatest%20x"
        );
    }

    #[test]
    fn unusable_api_base_is_a_config_error() {
        for bad in ["not a url", "mailto:someone@example.com"] {
            let err = ReleaseClient::new(bad, &NetworkConfig::default()).err();
            assert!(matches!(err, Some(InstallError::Config(_))), "accepted {bad:?}");
        }
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        let mut network = NetworkConfig::default();
        network.retry_backoff_ms = 500;
        let client = ReleaseClient::new("https://api.github.com", &network).unwrap();
        assert_eq!(client.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(client.backoff_delay(3), Duration::from_secs(2));
        assert_eq!(client.backoff_delay(40), MAX_RETRY_BACKOFF);

        network.retry_backoff_ms = u64::MAX;
        let client = ReleaseClient::new("https://api.github.com", &network).unwrap();
        assert_eq!(client.backoff_delay(2), MAX_RETRY_BACKOFF);
    }

    #[test]
    fn release_json_without_assets_parses_empty() {
        let release: GitHubRelease = serde_json::from_str(r#"{"tag_name":"v1"}"#).unwrap();
        assert!(release.assets.is_empty());
    }

    #[test]
    fn only_transient_failures_are_retried() {
        let status = |code: u16| ResolutionError::Status {
            repo: "o/r".into(),
            status: reqwest::StatusCode::from_u16(code).unwrap(),
        };
        assert!(is_retryable(&status(502)));
        assert!(is_retryable(&status(429)));
        assert!(!is_retryable(&status(404)));
        assert!(!is_retryable(&ResolutionError::NoMatchingAsset {
            pattern: "x".into(),
            tag: "v1".into(),
        }));
    }
}
