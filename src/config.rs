use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::install::download::RepositoryRef;

const CONFIG_DIR_NAME: &str = "portablesource";
const CONFIG_FILE_NAME: &str = "installer.toml";

/// Top‑level installer configuration (mirrors the upstream install script defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// GitHub repository publishing the releases
    pub repository: RepositoryRef,
    /// Substring identifying the binary among the release assets
    pub asset_name: String,
    /// Pin a release tag instead of following `latest`
    pub release_tag: Option<String>,
    /// System binary directory receiving the installed file
    pub install_dir: PathBuf,
    /// File name of the installed binary
    pub target_name: String,
    /// Subcommand run once after installation
    pub setup_command: String,
    pub run_setup: bool,
    /// Program used to elevate file operations when not running as root
    pub elevation_command: String,
    pub api_base: String,
    /// Parent directory for the staging directory (system temp dir if unset)
    pub temp_root: Option<PathBuf>,
    pub network: NetworkConfig,
}

/// Timeouts and retry policy for network calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub connect_timeout_secs: u64,
    /// Whole-request timeout for the release index query
    pub request_timeout_secs: u64,
    /// Abort a download when no bytes arrive for this long
    pub download_inactivity_timeout_secs: u64,
    /// Release index attempts, including the first one
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            request_timeout_secs: 60,
            download_inactivity_timeout_secs: 300,
            max_attempts: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            repository: RepositoryRef::upstream(),
            asset_name: "portablesource-rs".into(),
            release_tag: None,
            install_dir: PathBuf::from("/usr/local/bin"),
            target_name: "portablesource".into(),
            setup_command: "setup-env".into(),
            run_setup: true,
            elevation_command: "sudo".into(),
            api_base: "https://api.github.com".into(),
            temp_root: None,
            network: NetworkConfig::default(),
        }
    }
}

impl InstallerConfig {
    /// Default per-user config location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one the default location is used
    /// when present, otherwise built-in defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                log::debug!("No installer config found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        log::debug!("Loaded installer config from {}", path.display());
        Ok(cfg)
    }

    /// Full path of the installed binary
    pub fn target_path(&self) -> PathBuf {
        self.install_dir.join(&self.target_name)
    }

    /// Reject settings the pipeline cannot act on
    pub fn validate(&self) -> Result<()> {
        if self.asset_name.trim().is_empty() {
            anyhow::bail!("asset_name must not be empty");
        }
        if self.target_name.is_empty() || self.target_name.contains('/') {
            anyhow::bail!("target_name must be a plain file name, got '{}'", self.target_name);
        }
        if self.asset_name.contains('/') {
            anyhow::bail!("asset_name must not contain '/', got '{}'", self.asset_name);
        }
        if !self.install_dir.is_absolute() {
            anyhow::bail!("install_dir must be absolute, got {}", self.install_dir.display());
        }
        if self.run_setup && self.setup_command.trim().is_empty() {
            anyhow::bail!("setup_command must not be empty when setup is enabled");
        }
        self.network.validate()
    }
}

impl NetworkConfig {
    /// A zero timeout fails every request, so it is rejected rather than
    /// read as "no timeout".
    pub fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("request_timeout_secs", self.request_timeout_secs),
            ("download_inactivity_timeout_secs", self.download_inactivity_timeout_secs),
        ] {
            if secs == 0 {
                anyhow::bail!("network.{name} must be greater than zero");
            }
        }
        if self.max_attempts == 0 {
            anyhow::bail!("network.max_attempts must be at least 1");
        }
        Ok(())
    }
}
