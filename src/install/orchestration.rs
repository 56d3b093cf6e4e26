//! The installation pipeline
//!
//! Release index query → download → install → permission fix → cleanup →
//! verification → bootstrap. Each step runs to completion before the next
//! one starts. Any error before bootstrap ends the run; the staging directory
//! is owned by [`StagedBinary`](super::download::StagedBinary) and
//! disappears with it on every path.

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, warn};

use super::binary_staging;
use super::bootstrap::{self, BootstrapStatus};
use super::console::Console;
use super::detection::{self, InstallationState};
use super::download::{self, Platform, ReleaseClient, ResolvedAsset};
use super::error::InstallError;
use super::privilege::{self, PrivilegeMode, PrivilegedFileOp};
use crate::config::InstallerConfig;

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub target: PathBuf,
    pub asset: ResolvedAsset,
    pub replaced_existing: bool,
    pub bootstrap: BootstrapStatus,
}

pub struct Installer {
    config: InstallerConfig,
    releases: ReleaseClient,
    downloads: reqwest::Client,
    file_ops: Box<dyn PrivilegedFileOp>,
    platform: Platform,
}

impl Installer {
    /// Build an installer for the detected privilege level
    pub fn new(config: InstallerConfig) -> Result<Self, InstallError> {
        let mode = PrivilegeMode::detect();
        let file_ops = privilege::file_ops_for(mode, &config.elevation_command)?;
        Self::with_file_ops(config, file_ops)
    }

    /// Build an installer around explicit file operations
    pub fn with_file_ops(
        config: InstallerConfig,
        file_ops: Box<dyn PrivilegedFileOp>,
    ) -> Result<Self, InstallError> {
        config
            .validate()
            .map_err(|e| InstallError::Config(format!("{e:#}")))?;

        let releases = ReleaseClient::new(&config.api_base, &config.network)?;
        let downloads = download::download_client(&config.network)?;

        Ok(Self {
            config,
            releases,
            downloads,
            file_ops,
            platform: Platform::detect(),
        })
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    pub fn privilege_mode(&self) -> PrivilegeMode {
        self.file_ops.mode()
    }

    /// Resolve the download URL of the configured asset
    pub async fn resolve(&self) -> Result<ResolvedAsset, InstallError> {
        resolve_with(&self.releases, &self.config, self.platform).await
    }

    /// Run the whole pipeline
    pub async fn run(&self, console: &Console) -> Result<InstallOutcome, InstallError> {
        let target = self.config.target_path();
        console.info(self.privilege_mode().describe());

        let replaced_existing = match detection::check_installation_state(&target) {
            InstallationState::NotInstalled => false,
            InstallationState::Installed => {
                console.info(format!("Existing installation at {} will be replaced", target.display()));
                true
            }
            InstallationState::Damaged if target.is_dir() => {
                return Err(InstallError::install(
                    &target,
                    "a directory is in the way, remove it or choose another target_name",
                ));
            }
            InstallationState::Damaged => {
                console.warn(format!(
                    "{} exists but is not executable, it will be overwritten",
                    target.display()
                ));
                true
            }
        };

        console.info(format!("Looking up latest release of {}...", self.config.repository));
        let asset = self.resolve().await?;
        console.info(format!("Found {} ({})", asset.name, asset.release_tag));

        console.info(format!("Downloading {}...", asset.url));
        let staged = download::download_asset(
            &self.downloads,
            &asset,
            &self.config.asset_name,
            self.config.temp_root.as_deref(),
            Duration::from_secs(self.config.network.download_inactivity_timeout_secs),
        )
        .await?;

        binary_staging::make_executable(&staged)?;

        console.info(format!("Installing to {}...", target.display()));
        self.file_ops.ensure_dir(&self.config.install_dir)?;
        self.file_ops.copy_file(staged.path(), &target)?;
        self.file_ops.set_executable(&target)?;

        let staging_dir = staged.dir().to_path_buf();
        if let Err(e) = staged.cleanup() {
            warn!("Failed to remove staging directory {}: {e}", staging_dir.display());
        }

        detection::verify_installed(&target)?;
        console.success(format!("Installed {}", target.display()));

        let bootstrap = if self.config.run_setup {
            console.info(format!("Running '{} {}'...", self.config.target_name, self.config.setup_command));
            bootstrap::run_setup(&target, &self.config.setup_command).await
        } else {
            BootstrapStatus::Skipped
        };

        Ok(InstallOutcome {
            target,
            asset,
            replaced_existing,
            bootstrap,
        })
    }
}

/// Resolve the configured asset without preparing an installer
pub async fn resolve_asset(config: &InstallerConfig) -> Result<ResolvedAsset, InstallError> {
    let releases = ReleaseClient::new(&config.api_base, &config.network)?;
    resolve_with(&releases, config, Platform::detect()).await
}

async fn resolve_with(
    releases: &ReleaseClient,
    config: &InstallerConfig,
    platform: Platform,
) -> Result<ResolvedAsset, InstallError> {
    let release = releases
        .fetch_release(&config.repository, config.release_tag.as_deref())
        .await?;
    debug!(
        "Release {} of {} lists {} assets",
        release.tag_name,
        config.repository,
        release.assets.len()
    );
    Ok(download::select_asset(&release, &config.asset_name, platform)?)
}
