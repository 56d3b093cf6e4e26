use std::path::PathBuf;

use clap::Parser;

use crate::config::InstallerConfig;
use crate::install::download::RepositoryRef;

/// Command-line arguments for portablesource-install
#[derive(Parser, Debug, Clone)]
#[command(name = "portablesource-install")]
#[command(version, about = "Install the latest PortableSource release binary")]
pub struct Args {
    /// Path to an installer config file (TOML)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// GitHub repository publishing the release (owner/name)
    #[arg(long)]
    pub repo: Option<RepositoryRef>,

    /// Substring identifying the binary among the release assets
    #[arg(long)]
    pub asset: Option<String>,

    /// Install this release tag instead of the latest release
    #[arg(long)]
    pub tag: Option<String>,

    /// Directory receiving the installed binary
    #[arg(long)]
    pub install_dir: Option<PathBuf>,

    /// File name of the installed binary
    #[arg(long)]
    pub target_name: Option<String>,

    /// Subcommand run once after installation
    #[arg(long)]
    pub setup_command: Option<String>,

    /// Don't run the environment setup after install
    #[arg(long)]
    pub skip_setup: bool,

    /// Program used for privileged steps when not running as root
    #[arg(long)]
    pub elevation_command: Option<String>,

    /// Base URL of the GitHub API
    #[arg(long, hide = true)]
    pub api_base: Option<String>,

    /// Show what would be installed without downloading anything
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, mut config: InstallerConfig) -> InstallerConfig {
        if let Some(repo) = &self.repo {
            config.repository = repo.clone();
        }
        if let Some(asset) = &self.asset {
            config.asset_name = asset.clone();
        }
        if let Some(tag) = &self.tag {
            config.release_tag = Some(tag.clone());
        }
        if let Some(dir) = &self.install_dir {
            config.install_dir = dir.clone();
        }
        if let Some(name) = &self.target_name {
            config.target_name = name.clone();
        }
        if let Some(cmd) = &self.setup_command {
            config.setup_command = cmd.clone();
        }
        if self.skip_setup {
            config.run_setup = false;
        }
        if let Some(cmd) = &self.elevation_command {
            config.elevation_command = cmd.clone();
        }
        if let Some(base) = &self.api_base {
            config.api_base = base.clone();
        }
        config
    }
}
