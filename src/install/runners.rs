//! Top-level runners for the command-line installer
//!
//! These turn pipeline results into user-facing messages. Errors are returned
//! to `main`, which prints them and exits non-zero.

use anyhow::Result;

use super::bootstrap::BootstrapStatus;
use super::console::Console;
use super::orchestration::{InstallOutcome, Installer, resolve_asset};
use super::privilege::PrivilegeMode;
use crate::config::InstallerConfig;

/// Install, then report the bootstrap outcome
pub async fn run_install(config: InstallerConfig, console: &Console) -> Result<InstallOutcome> {
    console.info(format!(
        "PortableSource installer ({} {})",
        std::env::consts::OS,
        std::env::consts::ARCH
    ));

    let installer = Installer::new(config)?;
    let outcome = installer.run(console).await?;
    report_outcome(installer.config(), &outcome, console);
    Ok(outcome)
}

/// Resolve everything without downloading or touching the filesystem
pub async fn run_dry_run(config: InstallerConfig, console: &Console) -> Result<()> {
    config.validate()?;
    console.info(PrivilegeMode::detect().describe());

    console.info(format!("Looking up latest release of {}...", config.repository));
    let asset = resolve_asset(&config).await?;

    console.success("Dry run, nothing was downloaded or installed");
    console.detail(format!("Release:  {}", asset.release_tag));
    console.detail(format!("Asset:    {}", asset.name));
    console.detail(format!("URL:      {}", asset.url));
    console.detail(format!("Target:   {}", config.target_path().display()));
    if config.run_setup {
        console.detail(format!("Setup:    {} {}", config.target_name, config.setup_command));
    }
    Ok(())
}

fn report_outcome(config: &InstallerConfig, outcome: &InstallOutcome, console: &Console) {
    let manual_setup = format!("{} {}", config.target_name, config.setup_command);

    match &outcome.bootstrap {
        BootstrapStatus::Completed => {
            console.success(format!(
                "Installation complete: {} {}",
                config.target_name, outcome.asset.release_tag
            ));
            console.detail(format!("Next: run '{} --help' to get started", config.target_name));
        }
        BootstrapStatus::Failed(reason) => {
            console.warn(format!("Environment setup failed: {reason}"));
            console.warn(format!(
                "{} is installed; run '{manual_setup}' manually to finish setup",
                outcome.target.display()
            ));
        }
        BootstrapStatus::Skipped => {
            console.success(format!(
                "Installed {} {}",
                config.target_name, outcome.asset.release_tag
            ));
            console.detail(format!("Run '{manual_setup}' to set up the environment"));
        }
    }
}
