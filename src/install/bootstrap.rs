//! One-time environment setup through the installed binary
//!
//! The installed binary owns the setup logic; we only run
//! `<target> <subcommand>` and look at the exit code.

use std::path::Path;

use log::debug;
use tokio::process::Command;

/// Result of the post-install setup subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStatus {
    Completed,
    /// Non-fatal: the binary is installed, setup has to be rerun by hand
    Failed(String),
    Skipped,
}

/// Run the setup subcommand, inheriting the terminal
pub async fn run_setup(target: &Path, subcommand: &str) -> BootstrapStatus {
    debug!("Running {} {}", target.display(), subcommand);

    match Command::new(target).arg(subcommand).status().await {
        Ok(status) if status.success() => BootstrapStatus::Completed,
        Ok(status) => BootstrapStatus::Failed(match status.code() {
            Some(code) => format!("'{subcommand}' exited with code {code}"),
            None => format!("'{subcommand}' was terminated by a signal"),
        }),
        Err(e) => BootstrapStatus::Failed(format!("could not start '{subcommand}': {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exit_code_decides_status() {
        assert_eq!(run_setup(Path::new("true"), "setup-env").await, BootstrapStatus::Completed);

        match run_setup(Path::new("false"), "setup-env").await {
            BootstrapStatus::Failed(reason) => assert!(reason.contains("exited with code 1")),
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_a_failure_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let status = run_setup(&dir.path().join("absent"), "setup-env").await;
        assert!(matches!(status, BootstrapStatus::Failed(reason) if reason.contains("could not start")));
    }
}
