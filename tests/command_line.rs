//! Runs the `portablesource-install` binary and checks what a user sees:
//! the exit status and the final report lines.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

use portablesource_installer::config::InstallerConfig;
use serde_json::json;
use tempfile::TempDir;
use tokio::process::Command;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RELEASE_PATH: &str = "/repos/PortableSource/portablesource/releases/latest";
const ASSET: &str = "portablesource-rs-linux";
const SUCCEEDING_SETUP: &[u8] = b"#!/bin/sh\n[ \"$1\" = \"setup-env\" ] || exit 64\nexit 0\n";
const FAILING_SETUP: &[u8] = b"#!/bin/sh\nexit 3\n";

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self {
            root: TempDir::new().unwrap(),
        };
        fs::create_dir(ws.install_dir()).unwrap();
        fs::create_dir(ws.temp_root()).unwrap();
        ws
    }

    fn install_dir(&self) -> PathBuf {
        self.root.path().join("bin")
    }

    fn temp_root(&self) -> PathBuf {
        self.root.path().join("staging")
    }

    fn target(&self) -> PathBuf {
        self.install_dir().join("portablesource")
    }

    /// Config file holding what has no flag: staging location and fast retries
    fn write_config(&self) -> PathBuf {
        let mut cfg = InstallerConfig::default();
        cfg.temp_root = Some(self.temp_root());
        cfg.network.retry_backoff_ms = 1;
        let path = self.root.path().join("installer.toml");
        fs::write(&path, toml::to_string(&cfg).unwrap()).unwrap();
        path
    }

    async fn run(&self, server: &MockServer, install_dir: &Path, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_portablesource-install"))
            .arg("--config")
            .arg(self.write_config())
            .arg("--api-base")
            .arg(server.uri())
            .arg("--install-dir")
            .arg(install_dir)
            .args(["--elevation-command", "env"])
            .args(extra)
            .env("NO_COLOR", "1")
            .env("TERM", "dumb")
            .output()
            .await
            .unwrap()
    }

    fn assert_no_staging_left(&self) {
        let leftovers: Vec<_> = fs::read_dir(self.temp_root()).unwrap().collect();
        assert!(leftovers.is_empty(), "staging directory left behind: {leftovers:?}");
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

async fn serve_release(server: &MockServer, asset: &str, body: &[u8]) {
    let release = json!({
        "tag_name": "v1.2.0",
        "assets": [{
            "name": asset,
            "browser_download_url": format!("{}/download/{asset}", server.uri()),
            "size": body.len(),
        }],
    });
    Mock::given(method("GET"))
        .and(path(RELEASE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(release))
        .mount(server)
        .await;
}

async fn serve_binary(server: &MockServer, body: &[u8], expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{ASSET}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn successful_install_exits_zero() {
    let server = MockServer::start().await;
    serve_release(&server, ASSET, SUCCEEDING_SETUP).await;
    serve_binary(&server, SUCCEEDING_SETUP, 1).await;

    let ws = Workspace::new();
    let output = ws.run(&server, &ws.install_dir(), &[]).await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Installation complete: portablesource v1.2.0"));
    assert!(stdout(&output).contains("Next: run 'portablesource --help'"));
    assert_eq!(fs::read(ws.target()).unwrap(), SUCCEEDING_SETUP);
    ws.assert_no_staging_left();
}

#[tokio::test]
async fn missing_asset_exits_one_with_a_single_message() {
    let server = MockServer::start().await;
    serve_release(&server, "something-else-linux", b"data").await;
    serve_binary(&server, SUCCEEDING_SETUP, 0).await;

    let ws = Workspace::new();
    let output = ws.run(&server, &ws.install_dir(), &[]).await;
    let err = stderr(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        err.lines().any(|line| line
            == "✗ Failed to get latest release URL: no asset matching 'portablesource-rs' in release v1.2.0"),
        "stderr: {err}"
    );
    assert_eq!(err.matches("no asset matching").count(), 1, "stderr: {err}");
    assert!(!ws.target().exists());
    ws.assert_no_staging_left();
}

#[tokio::test]
async fn failing_setup_warns_and_exits_zero() {
    let server = MockServer::start().await;
    serve_release(&server, ASSET, FAILING_SETUP).await;
    serve_binary(&server, FAILING_SETUP, 1).await;

    let ws = Workspace::new();
    let output = ws.run(&server, &ws.install_dir(), &[]).await;
    let err = stderr(&output);

    assert_eq!(output.status.code(), Some(0), "stderr: {err}");
    assert!(err.contains("⚠ Environment setup failed: 'setup-env' exited with code 3"), "stderr: {err}");
    assert!(err.contains("run 'portablesource setup-env' manually"), "stderr: {err}");
    assert!(ws.target().exists());
    ws.assert_no_staging_left();
}

#[tokio::test]
async fn failed_install_step_exits_one() {
    let server = MockServer::start().await;
    serve_release(&server, ASSET, SUCCEEDING_SETUP).await;
    serve_binary(&server, SUCCEEDING_SETUP, 1).await;

    // A regular file where the install directory's parent should be fails
    // `mkdir -p` both as root and through the elevation wrapper.
    let ws = Workspace::new();
    let blocker = ws.root.path().join("blocker");
    fs::write(&blocker, b"").unwrap();
    let output = ws.run(&server, &blocker.join("bin"), &[]).await;
    let err = stderr(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        err.lines().any(|line| line.starts_with("✗ Failed to install")),
        "stderr: {err}"
    );
    assert!(!stdout(&output).contains("Installation complete"));
    ws.assert_no_staging_left();
}

#[tokio::test]
async fn dry_run_reports_without_downloading() {
    let server = MockServer::start().await;
    serve_release(&server, ASSET, SUCCEEDING_SETUP).await;
    serve_binary(&server, SUCCEEDING_SETUP, 0).await;

    let ws = Workspace::new();
    let output = ws.run(&server, &ws.install_dir(), &["--dry-run"]).await;
    let out = stdout(&output);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(out.contains("Dry run, nothing was downloaded or installed"), "stdout: {out}");
    assert!(out.contains(&format!("Asset:    {ASSET}")), "stdout: {out}");
    assert!(out.contains("Setup:    portablesource setup-env"), "stdout: {out}");
    assert!(!ws.target().exists());
}

#[tokio::test]
async fn skipped_setup_suggests_running_it() {
    let server = MockServer::start().await;
    serve_release(&server, ASSET, FAILING_SETUP).await;
    serve_binary(&server, FAILING_SETUP, 1).await;

    let ws = Workspace::new();
    let output = ws.run(&server, &ws.install_dir(), &["--skip-setup"]).await;
    let out = stdout(&output);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(out.contains("Installed portablesource v1.2.0"), "stdout: {out}");
    assert!(out.contains("Run 'portablesource setup-env' to set up the environment"), "stdout: {out}");
}
