//! Asset download into a scoped staging directory

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use log::debug;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use super::asset::ResolvedAsset;
use crate::config::NetworkConfig;
use crate::install::error::InstallError;

const STAGING_PREFIX: &str = "portablesource-install-";

/// Downloaded binary inside a temporary directory
///
/// The directory is removed when this value is dropped, so every early return
/// in the pipeline cleans it up.
#[derive(Debug)]
pub struct StagedBinary {
    dir: TempDir,
    path: PathBuf,
}

impl StagedBinary {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the staging directory, reporting any failure
    pub fn cleanup(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

/// HTTP client for asset downloads (connect timeout only, inactivity is
/// enforced per chunk)
pub fn download_client(network: &NetworkConfig) -> Result<reqwest::Client, InstallError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(network.connect_timeout_secs))
        .user_agent(concat!("portablesource-installer/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| InstallError::Config(format!("failed to build download client: {e}")))
}

/// Download `asset` into a fresh staging directory as `file_name`
///
/// Redirects are followed by the client's default policy.
pub async fn download_asset(
    client: &reqwest::Client,
    asset: &ResolvedAsset,
    file_name: &str,
    temp_root: Option<&Path>,
    inactivity_timeout: Duration,
) -> Result<StagedBinary, InstallError> {
    let fail = |reason: String| InstallError::download(asset.name.clone(), reason);

    let mut builder = tempfile::Builder::new();
    builder.prefix(STAGING_PREFIX);
    let dir = match temp_root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
    .map_err(|e| fail(format!("could not create staging directory: {e}")))?;

    let path = dir.path().join(file_name);
    debug!("Downloading {} to {}", asset.url, path.display());

    let response = client
        .get(asset.url.clone())
        .send()
        .await
        .map_err(|e| fail(format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fail(format!("server returned HTTP {status}")));
    }

    let mut file = tokio::fs::File::create(&path)
        .await
        .map_err(|e| fail(format!("could not create {}: {e}", path.display())))?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    loop {
        let chunk = match timeout(inactivity_timeout, stream.next()).await {
            Ok(Some(Ok(chunk))) => chunk,
            Ok(Some(Err(e))) => return Err(fail(format!("transfer interrupted: {e}"))),
            Ok(None) => break,
            Err(_) => {
                return Err(fail(format!(
                    "no data received for {} seconds after {downloaded} bytes",
                    inactivity_timeout.as_secs()
                )));
            }
        };

        file.write_all(&chunk)
            .await
            .map_err(|e| fail(format!("write failed: {e}")))?;
        downloaded += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| fail(format!("flush failed: {e}")))?;
    file.sync_all().await.map_err(|e| fail(format!("sync failed: {e}")))?;
    drop(file);

    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => {}
        Ok(_) => return Err(fail("downloaded file is empty".to_string())),
        Err(e) => return Err(fail(format!("downloaded file is missing: {e}"))),
    }

    if asset.size > 0 && asset.size != downloaded {
        return Err(fail(format!(
            "size mismatch: expected {} bytes, received {downloaded}",
            asset.size
        )));
    }

    debug!("Downloaded {} bytes of {}", downloaded, asset.name);
    Ok(StagedBinary { dir, path })
}
