//! HTTP update client.
//!
//! The update server publishes a JSON manifest:
//!
//! ```json
//! { "version": "0.2.0", "url": "https://.../pushbox-linux-x86_64", "sha256": "ab12..." }
//! ```
//!
//! A check compares the manifest version against the running version (semver).
//! A fetch streams the bundle into a temp file next to the install path and
//! verifies its SHA-256. A reload renames the verified file over the install
//! path, keeping the old file's permissions.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use semver::Version;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use super::{UpdateCheck, UpdateClient, UpdateError};

#[derive(Deserialize, Debug, Clone)]
struct Manifest {
    version: String,
    url: String,
    sha256: String,
}

pub struct HttpUpdateClient {
    manifest_url: String,
    current_version: Version,
    install_path: PathBuf,
    client: reqwest::Client,
    /// Manifest of the newer release found by the last check.
    pending: Mutex<Option<Manifest>>,
    /// Verified bundle waiting to be swapped in.
    staged: Mutex<Option<NamedTempFile>>,
}

impl HttpUpdateClient {
    pub fn new(manifest_url: String, current_version: Version, install_path: PathBuf) -> Self {
        Self {
            manifest_url,
            current_version,
            install_path,
            client: reqwest::Client::new(),
            pending: Mutex::new(None),
            staged: Mutex::new(None),
        }
    }

    async fn fetch_manifest(&self) -> Result<Manifest, UpdateError> {
        let response = self
            .client
            .get(&self.manifest_url)
            .send()
            .await
            .map_err(|e| UpdateError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Update manifest error: {} - {}", status, message);
            return Err(UpdateError::Api { status, message });
        }

        response
            .json::<Manifest>()
            .await
            .map_err(|e| UpdateError::Parse(e.to_string()))
    }

    async fn download(&self, manifest: &Manifest) -> Result<NamedTempFile, UpdateError> {
        let dir = self
            .install_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut file = NamedTempFile::new_in(dir)?;
        let mut hasher = Sha256::new();

        let response = self
            .client
            .get(&manifest.url)
            .send()
            .await
            .map_err(|e| UpdateError::Network(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(UpdateError::Api {
                status,
                message: format!("bundle download failed: {}", manifest.url),
            });
        }

        let mut total = 0usize;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| UpdateError::Network(e.to_string()))?;
            hasher.update(&chunk);
            file.write_all(&chunk)?;
            total += chunk.len();
        }
        file.flush()?;
        debug!("Downloaded {} bytes to {}", total, file.path().display());

        let actual = hex::encode(hasher.finalize());
        if !actual.eq_ignore_ascii_case(manifest.sha256.trim()) {
            warn!("Bundle checksum mismatch for version {}", manifest.version);
            return Err(UpdateError::Integrity {
                expected: manifest.sha256.clone(),
                actual,
            });
        }
        Ok(file)
    }
}

/// True when `offered` is strictly newer than `current`.
fn is_newer(offered: &str, current: &Version) -> Result<bool, UpdateError> {
    let offered = Version::parse(offered.trim_start_matches('v'))
        .map_err(|e| UpdateError::Parse(format!("bad manifest version {offered:?}: {e}")))?;
    Ok(offered > *current)
}

#[async_trait]
impl UpdateClient for HttpUpdateClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn check_for_update(&self) -> Result<UpdateCheck, UpdateError> {
        info!("Checking {} (running {})", self.manifest_url, self.current_version);
        let manifest = self.fetch_manifest().await?;
        let is_available = is_newer(&manifest.version, &self.current_version)?;
        let version = Some(manifest.version.clone());

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        *pending = is_available.then_some(manifest);

        Ok(UpdateCheck {
            is_available,
            version,
        })
    }

    async fn fetch_update(&self) -> Result<(), UpdateError> {
        let manifest = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(UpdateError::NothingPending)?;

        info!("Fetching version {} from {}", manifest.version, manifest.url);
        let file = self.download(&manifest).await?;
        *self.staged.lock().unwrap_or_else(|e| e.into_inner()) = Some(file);
        Ok(())
    }

    async fn reload(&self) -> Result<(), UpdateError> {
        let staged = self
            .staged
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or(UpdateError::NothingPending)?;

        if let Ok(meta) = std::fs::metadata(&self.install_path) {
            std::fs::set_permissions(staged.path(), meta.permissions())?;
        }
        staged
            .persist(&self.install_path)
            .map_err(|e| UpdateError::Io(e.error))?;
        info!("Installed new bundle at {}", self.install_path.display());
        Ok(())
    }
}
