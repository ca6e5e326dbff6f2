//! # Update Collaborator
//!
//! The over-the-air update service behind the "check for update" action.
//! The core only needs three calls: is there something newer, download it,
//! swap it in. Restarting into the new binary happens after the terminal has
//! been restored, see [`restart_process`].

pub mod http;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use semver::Version;

use crate::core::config::ResolvedConfig;

pub use http::HttpUpdateClient;

#[derive(Debug)]
pub enum UpdateError {
    /// No manifest URL configured, or it is unusable.
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused).
    Network(String),
    /// The update server answered with an error status.
    Api { status: u16, message: String },
    /// The manifest could not be understood.
    Parse(String),
    /// The downloaded bundle does not match the manifest checksum.
    Integrity { expected: String, actual: String },
    Io(std::io::Error),
    /// `fetch_update` or `reload` was called with nothing to act on.
    NothingPending,
    /// The update task died before reporting back.
    Interrupted(String),
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateError::Config(msg) => write!(f, "config error: {msg}"),
            UpdateError::Network(msg) => write!(f, "network error: {msg}"),
            UpdateError::Api { status, message } => {
                write!(f, "update server error (HTTP {status}): {message}")
            }
            UpdateError::Parse(msg) => write!(f, "parse error: {msg}"),
            UpdateError::Integrity { expected, actual } => {
                write!(f, "checksum mismatch: expected {expected}, got {actual}")
            }
            UpdateError::Io(e) => write!(f, "I/O error: {e}"),
            UpdateError::NothingPending => write!(f, "no update pending"),
            UpdateError::Interrupted(msg) => write!(f, "update task interrupted: {msg}"),
        }
    }
}

impl std::error::Error for UpdateError {}

impl From<std::io::Error> for UpdateError {
    fn from(e: std::io::Error) -> Self {
        UpdateError::Io(e)
    }
}

/// Answer to "is there a newer bundle?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheck {
    pub is_available: bool,
    /// Version on offer, when the service reports one.
    pub version: Option<String>,
}

#[async_trait]
pub trait UpdateClient: Send + Sync {
    /// Returns the name of the update source (for logs).
    fn name(&self) -> &str;

    async fn check_for_update(&self) -> Result<UpdateCheck, UpdateError>;

    /// Downloads and verifies the bundle found by the last check.
    async fn fetch_update(&self) -> Result<(), UpdateError>;

    /// Swaps the fetched bundle in. On success the caller must restart the process.
    async fn reload(&self) -> Result<(), UpdateError>;
}

/// Stand-in used when updates cannot be set up. Every check fails with
/// the reason given at construction.
pub struct UnconfiguredUpdates {
    reason: String,
}

impl UnconfiguredUpdates {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl UpdateClient for UnconfiguredUpdates {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn check_for_update(&self) -> Result<UpdateCheck, UpdateError> {
        Err(UpdateError::Config(self.reason.clone()))
    }

    async fn fetch_update(&self) -> Result<(), UpdateError> {
        Err(UpdateError::NothingPending)
    }

    async fn reload(&self) -> Result<(), UpdateError> {
        Err(UpdateError::NothingPending)
    }
}

/// Builds the update source for `config`, replacing the binary at
/// `install_path` when an update is applied.
pub fn from_config(config: &ResolvedConfig, install_path: &Path) -> Arc<dyn UpdateClient> {
    let Some(manifest_url) = config.manifest_url.clone() else {
        info!("No update manifest configured; update checks will fail");
        return Arc::new(UnconfiguredUpdates::new("no update manifest URL configured"));
    };
    match Version::parse(config.current_version.trim_start_matches('v')) {
        Ok(version) => {
            info!("Update manifest: {} (current {})", manifest_url, version);
            Arc::new(HttpUpdateClient::new(
                manifest_url,
                version,
                install_path.to_path_buf(),
            ))
        }
        Err(e) => {
            warn!("Current version {:?} is not semver: {}", config.current_version, e);
            Arc::new(UnconfiguredUpdates::new(format!(
                "current version {:?} is not a valid version",
                config.current_version
            )))
        }
    }
}

/// Replaces the current process with a fresh copy of `exe`, same arguments.
///
/// `exe` must be resolved before the binary is swapped: once the old file is
/// replaced, `current_exe()` on Linux points at a deleted inode.
/// Only returns on failure.
pub fn restart_process(exe: &Path) -> std::io::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    info!("Restarting into {}", exe.display());

    #[cfg(unix)]
    let result: std::io::Result<()> = {
        use std::os::unix::process::CommandExt;
        Err(std::process::Command::new(exe).args(&args).exec())
    };

    #[cfg(not(unix))]
    let result: std::io::Result<()> = {
        std::process::Command::new(exe).args(&args).spawn()?;
        std::process::exit(0)
    };

    result
}
