//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.pushbox/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::notification::DEFAULT_TITLE;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PushboxConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub updates: UpdatesConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub placeholder_title: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PushConfig {
    pub base_url: Option<String>,
    pub client_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdatesConfig {
    pub manifest_url: Option<String>,
    pub current_version: Option<String>,
}

// ============================================================================
// Resolved Config (concrete values where a default exists)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub placeholder_title: String,
    /// `None` disables messaging.
    pub push_base_url: Option<String>,
    pub client_name: String,
    /// `None` makes every update check fail.
    pub manifest_url: Option<String>,
    pub current_version: String,
}

/// CLI overrides (None = not specified).
#[derive(Debug, Default)]
pub struct CliOverrides<'a> {
    pub push_url: Option<&'a str>,
    pub update_url: Option<&'a str>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.pushbox/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".pushbox").join("config.toml"))
}

/// Load config from `path`, or `~/.pushbox/config.toml` when `path` is None.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `PushboxConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config(path: Option<&Path>) -> Result<PushboxConfig, ConfigError> {
    let path = match path.map(Path::to_path_buf).or_else(config_path) {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(PushboxConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(PushboxConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config = parse_config(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<PushboxConfig, ConfigError> {
    toml::from_str(contents).map_err(ConfigError::Parse)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# pushbox configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# placeholder_title = "New Notification"   # Title for notifications sent without one

# [push]
# base_url = "https://push.example.com/v1"  # Or set PUSHBOX_PUSH_URL; unset disables notifications
# client_name = "my-laptop"                 # Or set PUSHBOX_CLIENT_NAME; defaults to "pushbox"

# [updates]
# manifest_url = "https://updates.example.com/pushbox/manifest.json"  # Or set PUSHBOX_UPDATE_URL
# current_version = "0.1.0"                 # Defaults to the built version
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &PushboxConfig, cli: &CliOverrides<'_>) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

/// Same as [`resolve`], reading environment variables through `env`.
pub fn resolve_with_env(
    config: &PushboxConfig,
    cli: &CliOverrides<'_>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Push gateway: CLI → env → config
    let push_base_url = cli
        .push_url
        .map(|s| s.to_string())
        .or_else(|| env("PUSHBOX_PUSH_URL"))
        .or_else(|| config.push.base_url.clone())
        .filter(|s| !s.trim().is_empty());

    // Client name: env → config → default
    let client_name = env("PUSHBOX_CLIENT_NAME")
        .or_else(|| config.push.client_name.clone())
        .unwrap_or_else(|| "pushbox".to_string());

    // Update manifest: CLI → env → config
    let manifest_url = cli
        .update_url
        .map(|s| s.to_string())
        .or_else(|| env("PUSHBOX_UPDATE_URL"))
        .or_else(|| config.updates.manifest_url.clone())
        .filter(|s| !s.trim().is_empty());

    ResolvedConfig {
        placeholder_title: config
            .general
            .placeholder_title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        push_base_url,
        client_name,
        manifest_url,
        current_version: config
            .updates
            .current_version
            .clone()
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved =
            resolve_with_env(&PushboxConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.placeholder_title, "New Notification");
        assert_eq!(resolved.client_name, "pushbox");
        assert_eq!(resolved.current_version, env!("CARGO_PKG_VERSION"));
        assert!(resolved.push_base_url.is_none());
        assert!(resolved.manifest_url.is_none());
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = PushboxConfig {
            general: GeneralConfig {
                placeholder_title: Some("Inbox".to_string()),
            },
            push: PushConfig {
                base_url: Some("http://gw".to_string()),
                client_name: Some("laptop".to_string()),
            },
            updates: UpdatesConfig {
                manifest_url: Some("http://up/manifest.json".to_string()),
                current_version: Some("1.2.3".to_string()),
            },
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.placeholder_title, "Inbox");
        assert_eq!(resolved.push_base_url.as_deref(), Some("http://gw"));
        assert_eq!(resolved.client_name, "laptop");
        assert_eq!(resolved.manifest_url.as_deref(), Some("http://up/manifest.json"));
        assert_eq!(resolved.current_version, "1.2.3");
    }

    #[test]
    fn test_env_beats_config_and_cli_beats_env() {
        let config = PushboxConfig {
            push: PushConfig {
                base_url: Some("http://from-config".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = |key: &str| match key {
            "PUSHBOX_PUSH_URL" => Some("http://from-env".to_string()),
            "PUSHBOX_UPDATE_URL" => Some("http://env-updates".to_string()),
            _ => None,
        };

        let resolved = resolve_with_env(&config, &CliOverrides::default(), env);
        assert_eq!(resolved.push_base_url.as_deref(), Some("http://from-env"));

        let cli = CliOverrides {
            push_url: Some("http://from-cli"),
            update_url: None,
        };
        let resolved = resolve_with_env(&config, &cli, env);
        assert_eq!(resolved.push_base_url.as_deref(), Some("http://from-cli"));
        assert_eq!(resolved.manifest_url.as_deref(), Some("http://env-updates"));
    }

    #[test]
    fn test_blank_url_counts_as_unset() {
        let cli = CliOverrides {
            push_url: Some("  "),
            update_url: Some(""),
        };
        let resolved = resolve_with_env(&PushboxConfig::default(), &cli, no_env);
        assert!(resolved.push_base_url.is_none());
        assert!(resolved.manifest_url.is_none());
    }

    #[test]
    fn test_toml_parses() {
        let toml_str = r#"
[general]
placeholder_title = "Ping"

[push]
base_url = "https://push.example.com/v1"
client_name = "desk"

[updates]
manifest_url = "https://updates.example.com/manifest.json"
"#;
        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.general.placeholder_title.as_deref(), Some("Ping"));
        assert_eq!(config.push.client_name.as_deref(), Some("desk"));
        assert!(config.updates.current_version.is_none());
    }

    #[test]
    fn test_sparse_toml_parses() {
        let config = parse_config("[push]\nbase_url = \"http://gw\"\n").unwrap();
        assert_eq!(config.push.base_url.as_deref(), Some("http://gw"));
        assert!(config.general.placeholder_title.is_none());
        assert!(config.updates.manifest_url.is_none());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = parse_config("[push\nbase_url = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("config parse error"));
    }

    #[test]
    fn test_missing_file_generates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = load_config(Some(&path)).unwrap();
        assert!(config.push.base_url.is_none());
        let generated = fs::read_to_string(&path).unwrap();
        assert!(generated.contains("[push]"));
        // The generated file is all comments, so it parses back to defaults.
        assert!(parse_config(&generated).unwrap().push.base_url.is_none());
    }
}
