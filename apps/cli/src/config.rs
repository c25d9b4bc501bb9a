//! Client configuration management.
//!
//! Reads/writes TOML at `~/.config/slicedrop/client.toml`
//! (`%APPDATA%\slicedrop\client.toml` on Windows). A missing file is
//! created with the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use slicedrop_transfer::TransferConfig;

/// On-disk client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the store API.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Where downloaded files are written.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Per-request timeout for store calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(flatten)]
    pub transfer: TransferConfig,
}

fn default_server_url() -> String {
    "http://localhost:8080".into()
}

fn default_download_dir() -> PathBuf {
    home_dir().join("Downloads")
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            download_dir: default_download_dir(),
            request_timeout_secs: default_request_timeout_secs(),
            transfer: TransferConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default location.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Loads configuration from `path`, writing the defaults there if the
    /// file does not exist yet.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!(path = %path.display(), "wrote default configuration");
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        match toml::from_str::<ClientConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse client config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

pub fn config_file_path() -> PathBuf {
    config_base_dir().join("slicedrop").join("client.toml")
}

fn config_base_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata)
    }

    #[cfg(not(target_os = "windows"))]
    {
        home_dir().join(".config")
    }
}

fn home_dir() -> PathBuf {
    let var = if cfg!(target_os = "windows") {
        "USERPROFILE"
    } else {
        "HOME"
    };
    std::env::var_os(var)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}
