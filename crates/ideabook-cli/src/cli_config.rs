//! Persistent CLI configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use ideabook_core::remote::{GitHubClientOptions, DEFAULT_API_BASE_URL};
use ideabook_core::util::{has_http_scheme, normalize_text_option};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment override for the API base URL.
pub const API_URL_ENV: &str = "IDEABOOK_API_URL";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// OS keychain
    Keychain,
    /// `github_token.json` in the data directory
    #[default]
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub authorized_login: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub credential_store: CredentialBackend,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            api_base_url: None,
            authorized_login: None,
            request_timeout_secs: None,
            credential_store: CredentialBackend::default(),
        }
    }
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join("ideabook").join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

impl CliConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Base URL from `IDEABOOK_API_URL`, then the config file, then GitHub.
    pub fn resolved_api_base_url(&self) -> String {
        resolve_api_base_url(
            normalize_text_option(std::env::var(API_URL_ENV).ok()),
            self.api_base_url.clone(),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn client_options(&self) -> GitHubClientOptions {
        GitHubClientOptions {
            base_url: self.resolved_api_base_url(),
            request_timeout: self.request_timeout(),
        }
    }

    pub fn authorized_login(&self) -> Option<String> {
        normalize_text_option(self.authorized_login.clone())
    }

    fn normalize(&mut self) {
        self.api_base_url = normalize_text_option(self.api_base_url.clone())
            .map(|url| url.trim_end_matches('/').to_string());
        self.authorized_login = normalize_text_option(self.authorized_login.clone());
    }
}

pub fn resolve_api_base_url(env_value: Option<String>, configured: Option<String>) -> String {
    normalize_text_option(env_value)
        .or_else(|| normalize_text_option(configured))
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
}

pub fn normalize_api_base_url(value: String) -> Result<String, String> {
    let value = normalize_text_option(Some(value))
        .ok_or_else(|| "API base URL must not be empty".to_string())?;
    if !has_http_scheme(&value) {
        return Err("API base URL must include http:// or https://".to_string());
    }
    Ok(value.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn config_roundtrip_normalizes_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let config = CliConfig {
            api_base_url: Some(" https://ghe.example.com/api/v3/ ".to_string()),
            authorized_login: Some(" octocat ".to_string()),
            request_timeout_secs: Some(10),
            credential_store: CredentialBackend::Keychain,
            ..CliConfig::default()
        };

        config.save_to_path(&path).unwrap();
        let loaded = CliConfig::load_from_path(&path).unwrap();
        assert_eq!(
            loaded.api_base_url.as_deref(),
            Some("https://ghe.example.com/api/v3")
        );
        assert_eq!(loaded.authorized_login().as_deref(), Some("octocat"));
        assert_eq!(loaded.request_timeout(), Duration::from_secs(10));
        assert_eq!(loaded.credential_store, CredentialBackend::Keychain);
    }

    #[test]
    fn missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = CliConfig::load_from_path(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(loaded, CliConfig::default());
        assert_eq!(loaded.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn older_config_without_new_fields_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"version":1}"#).unwrap();

        let loaded = CliConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.credential_store, CredentialBackend::File);
    }

    #[test]
    fn api_base_url_prefers_env_then_config() {
        assert_eq!(
            resolve_api_base_url(
                Some("http://127.0.0.1:9000".to_string()),
                Some("https://ghe.example.com/api/v3".to_string())
            ),
            "http://127.0.0.1:9000"
        );
        assert_eq!(
            resolve_api_base_url(Some(" ".to_string()), Some("https://ghe.example.com/api/v3".to_string())),
            "https://ghe.example.com/api/v3"
        );
        assert_eq!(resolve_api_base_url(None, None), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn normalize_api_base_url_requires_http_scheme() {
        assert_eq!(
            normalize_api_base_url("https://ghe.example.com/api/v3/".to_string()).unwrap(),
            "https://ghe.example.com/api/v3"
        );
        assert!(normalize_api_base_url("ghe.example.com".to_string()).is_err());
        assert!(normalize_api_base_url("  ".to_string()).is_err());
    }
}
