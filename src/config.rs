//! Profile configuration and credentials.
//!
//! Endpoint settings and secrets live in two separate JSON files so
//! that credentials can be rotated independently of host configuration:
//!
//! - `~/.config/agcloud/config.json` - hosts, per profile
//! - `~/.config/agcloud/credentials.json` - client id/secret and cache
//!   password, per profile
//!
//! Each file maps a profile name to its section. An absent profile name
//! resolves to `"default"`. A profile missing from either file is fatal
//! at construction - nothing downstream can work without a host or a
//! credential.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::Error;

/// Directory name under the user config dir
const APP_NAME: &str = "agcloud";

/// Settings file name (non-secret)
const CONFIG_FILE: &str = "config.json";

/// Credentials file name (secret)
const CREDENTIALS_FILE: &str = "credentials.json";

/// Fallback profile name when the caller does not pass one
pub const DEFAULT_PROFILE: &str = "default";

/// Non-secret endpoint settings for one profile.
#[derive(Debug, Clone, Deserialize)]
struct Settings {
    api_host: String,
    cache_host: String,
}

/// Secrets for one profile.
#[derive(Debug, Clone, Deserialize)]
struct Credentials {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    cache_password: Option<String>,
}

/// Resolved configuration for one profile. Immutable for the process
/// lifetime once loaded.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    pub profile: String,
    pub api_host: String,
    pub cache_host: String,
    pub client_id: String,
    pub client_secret: String,
    pub cache_password: Option<String>,
}

impl ProfileConfig {
    /// Load a profile from the default config directory.
    pub fn load(profile: Option<&str>) -> Result<Self, Error> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("could not find config directory".to_string()))?
            .join(APP_NAME);
        Self::load_from(&dir, profile)
    }

    /// Load a profile from an explicit base directory.
    pub fn load_from(dir: &Path, profile: Option<&str>) -> Result<Self, Error> {
        let profile = profile.unwrap_or(DEFAULT_PROFILE);
        info!(profile, "loading profile configuration");

        let settings: Settings = read_section(&dir.join(CONFIG_FILE), profile)?;
        let credentials: Credentials = read_section(&dir.join(CREDENTIALS_FILE), profile)?;

        Ok(Self {
            profile: profile.to_string(),
            api_host: settings.api_host,
            cache_host: settings.cache_host,
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            cache_password: credentials.cache_password,
        })
    }

    /// Connection URL for the shared token cache backend.
    pub fn cache_url(&self) -> String {
        match &self.cache_password {
            Some(password) => format!("redis://:{}@{}", password, self.cache_host),
            None => format!("redis://{}", self.cache_host),
        }
    }

    /// Default config directory path, for diagnostics.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_NAME))
    }
}

/// Read one profile section out of a profile-keyed JSON file.
fn read_section<T: serde::de::DeserializeOwned>(path: &Path, profile: &str) -> Result<T, Error> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
    let mut sections: HashMap<String, T> = serde_json::from_str(&contents)
        .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
    sections
        .remove(profile)
        .ok_or_else(|| Error::ProfileNotFound(profile.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(dir: &Path) {
        std::fs::write(
            dir.join(CONFIG_FILE),
            r#"{
                "default": {"api_host": "https://api.example.com", "cache_host": "cache.example.com"},
                "staging": {"api_host": "https://staging.example.com", "cache_host": "cache-staging.example.com"}
            }"#,
        )
        .unwrap();
        std::fs::write(
            dir.join(CREDENTIALS_FILE),
            r#"{
                "default": {"client_id": "id-1", "client_secret": "secret-1", "cache_password": "hunter2"},
                "staging": {"client_id": "id-2", "client_secret": "secret-2"}
            }"#,
        )
        .unwrap();
    }

    #[test]
    fn test_load_default_profile() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let config = ProfileConfig::load_from(dir.path(), None).unwrap();
        assert_eq!(config.profile, "default");
        assert_eq!(config.api_host, "https://api.example.com");
        assert_eq!(config.client_id, "id-1");
        assert_eq!(config.cache_url(), "redis://:hunter2@cache.example.com");
    }

    #[test]
    fn test_load_named_profile() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let config = ProfileConfig::load_from(dir.path(), Some("staging")).unwrap();
        assert_eq!(config.api_host, "https://staging.example.com");
        assert_eq!(config.client_secret, "secret-2");
        // No cache password configured for staging
        assert_eq!(config.cache_url(), "redis://cache-staging.example.com");
    }

    #[test]
    fn test_missing_profile_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let err = ProfileConfig::load_from(dir.path(), Some("production")).unwrap_err();
        assert!(matches!(err, Error::ProfileNotFound(p) if p == "production"));
    }

    #[test]
    fn test_missing_credentials_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"default": {"api_host": "https://api.example.com", "cache_host": "cache"}}"#,
        )
        .unwrap();

        let err = ProfileConfig::load_from(dir.path(), None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
