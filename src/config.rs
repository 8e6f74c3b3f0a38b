//! Hostname and token resolution.
//!
//! The hostname comes from `FWS_HOSTNAME` and falls back to
//! [`DEFAULT_HOSTNAME`]. The token comes from the CLI credentials file
//! (`credentials.tfrc.json`), located through `TERRAFORM_CONFIG` or under
//! `$HOME/.terraform.d/`.

use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Hostname used when none is configured.
pub const DEFAULT_HOSTNAME: &str = "app.terraform.io";

/// Environment variable overriding the hostname.
pub const HOSTNAME_ENV: &str = "FWS_HOSTNAME";

/// Environment variable pointing at the credentials file.
pub const CONFIG_FILE_ENV: &str = "TERRAFORM_CONFIG";

/// Contents of a CLI credentials file, keyed by hostname.
///
/// ```json
/// { "credentials": { "app.terraform.io": { "token": "..." } } }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub credentials: HashMap<String, Credential>,
}

/// A single host's credential.
#[derive(Clone, Default, Deserialize)]
pub struct Credential {
    #[serde(default)]
    pub token: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("token", &"<redacted>").finish()
    }
}

impl Credentials {
    /// Reads a credentials file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::ConfigurationError`] if it is not valid JSON.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)?;
        serde_json::from_slice(&content).map_err(|e| {
            Error::ConfigurationError(format!(
                "invalid credentials file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Loads the CLI credentials file from its default location.
    ///
    /// Never fails: problems are logged and yield empty credentials.
    pub fn load() -> Self {
        let Some(path) = default_credentials_path() else {
            tracing::error!("Error detecting default CLI config file path");
            return Self::default();
        };

        match Self::from_path(&path) {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Error reading the CLI config file"
                );
                Self::default()
            }
        }
    }

    /// Returns the token stored for `hostname`.
    pub fn token(&self, hostname: &str) -> Option<&str> {
        self.credentials
            .get(hostname)
            .map(|credential| credential.token.as_str())
            .filter(|token| !token.is_empty())
    }
}

/// The credentials file path: `TERRAFORM_CONFIG`, or the file under `$HOME`.
pub fn default_credentials_path() -> Option<PathBuf> {
    credentials_path(
        std::env::var_os(CONFIG_FILE_ENV),
        std::env::var_os("HOME"),
    )
}

fn credentials_path(explicit: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }

    let home = home.filter(|h| !h.is_empty())?;
    Some(
        PathBuf::from(home)
            .join(".terraform.d")
            .join("credentials.tfrc.json"),
    )
}

/// Resolved connection settings for a [`Client`](crate::Client).
#[derive(Clone)]
pub struct ClientConfig {
    pub hostname: String,
    pub token: String,
}

impl ClientConfig {
    /// Resolves the hostname from the environment and the token from the CLI
    /// credentials file.
    ///
    /// The token is the file's entry for the resolved hostname, so pointing
    /// `FWS_HOSTNAME` at another host also switches credentials. With the
    /// default hostname this is the `app.terraform.io` entry.
    pub fn from_env() -> Self {
        let hostname = std::env::var(HOSTNAME_ENV)
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string());

        Self::with_credentials(hostname, &Credentials::load())
    }

    /// Picks the token for `hostname` out of `credentials`.
    ///
    /// The token is empty when no entry matches; building a client from such
    /// a config fails.
    pub fn with_credentials(hostname: impl Into<String>, credentials: &Credentials) -> Self {
        let hostname = hostname.into();
        let token = credentials.token(&hostname).unwrap_or_default().to_string();
        Self { hostname, token }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("hostname", &self.hostname)
            .field("token", &"<redacted>")
            .finish()
    }
}
