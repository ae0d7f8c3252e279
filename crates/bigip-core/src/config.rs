//! Configuration structures for BIG-IP clients.
//!
//! This module provides the connection configuration shared by every BIG-IP client crate:
//! management address, credentials, TLS behaviour and request limits.

use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Login provider used for local BIG-IP accounts.
pub const DEFAULT_LOGIN_PROVIDER: &str = "tmos";

/// Connection configuration for a BIG-IP device.
///
/// Credentials are kept in [`SecretString`]s and are never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BigIpConfig {
    /// Management base URL (e.g. `https://10.0.0.10`)
    ///
    /// Bare addresses (`10.0.0.10`, `bigip.lab:8443`) are given the `https://` scheme when
    /// deserialized.
    #[validate(url)]
    #[serde(deserialize_with = "deserialize_host")]
    pub host: String,

    /// Account used for basic authentication or token login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Account password
    #[serde(default, skip_serializing)]
    pub password: Option<SecretString>,

    /// Pre-issued `X-F5-Auth-Token`
    #[serde(default, skip_serializing)]
    pub token: Option<SecretString>,

    /// Login provider for token authentication (`tmos`, a remote provider name, ...)
    ///
    /// When set and no token is present, clients log in and use token authentication
    /// instead of basic authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_provider: Option<String>,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to custom CA certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum number of retry attempts
    #[validate(range(min = 0, max = 10))]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_max_retries() -> u32 {
    3
}

/// Adds the `https://` scheme when the host was given as a bare address.
fn normalize_host(host: &str) -> String {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

fn deserialize_host<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|host| normalize_host(&host))
}

impl BigIpConfig {
    /// Create a new configuration for the given management address.
    ///
    /// # Arguments
    ///
    /// * `host` - Management address, with or without scheme (`10.0.0.10`, `https://bigip.lab`)
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(host: impl AsRef<str>) -> Result<Self, Error> {
        let config = Self {
            host: normalize_host(host.as_ref()),
            ..Self::default()
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Set username and password.
    #[must_use]
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Set a pre-issued authentication token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Request token authentication through the given login provider.
    #[must_use]
    pub fn with_login_provider(mut self, provider: impl Into<String>) -> Self {
        self.login_provider = Some(provider.into());
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set maximum retry attempts.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns true if a token must be obtained before issuing requests.
    #[must_use]
    pub fn needs_login(&self) -> bool {
        self.token.is_none() && self.login_provider.is_some()
    }

    /// Returns the username and exposed password when both are configured.
    #[must_use]
    pub fn basic_credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.expose_secret())),
            _ => None,
        }
    }

    /// Parse and validate the management URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or has no host to address.
    pub fn parse_host_url(&self) -> Result<Url, Error> {
        let url = Url::parse(&normalize_host(&self.host))
            .map_err(|e| Error::ConfigError(format!("Invalid BIG-IP URL: {e}")))?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(Error::ConfigError(format!(
                "Invalid BIG-IP URL: `{}` has no host",
                self.host
            )));
        }
        Ok(url)
    }
}

impl Default for BigIpConfig {
    fn default() -> Self {
        Self {
            host: "https://localhost".to_string(),
            username: None,
            password: None,
            token: None,
            login_provider: None,
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}
