//! Asynchronous partition client implementation.

use crate::models::{Partition, Partitions};
use crate::Result;
use bigip_core::client::{
    ClientConfig, RetryPolicy, ServiceClient, ServiceClientBuilder, AUTH_DEFAULT_TIMEOUT,
};
use bigip_core::config::BigIpConfig;
use bigip_core::path::escape_name;
use bigip_core::query::CollectionQuery;
use bigip_core::session::authenticate;
use bigip_core::types::BigIpService;
use reqwest::Method;
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("bigip-auth/", env!("CARGO_PKG_VERSION"));

const PARTITION: &str = "partition";

/// Builder for [`AuthClient`].
#[derive(Debug, Clone)]
pub struct AuthClientBuilder {
    inner: ServiceClientBuilder,
}

impl AuthClientBuilder {
    /// Create a builder for the specified device URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let builder = ServiceClientBuilder::new(
            BigIpService::Auth,
            base_url,
            Duration::from_secs(AUTH_DEFAULT_TIMEOUT),
        )?
        .with_user_agent(USER_AGENT);

        Ok(Self { inner: builder })
    }

    /// Create a builder from a connection configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured host is invalid.
    pub fn from_config(config: &BigIpConfig) -> Result<Self> {
        let builder = ServiceClientBuilder::from_config(BigIpService::Auth, config)?
            .with_user_agent(USER_AGENT);
        Ok(Self { inner: builder })
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.inner = self.inner.with_retry_policy(retry);
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.inner = self.inner.with_http_config(config);
        self
    }

    /// Configure HTTP basic authentication credentials.
    #[must_use]
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.inner = self.inner.with_basic_auth(username, password);
        self
    }

    /// Configure an X-F5-Auth-Token header.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.inner = self.inner.with_token(token);
        self
    }

    /// Enable or disable certificate verification.
    #[must_use]
    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.inner = self.inner.with_tls_verify(verify);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn build(self) -> Result<AuthClient> {
        let inner = self.inner.build()?;
        Ok(AuthClient { inner })
    }
}

/// Asynchronous client for administrative partitions.
#[derive(Debug, Clone)]
pub struct AuthClient {
    inner: ServiceClient,
}

impl AuthClient {
    /// Construct a client directly from the device URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        AuthClientBuilder::new(base_url)?.build()
    }

    /// Construct a client from a connection configuration without logging in.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured host is invalid.
    pub fn from_config(config: &BigIpConfig) -> Result<Self> {
        AuthClientBuilder::from_config(config)?.build()
    }

    /// Construct a client, logging in first when the configuration asks for a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the login fails or the configuration is invalid.
    pub async fn connect(config: &BigIpConfig) -> Result<Self> {
        let config = authenticate(config).await?;
        debug!(host = %config.host, "connecting partition client");
        Self::from_config(&config)
    }

    /// Return the device URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    /// List all partitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_partitions(&self) -> Result<Vec<Partition>> {
        self.list_partitions_with(&CollectionQuery::default()).await
    }

    /// List partitions with collection options.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_partitions_with(&self, query: &CollectionQuery) -> Result<Vec<Partition>> {
        let partitions: Partitions = self
            .inner
            .get_json(&[PARTITION], &query.to_pairs())
            .await?;
        Ok(partitions.into_items())
    }

    /// Fetch a partition by name, returning `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error for failures other than a missing partition.
    pub async fn get_partition(&self, name: &str) -> Result<Option<Partition>> {
        let segment = escape_name(name);
        self.inner
            .get_optional_json(&[PARTITION, &segment], &[])
            .await
    }

    /// Create a partition.
    ///
    /// Returns the stored partition, or `None` when the device answers without a body.
    ///
    /// # Errors
    ///
    /// Returns [`bigip_core::Error::Conflict`] if it already exists.
    pub async fn add_partition(&self, partition: &Partition) -> Result<Option<Partition>> {
        self.inner
            .send_json_optional(Method::POST, &[PARTITION], Some(partition), &[])
            .await
    }

    /// Delete a partition.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition does not exist or still holds objects.
    pub async fn delete_partition(&self, name: &str) -> Result<()> {
        let segment = escape_name(name);
        self.inner.delete(&[PARTITION, &segment]).await
    }

    /// Replace the configuration of a partition.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn modify_partition(
        &self,
        name: &str,
        partition: &Partition,
    ) -> Result<Option<Partition>> {
        let segment = escape_name(name);
        self.inner
            .send_json_optional(Method::PUT, &[PARTITION, &segment], Some(partition), &[])
            .await
    }
}
