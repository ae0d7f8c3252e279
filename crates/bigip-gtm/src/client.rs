//! Asynchronous GTM client implementation.

use crate::models::{
    GtmDatacenter, GtmDatacenters, GtmPool, GtmPoolMember, GtmPoolMembers, GtmPools, GtmServer,
    GtmServers, GtmWideIp, GtmWideIps, RecordType,
};
use crate::Result;
use bigip_core::client::{
    ClientConfig, RetryPolicy, ServiceClient, ServiceClientBuilder, GTM_DEFAULT_TIMEOUT,
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

const USER_AGENT: &str = concat!("bigip-gtm/", env!("CARGO_PKG_VERSION"));

const WIDE_IP: &str = "wideip";
const POOL: &str = "pool";
const MEMBERS: &str = "members";
const DATACENTER: &str = "datacenter";
const SERVER: &str = "server";

/// Builder for [`GtmClient`].
#[derive(Debug, Clone)]
pub struct GtmClientBuilder {
    inner: ServiceClientBuilder,
}

impl GtmClientBuilder {
    /// Create a builder for the specified device URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let builder = ServiceClientBuilder::new(
            BigIpService::Gtm,
            base_url,
            Duration::from_secs(GTM_DEFAULT_TIMEOUT),
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
        let builder = ServiceClientBuilder::from_config(BigIpService::Gtm, config)?
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
    pub fn build(self) -> Result<GtmClient> {
        let inner = self.inner.build()?;
        Ok(GtmClient { inner })
    }
}

/// Asynchronous client for the GTM (BIG-IP DNS) module.
///
/// Object names may be bare (`www.example.com`) or full paths
/// (`/Tenant/www.example.com`); full paths are sent in `~Tenant~www.example.com` form.
#[derive(Debug, Clone)]
pub struct GtmClient {
    inner: ServiceClient,
}

impl GtmClient {
    /// Construct a client directly from the device URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        GtmClientBuilder::new(base_url)?.build()
    }

    /// Construct a client from a connection configuration without logging in.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured host is invalid.
    pub fn from_config(config: &BigIpConfig) -> Result<Self> {
        GtmClientBuilder::from_config(config)?.build()
    }

    /// Construct a client, logging in first when the configuration asks for a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the login fails or the configuration is invalid.
    pub async fn connect(config: &BigIpConfig) -> Result<Self> {
        let config = authenticate(config).await?;
        debug!(host = %config.host, "connecting GTM client");
        Self::from_config(&config)
    }

    /// Return the device URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    // Wide IPs

    /// List wide IPs of a record type.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_wide_ips(&self, record_type: RecordType) -> Result<Vec<GtmWideIp>> {
        self.list_wide_ips_with(record_type, &CollectionQuery::default())
            .await
    }

    /// List wide IPs of a record type with collection options.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_wide_ips_with(
        &self,
        record_type: RecordType,
        query: &CollectionQuery,
    ) -> Result<Vec<GtmWideIp>> {
        let wide_ips: GtmWideIps = self
            .inner
            .get_json(&[WIDE_IP, record_type.as_segment()], &query.to_pairs())
            .await?;
        Ok(wide_ips.into_items())
    }

    /// Fetch a wide IP by name or full path, returning `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error for failures other than a missing wide IP.
    pub async fn get_wide_ip(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Option<GtmWideIp>> {
        let segment = escape_name(name);
        self.inner
            .get_optional_json(&[WIDE_IP, record_type.as_segment(), &segment], &[])
            .await
    }

    /// Create a wide IP.
    ///
    /// Returns the stored wide IP when the device echoes it back, or `None` when the
    /// response has no body.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the configuration.
    pub async fn add_wide_ip(
        &self,
        config: &GtmWideIp,
        record_type: RecordType,
    ) -> Result<Option<GtmWideIp>> {
        self.inner
            .send_json_optional(
                Method::POST,
                &[WIDE_IP, record_type.as_segment()],
                Some(config),
                &[],
            )
            .await
    }

    /// Delete a wide IP.
    ///
    /// # Errors
    ///
    /// Returns an error if the wide IP does not exist.
    pub async fn delete_wide_ip(&self, full_path: &str, record_type: RecordType) -> Result<()> {
        let segment = escape_name(full_path);
        self.inner
            .delete(&[WIDE_IP, record_type.as_segment(), &segment])
            .await
    }

    /// Replace the configuration of a wide IP.
    ///
    /// Returns the updated wide IP, or `None` when the response has no body.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the configuration.
    pub async fn modify_wide_ip(
        &self,
        full_path: &str,
        config: &GtmWideIp,
        record_type: RecordType,
    ) -> Result<Option<GtmWideIp>> {
        let segment = escape_name(full_path);
        self.inner
            .send_json_optional(
                Method::PUT,
                &[WIDE_IP, record_type.as_segment(), &segment],
                Some(config),
                &[],
            )
            .await
    }

    // Pools

    /// List pools of a record type.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_pools(&self, record_type: RecordType) -> Result<Vec<GtmPool>> {
        self.list_pools_with(record_type, &CollectionQuery::default())
            .await
    }

    /// List pools of a record type with collection options, e.g. expanded members.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_pools_with(
        &self,
        record_type: RecordType,
        query: &CollectionQuery,
    ) -> Result<Vec<GtmPool>> {
        let pools: GtmPools = self
            .inner
            .get_json(&[POOL, record_type.as_segment()], &query.to_pairs())
            .await?;
        Ok(pools.into_items())
    }

    /// Fetch a pool, returning `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error for failures other than a missing pool.
    pub async fn get_pool(&self, name: &str, record_type: RecordType) -> Result<Option<GtmPool>> {
        let segment = escape_name(name);
        self.inner
            .get_optional_json(&[POOL, record_type.as_segment(), &segment], &[])
            .await
    }

    /// Create a pool. `None` means the device answered without a body.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the configuration.
    pub async fn add_pool(
        &self,
        config: &GtmPool,
        record_type: RecordType,
    ) -> Result<Option<GtmPool>> {
        self.inner
            .send_json_optional(
                Method::POST,
                &[POOL, record_type.as_segment()],
                Some(config),
                &[],
            )
            .await
    }

    /// Delete a pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool does not exist or is still referenced.
    pub async fn delete_pool(&self, name: &str, record_type: RecordType) -> Result<()> {
        let segment = escape_name(name);
        self.inner
            .delete(&[POOL, record_type.as_segment(), &segment])
            .await
    }

    /// Replace the configuration of a pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the configuration.
    pub async fn modify_pool(
        &self,
        name: &str,
        config: &GtmPool,
        record_type: RecordType,
    ) -> Result<Option<GtmPool>> {
        let segment = escape_name(name);
        self.inner
            .send_json_optional(
                Method::PUT,
                &[POOL, record_type.as_segment(), &segment],
                Some(config),
                &[],
            )
            .await
    }

    /// List the members of a pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool does not exist.
    pub async fn list_pool_members(
        &self,
        pool: &str,
        record_type: RecordType,
    ) -> Result<Vec<GtmPoolMember>> {
        let segment = escape_name(pool);
        let members: GtmPoolMembers = self
            .inner
            .get_json(&[POOL, record_type.as_segment(), &segment, MEMBERS], &[])
            .await?;
        Ok(members.into_items())
    }

    /// Add a member to a pool. `None` means the device answered without a body.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the member.
    pub async fn add_pool_member(
        &self,
        pool: &str,
        member: &GtmPoolMember,
        record_type: RecordType,
    ) -> Result<Option<GtmPoolMember>> {
        let segment = escape_name(pool);
        self.inner
            .send_json_optional(
                Method::POST,
                &[POOL, record_type.as_segment(), &segment, MEMBERS],
                Some(member),
                &[],
            )
            .await
    }

    /// Remove a member from a pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the member does not exist.
    pub async fn delete_pool_member(
        &self,
        pool: &str,
        member: &str,
        record_type: RecordType,
    ) -> Result<()> {
        let pool_segment = escape_name(pool);
        let member_segment = escape_name(member);
        self.inner
            .delete(&[
                POOL,
                record_type.as_segment(),
                &pool_segment,
                MEMBERS,
                &member_segment,
            ])
            .await
    }

    // Data centers

    /// List data centers.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_datacenters(&self) -> Result<Vec<GtmDatacenter>> {
        let datacenters: GtmDatacenters = self.inner.get_json(&[DATACENTER], &[]).await?;
        Ok(datacenters.into_items())
    }

    /// Fetch a data center, returning `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error for failures other than a missing data center.
    pub async fn get_datacenter(&self, name: &str) -> Result<Option<GtmDatacenter>> {
        let segment = escape_name(name);
        self.inner
            .get_optional_json(&[DATACENTER, &segment], &[])
            .await
    }

    /// Create a data center.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the configuration.
    pub async fn add_datacenter(
        &self,
        config: &GtmDatacenter,
    ) -> Result<Option<GtmDatacenter>> {
        self.inner
            .send_json_optional(Method::POST, &[DATACENTER], Some(config), &[])
            .await
    }

    /// Delete a data center.
    ///
    /// # Errors
    ///
    /// Returns an error if the data center does not exist or still hosts servers.
    pub async fn delete_datacenter(&self, name: &str) -> Result<()> {
        let segment = escape_name(name);
        self.inner.delete(&[DATACENTER, &segment]).await
    }

    /// Replace the configuration of a data center.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the configuration.
    pub async fn modify_datacenter(
        &self,
        name: &str,
        config: &GtmDatacenter,
    ) -> Result<Option<GtmDatacenter>> {
        let segment = escape_name(name);
        self.inner
            .send_json_optional(Method::PUT, &[DATACENTER, &segment], Some(config), &[])
            .await
    }

    // Servers

    /// List servers.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_servers(&self) -> Result<Vec<GtmServer>> {
        let servers: GtmServers = self.inner.get_json(&[SERVER], &[]).await?;
        Ok(servers.into_items())
    }

    /// Fetch a server, returning `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error for failures other than a missing server.
    pub async fn get_server(&self, name: &str) -> Result<Option<GtmServer>> {
        let segment = escape_name(name);
        self.inner.get_optional_json(&[SERVER, &segment], &[]).await
    }

    /// Create a server.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the configuration.
    pub async fn add_server(&self, config: &GtmServer) -> Result<Option<GtmServer>> {
        self.inner
            .send_json_optional(Method::POST, &[SERVER], Some(config), &[])
            .await
    }

    /// Delete a server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not exist or is referenced by a pool.
    pub async fn delete_server(&self, name: &str) -> Result<()> {
        let segment = escape_name(name);
        self.inner.delete(&[SERVER, &segment]).await
    }

    /// Replace the configuration of a server.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the configuration.
    pub async fn modify_server(
        &self,
        name: &str,
        config: &GtmServer,
    ) -> Result<Option<GtmServer>> {
        let segment = escape_name(name);
        self.inner
            .send_json_optional(Method::PUT, &[SERVER, &segment], Some(config), &[])
            .await
    }
}
