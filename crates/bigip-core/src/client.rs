//! HTTP client utilities and retry logic.
//!
//! This module provides HTTP client configuration, retry policies and the [`ServiceClient`]
//! used by every module crate to talk to the iControl REST API.

use crate::config::BigIpConfig;
use crate::error::{ApiErrorBody, Error, Result};
use crate::types::BigIpService;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;
use validator::Validate;

// Module-specific timeout configurations (in seconds)

/// Default timeout for `/mgmt/tm/auth` requests
pub const AUTH_DEFAULT_TIMEOUT: u64 = 30;

/// Default timeout for `/mgmt/tm/gtm` requests
pub const GTM_DEFAULT_TIMEOUT: u64 = 30;

/// Default timeout for `/mgmt/shared` requests (token login and management)
pub const SHARED_DEFAULT_TIMEOUT: u64 = 15;

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

// Retry settings

/// Default maximum number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default initial retry delay in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Default maximum retry delay in milliseconds (for exponential backoff)
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5000;

/// Header carrying an iControl REST authentication token.
pub const AUTH_TOKEN_HEADER: &str = "X-F5-Auth-Token";

const USER_AGENT: &str = concat!("bigip-core/", env!("CARGO_PKG_VERSION"));

/// Retry policy with exponential backoff.
///
/// Configures how HTTP requests should be retried on failure, using exponential
/// backoff to avoid overwhelming a busy management plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,

    /// Initial delay before first retry
    pub initial_delay: Duration,

    /// Maximum delay between retries (cap for exponential backoff)
    pub max_delay: Duration,

    /// Backoff multiplier (typically 2 for exponential backoff)
    pub backoff_multiplier: u32,
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            backoff_multiplier: 2,
        }
    }

    /// Create a retry policy with no retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            backoff_multiplier: 1,
        }
    }

    /// Set the maximum number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the initial delay.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    #[must_use]
    pub const fn with_backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate delay for a given attempt number.
    ///
    /// Uses exponential backoff: delay = min(initial_delay * multiplier^(attempt-1), max_delay)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_secs(0);
        }

        let multiplier = self.backoff_multiplier.saturating_pow(attempt - 1);
        let initial_ms = u64::try_from(self.initial_delay.as_millis()).unwrap_or(u64::MAX);
        let delay = Duration::from_millis(initial_ms.saturating_mul(u64::from(multiplier)));

        std::cmp::min(delay, self.max_delay)
    }

    /// Check if retries are enabled.
    #[must_use]
    pub const fn has_retries(&self) -> bool {
        self.max_retries > 0
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client configuration.
///
/// Configures HTTP client behavior including timeouts, retries, TLS and connection pooling.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Retry policy
    pub retry_policy: RetryPolicy,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Enable request logging
    pub enable_logging: bool,

    /// Enable response compression
    pub enable_compression: bool,

    /// Verify the device certificate
    pub tls_verify: bool,

    /// Additional trusted CA certificate (PEM)
    pub tls_ca_cert: Option<PathBuf>,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::new(),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            enable_logging: true,
            enable_compression: true,
            tls_verify: true,
            tls_ca_cert: None,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Disable retries.
    #[must_use]
    pub const fn without_retries(mut self) -> Self {
        self.retry_policy = RetryPolicy::no_retry();
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable logging.
    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }

    /// Enable or disable certificate verification.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Trust an additional CA certificate.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
enum Credentials {
    Basic {
        username: String,
        password: SecretString,
    },
    Token(SecretString),
}

/// Builder for [`ServiceClient`].
#[derive(Debug, Clone)]
pub struct ServiceClientBuilder {
    service: BigIpService,
    base_url: Url,
    http_config: ClientConfig,
    user_agent: String,
    credentials: Option<Credentials>,
}

impl ServiceClientBuilder {
    /// Create a builder for `service` on the device at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be parsed.
    pub fn new(service: BigIpService, base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let url = Url::parse(base_url.as_ref()).map_err(|err| {
            Error::ConfigError(format!(
                "Invalid BIG-IP base URL `{}`: {err}",
                base_url.as_ref()
            ))
        })?;

        Ok(Self {
            service,
            base_url: url,
            http_config: ClientConfig::new().with_timeout(timeout),
            user_agent: USER_AGENT.to_string(),
            credentials: None,
        })
    }

    /// Create a builder from a [`BigIpConfig`], applying its TLS, timeout, retry and
    /// credential settings. A configured token takes precedence over basic credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the configuration fails validation and
    /// [`Error::ConfigError`] if the configured host is not a usable URL.
    pub fn from_config(service: BigIpService, config: &BigIpConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.parse_host_url()?;
        let mut http_config = ClientConfig::new()
            .with_timeout(config.timeout())
            .with_retry_policy(RetryPolicy::new().with_max_retries(config.max_retries))
            .with_tls_verify(config.tls_verify);
        if let Some(ca_cert) = &config.tls_ca_cert {
            http_config = http_config.with_ca_cert(ca_cert.clone());
        }

        let credentials = if let Some(token) = &config.token {
            Some(Credentials::Token(token.clone()))
        } else {
            config
                .basic_credentials()
                .map(|(username, password)| Credentials::Basic {
                    username: username.to_string(),
                    password: SecretString::from(password.to_string()),
                })
        };

        Ok(Self {
            service,
            base_url,
            http_config,
            user_agent: USER_AGENT.to_string(),
            credentials,
        })
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.http_config.retry_policy = retry;
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Configure HTTP basic authentication credentials.
    #[must_use]
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::Basic {
            username: username.into(),
            password: SecretString::from(password.into()),
        });
        self
    }

    /// Configure an `X-F5-Auth-Token` header.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::Token(SecretString::from(token.into())));
        self
    }

    /// Enable or disable certificate verification.
    #[must_use]
    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.http_config.tls_verify = verify;
        self
    }

    /// Trust an additional CA certificate.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.http_config.tls_ca_cert = Some(path);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the CA certificate cannot be loaded or the HTTP client fails to build.
    pub fn build(self) -> Result<ServiceClient> {
        let mut builder = ClientBuilder::new()
            .user_agent(&self.user_agent)
            .timeout(self.http_config.timeout)
            .pool_idle_timeout(self.http_config.pool_idle_timeout)
            .pool_max_idle_per_host(self.http_config.pool_max_idle_per_host)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT));

        if !self.http_config.enable_compression {
            builder = builder.no_gzip();
        }

        if !self.http_config.tls_verify {
            warn!(service = %self.service, "TLS verification disabled for BIG-IP client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &self.http_config.tls_ca_cert {
            debug!("loading BIG-IP CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read BIG-IP CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes).map_err(|err| {
                Error::ConfigError(format!("Invalid BIG-IP CA certificate: {err}"))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build BIG-IP HTTP client: {err}"))
        })?;

        Ok(ServiceClient {
            service: self.service,
            http,
            base_url: self.base_url,
            retry_policy: self.http_config.retry_policy,
            credentials: self.credentials,
            enable_logging: self.http_config.enable_logging,
        })
    }
}

/// HTTP client bound to one BIG-IP REST module.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    service: BigIpService,
    http: Client,
    base_url: Url,
    retry_policy: RetryPolicy,
    credentials: Option<Credentials>,
    enable_logging: bool,
}

impl ServiceClient {
    /// Return the device base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Return the REST module this client addresses.
    #[must_use]
    pub const fn service(&self) -> BigIpService {
        self.service
    }

    /// Return the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Re-target the client at another module, sharing connection pool and credentials.
    #[must_use]
    pub fn for_service(&self, service: BigIpService) -> Self {
        let mut client = self.clone();
        client.service = service;
        client
    }

    /// Return a copy of this client authenticating with `token` instead.
    #[must_use]
    pub fn with_token(&self, token: SecretString) -> Self {
        let mut client = self.clone();
        client.credentials = Some(Credentials::Token(token));
        client
    }

    /// Build the URL of a resource below the module root.
    ///
    /// Each segment is encoded as exactly one path segment, so a `/` inside a segment is
    /// percent-encoded while `~` is kept as is.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                Error::InvalidEndpoint(format!(
                    "BIG-IP base URL `{}` cannot be a base",
                    self.base_url
                ))
            })?;
            path.pop_if_empty();
            path.extend(self.service.base_segments());
            path.extend(segments);
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(Credentials::Basic { username, password }) => {
                request.basic_auth(username, Some(password.expose_secret()))
            }
            Some(Credentials::Token(token)) => {
                request.header(AUTH_TOKEN_HEADER, token.expose_secret())
            }
            None => request,
        }
    }

    /// Execute a request, retrying transient failures of idempotent methods.
    ///
    /// `customize` is applied to every attempt (headers, body); `map_error` turns a
    /// non-success status and its body into an [`Error`].
    ///
    /// # Errors
    ///
    /// Returns the mapped error of the last attempt.
    pub async fn execute_with_retry<F, E>(
        &self,
        method: Method,
        segments: &[&str],
        params: &[(&'static str, String)],
        customize: F,
        map_error: E,
    ) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
        E: Fn(StatusCode, String) -> Error,
    {
        let url = self.endpoint(segments)?;
        let max_retries = if is_idempotent(&method) {
            self.retry_policy.max_retries
        } else {
            0
        };
        let mut attempt = 0;

        loop {
            let mut request = self.http.request(method.clone(), url.clone());
            if !params.is_empty() {
                request = request.query(params);
            }
            request = customize(self.authorize(request));

            if self.enable_logging {
                info!(service = %self.service, %method, path = url.path(), attempt, "BIG-IP request");
            }

            let error = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    map_error(status, text)
                }
                Err(err) => Error::from(err),
            };

            if !error.is_retryable() || attempt >= max_retries {
                return Err(error);
            }

            attempt += 1;
            let delay = self.retry_policy.delay_for_attempt(attempt);
            if delay > Duration::from_millis(0) {
                debug!("Retrying BIG-IP request after {:?}", delay);
                sleep(delay).await;
            }
        }
    }

    /// Send a request with an optional JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    pub async fn send_json<B, R>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
        params: &[(&'static str, String)],
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.send_with_body(method, segments, body, params).await?;
        let (status, bytes) = read_body(response).await?;
        decode_body(segments, status, &bytes)
    }

    /// Send a request with an optional JSON body, decoding the response only when the
    /// device returned one.
    ///
    /// BIG-IP may answer a create or modify with `204 No Content` or an empty `200`;
    /// both yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a non-empty body cannot be decoded.
    pub async fn send_json_optional<B, R>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
        params: &[(&'static str, String)],
    ) -> Result<Option<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.send_with_body(method, segments, body, params).await?;
        let (status, bytes) = read_body(response).await?;
        decode_optional_body(segments, status, &bytes)
    }

    async fn send_with_body<B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
        params: &[(&'static str, String)],
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.execute_with_retry(
            method,
            segments,
            params,
            |mut request| {
                request = request.header("Accept", "application/json");
                if let Some(payload) = body {
                    request = request.json(payload);
                }
                request
            },
            map_status_to_error,
        )
        .await
    }

    /// `GET` a resource and decode it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the resource does not exist.
    pub async fn get_json<R>(&self, segments: &[&str], params: &[(&'static str, String)]) -> Result<R>
    where
        R: DeserializeOwned,
    {
        self.send_json::<(), R>(Method::GET, segments, None, params)
            .await
    }

    /// `GET` a resource, returning `None` when the device reports it missing.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than a 404.
    pub async fn get_optional_json<R>(
        &self,
        segments: &[&str],
        params: &[(&'static str, String)],
    ) -> Result<Option<R>>
    where
        R: DeserializeOwned,
    {
        match self.get_json(segments, params).await {
            Ok(value) => Ok(Some(value)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// `DELETE` a resource, discarding the response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the request.
    pub async fn delete(&self, segments: &[&str]) -> Result<()> {
        self.execute_with_retry(
            Method::DELETE,
            segments,
            &[],
            |request| request,
            map_status_to_error,
        )
        .await
        .map(|_| ())
    }
}

fn is_idempotent(method: &Method) -> bool {
    [
        Method::GET,
        Method::HEAD,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ]
    .contains(method)
}

async fn read_body(response: Response) -> Result<(StatusCode, Vec<u8>)> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(|err| {
        Error::HttpError(format!("Failed to read BIG-IP response body: {err}"))
    })?;
    Ok((status, bytes.to_vec()))
}

fn is_empty_body(status: StatusCode, bytes: &[u8]) -> bool {
    status == StatusCode::NO_CONTENT || bytes.iter().all(u8::is_ascii_whitespace)
}

fn decode_body<R>(segments: &[&str], status: StatusCode, bytes: &[u8]) -> Result<R>
where
    R: DeserializeOwned,
{
    let path = segments.join("/");
    if is_empty_body(status, bytes) {
        serde_json::from_value(serde_json::Value::Null).map_err(|err| {
            Error::ParseError(format!(
                "Failed to parse empty BIG-IP response for `{path}`: {err}"
            ))
        })
    } else {
        serde_json::from_slice(bytes).map_err(|err| {
            Error::ParseError(format!("Failed to parse BIG-IP response for `{path}`: {err}"))
        })
    }
}

fn decode_optional_body<R>(
    segments: &[&str],
    status: StatusCode,
    bytes: &[u8],
) -> Result<Option<R>>
where
    R: DeserializeOwned,
{
    if is_empty_body(status, bytes) {
        return Ok(None);
    }
    serde_json::from_slice(bytes).map(Some).map_err(|err| {
        Error::ParseError(format!(
            "Failed to parse BIG-IP response for `{}`: {err}",
            segments.join("/")
        ))
    })
}

/// Map a non-success status and the response body to an [`Error`].
///
/// BIG-IP JSON error bodies are unwrapped to their `message`.
#[must_use]
pub fn map_status_to_error(status: StatusCode, text: String) -> Error {
    let message = ApiErrorBody::describe(&text);
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(message),
        StatusCode::BAD_REQUEST => Error::BadRequest(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Unauthorized(format!("BIG-IP authentication failed: {message}"))
        }
        StatusCode::CONFLICT => Error::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("BIG-IP temporarily unavailable: {message}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("BIG-IP server error {status}: {message}"))
        }
        status => Error::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new()
            .with_max_retries(2)
            .with_initial_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(2))
    }

    fn test_client(server: &MockServer) -> ServiceClient {
        ServiceClientBuilder::new(
            BigIpService::Gtm,
            server.uri(),
            Duration::from_secs(GTM_DEFAULT_TIMEOUT),
        )
        .unwrap()
        .with_retry_policy(fast_retry())
        .with_basic_auth("admin", "secret")
        .build()
        .unwrap()
    }

    #[test]
    fn test_timeout_constants() {
        assert_eq!(AUTH_DEFAULT_TIMEOUT, 30);
        assert_eq!(GTM_DEFAULT_TIMEOUT, 30);
        assert_eq!(SHARED_DEFAULT_TIMEOUT, 15);
    }

    #[test]
    fn test_retry_policy_no_retry() {
        let policy = RetryPolicy::no_retry();
        assert_eq!(policy.max_retries, 0);
        assert!(!policy.has_retries());
        assert!(RetryPolicy::default().has_retries());
    }

    #[test]
    fn test_retry_policy_delay_calculation() {
        let policy = RetryPolicy::new();

        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(0));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(4000));
        // capped at max_delay
        assert_eq!(policy.delay_for_attempt(5), Duration::from_millis(5000));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_millis(5000));
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(60))
            .without_retries()
            .with_pool_idle_timeout(Duration::from_secs(120))
            .with_pool_max_idle(20)
            .with_logging(false)
            .with_compression(false)
            .with_tls_verify(false);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.retry_policy.max_retries, 0);
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(120));
        assert_eq!(config.pool_max_idle_per_host, 20);
        assert!(!config.enable_logging);
        assert!(!config.enable_compression);
        assert!(!config.tls_verify);
        assert!(config.tls_ca_cert.is_none());
    }

    #[test]
    fn test_builder_rejects_invalid_url() {
        let err = ServiceClientBuilder::new(BigIpService::Auth, "not a url", Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_builder_rejects_missing_ca_cert() {
        let err = ServiceClientBuilder::new(
            BigIpService::Auth,
            "https://bigip.lab",
            Duration::from_secs(1),
        )
        .unwrap()
        .with_ca_cert(PathBuf::from("/nonexistent/bigip-ca.pem"))
        .build()
        .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_endpoint_building() {
        let client = ServiceClientBuilder::new(
            BigIpService::Gtm,
            "https://bigip.lab/",
            Duration::from_secs(1),
        )
        .unwrap()
        .build()
        .unwrap();

        let url = client
            .endpoint(&["wideip", "a", "~test~myapp.domain.com"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://bigip.lab/mgmt/tm/gtm/wideip/a/~test~myapp.domain.com"
        );

        let url = client.endpoint(&["wideip", "a", "odd/name"]).unwrap();
        assert_eq!(url.path(), "/mgmt/tm/gtm/wideip/a/odd%2Fname");

        let auth = client.for_service(BigIpService::Authn);
        assert_eq!(
            auth.endpoint(&["login"]).unwrap().path(),
            "/mgmt/shared/authn/login"
        );
    }

    #[test]
    fn test_from_config_prefers_token() {
        let config = BigIpConfig::new("bigip.lab")
            .unwrap()
            .with_basic_auth("admin", "secret")
            .with_token("TOKEN")
            .with_max_retries(1);
        let builder = ServiceClientBuilder::from_config(BigIpService::Auth, &config).unwrap();
        assert!(matches!(builder.credentials, Some(Credentials::Token(_))));
        assert_eq!(builder.http_config.retry_policy.max_retries, 1);
        assert_eq!(builder.base_url.as_str(), "https://bigip.lab/");
    }

    #[test]
    fn test_map_status_to_error() {
        let body = r#"{"code":404,"message":"01020036:3: The requested Wide IP (/Common/x) was not found.","errorStack":[]}"#;
        let err = map_status_to_error(StatusCode::NOT_FOUND, body.to_string());
        assert_eq!(
            err,
            Error::NotFound("01020036:3: The requested Wide IP (/Common/x) was not found.".into())
        );

        assert!(matches!(
            map_status_to_error(StatusCode::BAD_REQUEST, "bad".into()),
            Error::BadRequest(_)
        ));
        assert!(matches!(
            map_status_to_error(StatusCode::UNAUTHORIZED, "nope".into()),
            Error::Unauthorized(_)
        ));
        assert!(matches!(
            map_status_to_error(StatusCode::CONFLICT, "exists".into()),
            Error::Conflict(_)
        ));
        assert!(matches!(
            map_status_to_error(StatusCode::SERVICE_UNAVAILABLE, "busy".into()),
            Error::ServiceUnavailable(_)
        ));
        assert!(matches!(
            map_status_to_error(StatusCode::INTERNAL_SERVER_ERROR, "boom".into()),
            Error::ServiceUnavailable(_)
        ));
        assert_eq!(
            map_status_to_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid".into()),
            Error::ApiError {
                status: 422,
                message: "invalid".into()
            }
        );
    }

    #[tokio::test]
    async fn get_json_sends_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mgmt/tm/gtm/datacenter"))
            .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
            .and(header("accept", "application/json"))
            .and(query_param("$select", "name"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let value: Value = client
            .get_json(&["datacenter"], &[("$select", "name".to_string())])
            .await
            .unwrap();
        assert_eq!(value, json!({"items": []}));
    }

    #[tokio::test]
    async fn token_credentials_use_f5_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mgmt/tm/gtm/server"))
            .and(header(AUTH_TOKEN_HEADER, "TOKEN123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).with_token(SecretString::from("TOKEN123".to_string()));
        let _: Value = client.get_json(&["server"], &[]).await.unwrap();
    }

    #[tokio::test]
    async fn get_retries_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mgmt/tm/gtm/datacenter"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/mgmt/tm/gtm/datacenter"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let value: Value = client.get_json(&["datacenter"], &[]).await.unwrap();
        assert_eq!(value["items"], json!([]));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn post_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mgmt/tm/gtm/datacenter"))
            .and(body_string(r#"{"name":"dc1"}"#))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .send_json::<Value, Value>(Method::POST, &["datacenter"], Some(&json!({"name": "dc1"})), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mgmt/tm/gtm/datacenter/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": 404,
                "message": "01020036:3: The requested GTM data center (/Common/missing) was not found.",
                "errorStack": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let missing: Option<Value> = client
            .get_optional_json(&["datacenter", "missing"], &[])
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn delete_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/mgmt/tm/gtm/datacenter/~Common~dc1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.delete(&["datacenter", "~Common~dc1"]).await.unwrap();
    }

    #[tokio::test]
    async fn empty_success_body_decodes_to_unit() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/mgmt/tm/gtm/datacenter/dc1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = test_client(&server);
        client
            .send_json::<Value, ()>(Method::PUT, &["datacenter", "dc1"], Some(&json!({})), &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn optional_body_is_none_when_create_returns_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mgmt/tm/gtm/datacenter"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/mgmt/tm/gtm/datacenter/dc1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let created: Option<Value> = client
            .send_json_optional(Method::POST, &["datacenter"], Some(&json!({"name": "dc1"})), &[])
            .await
            .unwrap();
        assert!(created.is_none());

        let modified: Option<Value> = client
            .send_json_optional(Method::PUT, &["datacenter", "dc1"], Some(&json!({})), &[])
            .await
            .unwrap();
        assert!(modified.is_none());
    }

    #[tokio::test]
    async fn optional_body_decodes_echoed_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mgmt/tm/gtm/datacenter"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "dc1"})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let created: Option<Value> = client
            .send_json_optional(Method::POST, &["datacenter"], Some(&json!({"name": "dc1"})), &[])
            .await
            .unwrap();
        assert_eq!(created, Some(json!({"name": "dc1"})));
    }

    #[tokio::test]
    async fn optional_body_rejects_malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/mgmt/tm/gtm/datacenter/dc1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .send_json_optional::<Value, Value>(Method::PUT, &["datacenter", "dc1"], Some(&json!({})), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[tokio::test]
    async fn retries_stop_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mgmt/tm/gtm/datacenter"))
            .respond_with(ResponseTemplate::new(503).set_body_string("still busy"))
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .get_json::<Value>(&["datacenter"], &[])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::ServiceUnavailable("BIG-IP temporarily unavailable: still busy".into())
        );
        assert_eq!(
            server.received_requests().await.unwrap().len(),
            fast_retry().max_retries as usize + 1
        );
    }

    #[tokio::test]
    async fn put_retries_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/mgmt/tm/gtm/datacenter/dc1"))
            .and(body_string(r#"{"enabled":true}"#))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/mgmt/tm/gtm/datacenter/dc1"))
            .and(body_string(r#"{"enabled":true}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "dc1"})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let modified: Option<Value> = client
            .send_json_optional(
                Method::PUT,
                &["datacenter", "dc1"],
                Some(&json!({"enabled": true})),
                &[],
            )
            .await
            .unwrap();
        assert_eq!(modified, Some(json!({"name": "dc1"})));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_retries_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/mgmt/tm/gtm/datacenter/dc1"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/mgmt/tm/gtm/datacenter/dc1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.delete(&["datacenter", "dc1"]).await.unwrap();
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[test]
    fn from_config_validates_limits() {
        let config: BigIpConfig = serde_json::from_value(json!({
            "host": "https://bigip.lab",
            "request_timeout_secs": 0,
            "max_retries": 500
        }))
        .unwrap();
        let err = ServiceClientBuilder::from_config(BigIpService::Gtm, &config).unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));

        let config = BigIpConfig::new("bigip.lab").unwrap().with_timeout(0);
        assert!(matches!(
            ServiceClientBuilder::from_config(BigIpService::Gtm, &config),
            Err(Error::ValidationError(_))
        ));
    }

    #[test]
    fn from_config_normalizes_bare_host() {
        let config: BigIpConfig =
            serde_json::from_value(json!({"host": "bigip.lab:8443"})).unwrap();
        let client = ServiceClientBuilder::from_config(BigIpService::Gtm, &config)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            client.endpoint(&["wideip", "a"]).unwrap().as_str(),
            "https://bigip.lab:8443/mgmt/tm/gtm/wideip/a"
        );
    }
}
