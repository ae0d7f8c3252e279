//! Token authentication.
//!
//! BIG-IP issues `X-F5-Auth-Token` tokens from `/mgmt/shared/authn/login`. Tokens are
//! required for remote login providers (LDAP, RADIUS, TACACS+) and are preferred over
//! basic authentication for long running sessions.

use crate::client::{RetryPolicy, ServiceClient, ServiceClientBuilder, SHARED_DEFAULT_TIMEOUT};
use crate::config::{BigIpConfig, DEFAULT_LOGIN_PROVIDER};
use crate::error::{Error, Result};
use crate::types::BigIpService;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use validator::Validate;

/// Token returned by a successful login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    /// Token value sent as `X-F5-Auth-Token`
    pub token: SecretString,

    /// Token name, equal to the token value on current releases
    #[serde(default)]
    pub name: Option<String>,

    /// Account the token was issued to
    #[serde(default)]
    pub user_name: Option<String>,

    /// Provider that authenticated the account
    #[serde(default)]
    pub auth_provider_name: Option<String>,

    /// Idle timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Issue time as reported by the device
    #[serde(default)]
    pub start_time: Option<String>,

    /// Absolute expiry in microseconds since the Unix epoch
    #[serde(default)]
    pub expiration_micros: Option<i64>,
}

impl AuthToken {
    /// Returns the absolute expiry time, if the device reported one.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiration_micros
            .and_then(DateTime::<Utc>::from_timestamp_micros)
    }

    /// Returns true if the token has expired at `now`.
    ///
    /// Tokens without an expiry are treated as valid.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expiry| expiry <= now)
    }

    /// Returns true if the token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    login_provider_name: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: AuthToken,
}

/// Source of authentication tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a fresh token.
    async fn fetch_token(&self) -> Result<AuthToken>;
}

/// Username/password login against `/mgmt/shared/authn/login`.
#[derive(Debug, Clone)]
pub struct PasswordLogin {
    client: ServiceClient,
    username: String,
    password: SecretString,
    login_provider: String,
}

impl PasswordLogin {
    /// Create a login helper for the device at `base_url` using the local `tmos` provider.
    ///
    /// Requests use [`SHARED_DEFAULT_TIMEOUT`] and the default retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(
        base_url: impl AsRef<str>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let client = ServiceClientBuilder::new(
            BigIpService::Authn,
            base_url,
            Duration::from_secs(SHARED_DEFAULT_TIMEOUT),
        )?
        .build()?;

        Ok(Self {
            client,
            username: username.into(),
            password: SecretString::from(password.into()),
            login_provider: DEFAULT_LOGIN_PROVIDER.to_string(),
        })
    }

    /// Create a login helper for the device described by `config`.
    ///
    /// The configured timeout, retry limit and TLS settings apply to the login and
    /// logout requests.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] when the configuration is out of range and
    /// [`Error::ConfigError`] when it carries no username and password, the host is not a
    /// usable URL, or the HTTP client cannot be built.
    pub fn from_config(config: &BigIpConfig) -> Result<Self> {
        config.validate()?;
        let (username, password) = config.basic_credentials().ok_or_else(|| {
            Error::ConfigError("token login requires a username and password".to_string())
        })?;

        let base_url = config.parse_host_url()?;
        let mut builder =
            ServiceClientBuilder::new(BigIpService::Authn, base_url, config.timeout())?
                .with_retry_policy(RetryPolicy::new().with_max_retries(config.max_retries))
                .with_tls_verify(config.tls_verify);
        if let Some(ca_cert) = &config.tls_ca_cert {
            builder = builder.with_ca_cert(ca_cert.clone());
        }

        Ok(Self {
            client: builder.build()?,
            username: username.to_string(),
            password: SecretString::from(password.to_string()),
            login_provider: config
                .login_provider
                .clone()
                .unwrap_or_else(|| DEFAULT_LOGIN_PROVIDER.to_string()),
        })
    }

    /// Log in and return the issued token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] when the device rejects the credentials.
    pub async fn login(&self) -> Result<AuthToken> {
        let request = LoginRequest {
            username: &self.username,
            password: self.password.expose_secret(),
            login_provider_name: &self.login_provider,
        };

        let response: LoginResponse = self
            .client
            .send_json(Method::POST, &["login"], Some(&request), &[])
            .await?;

        info!(
            user = %self.username,
            provider = %self.login_provider,
            "obtained BIG-IP auth token"
        );
        Ok(response.token)
    }

    /// Revoke a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the request.
    pub async fn logout(&self, token: &AuthToken) -> Result<()> {
        let name = token
            .name
            .clone()
            .unwrap_or_else(|| token.token.expose_secret().to_string());
        debug!(user = %self.username, "revoking BIG-IP auth token");

        self.client
            .for_service(BigIpService::Authz)
            .with_token(token.token.clone())
            .delete(&["tokens", &name])
            .await
    }
}

#[async_trait]
impl TokenProvider for PasswordLogin {
    async fn fetch_token(&self) -> Result<AuthToken> {
        self.login().await
    }
}

/// Return a copy of `config` carrying a token obtained from `provider`.
///
/// # Errors
///
/// Propagates the provider's error.
pub async fn apply_token(config: &BigIpConfig, provider: &dyn TokenProvider) -> Result<BigIpConfig> {
    let token = provider.fetch_token().await?;
    let mut config = config.clone();
    config.token = Some(token.token);
    Ok(config)
}

/// Resolve the credentials of `config`.
///
/// When the configuration asks for token authentication (a login provider and no token),
/// this logs in and returns a configuration carrying the token. Otherwise the
/// configuration is returned unchanged.
///
/// # Errors
///
/// Returns [`Error::ValidationError`] if the configuration is out of range, or the
/// login error.
pub async fn authenticate(config: &BigIpConfig) -> Result<BigIpConfig> {
    config.validate()?;
    if !config.needs_login() {
        return Ok(config.clone());
    }

    let login = PasswordLogin::from_config(config)?;
    apply_token(config, &login).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn login_body() -> serde_json::Value {
        json!({
            "username": "admin",
            "loginProviderName": "tmos",
            "token": {
                "token": "5C4B2AA2DB1FCC5A3C3E3C9D7A",
                "name": "5C4B2AA2DB1FCC5A3C3E3C9D7A",
                "userName": "admin",
                "authProviderName": "tmos",
                "timeout": 1200,
                "startTime": "2024-03-01T10:00:00.000-0800",
                "expirationMicros": 1_709_317_200_000_000_i64,
                "kind": "shared:authz:tokens:authtokenitemstate"
            },
            "generation": 0,
            "lastUpdateMicros": 0
        })
    }

    fn config_with_host(host: &str) -> BigIpConfig {
        BigIpConfig::new(host)
            .unwrap()
            .with_basic_auth("admin", "secret")
            .with_login_provider(DEFAULT_LOGIN_PROVIDER)
    }

    fn config_for(server: &MockServer) -> BigIpConfig {
        config_with_host(&server.uri())
    }

    fn sample_token(value: &str) -> AuthToken {
        AuthToken {
            token: SecretString::from(value.to_string()),
            name: None,
            user_name: Some("admin".to_string()),
            auth_provider_name: None,
            timeout: Some(1200),
            start_time: None,
            expiration_micros: None,
        }
    }

    #[test]
    fn token_expiry() {
        let token: AuthToken = serde_json::from_value(login_body()["token"].clone()).unwrap();
        let expiry = Utc.with_ymd_and_hms(2024, 3, 1, 18, 20, 0).unwrap();
        assert_eq!(token.expires_at(), Some(expiry));
        assert!(!token.is_expired_at(Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap()));
        assert!(token.is_expired_at(expiry));
        assert_eq!(token.timeout, Some(1200));
        assert_eq!(token.user_name.as_deref(), Some("admin"));
    }

    #[test]
    fn token_without_expiry_never_expires() {
        assert!(!sample_token("abc").is_expired());
    }

    #[test]
    fn from_config_requires_credentials() {
        let config = BigIpConfig::new("bigip.lab")
            .unwrap()
            .with_login_provider("tmos");
        assert!(matches!(
            PasswordLogin::from_config(&config).unwrap_err(),
            Error::ConfigError(_)
        ));
    }

    #[test]
    fn from_config_rejects_out_of_range_limits() {
        let config = config_with_host("https://bigip.lab").with_timeout(0);
        assert!(matches!(
            PasswordLogin::from_config(&config).unwrap_err(),
            Error::ValidationError(_)
        ));
    }

    #[test]
    fn from_config_accepts_bare_deserialized_host() {
        let config: BigIpConfig = serde_json::from_value(json!({
            "host": "bigip.lab:8443",
            "username": "admin",
            "password": "secret",
            "login_provider": "tmos"
        }))
        .unwrap();
        let login = PasswordLogin::from_config(&config).unwrap();
        assert_eq!(
            login.client.endpoint(&["login"]).unwrap().as_str(),
            "https://bigip.lab:8443/mgmt/shared/authn/login"
        );
    }

    #[test]
    fn from_config_uses_configured_retries() {
        let config = config_with_host("https://bigip.lab").with_max_retries(7);
        let login = PasswordLogin::from_config(&config).unwrap();
        assert_eq!(login.client.retry_policy().max_retries, 7);
    }

    #[test]
    fn new_uses_local_provider() {
        let login = PasswordLogin::new("https://bigip.lab", "admin", "secret").unwrap();
        assert_eq!(login.login_provider, DEFAULT_LOGIN_PROVIDER);
        assert_eq!(login.username, "admin");
    }

    #[tokio::test]
    async fn login_honours_configured_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mgmt/shared/authn/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(login_body())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = config_for(&server).with_timeout(1);
        let login = PasswordLogin::from_config(&config).unwrap();
        let err = login.login().await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[tokio::test]
    async fn logout_retries_with_configured_limit() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/mgmt/shared/authz/tokens/ABC123"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&server)
            .await;

        let config = config_for(&server).with_max_retries(0);
        let login = PasswordLogin::from_config(&config).unwrap();
        let err = login.logout(&sample_token("ABC123")).await.unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn authenticate_rejects_out_of_range_limits() {
        let config = config_with_host("https://bigip.lab").with_max_retries(500);
        let err = authenticate(&config).await.unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[tokio::test]
    async fn login_posts_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mgmt/shared/authn/login"))
            .and(body_json(json!({
                "username": "admin",
                "password": "secret",
                "loginProviderName": "tmos"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
            .expect(1)
            .mount(&server)
            .await;

        let login = PasswordLogin::from_config(&config_for(&server)).unwrap();
        let token = login.login().await.unwrap();
        assert_eq!(token.token.expose_secret(), "5C4B2AA2DB1FCC5A3C3E3C9D7A");
    }

    #[tokio::test]
    async fn login_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mgmt/shared/authn/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": 401,
                "message": "Authentication failed.",
                "errorStack": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let login = PasswordLogin::from_config(&config_for(&server)).unwrap();
        let err = login.login().await.unwrap_err();
        assert_eq!(
            err,
            Error::Unauthorized("BIG-IP authentication failed: Authentication failed.".into())
        );
    }

    #[tokio::test]
    async fn logout_deletes_token() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/mgmt/shared/authz/tokens/ABC123"))
            .and(header("X-F5-Auth-Token", "ABC123"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let login = PasswordLogin::from_config(&config_for(&server)).unwrap();
        login.logout(&sample_token("ABC123")).await.unwrap();
    }

    #[tokio::test]
    async fn authenticate_logs_in_when_requested() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mgmt/shared/authn/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
            .expect(1)
            .mount(&server)
            .await;

        let config = authenticate(&config_for(&server)).await.unwrap();
        assert_eq!(
            config.token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("5C4B2AA2DB1FCC5A3C3E3C9D7A".to_string())
        );
        assert!(!config.needs_login());
    }

    #[tokio::test]
    async fn authenticate_passes_basic_auth_through() {
        let config = BigIpConfig::new("bigip.lab")
            .unwrap()
            .with_basic_auth("admin", "secret");
        let resolved = authenticate(&config).await.unwrap();
        assert!(resolved.token.is_none());
        assert_eq!(resolved.basic_credentials(), Some(("admin", "secret")));
    }

    #[tokio::test]
    async fn apply_token_uses_provider() {
        let mut provider = MockTokenProvider::new();
        provider
            .expect_fetch_token()
            .times(1)
            .returning(|| Ok(sample_token("FROM-MOCK")));

        let config = BigIpConfig::new("bigip.lab").unwrap();
        let config = apply_token(&config, &provider).await.unwrap();
        assert_eq!(
            config.token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("FROM-MOCK".to_string())
        );
    }

    #[tokio::test]
    async fn apply_token_propagates_errors() {
        let mut provider = MockTokenProvider::new();
        provider
            .expect_fetch_token()
            .returning(|| Err(Error::Unauthorized("denied".to_string())));

        let config = BigIpConfig::new("bigip.lab").unwrap();
        assert!(apply_token(&config, &provider).await.is_err());
    }
}
