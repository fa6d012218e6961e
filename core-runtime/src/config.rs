//! # Core Configuration Module
//!
//! Provides configuration management for the vk.com audio core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the API endpoint settings, the session token and the
//! host bridges the core needs. It validates eagerly so a bad endpoint or a
//! missing capability surfaces at startup rather than on the first request.
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//!
//! When the `desktop-shims` feature is enabled, `ReqwestHttpClient` is injected
//! automatically if no client is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .access_token("vk1.a.token")
//!     .api_version("5.131")
//!     .request_timeout(Duration::from_secs(15))
//!     .build()?;
//! ```
//!
//! ## Environment Overrides
//!
//! [`CoreConfig::from_env`] seeds a builder from `VK_API_BASE_URL`,
//! `VK_API_VERSION` and `VK_ACCESS_TOKEN`.

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::http::{HttpClient, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default vk.com method endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.vk.com/method";

/// API version sent with every request unless overridden
pub const DEFAULT_API_VERSION: &str = "5.131";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_API_BASE_URL: &str = "VK_API_BASE_URL";
pub const ENV_API_VERSION: &str = "VK_API_VERSION";
pub const ENV_ACCESS_TOKEN: &str = "VK_ACCESS_TOKEN";

/// Core configuration for the vk.com audio core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Base URL that method names are appended to
    pub api_base_url: String,

    /// Value of the `v` parameter
    pub api_version: String,

    /// User access token, sent as `access_token` when present
    pub access_token: Option<String>,

    /// Value of the `lang` parameter, if any
    pub language: Option<String>,

    /// HTTP client for making API requests (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Timeout applied to each API request
    pub request_timeout: Duration,

    /// Retry policy handed to the HTTP client
    pub retry_policy: RetryPolicy,

    /// Buffer size of the event bus
    pub event_bus_capacity: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_version", &self.api_version)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("language", &self.language)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field("request_timeout", &self.request_timeout)
            .field("retry_policy", &self.retry_policy)
            .field("event_bus_capacity", &self.event_bus_capacity)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Creates a builder pre-filled from environment variables.
    ///
    /// Unset or empty variables leave the corresponding default untouched.
    pub fn from_env() -> CoreConfigBuilder {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> CoreConfigBuilder
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut builder = CoreConfigBuilder::default();
        if let Some(url) = read(ENV_API_BASE_URL) {
            builder = builder.api_base_url(url);
        }
        if let Some(version) = read(ENV_API_VERSION) {
            builder = builder.api_version(version);
        }
        if let Some(token) = read(ENV_ACCESS_TOKEN) {
            builder = builder.access_token(token);
        }
        builder
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The base URL parses and uses http or https
    /// - The API version is not empty
    /// - The request timeout and the event bus capacity are non-zero
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_base_url).map_err(|e| {
            Error::Config(format!("Invalid API base URL '{}': {}", self.api_base_url, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "API base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.api_version.trim().is_empty() {
            return Err(Error::Config("API version cannot be empty".to_string()));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        if self.event_bus_capacity == 0 {
            return Err(Error::Config(
                "Event bus capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the configured HTTP client or an actionable error.
    pub fn require_http_client(&self) -> Result<Arc<dyn HttpClient>> {
        self.http_client
            .clone()
            .ok_or_else(http_client_missing_error)
    }
}

fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                 Desktop: enable the 'desktop-shims' feature to use ReqwestHttpClient. \
                 Otherwise: inject an implementation with .http_client()."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(
    timeout: Duration,
    policy: &RetryPolicy,
) -> Result<Option<Arc<dyn HttpClient>>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout)
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?
        .with_retry_policy(policy.clone());
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(Some(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(
    _timeout: Duration,
    _policy: &RetryPolicy,
) -> Result<Option<Arc<dyn HttpClient>>> {
    Ok(None)
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Every field has a default, so `CoreConfig::builder().build()` yields an
/// anonymous configuration against the public endpoint.
#[derive(Default)]
pub struct CoreConfigBuilder {
    api_base_url: Option<String>,
    api_version: Option<String>,
    access_token: Option<String>,
    language: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    request_timeout: Option<Duration>,
    retry_policy: Option<RetryPolicy>,
    event_bus_capacity: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the base URL method names are appended to.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Sets the API version (`v` parameter).
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Sets the user access token.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Sets the response language (`lang` parameter).
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the HTTP client implementation.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Sets the event bus buffer size.
    pub fn event_bus_capacity(mut self, capacity: usize) -> Self {
        self.event_bus_capacity = Some(capacity);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when validation fails, or [`Error::Internal`]
    /// if the default HTTP client cannot be created.
    pub fn build(self) -> Result<CoreConfig> {
        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let retry_policy = self.retry_policy.unwrap_or_default();

        let mut config = CoreConfig {
            api_base_url: self
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            access_token: self.access_token,
            language: self.language,
            http_client: None,
            request_timeout,
            retry_policy,
            event_bus_capacity: self.event_bus_capacity.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        config.http_client = match self.http_client {
            Some(client) => Some(client),
            None => provide_default_http_client(config.request_timeout, &config.retry_policy)?,
        };

        Ok(config)
    }
}
