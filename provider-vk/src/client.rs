//! vk.com API client
//!
//! Implements [`ApiDispatcher`] over a host-provided [`HttpClient`].

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use core_runtime::config::{CoreConfig, DEFAULT_API_BASE_URL, DEFAULT_API_VERSION, DEFAULT_REQUEST_TIMEOUT};
use core_runtime::events::{ApiEvent, CoreEvent, EventBus, SessionEvent};
use core_runtime::logging::redact_url;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::dispatch::ApiDispatcher;
use crate::error::{Result, VkError};
use crate::params::ParamMap;
use crate::types::ApiEnvelope;

/// vk.com API client
///
/// Sends every method as `GET {base}/{method}?{params}&v={version}` and
/// unwraps the response envelope.
///
/// # Example
///
/// ```ignore
/// use provider_vk::{ApiDispatcher, ParamMap, VkClient};
///
/// let client = VkClient::new(http_client).with_access_token("token");
/// let payload = client.call("audio.get", &ParamMap::new().with("count", 10u32)).await?;
/// ```
pub struct VkClient {
    http_client: Arc<dyn HttpClient>,
    api_base_url: String,
    api_version: String,
    language: Option<String>,
    access_token: RwLock<Option<String>>,
    request_timeout: Duration,
    retry_policy: RetryPolicy,
    event_bus: Option<EventBus>,
}

impl VkClient {
    /// Create a client against the public API endpoint with default settings.
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            language: None,
            access_token: RwLock::new(None),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry_policy: RetryPolicy::default(),
            event_bus: None,
        }
    }

    /// Create a client from a validated [`CoreConfig`].
    pub fn from_config(config: &CoreConfig) -> core_runtime::Result<Self> {
        let http_client = config.require_http_client()?;

        Ok(Self {
            http_client,
            api_base_url: config.api_base_url.clone(),
            api_version: config.api_version.clone(),
            language: config.language.clone(),
            access_token: RwLock::new(config.access_token.clone()),
            request_timeout: config.request_timeout,
            retry_policy: config.retry_policy.clone(),
            event_bus: None,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_access_token(self, token: impl Into<String>) -> Self {
        *self.access_token.write().unwrap_or_else(|e| e.into_inner()) = Some(token.into());
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Publish request lifecycle events on `bus`.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Install a new access token for subsequent requests.
    pub fn set_access_token(&self, token: impl Into<String>) {
        *self.access_token.write().unwrap_or_else(|e| e.into_inner()) = Some(token.into());
        info!("Access token updated");
        self.emit(CoreEvent::Session(SessionEvent::TokenUpdated));
    }

    /// Drop the access token; subsequent requests are anonymous.
    pub fn clear_access_token(&self) {
        let previous = self
            .access_token
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if previous.is_some() {
            info!("Access token cleared");
            self.emit(CoreEvent::Session(SessionEvent::TokenCleared));
        }
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Full request URL for `method`, including version and credentials.
    pub fn method_url(&self, method: &str, params: &ParamMap) -> String {
        let mut query = params.to_query_string();
        let mut append = |key: &str, value: &str| {
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(key);
            query.push('=');
            query.push_str(&urlencoding::encode(value));
        };

        append("v", &self.api_version);
        if let Some(language) = &self.language {
            append("lang", language);
        }
        if let Some(token) = self
            .access_token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_deref()
        {
            append("access_token", token);
        }

        format!("{}/{}?{}", self.api_base_url, method, query)
    }

    fn emit(&self, event: CoreEvent) {
        if let Some(bus) = &self.event_bus {
            // No subscribers is not an error for us
            let _ = bus.emit(event);
        }
    }

    fn parse_envelope(&self, response: &HttpResponse) -> Result<Value> {
        if !response.is_success() {
            return Err(VkError::Http {
                status: response.status,
            });
        }

        let envelope: ApiEnvelope = serde_json::from_slice(&response.body)
            .map_err(|e| VkError::ParseError(format!("Invalid response body: {}", e)))?;

        if let Some(error) = envelope.error {
            return Err(VkError::from_api(error.error_code, error.error_msg));
        }

        envelope.response.ok_or_else(|| {
            VkError::ParseError("Envelope carries neither response nor error".to_string())
        })
    }

    async fn execute(&self, method: &str, params: &ParamMap) -> Result<Value> {
        let url = self.method_url(method, params);
        debug!(url = %redact_url(&url), "Sending API request");

        let request = HttpRequest::get(url)
            .header("Accept", "application/json")
            .timeout(self.request_timeout);

        let response = self
            .http_client
            .execute_with_retry(request, self.retry_policy.clone())
            .await?;

        self.parse_envelope(&response)
    }
}

#[async_trait]
impl ApiDispatcher for VkClient {
    #[instrument(skip(self, params))]
    async fn call(&self, method: &str, params: &ParamMap) -> Result<Value> {
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        self.emit(CoreEvent::Api(ApiEvent::RequestSent {
            request_id: request_id.clone(),
            method: method.to_string(),
        }));

        match self.execute(method, params).await {
            Ok(payload) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                debug!(elapsed_ms, "API reply received");
                self.emit(CoreEvent::Api(ApiEvent::ReplyReceived {
                    request_id,
                    method: method.to_string(),
                    elapsed_ms,
                }));
                Ok(payload)
            }
            Err(error) => {
                warn!(error = %error, "API request failed");
                if let VkError::AuthenticationFailed(message) = &error {
                    self.emit(CoreEvent::Session(SessionEvent::TokenRejected {
                        message: message.clone(),
                    }));
                }
                self.emit(CoreEvent::Api(ApiEvent::RequestFailed {
                    request_id,
                    method: method.to_string(),
                    message: error.to_string(),
                    recoverable: error.is_recoverable(),
                }));
                Err(error)
            }
        }
    }
}
