//! Core service façade and bootstrap helpers.
//!
//! This crate wires the host-provided HTTP bridge into the vk.com client and
//! the audio provider, and moves decoded replies into an [`AudioModel`].
//! Desktop apps typically enable the `desktop-shims` feature (which makes
//! `core-runtime` fall back to `bridge-desktop`'s reqwest client), whereas
//! other hosts inject their own [`HttpClient`] through the config builder.
//!
//! ```ignore
//! use core_service::{CoreConfig, CoreService, AudioModel};
//!
//! let service = CoreService::new(CoreConfig::from_env().build()?)?;
//! let mut model = AudioModel::new();
//! let added = service.load_contact_audio(&mut model, -55, 20, 0).await?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

pub use bridge_traits::http::HttpClient;
pub use core_library::{AudioModel, AudioTrack, ListModel, ModelChange, SortOrder};
pub use core_runtime::config::CoreConfig;
pub use core_runtime::events::{CoreEvent, EventBus, EventStream};
pub use core_runtime::logging::{init_logging, LoggingConfig};
pub use provider_vk::{AudioProvider, AudioSortOrder, VkClient};

use std::sync::Arc;
use tracing::{info, instrument};

/// Arguments of an `audio.search` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub count: u32,
    pub offset: u32,
    pub auto_complete: bool,
    pub sort: AudioSortOrder,
    pub with_lyrics: bool,
}

impl SearchQuery {
    /// Default page of 30 results, newest first, no auto-complete.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            count: 30,
            offset: 0,
            auto_complete: false,
            sort: AudioSortOrder::default(),
            with_lyrics: false,
        }
    }

    pub fn page(mut self, count: u32, offset: u32) -> Self {
        self.count = count;
        self.offset = offset;
        self
    }

    pub fn auto_complete(mut self, enabled: bool) -> Self {
        self.auto_complete = enabled;
        self
    }

    pub fn sort(mut self, sort: AudioSortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_lyrics(mut self, required: bool) -> Self {
        self.with_lyrics = required;
        self
    }
}

struct ServiceInner {
    config: CoreConfig,
    event_bus: EventBus,
    client: Arc<VkClient>,
    audio: AudioProvider,
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<ServiceInner>,
}

impl CoreService {
    /// Create a new service from a built configuration.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(config.event_bus_capacity);
        let client = Arc::new(VkClient::from_config(&config)?.with_event_bus(event_bus.clone()));
        let audio = AudioProvider::new(client.clone());

        info!(
            api_base_url = %config.api_base_url,
            api_version = %config.api_version,
            authenticated = client.has_access_token(),
            "Core service initialized"
        );

        Ok(Self {
            inner: Arc::new(ServiceInner {
                config,
                event_bus,
                client,
                audio,
            }),
        })
    }

    /// Build the configuration from `VK_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let config = CoreConfig::from_env()
            .build()
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
        Self::new(config)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    /// Bus carrying request and session events.
    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.inner.event_bus.subscribe())
    }

    pub fn client(&self) -> Arc<VkClient> {
        Arc::clone(&self.inner.client)
    }

    pub fn audio(&self) -> &AudioProvider {
        &self.inner.audio
    }

    pub fn set_access_token(&self, token: impl Into<String>) {
        self.inner.client.set_access_token(token);
    }

    pub fn clear_access_token(&self) {
        self.inner.client.clear_access_token();
    }

    /// Fetch a catalog page and add it to `model`. Returns the rows added.
    #[instrument(skip(self, model))]
    pub async fn load_contact_audio(
        &self,
        model: &mut AudioModel,
        owner_id: i64,
        count: u32,
        offset: u32,
    ) -> Result<usize> {
        let tracks = self
            .inner
            .audio
            .get_contact_audio(owner_id, count, offset)
            .await?;
        let received = tracks.len();
        let added = model.extend(tracks);
        info!(received, added, "Loaded catalog page");
        Ok(added)
    }

    /// Run a search and add the results to `model`. Returns the rows added.
    #[instrument(skip(self, model), fields(query = %search.query))]
    pub async fn load_search_results(
        &self,
        model: &mut AudioModel,
        search: &SearchQuery,
    ) -> Result<usize> {
        let tracks = self
            .inner
            .audio
            .search_audio(
                &search.query,
                search.count,
                search.offset,
                search.auto_complete,
                search.sort,
                search.with_lyrics,
            )
            .await?;
        let received = tracks.len();
        let added = model.extend(tracks);
        info!(received, added, "Loaded search results");
        Ok(added)
    }
}
