//! End-to-end tests: AudioProvider -> VkClient -> HttpClient

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_library::{AudioModel, ListModel};
use core_runtime::events::{ApiEvent, CoreEvent, EventBus};
use provider_vk::{AudioProvider, AudioSortOrder, VkClient, VkError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Replies with a fixed body and records requested URLs.
struct CannedHttpClient {
    status: u16,
    body: &'static str,
    urls: Mutex<Vec<String>>,
}

impl CannedHttpClient {
    fn new(status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body,
            urls: Mutex::new(Vec::new()),
        })
    }

    fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for CannedHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.urls.lock().unwrap().push(request.url);
        Ok(HttpResponse {
            status: self.status,
            headers: HashMap::new(),
            body: Bytes::from_static(self.body.as_bytes()),
        })
    }
}

const CATALOG: &str = r#"{"response": [2,
    {"aid": 1, "owner_id": -55, "artist": "A &amp; B", "title": "First", "duration": 120, "url": "http://cdn.example/1.mp3"},
    {"aid": 2, "owner_id": -55, "artist": "C", "title": "Second", "duration": "61", "lyrics_id": 77}
]}"#;

#[tokio::test]
async fn test_group_catalog_reaches_model() {
    let http = CannedHttpClient::new(200, CATALOG);
    let client = VkClient::new(http.clone())
        .with_base_url("https://vk.example/method")
        .with_access_token("secret");
    let provider = AudioProvider::new(Arc::new(client));

    let tracks = provider.get_contact_audio(-55, 20, 0).await.unwrap();

    let mut model = AudioModel::new();
    assert_eq!(model.extend(tracks), 2);
    assert_eq!(model.row_count(), 2);
    assert_eq!(model.data(0, "artist").unwrap().as_str(), Some("A & B"));
    assert_eq!(model.data(1, "lyricsId").unwrap().as_i64(), Some(77));
    assert_eq!(model.data(1, "duration").unwrap().as_f64(), Some(61.0));

    let urls = http.urls();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].starts_with("https://vk.example/method/audio.get?"));
    assert!(urls[0].contains("gid=55"));
    assert!(urls[0].contains("count=20"));
    assert!(urls[0].contains("offset=0"));
    assert!(urls[0].contains("access_token=secret"));
    assert!(!urls[0].contains("uid="));
}

#[tokio::test]
async fn test_search_sends_flags() {
    let http = CannedHttpClient::new(200, r#"{"response": {"count": 0, "items": []}}"#);
    let provider = AudioProvider::new(Arc::new(VkClient::new(http.clone())));

    let tracks = provider
        .search_audio("night drive", 5, 10, true, AudioSortOrder::ByDuration, true)
        .await
        .unwrap();

    assert!(tracks.is_empty());
    let url = &http.urls()[0];
    assert!(url.contains("/audio.search?"));
    assert!(url.contains("q=night%20drive"));
    assert!(url.contains("auto_complete=1"));
    assert!(url.contains("lyrics=1"));
    assert!(url.contains("sort=1"));
}

#[tokio::test]
async fn test_api_error_surfaces_and_is_published() {
    let http = CannedHttpClient::new(
        200,
        r#"{"error": {"error_code": 201, "error_msg": "Access denied"}}"#,
    );
    let bus = EventBus::new(16);
    let mut events = bus.subscribe();
    let provider = AudioProvider::new(Arc::new(VkClient::new(http).with_event_bus(bus)));

    let error = provider.get_contact_audio(1, 10, 0).await.unwrap_err();
    assert!(matches!(error, VkError::ApiError { code: 201, .. }));

    let mut failed = None;
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Api(ApiEvent::RequestFailed { message, .. }) = event {
            failed = Some(message);
        }
    }
    assert!(failed.unwrap().contains("Access denied"));
}
