//! # Event Bus System
//!
//! Provides an event-driven channel for request and session lifecycle
//! notifications using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enums for API dispatch and session changes
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ```text
//! ┌──────────┐     emit      ┌───────────┐    subscribe    ┌────────────┐
//! │ VkClient ├──────────────>│ EventBus  ├────────────────>│ Subscriber │
//! └──────────┘               │ (broadcast│                 └────────────┘
//!                            │  channel) │    subscribe    ┌────────────┐
//!                            │           ├────────────────>│ Subscriber │
//!                            └───────────┘                 └────────────┘
//! ```
//!
//! This bus is for cross-task observation (status bars, diagnostics). List
//! models do not go through it: their row notifications are delivered
//! synchronously by the model itself.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{ApiEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(CoreEvent::Api(ApiEvent::RequestSent {
//!     request_id: "req-1".to_string(),
//!     method: "audio.get".to_string(),
//! }))
//! .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "API request sent");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall further behind receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// API dispatch events
    Api(ApiEvent),
    /// Session (access token) events
    Session(SessionEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Api(e) => e.description(),
            CoreEvent::Session(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Api(ApiEvent::RequestFailed {
                recoverable: true, ..
            }) => EventSeverity::Warning,
            CoreEvent::Api(ApiEvent::RequestFailed { .. }) => EventSeverity::Error,
            CoreEvent::Session(_) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// API Events
// ============================================================================

/// Events emitted while dispatching API methods.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ApiEvent {
    /// A request left for the remote API.
    RequestSent {
        /// Correlates the three events of one request.
        request_id: String,
        /// API method name, e.g. `audio.search`.
        method: String,
    },
    /// The API answered with a `response` payload.
    ReplyReceived {
        request_id: String,
        method: String,
        /// Wall time between send and reply.
        elapsed_ms: u64,
    },
    /// Transport failure or an `error` envelope.
    RequestFailed {
        request_id: String,
        method: String,
        /// Human-readable error message.
        message: String,
        /// Whether retrying later may succeed (rate limits, timeouts).
        recoverable: bool,
    },
}

impl ApiEvent {
    fn description(&self) -> &str {
        match self {
            ApiEvent::RequestSent { .. } => "API request sent",
            ApiEvent::ReplyReceived { .. } => "API reply received",
            ApiEvent::RequestFailed { .. } => "API request failed",
        }
    }

    /// Method name carried by every variant.
    pub fn method(&self) -> &str {
        match self {
            ApiEvent::RequestSent { method, .. }
            | ApiEvent::ReplyReceived { method, .. }
            | ApiEvent::RequestFailed { method, .. } => method,
        }
    }
}

// ============================================================================
// Session Events
// ============================================================================

/// Events related to the access token used for requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// A new access token was installed.
    TokenUpdated,
    /// The access token was removed; requests are anonymous from now on.
    TokenCleared,
    /// The API rejected the current token (error code 5).
    TokenRejected {
        /// Message reported by the API.
        message: String,
    },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::TokenUpdated => "Access token updated",
            SessionEvent::TokenCleared => "Access token cleared",
            SessionEvent::TokenRejected { .. } => "Access token rejected",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let failures = EventStream::new(bus.subscribe())
///     .filter(|event| event.severity() >= core_runtime::events::EventSeverity::Warning);
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sent(id: &str) -> CoreEvent {
        CoreEvent::Api(ApiEvent::RequestSent {
            request_id: id.to_string(),
            method: "audio.get".to_string(),
        })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);

        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(CoreEvent::Session(SessionEvent::TokenCleared)).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = sent("req-1");
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Session(_)));

        bus.emit(sent("req-1")).ok();
        bus.emit(CoreEvent::Session(SessionEvent::TokenUpdated)).ok();

        let received = stream.recv().await.unwrap();
        assert_eq!(received, CoreEvent::Session(SessionEvent::TokenUpdated));
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(sent(&format!("req-{}", i))).ok();
        }

        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        let fatal = CoreEvent::Api(ApiEvent::RequestFailed {
            request_id: "r".to_string(),
            method: "audio.get".to_string(),
            message: "Access denied".to_string(),
            recoverable: false,
        });
        assert_eq!(fatal.severity(), EventSeverity::Error);

        let throttled = CoreEvent::Api(ApiEvent::RequestFailed {
            request_id: "r".to_string(),
            method: "audio.get".to_string(),
            message: "Too many requests per second".to_string(),
            recoverable: true,
        });
        assert_eq!(throttled.severity(), EventSeverity::Warning);

        assert_eq!(sent("r").severity(), EventSeverity::Debug);
        assert_eq!(
            CoreEvent::Session(SessionEvent::TokenUpdated).severity(),
            EventSeverity::Info
        );
    }

    #[test]
    fn test_api_event_method() {
        let event = ApiEvent::ReplyReceived {
            request_id: "r".to_string(),
            method: "audio.search".to_string(),
            elapsed_ms: 12,
        };
        assert_eq!(event.method(), "audio.search");
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Session(SessionEvent::TokenRejected {
            message: "User authorization failed".to_string(),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("TokenRejected"));

        let deserialized: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[tokio::test]
    async fn test_try_recv() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());

        bus.emit(sent("req-2")).ok();
        let received = stream.try_recv().unwrap().unwrap();
        assert_eq!(received, sent("req-2"));
    }
}
