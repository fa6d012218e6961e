//! Request dispatch
//!
//! [`ApiDispatcher`] is the seam between the typed API operations and the
//! transport. [`request`] starts a call in the background and hands back a
//! [`Reply`], which resolves to the transformed payload.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Result, VkError};
use crate::params::ParamMap;

/// Executes one API method and returns its unwrapped `response` payload.
#[async_trait]
pub trait ApiDispatcher: Send + Sync {
    async fn call(&self, method: &str, params: &ParamMap) -> Result<Value>;
}

enum ReplyState<T> {
    Pending(JoinHandle<Result<T>>),
    Failed(VkError),
    Done,
}

/// Deferred result of an API call.
///
/// Await it to get the transformed payload. Dropping a pending reply lets the
/// request finish in the background; use [`Reply::abort`] to cancel it.
#[must_use = "a Reply does nothing unless awaited"]
pub struct Reply<T> {
    method: String,
    state: ReplyState<T>,
}

impl<T> Reply<T> {
    fn failed(method: String, error: VkError) -> Self {
        Self {
            method,
            state: ReplyState::Failed(error),
        }
    }

    /// API method this reply belongs to.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Whether awaiting would complete without waiting on the network.
    pub fn is_finished(&self) -> bool {
        match &self.state {
            ReplyState::Pending(handle) => handle.is_finished(),
            ReplyState::Failed(_) | ReplyState::Done => true,
        }
    }

    /// Cancel the background request, if still running.
    pub fn abort(&self) {
        if let ReplyState::Pending(handle) = &self.state {
            handle.abort();
        }
    }
}

impl<T> Future for Reply<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let outcome = match std::mem::replace(&mut this.state, ReplyState::Done) {
            ReplyState::Pending(mut handle) => match Pin::new(&mut handle).poll(cx) {
                Poll::Pending => {
                    this.state = ReplyState::Pending(handle);
                    return Poll::Pending;
                }
                Poll::Ready(Ok(result)) => result,
                Poll::Ready(Err(join_error)) if join_error.is_cancelled() => Err(
                    VkError::TaskFailed(format!("{} was cancelled", this.method)),
                ),
                Poll::Ready(Err(join_error)) => Err(VkError::TaskFailed(join_error.to_string())),
            },
            ReplyState::Failed(error) => Err(error),
            ReplyState::Done => Err(VkError::TaskFailed(format!(
                "reply for {} was already consumed",
                this.method
            ))),
        };

        Poll::Ready(outcome)
    }
}

impl<T> fmt::Debug for Reply<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("method", &self.method)
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Start `method` on the current Tokio runtime and return a [`Reply`].
///
/// `transformer` turns the raw payload into the typed result. Without an
/// active runtime the reply resolves to [`VkError::Configuration`].
pub fn request<D, T, F>(
    dispatcher: Arc<D>,
    method: &str,
    params: ParamMap,
    transformer: F,
) -> Reply<T>
where
    D: ApiDispatcher + ?Sized + 'static,
    T: Send + 'static,
    F: FnOnce(&Value) -> T + Send + 'static,
{
    let method = method.to_string();

    let handle = match Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            warn!(method = %method, "No async runtime available for request");
            return Reply::failed(
                method,
                VkError::Configuration("no Tokio runtime is running".to_string()),
            );
        }
    };

    debug!(method = %method, params = params.len(), "Dispatching request");
    let task_method = method.clone();
    let task = handle.spawn(async move {
        let payload = dispatcher.call(&task_method, &params).await?;
        Ok(transformer(&payload))
    });

    Reply {
        method,
        state: ReplyState::Pending(task),
    }
}
