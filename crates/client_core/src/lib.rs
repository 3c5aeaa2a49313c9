use std::sync::Arc;

use async_trait::async_trait;
use shared::{domain::Fragment, protocol::ReplyPayload};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub mod endpoint;
pub mod error;
pub mod transport;

pub use endpoint::ChatEndpoint;
pub use error::DispatchError;
pub use transport::{HttpReplyFetcher, ReplyFetcher};

/// Where the dispatcher reads the user's pending message from.
#[async_trait]
pub trait InputSource: Send + Sync {
    async fn current_value(&self) -> String;
}

/// Append-only sink for conversation fragments.
#[async_trait]
pub trait DisplayRegion: Send + Sync {
    async fn append(&self, fragment: Fragment);
}

/// Shared text box a front end writes into and the dispatcher reads from.
#[derive(Debug, Clone, Default)]
pub struct InputField {
    value: Arc<RwLock<String>>,
}

impl InputField {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            value: Arc::new(RwLock::new(initial.into())),
        }
    }

    pub async fn set(&self, value: impl Into<String>) {
        *self.value.write().await = value.into();
    }
}

#[async_trait]
impl InputSource for InputField {
    async fn current_value(&self) -> String {
        self.value.read().await.clone()
    }
}

/// In-memory display region. Clones share the same fragment list.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    fragments: Arc<Mutex<Vec<Fragment>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fragments(&self) -> Vec<Fragment> {
        self.fragments.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.fragments.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.fragments.lock().await.is_empty()
    }

    /// The accumulated chat box markup, one paragraph per fragment.
    pub async fn to_markup(&self) -> String {
        self.fragments
            .lock()
            .await
            .iter()
            .map(Fragment::to_markup)
            .collect()
    }
}

#[async_trait]
impl DisplayRegion for Transcript {
    async fn append(&self, fragment: Fragment) {
        self.fragments.lock().await.push(fragment);
    }
}

/// Turns the current input into one request and, on success, two appended
/// fragments. Stateless between calls; clones share the same handles.
#[derive(Clone)]
pub struct MessageDispatcher {
    endpoint: ChatEndpoint,
    input: Arc<dyn InputSource>,
    display: Arc<dyn DisplayRegion>,
    fetcher: Arc<dyn ReplyFetcher>,
}

impl MessageDispatcher {
    pub fn new(
        endpoint: ChatEndpoint,
        input: Arc<dyn InputSource>,
        display: Arc<dyn DisplayRegion>,
    ) -> Self {
        Self::new_with_fetcher(endpoint, input, display, Arc::new(HttpReplyFetcher::new()))
    }

    pub fn new_with_fetcher(
        endpoint: ChatEndpoint,
        input: Arc<dyn InputSource>,
        display: Arc<dyn DisplayRegion>,
        fetcher: Arc<dyn ReplyFetcher>,
    ) -> Self {
        Self {
            endpoint,
            input,
            display,
            fetcher,
        }
    }

    /// Same endpoint, display and fetcher, reading from a different input.
    pub fn with_input(&self, input: Arc<dyn InputSource>) -> Self {
        Self {
            input,
            ..self.clone()
        }
    }

    pub fn endpoint(&self) -> &ChatEndpoint {
        &self.endpoint
    }

    /// Nothing is appended unless both the request and the decode succeed.
    pub async fn dispatch(&self) -> Result<ReplyPayload, DispatchError> {
        let message = self.input.current_value().await;
        let url = self.endpoint.request_url(&message);
        debug!(
            endpoint = %self.endpoint.url(),
            message_len = message.len(),
            "chat: dispatching message"
        );

        let payload = match self.fetcher.fetch_reply(&url).await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(
                    endpoint = %self.endpoint.url(),
                    error = %err,
                    "chat: dispatch failed; display left unchanged"
                );
                return Err(err);
            }
        };

        self.display.append(Fragment::you(message)).await;
        self.display.append(Fragment::bot(payload.reply.clone())).await;
        info!(
            endpoint = %self.endpoint.url(),
            reply_len = payload.reply.len(),
            "chat: exchange appended"
        );
        Ok(payload)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
