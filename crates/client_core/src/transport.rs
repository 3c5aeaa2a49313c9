use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::ReplyPayload;
use tracing::debug;
use url::Url;

use crate::error::DispatchError;

/// Fetch-then-decode step of a dispatch.
#[async_trait]
pub trait ReplyFetcher: Send + Sync {
    async fn fetch_reply(&self, url: &Url) -> Result<ReplyPayload, DispatchError>;
}

pub struct HttpReplyFetcher {
    http: Client,
}

impl HttpReplyFetcher {
    pub fn new() -> Self {
        Self::from_client(Client::new())
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DispatchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DispatchError::ClientInit)?;
        Ok(Self::from_client(http))
    }

    pub fn from_client(http: Client) -> Self {
        Self { http }
    }
}

impl Default for HttpReplyFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyFetcher for HttpReplyFetcher {
    async fn fetch_reply(&self, url: &Url) -> Result<ReplyPayload, DispatchError> {
        let transport = |source: reqwest::Error| DispatchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        debug!(
            status = status.as_u16(),
            body_len = body.len(),
            "chat: reply body received"
        );
        ReplyPayload::from_body(&body).map_err(|err| DispatchError::from_decode(url.as_str(), err))
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
