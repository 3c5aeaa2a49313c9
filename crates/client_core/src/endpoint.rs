use shared::protocol::{GET_RESPONSE_PATH, MESSAGE_QUERY_KEY};
use url::Url;

use crate::error::DispatchError;

/// The fixed chatbot route on a given server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEndpoint {
    url: Url,
}

impl ChatEndpoint {
    pub fn new(server_url: &str) -> Result<Self, DispatchError> {
        Self::with_path(server_url, GET_RESPONSE_PATH)
    }

    /// Resolves `path` against `server_url` the way a page resolves a
    /// relative fetch: a leading `/` replaces any path on the base.
    pub fn with_path(server_url: &str, path: &str) -> Result<Self, DispatchError> {
        let invalid = |reason: String| DispatchError::InvalidEndpoint {
            url: server_url.to_string(),
            reason,
        };

        let base = Url::parse(server_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme `{}`", base.scheme())));
        }
        let mut url = base.join(path).map_err(|e| invalid(e.to_string()))?;
        url.set_query(None);
        url.set_fragment(None);
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Full request URL carrying `message` as its only query parameter.
    /// The parameter decodes back to exactly `message`, including the empty string.
    pub fn request_url(&self, message: &str) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair(MESSAGE_QUERY_KEY, message);
        url
    }
}
