use shared::error::ReplyDecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid chat endpoint `{url}`: {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("chat endpoint {url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("reply from {url} is not valid JSON: {source}")]
    MalformedBody {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("reply from {url} has no string `reply` field")]
    MissingReply { url: String },
}

impl DispatchError {
    pub(crate) fn from_decode(url: &str, err: ReplyDecodeError) -> Self {
        match err {
            ReplyDecodeError::Malformed(source) => DispatchError::MalformedBody {
                url: url.to_string(),
                source,
            },
            ReplyDecodeError::MissingReply => DispatchError::MissingReply {
                url: url.to_string(),
            },
        }
    }
}
