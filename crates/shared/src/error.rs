use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplyDecodeError {
    #[error("response body is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("response JSON has no string `reply` field")]
    MissingReply,
}
