use serde::{Deserialize, Serialize};

use crate::error::ReplyDecodeError;

pub const GET_RESPONSE_PATH: &str = "/chatbot/get_response/";
pub const MESSAGE_QUERY_KEY: &str = "message";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub reply: String,
}

impl ReplyPayload {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }

    /// Decodes a reply body, telling malformed JSON apart from a body that
    /// parses but carries no usable `reply`. Extra fields are ignored.
    pub fn from_body(body: &[u8]) -> Result<Self, ReplyDecodeError> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        match value.get("reply") {
            Some(serde_json::Value::String(reply)) => Ok(Self::new(reply.as_str())),
            _ => Err(ReplyDecodeError::MissingReply),
        }
    }
}
