use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    You,
    Bot,
}

impl Speaker {
    pub fn label(self) -> &'static str {
        match self {
            Speaker::You => "You",
            Speaker::Bot => "Bot",
        }
    }
}

/// One unit appended to a display region: a labelled line of conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub speaker: Speaker,
    pub text: String,
}

impl Fragment {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    pub fn you(text: impl Into<String>) -> Self {
        Self::new(Speaker::You, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Speaker::Bot, text)
    }

    /// Paragraph markup as inserted into the chat page. Text is not escaped.
    pub fn to_markup(&self) -> String {
        format!("<p><b>{}:</b> {}</p>", self.speaker.label(), self.text)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker.label(), self.text)
    }
}
