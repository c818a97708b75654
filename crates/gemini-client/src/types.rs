use serde::{Deserialize, Serialize};

// Outgoing messages
#[derive(Serialize, Debug, Clone)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One piece of a prompt or reply: either text or an inline binary blob.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: Blob },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline_data(mime_type: &str, data: String) -> Self {
        Part::InlineData {
            inline_data: Blob {
                mime_type: mime_type.to_string(),
                data,
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime_type: String,
    /// Base64-encoded payload.
    pub data: String,
}

// Incoming messages
#[derive(Deserialize, Debug, Clone, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if there is any.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .as_text()
    }
}
