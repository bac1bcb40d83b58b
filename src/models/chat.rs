use serde::{ Deserialize, Serialize };
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One turn of the conversation forwarded to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ChatRequest {
    /// Reads the conversation out of an arbitrary JSON body. A body without
    /// `messages` is an empty conversation; a `messages` value that does not
    /// decode is returned as the error so the caller can report it.
    pub fn from_body(body: &Value) -> Result<Self, serde_json::Error> {
        match body.get("messages") {
            Some(messages) => Ok(Self { messages: Vec::<Message>::deserialize(messages)? }),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
}
