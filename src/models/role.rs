use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value };
use utoipa::ToSchema;

/// Key under which the store-assigned identifier is returned.
pub const STORE_ID_KEY: &str = "_id";

/// A role document exactly as the caller sent it, or as it came back from the
/// store with [`STORE_ID_KEY`] added.
pub type RoleDocument = Map<String, Value>;

/// Persona preset shown by the chat client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: String,
    pub category: String,
    pub name: String,
    pub emoji: String,
    pub description: String,
    /// Tailwind classes for background and border, e.g. `bg-purple-50 border-purple-200`.
    pub color: String,
    pub prompt: String,
}

impl Role {
    pub fn to_document(&self) -> RoleDocument {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => RoleDocument::new(),
        }
    }
}

/// Returns the store identifier of a stored role, if present.
pub fn store_id(document: &RoleDocument) -> Option<&str> {
    document.get(STORE_ID_KEY).and_then(Value::as_str)
}
