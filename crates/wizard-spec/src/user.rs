use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity of the user a wizard run belongs to.
///
/// Mapper expressions can look up the well-known attributes by name; anything
/// else is read from `custom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct UserContext {
    pub id: u64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom: Map<String, Value>,
}

impl UserContext {
    pub fn named(id: u64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            ..Self::default()
        }
    }

    /// Resolves a user attribute by name, `None` when nothing matches.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::from(self.id)),
            "username" => Some(Value::String(self.username.clone())),
            "name" => self.name.clone().map(Value::String),
            "email" => self.email.clone().map(Value::String),
            other => self.custom.get(other).cloned(),
        }
    }
}
