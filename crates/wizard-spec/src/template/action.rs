use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A template-declared side effect, executed after its `run_after` step
/// applies an update. `kind` is the dispatcher key for the pluggable
/// action executor; `params` are opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionTemplate {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub run_after: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}
