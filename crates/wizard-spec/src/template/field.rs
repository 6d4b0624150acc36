use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mapper::MapperInput;

/// Input widget types a field template can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Textarea,
    Composer,
    TextOnly,
    Number,
    Url,
    Checkbox,
    Dropdown,
    Category,
    Tag,
    Group,
    Upload,
    Date,
    Time,
    DateTime,
}

impl FieldKind {
    /// Date/time-family fields carry a format string.
    pub fn is_date_like(&self) -> bool {
        matches!(self, FieldKind::Date | FieldKind::Time | FieldKind::DateTime)
    }
}

/// One input within a step definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldTemplate {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Opaque validation rules, passed through to the field validator. The
    /// builder only inspects `similar_topics.categories` for the
    /// needs-categories flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_counter: Option<bool>,
    /// Visibility gate, same semantics as the step condition.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub condition: Vec<MapperInput>,
    /// Mapper expression producing the initial value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefill: Vec<MapperInput>,
    /// Mapper expression producing the selectable content list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<MapperInput>,
    /// Mapper expression producing an explicit display index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub index: Vec<MapperInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_types: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

impl FieldTemplate {
    /// True when a similar-topics validation names at least one category,
    /// which obliges the host to load category data.
    pub fn wants_category_data(&self) -> bool {
        self.validations
            .as_ref()
            .and_then(|validations| validations.get("similar_topics"))
            .and_then(|similar| similar.get("categories"))
            .and_then(Value::as_array)
            .is_some_and(|categories| !categories.is_empty())
    }
}
