use serde::Serialize;
use serde_json::Value;

use wizard_spec::{FieldKind, SubmissionData, UserContext, WizardTemplate};

/// One user's live run of a wizard template. Steps and fields are rebuilt on
/// every build call; only the submission survives across calls.
#[derive(Debug, Clone, Serialize)]
pub struct Wizard {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub user: UserContext,
    pub steps: Vec<Step>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionData>,
    /// Set during field construction when the host must load category data.
    pub needs_categories: bool,
    /// Set during field construction when the host must load group data.
    pub needs_groups: bool,
}

impl Wizard {
    pub fn new(template: &WizardTemplate, user: UserContext) -> Self {
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            user,
            steps: Vec::new(),
            submission: None,
            needs_categories: false,
            needs_groups: false,
        }
    }

    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.id == step_id)
    }
}

/// One built page of a wizard. Ephemeral: discarded and rebuilt per request.
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub force_final: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub permitted: bool,
    /// Denial message shown when `permitted` is false. A denied step is a
    /// normal terminal state, not an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permitted_message: Option<String>,
    pub fields: Vec<Field>,
}

impl Step {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index: None,
            title: None,
            banner: None,
            key: None,
            force_final: false,
            description: None,
            permitted: true,
            permitted_message: None,
            fields: Vec::new(),
        }
    }

    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.id == field_id)
    }
}

/// One built input within a step, with its resolved display value and
/// type-specific parameters. Owned exclusively by its step.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validations: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_counter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Selectable entries, already mapped to `{id, name}` objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}
