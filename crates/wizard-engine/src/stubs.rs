//! In-memory service implementations for tests and demos.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde_json::Value;

use wizard_spec::{ActionTemplate, SubmissionData, UserContext, WizardTemplate};

use crate::errors::EngineError;
use crate::services::{
    AccessPolicy, ActionExecutor, ActionOutcome, FieldValidator, SubmissionStore, TemplateStore,
};
use crate::update::UpdateError;
use crate::wizard::Field;

/// Template store backed by a fixed map.
#[derive(Default)]
pub struct StaticTemplates {
    templates: HashMap<String, WizardTemplate>,
}

impl StaticTemplates {
    pub fn with(template: WizardTemplate) -> Self {
        let mut templates = HashMap::new();
        templates.insert(template.id.clone(), template);
        Self { templates }
    }

    pub fn insert(&mut self, template: WizardTemplate) {
        self.templates.insert(template.id.clone(), template);
    }
}

impl TemplateStore for StaticTemplates {
    fn resolve(&self, wizard_id: &str) -> Result<Option<WizardTemplate>, EngineError> {
        Ok(self.templates.get(wizard_id).cloned())
    }
}

/// Submission store over a process-local map, serialized by its own lock.
#[derive(Default)]
pub struct MemorySubmissions {
    inner: Mutex<HashMap<(String, u64), SubmissionData>>,
}

impl MemorySubmissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, wizard_id: &str, user_id: u64, data: SubmissionData) {
        self.lock().insert((wizard_id.to_string(), user_id), data);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, u64), SubmissionData>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SubmissionStore for MemorySubmissions {
    fn current(
        &self,
        wizard_id: &str,
        user_id: u64,
    ) -> Result<Option<SubmissionData>, EngineError> {
        Ok(self.lock().get(&(wizard_id.to_string(), user_id)).cloned())
    }

    fn save(
        &self,
        wizard_id: &str,
        user_id: u64,
        data: &SubmissionData,
    ) -> Result<(), EngineError> {
        self.lock()
            .insert((wizard_id.to_string(), user_id), data.clone());
        Ok(())
    }
}

/// Grants every user access.
pub struct OpenAccess;

impl AccessPolicy for OpenAccess {
    fn can_access(&self, _user: &UserContext, _template: &WizardTemplate) -> bool {
        true
    }
}

/// Denies every user access.
pub struct NoAccess;

impl AccessPolicy for NoAccess {
    fn can_access(&self, _user: &UserContext, _template: &WizardTemplate) -> bool {
        false
    }
}

/// Enforces `required` plus min/max length on strings; enough to exercise
/// the rejection paths without a host validation stack.
pub struct BasicFieldValidator;

impl FieldValidator for BasicFieldValidator {
    fn validate(&self, field: &Field, value: Option<&Value>) -> Vec<UpdateError> {
        let mut errors = Vec::new();

        let blank = match value {
            None | Some(Value::Null) => true,
            Some(Value::String(text)) => text.trim().is_empty(),
            Some(_) => false,
        };
        if field.required && blank {
            errors.push(UpdateError::field(&field.id, "value is required"));
            return errors;
        }

        if let Some(Value::String(text)) = value {
            if let Some(min) = field.min_length
                && text.chars().count() < min
            {
                errors.push(UpdateError::field(
                    &field.id,
                    format!("must be at least {min} characters"),
                ));
            }
            if let Some(max) = field.max_length
                && text.chars().count() > max
            {
                errors.push(UpdateError::field(
                    &field.id,
                    format!("must be at most {max} characters"),
                ));
            }
        }

        errors
    }
}

/// Records performed action ids in order; kinds listed as failing report a
/// failed outcome.
#[derive(Default)]
pub struct RecordingExecutor {
    performed: Mutex<Vec<String>>,
    failing: HashSet<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(kinds: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            performed: Mutex::new(Vec::new()),
            failing: kinds.into_iter().map(Into::into).collect(),
        }
    }

    pub fn performed(&self) -> Vec<String> {
        self.performed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ActionExecutor for RecordingExecutor {
    fn perform(
        &self,
        action: &ActionTemplate,
        _wizard_id: &str,
        _user: &UserContext,
        _data: &SubmissionData,
    ) -> ActionOutcome {
        self.performed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(action.id.clone());
        if self.failing.contains(&action.kind) {
            ActionOutcome::failed(format!("action '{}' failed", action.id))
        } else {
            ActionOutcome::ok()
        }
    }
}
