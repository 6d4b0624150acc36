use serde_json::Value;

use wizard_spec::{ActionTemplate, SubmissionData, UserContext, WizardTemplate};

use crate::errors::EngineError;
use crate::update::UpdateError;
use crate::wizard::Field;

/// Source of static wizard definitions.
pub trait TemplateStore: Send + Sync {
    /// `Ok(None)` when no template exists, which makes build return nothing.
    fn resolve(&self, wizard_id: &str) -> Result<Option<WizardTemplate>, EngineError>;
}

/// Persistence for per-user submission state.
pub trait SubmissionStore: Send + Sync {
    fn current(
        &self,
        wizard_id: &str,
        user_id: u64,
    ) -> Result<Option<SubmissionData>, EngineError>;

    /// A save either fully lands or errors; partial-field persistence is
    /// not allowed.
    fn save(
        &self,
        wizard_id: &str,
        user_id: u64,
        data: &SubmissionData,
    ) -> Result<(), EngineError>;
}

/// "Can this user open this wizard." False yields a wizard with zero steps.
pub trait AccessPolicy: Send + Sync {
    fn can_access(&self, user: &UserContext, template: &WizardTemplate) -> bool;
}

/// Field-level validation of submitted values. The engine treats the
/// returned list as opaque pass/fail plus message.
pub trait FieldValidator: Send + Sync {
    fn validate(&self, field: &Field, value: Option<&Value>) -> Vec<UpdateError>;
}

/// Result of one action execution.
#[derive(Debug, Clone, Default)]
pub struct ActionOutcome {
    pub success: bool,
    pub errors: Vec<UpdateError>,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![UpdateError::step(message)],
        }
    }
}

/// Pluggable dispatcher for template-declared side effects, keyed by the
/// action template's `kind`.
pub trait ActionExecutor: Send + Sync {
    /// Side effects are at-least-once: a later rejection in the same update
    /// cycle does not roll them back.
    fn perform(
        &self,
        action: &ActionTemplate,
        wizard_id: &str,
        user: &UserContext,
        data: &SubmissionData,
    ) -> ActionOutcome;
}
