pub mod action;
pub mod field;
pub mod step;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use action::ActionTemplate;
pub use field::{FieldKind, FieldTemplate};
pub use step::{ParamPair, PermittedParam, RequiredData, RequiredDataPair, StepTemplate};

/// The static, shared definition of a wizard: its steps in order plus the
/// actions that run after step updates. Read-only once loaded; every user's
/// run of the same wizard shares one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WizardTemplate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Forces a reset build on every revisit, discarding stale submission
    /// values in favor of prefills.
    #[serde(default)]
    pub restart_on_revisit: bool,
    pub steps: Vec<StepTemplate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionTemplate>,
}

impl WizardTemplate {
    pub fn step(&self, step_id: &str) -> Option<&StepTemplate> {
        self.steps.iter().find(|step| step.id == step_id)
    }

    /// Actions declared to run after the given step, in template order.
    pub fn actions_after<'a>(
        &'a self,
        step_id: &'a str,
    ) -> impl Iterator<Item = &'a ActionTemplate> {
        self.actions
            .iter()
            .filter(move |action| action.run_after == step_id)
    }
}
