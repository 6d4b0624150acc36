use log::{debug, warn};
use serde::Serialize;

use wizard_spec::{Mapper, SubmissionData, UserContext, merge_submission};

use crate::builder::{self, BuildFlags};
use crate::engine::Engine;
use crate::errors::EngineError;
use crate::wizard::Step;

/// Reserved submission key signalling a redirect target. Extracted before
/// persistence; never stored as field data.
pub const ROUTE_TO_KEY: &str = "route_to";

/// One collected error descriptor, field-scoped or step-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl UpdateError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn step(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// Step update lifecycle. `Pending` and `Validating` are transient;
/// results only ever carry `Rejected` or `Applied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateState {
    Pending,
    Validating,
    Rejected,
    Applied,
}

/// Command re-entering the update pipeline for one step. Carries only the
/// addressing state; gates and fields are re-derived from the template so
/// no stale submission snapshot is captured across requests.
#[derive(Debug, Clone)]
pub struct StepUpdateRequest {
    pub wizard_id: String,
    pub step_id: String,
    pub user: UserContext,
    pub payload: SubmissionData,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepUpdateResult {
    pub state: UpdateState,
    pub errors: Vec<UpdateError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_on_next: Option<String>,
    /// The persisted submission, present only when the update applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionData>,
}

impl StepUpdateResult {
    fn rejected(errors: Vec<UpdateError>) -> Self {
        Self {
            state: UpdateState::Rejected,
            errors,
            redirect_on_next: None,
            submission: None,
        }
    }

    pub fn applied(&self) -> bool {
        self.state == UpdateState::Applied
    }
}

/// Mutable context handed to registered step handlers. Submission edits
/// made here land in the persisted result when the update applies.
pub struct UpdateContext {
    pub wizard_id: String,
    pub step_id: String,
    pub user: UserContext,
    pub submission: SubmissionData,
    errors: Vec<UpdateError>,
}

impl UpdateContext {
    fn new(request: &StepUpdateRequest, submission: SubmissionData) -> Self {
        Self {
            wizard_id: request.wizard_id.clone(),
            step_id: request.step_id.clone(),
            user: request.user.clone(),
            submission,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: UpdateError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[UpdateError] {
        &self.errors
    }

    fn into_parts(self) -> (SubmissionData, Vec<UpdateError>) {
        (self.submission, self.errors)
    }
}

impl Engine {
    /// Runs the step update state machine: merge, validate, dispatch step
    /// handlers, run actions, persist.
    ///
    /// Expected failures (validation, handler, or action errors, and gates
    /// that deny the step) come back as a `Rejected` result with nothing
    /// persisted. Action side effects that already ran are not compensated
    /// on a later rejection; they are at-least-once by design of the
    /// template format, and callers relying on that should keep their
    /// actions idempotent.
    pub fn update(&self, request: StepUpdateRequest) -> Result<StepUpdateResult, EngineError> {
        if !self.enabled {
            return Err(EngineError::Disabled);
        }
        let Some(template) = self.services.templates.resolve(&request.wizard_id)? else {
            return Err(EngineError::UnknownWizard(request.wizard_id));
        };
        let Some(step_template) = template.step(&request.step_id) else {
            return Err(EngineError::UnknownStep {
                wizard_id: request.wizard_id,
                step_id: request.step_id,
            });
        };

        let current = self
            .services
            .submissions
            .current(&request.wizard_id, request.user.id)?;

        // Re-derive the build-time gates; a hidden or denied step accepts
        // no data.
        if !Mapper::new(&request.user, current.as_ref()).check(&step_template.condition) {
            debug!(
                "update for hidden step '{}' of wizard '{}'",
                request.step_id, request.wizard_id
            );
            return Ok(StepUpdateResult::rejected(vec![UpdateError::step(
                "step is not available",
            )]));
        }
        let mut gate = Step::new(&request.step_id);
        builder::check_permitted(&mut gate, step_template, &request.user, current.as_ref());
        if !gate.permitted {
            let message = gate
                .permitted_message
                .unwrap_or_else(|| "step is not permitted".into());
            return Ok(StepUpdateResult::rejected(vec![UpdateError::step(message)]));
        }

        // Validating: payload values win on key collision.
        let candidate = merge_submission(current.as_ref(), &request.payload);

        let mut step = Step::new(&request.step_id);
        let mut flags = BuildFlags::default();
        builder::build_fields(
            &mut step,
            step_template,
            &request.user,
            current.as_ref(),
            false,
            &mut flags,
        );
        let mut errors = Vec::new();
        for field in &step.fields {
            errors.extend(
                self.services
                    .validator
                    .validate(field, candidate.get(&field.id)),
            );
        }
        if !errors.is_empty() {
            return Ok(StepUpdateResult::rejected(errors));
        }

        // Extension hooks, highest priority first. Actions never run when
        // a handler reports an error.
        let mut ctx = UpdateContext::new(&request, candidate);
        for handler in self.registry.handlers_for(&request.wizard_id) {
            handler(&mut ctx);
        }
        if ctx.has_errors() {
            let (_, errors) = ctx.into_parts();
            return Ok(StepUpdateResult::rejected(errors));
        }

        let (mut candidate, mut errors) = ctx.into_parts();
        for action in template.actions_after(&request.step_id) {
            let outcome =
                self.services
                    .actions
                    .perform(action, &request.wizard_id, &request.user, &candidate);
            if !outcome.success {
                warn!(
                    "action '{}' failed after step '{}' of wizard '{}'",
                    action.id, request.step_id, request.wizard_id
                );
                errors.extend(outcome.errors);
            }
        }
        if !errors.is_empty() {
            return Ok(StepUpdateResult::rejected(errors));
        }

        let redirect_on_next = candidate
            .remove(ROUTE_TO_KEY)
            .and_then(|value| value.as_str().map(str::to_string));
        self.services
            .submissions
            .save(&request.wizard_id, request.user.id, &candidate)?;

        Ok(StepUpdateResult {
            state: UpdateState::Applied,
            errors: Vec::new(),
            redirect_on_next,
            submission: Some(candidate),
        })
    }
}
