use thiserror::Error;

/// Hard faults from external collaborators or misaddressed requests.
///
/// Expected outcomes (denied steps, validation failures, action errors) are
/// returned as data on the build/update results, never through this enum.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("wizard engine is disabled")]
    Disabled,
    #[error("template store failure: {0}")]
    TemplateStore(String),
    #[error("submission store failure: {0}")]
    SubmissionStore(String),
    #[error("no template found for wizard '{0}'")]
    UnknownWizard(String),
    #[error("wizard '{wizard_id}' has no step '{step_id}'")]
    UnknownStep { wizard_id: String, step_id: String },
}
