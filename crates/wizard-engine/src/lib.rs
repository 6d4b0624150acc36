#![allow(missing_docs)]

pub mod builder;
pub mod engine;
pub mod errors;
pub mod registry;
pub mod services;
pub mod stubs;
pub mod update;
pub mod wizard;

pub use engine::{BuildOptions, Engine, EngineServices};
pub use errors::EngineError;
pub use registry::{StepHandler, StepHandlerRegistry};
pub use services::{
    AccessPolicy, ActionExecutor, ActionOutcome, FieldValidator, SubmissionStore, TemplateStore,
};
pub use update::{
    ROUTE_TO_KEY, StepUpdateRequest, StepUpdateResult, UpdateContext, UpdateError, UpdateState,
};
pub use wizard::{Field, Step, Wizard};
