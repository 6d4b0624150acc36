use std::sync::Arc;

use crate::registry::StepHandlerRegistry;
use crate::services::{
    AccessPolicy, ActionExecutor, FieldValidator, SubmissionStore, TemplateStore,
};

/// External collaborators the engine delegates to.
#[derive(Clone)]
pub struct EngineServices {
    pub templates: Arc<dyn TemplateStore>,
    pub submissions: Arc<dyn SubmissionStore>,
    pub access: Arc<dyn AccessPolicy>,
    pub validator: Arc<dyn FieldValidator>,
    pub actions: Arc<dyn ActionExecutor>,
}

/// Composition root for wizard builds and step updates. Thread-safe; one
/// instance serves the whole process. Callers must still serialize update
/// calls per user+wizard pair, since an update is a read-merge-persist
/// sequence over shared submission state.
pub struct Engine {
    pub(crate) services: EngineServices,
    pub(crate) registry: Arc<StepHandlerRegistry>,
    pub(crate) enabled: bool,
}

impl Engine {
    pub fn new(services: EngineServices, registry: Arc<StepHandlerRegistry>) -> Self {
        Self {
            services,
            registry,
            enabled: true,
        }
    }

    /// Feature gate: a disabled engine builds nothing and rejects updates.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn registry(&self) -> &StepHandlerRegistry {
        &self.registry
    }
}

/// Per-build options supplied by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Ignore prior submission values when resolving field values. Prefill
    /// expressions still apply.
    pub reset: bool,
}
