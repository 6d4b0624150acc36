use std::cmp::Reverse;
use std::sync::{Arc, Mutex};

use crate::update::UpdateContext;

/// Callback invoked during every update of a matching wizard. Handlers may
/// read and mutate the candidate submission and append errors.
pub type StepHandler = Arc<dyn Fn(&mut UpdateContext) + Send + Sync>;

struct HandlerEntry {
    priority: i32,
    wizard_id: String,
    handler: StepHandler,
}

/// Priority-ordered list of step handlers, owned by the composition root
/// and injected into the engine. Registration re-sorts descending by
/// priority; ties keep registration order. There is no unregister.
#[derive(Default)]
pub struct StepHandlerRegistry {
    entries: Mutex<Vec<HandlerEntry>>,
}

impl StepHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, priority: i32, wizard_id: impl Into<String>, handler: F)
    where
        F: Fn(&mut UpdateContext) + Send + Sync + 'static,
    {
        let mut entries = self.lock();
        entries.push(HandlerEntry {
            priority,
            wizard_id: wizard_id.into(),
            handler: Arc::new(handler),
        });
        // Stable sort, so equal priorities dispatch in registration order.
        entries.sort_by_key(|entry| Reverse(entry.priority));
    }

    /// Matching handlers in dispatch order. Cloned out under the lock so
    /// dispatch itself never holds it.
    pub fn handlers_for(&self, wizard_id: &str) -> Vec<StepHandler> {
        self.lock()
            .iter()
            .filter(|entry| entry.wizard_id == wizard_id)
            .map(|entry| Arc::clone(&entry.handler))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<HandlerEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
