/// Cross-agent calls that have been requested by the orchestrator and are still waiting
/// for a result, in the order they were requested.
#[derive(Debug, Default, Clone)]
pub struct PendingCalls {
    ids: Vec<String>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a call. Returns false if it was already pending.
    pub fn register<S: Into<String>>(&mut self, id: S) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Stop tracking a call. Returns false if it was not pending.
    pub fn resolve(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|pending| pending != id);
        self.ids.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|pending| pending == id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Snapshot of the pending ids; the registry can be mutated while iterating it
    pub fn ids(&self) -> Vec<String> {
        self.ids.clone()
    }
}
