//! Pending request table used to correlate batch responses by id

use serde_json::Value;
use std::collections::HashSet;
use tandem_json_rpc::Response;
use tracing::warn;

/// Ids of one batch still waiting for their answer.
///
/// Each batch exchange owns its own table, so concurrent batches reusing the
/// same ids never see each other's responses. Ids are keyed by their canonical
/// JSON text, so `1` and `"1"` stay distinct.
#[derive(Debug, Default)]
pub struct PendingRequests {
    ids: HashSet<String>,
}

fn key(id: &Value) -> String {
    id.to_string()
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table for the non-null ids among `ids`
    pub fn with_ids<'a>(ids: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut pending = Self::new();
        for id in ids {
            pending.insert(id);
        }
        pending
    }

    /// Register an outstanding id. Returns false if it was already outstanding.
    pub fn insert(&mut self, id: &Value) -> bool {
        let fresh = self.ids.insert(key(id));
        if !fresh {
            warn!(id = %id, "Duplicate request id in one batch");
        }
        fresh
    }

    /// Take the entry a response answers.
    ///
    /// Returns false for unknown or already-completed ids; such responses are ignored.
    pub fn complete(&mut self, response: &Response) -> bool {
        if self.ids.remove(&key(&response.id)) {
            return true;
        }
        warn!(id = %response.id, "Ignoring response for unknown request id");
        false
    }

    /// Forget an id so a late response for it is dropped
    pub fn cancel(&mut self, id: &Value) -> bool {
        self.ids.remove(&key(id))
    }

    pub fn contains(&self, id: &Value) -> bool {
        self.ids.contains(&key(id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
