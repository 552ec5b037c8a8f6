//! Fixed replica-set status source.

use std::collections::BTreeMap;

use connpool::ReplicaSetMonitor;
use parking_lot::RwLock;

/// [`ReplicaSetMonitor`] serving status blocks set by the test.
///
/// A set can be tracked without a status to model a monitor that has been
/// torn down while still listed.
#[derive(Debug, Default)]
pub struct StaticReplicaSetMonitor {
    sets: RwLock<BTreeMap<String, Option<serde_json::Value>>>,
}

impl StaticReplicaSetMonitor {
    /// Create a monitor tracking no sets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `set_name` with the given status.
    pub fn set_status(&self, set_name: impl Into<String>, status: serde_json::Value) {
        self.sets.write().insert(set_name.into(), Some(status));
    }

    /// Track `set_name` without a status.
    pub fn track_without_status(&self, set_name: impl Into<String>) {
        self.sets.write().insert(set_name.into(), None);
    }
}

impl ReplicaSetMonitor for StaticReplicaSetMonitor {
    fn tracked_sets(&self) -> Vec<String> {
        self.sets.read().keys().cloned().collect()
    }

    fn status(&self, set_name: &str) -> Option<serde_json::Value> {
        self.sets.read().get(set_name).cloned().flatten()
    }
}
