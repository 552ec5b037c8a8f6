//! Read-only pool snapshots.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::connection::ConnectionType;

/// Source of replica-set status blocks appended to a [`PoolReport`].
///
/// Consulted for reporting only; the pool never acts on what it returns.
pub trait ReplicaSetMonitor: Send + Sync {
    /// Names of every replica set currently tracked.
    fn tracked_sets(&self) -> Vec<String>;

    /// Status of one set, or `None` if it is no longer monitored.
    fn status(&self, set_name: &str) -> Option<serde_json::Value>;
}

/// Counts for one endpoint pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostReport {
    /// Idle connections right now.
    pub available: usize,
    /// Connections ever created.
    pub created: u64,
    /// Type of the first connection created.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<ConnectionType>,
}

/// Snapshot of a whole registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoolReport {
    /// Per-pool counts keyed by `"<identity>::<timeout secs>"`.
    ///
    /// Pools that never created a connection are left out.
    pub hosts: BTreeMap<String, HostReport>,
    /// Created connections grouped by connection type.
    pub created_by_type: BTreeMap<String, u64>,
    /// Status of each tracked replica set.
    pub replica_sets: BTreeMap<String, serde_json::Value>,
    /// Sum of `available` across pools.
    pub total_available: usize,
    /// Sum of `created` across pools.
    pub total_created: u64,
}

impl PoolReport {
    pub(crate) fn add_host(&mut self, key: String, host: HostReport) {
        self.total_available += host.available;
        self.total_created += host.created;
        if let Some(kind) = host.connection_type {
            *self
                .created_by_type
                .entry(kind.as_str().to_string())
                .or_default() += host.created;
        }
        self.hosts.insert(key, host);
    }

    pub(crate) fn add_replica_sets(&mut self, monitor: &dyn ReplicaSetMonitor) {
        for set_name in monitor.tracked_sets() {
            match monitor.status(&set_name) {
                Some(status) => {
                    self.replica_sets.insert(set_name, status);
                }
                None => tracing::warn!(set = %set_name, "no monitor for set"),
            }
        }
    }

    /// Render the snapshot as JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TwoSets;

    impl ReplicaSetMonitor for TwoSets {
        fn tracked_sets(&self) -> Vec<String> {
            vec!["rs0".into(), "gone".into()]
        }

        fn status(&self, set_name: &str) -> Option<serde_json::Value> {
            (set_name == "rs0").then(|| serde_json::json!({ "primary": "h1:27017" }))
        }
    }

    #[test]
    fn test_totals_and_by_type() {
        let mut report = PoolReport::default();
        report.add_host(
            "a::30".into(),
            HostReport {
                available: 2,
                created: 5,
                connection_type: Some(ConnectionType::Master),
            },
        );
        report.add_host(
            "b::30".into(),
            HostReport {
                available: 1,
                created: 3,
                connection_type: Some(ConnectionType::Master),
            },
        );
        report.add_host(
            "rs0/a,b::30".into(),
            HostReport {
                available: 0,
                created: 1,
                connection_type: Some(ConnectionType::Set),
            },
        );

        assert_eq!(report.total_available, 3);
        assert_eq!(report.total_created, 9);
        assert_eq!(report.created_by_type["master"], 8);
        assert_eq!(report.created_by_type["set"], 1);
    }

    #[test]
    fn test_replica_sets_skip_unmonitored() {
        let mut report = PoolReport::default();
        report.add_replica_sets(&TwoSets);
        assert_eq!(report.replica_sets.len(), 1);
        assert_eq!(report.replica_sets["rs0"]["primary"], "h1:27017");
    }

    #[test]
    fn test_json_shape() {
        let mut report = PoolReport::default();
        report.add_host(
            "h1:27017::30".into(),
            HostReport {
                available: 1,
                created: 1,
                connection_type: Some(ConnectionType::Master),
            },
        );
        let json = report.to_json();
        assert_eq!(json["hosts"]["h1:27017::30"]["type"], "master");
        assert_eq!(json["total_available"], 1);
    }
}
