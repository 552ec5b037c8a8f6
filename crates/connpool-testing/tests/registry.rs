//! Registry behavior against mock connections.
//!
//! Every connection comes from a [`MockConnector`], so creation times are
//! strictly increasing in checkout order and each connection can be failed,
//! disconnected, or inspected after the pool has taken ownership of it.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use connpool::{
    ConnectError, ConnectionType, CreationTime, HookEvent, PoolConfig, PoolError, PoolRegistry,
};
use connpool_testing::{
    MockConnector, RecordingHook, StaticReplicaSetMonitor, mock_id, registry_with,
};
use parking_lot::Mutex;

const TIMEOUT: Duration = Duration::from_secs(5);
const H1: &str = "h1";
const H2: &str = "h2";

fn setup(config: PoolConfig) -> (Arc<MockConnector>, PoolRegistry) {
    let connector = MockConnector::new();
    let registry = registry_with(&connector, config).unwrap();
    (connector, registry)
}

fn id_of(conn: &dyn connpool::Connection) -> u64 {
    mock_id(conn).expect("mock connection")
}

// =============================================================================
// Checkout and return
// =============================================================================

#[test]
fn test_get_creates_then_reuses() {
    let (connector, registry) = setup(PoolConfig::new());

    let conn = registry.get("h1", TIMEOUT).unwrap();
    assert_eq!(id_of(conn.as_ref()), 1);
    assert_eq!(conn.connection_type(), ConnectionType::Master);
    registry.release(H1, conn).unwrap();
    assert_eq!(registry.available(H1, TIMEOUT), 1);

    let again = registry.get("h1:27017", TIMEOUT).unwrap();
    assert_eq!(id_of(again.as_ref()), 1);
    assert_eq!(connector.connects(), 1);
    assert_eq!(registry.available(H1, TIMEOUT), 0);

    let metrics = registry.metrics();
    assert_eq!(metrics.connections_created, 1);
    assert_eq!(metrics.checkouts_successful, 2);
    assert_eq!(metrics.checkouts_failed, 0);
}

#[test]
fn test_release_with_raw_spec_returns_to_same_pool() {
    let (connector, registry) = setup(PoolConfig::new());

    let conn = registry.get("h1", TIMEOUT).unwrap();
    registry.release("h1", conn).unwrap();
    let conn = registry.get("h1", TIMEOUT).unwrap();
    assert_eq!(id_of(conn.as_ref()), 1);

    registry.release("h1:27017", conn).unwrap();
    let conn = registry.get("h1:27017", TIMEOUT).unwrap();
    assert_eq!(id_of(conn.as_ref()), 1);
    registry.release(" h1 ", conn).unwrap();

    assert_eq!(connector.connects(), 1);
    assert_eq!(registry.available("h1", TIMEOUT), 1);
    assert_eq!(registry.available("h1:27017", TIMEOUT), 1);
}

#[test]
fn test_reuse_is_lifo() {
    let (_, registry) = setup(PoolConfig::new());

    let c1 = registry.get("h1", TIMEOUT).unwrap();
    let c2 = registry.get("h1", TIMEOUT).unwrap();
    registry.release(H1, c1).unwrap();
    registry.release(H1, c2).unwrap();

    assert_eq!(id_of(registry.get("h1", TIMEOUT).unwrap().as_ref()), 2);
}

#[test]
fn test_max_pool_size_destroys_overflow() {
    let (connector, registry) = setup(PoolConfig::new().max_pool_size(2));

    let c1 = registry.get("h1", TIMEOUT).unwrap();
    let c2 = registry.get("h1", TIMEOUT).unwrap();
    let c3 = registry.get("h1", TIMEOUT).unwrap();
    registry.release(H1, c1).unwrap();
    registry.release(H1, c2).unwrap();
    registry.release(H1, c3).unwrap();

    assert_eq!(registry.available(H1, TIMEOUT), 2);
    assert!(connector.handle(3).unwrap().is_closed());
    assert!(!connector.handle(1).unwrap().is_closed());
    assert!(!connector.handle(2).unwrap().is_closed());
}

#[test]
fn test_zero_max_pool_size_never_pools() {
    let (connector, registry) = setup(PoolConfig::new().max_pool_size(0));

    let conn = registry.get("h1", TIMEOUT).unwrap();
    registry.release(H1, conn).unwrap();

    assert_eq!(registry.available(H1, TIMEOUT), 0);
    assert_eq!(connector.open_connections(), 0);
}

#[test]
fn test_distinct_timeouts_use_distinct_pools() {
    let (connector, registry) = setup(PoolConfig::new());

    let short = registry.get("h1", TIMEOUT).unwrap();
    registry.release(H1, short).unwrap();

    let long = registry.get("h1", Duration::from_secs(10)).unwrap();
    assert_eq!(id_of(long.as_ref()), 2);
    assert_eq!(long.socket_timeout(), Duration::from_secs(10));
    assert_eq!(connector.connects(), 2);
    assert_eq!(registry.available(H1, TIMEOUT), 1);
}

#[test]
fn test_replica_set_connection() {
    let (connector, registry) = setup(PoolConfig::new());

    let conn = registry.get("rs0/h1,h2:27018", TIMEOUT).unwrap();
    assert_eq!(conn.connection_type(), ConnectionType::Set);
    registry.release("rs0/h1:27017,h2:27018", conn).unwrap();

    let again = registry.get("rs0/h1:27017,h2:27018", TIMEOUT).unwrap();
    assert_eq!(id_of(again.as_ref()), 1);
    assert_eq!(connector.connects(), 1);
}

#[test]
fn test_idle_timeout_discards_on_checkout() {
    let (connector, registry) = setup(PoolConfig::new().max_idle_time(Duration::from_millis(1)));

    let conn = registry.get("h1", TIMEOUT).unwrap();
    registry.release(H1, conn).unwrap();
    std::thread::sleep(Duration::from_millis(20));

    let fresh = registry.get("h1", TIMEOUT).unwrap();
    assert_eq!(id_of(fresh.as_ref()), 2);
    assert!(connector.handle(1).unwrap().is_closed());
}

#[test]
fn test_disconnected_idle_connection_is_skipped() {
    let (connector, registry) = setup(PoolConfig::new());

    let c1 = registry.get("h1", TIMEOUT).unwrap();
    let c2 = registry.get("h1", TIMEOUT).unwrap();
    registry.release(H1, c1).unwrap();
    registry.release(H1, c2).unwrap();
    connector.handle(2).unwrap().set_connected(false);

    let conn = registry.get("h1", TIMEOUT).unwrap();
    assert_eq!(id_of(conn.as_ref()), 1);
    assert!(connector.handle(2).unwrap().is_closed());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_invalid_spec_fails_without_connecting() {
    let (connector, registry) = setup(PoolConfig::new());

    for spec in ["", "a,b", "/h1", "h1:notaport"] {
        let err = registry.get(spec, TIMEOUT).unwrap_err();
        assert!(matches!(err, PoolError::InvalidEndpoint { .. }), "{spec}: {err}");
        assert_eq!(err.code(), Some(13071));
    }
    assert_eq!(connector.connects(), 0);
}

#[test]
fn test_connect_failure_reports_endpoint_and_code() {
    let (connector, registry) = setup(PoolConfig::new().name("orders"));
    connector.fail_with(Some(ConnectError::new("connection refused")));

    let err = registry.get("h1", TIMEOUT).unwrap_err();
    assert!(err.is_connect_failure());
    assert_eq!(err.code(), Some(11002));
    let text = err.to_string();
    assert!(text.contains("orders"), "{text}");
    assert!(text.contains(H1), "{text}");
    assert!(text.contains("connection refused"), "{text}");
    assert_eq!(registry.metrics().checkouts_failed, 1);

    connector.fail_with(Some(ConnectError::new("auth").with_code(18)));
    assert_eq!(registry.get("h1", TIMEOUT).unwrap_err().code(), Some(18));

    connector.fail_with(None);
    assert!(registry.get("h1", TIMEOUT).is_ok());
}

// =============================================================================
// Bad-connection watermark
// =============================================================================

#[test]
fn test_failed_release_purges_older_connections() {
    let (connector, registry) = setup(PoolConfig::new());

    let c1 = registry.get("h1", TIMEOUT).unwrap();
    let c2 = registry.get("h1", TIMEOUT).unwrap();
    let c3 = registry.get("h1", TIMEOUT).unwrap();
    let c4 = registry.get("h1", TIMEOUT).unwrap();

    registry.release(H1, c1).unwrap();
    assert_eq!(registry.available(H1, TIMEOUT), 1);

    connector.handle(3).unwrap().set_failed(true);
    registry.release(H1, c3).unwrap();

    // The failed connection and everything idle are gone.
    assert_eq!(registry.available(H1, TIMEOUT), 0);
    assert!(connector.handle(1).unwrap().is_closed());
    assert!(connector.handle(3).unwrap().is_closed());

    // Still-borrowed connections are judged against the new watermark.
    assert!(!registry.is_connection_healthy(H1, Some(c2.as_ref())));
    assert!(registry.is_connection_healthy(H1, Some(c4.as_ref())));

    registry.release(H1, c2).unwrap();
    assert!(connector.handle(2).unwrap().is_closed());
    registry.release(H1, c4).unwrap();
    assert_eq!(registry.available(H1, TIMEOUT), 1);
}

#[test]
fn test_failed_connection_with_unknown_time_keeps_pool() {
    let (connector, registry) = setup(PoolConfig::new());

    let c1 = registry.get("h1", TIMEOUT).unwrap();
    connector.set_unknown_creation_time(true);
    let c2 = registry.get("h1", TIMEOUT).unwrap();
    assert_eq!(c2.creation_time(), CreationTime::Unknown);

    registry.release(H1, c1).unwrap();
    connector.handle(2).unwrap().set_failed(true);
    registry.release(H1, c2).unwrap();

    // No watermark can be derived, so only the failed connection goes.
    assert!(connector.handle(2).unwrap().is_closed());
    assert!(!connector.handle(1).unwrap().is_closed());
    assert_eq!(registry.available(H1, TIMEOUT), 1);
}

#[test]
fn test_mark_bad_creation_time_is_monotonic() {
    let (connector, registry) = setup(PoolConfig::new());

    let c1 = registry.get("h1", TIMEOUT).unwrap();
    let c2 = registry.get("h1", TIMEOUT).unwrap();
    let t1 = c1.creation_time();
    let t2 = c2.creation_time();
    registry.release(H1, c2).unwrap();

    assert!(!registry.mark_bad_creation_time(H1, TIMEOUT, CreationTime::Unknown));
    assert!(registry.mark_bad_creation_time(H1, TIMEOUT, t1));
    // c2 was created after the watermark but sat idle; the purge takes it.
    assert!(connector.handle(2).unwrap().is_closed());
    assert!(!registry.mark_bad_creation_time(H1, TIMEOUT, t1));
    assert!(registry.mark_bad_creation_time(H1, TIMEOUT, t2));
    assert!(!registry.mark_bad_creation_time(H1, TIMEOUT, t1));

    assert!(!registry.is_connection_healthy(H1, Some(c1.as_ref())));
}

#[test]
fn test_is_connection_healthy() {
    let (connector, registry) = setup(PoolConfig::new());

    assert!(!registry.is_connection_healthy(H1, None));

    let conn = registry.get("h1", TIMEOUT).unwrap();
    assert!(registry.is_connection_healthy(H1, Some(conn.as_ref())));
    // An endpoint without a pool has no watermark.
    assert!(registry.is_connection_healthy("elsewhere:1", Some(conn.as_ref())));

    connector.handle(1).unwrap().set_failed(true);
    assert!(!registry.is_connection_healthy(H1, Some(conn.as_ref())));
}

#[test]
fn test_is_connection_healthy_accepts_any_spelling() {
    let (_, registry) = setup(PoolConfig::new());

    let old = registry.get("h1", TIMEOUT).unwrap();
    let newer = registry.get("h1", TIMEOUT).unwrap();
    assert!(registry.mark_bad_creation_time("h1:27017", TIMEOUT, old.creation_time()));

    for spelling in ["h1", "h1:27017", " h1 "] {
        assert!(!registry.is_connection_healthy(spelling, Some(old.as_ref())), "{spelling}");
        assert!(registry.is_connection_healthy(spelling, Some(newer.as_ref())), "{spelling}");
    }
    registry.release("h1", newer).unwrap();
    registry.destroy(old);
}

// =============================================================================
// Hooks
// =============================================================================

#[test]
fn test_hook_event_sequence() {
    let (_, registry) = setup(PoolConfig::new());
    let hook = Arc::new(RecordingHook::new());
    registry.register_hook(hook.clone());

    let conn = registry.get("h1", TIMEOUT).unwrap();
    registry.release(H1, conn).unwrap();
    let conn = registry.get("h1", TIMEOUT).unwrap();
    registry.destroy(conn);

    assert_eq!(
        hook.events(),
        vec![
            (HookEvent::Create, Some(1)),
            (HookEvent::HandedOut, Some(1)),
            (HookEvent::Release, Some(1)),
            (HookEvent::HandedOut, Some(1)),
            (HookEvent::Destroy, Some(1)),
        ]
    );
}

#[test]
fn test_handed_out_veto_destroys_connection_once() {
    let (connector, registry) = setup(PoolConfig::new());
    let hook = Arc::new(RecordingHook::failing_on(HookEvent::HandedOut));
    registry.register_hook(hook.clone());

    let err = registry.get("h1", TIMEOUT).unwrap_err();
    assert!(matches!(
        err,
        PoolError::Hook {
            event: HookEvent::HandedOut,
            ..
        }
    ));
    assert_eq!(connector.handle(1).unwrap().closes(), 1);
    assert_eq!(hook.count(HookEvent::Destroy), 1);
    assert_eq!(registry.available(H1, TIMEOUT), 0);
    assert_eq!(registry.metrics().checkouts_failed, 1);
}

#[test]
fn test_create_veto_skips_handed_out() {
    let (connector, registry) = setup(PoolConfig::new());
    let hook = Arc::new(RecordingHook::failing_on(HookEvent::Create));
    registry.register_hook(hook.clone());

    assert!(registry.get("h1", TIMEOUT).is_err());
    assert_eq!(hook.count(HookEvent::HandedOut), 0);
    assert_eq!(connector.handle(1).unwrap().closes(), 1);
}

#[test]
fn test_release_veto_destroys_connection() {
    let (connector, registry) = setup(PoolConfig::new());
    let hook = Arc::new(RecordingHook::failing_on(HookEvent::Release));
    registry.register_hook(hook.clone());

    let conn = registry.get("h1", TIMEOUT).unwrap();
    let err = registry.release(H1, conn).unwrap_err();
    assert!(err.to_string().starts_with("onRelease hook failed"), "{err}");
    assert_eq!(registry.available(H1, TIMEOUT), 0);
    assert_eq!(connector.handle(1).unwrap().closes(), 1);
}

#[test]
fn test_destroy_veto_is_ignored() {
    let (connector, registry) = setup(PoolConfig::new());
    registry.register_hook(Arc::new(RecordingHook::failing_on(HookEvent::Destroy)));

    let conn = registry.get("h1", TIMEOUT).unwrap();
    registry.destroy(conn);
    assert!(connector.handle(1).unwrap().is_closed());
    assert_eq!(registry.metrics().connections_closed, 1);
}

#[test]
fn test_first_failing_hook_stops_the_chain() {
    let (_, registry) = setup(PoolConfig::new());
    let first = Arc::new(RecordingHook::failing_on(HookEvent::HandedOut));
    let second = Arc::new(RecordingHook::new());
    registry.register_hook(first.clone());
    registry.register_hook(second.clone());
    assert_eq!(registry.hook_count(), 2);

    assert!(registry.get("h1", TIMEOUT).is_err());
    assert_eq!(first.count(HookEvent::HandedOut), 1);
    assert_eq!(second.count(HookEvent::Create), 1);
    assert_eq!(second.count(HookEvent::HandedOut), 0);
    // The veto only cut the handout chain short; destroy reaches both.
    assert_eq!(second.count(HookEvent::Destroy), 1);
}

/// Registers a second hook from inside `on_create`.
struct RegisteringHook {
    registry: Mutex<Option<Arc<PoolRegistry>>>,
    added: Arc<RecordingHook>,
}

impl connpool::ConnectionHook for RegisteringHook {
    fn on_create(&self, _conn: &mut dyn connpool::Connection) -> Result<(), connpool::HookError> {
        if let Some(registry) = self.registry.lock().take() {
            registry.register_hook(self.added.clone());
        }
        Ok(())
    }
}

#[test]
fn test_hook_can_register_hook() {
    let connector = MockConnector::new();
    let registry = Arc::new(registry_with(&connector, PoolConfig::new()).unwrap());
    let added = Arc::new(RecordingHook::new());
    registry.register_hook(Arc::new(RegisteringHook {
        registry: Mutex::new(Some(Arc::clone(&registry))),
        added: added.clone(),
    }));

    let conn = registry.get("h1", TIMEOUT).unwrap();
    assert_eq!(registry.hook_count(), 2);
    // The new hook joins after the in-flight dispatch.
    assert_eq!(added.count(HookEvent::Create), 0);
    assert_eq!(added.count(HookEvent::HandedOut), 1);
    registry.release(H1, conn).unwrap();
}

// =============================================================================
// Maintenance
// =============================================================================

#[test]
fn test_clear_all_keeps_counters() {
    let (connector, registry) = setup(PoolConfig::new());

    let a = registry.get("h1", TIMEOUT).unwrap();
    let b = registry.get("h2", TIMEOUT).unwrap();
    registry.release(H1, a).unwrap();
    registry.release(H2, b).unwrap();

    registry.clear_all();
    assert_eq!(connector.open_connections(), 0);
    assert_eq!(registry.available(H1, TIMEOUT), 0);
    assert_eq!(registry.snapshot().total_created, 2);
}

#[test]
fn test_remove_host_clears_host_and_replica_set_forms() {
    let (connector, registry) = setup(PoolConfig::new());

    let a = registry.get("h1", TIMEOUT).unwrap();
    let b = registry.get("h1/rs0", TIMEOUT).unwrap();
    let c = registry.get("h1", Duration::from_secs(10)).unwrap();
    let d = registry.get("h2", TIMEOUT).unwrap();
    let e = registry.get("h10", TIMEOUT).unwrap();
    registry.release("h1", a).unwrap();
    registry.release("h1/rs0", b).unwrap();
    registry.release("h1", c).unwrap();
    registry.release("h2", d).unwrap();
    registry.release("h10", e).unwrap();
    assert_eq!(registry.available("h1", TIMEOUT), 2);

    registry.remove_host("h1");

    assert_eq!(registry.available("h1", TIMEOUT), 0);
    assert_eq!(registry.available("h1/rs0", TIMEOUT), 0);
    assert_eq!(registry.available("h1", Duration::from_secs(10)), 0);
    assert_eq!(registry.available("h2", TIMEOUT), 1);
    assert_eq!(registry.available("h10", TIMEOUT), 1);
    for id in 1..=3 {
        assert!(connector.handle(id).unwrap().is_closed(), "connection {id}");
    }
    assert!(!connector.handle(4).unwrap().is_closed());
    assert!(!connector.handle(5).unwrap().is_closed());
}

#[test]
fn test_remove_host_accepts_explicit_default_port() {
    let (connector, registry) = setup(PoolConfig::new());

    let conn = registry.get("h1", TIMEOUT).unwrap();
    registry.release("h1", conn).unwrap();
    registry.remove_host("h1:27017");

    assert_eq!(registry.available("h1", TIMEOUT), 0);
    assert!(connector.handle(1).unwrap().is_closed());
}

#[test]
fn test_flush_all_drops_unresponsive() {
    let (connector, registry) = setup(PoolConfig::new());

    let c1 = registry.get("h1", TIMEOUT).unwrap();
    let c2 = registry.get("h1", TIMEOUT).unwrap();
    registry.release(H1, c1).unwrap();
    registry.release(H1, c2).unwrap();
    connector.handle(1).unwrap().fail_pings();

    registry.flush_all();

    assert_eq!(registry.available(H1, TIMEOUT), 1);
    assert!(connector.handle(1).unwrap().is_closed());
    assert_eq!(connector.handle(2).unwrap().pings(), 1);

    let metrics = registry.metrics();
    assert_eq!(metrics.health_checks_performed, 2);
    assert_eq!(metrics.health_checks_failed, 1);
    assert!((metrics.health_check_success_rate() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_sweep_task_removes_disconnected() {
    let (connector, registry) = setup(PoolConfig::new());

    let c1 = registry.get("h1", TIMEOUT).unwrap();
    let c2 = registry.get("h1", TIMEOUT).unwrap();
    let c3 = registry.get("h1", TIMEOUT).unwrap();
    registry.release(H1, c1).unwrap();
    registry.release(H1, c2).unwrap();
    registry.release(H1, c3).unwrap();
    connector.handle(2).unwrap().set_connected(false);

    assert_eq!(registry.sweep_task(), 1);
    assert_eq!(registry.available(H1, TIMEOUT), 2);
    assert_eq!(registry.sweep_task(), 0);
    assert_eq!(registry.metrics().sweeps_performed, 2);

    // Survivors keep their order.
    assert_eq!(id_of(registry.get("h1", TIMEOUT).unwrap().as_ref()), 3);
}

#[test]
fn test_close_errors_are_swallowed() {
    let (connector, registry) = setup(PoolConfig::new());

    let conn = registry.get("h1", TIMEOUT).unwrap();
    registry.release(H1, conn).unwrap();
    connector.handle(1).unwrap().fail_close();

    registry.clear_all();
    assert_eq!(registry.metrics().connections_closed, 1);
}

#[test]
fn test_set_max_pool_size_trims_oldest() {
    let (_, registry) = setup(PoolConfig::new());
    assert_eq!(registry.max_pool_size(), None);

    let conns: Vec<_> = (0..3).map(|_| registry.get("h1", TIMEOUT).unwrap()).collect();
    for conn in conns {
        registry.release(H1, conn).unwrap();
    }

    registry.set_max_pool_size(Some(1));
    assert_eq!(registry.max_pool_size(), Some(1));
    assert_eq!(registry.available(H1, TIMEOUT), 1);
    assert_eq!(id_of(registry.get("h1", TIMEOUT).unwrap().as_ref()), 3);

    // Pools created later pick up the new limit.
    let a = registry.get("h2", TIMEOUT).unwrap();
    let b = registry.get("h2", TIMEOUT).unwrap();
    registry.release(H2, a).unwrap();
    registry.release(H2, b).unwrap();
    assert_eq!(registry.available(H2, TIMEOUT), 1);
}

#[test]
fn test_drop_closes_idle_connections() {
    let (connector, registry) = setup(PoolConfig::new());

    let conn = registry.get("h1", TIMEOUT).unwrap();
    registry.release(H1, conn).unwrap();
    drop(registry);

    assert!(connector.handle(1).unwrap().is_closed());
}

// =============================================================================
// Snapshot
// =============================================================================

#[test]
fn test_snapshot_counts_and_types() {
    let connector = MockConnector::new();
    let monitor = Arc::new(StaticReplicaSetMonitor::new());
    monitor.set_status("rs0", serde_json::json!({ "primary": H1 }));
    monitor.track_without_status("retired");

    let registry = PoolRegistry::builder()
        .shared_connector(connector.clone())
        .replica_set_monitor(monitor)
        .build()
        .unwrap();

    let a = registry.get("h1", TIMEOUT).unwrap();
    let b = registry.get("h1", TIMEOUT).unwrap();
    let s = registry.get("rs0/h1,h2", TIMEOUT).unwrap();
    registry.release(H1, a).unwrap();
    registry.destroy(b);
    registry.release("rs0/h1:27017,h2:27017", s).unwrap();

    // A failed dial leaves an empty pool behind that the snapshot skips.
    connector.fail_with(Some(ConnectError::new("unreachable")));
    assert!(registry.get("h9", TIMEOUT).is_err());

    let report = registry.snapshot();
    assert_eq!(report.hosts.len(), 2);
    let h1 = &report.hosts["h1::5"];
    assert_eq!(h1.available, 1);
    assert_eq!(h1.created, 2);
    assert_eq!(h1.connection_type, Some(ConnectionType::Master));
    assert_eq!(report.created_by_type["master"], 2);
    assert_eq!(report.created_by_type["set"], 1);
    assert_eq!(report.total_available, 2);
    assert_eq!(report.total_created, 3);
    assert_eq!(report.replica_sets.len(), 1);

    let json = report.to_json();
    assert_eq!(json["hosts"]["h1::5"]["type"], "master");
    assert_eq!(json["replica_sets"]["rs0"]["primary"], H1);

    // Snapshots are read-only.
    assert_eq!(registry.snapshot(), report);
}

#[test]
fn test_builder_overrides_config() {
    let connector = MockConnector::new();
    let registry = PoolRegistry::builder()
        .config(PoolConfig::new().max_pool_size(5))
        .name("analytics")
        .max_pool_size(1)
        .shared_connector(connector.clone())
        .hook(Arc::new(RecordingHook::new()))
        .build()
        .unwrap();

    assert_eq!(registry.name(), "analytics");
    assert_eq!(registry.max_pool_size(), Some(1));
    assert_eq!(registry.hook_count(), 1);
}
