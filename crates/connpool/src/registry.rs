//! Registry of endpoint pools.
//!
//! One mutex guards the endpoint map and every pool inside it. Hooks, the
//! network connect, and connection teardown all run with that mutex
//! released, so a slow close or a hook that borrows from the registry never
//! blocks unrelated endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::PoolConfig;
use crate::connection::Connection;
use crate::endpoint::{ConnectionString, Connector, canonical_identity};
use crate::error::{CONNECT_FAILED_CODE, HookEvent, PoolError, Result};
use crate::hook::{ConnectionHook, HookChain};
use crate::host_pool::EndpointPool;
use crate::key::{EndpointKey, same_host};
use crate::lease::ScopedLease;
use crate::report::{HostReport, PoolReport, ReplicaSetMonitor};

/// Client-side connection pool covering any number of endpoints.
///
/// Idle connections are cached per `(endpoint identity, socket timeout)`.
/// Borrow with [`get`](Self::get) and hand back with
/// [`release`](Self::release), or use [`lease`](Self::lease) for a scoped
/// borrow that is resolved automatically.
///
/// # Example
///
/// ```rust,ignore
/// use std::time::Duration;
/// use connpool::{PoolConfig, PoolRegistry};
///
/// let registry = PoolRegistry::builder()
///     .config(PoolConfig::new().max_pool_size(20))
///     .connector(my_connector)
///     .build()?;
///
/// let lease = registry.lease("db1:27017", Duration::from_secs(30))?;
/// // Use lease...
/// lease.done()?;
/// ```
pub struct PoolRegistry {
    config: PoolConfig,
    state: Mutex<RegistryState>,
    hooks: HookChain,
    connector: Arc<dyn Connector>,
    replica_sets: Option<Arc<dyn ReplicaSetMonitor>>,
    outstanding_leases: AtomicUsize,
    created_at: Instant,
    metrics: Mutex<PoolMetricsInner>,
}

struct RegistryState {
    pools: BTreeMap<EndpointKey, EndpointPool>,
    max_pool_size: Option<usize>,
}

impl RegistryState {
    /// Look up or create the pool for a key, bringing it up to date with
    /// the registry-wide settings.
    fn pool_for(
        &mut self,
        identity: &str,
        socket_timeout: Duration,
        max_idle_time: Option<Duration>,
        discarded: &mut Vec<Box<dyn Connection>>,
    ) -> &mut EndpointPool {
        let max_pool_size = self.max_pool_size;
        let pool = self
            .pools
            .entry(EndpointKey::new(identity, socket_timeout))
            .or_default();
        pool.set_max_pool_size(max_pool_size, discarded);
        pool.set_max_idle_time(max_idle_time);
        pool.initialize_host_name(identity);
        pool
    }
}

/// Internal metrics tracking.
#[derive(Debug, Default)]
struct PoolMetricsInner {
    connections_created: u64,
    connections_closed: u64,
    checkouts_successful: u64,
    checkouts_failed: u64,
    health_checks_performed: u64,
    health_checks_failed: u64,
    sweeps_performed: u64,
}

impl PoolRegistry {
    /// Create a new registry builder.
    #[must_use]
    pub fn builder() -> PoolRegistryBuilder {
        PoolRegistryBuilder::new()
    }

    /// Create a registry with the given configuration and connector.
    pub fn new(config: PoolConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            name = %config.name,
            max_pool_size = ?config.max_pool_size,
            "connection pool registry created"
        );

        Ok(Self {
            state: Mutex::new(RegistryState {
                pools: BTreeMap::new(),
                max_pool_size: config.max_pool_size,
            }),
            config,
            hooks: HookChain::default(),
            connector,
            replica_sets: None,
            outstanding_leases: AtomicUsize::new(0),
            created_at: Instant::now(),
            metrics: Mutex::new(PoolMetricsInner::default()),
        })
    }

    /// Borrow a connection to the endpoint described by `spec`.
    ///
    /// Reuses the most recently returned idle connection when one is usable,
    /// otherwise dials a new one. Fails with
    /// [`PoolError::InvalidEndpoint`] before touching any pool when `spec`
    /// does not parse.
    pub fn get(&self, spec: &str, socket_timeout: Duration) -> Result<Box<dyn Connection>> {
        let endpoint = ConnectionString::parse(spec)?;
        self.get_with(&endpoint, socket_timeout)
    }

    /// Borrow a connection to an already parsed endpoint.
    pub fn get_with(
        &self,
        endpoint: &ConnectionString,
        socket_timeout: Duration,
    ) -> Result<Box<dyn Connection>> {
        let identity = endpoint.identity();

        if let Some(conn) = self.take_idle(&identity, socket_timeout) {
            tracing::trace!(endpoint = %identity, "reusing pooled connection");
            return self.hand_out(conn, &[HookEvent::HandedOut]);
        }

        let conn = match self.connector.connect(endpoint, socket_timeout) {
            Ok(conn) => conn,
            Err(e) => {
                self.metrics.lock().checkouts_failed += 1;
                return Err(PoolError::Connect {
                    pool: self.config.name.clone(),
                    endpoint: identity,
                    code: e.code.unwrap_or(CONNECT_FAILED_CODE),
                    message: e.message,
                });
            }
        };

        {
            let mut discarded = Vec::new();
            {
                let mut state = self.state.lock();
                state
                    .pool_for(
                        &identity,
                        socket_timeout,
                        self.config.max_idle_time,
                        &mut discarded,
                    )
                    .record_creation(conn.as_ref());
            }
            self.metrics.lock().connections_created += 1;
            self.destroy_all(discarded);
        }

        tracing::debug!(endpoint = %identity, "created new connection");
        self.hand_out(conn, &[HookEvent::Create, HookEvent::HandedOut])
    }

    fn take_idle(&self, identity: &str, socket_timeout: Duration) -> Option<Box<dyn Connection>> {
        let mut discarded = Vec::new();
        let conn = {
            let mut state = self.state.lock();
            state
                .pool_for(
                    identity,
                    socket_timeout,
                    self.config.max_idle_time,
                    &mut discarded,
                )
                .acquire_idle(socket_timeout, &mut discarded)
        };
        self.destroy_all(discarded);
        conn
    }

    /// Run hook events in order; a veto destroys the connection.
    fn hand_out(
        &self,
        mut conn: Box<dyn Connection>,
        events: &[HookEvent],
    ) -> Result<Box<dyn Connection>> {
        for &event in events {
            if let Err(e) = self.hooks.dispatch(event, conn.as_mut()) {
                self.metrics.lock().checkouts_failed += 1;
                self.destroy(conn);
                return Err(e);
            }
        }
        self.metrics.lock().checkouts_successful += 1;
        Ok(conn)
    }

    /// Return a borrowed connection.
    ///
    /// `identity` may be the spec the connection was borrowed with or its
    /// canonical form; both resolve to the same pool. `onRelease` hooks run
    /// first; if one fails the connection is destroyed
    /// and the hook's error is returned. Otherwise the owning pool decides
    /// whether to keep or discard it.
    pub fn release(&self, identity: &str, mut conn: Box<dyn Connection>) -> Result<()> {
        let identity = canonical_identity(identity);
        if let Err(e) = self.hooks.dispatch(HookEvent::Release, conn.as_mut()) {
            self.destroy(conn);
            return Err(e);
        }

        tracing::trace!(endpoint = %identity, "returning connection to pool");
        let mut discarded = Vec::new();
        {
            let socket_timeout = conn.socket_timeout();
            let mut state = self.state.lock();
            state
                .pool_for(
                    &identity,
                    socket_timeout,
                    self.config.max_idle_time,
                    &mut discarded,
                )
                .release(conn, &mut discarded);
        }
        self.destroy_all(discarded);
        Ok(())
    }

    /// Whether `conn` is fit to be used against `identity` right now.
    ///
    /// Checks that a connection is present, that it has not failed, and that
    /// it was not created at or before the owning pool's bad-connection
    /// watermark. `identity` is canonicalized the same way as in
    /// [`release`](Self::release). An endpoint without a pool has no
    /// watermark, and no pool is created for it.
    pub fn is_connection_healthy(&self, identity: &str, conn: Option<&dyn Connection>) -> bool {
        let Some(conn) = conn else {
            return false;
        };
        if conn.is_failed() {
            return false;
        }

        let key = EndpointKey::new(canonical_identity(identity), conn.socket_timeout());
        let state = self.state.lock();
        !state
            .pools
            .get(&key)
            .is_some_and(|pool| pool.is_creation_time_bad(conn.creation_time()))
    }

    /// Report that the connection created at `created_at` for `identity`
    /// went bad, purging older idle connections to that endpoint.
    pub fn mark_bad_creation_time(
        &self,
        identity: &str,
        socket_timeout: Duration,
        created_at: crate::CreationTime,
    ) -> bool {
        let identity = canonical_identity(identity);
        let mut discarded = Vec::new();
        let moved = {
            let mut state = self.state.lock();
            state
                .pool_for(
                    &identity,
                    socket_timeout,
                    self.config.max_idle_time,
                    &mut discarded,
                )
                .mark_bad_creation_time(created_at, &mut discarded)
        };
        self.destroy_all(discarded);
        moved
    }

    /// Ping every idle connection, dropping those that fail.
    ///
    /// Probes run with the registry lock held; this is a maintenance call,
    /// not a hot path. Failed connections are closed after the lock is
    /// released.
    pub fn flush_all(&self) {
        let mut discarded = Vec::new();
        let (probed, failed) = {
            let mut state = self.state.lock();
            state
                .pools
                .values_mut()
                .map(|pool| pool.active_health_check(&mut discarded))
                .fold((0, 0), |(p, f), (dp, df)| (p + dp, f + df))
        };

        {
            let mut metrics = self.metrics.lock();
            metrics.health_checks_performed += probed as u64;
            metrics.health_checks_failed += failed as u64;
        }
        tracing::debug!(probed, failed, "health-checked pooled connections");
        self.destroy_all(discarded);
    }

    /// Close every idle connection in every pool.
    pub fn clear_all(&self) {
        let mut discarded = Vec::new();
        {
            let mut state = self.state.lock();
            tracing::debug!(name = %self.config.name, "removing connections on all pools");
            for pool in state.pools.values_mut() {
                pool.clear(&mut discarded);
            }
        }
        self.destroy_all(discarded);
    }

    /// Close idle connections of every pool whose identity names `identity`'s
    /// host, including replica-set qualified forms of it.
    ///
    /// `remove_host("h1")` clears the pools of `"h1"`, `"h1:27017"` and
    /// `"h1/rs0"`, but not `"h10"` or `"h2"`.
    pub fn remove_host(&self, identity: &str) {
        let identity = canonical_identity(identity);
        let mut discarded = Vec::new();
        {
            let mut state = self.state.lock();
            tracing::debug!(host = %identity, "removing connections from all pools for host");
            for (key, pool) in state.pools.iter_mut() {
                if same_host(&identity, &key.identity) {
                    pool.clear(&mut discarded);
                }
            }
        }
        self.destroy_all(discarded);
    }

    /// Drop idle connections that are no longer connected (or idle too long).
    ///
    /// Meant to be called periodically, see [`Sweeper`](crate::Sweeper).
    /// Returns how many connections were destroyed.
    pub fn sweep_task(&self) -> usize {
        let mut stale = Vec::new();
        {
            // Collect under the lock, close outside it.
            let mut state = self.state.lock();
            for pool in state.pools.values_mut() {
                pool.sweep_stale(&mut stale);
            }
        }

        let count = stale.len();
        self.metrics.lock().sweeps_performed += 1;
        if count > 0 {
            tracing::debug!(count, "sweeping stale pooled connections");
        }
        self.destroy_all(stale);
        count
    }

    /// Append a lifecycle hook. Hooks run in registration order.
    pub fn register_hook(&self, hook: Arc<dyn ConnectionHook>) {
        self.hooks.push(hook);
    }

    /// Number of registered hooks.
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Change the idle limit for every existing and future pool.
    ///
    /// Pools holding more idle connections than the new limit drop their
    /// oldest ones.
    pub fn set_max_pool_size(&self, max_pool_size: Option<usize>) {
        let mut discarded = Vec::new();
        {
            let mut state = self.state.lock();
            state.max_pool_size = max_pool_size;
            for pool in state.pools.values_mut() {
                pool.set_max_pool_size(max_pool_size, &mut discarded);
            }
        }
        self.destroy_all(discarded);
    }

    /// Current idle limit (`None` = unlimited).
    #[must_use]
    pub fn max_pool_size(&self) -> Option<usize> {
        self.state.lock().max_pool_size
    }

    /// Idle connections currently held for `identity` with `socket_timeout`.
    #[must_use]
    pub fn available(&self, identity: &str, socket_timeout: Duration) -> usize {
        self.state
            .lock()
            .pools
            .get(&EndpointKey::new(canonical_identity(identity), socket_timeout))
            .map_or(0, EndpointPool::available)
    }

    /// Summarize every pool without changing any of them.
    #[must_use]
    pub fn snapshot(&self) -> PoolReport {
        let mut report = PoolReport::default();
        {
            let state = self.state.lock();
            for (key, pool) in &state.pools {
                if pool.created() == 0 {
                    continue;
                }
                report.add_host(
                    key.to_string(),
                    HostReport {
                        available: pool.available(),
                        created: pool.created(),
                        connection_type: pool.connection_type(),
                    },
                );
            }
        }

        // Always report every tracked replica set.
        if let Some(monitor) = &self.replica_sets {
            report.add_replica_sets(monitor.as_ref());
        }
        report
    }

    /// Borrow a connection wrapped in a [`ScopedLease`].
    pub fn lease(&self, spec: &str, socket_timeout: Duration) -> Result<ScopedLease<'_>> {
        ScopedLease::new(self, spec, socket_timeout)
    }

    /// Leases currently borrowed and not yet resolved.
    #[must_use]
    pub fn outstanding_leases(&self) -> usize {
        self.outstanding_leases.load(Ordering::Acquire)
    }

    pub(crate) fn lease_opened(&self) {
        self.outstanding_leases.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn lease_closed(&self) {
        self.outstanding_leases.fetch_sub(1, Ordering::AcqRel);
    }

    /// Close a connection without pooling it.
    ///
    /// `onDestroy` hooks run first. Hook and close errors are logged and
    /// otherwise ignored; the connection is gone afterwards either way.
    pub fn destroy(&self, mut conn: Box<dyn Connection>) {
        let server = conn.server_address();
        if let Err(e) = self.hooks.dispatch(HookEvent::Destroy, conn.as_mut()) {
            tracing::debug!(server = %server, error = %e, "ignoring destroy hook failure");
        }
        if let Err(e) = conn.close() {
            tracing::debug!(server = %server, error = %e, "ignoring error closing connection");
        }
        self.metrics.lock().connections_closed += 1;
    }

    fn destroy_all(&self, conns: Vec<Box<dyn Connection>>) {
        for conn in conns {
            self.destroy(conn);
        }
    }

    /// Get registry metrics.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        let inner = self.metrics.lock();
        PoolMetrics {
            connections_created: inner.connections_created,
            connections_closed: inner.connections_closed,
            checkouts_successful: inner.checkouts_successful,
            checkouts_failed: inner.checkouts_failed,
            health_checks_performed: inner.health_checks_performed,
            health_checks_failed: inner.health_checks_failed,
            sweeps_performed: inner.sweeps_performed,
            uptime: self.created_at.elapsed(),
        }
    }

    /// Get the registry configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Registry name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

impl Drop for PoolRegistry {
    fn drop(&mut self) {
        let pools = std::mem::take(&mut self.state.get_mut().pools);
        let mut discarded = Vec::new();
        for mut pool in pools.into_values() {
            pool.clear(&mut discarded);
        }
        self.destroy_all(discarded);
    }
}

impl std::fmt::Debug for PoolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("name", &self.config.name)
            .field("max_pool_size", &self.max_pool_size())
            .field("hooks", &self.hooks)
            .field("outstanding_leases", &self.outstanding_leases())
            .finish_non_exhaustive()
    }
}

/// Builder for creating a [`PoolRegistry`].
///
/// # Example
///
/// ```rust,ignore
/// let registry = PoolRegistry::builder()
///     .max_pool_size(10)
///     .connector(connector)
///     .hook(Arc::new(AuthHook::default()))
///     .build()?;
/// ```
#[derive(Default)]
pub struct PoolRegistryBuilder {
    config: PoolConfig,
    connector: Option<Arc<dyn Connector>>,
    hooks: Vec<Arc<dyn ConnectionHook>>,
    replica_sets: Option<Arc<dyn ReplicaSetMonitor>>,
}

impl PoolRegistryBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pool configuration.
    #[must_use]
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the registry name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Limit idle connections per endpoint.
    #[must_use]
    pub fn max_pool_size(mut self, max: usize) -> Self {
        self.config.max_pool_size = Some(max);
        self
    }

    /// Drop connections idle for longer than `limit`.
    #[must_use]
    pub fn max_idle_time(mut self, limit: Duration) -> Self {
        self.config.max_idle_time = Some(limit);
        self
    }

    /// Set the connector used to dial new connections.
    #[must_use]
    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Set a shared connector.
    #[must_use]
    pub fn shared_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Register a hook.
    #[must_use]
    pub fn hook(mut self, hook: Arc<dyn ConnectionHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Set the replica-set monitor consulted by snapshots.
    #[must_use]
    pub fn replica_set_monitor(mut self, monitor: Arc<dyn ReplicaSetMonitor>) -> Self {
        self.replica_sets = Some(monitor);
        self
    }

    /// Build the registry.
    pub fn build(self) -> Result<PoolRegistry> {
        let connector = self
            .connector
            .ok_or_else(|| PoolError::Config("a connector is required".into()))?;

        let mut registry = PoolRegistry::new(self.config, connector)?;
        registry.replica_sets = self.replica_sets;
        for hook in self.hooks {
            registry.register_hook(hook);
        }
        Ok(registry)
    }
}

/// Metrics collected from the registry.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Total connections created since the registry started.
    pub connections_created: u64,
    /// Total connections closed since the registry started.
    pub connections_closed: u64,
    /// Successful connection checkouts.
    pub checkouts_successful: u64,
    /// Failed connection checkouts (connect errors, hook vetoes).
    pub checkouts_failed: u64,
    /// Idle connections probed by [`PoolRegistry::flush_all`].
    pub health_checks_performed: u64,
    /// Probes that failed.
    pub health_checks_failed: u64,
    /// Completed stale sweeps.
    pub sweeps_performed: u64,
    /// Time since registry creation.
    pub uptime: Duration,
}

impl PoolMetrics {
    /// Calculate checkout success rate (0.0 to 1.0).
    #[must_use]
    pub fn checkout_success_rate(&self) -> f64 {
        let total = self.checkouts_successful + self.checkouts_failed;
        if total == 0 {
            return 1.0;
        }
        self.checkouts_successful as f64 / total as f64
    }

    /// Calculate health check success rate (0.0 to 1.0).
    #[must_use]
    pub fn health_check_success_rate(&self) -> f64 {
        if self.health_checks_performed == 0 {
            return 1.0;
        }
        let successful = self.health_checks_performed - self.health_checks_failed;
        successful as f64 / self.health_checks_performed as f64
    }

    /// Connections created but not yet closed: idle plus borrowed.
    #[must_use]
    pub fn open_connections(&self) -> u64 {
        self.connections_created
            .saturating_sub(self.connections_closed)
    }
}
