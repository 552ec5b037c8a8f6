//! Per-endpoint idle connection cache.
//!
//! Every method here assumes the caller holds the registry lock. Nothing in
//! this module closes a connection: connections that must go are moved into
//! the caller-supplied `discarded` list so they can be destroyed after the
//! lock is released.

use std::time::{Duration, Instant};

use crate::connection::{Connection, ConnectionType, CreationTime};

/// An idle connection together with the moment it was pooled.
pub(crate) struct StoredConnection {
    conn: Box<dyn Connection>,
    stored_at: Instant,
}

impl StoredConnection {
    fn new(conn: Box<dyn Connection>) -> Self {
        Self {
            conn,
            stored_at: Instant::now(),
        }
    }

    /// How long the connection has been sitting idle.
    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    /// Whether the connection may stay pooled.
    ///
    /// Always requires the socket to be connected; additionally enforces the
    /// idle limit when one is configured.
    fn is_ok(&self, now: Instant, max_idle_time: Option<Duration>) -> bool {
        if !self.conn.is_still_connected() {
            return false;
        }
        match max_idle_time {
            Some(limit) => self.idle_for(now) <= limit,
            None => true,
        }
    }
}

impl std::fmt::Debug for StoredConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredConnection")
            .field("conn", &self.conn)
            .field("stored_at", &self.stored_at)
            .finish()
    }
}

/// Idle connections for one `(identity, socket timeout)` pair, plus the
/// bookkeeping used to invalidate them in bulk.
#[derive(Debug, Default)]
pub struct EndpointPool {
    /// LIFO stack; the last element is the most recently returned.
    idle: Vec<StoredConnection>,
    /// `None` means unlimited.
    max_pool_size: Option<usize>,
    max_idle_time: Option<Duration>,
    /// Connections created at or before this time are suspect.
    min_valid_creation_micros: Option<u64>,
    created: u64,
    connection_type: Option<ConnectionType>,
    host_name: String,
}

impl EndpointPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display name. Only the first non-empty name sticks.
    pub fn initialize_host_name(&mut self, host_name: &str) {
        if self.host_name.is_empty() {
            self.host_name = host_name.to_string();
        }
    }

    /// Display name of the endpoint.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Number of idle connections.
    #[must_use]
    pub fn available(&self) -> usize {
        self.idle.len()
    }

    /// Connections ever created for this pool.
    #[must_use]
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Type of the first connection created for this pool.
    #[must_use]
    pub fn connection_type(&self) -> Option<ConnectionType> {
        self.connection_type
    }

    /// Current idle limit (`None` = unlimited).
    #[must_use]
    pub fn max_pool_size(&self) -> Option<usize> {
        self.max_pool_size
    }

    /// Current watermark.
    #[must_use]
    pub fn min_valid_creation_time(&self) -> CreationTime {
        self.min_valid_creation_micros
            .map_or(CreationTime::Unknown, CreationTime::Micros)
    }

    /// Change the idle limit, trimming the oldest idle connections above it.
    pub fn set_max_pool_size(
        &mut self,
        max_pool_size: Option<usize>,
        discarded: &mut Vec<Box<dyn Connection>>,
    ) {
        self.max_pool_size = max_pool_size;
        if let Some(max) = max_pool_size {
            if self.idle.len() > max {
                let excess = self.idle.len() - max;
                discarded.extend(self.idle.drain(..excess).map(|sc| sc.conn));
            }
        }
    }

    /// Set the idle time limit enforced by [`sweep_stale`](Self::sweep_stale)
    /// and [`acquire_idle`](Self::acquire_idle).
    pub fn set_max_idle_time(&mut self, max_idle_time: Option<Duration>) {
        self.max_idle_time = max_idle_time;
    }

    /// Pop the most recently returned usable connection.
    ///
    /// Entries that are disconnected, idle too long, or created before the
    /// watermark are moved to `discarded` on the way.
    pub fn acquire_idle(
        &mut self,
        socket_timeout: Duration,
        discarded: &mut Vec<Box<dyn Connection>>,
    ) -> Option<Box<dyn Connection>> {
        let now = Instant::now();
        while let Some(sc) = self.idle.pop() {
            if !sc.is_ok(now, self.max_idle_time)
                || self.is_creation_time_bad(sc.conn.creation_time())
            {
                discarded.push(sc.conn);
                continue;
            }

            debug_assert_eq!(
                sc.conn.socket_timeout(),
                socket_timeout,
                "pooled connection keyed under the wrong socket timeout"
            );
            return Some(sc.conn);
        }
        None
    }

    /// Take back a connection from a caller.
    ///
    /// The connection is discarded instead of pooled when it reports itself
    /// failed, when it was created at or before the watermark, or when the
    /// idle stack is already full. A failed connection also raises the
    /// watermark to its own creation time.
    pub fn release(
        &mut self,
        conn: Box<dyn Connection>,
        discarded: &mut Vec<Box<dyn Connection>>,
    ) {
        let failed = conn.is_failed();
        let created_at = conn.creation_time();

        if failed {
            self.mark_bad_creation_time(created_at, discarded);
        }

        let full = self
            .max_pool_size
            .is_some_and(|max| self.idle.len() >= max);

        if failed || self.is_creation_time_bad(created_at) || full {
            discarded.push(conn);
        } else {
            self.idle.push(StoredConnection::new(conn));
        }
    }

    /// Record that a connection created at `created_at` turned out bad.
    ///
    /// If this moves the watermark forward every idle connection is
    /// discarded. Returns whether the watermark moved.
    pub fn mark_bad_creation_time(
        &mut self,
        created_at: CreationTime,
        discarded: &mut Vec<Box<dyn Connection>>,
    ) -> bool {
        let Some(micros) = created_at.as_micros() else {
            return false;
        };
        if self.min_valid_creation_micros.is_some_and(|w| micros <= w) {
            return false;
        }

        self.min_valid_creation_micros = Some(micros);
        tracing::info!(
            endpoint = %self.host_name,
            created_at = micros,
            idle = self.idle.len(),
            "detected bad connection, clearing pool"
        );
        self.clear(discarded);
        true
    }

    /// Whether a connection created at `created_at` predates the watermark.
    #[must_use]
    pub fn is_creation_time_bad(&self, created_at: CreationTime) -> bool {
        match (created_at.as_micros(), self.min_valid_creation_micros) {
            (Some(micros), Some(watermark)) => micros <= watermark,
            _ => false,
        }
    }

    /// Move every idle connection that fails the local liveness check into
    /// `stale`, keeping the rest in their original order.
    pub fn sweep_stale(&mut self, stale: &mut Vec<Box<dyn Connection>>) {
        let now = Instant::now();
        let max_idle_time = self.max_idle_time;
        let (alive, dead): (Vec<_>, Vec<_>) = self
            .idle
            .drain(..)
            .partition(|sc| sc.is_ok(now, max_idle_time));

        stale.extend(dead.into_iter().map(|sc| sc.conn));
        self.idle = alive;
    }

    /// Probe every idle connection with a round trip, keeping only those
    /// that answer. Returns `(probed, failed)`.
    pub fn active_health_check(
        &mut self,
        discarded: &mut Vec<Box<dyn Connection>>,
    ) -> (usize, usize) {
        let probed = self.idle.len();
        let mut alive = Vec::with_capacity(probed);

        for mut sc in self.idle.drain(..) {
            match sc.conn.ping() {
                Ok(()) => alive.push(sc),
                Err(e) => {
                    tracing::debug!(
                        server = %sc.conn.server_address(),
                        error = %e,
                        "pooled connection failed health check"
                    );
                    discarded.push(sc.conn);
                }
            }
        }

        let failed = probed - alive.len();
        self.idle = alive;
        (probed, failed)
    }

    /// Count a newly created connection and remember the first one's type.
    pub fn record_creation(&mut self, conn: &dyn Connection) {
        if self.created == 0 {
            self.connection_type = Some(conn.connection_type());
        }
        self.created += 1;
    }

    /// Discard every idle connection.
    pub fn clear(&mut self, discarded: &mut Vec<Box<dyn Connection>>) {
        discarded.extend(self.idle.drain(..).map(|sc| sc.conn));
    }
}
