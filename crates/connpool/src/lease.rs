//! Scoped connection leases.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use crate::connection::{Connection, CreationTime};
use crate::error::Result;
use crate::registry::PoolRegistry;

/// A borrowed connection that must be explicitly returned or discarded.
///
/// Call [`done`](Self::done) once the connection is back in a clean protocol
/// state, or [`kill`](Self::kill) when it is not. A lease dropped without
/// either is resolved conservatively:
///
/// - a failed connection with an unknown creation time is killed;
/// - any other failed connection is returned, so the pool can raise its
///   bad-connection watermark and dispose of it;
/// - a healthy connection is killed and a warning is logged, since its
///   protocol state is unknown.
///
/// # Example
///
/// ```rust,ignore
/// let mut lease = registry.lease("db1:27017", Duration::from_secs(30))?;
/// lease.ping()?;
/// lease.done()?;
/// ```
pub struct ScopedLease<'pool> {
    registry: &'pool PoolRegistry,
    host: String,
    socket_timeout: Duration,
    conn: Option<Box<dyn Connection>>,
}

impl<'pool> ScopedLease<'pool> {
    /// Borrow a connection to `spec` from `registry`.
    pub fn new(registry: &'pool PoolRegistry, spec: &str, socket_timeout: Duration) -> Result<Self> {
        let endpoint = crate::ConnectionString::parse(spec)?;
        let conn = registry.get_with(&endpoint, socket_timeout)?;
        registry.lease_opened();

        Ok(Self {
            registry,
            host: endpoint.identity(),
            socket_timeout,
            conn: Some(conn),
        })
    }

    /// Canonical identity of the leased endpoint.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Socket timeout the lease was requested with.
    #[must_use]
    pub fn socket_timeout(&self) -> Duration {
        self.socket_timeout
    }

    /// Return the connection to the pool.
    ///
    /// Fails only if an `onRelease` hook rejects the connection, in which
    /// case it has already been destroyed.
    pub fn done(mut self) -> Result<()> {
        self.resolve_done()
    }

    /// Destroy the connection without returning it to the pool.
    pub fn kill(mut self) {
        self.resolve_kill();
    }

    fn resolve_done(&mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => {
                self.registry.lease_closed();
                self.registry.release(&self.host, conn)
            }
            None => Ok(()),
        }
    }

    fn resolve_kill(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.registry.lease_closed();
            self.registry.destroy(conn);
        }
    }
}

impl Deref for ScopedLease<'_> {
    type Target = dyn Connection;

    #[allow(clippy::expect_used)]
    fn deref(&self) -> &Self::Target {
        // `done` and `kill` consume the lease, so the connection is present
        // for as long as the lease can be reached.
        self.conn
            .as_deref()
            .expect("lease connection is present until resolved")
    }
}

impl DerefMut for ScopedLease<'_> {
    #[allow(clippy::expect_used)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn
            .as_deref_mut()
            .expect("lease connection is present until resolved")
    }
}

impl Drop for ScopedLease<'_> {
    fn drop(&mut self) {
        let Some(conn) = self.conn.as_deref() else {
            return;
        };

        if conn.is_failed() {
            if conn.creation_time() == CreationTime::Unknown {
                self.resolve_kill();
            } else if let Err(e) = self.resolve_done() {
                tracing::debug!(host = %self.host, error = %e, "failed connection rejected on release");
            }
        } else {
            tracing::warn!(
                server = %conn.server_address(),
                "scoped connection not being returned to the pool"
            );
            self.resolve_kill();
        }
    }
}

impl std::fmt::Debug for ScopedLease<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedLease")
            .field("host", &self.host)
            .field("socket_timeout", &self.socket_timeout)
            .field("active", &self.conn.is_some())
            .finish()
    }
}
