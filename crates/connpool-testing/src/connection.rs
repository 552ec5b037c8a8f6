//! Mock connections and connector.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use connpool::{
    ConnectError, Connection, ConnectionError, ConnectionString, ConnectionType, Connector,
    CreationTime,
};
use parking_lot::Mutex;

/// Shared state behind one [`MockConnection`].
#[derive(Debug)]
struct MockState {
    id: u64,
    address: String,
    created: CreationTime,
    socket_timeout: Duration,
    kind: ConnectionType,
    failed: AtomicBool,
    connected: AtomicBool,
    ping_fails: AtomicBool,
    close_fails: AtomicBool,
    pings: AtomicUsize,
    closes: AtomicUsize,
}

/// Test-side view of a connection that may currently be owned by the pool.
#[derive(Debug, Clone)]
pub struct MockHandle(Arc<MockState>);

impl MockHandle {
    /// Unique id assigned by the connector, starting at 1.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Creation time reported by the connection.
    #[must_use]
    pub fn creation_time(&self) -> CreationTime {
        self.0.created
    }

    /// Make the connection report itself failed.
    pub fn set_failed(&self, failed: bool) {
        self.0.failed.store(failed, Ordering::SeqCst);
    }

    /// Make the connection's local liveness check fail or pass.
    pub fn set_connected(&self, connected: bool) {
        self.0.connected.store(connected, Ordering::SeqCst);
    }

    /// Make every subsequent ping fail.
    pub fn fail_pings(&self) {
        self.0.ping_fails.store(true, Ordering::SeqCst);
    }

    /// Make `close` report an error.
    pub fn fail_close(&self) {
        self.0.close_fails.store(true, Ordering::SeqCst);
    }

    /// How many times the connection was closed.
    #[must_use]
    pub fn closes(&self) -> usize {
        self.0.closes.load(Ordering::SeqCst)
    }

    /// Whether the connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closes() > 0
    }

    /// How many pings the connection answered or failed.
    #[must_use]
    pub fn pings(&self) -> usize {
        self.0.pings.load(Ordering::SeqCst)
    }
}

/// In-memory [`Connection`] controlled through a [`MockHandle`].
#[derive(Debug)]
pub struct MockConnection(Arc<MockState>);

impl MockConnection {
    /// Id of this connection.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }
}

/// Recover the mock id from a pooled connection.
///
/// Mock connections report their address as `"<host>#<id>"`.
#[must_use]
pub fn mock_id(conn: &dyn Connection) -> Option<u64> {
    conn.server_address()
        .rsplit_once('#')
        .and_then(|(_, id)| id.parse().ok())
}

impl Connection for MockConnection {
    fn is_failed(&self) -> bool {
        self.0.failed.load(Ordering::SeqCst)
    }

    fn is_still_connected(&self) -> bool {
        self.0.connected.load(Ordering::SeqCst)
    }

    fn creation_time(&self) -> CreationTime {
        self.0.created
    }

    fn socket_timeout(&self) -> Duration {
        self.0.socket_timeout
    }

    fn connection_type(&self) -> ConnectionType {
        self.0.kind
    }

    fn server_address(&self) -> String {
        format!("{}#{}", self.0.address, self.0.id)
    }

    fn ping(&mut self) -> Result<(), ConnectionError> {
        self.0.pings.fetch_add(1, Ordering::SeqCst);
        if self.0.ping_fails.load(Ordering::SeqCst) {
            return Err(ConnectionError::Probe("no reply".into()));
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), ConnectionError> {
        self.0.closes.fetch_add(1, Ordering::SeqCst);
        if self.0.close_fails.load(Ordering::SeqCst) {
            return Err(ConnectionError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "socket already torn down",
            )));
        }
        Ok(())
    }
}

/// [`Connector`] that fabricates [`MockConnection`]s.
///
/// Creation times start at 1000 microseconds and increase by one for every
/// connection, so later connections always compare as newer.
#[derive(Debug)]
pub struct MockConnector {
    next_id: AtomicU64,
    next_micros: AtomicU64,
    unknown_creation_time: AtomicBool,
    failure: Mutex<Option<ConnectError>>,
    handles: Mutex<Vec<MockHandle>>,
    connects: AtomicUsize,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            next_micros: AtomicU64::new(1_000),
            unknown_creation_time: AtomicBool::new(false),
            failure: Mutex::new(None),
            handles: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
        }
    }
}

impl MockConnector {
    /// Create a connector behind an `Arc`, ready to share with a registry.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail every connect attempt with `error` until cleared.
    pub fn fail_with(&self, error: Option<ConnectError>) {
        *self.failure.lock() = error;
    }

    /// Report [`CreationTime::Unknown`] for connections created from now on.
    pub fn set_unknown_creation_time(&self, unknown: bool) {
        self.unknown_creation_time.store(unknown, Ordering::SeqCst);
    }

    /// Successful and failed connect attempts so far.
    #[must_use]
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Handles to every connection created, in creation order.
    #[must_use]
    pub fn handles(&self) -> Vec<MockHandle> {
        self.handles.lock().clone()
    }

    /// Handle to the connection with the given id.
    #[must_use]
    pub fn handle(&self, id: u64) -> Option<MockHandle> {
        self.handles.lock().iter().find(|h| h.id() == id).cloned()
    }

    /// Connections that are neither closed nor failed to close.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.handles.lock().iter().filter(|h| !h.is_closed()).count()
    }
}

impl Connector for MockConnector {
    fn connect(
        &self,
        endpoint: &ConnectionString,
        socket_timeout: Duration,
    ) -> Result<Box<dyn Connection>, ConnectError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let micros = self.next_micros.fetch_add(1, Ordering::SeqCst);
        let created = if self.unknown_creation_time.load(Ordering::SeqCst) {
            CreationTime::Unknown
        } else {
            CreationTime::Micros(micros)
        };
        let address = endpoint
            .servers()
            .first()
            .map(ToString::to_string)
            .unwrap_or_default();

        let state = Arc::new(MockState {
            id,
            address,
            created,
            socket_timeout,
            kind: endpoint.connection_type(),
            failed: AtomicBool::new(false),
            connected: AtomicBool::new(true),
            ping_fails: AtomicBool::new(false),
            close_fails: AtomicBool::new(false),
            pings: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        });
        tracing::trace!(id, endpoint = %endpoint, "mock connection created");

        self.handles.lock().push(MockHandle(Arc::clone(&state)));
        Ok(Box::new(MockConnection(state)))
    }
}
