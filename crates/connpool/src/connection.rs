//! Connection capability surface consumed by the pool.
//!
//! The pool never speaks the wire protocol itself. Everything it needs from
//! a live connection is expressed by the [`Connection`] trait, regardless of
//! the concrete transport behind it.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::ConnectionError;

/// When a connection's socket was created.
///
/// Connections that cannot report a creation time use
/// [`CreationTime::Unknown`]; such connections never compare as "created
/// before" any watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreationTime {
    /// Creation time was not recorded.
    Unknown,
    /// Microseconds since the Unix epoch.
    Micros(u64),
}

impl CreationTime {
    /// The current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self::Micros(micros)
    }

    /// Microseconds since the epoch, or `None` for [`CreationTime::Unknown`].
    #[must_use]
    pub fn as_micros(self) -> Option<u64> {
        match self {
            Self::Unknown => None,
            Self::Micros(us) => Some(us),
        }
    }

    /// Whether a creation time was recorded.
    #[must_use]
    pub fn is_known(self) -> bool {
        matches!(self, Self::Micros(_))
    }
}

impl fmt::Display for CreationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Micros(us) => write!(f, "{us}us"),
        }
    }
}

/// Kind of endpoint a connection talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// A single server.
    Master,
    /// A replica set addressed through its members.
    Set,
    /// A connector-defined transport.
    Custom,
}

impl ConnectionType {
    /// Stable lowercase name used in reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Set => "set",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single logical connection to one endpoint.
///
/// Exactly one owner holds a connection at any time: an idle stack inside
/// the pool, a caller's lease, or the destroy path. Ownership moves as a
/// `Box<dyn Connection>`.
pub trait Connection: Send {
    /// Whether the connection has observed a failure and must not be reused.
    fn is_failed(&self) -> bool;

    /// Cheap, local check that the socket is still open.
    fn is_still_connected(&self) -> bool;

    /// When the underlying socket was created.
    fn creation_time(&self) -> CreationTime;

    /// Socket timeout this connection was configured with.
    fn socket_timeout(&self) -> Duration;

    /// Kind of endpoint this connection talks to.
    fn connection_type(&self) -> ConnectionType;

    /// Address of the server this connection is attached to.
    fn server_address(&self) -> String;

    /// Lightweight round trip to the server.
    fn ping(&mut self) -> Result<(), ConnectionError>;

    /// Close the connection.
    ///
    /// Errors are informational; the connection is gone either way.
    fn close(self: Box<Self>) -> Result<(), ConnectionError>;
}

impl fmt::Debug for dyn Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("server_address", &self.server_address())
            .field("type", &self.connection_type())
            .field("created", &self.creation_time())
            .field("failed", &self.is_failed())
            .finish()
    }
}
