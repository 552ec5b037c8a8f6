//! Pool error types.

use std::fmt;

use thiserror::Error;

/// Code reported for an endpoint specification that does not parse.
pub const INVALID_ENDPOINT_CODE: i32 = 13071;

/// Code reported when a connector fails without supplying its own code.
pub const CONNECT_FAILED_CODE: i32 = 11002;

/// Result alias used throughout the pool.
pub type Result<T, E = PoolError> = std::result::Result<T, E>;

/// Errors surfaced across the pool's public boundary.
///
/// Only caller-actionable failures appear here. Stale or broken pooled
/// connections are handled internally and never produce an error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// The endpoint specification could not be parsed.
    #[error("invalid hostname [{spec}]: {reason}")]
    InvalidEndpoint {
        /// The raw specification as supplied by the caller.
        spec: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Establishing a new connection failed.
    #[error("{pool}: connect failed {endpoint} ({code}): {message}")]
    Connect {
        /// Name of the registry that attempted the connect.
        pool: String,
        /// Canonical endpoint identity.
        endpoint: String,
        /// Driver-defined error code.
        code: i32,
        /// Connector-supplied message.
        message: String,
    },

    /// A registered hook rejected the connection.
    #[error("{event} hook failed: {source}")]
    Hook {
        /// The lifecycle event being dispatched.
        event: HookEvent,
        /// The hook's error.
        #[source]
        source: HookError,
    },

    /// Invalid pool configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PoolError {
    /// Driver-defined numeric code, when the error carries one.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::InvalidEndpoint { .. } => Some(INVALID_ENDPOINT_CODE),
            Self::Connect { code, .. } => Some(*code),
            Self::Hook { .. } | Self::Config(_) => None,
        }
    }

    /// Whether this error reports a failed network connect.
    #[must_use]
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }

    pub(crate) fn invalid_endpoint(spec: &str, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }
}

/// Error raised by a [`Connector`](crate::Connector) that could not reach
/// or authenticate against an endpoint.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConnectError {
    /// Human-readable failure description.
    pub message: String,
    /// Optional transport- or server-supplied code.
    pub code: Option<i32>,
}

impl ConnectError {
    /// Create a connect error without a code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Attach a code.
    #[must_use]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }
}

/// Error returned by an individual connection's probe or close.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectionError {
    /// IO error on the underlying socket.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was already closed.
    #[error("connection closed")]
    Closed,

    /// The liveness probe got an unexpected reply.
    #[error("probe failed: {0}")]
    Probe(String),
}

/// Error raised by a [`ConnectionHook`](crate::ConnectionHook).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HookError(Box<dyn std::error::Error + Send + Sync>);

impl HookError {
    /// Wrap any error.
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }

    /// Create a hook error from a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self(message.to_string().into())
    }
}

/// Lifecycle events dispatched to hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// A new connection was established.
    Create,
    /// A connection is about to be handed to a caller.
    HandedOut,
    /// A caller is returning a connection.
    Release,
    /// A connection is about to be closed.
    Destroy,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "onCreate",
            Self::HandedOut => "onHandedOut",
            Self::Release => "onRelease",
            Self::Destroy => "onDestroy",
        })
    }
}
