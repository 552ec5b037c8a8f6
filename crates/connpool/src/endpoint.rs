//! Endpoint specifications and the connector that dials them.

use std::fmt;
use std::time::Duration;

use crate::connection::{Connection, ConnectionType};
use crate::error::{ConnectError, PoolError, Result};

/// Default server port when a host omits one.
pub const DEFAULT_PORT: u16 = 27017;

/// A `host:port` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostAndPort {
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl HostAndPort {
    fn parse(spec: &str, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PoolError::invalid_endpoint(spec, "empty host"));
        }

        match raw.rsplit_once(':') {
            Some((host, port)) => {
                if host.is_empty() {
                    return Err(PoolError::invalid_endpoint(spec, "empty host"));
                }
                let port = port.parse::<u16>().map_err(|_| {
                    PoolError::invalid_endpoint(spec, format!("invalid port: {port}"))
                })?;
                if port == 0 {
                    return Err(PoolError::invalid_endpoint(spec, "invalid port: 0"));
                }
                Ok(Self {
                    host: host.to_string(),
                    port,
                })
            }
            None => Ok(Self {
                host: raw.to_string(),
                port: DEFAULT_PORT,
            }),
        }
    }
}

impl fmt::Display for HostAndPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A parsed endpoint specification.
///
/// Two forms are accepted:
///
/// ```text
/// host[:port]                       single server
/// setName/host1[:port],host2[:port] replica set
/// ```
///
/// The [`Display`](fmt::Display) form is the canonical identity the registry
/// keys its pools by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    kind: ConnectionType,
    set_name: Option<String>,
    servers: Vec<HostAndPort>,
}

impl ConnectionString {
    /// Parse an endpoint specification.
    pub fn parse(spec: &str) -> Result<Self> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(PoolError::invalid_endpoint(spec, "empty specification"));
        }

        if let Some((set_name, hosts)) = trimmed.split_once('/') {
            let set_name = set_name.trim();
            if set_name.is_empty() {
                return Err(PoolError::invalid_endpoint(spec, "empty replica set name"));
            }
            let servers = hosts
                .split(',')
                .map(|h| HostAndPort::parse(spec, h))
                .collect::<Result<Vec<_>>>()?;

            return Ok(Self {
                kind: ConnectionType::Set,
                set_name: Some(set_name.to_string()),
                servers,
            });
        }

        if trimmed.contains(',') {
            return Err(PoolError::invalid_endpoint(
                spec,
                "multiple hosts require a replica set name",
            ));
        }

        Ok(Self {
            kind: ConnectionType::Master,
            set_name: None,
            servers: vec![HostAndPort::parse(spec, trimmed)?],
        })
    }

    /// Single-server specification.
    #[must_use]
    pub fn single(server: HostAndPort) -> Self {
        Self {
            kind: ConnectionType::Master,
            set_name: None,
            servers: vec![server],
        }
    }

    /// Kind of endpoint described.
    #[must_use]
    pub fn connection_type(&self) -> ConnectionType {
        self.kind
    }

    /// Replica set name, for set specifications.
    #[must_use]
    pub fn set_name(&self) -> Option<&str> {
        self.set_name.as_deref()
    }

    /// Servers named by the specification, in the order given.
    #[must_use]
    pub fn servers(&self) -> &[HostAndPort] {
        &self.servers
    }

    /// Canonical identity used as the registry key.
    ///
    /// Servers on [`DEFAULT_PORT`] are written without a port.
    #[must_use]
    pub fn identity(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.set_name {
            write!(f, "{name}/")?;
        }
        for (i, server) in self.servers.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            // The default port is implied, so "h1" and "h1:27017" share a key.
            if server.port == DEFAULT_PORT {
                f.write_str(&server.host)?;
            } else {
                write!(f, "{server}")?;
            }
        }
        Ok(())
    }
}

/// Canonical identity for a caller-supplied endpoint string.
///
/// Strings that parse map to [`ConnectionString::identity`]; anything else
/// is used verbatim, so an identity that is already canonical round-trips.
#[must_use]
pub fn canonical_identity(raw: &str) -> String {
    ConnectionString::parse(raw).map_or_else(|_| raw.to_string(), |cs| cs.identity())
}

/// Dials new connections on behalf of the registry.
///
/// Connect calls happen outside the registry lock and may block for as long
/// as the transport allows; the pool imposes no deadline of its own.
pub trait Connector: Send + Sync {
    /// Establish and authenticate a new connection.
    fn connect(
        &self,
        endpoint: &ConnectionString,
        socket_timeout: Duration,
    ) -> std::result::Result<Box<dyn Connection>, ConnectError>;
}

impl<F> Connector for F
where
    F: Fn(&ConnectionString, Duration) -> std::result::Result<Box<dyn Connection>, ConnectError>
        + Send
        + Sync,
{
    fn connect(
        &self,
        endpoint: &ConnectionString,
        socket_timeout: Duration,
    ) -> std::result::Result<Box<dyn Connection>, ConnectError> {
        self(endpoint, socket_timeout)
    }
}
