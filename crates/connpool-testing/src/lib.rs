//! # connpool-testing
//!
//! Test infrastructure for the connpool crate.
//!
//! Provides in-memory stand-ins for every collaborator the pool consumes,
//! so registry behavior can be exercised without a server:
//!
//! - [`MockConnector`] dials [`MockConnection`]s with unique, increasing
//!   creation times and keeps a [`MockHandle`] to each one
//! - [`MockHandle`] flips a connection's failure/liveness state after it has
//!   been moved into the pool, and counts closes and pings
//! - [`RecordingHook`] records every lifecycle event and can veto one
//! - [`StaticReplicaSetMonitor`] serves fixed replica-set status blocks

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod connection;
pub mod hook;
pub mod monitor;

use std::sync::Arc;

use connpool::{PoolConfig, PoolRegistry, Result};

pub use connection::{MockConnection, MockConnector, MockHandle, mock_id};
pub use hook::RecordingHook;
pub use monitor::StaticReplicaSetMonitor;

/// Build a registry backed by `connector`.
pub fn registry_with(connector: &Arc<MockConnector>, config: PoolConfig) -> Result<PoolRegistry> {
    PoolRegistry::builder()
        .config(config)
        .shared_connector(Arc::clone(connector) as Arc<dyn connpool::Connector>)
        .build()
}
