//! # connpool
//!
//! Client-side connection pool for database drivers talking to one or more
//! server endpoints.
//!
//! Idle, already-authenticated connections are cached per endpoint and
//! socket timeout and handed out again instead of dialing a new connection
//! for every operation.
//!
//! ## Features
//!
//! - LIFO reuse per `(endpoint, socket timeout)` with an optional idle limit
//! - Bulk invalidation: one failed connection marks every connection created
//!   at or before it as suspect and purges them
//! - Lifecycle hooks (`onCreate`, `onHandedOut`, `onRelease`, `onDestroy`)
//! - Scoped leases that are returned or destroyed when they go out of scope
//! - Stale sweeps and active health checks, optionally scheduled on tokio
//! - Serializable snapshots with replica-set status
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use connpool::{PoolConfig, PoolRegistry, Sweeper};
//!
//! let config = PoolConfig::new()
//!     .max_pool_size(20)
//!     .sweep_interval(Duration::from_secs(30));
//!
//! let registry = Arc::new(
//!     PoolRegistry::builder()
//!         .config(config.clone())
//!         .connector(my_connector)
//!         .build()?,
//! );
//! let _maintenance = Sweeper::spawn(Arc::clone(&registry), &config)?;
//!
//! let mut lease = registry.lease("rs0/db1:27017,db2:27017", Duration::from_secs(30))?;
//! lease.ping()?;
//! lease.done()?;
//!
//! println!("{}", registry.snapshot().to_json());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod hook;
pub mod host_pool;
pub mod key;
pub mod lease;
pub mod registry;
pub mod report;
#[cfg(feature = "sweeper")]
pub mod sweeper;

// Configuration
pub use config::PoolConfig;

// Error types
pub use error::{ConnectError, ConnectionError, HookError, HookEvent, PoolError, Result};

// Collaborator interfaces
pub use connection::{Connection, ConnectionType, CreationTime};
pub use endpoint::{ConnectionString, Connector, HostAndPort};
pub use hook::ConnectionHook;
pub use report::{HostReport, PoolReport, ReplicaSetMonitor};

// Pool types
pub use host_pool::EndpointPool;
pub use key::{EndpointKey, compare_hosts, same_host};
pub use lease::ScopedLease;
pub use registry::{PoolMetrics, PoolRegistry, PoolRegistryBuilder};

#[cfg(feature = "sweeper")]
pub use sweeper::{Sweeper, SweeperHandle};
