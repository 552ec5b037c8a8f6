//! Pool configuration.

use std::time::Duration;

use crate::error::PoolError;

/// Configuration shared by every endpoint pool of a registry.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Registry name, used in logs and connect-failure messages.
    pub name: String,

    /// Maximum idle connections kept per endpoint (`None` = unlimited).
    pub max_pool_size: Option<usize>,

    /// Maximum time a connection may sit idle before the sweep drops it.
    ///
    /// `None` keeps connections for as long as they stay connected.
    pub max_idle_time: Option<Duration>,

    /// How often the maintenance runner sweeps for dead idle connections.
    pub sweep_interval: Duration,

    /// How often the maintenance runner pings every idle connection
    /// (`None` = never).
    pub health_check_interval: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "connpool".to_string(),
            max_pool_size: None,
            max_idle_time: None,
            sweep_interval: Duration::from_secs(60),
            health_check_interval: None,
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the registry name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Limit idle connections per endpoint.
    #[must_use]
    pub fn max_pool_size(mut self, max: usize) -> Self {
        self.max_pool_size = Some(max);
        self
    }

    /// Remove the idle connection limit.
    #[must_use]
    pub fn unlimited_pool_size(mut self) -> Self {
        self.max_pool_size = None;
        self
    }

    /// Drop connections idle for longer than `limit`.
    #[must_use]
    pub fn max_idle_time(mut self, limit: Duration) -> Self {
        self.max_idle_time = Some(limit);
        self
    }

    /// Set the sweep interval.
    #[must_use]
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Enable periodic active health checks.
    #[must_use]
    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = Some(interval);
        self
    }

    /// Check the configuration for values the pool cannot honor.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.name.trim().is_empty() {
            return Err(PoolError::Config("name must not be empty".into()));
        }
        if self.sweep_interval.is_zero() {
            return Err(PoolError::Config(
                "sweep_interval must be greater than zero".into(),
            ));
        }
        if self.health_check_interval.is_some_and(|i| i.is_zero()) {
            return Err(PoolError::Config(
                "health_check_interval must be greater than zero".into(),
            ));
        }
        if self.max_idle_time.is_some_and(|t| t.is_zero()) {
            return Err(PoolError::Config(
                "max_idle_time must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
