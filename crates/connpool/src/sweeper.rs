//! Periodic pool maintenance on a tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::config::PoolConfig;
use crate::error::Result;
use crate::registry::PoolRegistry;

/// Runs [`PoolRegistry::sweep_task`] (and optionally
/// [`PoolRegistry::flush_all`]) on a fixed schedule.
///
/// Both calls may block on connection teardown, so they run on tokio's
/// blocking pool rather than on the async worker threads.
#[derive(Debug)]
pub struct Sweeper;

impl Sweeper {
    /// Start maintenance for `registry` using the intervals in `config`.
    ///
    /// Fails with [`PoolError::Config`](crate::PoolError::Config) when
    /// `config` does not validate, e.g. for a zero interval. Must be called
    /// from within a tokio runtime.
    pub fn spawn(registry: Arc<PoolRegistry>, config: &PoolConfig) -> Result<SweeperHandle> {
        config.validate()?;
        let sweep_every = config.sweep_interval;
        let check_every = config.health_check_interval;

        tracing::info!(
            name = %registry.name(),
            sweep_interval = ?sweep_every,
            health_check_interval = ?check_every,
            "pool maintenance started"
        );

        let task = tokio::spawn(async move {
            let mut sweep = interval(sweep_every);
            sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately; skip it so the pool gets a
            // full interval before the first pass.
            sweep.tick().await;

            let mut check = check_every.map(|every| {
                let mut ticker = interval(every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            });
            if let Some(ticker) = check.as_mut() {
                ticker.tick().await;
            }

            loop {
                let run_check = match check.as_mut() {
                    Some(ticker) => tokio::select! {
                        _ = sweep.tick() => false,
                        _ = ticker.tick() => true,
                    },
                    None => {
                        sweep.tick().await;
                        false
                    }
                };

                let registry = Arc::clone(&registry);
                let result = tokio::task::spawn_blocking(move || {
                    if run_check {
                        registry.flush_all();
                    } else {
                        registry.sweep_task();
                    }
                })
                .await;

                if let Err(e) = result {
                    tracing::warn!(error = %e, "pool maintenance pass panicked");
                }
            }
        });

        Ok(SweeperHandle { task: Some(task) })
    }

    /// Start maintenance with only a sweep interval.
    pub fn spawn_with_interval(
        registry: Arc<PoolRegistry>,
        every: Duration,
    ) -> Result<SweeperHandle> {
        let config = PoolConfig {
            sweep_interval: every,
            health_check_interval: None,
            ..registry.config().clone()
        };
        Self::spawn(registry, &config)
    }
}

/// Handle to a running [`Sweeper`]. Dropping it stops the maintenance task.
#[derive(Debug)]
pub struct SweeperHandle {
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stop the maintenance task and wait for it to wind down.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // An aborted task reports a cancellation error; nothing to act on.
            let _ = task.await;
            tracing::info!("pool maintenance stopped");
        }
    }

    /// Whether the maintenance task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
