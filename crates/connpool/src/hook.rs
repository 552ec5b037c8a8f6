//! Connection lifecycle hooks.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::connection::Connection;
use crate::error::{HookError, HookEvent, PoolError};

/// Observer notified of connection lifecycle events.
///
/// Every method has a no-op default, so a hook only implements the events it
/// cares about. Hooks run outside the registry lock and may borrow from the
/// registry themselves.
pub trait ConnectionHook: Send + Sync {
    /// A new connection was established.
    fn on_create(&self, _conn: &mut dyn Connection) -> Result<(), HookError> {
        Ok(())
    }

    /// A connection is about to be handed to a caller.
    fn on_handed_out(&self, _conn: &mut dyn Connection) -> Result<(), HookError> {
        Ok(())
    }

    /// A caller is returning a connection.
    fn on_release(&self, _conn: &mut dyn Connection) -> Result<(), HookError> {
        Ok(())
    }

    /// A connection is about to be closed. Errors are logged and ignored.
    fn on_destroy(&self, _conn: &mut dyn Connection) -> Result<(), HookError> {
        Ok(())
    }
}

/// Ordered, append-only list of hooks.
#[derive(Default)]
pub(crate) struct HookChain {
    hooks: RwLock<Vec<Arc<dyn ConnectionHook>>>,
}

impl HookChain {
    pub(crate) fn push(&self, hook: Arc<dyn ConnectionHook>) {
        self.hooks.write().push(hook);
    }

    pub(crate) fn len(&self) -> usize {
        self.hooks.read().len()
    }

    /// Run `event` on every hook in registration order, stopping at the
    /// first failure.
    pub(crate) fn dispatch(
        &self,
        event: HookEvent,
        conn: &mut dyn Connection,
    ) -> Result<(), PoolError> {
        // Snapshot so a hook can register another hook without deadlocking.
        let hooks = {
            let guard = self.hooks.read();
            if guard.is_empty() {
                return Ok(());
            }
            guard.clone()
        };

        for hook in &hooks {
            let result = match event {
                HookEvent::Create => hook.on_create(conn),
                HookEvent::HandedOut => hook.on_handed_out(conn),
                HookEvent::Release => hook.on_release(conn),
                HookEvent::Destroy => hook.on_destroy(conn),
            };
            result.map_err(|source| PoolError::Hook { event, source })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookChain")
            .field("hooks", &self.len())
            .finish()
    }
}
