//! Recording lifecycle hook.

use connpool::{Connection, ConnectionHook, HookError, HookEvent};
use parking_lot::Mutex;

use crate::connection::mock_id;

/// [`ConnectionHook`] that records every event it sees.
///
/// Each record pairs the event with the mock id of the connection, or
/// `None` when the connection did not come from a
/// [`MockConnector`](crate::MockConnector).
#[derive(Debug, Default)]
pub struct RecordingHook {
    events: Mutex<Vec<(HookEvent, Option<u64>)>>,
    veto: Mutex<Option<HookEvent>>,
}

impl RecordingHook {
    /// Create a hook that accepts every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hook that rejects `event`.
    #[must_use]
    pub fn failing_on(event: HookEvent) -> Self {
        let hook = Self::default();
        hook.fail_on(Some(event));
        hook
    }

    /// Reject `event` from now on, or stop rejecting with `None`.
    pub fn fail_on(&self, event: Option<HookEvent>) {
        *self.veto.lock() = event;
    }

    /// Every event seen, in order.
    #[must_use]
    pub fn events(&self) -> Vec<(HookEvent, Option<u64>)> {
        self.events.lock().clone()
    }

    /// How many times `event` was seen.
    #[must_use]
    pub fn count(&self, event: HookEvent) -> usize {
        self.events.lock().iter().filter(|(e, _)| *e == event).count()
    }

    /// Ids of the connections `event` was seen for.
    #[must_use]
    pub fn ids(&self, event: HookEvent) -> Vec<u64> {
        self.events
            .lock()
            .iter()
            .filter(|(e, _)| *e == event)
            .filter_map(|(_, id)| *id)
            .collect()
    }

    fn record(&self, event: HookEvent, conn: &dyn Connection) -> Result<(), HookError> {
        self.events.lock().push((event, mock_id(conn)));
        if *self.veto.lock() == Some(event) {
            return Err(HookError::msg(format!("{event} rejected by test hook")));
        }
        Ok(())
    }
}

impl ConnectionHook for RecordingHook {
    fn on_create(&self, conn: &mut dyn Connection) -> Result<(), HookError> {
        self.record(HookEvent::Create, conn)
    }

    fn on_handed_out(&self, conn: &mut dyn Connection) -> Result<(), HookError> {
        self.record(HookEvent::HandedOut, conn)
    }

    fn on_release(&self, conn: &mut dyn Connection) -> Result<(), HookError> {
        self.record(HookEvent::Release, conn)
    }

    fn on_destroy(&self, conn: &mut dyn Connection) -> Result<(), HookError> {
        self.record(HookEvent::Destroy, conn)
    }
}
