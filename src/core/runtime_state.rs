// src/core/runtime_state.rs

use crate::models::RuntimeState;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;

const BUSY_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Default)]
struct StatusInner {
    state: RuntimeState,
    busy: bool,
    tick_count: u64,
}

/// Holds the lifecycle state of one environment and announces busy-flag changes.
///
/// This is a plain value holder: it never checks whether a transition is
/// legal. The only event it emits is the new busy value, sent synchronously
/// to every subscriber each time the flag actually flips.
#[derive(Debug)]
pub struct RuntimeStatus {
    inner: Mutex<StatusInner>,
    busy_tx: broadcast::Sender<bool>,
}

impl RuntimeStatus {
    pub fn new() -> Self {
        let (busy_tx, _) = broadcast::channel(BUSY_CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(StatusInner::default()),
            busy_tx,
        }
    }

    // A poisoned lock only means another thread panicked mid-assignment of plain values.
    fn lock(&self) -> MutexGuard<'_, StatusInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> RuntimeState {
        self.lock().state
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    pub fn tick_count(&self) -> u64 {
        self.lock().tick_count
    }

    /// Bumps the animation counter and returns the new value.
    pub fn advance_tick(&self) -> u64 {
        let mut inner = self.lock();
        inner.tick_count = inner.tick_count.wrapping_add(1);
        inner.tick_count
    }

    pub fn set_state(&self, state: RuntimeState) {
        self.lock().state = state;
    }

    pub fn set_busy(&self, busy: bool) {
        let changed = {
            let mut inner = self.lock();
            let changed = inner.busy != busy;
            inner.busy = busy;
            changed
        };
        if changed {
            self.notify(busy);
        }
    }

    /// Enters `state` and raises the busy flag, unless an operation is already in flight.
    ///
    /// Returns `false` without touching anything when already busy. The state is
    /// assigned before subscribers hear about the busy flag.
    pub fn try_begin(&self, state: RuntimeState) -> bool {
        {
            let mut inner = self.lock();
            if inner.busy {
                return false;
            }
            inner.state = state;
            inner.busy = true;
        }
        self.notify(true);
        true
    }

    /// Settles on `state` and then clears the busy flag.
    pub fn finish(&self, state: RuntimeState) {
        self.set_state(state);
        self.set_busy(false);
    }

    /// Receives every busy-flag change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.busy_tx.subscribe()
    }

    fn notify(&self, busy: bool) {
        // No subscribers is not an error.
        let _ = self.busy_tx.send(busy);
    }
}

impl Default for RuntimeStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_initial_status() {
        let status = RuntimeStatus::new();
        assert_eq!(status.state(), RuntimeState::Stopped);
        assert!(!status.is_busy());
        assert_eq!(status.tick_count(), 0);
    }

    #[test]
    fn test_set_busy_notifies_once_per_transition() {
        let status = RuntimeStatus::new();
        let mut rx = status.subscribe();

        status.set_busy(true);
        status.set_busy(true);
        status.set_busy(false);

        assert_eq!(rx.try_recv().unwrap(), true);
        assert_eq!(rx.try_recv().unwrap(), false);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_set_state_is_silent() {
        let status = RuntimeStatus::new();
        let mut rx = status.subscribe();

        status.set_state(RuntimeState::Started);

        assert_eq!(status.state(), RuntimeState::Started);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_try_begin_refuses_when_busy() {
        let status = RuntimeStatus::new();
        assert!(status.try_begin(RuntimeState::Starting));
        assert!(!status.try_begin(RuntimeState::Stopping));
        assert_eq!(status.state(), RuntimeState::Starting);

        status.finish(RuntimeState::Started);
        assert!(!status.is_busy());
        assert_eq!(status.state(), RuntimeState::Started);
    }

    #[test]
    fn test_subscriber_sees_transitional_state_while_busy() {
        let status = RuntimeStatus::new();
        let mut rx = status.subscribe();

        status.try_begin(RuntimeState::Restarting);
        assert_eq!(rx.try_recv().unwrap(), true);
        assert!(status.state().is_transitional());
    }

    #[test]
    fn test_ticks_are_monotonic() {
        let status = RuntimeStatus::new();
        assert_eq!(status.advance_tick(), 1);
        assert_eq!(status.advance_tick(), 2);
        assert_eq!(status.tick_count(), 2);
    }
}
