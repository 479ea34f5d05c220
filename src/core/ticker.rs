// src/core/ticker.rs

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::constants::BUSY_TICK_MILLIS;
use crate::core::managed::ManagedEnvironment;

/// Advances an environment's tick counter on a fixed period while it is busy.
///
/// `on_tick` receives the new tick count and is only called while an
/// operation is in flight. The task is aborted when the ticker is dropped.
#[derive(Debug)]
pub struct BusyTicker {
    handle: JoinHandle<()>,
}

impl BusyTicker {
    pub fn spawn<F>(environment: Arc<ManagedEnvironment>, on_tick: F) -> Self
    where
        F: Fn(u64) + Send + 'static,
    {
        Self::spawn_with_period(environment, Duration::from_millis(BUSY_TICK_MILLIS), on_tick)
    }

    pub fn spawn_with_period<F>(environment: Arc<ManagedEnvironment>, period: Duration, on_tick: F) -> Self
    where
        F: Fn(u64) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if environment.is_busy() {
                    on_tick(environment.advance_tick());
                }
            }
        });
        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for BusyTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Picks an animation frame for a tick count.
pub fn frame_for(tick: u64, frames: &[&'static str]) -> &'static str {
    if frames.is_empty() {
        return "";
    }
    let len = frames.len() as u64;
    let index = usize::try_from(tick % len).unwrap_or_default();
    frames.get(index).copied().unwrap_or_default()
}
