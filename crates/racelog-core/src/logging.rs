//! Logging status
//!
//! Tracks whether a logging session is running and since when. Status
//! transitions are broadcast to every subscribed observer (connected
//! telemetry clients, the status LED task, ...).

use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::info;

/// Default number of undelivered events each observer can fall behind by
const EVENT_CAPACITY: usize = 16;

/// Whether the logger is writing data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoggingState {
    /// Not logging
    Idle,
    /// Writing data
    Active,
}

impl LoggingState {
    fn to_u8(self) -> u8 {
        match self {
            LoggingState::Idle => 0,
            LoggingState::Active => 1,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LoggingState::Idle,
            _ => LoggingState::Active,
        }
    }
}

/// Sent to observers on every status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingStatusEvent {
    /// Status before the transition
    pub previous: LoggingState,
    /// Status after the transition
    pub status: LoggingState,
}

/// Shared logging status handle
///
/// Owned by the logger task and handed by reference to anything that needs
/// to read or change the status.
#[derive(Debug)]
pub struct LoggingStatus {
    status: AtomicU8,
    /// Uptime in ms when logging started, 0 when not logging
    since: AtomicI32,
    events: broadcast::Sender<LoggingStatusEvent>,
}

impl LoggingStatus {
    /// Create a handle with the default observer capacity
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CAPACITY)
    }

    /// Create a handle whose observers can lag by up to `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            status: AtomicU8::new(LoggingState::Idle.to_u8()),
            since: AtomicI32::new(0),
            events,
        }
    }

    /// Register an observer for status transitions
    pub fn subscribe(&self) -> broadcast::Receiver<LoggingStatusEvent> {
        self.events.subscribe()
    }

    /// Current status
    pub fn status(&self) -> LoggingState {
        LoggingState::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Set the status, notifying observers if it changed
    pub fn set_status(&self, status: LoggingState) {
        let previous = LoggingState::from_u8(self.status.swap(status.to_u8(), Ordering::AcqRel));
        if previous == status {
            return;
        }

        info!(?previous, ?status, "logging status changed");
        // No observers is fine
        let _ = self.events.send(LoggingStatusEvent { previous, status });
    }

    /// Record the uptime at which logging started; 0 clears it
    pub fn set_logging_start(&self, uptime_ms: i32) {
        self.since.store(uptime_ms, Ordering::Release);
    }

    /// Milliseconds spent logging as of `uptime_ms`, 0 when not logging
    pub fn active_time(&self, uptime_ms: i32) -> i32 {
        match self.since.load(Ordering::Acquire) {
            0 => 0,
            since => uptime_ms - since,
        }
    }

    /// Whether a logging start time is set
    pub fn is_active(&self) -> bool {
        self.since.load(Ordering::Acquire) > 0
    }
}

impl Default for LoggingStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_status_transitions_notify() {
        let status = LoggingStatus::new();
        let mut observer = status.subscribe();
        assert_eq!(status.status(), LoggingState::Idle);

        status.set_status(LoggingState::Active);
        assert_eq!(
            observer.try_recv().unwrap(),
            LoggingStatusEvent {
                previous: LoggingState::Idle,
                status: LoggingState::Active,
            }
        );

        // Same status again is not a transition
        status.set_status(LoggingState::Active);
        assert!(matches!(observer.try_recv(), Err(TryRecvError::Empty)));

        status.set_status(LoggingState::Idle);
        assert_eq!(observer.try_recv().unwrap().status, LoggingState::Idle);
    }

    #[test]
    fn test_set_status_without_observers() {
        let status = LoggingStatus::new();
        status.set_status(LoggingState::Active);
        assert_eq!(status.status(), LoggingState::Active);
    }

    #[test]
    fn test_active_time() {
        let status = LoggingStatus::new();
        assert!(!status.is_active());
        assert_eq!(status.active_time(5000), 0);

        status.set_logging_start(1200);
        assert!(status.is_active());
        assert_eq!(status.active_time(5000), 3800);

        status.set_logging_start(0);
        assert!(!status.is_active());
        assert_eq!(status.active_time(5000), 0);
    }
}
