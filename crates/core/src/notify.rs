//! Notification sink — trait for forwarding engagement records to the
//! external analytics channel.
//!
//! Delivery is best-effort and runs off the critical path: the statistics
//! store is the system of record, the sink is a side channel. Implementations
//! must not block the caller.

use crate::types::{EngagementKind, Notification};
use std::sync::{Arc, Mutex};

/// Trait for handing off engagement notifications. The production
/// implementation publishes to NATS from a background task.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: Notification);
}

/// No-op sink for tests and for running without a broker.
pub struct NoOpSink;

impl NotificationSink for NoOpSink {
    fn deliver(&self, _notification: Notification) {}
}

/// In-memory sink that captures notifications for testing.
#[derive(Default)]
pub struct CaptureSink {
    notifications: Mutex<Vec<Notification>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }

    pub fn count(&self) -> usize {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .len()
    }

    pub fn count_kind(&self, kind: EngagementKind) -> usize {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .iter()
            .filter(|n| n.type_event == kind.type_event())
            .count()
    }

    pub fn clear(&self) {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .clear();
    }
}

impl NotificationSink for CaptureSink {
    fn deliver(&self, notification: Notification) {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
    }
}

/// Convenience: create a no-op sink for wiring without a broker.
pub fn noop_sink() -> Arc<dyn NotificationSink> {
    Arc::new(NoOpSink)
}

/// Convenience: create a capture sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}
