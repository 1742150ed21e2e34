use std::sync::{Arc, Mutex};

use chrono::Duration;

use super::{now, Timestamp};

/// Source of the current time for the statistic store.
pub trait Clock: std::fmt::Debug + Send + Sync {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        now()
    }
}

/// A clock that only moves when told to.
///
/// Lets tests record observations "yesterday" or "last month" through the
/// regular insert path. Exists for tests, the binary always runs on [SystemClock].
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, timestamp: Timestamp) {
        *self.lock() = timestamp;
    }

    pub fn advance(&self, duration: Duration) {
        let mut current = self.lock();
        *current = Timestamp::from(current.inner() + duration);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Timestamp> {
        // a poisoned clock still holds a valid timestamp
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.lock()
    }
}
