// tests/harness/virtual_clock.rs
//
// Virtual clock so tests can pin "today" for the date-bounded searches.

use chrono::{DateTime, Duration, Utc};
use link_relay::Clock;
use std::sync::{Arc, RwLock};

/// A clock that can be controlled for testing.
/// Thread-safe via Arc<RwLock<...>>.
#[derive(Clone)]
pub struct VirtualClock {
    inner: Arc<RwLock<DateTime<Utc>>>,
}

impl VirtualClock {
    /// Create a virtual clock set to a specific time.
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(time)),
        }
    }

    /// Create a virtual clock from an RFC 3339 timestamp.
    pub fn at_rfc3339(timestamp: &str) -> Self {
        Self::at(
            DateTime::parse_from_rfc3339(timestamp)
                .expect("valid RFC 3339 timestamp")
                .with_timezone(&Utc),
        )
    }

    /// Advance time by the given duration.
    pub fn advance(&self, duration: Duration) {
        let mut guard = self.inner.write().unwrap();
        *guard += duration;
    }

    /// Advance time by the given number of days.
    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.inner.read().unwrap()
    }
}
