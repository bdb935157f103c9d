//! Wall-clock port so TTL logic can be driven by tests.

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait ClockPort: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Arc;

    use chrono::TimeZone;
    use parking_lot::Mutex;

    /// Clock that only moves when told to.
    #[derive(Clone)]
    pub struct ManualClock {
        now: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Starts at 2025-01-01T00:00:00Z.
        pub fn new() -> Self {
            let start = Utc
                .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_else(Utc::now);
            Self::starting_at(start)
        }

        pub fn starting_at(start: DateTime<Utc>) -> Self {
            Self {
                now: Arc::new(Mutex::new(start)),
            }
        }

        /// Moves the clock forward.
        pub fn advance(&self, by: std::time::Duration) {
            let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
            *self.now.lock() += delta;
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ClockPort for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock()
        }
    }
}
