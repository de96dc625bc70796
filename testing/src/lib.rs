//! # todoboard testing
//!
//! Testing utilities and helpers for the todoboard reducer architecture.
//!
//! Contents:
//! - Deterministic [`Clock`] implementations
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - Effect assertions and [`drain_effects`] for resolving effect futures
//!
//! ## Example
//!
//! ```ignore
//! use todoboard_testing::{ReducerTest, test_clock};
//!
//! ReducerTest::new(TodoReducer::new())
//!     .with_env(test_environment(test_clock()))
//!     .given_state(TodoState::new())
//!     .when_action(TodoAction::SetDraft { text: "buy milk".into() })
//!     .then_state(|state| assert_eq!(state.draft, "buy milk"))
//!     .run();
//! ```

use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, PoisonError};
use todoboard_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions, drain_effects};

/// Deterministic clocks
pub mod mocks {
    use super::{Clock, DateTime, Duration, Mutex, PoisonError, Utc};

    /// Clock stuck at one instant
    ///
    /// # Example
    ///
    /// ```
    /// use todoboard_testing::mocks::FixedClock;
    /// use todoboard_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Clock that always reads `time`
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that advances by a fixed step every time it is read
    ///
    /// Gives strictly increasing creation timestamps without sleeping.
    ///
    /// ```
    /// use todoboard_testing::mocks::SteppingClock;
    /// use todoboard_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = SteppingClock::new(Utc::now(), Duration::seconds(1));
    /// let first = clock.now();
    /// assert_eq!(clock.now() - first, Duration::seconds(1));
    /// ```
    #[derive(Debug)]
    pub struct SteppingClock {
        next: Mutex<DateTime<Utc>>,
        step: Duration,
    }

    impl SteppingClock {
        /// Start at `start`, advancing by `step` per reading
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: Duration) -> Self {
            Self {
                next: Mutex::new(start),
                step,
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
            let now = *next;
            *next = now + self.step;
            now
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_089))
    }

    /// Create a one-second stepping clock starting at [`test_clock`]'s instant
    #[must_use]
    pub fn stepping_clock() -> SteppingClock {
        SteppingClock::new(test_clock().now(), Duration::seconds(1))
    }
}

pub use mocks::{FixedClock, SteppingClock, stepping_clock, test_clock};
