//! Wall-clock abstraction used by sessions.

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for a session.
///
/// `System` reads the real clock. `Fixed` holds a timestamp that only moves
/// when advanced, which lets drivers and tests produce exact response times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Advance a fixed clock. Has no effect on `Clock::System`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Elapsed seconds between two instants, clamped to zero.
pub fn elapsed_secs(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = (to - from).num_milliseconds().max(0);
    millis as f64 / 1000.0
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a `Clock` fixed at [`FIXED_TEST_TIMESTAMP`].
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(
        DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
            .expect("fixed timestamp should be valid"),
    )
}
