use chrono::{DateTime, Duration, Utc};

/// Wall-clock source; fixed in tests so drill timings are reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Time since `start`, clamped at zero if the clock moved backwards.
    #[must_use]
    pub fn elapsed_since(&self, start: DateTime<Utc>) -> Duration {
        (self.now() - start).max(Duration::zero())
    }

    /// Moves a fixed clock forward. No effect on the system clock.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

/// Formats an elapsed duration as `MM:SS`, minutes uncapped.
#[must_use]
pub fn format_elapsed(elapsed: std::time::Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        let start = clock.now();
        clock.advance(Duration::seconds(42));
        assert_eq!(clock.elapsed_since(start), Duration::seconds(42));
    }

    #[test]
    fn elapsed_never_negative() {
        let clock = fixed_clock();
        let later = fixed_now() + Duration::seconds(5);
        assert_eq!(clock.elapsed_since(later), Duration::zero());
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_elapsed(std::time::Duration::from_secs(7)), "00:07");
        assert_eq!(format_elapsed(std::time::Duration::from_secs(125)), "02:05");
    }
}
