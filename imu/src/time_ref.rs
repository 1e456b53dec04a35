use crate::clock::Clock;
use std::time::Instant;

/// Monotonic instant captured on the rising edge of a wall-clock second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeReference {
    pub wall_second: i64,
    pub instant: Instant,
}

impl TimeReference {
    /// Microseconds elapsed between the reference and `at`, truncated.
    ///
    /// Instants before the reference clamp to zero.
    pub fn elapsed_micros(&self, at: Instant) -> i64 {
        let micros = at.saturating_duration_since(self.instant).as_micros();
        i64::try_from(micros).unwrap_or(i64::MAX)
    }
}

/// Spins until the wall clock enters a new second, then pairs that second
/// with the monotonic clock. Blocks for up to one second.
pub fn establish_reference<C: Clock>(clock: &C) -> TimeReference {
    let start = clock.wall_seconds();
    loop {
        let wall_second = clock.wall_seconds();
        if wall_second > start {
            return TimeReference {
                wall_second,
                instant: clock.now(),
            };
        }
        std::hint::spin_loop();
    }
}
