use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Wall-clock and monotonic time sources.
pub trait Clock {
    /// Whole seconds since the Unix epoch.
    fn wall_seconds(&self) -> i64;

    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn wall_seconds(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            Err(e) => -(e.duration().as_secs_f64().ceil() as i64),
        }
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn wall_seconds(&self) -> i64 {
        (**self).wall_seconds()
    }

    fn now(&self) -> Instant {
        (**self).now()
    }
}
