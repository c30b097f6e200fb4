use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

/// Simulation time unit. One tick is one in-game hour in the reference configuration.
pub type Tick = u64;

/// Monotonic time source consulted once per batch.
pub trait Clock: Send + Sync {
    /// Current tick.
    fn now(&self) -> Tick;
}

/// Clock advanced explicitly by a tick-driven host (and by tests).
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Starts at `tick`.
    #[must_use]
    pub const fn starting_at(tick: Tick) -> Self {
        Self {
            now: AtomicU64::new(tick),
        }
    }

    /// Jumps to `tick`. Moving backwards is ignored.
    pub fn set(&self, tick: Tick) {
        self.now.fetch_max(tick, Ordering::SeqCst);
    }

    /// Moves forward by `ticks` and returns the new time. Saturates at [`Tick::MAX`].
    pub fn advance(&self, ticks: Tick) -> Tick {
        self.now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(ticks))
            })
            .unwrap_or_else(|now| now)
            .saturating_add(ticks)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Tick {
        self.now.load(Ordering::SeqCst)
    }
}

/// Wall-clock backed source: ticks elapsed since construction at a fixed tick length.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
    tick_length: Duration,
}

impl MonotonicClock {
    /// Creates a clock where one tick lasts `tick_length` (at least one millisecond).
    #[must_use]
    pub fn new(tick_length: Duration) -> Self {
        Self {
            origin: Instant::now(),
            tick_length: tick_length.max(Duration::from_millis(1)),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Tick {
        let elapsed = self.origin.elapsed().as_millis();
        let per_tick = self.tick_length.as_millis().max(1);
        Tick::try_from(elapsed / per_tick).unwrap_or(Tick::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_only_moves_forward() {
        let clock = ManualClock::starting_at(10);
        assert_eq!(clock.advance(5), 15);
        clock.set(3);
        assert_eq!(clock.now(), 15);
        clock.set(40);
        assert_eq!(clock.now(), 40);
    }

    #[test]
    fn manual_clock_saturates() {
        let clock = ManualClock::starting_at(Tick::MAX - 1);
        assert_eq!(clock.advance(5), Tick::MAX);
        assert_eq!(clock.now(), Tick::MAX);
    }

    #[test]
    fn monotonic_clock_starts_at_zero() {
        let clock = MonotonicClock::new(Duration::from_secs(3600));
        assert_eq!(clock.now(), 0);
    }
}
