use std::{cell::Cell, rc::Rc, thread};

use chrono::TimeDelta;

/// Source of monotonic time able to block the caller.
pub trait Clock {
    fn monotonic(&self) -> Instant;

    fn sleep(&self, duration: TimeDelta);
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct Instant {
    delta: TimeDelta,
}

impl Instant {
    pub fn elapsed(&self) -> TimeDelta {
        self.delta
    }

    pub fn elapsed_seconds_f64(&self) -> f64 {
        TD(self.elapsed()).seconds()
    }

    pub fn duration_since(&self, other: &Instant) -> TimeDelta {
        self.delta - other.delta
    }
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn monotonic(&self) -> Instant {
        Instant {
            delta: TimeDelta::from_std(self.start.elapsed()).unwrap_or(TimeDelta::MAX),
        }
    }

    fn sleep(&self, duration: TimeDelta) {
        if let Ok(duration) = duration.to_std() {
            thread::sleep(duration);
        }
    }
}

/// Clock that only moves when slept on or stepped. Clones share the same
/// time, so a test can keep a handle while the engine owns another.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    elapsed: Rc<Cell<TimeDelta>>,
}

impl Default for SimulatedClock {
    fn default() -> Self {
        SimulatedClock::new(TimeDelta::zero())
    }
}

impl SimulatedClock {
    pub fn new(elapsed: TimeDelta) -> SimulatedClock {
        SimulatedClock {
            elapsed: Rc::new(Cell::new(elapsed)),
        }
    }

    pub fn step(&self, delta: TimeDelta) {
        self.elapsed.set(self.elapsed.get() + delta);
    }
}

impl Clock for SimulatedClock {
    fn monotonic(&self) -> Instant {
        Instant {
            delta: self.elapsed.get(),
        }
    }

    fn sleep(&self, duration: TimeDelta) {
        if duration > TimeDelta::zero() {
            self.step(duration);
        }
    }
}

pub struct TD(pub TimeDelta);

impl TD {
    pub fn seconds(&self) -> f64 {
        self.0.num_seconds() as f64 + (self.0.subsec_nanos() as f64) / 1000000000.0
    }
}

/// Length of one frame when `rate` frames are emitted per second.
pub fn frame_interval(rate: u32) -> TimeDelta {
    TimeDelta::nanoseconds((1e9 / rate.max(1) as f64).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_clock_is_shared() {
        let clock = SimulatedClock::default();
        let handle = clock.clone();

        clock.sleep(TimeDelta::milliseconds(20));
        handle.step(TimeDelta::milliseconds(5));

        assert_eq!(clock.monotonic().elapsed(), TimeDelta::milliseconds(25));
        assert_eq!(handle.monotonic().elapsed(), TimeDelta::milliseconds(25));
    }

    #[test]
    fn test_simulated_clock_ignores_negative_sleep() {
        let clock = SimulatedClock::new(TimeDelta::seconds(1));
        clock.sleep(TimeDelta::milliseconds(-3));

        assert_eq!(clock.monotonic().elapsed_seconds_f64(), 1.0);
    }

    #[test]
    fn test_system_clock_sleeps() {
        let clock = SystemClock::default();
        let start = clock.monotonic();

        clock.sleep(TimeDelta::milliseconds(5));

        assert!(clock.monotonic().duration_since(&start) >= TimeDelta::milliseconds(5));
    }

    #[test]
    fn test_frame_interval() {
        assert_eq!(frame_interval(60), TimeDelta::nanoseconds(16_666_667));
        assert_eq!(frame_interval(4), TimeDelta::milliseconds(250));
        assert_eq!(frame_interval(0), TimeDelta::seconds(1));
    }
}
