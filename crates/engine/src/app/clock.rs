use std::time::{Duration, Instant};

/// A monotonic point in simulation time, measured in seconds from loop start.
///
/// Timers in gameplay code store the `Timestamp` of the last event and compare
/// elapsed time against a threshold, so behavior does not depend on frame rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Timestamp(f64);

impl Timestamp {
    pub const ZERO: Self = Self(0.0);

    pub fn from_secs_f64(seconds: f64) -> Self {
        if seconds.is_finite() {
            Self(seconds.max(0.0))
        } else {
            Self::ZERO
        }
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0
    }

    pub fn offset_by(self, seconds: f64) -> Self {
        Self::from_secs_f64(self.0 + seconds)
    }

    /// Seconds elapsed from `earlier` to `self`; never negative.
    pub fn seconds_since(self, earlier: Timestamp) -> f64 {
        seconds_between(earlier, self)
    }
}

/// Elapsed seconds between two timestamps, independent of argument order.
pub fn seconds_between(a: Timestamp, b: Timestamp) -> f64 {
    (b.0 - a.0).abs()
}

/// Wall clock anchored at loop start.
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    started_at: Instant,
}

impl SimClock {
    pub fn start() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }

    pub fn now(&self) -> Timestamp {
        self.at(Instant::now())
    }

    pub fn at(&self, instant: Instant) -> Timestamp {
        let elapsed: Duration = instant.saturating_duration_since(self.started_at);
        Timestamp::from_secs_f64(elapsed.as_secs_f64())
    }
}

/// Per-tick timing handed to scenes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    pub now: Timestamp,
    pub dt_seconds: f32,
}

impl FrameTime {
    pub fn new(now: Timestamp, dt_seconds: f32) -> Self {
        let dt_seconds = if dt_seconds.is_finite() {
            dt_seconds.max(0.0)
        } else {
            0.0
        };
        Self { now, dt_seconds }
    }
}
