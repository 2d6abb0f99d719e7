use std::time::{Duration, Instant};

/// Timing snapshot for one iteration of the run loop.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Instant the tick was taken.
    pub now: Instant,

    /// Number of ticks before this one.
    pub frame_index: u64,
}

impl FrameTime {
    /// Snapshot used before the first tick: zero delta at frame 0.
    pub fn initial() -> Self {
        Self {
            dt: 0.0,
            now: Instant::now(),
            frame_index: 0,
        }
    }

    /// Delta time in milliseconds.
    pub fn dt_millis(&self) -> f32 {
        self.dt * 1000.0
    }
}

/// Produces [`FrameTime`] snapshots.
///
/// Delta time is clamped so a debugger pause or a long minimize does not
/// hand layers a multi-second step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub const DEFAULT_DT_MIN: Duration = Duration::from_micros(100);
    pub const DEFAULT_DT_MAX: Duration = Duration::from_millis(250);

    pub fn new() -> Self {
        Self::with_clamps(Self::DEFAULT_DT_MIN, Self::DEFAULT_DT_MAX)
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restarts the delta baseline without touching the frame counter.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let time = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        time
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_counts_ticks() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick().frame_index, 0);
        assert_eq!(clock.tick().frame_index, 1);
        assert_eq!(clock.tick().frame_index, 2);
    }

    #[test]
    fn long_stall_is_clamped_to_max() {
        let mut clock = FrameClock::new();
        let later = clock.last + Duration::from_secs(5);
        let time = clock.tick_at(later);
        assert_eq!(time.dt, FrameClock::DEFAULT_DT_MAX.as_secs_f32());
    }

    #[test]
    fn zero_step_is_clamped_to_min() {
        let mut clock = FrameClock::new();
        let same = clock.last;
        let time = clock.tick_at(same);
        assert_eq!(time.dt, FrameClock::DEFAULT_DT_MIN.as_secs_f32());
    }
}
