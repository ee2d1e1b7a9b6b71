use std::time::{Duration, Instant};

/// Timing of one loop iteration, handed to frame hooks.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous rendered frame (clamped).
    pub dt: f32,

    /// Seconds since the run started.
    pub elapsed: f32,

    /// Timestamp of this frame.
    pub now: Instant,

    /// Zero-based index of this frame within the run.
    pub frame_index: u64,
}

/// Produces [`FrameTime`] values for one run.
///
/// Delta time is clamped so a stalled or minimized window does not feed a huge
/// step into the simulation.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Option<Instant>,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new(start: Instant) -> Self {
        Self::with_clamps(start, Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(start: Instant, dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            start,
            last: None,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Number of frames ticked so far.
    pub fn frames(&self) -> u64 {
        self.frame_index
    }

    /// Records a frame at `now`.
    ///
    /// The first frame reports `dt_min`, since there is no previous frame.
    pub fn tick(&mut self, now: Instant) -> FrameTime {
        let dt = match self.last {
            Some(last) => now
                .saturating_duration_since(last)
                .clamp(self.dt_min, self.dt_max),
            None => self.dt_min,
        };
        self.last = Some(now);

        let time = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index += 1;
        time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dt_is_clamped_and_index_advances() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0);

        let first = clock.tick(t0);
        assert_eq!(first.frame_index, 0);
        assert!((first.dt - 0.0001).abs() < 1e-6);

        let second = clock.tick(t0 + Duration::from_millis(16));
        assert_eq!(second.frame_index, 1);
        assert!((second.dt - 0.016).abs() < 1e-4);

        let stalled = clock.tick(t0 + Duration::from_secs(5));
        assert!((stalled.dt - 0.25).abs() < 1e-6);
        assert!((stalled.elapsed - 5.0).abs() < 1e-4);
        assert_eq!(clock.frames(), 3);
    }
}
