use std::time::Instant;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the clock was created or last restarted.
    pub elapsed: f32,

    /// Frames ticked since the clock was created or last restarted.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// One clock per window; `elapsed` and `frame_index` form the playback
/// position fed to shaders.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    frame_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            frame_index: 0,
        }
    }

    /// Restarts playback: elapsed time and frame index return to zero.
    pub fn restart(&mut self) {
        self.restart_at(Instant::now());
    }

    fn restart_at(&mut self, now: Instant) {
        self.start = now;
        self.frame_index = 0;
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let ft = FrameTime {
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);
        ft
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
    use std::time::Duration;

    #[test]
    fn frame_index_counts_from_zero() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let a = clock.tick_at(t0 + Duration::from_millis(16));
        let b = clock.tick_at(t0 + Duration::from_millis(32));
        assert_eq!(a.frame_index, 0);
        assert_eq!(b.frame_index, 1);
    }

    #[test]
    fn elapsed_is_measured_from_start() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let ft = clock.tick_at(t0 + Duration::from_secs(3));
        assert!((ft.elapsed - 3.0).abs() < 1e-4);
    }

    #[test]
    fn restart_rewinds_playback() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        clock.tick_at(t0 + Duration::from_secs(1));
        clock.tick_at(t0 + Duration::from_secs(2));

        clock.restart_at(t0 + Duration::from_secs(5));
        let ft = clock.tick_at(t0 + Duration::from_millis(5500));
        assert_eq!(ft.frame_index, 0);
        assert!((ft.elapsed - 0.5).abs() < 1e-4);
    }

    #[test]
    fn clock_behind_start_reports_zero() {
        let t0 = Instant::now() + Duration::from_secs(1);
        let mut clock = FrameClock::starting_at(t0);
        let ft = clock.tick_at(t0 - Duration::from_millis(500));
        assert_eq!(ft.elapsed, 0.0);
    }
}
