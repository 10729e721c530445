use std::time::{Duration, Instant};

/// Frame timing: last frame duration and a smoothed frame rate.
pub struct FrameClock {
    last: Instant,
    last_dt: f32,
    fps: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            last_dt: 0.0,
            fps: 0.0,
        }
    }

    /// Mark the start of a new frame and return the elapsed seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;
        self.advance(elapsed)
    }

    fn advance(&mut self, elapsed: Duration) -> f32 {
        // Long stalls (window drag, breakpoint) should not jump animations
        let dt = elapsed.as_secs_f32().min(0.25);
        self.last_dt = dt;
        if dt > 0.0 {
            let instant = 1.0 / dt;
            self.fps = if self.fps == 0.0 {
                instant
            } else {
                self.fps * 0.9 + instant * 0.1
            };
        }
        dt
    }

    pub fn last_frame_time(&self) -> f32 {
        self.last_dt
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
