/// What happens when playback reaches either end of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Stop at the end.
    None,
    /// Wrap to the start.
    #[default]
    Normal,
    /// Bounce back and forth.
    Palindrome,
}

/// Playback state of a single clip, tracked as a normalized position.
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    duration: f32,
    position: f32,
    direction: f32,
    loop_state: LoopState,
    playing: bool,
    paused: bool,
    finished: bool,
}

impl AnimationPlayer {
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            position: 0.0,
            direction: 1.0,
            loop_state: LoopState::Normal,
            playing: false,
            paused: false,
            finished: false,
        }
    }

    /// Normalized position in `[0, 1]`.
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Clip-local time in seconds.
    pub fn time(&self) -> f32 {
        self.position * self.duration
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn set_loop_state(&mut self, state: LoopState) {
        self.loop_state = state;
    }

    /// Starts from the beginning, or only unpauses if already playing.
    pub fn play(&mut self) {
        if self.playing {
            self.paused = false;
            return;
        }
        self.playing = true;
        self.paused = false;
        self.finished = false;
        self.direction = 1.0;
        self.set_position(0.0);
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.paused = false;
        self.direction = 1.0;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_position(&mut self, position: f32) {
        self.position = if position.is_nan() {
            0.0
        } else {
            position.clamp(0.0, 1.0)
        };
    }

    /// Advance by `dt` seconds. No-op while stopped or paused.
    pub fn update(&mut self, dt: f32) {
        if !self.playing || self.paused || self.duration <= 0.0 || dt <= 0.0 {
            return;
        }

        let mut pos = self.position + self.direction * dt / self.duration;
        match self.loop_state {
            LoopState::Normal => {
                pos = pos.rem_euclid(1.0);
            }
            LoopState::None => {
                if pos >= 1.0 {
                    pos = 1.0;
                    self.stop();
                    self.finished = true;
                }
            }
            LoopState::Palindrome => {
                // Reflect off either end until inside the range
                while !(0.0..=1.0).contains(&pos) {
                    if pos > 1.0 {
                        pos = 2.0 - pos;
                    } else {
                        pos = -pos;
                    }
                    self.direction = -self.direction;
                }
            }
        }
        self.set_position(pos);
    }
}
