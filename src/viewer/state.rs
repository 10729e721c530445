use crate::animation::{AnimationSystem, LoopState};
use crate::error::ViewerError;
use crate::model::{MeshSnapshot, Model};
use crate::settings::{ModelSlot, ViewerSettings};
use std::path::Path;

/// Where a freshly loaded model is placed, in window pixels.
pub fn model_position(width: f32, height: f32) -> [f32; 3] {
    [width * 0.5, height * 0.85, 0.0]
}

/// What a key press changed, so the caller can react (upload meshes,
/// report a failed load).
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    ModelLoaded(usize),
    LoadFailed(usize, String),
    AnimationToggled(bool),
    HelpToggled(bool),
    Ignored,
}

/// Viewer state driven by the window's input callbacks: the loaded model,
/// its playback and the flags toggled by keys and the mouse.
pub struct Viewer {
    settings: ViewerSettings,
    model: Option<Model>,
    animations: AnimationSystem,
    slot: Option<usize>,
    position: [f32; 3],
    window_size: [f32; 2],
    mouse_x: f32,
    left_pressed: bool,
    animate: bool,
    animate_mouse: bool,
    animation_position: f32,
    show_help: bool,
}

impl Viewer {
    pub fn new(settings: ViewerSettings, window_size: [f32; 2]) -> Self {
        let show_help = settings.show_help;
        Self {
            settings,
            model: None,
            animations: AnimationSystem::new(),
            slot: None,
            position: model_position(window_size[0], window_size[1]),
            window_size,
            mouse_x: 0.0,
            left_pressed: false,
            animate: false,
            animate_mouse: false,
            animation_position: 0.0,
            show_help,
        }
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn animations(&self) -> &AnimationSystem {
        &self.animations
    }

    pub fn current_slot(&self) -> Option<usize> {
        self.slot
    }

    pub fn slot_settings(&self) -> Option<&ModelSlot> {
        self.slot.and_then(|s| self.settings.slot(s))
    }

    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    pub fn mouse_x(&self) -> f32 {
        self.mouse_x
    }

    pub fn is_animating(&self) -> bool {
        self.animate
    }

    pub fn is_mouse_animating(&self) -> bool {
        self.animate_mouse
    }

    pub fn animation_position(&self) -> f32 {
        self.animation_position
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn animation_count(&self) -> usize {
        self.animations.animation_count()
    }

    /// Snapshot of the first mesh for the current frame.
    pub fn current_mesh(&self) -> Option<&MeshSnapshot> {
        self.animations.current_animated_mesh(0)
    }

    pub fn set_start_animating(&mut self, animate: bool) {
        self.animate = animate;
    }

    /// Initial load: slot `index`, looping, paused unless animating.
    pub fn setup(&mut self, index: usize) -> Result<(), ViewerError> {
        let result = self.load_slot(index);
        self.reset_playback();
        result
    }

    pub fn load_slot(&mut self, index: usize) -> Result<(), ViewerError> {
        self.load_slot_with(index, crate::parser::load)
    }

    /// Load slot `index` through `loader`. On failure the current model
    /// stays loaded.
    pub fn load_slot_with(
        &mut self,
        index: usize,
        loader: impl FnOnce(&Path) -> Result<Model, ViewerError>,
    ) -> Result<(), ViewerError> {
        let slot = self
            .settings
            .slot(index)
            .ok_or_else(|| ViewerError::new("no-such-slot").with_arg("slot", index + 1))?;
        let path = slot.resolve(&self.settings.asset_dir);

        log::info!("Loading slot {}: {}", index + 1, path.display());
        let model = loader(&path).map_err(|e| {
            ViewerError::new("load-failed")
                .with_arg("slot", index + 1)
                .push_viewer(e)
        })?;

        self.animations.init_from_model(&model);
        self.model = Some(model);
        self.slot = Some(index);
        self.position = model_position(self.window_size[0], self.window_size[1]);
        Ok(())
    }

    /// Loop normally, play everything, pause unless animating.
    pub fn reset_playback(&mut self) {
        self.animations.set_loop_state_for_all(LoopState::Normal);
        self.animations.play_all();
        if !self.animate {
            self.animations.set_paused_for_all(true);
        }
        if let Some(model) = &self.model {
            self.animations.apply(model);
        }
    }

    pub fn key_pressed(&mut self, key: char) -> KeyOutcome {
        self.key_pressed_with(key, crate::parser::load)
    }

    pub fn key_pressed_with(
        &mut self,
        key: char,
        loader: impl FnOnce(&Path) -> Result<Model, ViewerError>,
    ) -> KeyOutcome {
        let outcome = match key {
            '1'..='4' => {
                let index = key as usize - '1' as usize;
                match self.load_slot_with(index, loader) {
                    Ok(()) => KeyOutcome::ModelLoaded(index),
                    Err(e) => KeyOutcome::LoadFailed(index, e.to_string()),
                }
            }
            ' ' => {
                self.animate = !self.animate;
                KeyOutcome::AnimationToggled(self.animate)
            }
            'h' | 'H' => {
                self.show_help = !self.show_help;
                KeyOutcome::HelpToggled(self.show_help)
            }
            _ => KeyOutcome::Ignored,
        };

        self.reset_playback();
        outcome
    }

    fn cursor_from_y(&self, y: f32) -> f32 {
        if self.window_size[1] <= 0.0 {
            return 0.0;
        }
        let p = y / self.window_size[1];
        if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
    }

    pub fn mouse_moved(&mut self, x: f32, y: f32) {
        self.mouse_x = x;
        if self.left_pressed {
            self.animation_position = self.cursor_from_y(y);
        }
    }

    /// Left button down: take over playback from the mouse.
    pub fn mouse_pressed(&mut self, y: f32) {
        self.left_pressed = true;
        self.animations.set_paused_for_all(true);
        self.animation_position = self.cursor_from_y(y);
        self.animate_mouse = true;
    }

    pub fn mouse_released(&mut self) {
        self.left_pressed = false;
        if self.animate {
            self.animations.set_paused_for_all(false);
        }
        self.animate_mouse = false;
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.window_size = [width, height];
        self.position = model_position(width, height);
    }

    /// Per-frame update: advance playback, apply the mouse cursor and
    /// refresh the animated meshes.
    pub fn update(&mut self, dt: f32) {
        self.animations.update(dt);
        if self.animate_mouse {
            self.animations.set_position_for_all(self.animation_position);
        }
        if let Some(model) = &self.model {
            self.animations.apply(model);
        }
    }
}
