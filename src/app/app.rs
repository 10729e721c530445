use crate::error::ViewerError;
use crate::renderer::{Renderer, Scene};
use crate::settings::ViewerSettings;
use crate::ui;
use crate::viewer::{FrameClock, KeyOutcome, Viewer};
use egui_wgpu::ScreenDescriptor;
use egui_winit::State;
use std::sync::Arc;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{Key, NamedKey};
use winit::window::Window;

pub struct EventResponse {
    pub repaint: bool,
    pub exit: bool,
}

impl EventResponse {
    fn exit() -> Self {
        Self {
            repaint: false,
            exit: true,
        }
    }

    fn repaint(repaint: bool) -> Self {
        Self {
            repaint,
            exit: false,
        }
    }
}

/// What a keyboard event asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Exit,
    Viewer(char),
    Ignore,
}

/// Map a key press to the character the viewer reacts to.
fn key_char(key: &Key) -> Option<char> {
    match key {
        Key::Named(NamedKey::Space) => Some(' '),
        Key::Character(s) => s.chars().next(),
        _ => None,
    }
}

/// Only fresh presses count; auto-repeat would reload a model every tick.
pub fn key_action(key: &Key, state: ElementState, repeat: bool) -> KeyAction {
    if state != ElementState::Pressed || repeat {
        return KeyAction::Ignore;
    }
    if *key == Key::Named(NamedKey::Escape) {
        return KeyAction::Exit;
    }
    key_char(key).map_or(KeyAction::Ignore, KeyAction::Viewer)
}

pub struct App {
    pub window: Arc<Window>,
    renderer: Renderer,
    egui_state: State,
    egui_wants_pointer: bool,
    viewer: Viewer,
    clock: FrameClock,
    cursor: (f32, f32),
}

impl App {
    pub async fn new(
        window: Arc<Window>,
        settings: ViewerSettings,
        initial_slot: usize,
        animate: bool,
    ) -> Result<Self, ViewerError> {
        let renderer = Renderer::new(&window, &settings).await?;

        let egui_ctx = renderer.egui_context();
        let egui_state = State::new(
            egui_ctx,
            egui::viewport::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let mut viewer = Viewer::new(settings, renderer.size());
        viewer.set_start_animating(animate);

        let mut app = Self {
            window,
            renderer,
            egui_state,
            egui_wants_pointer: false,
            viewer,
            clock: FrameClock::new(),
            cursor: (0.0, 0.0),
        };

        // A missing first model leaves an empty scene; keys 1-4 can still load one
        if let Err(e) = app.viewer.setup(initial_slot) {
            log::error!("{e}");
        }
        app.sync_model();

        Ok(app)
    }

    /// Push the viewer's current model to the GPU.
    fn sync_model(&mut self) {
        if let Some(model) = self.viewer.model() {
            self.renderer.upload_model(model);
            self.upload_snapshots();
        }
    }

    fn upload_snapshots(&mut self) {
        self.renderer.update_meshes(
            self.viewer.animations().animated_meshes(),
            self.viewer.current_mesh(),
        );
    }

    pub fn handle_event(&mut self, event: &WindowEvent) -> EventResponse {
        let egui_response = self.egui_state.on_window_event(&self.window, event);

        match event {
            WindowEvent::CloseRequested => return EventResponse::exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if egui_response.consumed {
                    return EventResponse::repaint(egui_response.repaint);
                }
                match key_action(&event.logical_key, event.state, event.repeat) {
                    KeyAction::Exit => return EventResponse::exit(),
                    KeyAction::Viewer(c) => match self.viewer.key_pressed(c) {
                        KeyOutcome::ModelLoaded(slot) => {
                            log::info!("Switched to slot {}", slot + 1);
                            self.sync_model();
                        }
                        KeyOutcome::LoadFailed(slot, reason) => {
                            log::error!("Slot {} not loaded: {reason}", slot + 1);
                        }
                        KeyOutcome::AnimationToggled(on) => {
                            log::debug!("Animation {}", if on { "on" } else { "off" });
                        }
                        KeyOutcome::HelpToggled(visible) => {
                            log::debug!("Help text {}", if visible { "shown" } else { "hidden" });
                        }
                        KeyOutcome::Ignored => {}
                    },
                    KeyAction::Ignore => {}
                }
            }
            WindowEvent::Resized(size) => {
                self.renderer.resize(*size);
                if size.width > 0 && size.height > 0 {
                    self.viewer
                        .resize(size.width as f32, size.height as f32);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed if !self.egui_wants_pointer => {
                    self.viewer.mouse_pressed(self.cursor.1);
                }
                ElementState::Released => self.viewer.mouse_released(),
                ElementState::Pressed => {}
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
                self.viewer.mouse_moved(self.cursor.0, self.cursor.1);
            }
            _ => {}
        }

        EventResponse::repaint(true)
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let dt = self.clock.tick();
        self.viewer.update(dt);
        self.upload_snapshots();

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let egui_ctx = self.renderer.egui_context();
        let fps = self.clock.fps();
        let animation_count = self.viewer.animation_count();
        let show_help = self.viewer.show_help();
        let full_output = egui_ctx.run(raw_input, |ctx| {
            ui::show(ctx, show_help, fps, animation_count);
        });
        self.egui_wants_pointer = egui_ctx.wants_pointer_input();

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let size = self.window.inner_size();
        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let slot = self.viewer.slot_settings();
        let scene = Scene {
            position: self.viewer.position(),
            mouse_x: self.viewer.mouse_x(),
            slot_rotation: slot.and_then(|s| s.rotation),
            bounds: self.viewer.model().map(|m| m.bounds).unwrap_or_default(),
            separate_specular: slot.is_some_and(|s| s.separate_specular),
            has_model: self.viewer.model().is_some(),
        };

        match self.renderer.render(
            &scene,
            paint_jobs,
            full_output.textures_delta,
            screen_descriptor,
        ) {
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.renderer.resize(self.window.inner_size());
                Ok(())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::SmolStr;

    #[test]
    fn keys_map_to_viewer_chars() {
        assert_eq!(key_char(&Key::Named(NamedKey::Space)), Some(' '));
        assert_eq!(key_char(&Key::Character(SmolStr::new("3"))), Some('3'));
        assert_eq!(key_char(&Key::Character(SmolStr::new("h"))), Some('h'));
        assert_eq!(key_char(&Key::Named(NamedKey::Enter)), None);
    }

    #[test]
    fn escape_press_exits() {
        let escape = Key::Named(NamedKey::Escape);
        assert_eq!(key_action(&escape, ElementState::Pressed, false), KeyAction::Exit);
        assert_eq!(key_action(&escape, ElementState::Released, false), KeyAction::Ignore);
    }

    #[test]
    fn repeats_and_releases_are_ignored() {
        let one = Key::Character(SmolStr::new("1"));
        assert_eq!(key_action(&one, ElementState::Pressed, false), KeyAction::Viewer('1'));
        assert_eq!(key_action(&one, ElementState::Pressed, true), KeyAction::Ignore);
        assert_eq!(key_action(&one, ElementState::Released, false), KeyAction::Ignore);

        let space = Key::Named(NamedKey::Space);
        assert_eq!(key_action(&space, ElementState::Pressed, true), KeyAction::Ignore);
        assert_eq!(key_action(&space, ElementState::Pressed, false), KeyAction::Viewer(' '));
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let enter = Key::Named(NamedKey::Enter);
        assert_eq!(key_action(&enter, ElementState::Pressed, false), KeyAction::Ignore);
    }
}
