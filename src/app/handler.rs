use crate::app::app::App;
use crate::error::ViewerError;
use crate::settings::ViewerSettings;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

pub struct AppHandler {
    pub app: Option<App>,
    pub settings: ViewerSettings,
    pub initial_slot: usize,
    pub animate: bool,
    /// Set when startup fails; the loop exits and `main` reports it.
    pub error: Option<ViewerError>,
}

impl AppHandler {
    pub fn new(settings: ViewerSettings, initial_slot: usize, animate: bool) -> Self {
        Self {
            app: None,
            settings,
            initial_slot,
            animate,
            error: None,
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Result<App, ViewerError> {
        let [width, height] = self.settings.window_size;
        let window_attrs = Window::default_attributes()
            .with_title("animvis-rs")
            .with_inner_size(winit::dpi::LogicalSize::new(width as f64, height as f64));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        pollster::block_on(App::new(
            window,
            self.settings.clone(),
            self.initial_slot,
            self.animate,
        ))
    }
}

impl ApplicationHandler for AppHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(app) => self.app = Some(app),
            Err(e) => {
                log::error!("Failed to start viewer: {e}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(app) = &mut self.app {
            let response = app.handle_event(&event);
            if response.repaint {
                app.window.request_redraw();
            }
            if response.exit {
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(app) = &mut self.app {
            if let Err(e) = app.render() {
                log::error!("Render error: {e:?}");
            }
            app.window.request_redraw();
        }
    }
}
