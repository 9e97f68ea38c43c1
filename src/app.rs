use crate::config::{self, Config, ConfigError, WINDOW_TITLE};
use crate::core::input::InputController;
use crate::game::diagnostics::DiagnosticsSession;
use crate::game::gameplay::{Session, SessionEvent};
use crate::game::level::{Level, LevelError};
use crate::game::timing::Micros;
use log::{debug, error, info};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    error::{EventLoopError, OsError},
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("level error: {0}")]
    Level(#[from] LevelError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("could not create window: {0}")]
    Window(#[from] OsError),
}

#[inline(always)]
fn micros_since(launch: Instant, now: Instant) -> Micros {
    now.saturating_duration_since(launch).as_micros() as Micros
}

pub struct App {
    window: Option<Arc<Window>>,
    session: Session,
    input: InputController,
    launch: Instant,
    display_width: u32,
    display_height: u32,
    frame_count: u32,
    last_title_update: Instant,
    last_fps: f32,
}

impl App {
    fn new(config: &Config, level: Level) -> Self {
        let launch = Instant::now();
        let diagnostics = DiagnosticsSession::new(
            DiagnosticsSession::daily_path(&config.log_dir),
            config.log_enabled,
        );
        Self {
            window: None,
            session: Session::new(config, level, diagnostics, 0),
            input: InputController::new(),
            launch,
            display_width: config.display_width,
            display_height: config.display_height,
            frame_count: 0,
            last_title_update: launch,
            last_fps: 0.0,
        }
    }

    #[inline(always)]
    fn now(&self) -> Micros {
        micros_since(self.launch, Instant::now())
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_resizable(true)
            .with_inner_size(PhysicalSize::new(self.display_width, self.display_height));
        let window = Arc::new(event_loop.create_window(attributes)?);
        info!(
            "Window created at {}x{}; starting event loop...",
            self.display_width, self.display_height
        );
        self.window = Some(window);
        Ok(())
    }

    /// Refreshes the title once a second, or right away when something happened.
    fn update_title(&mut self, window: &Window, now: Instant, changed: bool) {
        self.frame_count += 1;
        let elapsed = now.duration_since(self.last_title_update).as_secs_f32();
        if elapsed >= 1.0 {
            self.last_fps = self.frame_count as f32 / elapsed;
            self.frame_count = 0;
            self.last_title_update = now;
        } else if !changed {
            return;
        }
        window.set_title(&format!(
            "{} - {} | {:.0} FPS",
            WINDOW_TITLE,
            self.session.view(),
            self.last_fps
        ));
    }

    fn redraw(&mut self, window: &Window) {
        let now = Instant::now();
        let frame = self.input.take_frame();
        let events = self.session.update(micros_since(self.launch, now), frame);
        for event in &events {
            match event {
                SessionEvent::Judged(_) | SessionEvent::PhaseChanged { .. } => {}
                other => debug!("{:?}", other),
            }
        }
        self.update_title(window, now, !events.is_empty());
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init_window(event_loop) {
                error!("Failed to initialize window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_ref().cloned() else {
            return;
        };
        if window_id != window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested. Shutting down.");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if key_event.state == ElementState::Pressed
                    && key_event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    info!("Escape pressed. Shutting down.");
                    event_loop.exit();
                    return;
                }
                let now = self.now();
                self.input.handle_key_event(&key_event, now);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let now = self.now();
                self.input.mouse_button(button, state, now);
            }
            WindowEvent::Touch(touch) => {
                let now = self.now();
                self.input
                    .touch(touch.id, touch.phase, touch.location.x, touch.location.y, now);
            }
            WindowEvent::Focused(false) => self.input.focus_lost(),
            WindowEvent::RedrawRequested => self.redraw(&window),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Loads config and level, then runs the window until it closes.
pub fn run(config_path: &Path) -> Result<(), AppError> {
    let config = config::load(config_path)?;
    let level = Level::load(&config.level_path)?;
    let event_loop = EventLoop::new()?;
    let mut app = App::new(&config, level);
    event_loop.run_app(&mut app)?;
    Ok(())
}
