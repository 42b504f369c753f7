//! The window subsystem.
//!
//! A thin winit-backed life-cycle participant: `init()` creates the event
//! loop and a hidden window, `start()` shows it, `update()` pumps OS events
//! and signals a halt once the user asks to close, `shutdown()` tears the
//! loop down. The engine owns the frame loop, so events are pumped through
//! winit's desktop `pump_events` extension instead of handing winit the
//! thread.
//!
//! Everything other subsystems need from the window — the handle, the
//! drawable size, the clear colour, the close request — lives in a shared
//! [`WindowState`] so the renderer never talks to winit directly.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::engine::{Flow, Subsystem};

/// Window parameters fixed at construction time.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Whether the window can be resized by the user.
    pub resizable: bool,
    pub clear_color: wgpu::Color,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Window".to_owned(),
            width: 800,
            height: 600,
            resizable: true,
            clear_color: wgpu::Color::BLACK,
        }
    }
}

/// Shared window state, owned by the engine thread.
///
/// Mutations that need a live window (title, size) are logged no-ops until
/// the window subsystem has initialised; the clear colour and the close
/// request are plain state and always accepted.
pub struct WindowState {
    window: Option<Arc<Window>>,
    width: u32,
    height: u32,
    clear_color: wgpu::Color,
    close_requested: bool,
}

impl WindowState {
    fn new(config: &WindowConfig) -> Self {
        Self {
            window: None,
            width: config.width,
            height: config.height,
            clear_color: config.clear_color,
            close_requested: false,
        }
    }

    pub(crate) fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }

    /// Current drawable size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear_color(&self) -> wgpu::Color {
        self.clear_color
    }

    /// Set the background colour the renderer clears with each frame.
    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    /// Modify the window title at runtime.
    pub fn set_title(&self, title: &str) {
        match &self.window {
            None => log::warn!("Cannot update title as window is not yet created"),
            Some(window) => window.set_title(title),
        }
    }

    /// Ask the OS for a new window size. The stored size follows once the
    /// resize event arrives.
    pub fn set_size(&self, width: u32, height: u32) {
        match &self.window {
            None => log::warn!("Cannot update size as window is not yet created"),
            Some(window) => {
                let _ = window.request_inner_size(PhysicalSize::new(width, height));
            }
        }
    }

    /// Ask the engine to shut down at the end of the current frame.
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }
}

/// Winit callback target recording events into the shared state.
struct WindowHandler {
    state: Rc<RefCell<WindowState>>,
    config: WindowConfig,
    creation_error: Option<anyhow::Error>,
}

impl ApplicationHandler for WindowHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.borrow().window.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(self.config.resizable)
            .with_visible(false);
        match event_loop.create_window(attributes) {
            Ok(window) => {
                let window = Arc::new(window);
                let size = window.inner_size();
                let mut state = self.state.borrow_mut();
                state.width = size.width;
                state.height = size.height;
                state.window = Some(window);
            }
            Err(e) => self.creation_error = Some(anyhow::Error::new(e)),
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.state.borrow_mut().close_requested = true,
            WindowEvent::Resized(size) => {
                let mut state = self.state.borrow_mut();
                state.width = size.width;
                state.height = size.height;
            }
            _ => (),
        }
    }
}

/// The window subsystem.
pub struct WindowSubsystem {
    event_loop: Option<EventLoop<()>>,
    handler: WindowHandler,
}

impl WindowSubsystem {
    /// Create the subsystem and the shared state handle the renderer and
    /// game logic read from.
    pub fn new(config: WindowConfig) -> (Self, Rc<RefCell<WindowState>>) {
        let state = Rc::new(RefCell::new(WindowState::new(&config)));
        let subsystem = Self {
            event_loop: None,
            handler: WindowHandler {
                state: state.clone(),
                config,
                creation_error: None,
            },
        };
        (subsystem, state)
    }

    fn pump(&mut self, timeout: Option<Duration>) -> PumpStatus {
        let event_loop = self
            .event_loop
            .as_mut()
            .expect("the window subsystem is initialised before it is updated");
        event_loop.pump_app_events(timeout, &mut self.handler)
    }
}

impl Subsystem for WindowSubsystem {
    fn name(&self) -> &'static str {
        "Window"
    }

    /// Create the event loop and the (still hidden) window.
    fn init(&mut self) -> Result<()> {
        log::info!("Initialising application window...");
        self.event_loop = Some(EventLoop::new().context("failed to create the event loop")?);

        // The window is created by the `resumed` callback; a few pumps give
        // slower backends time to deliver it.
        for _ in 0..8 {
            self.pump(Some(Duration::ZERO));
            if let Some(e) = self.handler.creation_error.take() {
                return Err(e.context("failed to create window"));
            }
            if self.handler.state.borrow().window.is_some() {
                return Ok(());
            }
        }
        bail!("the windowing backend never delivered a window");
    }

    /// Show the window.
    fn start(&mut self) -> Result<()> {
        log::info!("Window visibility changed to visible");
        if let Some(window) = self.handler.state.borrow().window() {
            window.set_visible(true);
        }
        Ok(())
    }

    /// Pump OS events; halt the engine once a close was requested.
    fn update(&mut self) -> Result<Flow> {
        if let PumpStatus::Exit(_) = self.pump(Some(Duration::ZERO)) {
            return Ok(Flow::Halt);
        }
        if self.handler.state.borrow().close_requested {
            return Ok(Flow::Halt);
        }
        Ok(Flow::Continue)
    }

    fn shutdown(&mut self) -> Result<()> {
        self.handler.state.borrow_mut().window = None;
        self.event_loop = None;
        Ok(())
    }
}
