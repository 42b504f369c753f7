//! Embedding surface: assembles the standard subsystem trio.
//!
//! An [`App`] owns the shared state and an [`Engine`] wired with the
//! window, renderer and timer subsystems in their dependency order. Game
//! code registers textures and sprites through the returned handles before
//! calling [`run`](App::run) with its tick callback:
//!
//! ```no_run
//! use glint2d::{App, AppConfig, Sprite};
//!
//! let mut app = App::new(AppConfig::default())?;
//!
//! let name = app.textures().borrow_mut().register("assets/smile.png")?;
//! app.sprites().borrow_mut().add(Sprite::new(&name));
//!
//! let sprites = app.sprites();
//! let ticks = app.tick_count();
//! app.run(move || {
//!     let mut sprites = sprites.borrow_mut();
//!     let smile = sprites.get_mut(&name).unwrap();
//!     smile.set_x((150.0 * (ticks.get() as f32 / 40.0).sin()) as f32);
//!     smile.set_y((65.0 * (ticks.get() as f32 / 40.0).cos()) as f32);
//! })?;
//! # anyhow::Ok(())
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use crate::engine::Engine;
use crate::graphics::registry::TextureRegistry;
use crate::graphics::renderer::Renderer;
use crate::sprite::set::SpriteSet;
use crate::timer::{TickCount, Timer};
use crate::window::{WindowConfig, WindowState, WindowSubsystem};

/// Application parameters.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub window: WindowConfig,
    /// Fixed tick rate for the game logic callback.
    pub target_ups: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            target_ups: 60,
        }
    }
}

/// A pre-wired engine plus the shared handles game code mutates.
pub struct App {
    engine: Engine,
    target_ups: u32,
    window_state: Rc<RefCell<WindowState>>,
    sprites: Rc<RefCell<SpriteSet>>,
    textures: Rc<RefCell<TextureRegistry>>,
    ticks: TickCount,
}

impl App {
    /// Create the shared state and wire the window and renderer subsystems.
    /// The timer joins the list when [`run`](Self::run) supplies the tick
    /// callback.
    pub fn new(config: AppConfig) -> Result<Self> {
        // A host application may have installed its own logger already.
        let _ = env_logger::try_init();
        log::info!(
            "Creating application instance: '{}' at {}x{}, resizable={}",
            config.window.title,
            config.window.width,
            config.window.height,
            config.window.resizable
        );

        let sprites = Rc::new(RefCell::new(SpriteSet::new()));
        let textures = Rc::new(RefCell::new(TextureRegistry::new()));

        let (window, window_state) = WindowSubsystem::new(config.window);
        let renderer = Renderer::new(window_state.clone(), sprites.clone(), textures.clone());

        let mut engine = Engine::new();
        engine.add_subsystem(Box::new(window))?;
        engine.add_subsystem(Box::new(renderer))?;

        Ok(Self {
            engine,
            target_ups: config.target_ups,
            window_state,
            sprites,
            textures,
            ticks: TickCount::new(),
        })
    }

    /// The sprite collection; clone the handle into game logic.
    pub fn sprites(&self) -> Rc<RefCell<SpriteSet>> {
        self.sprites.clone()
    }

    /// The texture registry; register textures before `run`.
    pub fn textures(&self) -> Rc<RefCell<TextureRegistry>> {
        self.textures.clone()
    }

    /// Shared window state: clear colour, title, size, close requests.
    pub fn window(&self) -> Rc<RefCell<WindowState>> {
        self.window_state.clone()
    }

    /// Cumulative tick counter, usable from inside the tick callback.
    pub fn tick_count(&self) -> TickCount {
        self.ticks.clone()
    }

    /// Add the timer with the given tick callback and drive the engine
    /// through its full life-cycle. Blocks until shutdown.
    pub fn run(mut self, tick: impl FnMut() + 'static) -> Result<()> {
        let timer = Timer::with_tick_count(self.target_ups, Box::new(tick), self.ticks.clone());
        self.engine.add_subsystem(Box::new(timer))?;
        self.engine.run()
    }
}
