//! glint2d
//!
//! A minimal 2D sprite engine. The engine owns the frame loop and drives an
//! ordered list of subsystems (window, renderer, timer) through an
//! init/start/update/shutdown life-cycle. Game logic runs inside a
//! fixed-timestep tick callback and mutates named sprites; each frame the
//! renderer composites every visible sprite into the window with one draw
//! call per sprite.
//!
//! High-level modules
//! - `app`: embedding surface wiring the standard subsystem trio
//! - `context`: GPU context owning device/queue/surface
//! - `engine`: the life-cycle driver and the `Subsystem` contract
//! - `graphics`: texture registry, GPU textures, the sprite pipeline and renderer
//! - `sprite`: sprite and bounding-box data model plus the sprite collection
//! - `timer`: fixed-timestep scheduler with FPS/UPS reporting
//! - `window`: winit-backed window subsystem and shared window state
//!

pub mod app;
pub mod context;
pub mod engine;
pub mod graphics;
pub mod sprite;
pub mod timer;
pub mod window;

// Re-exports commonly used types for convenience in downstream code.
pub use crate::app::{App, AppConfig};
pub use crate::engine::{Engine, EngineState, Flow, Subsystem};
pub use crate::graphics::registry::TextureRegistry;
pub use crate::graphics::renderer::Renderer;
pub use crate::sprite::aabb::Aabb;
pub use crate::sprite::set::SpriteSet;
pub use crate::sprite::sprite::Sprite;
pub use crate::timer::{TickCount, Timer};
pub use crate::window::{WindowConfig, WindowSubsystem};
pub use cgmath::Vector2;
pub use wgpu::Color;
