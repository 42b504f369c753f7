//! Sprite data model: bounding boxes, sprites, and the sprite collection.
//!
//! - `aabb` is the pure geometry value type (absolute centre, unscaled size,
//!   scale factor, derived edges and corners)
//! - `sprite` combines a texture reference with geometry, rotation,
//!   visibility and opacity
//! - `set` is the ordered, mutable registry of all live sprites

pub mod aabb;
pub mod set;
pub mod sprite;
