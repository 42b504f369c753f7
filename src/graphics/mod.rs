//! GPU rendering path: texture registry, textures, pipeline and renderer.
//!
//! - `registry` holds the two-phase texture registry (register now, load at
//!   renderer init) and the per-pixel transparency masks
//! - `texture` creates GPU textures with nearest filtering, edge clamping
//!   and a full mip chain
//! - `pipeline` builds the shared sprite pipeline, bind group layouts and
//!   the unit quad
//! - `renderer` is the subsystem compositing every visible sprite each frame

pub mod pipeline;
pub mod registry;
pub mod renderer;
pub mod texture;
