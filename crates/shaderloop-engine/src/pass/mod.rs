//! Render and compute pass recording.
//!
//! Pipelines are built on every call from the shader's cached module and bind
//! group layout; only the device objects owned by resources, shaders and
//! geometries are cached.

mod compute;
mod render;

pub use compute::{WorkgroupCount, run_compute_pass};
pub use render::{RenderTarget, run_render_pass};
