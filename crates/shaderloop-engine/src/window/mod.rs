//! Window host for a render loop.
//!
//! Owns the `winit` event loop and a single window, and drives a
//! [`RenderLoop`](crate::run::RenderLoop) from window events.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, SetupCtx};
