//! Shaderloop engine crate.
//!
//! This crate turns shader source text plus a declared list of resources into a
//! working wgpu frame loop: lazily created device objects, dirty tracking,
//! bind-group derivation, render/compute passes and ping-pong buffering.

pub mod device;
pub mod geometry;
pub mod pass;
pub mod resource;
pub mod run;
pub mod shader;
pub mod time;
pub mod window;

pub mod logging;

#[cfg(test)]
pub(crate) mod test_gpu;
