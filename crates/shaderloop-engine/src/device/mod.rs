//! GPU device + drawable target management.
//!
//! This module is responsible for:
//! - creating the wgpu Adapter/Device/Queue (windowed or headless)
//! - creating & configuring the Surface (swapchain) behind a [`DrawTarget`]
//! - handing out one [`Drawable`] per frame and presenting it
//! - reading device buffers back to the host

mod error;
mod frame;
mod gpu;
mod init;
mod readback;
mod surface;
mod target;

pub use error::SurfaceErrorAction;
pub use frame::Drawable;
pub use gpu::{Gpu, GpuCtx};
pub use init::{GpuInit, SurfaceOptions};
pub use readback::{read_buffer, read_buffer_as};
pub use surface::WindowSurface;
pub use target::{DrawTarget, OffscreenTarget};
