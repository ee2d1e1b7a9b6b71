use anyhow::{Context, Result};

use crate::device::GpuCtx;
use crate::geometry::Geometry;
use crate::pass::{WorkgroupCount, run_compute_pass};
use crate::shader::Shader;
use crate::time::FrameTime;

/// Per-frame context handed to [`FrameHooks::on_frame`](super::FrameHooks::on_frame).
///
/// The encoder already holds this frame's render pass; anything recorded here
/// runs after it, in the same submission.
pub struct FrameCtx<'a> {
    pub gpu: GpuCtx<'a>,
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// Texture the frame was rendered into.
    pub drawable: &'a wgpu::Texture,
    pub geometry: &'a mut Geometry,
    pub time: FrameTime,
}

impl FrameCtx<'_> {
    /// The shader drawing the loop's geometry.
    pub fn shader_mut(&mut self) -> Result<&mut Shader> {
        self.geometry.shader_mut().context("geometry has no shader")
    }

    /// Dispatches the geometry shader's compute entry point.
    pub fn run_compute(&mut self, count: impl Into<WorkgroupCount>) -> Result<()> {
        let shader = self.geometry.shader_mut().context("geometry has no shader")?;
        run_compute_pass(self.encoder, &self.gpu, shader, count)
    }

    /// Exchanges the ping-pong roles of the geometry shader.
    pub fn swap_buffers(&mut self) -> Result<()> {
        self.shader_mut()?.swap_buffers()
    }
}
