use anyhow::Result;

use super::ctx::FrameCtx;
use crate::device::GpuCtx;
use crate::geometry::Geometry;

/// Caller code run by a [`RenderLoop`](super::RenderLoop).
pub trait FrameHooks {
    /// Called every rendered frame after the render pass was recorded and
    /// before the frame is submitted. Typically records a compute pass and
    /// swaps ping-pong buffers.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called once when the loop stops, before any device object is released.
    fn on_stop(&mut self, gpu: GpuCtx<'_>, geometry: &mut Geometry) {
        let _ = (gpu, geometry);
    }
}

/// No hooks.
impl FrameHooks for () {}

impl<H: FrameHooks + ?Sized> FrameHooks for Box<H> {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        (**self).on_frame(ctx)
    }

    fn on_stop(&mut self, gpu: GpuCtx<'_>, geometry: &mut Geometry) {
        (**self).on_stop(gpu, geometry)
    }
}

/// Hooks built from closures.
pub struct FnHooks<F, S = fn(GpuCtx<'_>, &mut Geometry)> {
    frame: F,
    stop: S,
}

impl<F> FnHooks<F>
where
    F: FnMut(&mut FrameCtx<'_>) -> Result<()>,
{
    pub fn new(frame: F) -> Self {
        Self {
            frame,
            stop: |_, _| {},
        }
    }
}

impl<F, S> FnHooks<F, S> {
    /// Replaces the stop hook.
    pub fn with_stop<S2>(self, stop: S2) -> FnHooks<F, S2>
    where
        S2: FnMut(GpuCtx<'_>, &mut Geometry),
    {
        FnHooks {
            frame: self.frame,
            stop,
        }
    }
}

impl<F, S> FrameHooks for FnHooks<F, S>
where
    F: FnMut(&mut FrameCtx<'_>) -> Result<()>,
    S: FnMut(GpuCtx<'_>, &mut Geometry),
{
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        (self.frame)(ctx)
    }

    fn on_stop(&mut self, gpu: GpuCtx<'_>, geometry: &mut Geometry) {
        (self.stop)(gpu, geometry)
    }
}

/// Shorthand for [`FnHooks::new`].
pub fn on_frame<F>(frame: F) -> FnHooks<F>
where
    F: FnMut(&mut FrameCtx<'_>) -> Result<()>,
{
    FnHooks::new(frame)
}
