use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use super::{FrameCtx, FrameHooks, LoopOptions};
use crate::device::{DrawTarget, Gpu};
use crate::geometry::Geometry;
use crate::pass::{RenderTarget, run_render_pass};
use crate::time::{FrameClock, FrameSchedule};

/// Lifecycle of one run. `Stopped` is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RunState {
    Idle,
    Running,
    Stopped,
}

/// Result of one [`RenderLoop::tick`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    Rendered,
    /// The fixed period has not elapsed yet.
    NotDue,
    /// The target had no drawable this time (e.g. a reconfigured surface).
    Skipped,
}

/// What a stopped run did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RunSummary {
    pub frames_rendered: u64,
    pub frames_skipped: u64,
    pub elapsed: Duration,
}

/// Drives a geometry and its shader through repeated frames on one target.
///
/// Each rendered frame: acquire the drawable, record a cleared render pass of
/// the geometry, run the frame hook, submit, present. The loop owns the device;
/// [`RenderLoop::stop`] releases every device object it knows of.
pub struct RenderLoop<T: DrawTarget, H: FrameHooks = ()> {
    gpu: Gpu,
    target: T,
    geometry: Geometry,
    hooks: H,
    options: LoopOptions,
    schedule: FrameSchedule,
    clock: Option<FrameClock>,
    state: RunState,
    started_at: Option<Instant>,
    skipped: u64,
}

impl<T: DrawTarget, H: FrameHooks> RenderLoop<T, H> {
    /// Creates an idle loop. Fails when the geometry has no shader.
    pub fn new(gpu: Gpu, target: T, geometry: Geometry, hooks: H, options: LoopOptions) -> Result<Self> {
        anyhow::ensure!(geometry.shader().is_some(), "geometry has no shader");
        let schedule = FrameSchedule::new(options.delay);

        Ok(Self {
            gpu,
            target,
            geometry,
            hooks,
            options,
            schedule,
            clock: None,
            state: RunState::Idle,
            started_at: None,
            skipped: 0,
        })
    }

    /// `Idle -> Running`. The first frame is due immediately.
    pub fn start(&mut self, now: Instant) -> Result<()> {
        anyhow::ensure!(
            self.state == RunState::Idle,
            "render loop cannot start from {:?}",
            self.state
        );
        self.schedule.start(now);
        self.clock = Some(FrameClock::new(now));
        self.started_at = Some(now);
        self.state = RunState::Running;

        let (width, height) = self.target.size();
        log::info!(
            "render loop started ({width}x{height}, {})",
            match self.schedule.period() {
                Some(period) => format!("every {period:?}"),
                None => "unscheduled".to_owned(),
            }
        );
        Ok(())
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.geometry
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn frames_rendered(&self) -> u64 {
        self.clock.as_ref().map_or(0, FrameClock::frames)
    }

    /// When the next frame is due, for loops with a fixed period.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            RunState::Running => self.schedule.next_deadline(),
            _ => None,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.target.resize(self.gpu.device(), width, height);
    }

    /// Renders a frame if one is due at `now`.
    ///
    /// Errors from the render pass or the frame hook are returned as-is; the
    /// loop keeps running and the next tick tries again.
    pub fn tick(&mut self, now: Instant) -> Result<FrameOutcome> {
        anyhow::ensure!(
            self.state == RunState::Running,
            "render loop is {:?}, not running",
            self.state
        );
        if !self.schedule.is_due(now) {
            return Ok(FrameOutcome::NotDue);
        }
        self.schedule.advance(now);
        self.render_frame(now)
    }

    fn render_frame(&mut self, now: Instant) -> Result<FrameOutcome> {
        let Some(drawable) = self.target.acquire(self.gpu.device())? else {
            self.skipped += 1;
            log::trace!("no drawable, frame skipped");
            return Ok(FrameOutcome::Skipped);
        };

        let time = self
            .clock
            .as_mut()
            .context("render loop has no clock")?
            .tick(now);
        log::trace!("frame {} (dt {:.4}s)", time.frame_index, time.dt);

        let ctx = self.gpu.ctx();
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("shaderloop frame encoder"),
            });

        let target = RenderTarget::clear(&drawable.view, self.target.format(), self.options.clear_color);
        run_render_pass(&mut encoder, &target, &ctx, &mut self.geometry)?;

        let mut frame = FrameCtx {
            gpu: ctx,
            encoder: &mut encoder,
            drawable: &drawable.texture,
            geometry: &mut self.geometry,
            time,
        };
        self.hooks.on_frame(&mut frame).context("frame hook failed")?;

        ctx.queue.submit(Some(encoder.finish()));
        self.target.present(drawable);
        Ok(FrameOutcome::Rendered)
    }

    /// Stops the run: calls the stop hook, disposes the geometry and its
    /// shader, and destroys the device. Stopping twice is an error.
    pub fn stop(&mut self) -> Result<RunSummary> {
        anyhow::ensure!(self.state != RunState::Stopped, "render loop already stopped");

        self.hooks.on_stop(self.gpu.ctx(), &mut self.geometry);
        if let Some(shader) = self.geometry.shader_mut() {
            shader.dispose();
        }
        self.geometry.dispose();
        self.gpu.destroy();
        self.state = RunState::Stopped;

        let summary = RunSummary {
            frames_rendered: self.frames_rendered(),
            frames_skipped: self.skipped,
            elapsed: self.started_at.map_or(Duration::ZERO, |t| t.elapsed()),
        };
        log::info!(
            "render loop stopped after {} frames ({} skipped)",
            summary.frames_rendered,
            summary.frames_skipped
        );
        Ok(summary)
    }
}

/// Creates a loop and starts it at `now`.
pub fn run_render_loop<T: DrawTarget, H: FrameHooks>(
    gpu: Gpu,
    target: T,
    geometry: Geometry,
    hooks: H,
    options: LoopOptions,
    now: Instant,
) -> Result<RenderLoop<T, H>> {
    let mut run = RenderLoop::new(gpu, target, geometry, hooks, options)?;
    run.start(now)?;
    Ok(run)
}
