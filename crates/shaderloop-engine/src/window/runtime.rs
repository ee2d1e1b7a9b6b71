use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::device::{DrawTarget, Gpu, GpuInit, SurfaceOptions, WindowSurface};
use crate::geometry::Geometry;
use crate::run::{FrameHooks, LoopOptions, RenderLoop};

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "shaderloop".to_string(),
            initial_size: LogicalSize::new(1024.0, 1024.0),
            resizable: true,
        }
    }
}

/// What the setup closure sees once the device and surface exist.
pub struct SetupCtx<'a> {
    pub gpu: &'a Gpu,
    /// Format of the window drawables; render pipelines target it.
    pub format: wgpu::TextureFormat,
    /// Drawable size in physical pixels.
    pub size: (u32, u32),
}

/// Entry point for windowed runs.
///
/// ```no_run
/// # use shaderloop_engine::{geometry::unit_quad, shader::Shader, window::Runtime};
/// Runtime::default()
///     .run(|_setup| Ok((unit_quad(Shader::default())?, ())))
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Runtime {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    surface: SurfaceOptions,
    options: LoopOptions,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_gpu_init(mut self, gpu_init: GpuInit) -> Self {
        self.gpu_init = gpu_init;
        self
    }

    pub fn with_surface_options(mut self, surface: SurfaceOptions) -> Self {
        self.surface = surface;
        self
    }

    pub fn with_loop_options(mut self, options: LoopOptions) -> Self {
        self.options = options;
        self
    }

    /// Opens the window, creates the device, calls `setup` for the geometry and
    /// hooks, and runs the loop until the window closes or Escape is pressed.
    ///
    /// Failures before the first frame (window, adapter, surface, `setup`) are
    /// returned. Per-frame errors are logged and the loop continues.
    pub fn run<S, H>(self, setup: S) -> Result<()>
    where
        S: FnOnce(&SetupCtx<'_>) -> Result<(Geometry, H)>,
        H: FrameHooks + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState {
            runtime: self,
            setup: Some(Box::new(move |ctx: &SetupCtx<'_>| -> Result<_> {
                let (geometry, hooks) = setup(ctx)?;
                Ok((geometry, Box::new(hooks) as Box<dyn FrameHooks>))
            })),
            entry: None,
            error: None,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

type Setup<'s> = Box<dyn FnOnce(&SetupCtx<'_>) -> Result<(Geometry, Box<dyn FrameHooks>)> + 's>;

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[not_covariant]
    run: RenderLoop<WindowSurface<'this>, Box<dyn FrameHooks>>,
}

struct AppState<'s> {
    runtime: Runtime,
    setup: Option<Setup<'s>>,
    entry: Option<WindowEntry>,
    error: Option<anyhow::Error>,
}

impl AppState<'_> {
    fn create_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let setup = self.setup.take().context("runtime setup already consumed")?;
        let config = &self.runtime.config;
        let attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(config.initial_size)
            .with_resizable(config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.runtime.gpu_init.clone();
        let surface_options = self.runtime.surface.clone();
        let loop_options = self.runtime.options.clone();

        WindowEntryTryBuilder {
            window,
            run_builder: |window| {
                start_loop(window, gpu_init, surface_options, loop_options, setup)
            },
        }
        .try_build()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error.get_or_insert(err);
        self.stop(event_loop);
    }

    /// Stops the run once and exits the event loop.
    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut entry) = self.entry.take() {
            if let Err(err) = entry.with_run_mut(|run| run.stop()) {
                log::error!("failed to stop render loop: {err:#}");
            }
        }
        event_loop.exit();
    }
}

/// Creates the device and surface for `window`, runs `setup` and starts the loop.
fn start_loop<'w>(
    window: &'w Window,
    gpu_init: GpuInit,
    surface_options: SurfaceOptions,
    loop_options: LoopOptions,
    setup: Setup<'_>,
) -> Result<RenderLoop<WindowSurface<'w>, Box<dyn FrameHooks>>> {
    let (gpu, surface) = pollster::block_on(Gpu::with_surface(window, gpu_init, surface_options))?;
    let ctx = SetupCtx {
        gpu: &gpu,
        format: surface.format(),
        size: surface.size(),
    };
    let (geometry, hooks) = setup(&ctx).context("setup failed")?;

    let mut run = RenderLoop::new(gpu, surface, geometry, hooks, loop_options)?;
    run.start(Instant::now())?;
    Ok(run)
}

impl ApplicationHandler for AppState<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.setup.is_none() {
            return;
        }

        match self.create_entry(event_loop) {
            Ok(entry) => {
                entry.with_window(|w| w.request_redraw());
                self.entry = Some(entry);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_ref() else { return };

        match entry.with_run(|run| run.next_deadline()) {
            Some(deadline) => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
                if Instant::now() >= deadline {
                    entry.with_window(|w| w.request_redraw());
                }
            }
            None => {
                // Unscheduled: continuous redraw.
                event_loop.set_control_flow(ControlFlow::Wait);
                entry.with_window(|w| w.request_redraw());
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(entry) = self.entry.as_mut() else { return };
        if entry.with_window(|w| w.id()) != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.stop(event_loop),

            WindowEvent::Resized(size) => {
                entry.with_run_mut(|run| run.resize(size.width, size.height));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = entry.with_window(|w| w.inner_size());
                entry.with_run_mut(|run| run.resize(size.width, size.height));
            }

            WindowEvent::RedrawRequested => {
                if let Err(err) = entry.with_run_mut(|run| run.tick(Instant::now())) {
                    log::error!("frame failed: {err:#}");
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.stop(event_loop);
    }
}
