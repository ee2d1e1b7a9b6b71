use anyhow::{Context, Result};
use winit::window::Window;

use super::{GpuInit, SurfaceOptions, WindowSurface};

/// Owns the wgpu adapter, logical device and queue.
///
/// This type is the low-level execution context:
/// - selects an adapter (optionally compatible with a window surface)
/// - creates and stores Device/Queue
/// - releases every device object on [`Gpu::destroy`]
///
/// A `Gpu` is exclusively owned by one simulation run.
pub struct Gpu {
    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,
}

/// Borrowed device + queue pair handed to resources, passes and frame hooks.
#[derive(Clone, Copy)]
pub struct GpuCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
}

impl<'a> GpuCtx<'a> {
    #[inline]
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

impl Gpu {
    /// Creates a GPU context without any drawable surface.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu; callers on a plain
    /// thread typically wrap this in `pollster::block_on`.
    pub async fn headless(init: GpuInit) -> Result<Self> {
        let instance = new_instance();
        let adapter = request_adapter(&instance, &init, None).await?;
        Self::from_adapter(adapter, init).await
    }

    /// Creates a GPU context together with a configured surface bound to `window`.
    ///
    /// Fails before any device work if the window has a zero-sized drawable area,
    /// no surface can be created, or no adapter can present to it.
    pub async fn with_surface<'w>(
        window: &'w Window,
        init: GpuInit,
        options: SurfaceOptions,
    ) -> Result<(Self, WindowSurface<'w>)> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = new_instance();

        // Surface lifetime is tied to `window` via `'w`.
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = request_adapter(&instance, &init, Some(&surface)).await?;
        let gpu = Self::from_adapter(adapter, init).await?;
        let target = WindowSurface::configure(surface, &gpu, options, (size.width, size.height))?;

        Ok((gpu, target))
    }

    async fn from_adapter(adapter: wgpu::Adapter, init: GpuInit) -> Result<Self> {
        let info = adapter.get_info();
        log::info!("using adapter `{}` ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("shaderloop device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }

    /// Returns the selected adapter.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Borrows device + queue as a [`GpuCtx`].
    pub fn ctx(&self) -> GpuCtx<'_> {
        GpuCtx::new(&self.device, &self.queue)
    }

    /// Destroys the device. Every object created from it becomes invalid.
    pub fn destroy(&self) {
        log::debug!("destroying device");
        self.device.destroy();
    }
}

fn new_instance() -> wgpu::Instance {
    // Use all backends to allow wgpu to select the optimal platform backend.
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

async fn request_adapter(
    instance: &wgpu::Instance,
    init: &GpuInit,
    compatible_surface: Option<&wgpu::Surface<'_>>,
) -> Result<wgpu::Adapter> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: init.power_preference,
            compatible_surface,
            force_fallback_adapter: init.force_fallback_adapter,
        })
        .await
        .context("failed to find a suitable GPU adapter")
}
