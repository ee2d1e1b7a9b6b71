use anyhow::{Context, Result};

use super::{Drawable, DrawTarget, Gpu, SurfaceErrorAction, SurfaceOptions};

/// A window swapchain used as the loop's drawable target.
pub struct WindowSurface<'w> {
    /// Surface bound to the window.
    ///
    /// Surface lifetime is tied to the window; the window must outlive this value.
    surface: wgpu::Surface<'w>,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,
}

impl<'w> WindowSurface<'w> {
    pub(crate) fn configure(
        surface: wgpu::Surface<'w>,
        gpu: &Gpu,
        options: SurfaceOptions,
        (width, height): (u32, u32),
    ) -> Result<Self> {
        let caps = surface.get_capabilities(gpu.adapter());
        let format = choose_surface_format(&caps, options.prefer_srgb)
            .context("no supported surface formats")?;
        anyhow::ensure!(
            caps.usages.contains(options.usage),
            "surface does not support usage {:?} (supported: {:?})",
            options.usage,
            caps.usages
        );

        let config = wgpu::SurfaceConfiguration {
            usage: options.usage,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: options.present_mode,
            alpha_mode: choose_alpha_mode(&caps, options.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: options.desired_maximum_frame_latency,
        };

        surface.configure(gpu.device(), &config);
        log::debug!(
            "surface configured: {}x{} {:?} {:?}",
            config.width,
            config.height,
            config.format,
            config.alpha_mode
        );

        Ok(Self { surface, config })
    }

    /// Returns the active surface configuration.
    pub fn config(&self) -> &wgpu::SurfaceConfiguration {
        &self.config
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(
        &self,
        device: &wgpu::Device,
        err: wgpu::SurfaceError,
    ) -> SurfaceErrorAction {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                self.surface.configure(device, &self.config);
                SurfaceErrorAction::Reconfigured
            }
            wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
            wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

impl DrawTarget for WindowSurface<'_> {
    fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn acquire(&mut self, device: &wgpu::Device) -> Result<Option<Drawable>> {
        match self.surface.get_current_texture() {
            Ok(surface_texture) => Ok(Some(Drawable::from_surface(surface_texture))),
            Err(err) => {
                let message = err.to_string();
                match self.handle_surface_error(device, err) {
                    SurfaceErrorAction::Fatal => {
                        anyhow::bail!("failed to acquire surface texture: {message}")
                    }
                    action => {
                        log::warn!("surface error: {message}; {action:?}");
                        Ok(None)
                    }
                }
            }
        }
    }

    fn present(&mut self, drawable: Drawable) {
        drawable.present();
    }

    /// wgpu does not support configuring a surface with a 0x0 size; in that case
    /// configuration is deferred until the next non-empty resize.
    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(device, &self.config);
    }
}

fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    caps.formats.first().copied()
}

fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}
