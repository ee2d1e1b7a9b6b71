use anyhow::Result;

use super::{Drawable, Gpu};

/// Something a render loop can draw a frame into.
///
/// Implemented by [`WindowSurface`](super::WindowSurface) for on-screen runs and by
/// [`OffscreenTarget`] for headless runs.
pub trait DrawTarget {
    /// Color format of the drawables handed out by [`DrawTarget::acquire`].
    fn format(&self) -> wgpu::TextureFormat;

    /// Current drawable size in physical pixels.
    fn size(&self) -> (u32, u32);

    /// Acquires the drawable for the next frame.
    ///
    /// `Ok(None)` means the frame should be skipped (transient surface condition).
    fn acquire(&mut self, device: &wgpu::Device) -> Result<Option<Drawable>>;

    /// Presents a drawable whose commands have been submitted.
    fn present(&mut self, drawable: Drawable);

    /// Resizes the target. Targets with a fixed size ignore this.
    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let _ = (device, width, height);
    }
}

/// A fixed-size texture used as the drawable for headless runs.
pub struct OffscreenTarget {
    texture: wgpu::Texture,
}

impl OffscreenTarget {
    /// Default format for off-screen rendering.
    pub const DEFAULT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new(gpu: &Gpu, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("shaderloop offscreen target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        Self { texture }
    }

    /// The texture every frame renders into.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

impl DrawTarget for OffscreenTarget {
    fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }

    fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }

    fn acquire(&mut self, _device: &wgpu::Device) -> Result<Option<Drawable>> {
        Ok(Some(Drawable::from_texture(&self.texture)))
    }

    fn present(&mut self, drawable: Drawable) {
        drawable.present();
    }
}
