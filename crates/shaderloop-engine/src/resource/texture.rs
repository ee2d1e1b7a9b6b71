use anyhow::Result;

use super::lifecycle::{Lifecycle, LifecycleState};
use super::HostData;
use crate::device::GpuCtx;

/// Creation parameters for a 2D texture resource.
#[derive(Debug, Clone)]
pub struct TextureOptions {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    /// Components per texel in `data` (4 for RGBA).
    pub pixel_size: u32,
    pub sample_type: wgpu::TextureSampleType,
    pub view_dimension: wgpu::TextureViewDimension,
    pub usage: wgpu::TextureUsages,
    pub data: HostData,
}

impl TextureOptions {
    pub fn new_2d(
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        data: impl Into<HostData>,
    ) -> Self {
        Self {
            width,
            height,
            format,
            pixel_size: 4,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            data: data.into(),
        }
    }

    pub fn with_sample_type(mut self, sample_type: wgpu::TextureSampleType) -> Self {
        self.sample_type = sample_type;
        self
    }

    pub fn with_pixel_size(mut self, pixel_size: u32) -> Self {
        self.pixel_size = pixel_size;
        self
    }

    /// Adds usages on top of `TEXTURE_BINDING | COPY_DST`.
    pub fn with_extra_usage(mut self, usage: wgpu::TextureUsages) -> Self {
        self.usage |= usage;
        self
    }

    fn bytes_per_row(&self) -> u32 {
        self.width * self.pixel_size * self.data.element_size() as u32
    }

    fn ensure_data_covers(&self, label: &str) -> Result<()> {
        let needed = self.bytes_per_row() as usize * self.height as usize;
        anyhow::ensure!(
            self.data.byte_len() >= needed,
            "texture resource `{label}` holds {} bytes, {}x{} needs {needed}",
            self.data.byte_len(),
            self.width,
            self.height
        );
        Ok(())
    }

    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

#[derive(Debug)]
pub(super) struct DeviceTexture {
    pub(super) texture: wgpu::Texture,
    pub(super) view: wgpu::TextureView,
}

/// A sampled 2D texture with host-side texel data.
#[derive(Debug)]
pub struct TextureResource {
    options: TextureOptions,
    texture: Lifecycle<DeviceTexture>,
}

impl TextureResource {
    pub fn new(options: TextureOptions) -> Self {
        Self {
            options,
            texture: Lifecycle::default(),
        }
    }

    pub fn options(&self) -> &TextureOptions {
        &self.options
    }

    pub(super) fn data_mut(&mut self) -> &mut HostData {
        &mut self.options.data
    }

    pub fn texture(&self) -> Option<&wgpu::Texture> {
        self.texture.get().map(|t| &t.texture)
    }

    pub(super) fn state(&self) -> LifecycleState {
        self.texture.state()
    }

    pub(super) fn binding_type_entry(&self) -> wgpu::BindingType {
        wgpu::BindingType::Texture {
            sample_type: self.options.sample_type,
            view_dimension: self.options.view_dimension,
            multisampled: false,
        }
    }

    pub(super) fn allocate(&mut self, ctx: &GpuCtx<'_>, label: &str) -> Result<()> {
        let o = &self.options;
        anyhow::ensure!(
            o.width > 0 && o.height > 0,
            "texture resource `{label}` has zero size ({}x{})",
            o.width,
            o.height
        );
        o.ensure_data_covers(label)?;

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: o.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: o.format,
            usage: o.usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(o.view_dimension),
            ..Default::default()
        });

        self.texture = Lifecycle::Allocated(DeviceTexture { texture, view });
        self.upload(ctx, label)?;
        Ok(())
    }

    pub(super) fn upload(&self, ctx: &GpuCtx<'_>, label: &str) -> Result<bool> {
        let Some(device) = self.texture.get() else { return Ok(false) };
        let o = &self.options;
        o.ensure_data_covers(label)?;
        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &device.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            o.data.bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(o.bytes_per_row()),
                rows_per_image: Some(o.height),
            },
            o.extent(),
        );
        Ok(true)
    }

    pub(super) fn binding_resource(&self) -> Option<wgpu::BindingResource<'_>> {
        self.texture
            .get()
            .map(|t| wgpu::BindingResource::TextureView(&t.view))
    }

    pub(super) fn dispose(&mut self) {
        if let Some(device) = self.texture.dispose() {
            device.texture.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_pitch_counts_components_and_element_width() {
        let bytes = TextureOptions::new_2d(8, 2, wgpu::TextureFormat::Rgba8Unorm, vec![0u8; 64]);
        assert_eq!(bytes.bytes_per_row(), 32);

        let floats =
            TextureOptions::new_2d(8, 2, wgpu::TextureFormat::Rgba32Float, vec![0.0f32; 64]);
        assert_eq!(floats.bytes_per_row(), 128);
    }

    #[test]
    fn short_data_is_rejected() {
        let short = TextureOptions::new_2d(4, 4, wgpu::TextureFormat::Rgba8Unorm, vec![0u8; 60]);
        assert!(short.ensure_data_covers("short").is_err());

        let exact = TextureOptions::new_2d(4, 4, wgpu::TextureFormat::Rgba8Unorm, vec![0u8; 64]);
        assert!(exact.ensure_data_covers("exact").is_ok());
    }
}
