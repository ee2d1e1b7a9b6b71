//! Bindable device resources.
//!
//! A [`Resource`] couples one device object (buffer, sampler or texture) with
//! its binding slot, stage visibility and a dirty flag. The device object is
//! created on the first [`Resource::acquire`] and reused afterwards; host-side
//! edits become visible to the device only through the next acquire.

mod buffer;
mod data;
mod lifecycle;
mod sampler;
mod texture;

pub use buffer::BufferResource;
pub use data::HostData;
pub use lifecycle::LifecycleState;
pub use sampler::SamplerResource;
pub use texture::{TextureOptions, TextureResource};

pub(crate) use lifecycle::Lifecycle;

use anyhow::{Context, Result};

use crate::device::GpuCtx;

/// Binding slot, stage visibility and debug label shared by every resource kind.
#[derive(Debug, Clone)]
pub struct BindingDesc {
    pub label: String,
    pub binding: u32,
    pub visibility: wgpu::ShaderStages,
}

impl BindingDesc {
    pub fn new(binding: u32, visibility: wgpu::ShaderStages) -> Self {
        Self {
            label: format!("binding {binding}"),
            binding,
            visibility,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Device traffic performed by one resource.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct ResourceStats {
    /// Device objects created (the initial upload is part of the allocation).
    pub allocations: u32,
    /// Dirty re-uploads into an existing device object.
    pub uploads: u32,
}

/// Variant payload of a [`Resource`].
#[derive(Debug)]
pub enum ResourceKind {
    Buffer(BufferResource),
    Sampler(SamplerResource),
    Texture(TextureResource),
}

/// Layout entry and binding produced by [`Resource::acquire`].
pub struct Acquired<'a> {
    pub layout: wgpu::BindGroupLayoutEntry,
    pub resource: wgpu::BindingResource<'a>,
}

#[derive(Debug)]
pub struct Resource {
    desc: BindingDesc,
    kind: ResourceKind,
    layout: Option<wgpu::BindGroupLayoutEntry>,
    needs_update: bool,
    stats: ResourceStats,
}

impl Resource {
    pub fn new(desc: BindingDesc, kind: ResourceKind) -> Self {
        Self {
            desc,
            kind,
            layout: None,
            needs_update: false,
            stats: ResourceStats::default(),
        }
    }

    /// Uniform buffer holding `data`.
    pub fn uniform(desc: BindingDesc, data: impl Into<HostData>) -> Self {
        Self::new(
            desc,
            ResourceKind::Buffer(BufferResource::new(
                data,
                wgpu::BufferBindingType::Uniform,
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            )),
        )
    }

    /// Storage buffer holding `data`. Storage buffers are copyable in both
    /// directions so their contents can be read back.
    pub fn storage(desc: BindingDesc, data: impl Into<HostData>, read_only: bool) -> Self {
        Self::new(
            desc,
            ResourceKind::Buffer(BufferResource::new(
                data,
                wgpu::BufferBindingType::Storage { read_only },
                wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
            )),
        )
    }

    pub fn sampler(desc: BindingDesc, binding_type: wgpu::SamplerBindingType) -> Self {
        Self::new(desc, ResourceKind::Sampler(SamplerResource::new(binding_type)))
    }

    pub fn texture(desc: BindingDesc, options: TextureOptions) -> Self {
        Self::new(desc, ResourceKind::Texture(TextureResource::new(options)))
    }

    pub fn desc(&self) -> &BindingDesc {
        &self.desc
    }

    pub fn binding(&self) -> u32 {
        self.desc.binding
    }

    pub fn label(&self) -> &str {
        &self.desc.label
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    pub fn stats(&self) -> ResourceStats {
        self.stats
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Flags the host data for re-upload on the next acquire.
    pub fn mark_needs_update(&mut self) {
        self.needs_update = true;
    }

    pub fn state(&self) -> LifecycleState {
        match &self.kind {
            ResourceKind::Buffer(b) => b.state(),
            ResourceKind::Sampler(s) => s.state(),
            ResourceKind::Texture(t) => t.state(),
        }
    }

    /// Bind-group layout entry derived from the declaration alone.
    pub fn layout_entry(&self) -> wgpu::BindGroupLayoutEntry {
        let ty = match &self.kind {
            ResourceKind::Buffer(b) => b.binding_type_entry(),
            ResourceKind::Sampler(s) => s.binding_type_entry(),
            ResourceKind::Texture(t) => t.binding_type_entry(),
        };
        wgpu::BindGroupLayoutEntry {
            binding: self.desc.binding,
            visibility: self.desc.visibility,
            ty,
            count: None,
        }
    }

    /// Host data behind a buffer or texture; `None` for samplers.
    pub fn data(&self) -> Option<&HostData> {
        match &self.kind {
            ResourceKind::Buffer(b) => Some(b.data()),
            ResourceKind::Texture(t) => Some(&t.options().data),
            ResourceKind::Sampler(_) => None,
        }
    }

    /// Mutable host data; marks the resource dirty.
    ///
    /// The element count must stay the same: device buffers are fixed-size and
    /// the next acquire rejects a resized array.
    pub fn data_mut(&mut self) -> Option<&mut HostData> {
        let data = host_data_mut(&mut self.kind)?;
        self.needs_update = true;
        Some(data)
    }

    /// Writes `values` into an `f32` host array starting at element `offset`.
    ///
    /// A rejected write leaves both the data and the dirty flag untouched.
    pub fn write_f32(&mut self, offset: usize, values: &[f32]) -> Result<()> {
        let label = &self.desc.label;
        let dst = host_data_mut(&mut self.kind)
            .and_then(HostData::as_f32_mut)
            .with_context(|| format!("resource `{label}` does not hold f32 data"))?;
        let len = dst.len();
        let end = offset
            .checked_add(values.len())
            .filter(|&end| end <= len)
            .with_context(|| {
                format!("write of {} values at {offset} overruns `{label}` ({len} elements)", values.len())
            })?;
        dst[offset..end].copy_from_slice(values);
        self.needs_update = true;
        Ok(())
    }

    pub fn read_f32(&self, index: usize) -> Option<f32> {
        self.data()?.as_f32()?.get(index).copied()
    }

    /// Device buffer of a buffer resource, once allocated.
    pub fn device_buffer(&self) -> Option<&wgpu::Buffer> {
        match &self.kind {
            ResourceKind::Buffer(b) => b.buffer(),
            _ => None,
        }
    }

    /// Device texture of a texture resource, once allocated.
    pub fn device_texture(&self) -> Option<&wgpu::Texture> {
        match &self.kind {
            ResourceKind::Texture(t) => t.texture(),
            _ => None,
        }
    }

    /// Allocates the device object on first use, or re-uploads dirty host data.
    pub(crate) fn prepare(&mut self, ctx: &GpuCtx<'_>) -> Result<()> {
        let label = self.desc.label.as_str();
        match self.state() {
            LifecycleState::Disposed => {
                anyhow::bail!("resource `{label}` was disposed")
            }
            LifecycleState::Unallocated => {
                match &mut self.kind {
                    ResourceKind::Buffer(b) => b.allocate(ctx, label)?,
                    ResourceKind::Sampler(s) => s.allocate(ctx, label),
                    ResourceKind::Texture(t) => t.allocate(ctx, label)?,
                }
                self.stats.allocations += 1;
                log::debug!("allocated resource `{label}` at binding {}", self.desc.binding);
            }
            LifecycleState::Allocated if self.needs_update => {
                let uploaded = match &self.kind {
                    ResourceKind::Buffer(b) => b.upload(ctx, label)?,
                    ResourceKind::Texture(t) => t.upload(ctx, label)?,
                    ResourceKind::Sampler(_) => false,
                };
                if uploaded {
                    self.stats.uploads += 1;
                    log::trace!("re-uploaded resource `{label}`");
                }
            }
            LifecycleState::Allocated => {}
        }

        self.needs_update = false;
        if self.layout.is_none() {
            self.layout = Some(self.layout_entry());
        }
        Ok(())
    }

    /// Binding for an allocated resource.
    pub fn binding_resource(&self) -> Option<wgpu::BindingResource<'_>> {
        match &self.kind {
            ResourceKind::Buffer(b) => b.binding_resource(),
            ResourceKind::Sampler(s) => s.binding_resource(),
            ResourceKind::Texture(t) => t.binding_resource(),
        }
    }

    /// Creates the device object if needed, flushes dirty host data, and returns
    /// the cached layout entry with the binding.
    pub fn acquire(&mut self, ctx: &GpuCtx<'_>) -> Result<Acquired<'_>> {
        self.prepare(ctx)?;
        let layout = self.layout.unwrap_or_else(|| self.layout_entry());
        let resource = self
            .binding_resource()
            .ok_or_else(|| anyhow::anyhow!("resource `{}` has no device object", self.desc.label))?;
        Ok(Acquired { layout, resource })
    }

    /// Releases the device object. Safe to call more than once.
    pub fn dispose(&mut self) {
        match &mut self.kind {
            ResourceKind::Buffer(b) => b.dispose(),
            ResourceKind::Sampler(s) => s.dispose(),
            ResourceKind::Texture(t) => t.dispose(),
        }
        self.layout = None;
        self.needs_update = false;
    }
}

fn host_data_mut(kind: &mut ResourceKind) -> Option<&mut HostData> {
    match kind {
        ResourceKind::Buffer(b) => Some(b.data_mut()),
        ResourceKind::Texture(t) => Some(t.data_mut()),
        ResourceKind::Sampler(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_gpu;

    fn uniform() -> Resource {
        Resource::uniform(
            BindingDesc::new(0, wgpu::ShaderStages::FRAGMENT).with_label("params"),
            vec![0.0f32, 0.0, 1.0, 64.0],
        )
    }

    #[test]
    fn layout_entry_follows_declaration() {
        let entry = Resource::storage(
            BindingDesc::new(3, wgpu::ShaderStages::COMPUTE),
            vec![0u32; 4],
            true,
        )
        .layout_entry();

        assert_eq!(entry.binding, 3);
        assert_eq!(entry.visibility, wgpu::ShaderStages::COMPUTE);
        assert!(matches!(
            entry.ty,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                ..
            }
        ));

        let sampler = Resource::sampler(
            BindingDesc::new(1, wgpu::ShaderStages::FRAGMENT),
            wgpu::SamplerBindingType::NonFiltering,
        );
        assert!(matches!(
            sampler.layout_entry().ty,
            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering)
        ));
        assert!(sampler.data().is_none());
    }

    #[test]
    fn host_writes_mark_dirty() {
        let mut res = uniform();
        assert!(!res.needs_update());

        res.write_f32(2, &[2.5]).unwrap();
        assert!(res.needs_update());
        assert_eq!(res.read_f32(2), Some(2.5));

        assert!(res.write_f32(3, &[1.0, 2.0]).is_err());
    }

    #[test]
    fn rejected_write_keeps_resource_clean() {
        let mut res = Resource::uniform(
            BindingDesc::new(0, wgpu::ShaderStages::FRAGMENT),
            vec![0.0f32; 2],
        );

        assert!(res.write_f32(1, &[1.0, 2.0]).is_err());
        assert!(res.write_f32(usize::MAX, &[1.0]).is_err());
        assert!(!res.needs_update());
        assert_eq!(res.data().and_then(HostData::as_f32), Some(&[0.0f32, 0.0][..]));

        res.write_f32(1, &[3.0]).unwrap();
        assert!(res.needs_update());
    }

    #[test]
    fn non_float_write_is_rejected() {
        let mut res = Resource::storage(
            BindingDesc::new(0, wgpu::ShaderStages::COMPUTE),
            vec![0u32; 4],
            false,
        );
        assert!(res.write_f32(0, &[1.0]).is_err());
    }

    #[test]
    fn second_acquire_reuses_device_object() {
        let Some(gpu) = test_gpu::headless() else { return };
        let ctx = gpu.ctx();
        let mut res = uniform();

        res.acquire(&ctx).unwrap();
        res.acquire(&ctx).unwrap();
        assert_eq!(res.stats(), ResourceStats { allocations: 1, uploads: 0 });
        assert_eq!(res.state(), LifecycleState::Allocated);
    }

    #[test]
    fn dirty_acquire_uploads_without_reallocating() {
        let Some(gpu) = test_gpu::headless() else { return };
        let ctx = gpu.ctx();
        let mut res = uniform();

        res.acquire(&ctx).unwrap();
        res.write_f32(0, &[0.25, -0.5]).unwrap();
        res.acquire(&ctx).unwrap();
        assert_eq!(res.stats(), ResourceStats { allocations: 1, uploads: 1 });
        assert!(!res.needs_update());
    }

    #[test]
    fn resized_buffer_is_rejected_on_upload() {
        let Some(gpu) = test_gpu::headless() else { return };
        let ctx = gpu.ctx();
        let mut res = uniform();

        res.acquire(&ctx).unwrap();
        if let Some(data) = res.data_mut() {
            *data = HostData::from(vec![0.0f32; 8]);
        }
        assert!(res.acquire(&ctx).is_err());
    }

    #[test]
    fn dispose_is_idempotent_and_terminal() {
        let Some(gpu) = test_gpu::headless() else { return };
        let ctx = gpu.ctx();
        let mut res = uniform();

        res.acquire(&ctx).unwrap();
        res.dispose();
        res.dispose();
        assert_eq!(res.state(), LifecycleState::Disposed);
        assert!(res.device_buffer().is_none());
        assert!(res.acquire(&ctx).is_err());
    }

    #[test]
    fn texture_and_sampler_allocate_once() {
        let Some(gpu) = test_gpu::headless() else { return };
        let ctx = gpu.ctx();
        let mut texture = Resource::texture(
            BindingDesc::new(0, wgpu::ShaderStages::FRAGMENT),
            TextureOptions::new_2d(4, 4, wgpu::TextureFormat::Rgba8Unorm, vec![255u8; 64]),
        );
        let mut sampler = Resource::sampler(
            BindingDesc::new(1, wgpu::ShaderStages::FRAGMENT),
            wgpu::SamplerBindingType::NonFiltering,
        );

        texture.acquire(&ctx).unwrap();
        sampler.acquire(&ctx).unwrap();
        sampler.mark_needs_update();
        sampler.acquire(&ctx).unwrap();

        assert!(texture.device_texture().is_some());
        assert_eq!(texture.stats().allocations, 1);
        assert_eq!(sampler.stats(), ResourceStats { allocations: 1, uploads: 0 });
    }
}
