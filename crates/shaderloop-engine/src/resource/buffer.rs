use anyhow::Result;

use super::data::padded_size;
use super::lifecycle::{Lifecycle, LifecycleState};
use super::HostData;
use crate::device::GpuCtx;

/// A fixed-size buffer bound as a uniform or storage buffer.
///
/// The host array is sized at construction; a different size requires a new
/// resource.
#[derive(Debug)]
pub struct BufferResource {
    data: HostData,
    binding_type: wgpu::BufferBindingType,
    usage: wgpu::BufferUsages,
    buffer: Lifecycle<wgpu::Buffer>,
}

impl BufferResource {
    pub fn new(
        data: impl Into<HostData>,
        binding_type: wgpu::BufferBindingType,
        usage: wgpu::BufferUsages,
    ) -> Self {
        Self {
            data: data.into(),
            binding_type,
            usage,
            buffer: Lifecycle::default(),
        }
    }

    pub fn data(&self) -> &HostData {
        &self.data
    }

    pub(super) fn data_mut(&mut self) -> &mut HostData {
        &mut self.data
    }

    pub fn binding_type(&self) -> wgpu::BufferBindingType {
        self.binding_type
    }

    pub fn usage(&self) -> wgpu::BufferUsages {
        self.usage
    }

    /// The device buffer, once allocated.
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.get()
    }

    pub(super) fn state(&self) -> LifecycleState {
        self.buffer.state()
    }

    pub(super) fn binding_type_entry(&self) -> wgpu::BindingType {
        wgpu::BindingType::Buffer {
            ty: self.binding_type,
            has_dynamic_offset: false,
            min_binding_size: None,
        }
    }

    pub(super) fn allocate(&mut self, ctx: &GpuCtx<'_>, label: &str) -> Result<()> {
        anyhow::ensure!(
            !self.data.is_empty(),
            "buffer resource `{label}` has no backing data"
        );
        anyhow::ensure!(
            self.usage.contains(wgpu::BufferUsages::COPY_DST),
            "buffer resource `{label}` needs COPY_DST usage to receive host data"
        );

        let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: padded_size(self.data.byte_len() as u64),
            usage: self.usage,
            mapped_at_creation: false,
        });
        ctx.queue.write_buffer(&buffer, 0, &self.data.padded_bytes());

        self.buffer = Lifecycle::Allocated(buffer);
        Ok(())
    }

    /// Rewrites the host array into the existing buffer. Returns `false` when
    /// nothing is allocated yet.
    pub(super) fn upload(&self, ctx: &GpuCtx<'_>, label: &str) -> Result<bool> {
        let Some(buffer) = self.buffer.get() else { return Ok(false) };
        let bytes = self.data.padded_bytes();
        anyhow::ensure!(
            bytes.len() as u64 == buffer.size(),
            "buffer resource `{label}` changed size ({} -> {} bytes); create a new resource instead",
            buffer.size(),
            bytes.len()
        );
        ctx.queue.write_buffer(buffer, 0, &bytes);
        Ok(true)
    }

    pub(super) fn binding_resource(&self) -> Option<wgpu::BindingResource<'_>> {
        self.buffer.get().map(wgpu::Buffer::as_entire_binding)
    }

    pub(super) fn dispose(&mut self) {
        if let Some(buffer) = self.buffer.dispose() {
            buffer.destroy();
        }
    }
}
