use super::lifecycle::{Lifecycle, LifecycleState};
use crate::device::GpuCtx;

/// A sampler binding. Samplers carry no host data; a dirty flag never causes an upload.
#[derive(Debug)]
pub struct SamplerResource {
    binding_type: wgpu::SamplerBindingType,
    address_mode: wgpu::AddressMode,
    sampler: Lifecycle<wgpu::Sampler>,
}

impl SamplerResource {
    pub fn new(binding_type: wgpu::SamplerBindingType) -> Self {
        Self {
            binding_type,
            address_mode: wgpu::AddressMode::ClampToEdge,
            sampler: Lifecycle::default(),
        }
    }

    /// Sets the address mode used on all three axes.
    pub fn with_address_mode(mut self, address_mode: wgpu::AddressMode) -> Self {
        self.address_mode = address_mode;
        self
    }

    pub fn binding_type(&self) -> wgpu::SamplerBindingType {
        self.binding_type
    }

    pub(super) fn state(&self) -> LifecycleState {
        self.sampler.state()
    }

    pub(super) fn binding_type_entry(&self) -> wgpu::BindingType {
        wgpu::BindingType::Sampler(self.binding_type)
    }

    pub(super) fn allocate(&mut self, ctx: &GpuCtx<'_>, label: &str) {
        // Non-filtering bindings reject samplers with linear filtering.
        let filter = match self.binding_type {
            wgpu::SamplerBindingType::Filtering => wgpu::FilterMode::Linear,
            _ => wgpu::FilterMode::Nearest,
        };
        let compare = match self.binding_type {
            wgpu::SamplerBindingType::Comparison => Some(wgpu::CompareFunction::LessEqual),
            _ => None,
        };

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: self.address_mode,
            address_mode_v: self.address_mode,
            address_mode_w: self.address_mode,
            mag_filter: filter,
            min_filter: filter,
            compare,
            ..Default::default()
        });

        self.sampler = Lifecycle::Allocated(sampler);
    }

    pub(super) fn binding_resource(&self) -> Option<wgpu::BindingResource<'_>> {
        self.sampler.get().map(wgpu::BindingResource::Sampler)
    }

    pub(super) fn dispose(&mut self) {
        drop(self.sampler.dispose());
    }
}
