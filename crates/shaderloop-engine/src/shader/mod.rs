//! Shader programs and their resource bindings.
//!
//! A [`Shader`] owns WGSL source text and an ordered list of [`Resource`]s. The
//! module is compiled on first use; the bind-group layout is derived from the
//! resources in declaration order and built once, as is the bind group for each
//! ping-pong parity.

mod ping_pong;

pub use ping_pong::PingPong;

use std::borrow::Cow;

use anyhow::{Context, Result};

use crate::device::GpuCtx;
use crate::resource::{Resource, ResourceKind};

/// Source used when a shader is built without explicit text.
pub const DEFAULT_SOURCE: &str = include_str!("default.wgsl");

/// Entry-point names for each pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoints {
    pub vertex: String,
    pub fragment: String,
    pub compute: String,
}

impl Default for EntryPoints {
    fn default() -> Self {
        Self {
            vertex: "vertexMain".to_owned(),
            fragment: "fragmentMain".to_owned(),
            compute: "computeMain".to_owned(),
        }
    }
}

/// Counts of device work done by a shader.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct ShaderStats {
    pub compilations: u32,
    pub layouts: u32,
    pub bind_groups: u32,
}

/// Ping-pong pair declared on two buffer resources.
///
/// `read_at` and `write_at` are positions in the resource list. The slot at
/// `read_at` binds the "current" buffer, the slot at `write_at` the "next" one.
#[derive(Debug, Clone)]
struct PingPongBinding {
    read_at: usize,
    write_at: usize,
    roles: PingPong<usize>,
}

impl PingPongBinding {
    /// Index of the resource whose device object is bound at position `at`.
    fn bound_at(&self, at: usize) -> usize {
        if at == self.read_at {
            *self.roles.current()
        } else if at == self.write_at {
            *self.roles.next()
        } else {
            at
        }
    }
}

/// Device objects needed to record a pass with a shader.
pub struct PreparedShader<'a> {
    pub module: &'a wgpu::ShaderModule,
    pub layout: &'a wgpu::BindGroupLayout,
    pub bind_group: &'a wgpu::BindGroup,
    pub entry_points: &'a EntryPoints,
}

#[derive(Debug)]
pub struct Shader {
    label: String,
    source: String,
    entry_points: EntryPoints,
    resources: Vec<Resource>,
    ping_pong: Option<PingPongBinding>,
    module: Option<wgpu::ShaderModule>,
    layout: Option<wgpu::BindGroupLayout>,
    bind_groups: [Option<wgpu::BindGroup>; 2],
    stats: ShaderStats,
    disposed: bool,
}

impl Default for Shader {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE)
    }
}

impl Shader {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            label: "shader".to_owned(),
            source: source.into(),
            entry_points: EntryPoints::default(),
            resources: Vec::new(),
            ping_pong: None,
            module: None,
            layout: None,
            bind_groups: [None, None],
            stats: ShaderStats::default(),
            disposed: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_entry_points(mut self, entry_points: EntryPoints) -> Self {
        self.entry_points = entry_points;
        self
    }

    /// Appends resources. Binding slots must be unique and match the source.
    pub fn with_resources(mut self, resources: impl IntoIterator<Item = Resource>) -> Self {
        self.resources.extend(resources);
        self
    }

    /// Declares the buffers at `read_slot` and `write_slot` as a ping-pong pair.
    ///
    /// Initially the resource declared at `read_slot` is "current". Both must be
    /// buffer resources of the same byte size.
    pub fn with_ping_pong(mut self, read_slot: u32, write_slot: u32) -> Result<Self> {
        anyhow::ensure!(
            read_slot != write_slot,
            "ping-pong pair needs two distinct slots (got {read_slot} twice)"
        );
        let read_at = self.position_of(read_slot)?;
        let write_at = self.position_of(write_slot)?;

        let sizes = [read_at, write_at].map(|at| match self.resources[at].kind() {
            ResourceKind::Buffer(b) => Some(b.data().byte_len()),
            _ => None,
        });
        match sizes {
            [Some(a), Some(b)] if a == b => {}
            [Some(a), Some(b)] => anyhow::bail!(
                "ping-pong buffers at slots {read_slot} and {write_slot} differ in size ({a} vs {b} bytes)"
            ),
            _ => anyhow::bail!(
                "ping-pong slots {read_slot} and {write_slot} must both hold buffer resources"
            ),
        }

        self.ping_pong = Some(PingPongBinding {
            read_at,
            write_at,
            roles: PingPong::new(read_at, write_at),
        });
        Ok(self)
    }

    fn position_of(&self, binding: u32) -> Result<usize> {
        self.resources
            .iter()
            .position(|r| r.binding() == binding)
            .with_context(|| format!("shader `{}` declares no resource at slot {binding}", self.label))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entry_points(&self) -> &EntryPoints {
        &self.entry_points
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// The resource declared at `binding`.
    pub fn resource(&self, binding: u32) -> Option<&Resource> {
        self.resources.iter().find(|r| r.binding() == binding)
    }

    pub fn resource_mut(&mut self, binding: u32) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| r.binding() == binding)
    }

    pub fn stats(&self) -> ShaderStats {
        self.stats
    }

    pub fn has_ping_pong(&self) -> bool {
        self.ping_pong.is_some()
    }

    /// Exchanges the ping-pong roles. The bind group for the new parity is
    /// built on first use and cached like the first one.
    pub fn swap_buffers(&mut self) -> Result<()> {
        let pair = self
            .ping_pong
            .as_mut()
            .with_context(|| format!("shader `{}` has no ping-pong pair", self.label))?;
        pair.roles.swap();
        log::trace!("swapped ping-pong roles of `{}`", self.label);
        Ok(())
    }

    /// Resource currently in the "current" (read) role.
    pub fn current_resource(&self) -> Option<&Resource> {
        let pair = self.ping_pong.as_ref()?;
        self.resources.get(*pair.roles.current())
    }

    /// Resource currently in the "next" (write) role.
    pub fn next_resource(&self) -> Option<&Resource> {
        let pair = self.ping_pong.as_ref()?;
        self.resources.get(*pair.roles.next())
    }

    pub fn current_buffer(&self) -> Option<&wgpu::Buffer> {
        self.current_resource()?.device_buffer()
    }

    pub fn next_buffer(&self) -> Option<&wgpu::Buffer> {
        self.next_resource()?.device_buffer()
    }

    /// Layout entries in declaration order.
    pub fn layout_entries(&self) -> Vec<wgpu::BindGroupLayoutEntry> {
        self.resources.iter().map(Resource::layout_entry).collect()
    }

    /// Compiles the source on first call and returns the cached module after.
    ///
    /// Source errors are reported by the device, not here.
    pub fn compiled_module(&mut self, device: &wgpu::Device) -> Result<&wgpu::ShaderModule> {
        anyhow::ensure!(!self.disposed, "shader `{}` was disposed", self.label);

        let label = &self.label;
        let source = &self.source;
        let stats = &mut self.stats;
        Ok(self.module.get_or_insert_with(|| {
            log::debug!("compiling shader `{label}`");
            stats.compilations += 1;
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label.as_str()),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
            })
        }))
    }

    /// Acquires every resource and returns the bind group for the current parity.
    pub fn bind_group(&mut self, ctx: &GpuCtx<'_>) -> Result<&wgpu::BindGroup> {
        let parity = self.prepare_bindings(ctx)?;
        self.bind_groups[parity]
            .as_ref()
            .context("bind group missing after preparation")
    }

    /// Compiles, acquires resources and returns everything a pass needs.
    pub fn prepare(&mut self, ctx: &GpuCtx<'_>) -> Result<PreparedShader<'_>> {
        self.compiled_module(ctx.device)?;
        let parity = self.prepare_bindings(ctx)?;

        Ok(PreparedShader {
            module: self.module.as_ref().context("shader module missing")?,
            layout: self.layout.as_ref().context("bind group layout missing")?,
            bind_group: self.bind_groups[parity]
                .as_ref()
                .context("bind group missing after preparation")?,
            entry_points: &self.entry_points,
        })
    }

    /// Flushes resources and fills the layout and bind-group caches. Returns the
    /// parity whose bind group is current.
    fn prepare_bindings(&mut self, ctx: &GpuCtx<'_>) -> Result<usize> {
        anyhow::ensure!(!self.disposed, "shader `{}` was disposed", self.label);

        for resource in &mut self.resources {
            resource
                .prepare(ctx)
                .with_context(|| format!("failed to prepare resources of `{}`", self.label))?;
        }

        if self.layout.is_none() {
            let entries = self.layout_entries();
            log::debug!(
                "creating bind group layout for `{}` ({} entries)",
                self.label,
                entries.len()
            );
            self.layout = Some(ctx.device.create_bind_group_layout(
                &wgpu::BindGroupLayoutDescriptor {
                    label: Some(self.label.as_str()),
                    entries: &entries,
                },
            ));
            self.stats.layouts += 1;
        }

        let parity = self
            .ping_pong
            .as_ref()
            .map_or(0, |pair| pair.roles.current_index());
        if self.bind_groups[parity].is_none() {
            let group = self.create_bind_group(ctx, parity)?;
            self.bind_groups[parity] = Some(group);
            self.stats.bind_groups += 1;
        }
        Ok(parity)
    }

    fn create_bind_group(&self, ctx: &GpuCtx<'_>, parity: usize) -> Result<wgpu::BindGroup> {
        let layout = self.layout.as_ref().context("bind group layout missing")?;

        let entries = self
            .resources
            .iter()
            .enumerate()
            .map(|(at, declared)| {
                let bound = self.ping_pong.as_ref().map_or(at, |pair| pair.bound_at(at));
                let resource = self.resources[bound].binding_resource().with_context(|| {
                    format!("resource `{}` has no device object", self.resources[bound].label())
                })?;
                Ok(wgpu::BindGroupEntry {
                    binding: declared.binding(),
                    resource,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!("creating bind group {parity} for `{}`", self.label);
        Ok(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(self.label.as_str()),
            layout,
            entries: &entries,
        }))
    }

    /// Disposes every resource and drops the cached device objects.
    pub fn dispose(&mut self) {
        for resource in &mut self.resources {
            resource.dispose();
        }
        self.module = None;
        self.layout = None;
        self.bind_groups = [None, None];
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::read_buffer_as;
    use crate::resource::BindingDesc;
    use crate::test_gpu;

    fn pair_shader() -> Shader {
        Shader::new(
            r#"
            @group(0) @binding(0) var<storage, read> src: array<u32>;
            @group(0) @binding(1) var<storage, read_write> dst: array<u32>;

            @compute @workgroup_size(4)
            fn computeMain(@builtin(global_invocation_id) id: vec3u) {
                dst[id.x] = src[id.x] + 1u;
            }
            "#,
        )
        .with_label("increment")
        .with_resources([
            Resource::storage(BindingDesc::new(0, wgpu::ShaderStages::COMPUTE), vec![0u32; 4], true),
            Resource::storage(BindingDesc::new(1, wgpu::ShaderStages::COMPUTE), vec![0u32; 4], false),
        ])
    }

    #[test]
    fn layout_entries_keep_declaration_order() {
        let shader = Shader::default().with_resources([
            Resource::uniform(BindingDesc::new(0, wgpu::ShaderStages::FRAGMENT), vec![0.0f32; 4]),
            Resource::sampler(
                BindingDesc::new(1, wgpu::ShaderStages::FRAGMENT),
                wgpu::SamplerBindingType::NonFiltering,
            ),
        ]);

        let slots: Vec<u32> = shader.layout_entries().iter().map(|e| e.binding).collect();
        assert_eq!(slots, [0, 1]);
    }

    #[test]
    fn ping_pong_requires_matching_buffers() {
        assert!(pair_shader().with_ping_pong(0, 1).is_ok());
        assert!(pair_shader().with_ping_pong(0, 0).is_err());
        assert!(pair_shader().with_ping_pong(0, 7).is_err());

        let mismatched = Shader::default()
            .with_resources([
                Resource::storage(BindingDesc::new(0, wgpu::ShaderStages::COMPUTE), vec![0u32; 4], true),
                Resource::storage(BindingDesc::new(1, wgpu::ShaderStages::COMPUTE), vec![0u32; 8], false),
            ])
            .with_ping_pong(0, 1);
        assert!(mismatched.is_err());
    }

    #[test]
    fn swap_without_pair_is_an_error() {
        assert!(Shader::default().swap_buffers().is_err());
    }

    #[test]
    fn swap_exchanges_resource_roles() {
        let mut shader = pair_shader().with_ping_pong(0, 1).unwrap();
        assert_eq!(shader.current_resource().map(Resource::binding), Some(0));

        shader.swap_buffers().unwrap();
        assert_eq!(shader.current_resource().map(Resource::binding), Some(1));
        assert_eq!(shader.next_resource().map(Resource::binding), Some(0));
    }

    #[test]
    fn module_and_bind_group_are_cached() {
        let Some(gpu) = test_gpu::headless() else { return };
        let ctx = gpu.ctx();
        let mut shader = pair_shader();

        shader.prepare(&ctx).unwrap();
        shader.resource_mut(0).unwrap().mark_needs_update();
        shader.prepare(&ctx).unwrap();

        assert_eq!(
            shader.stats(),
            ShaderStats { compilations: 1, layouts: 1, bind_groups: 1 }
        );
    }

    #[test]
    fn each_parity_builds_one_bind_group() {
        let Some(gpu) = test_gpu::headless() else { return };
        let ctx = gpu.ctx();
        let mut shader = pair_shader().with_ping_pong(0, 1).unwrap();

        for _ in 0..4 {
            shader.bind_group(&ctx).unwrap();
            shader.swap_buffers().unwrap();
        }
        assert_eq!(shader.stats().bind_groups, 2);
        assert_eq!(shader.stats().layouts, 1);
    }

    #[test]
    fn swapped_roles_expose_written_buffer() {
        let Some(gpu) = test_gpu::headless() else { return };
        let ctx = gpu.ctx();
        let mut shader = pair_shader().with_ping_pong(0, 1).unwrap();

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        crate::pass::run_compute_pass(&mut encoder, &ctx, &mut shader, 1u32).unwrap();
        ctx.queue.submit([encoder.finish()]);
        shader.swap_buffers().unwrap();

        let current = shader.current_buffer().unwrap();
        assert_eq!(read_buffer_as::<u32>(&ctx, current).unwrap(), [1, 1, 1, 1]);
        let next = shader.next_buffer().unwrap();
        assert_eq!(read_buffer_as::<u32>(&ctx, next).unwrap(), [0, 0, 0, 0]);
    }

    #[test]
    fn dispose_releases_resources() {
        let Some(gpu) = test_gpu::headless() else { return };
        let ctx = gpu.ctx();
        let mut shader = pair_shader();

        shader.prepare(&ctx).unwrap();
        shader.dispose();
        assert!(shader.is_disposed());
        assert!(shader.resources().iter().all(|r| r.device_buffer().is_none()));
        assert!(shader.prepare(&ctx).is_err());
    }
}
