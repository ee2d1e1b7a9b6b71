use anyhow::{Context, Result};

use crate::device::GpuCtx;
use crate::shader::Shader;

/// Workgroup grid for a dispatch. Unused dimensions are 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WorkgroupCount {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl WorkgroupCount {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Workgroups needed so `items` invocations are covered by groups of `size`.
    pub fn covering(items: u32, size: u32) -> u32 {
        items.div_ceil(size.max(1))
    }

    pub fn is_empty(&self) -> bool {
        self.x == 0 || self.y == 0 || self.z == 0
    }
}

impl From<u32> for WorkgroupCount {
    fn from(x: u32) -> Self {
        Self::new(x, 1, 1)
    }
}

impl From<(u32, u32)> for WorkgroupCount {
    fn from((x, y): (u32, u32)) -> Self {
        Self::new(x, y, 1)
    }
}

impl From<(u32, u32, u32)> for WorkgroupCount {
    fn from((x, y, z): (u32, u32, u32)) -> Self {
        Self::new(x, y, z)
    }
}

/// Records a compute pass dispatching `shader`'s compute entry point.
pub fn run_compute_pass(
    encoder: &mut wgpu::CommandEncoder,
    ctx: &GpuCtx<'_>,
    shader: &mut Shader,
    count: impl Into<WorkgroupCount>,
) -> Result<()> {
    let count = count.into();
    let label = shader.label().to_owned();
    let prepared = shader
        .prepare(ctx)
        .with_context(|| format!("failed to prepare compute shader `{label}`"))?;

    log::debug!("building compute pipeline for `{label}`");
    let pipeline_layout = ctx
        .device
        .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shaderloop compute pipeline layout"),
            bind_group_layouts: &[prepared.layout],
            immediate_size: 0,
        });
    let pipeline = ctx
        .device
        .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label.as_str()),
            layout: Some(&pipeline_layout),
            module: prepared.module,
            entry_point: Some(prepared.entry_points.compute.as_str()),
            compilation_options: Default::default(),
            cache: None,
        });

    let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some("shaderloop compute pass"),
        timestamp_writes: None,
    });
    cpass.set_pipeline(&pipeline);
    cpass.set_bind_group(0, prepared.bind_group, &[]);
    if !count.is_empty() {
        cpass.dispatch_workgroups(count.x, count.y, count.z);
    }
    Ok(())
}
