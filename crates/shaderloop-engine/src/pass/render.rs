use anyhow::{Context, Result};

use crate::device::GpuCtx;
use crate::geometry::{DrawParams, Geometry, VertexLayout};
use crate::shader::PreparedShader;

/// Color attachment of a render pass.
#[derive(Debug, Copy, Clone)]
pub struct RenderTarget<'a> {
    pub view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub load: wgpu::LoadOp<wgpu::Color>,
}

impl<'a> RenderTarget<'a> {
    /// Clears the attachment to `color` before drawing.
    pub fn clear(view: &'a wgpu::TextureView, format: wgpu::TextureFormat, color: wgpu::Color) -> Self {
        Self {
            view,
            format,
            load: wgpu::LoadOp::Clear(color),
        }
    }

    /// Draws over the existing contents.
    pub fn load(view: &'a wgpu::TextureView, format: wgpu::TextureFormat) -> Self {
        Self {
            view,
            format,
            load: wgpu::LoadOp::Load,
        }
    }
}

/// Records a render pass drawing `geometry` with its shader into `target`.
///
/// Fails when the geometry has no shader. An empty geometry still records the
/// pass, so a clear load op takes effect.
pub fn run_render_pass(
    encoder: &mut wgpu::CommandEncoder,
    target: &RenderTarget<'_>,
    ctx: &GpuCtx<'_>,
    geometry: &mut Geometry,
) -> Result<()> {
    let (prepared, shader) = geometry
        .prepare_with_shader(ctx)
        .context("failed to prepare geometry for rendering")?;

    let pipeline = match prepared.draw {
        DrawParams::Empty => None,
        _ => Some(build_pipeline(ctx.device, &shader, &prepared.layouts, target.format)),
    };

    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("shaderloop render pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: target.load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });

    let Some(pipeline) = pipeline else { return Ok(()) };
    rpass.set_pipeline(&pipeline);
    rpass.set_bind_group(0, shader.bind_group, &[]);
    for (slot, buffer) in prepared.vertex_buffers.iter().enumerate() {
        rpass.set_vertex_buffer(slot as u32, buffer.slice(..));
    }

    match prepared.draw {
        DrawParams::Indexed {
            index_count,
            instance_count,
        } => {
            let (buffer, format) = prepared.index.context("indexed draw without index buffer")?;
            rpass.set_index_buffer(buffer.slice(..), format);
            rpass.draw_indexed(0..index_count, 0, 0..instance_count);
        }
        DrawParams::Direct {
            vertex_count,
            instance_count,
        } => rpass.draw(0..vertex_count, 0..instance_count),
        DrawParams::Empty => {}
    }
    Ok(())
}

fn build_pipeline(
    device: &wgpu::Device,
    shader: &PreparedShader<'_>,
    layouts: &[VertexLayout],
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    log::debug!("building render pipeline ({} vertex buffers)", layouts.len());

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("shaderloop render pipeline layout"),
        bind_group_layouts: &[shader.layout],
        immediate_size: 0,
    });
    let buffers: Vec<wgpu::VertexBufferLayout<'_>> = layouts.iter().map(VertexLayout::as_wgpu).collect();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("shaderloop render pipeline"),
        layout: Some(&pipeline_layout),

        vertex: wgpu::VertexState {
            module: shader.module,
            entry_point: Some(shader.entry_points.vertex.as_str()),
            compilation_options: Default::default(),
            buffers: &buffers,
        },

        fragment: Some(wgpu::FragmentState {
            module: shader.module,
            entry_point: Some(shader.entry_points.fragment.as_str()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
