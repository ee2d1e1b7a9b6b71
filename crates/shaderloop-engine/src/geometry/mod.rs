//! Vertex/index attribute buffers and draw parameters.
//!
//! A [`Geometry`] owns its attribute buffers and, optionally, the [`Shader`]
//! that draws them.

mod attribute;
mod quad;

pub use attribute::{AttributeFormat, AttributeLabel, BufferAttribute, VertexLayout};
pub use quad::{QUAD_INDICES, QUAD_VERTICES, unit_quad, unit_quad_indexed};

use anyhow::{Context, Result};

use crate::device::GpuCtx;
use crate::shader::{PreparedShader, Shader};

/// Draw call derived from the attribute data.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawParams {
    Indexed { index_count: u32, instance_count: u32 },
    Direct { vertex_count: u32, instance_count: u32 },
    /// Nothing to draw.
    Empty,
}

/// Device buffers and layouts for one draw.
///
/// `vertex_buffers[slot]` matches `layouts[slot]`; slots follow shader-location order.
pub struct PreparedGeometry<'a> {
    pub draw: DrawParams,
    pub index: Option<(&'a wgpu::Buffer, wgpu::IndexFormat)>,
    pub vertex_buffers: Vec<&'a wgpu::Buffer>,
    pub layouts: Vec<VertexLayout>,
}

#[derive(Debug)]
pub struct Geometry {
    attributes: Vec<BufferAttribute>,
    shader: Option<Shader>,
    instance_count: u32,
}

impl Geometry {
    /// Fails when more than one attribute is labelled as the index.
    pub fn new(attributes: impl IntoIterator<Item = BufferAttribute>) -> Result<Self> {
        let attributes: Vec<BufferAttribute> = attributes.into_iter().collect();
        let indices = attributes.iter().filter(|a| a.is_index()).count();
        anyhow::ensure!(indices <= 1, "geometry declares {indices} index attributes");

        Ok(Self {
            attributes,
            shader: None,
            instance_count: 1,
        })
    }

    pub fn with_shader(mut self, shader: Shader) -> Self {
        self.shader = Some(shader);
        self
    }

    pub fn with_instance_count(mut self, instance_count: u32) -> Self {
        self.instance_count = instance_count;
        self
    }

    pub fn attributes(&self) -> &[BufferAttribute] {
        &self.attributes
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn shader(&self) -> Option<&Shader> {
        self.shader.as_ref()
    }

    pub fn shader_mut(&mut self) -> Option<&mut Shader> {
        self.shader.as_mut()
    }

    pub fn index_attribute(&self) -> Option<&BufferAttribute> {
        self.attributes.iter().find(|a| a.is_index())
    }

    pub fn position_attribute(&self) -> Option<&BufferAttribute> {
        self.attributes
            .iter()
            .find(|a| *a.label() == AttributeLabel::Position)
    }

    /// Position count (array length / item size), or 0 without positions.
    pub fn vertex_count(&self) -> u32 {
        self.position_attribute().map_or(0, BufferAttribute::count)
    }

    /// Indexed draw when an index attribute exists, otherwise a direct draw over
    /// the positions.
    pub fn draw_params(&self) -> DrawParams {
        let instance_count = self.instance_count;
        if instance_count == 0 {
            return DrawParams::Empty;
        }
        match self.index_attribute() {
            Some(index) if index.count() > 0 => DrawParams::Indexed {
                index_count: index.count(),
                instance_count,
            },
            Some(_) => DrawParams::Empty,
            None => match self.vertex_count() {
                0 => DrawParams::Empty,
                vertex_count => DrawParams::Direct {
                    vertex_count,
                    instance_count,
                },
            },
        }
    }

    /// Uploads attribute buffers on first call and collects what a draw needs.
    pub fn prepare(&mut self, ctx: &GpuCtx<'_>) -> Result<PreparedGeometry<'_>> {
        let draw = self.draw_params();
        prepare_attributes(&mut self.attributes, draw, ctx)
    }

    /// Prepares attributes and the associated shader together.
    pub(crate) fn prepare_with_shader(
        &mut self,
        ctx: &GpuCtx<'_>,
    ) -> Result<(PreparedGeometry<'_>, PreparedShader<'_>)> {
        let draw = self.draw_params();
        let Self { attributes, shader, .. } = self;
        let shader = shader.as_mut().context("geometry has no shader")?;

        let geometry = prepare_attributes(attributes, draw, ctx)?;
        let shader = shader.prepare(ctx)?;
        Ok((geometry, shader))
    }

    /// Releases every attribute buffer. The shader is left alone.
    pub fn dispose(&mut self) {
        for attribute in &mut self.attributes {
            attribute.dispose();
        }
    }
}

fn prepare_attributes<'a>(
    attributes: &'a mut [BufferAttribute],
    draw: DrawParams,
    ctx: &GpuCtx<'_>,
) -> Result<PreparedGeometry<'a>> {
    for attribute in attributes.iter_mut() {
        attribute.prepare(ctx)?;
    }
    let attributes: &'a [BufferAttribute] = attributes;

    let index = match attributes.iter().find(|a| a.is_index()) {
        Some(attr) => {
            let AttributeFormat::Index(format) = attr.format() else {
                anyhow::bail!("index attribute has a vertex format");
            };
            Some((attr.buffer().context("index buffer missing")?, format))
        }
        None => None,
    };

    let mut vertex: Vec<&BufferAttribute> = attributes.iter().filter(|a| !a.is_index()).collect();
    vertex.sort_by_key(|a| a.location());

    let mut vertex_buffers = Vec::with_capacity(vertex.len());
    let mut layouts = Vec::with_capacity(vertex.len());
    for attr in vertex {
        vertex_buffers.push(attr.buffer().context("vertex buffer missing")?);
        layouts.push(attr.layout().context("vertex attribute without layout")?);
    }

    Ok(PreparedGeometry {
        draw,
        index,
        vertex_buffers,
        layouts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::LifecycleState;
    use crate::test_gpu;

    fn color(location: u32) -> BufferAttribute {
        BufferAttribute::vertex(
            AttributeLabel::Other("color".into()),
            location,
            wgpu::VertexFormat::Float32x3,
            3,
            vec![0.5f32; 18],
        )
        .unwrap()
    }

    #[test]
    fn direct_draw_counts_positions() {
        let geometry = Geometry::new([BufferAttribute::position(vec![0.0; 12], 2).unwrap()]).unwrap();
        assert_eq!(geometry.vertex_count(), 6);
        assert_eq!(
            geometry.draw_params(),
            DrawParams::Direct { vertex_count: 6, instance_count: 1 }
        );
    }

    #[test]
    fn index_attribute_wins_regardless_of_others() {
        let geometry = Geometry::new([
            color(1),
            BufferAttribute::index(vec![0u16, 1, 2]).unwrap(),
            BufferAttribute::position(vec![0.0; 12], 2).unwrap(),
        ])
        .unwrap()
        .with_instance_count(4);

        assert_eq!(
            geometry.draw_params(),
            DrawParams::Indexed { index_count: 3, instance_count: 4 }
        );
    }

    #[test]
    fn second_index_attribute_is_rejected() {
        let geometry = Geometry::new([
            BufferAttribute::index(vec![0u16, 1, 2]).unwrap(),
            BufferAttribute::index(vec![0u32, 1, 2]).unwrap(),
        ]);
        assert!(geometry.is_err());
    }

    #[test]
    fn nothing_to_draw_without_positions_or_instances() {
        assert_eq!(Geometry::new([color(1)]).unwrap().draw_params(), DrawParams::Empty);

        let none = Geometry::new([BufferAttribute::position(vec![0.0; 12], 2).unwrap()])
            .unwrap()
            .with_instance_count(0);
        assert_eq!(none.draw_params(), DrawParams::Empty);
    }

    #[test]
    fn quad_constructors_pick_draw_kind() {
        let direct = unit_quad(Shader::default()).unwrap();
        assert_eq!(
            direct.draw_params(),
            DrawParams::Direct { vertex_count: 6, instance_count: 1 }
        );

        let indexed = unit_quad_indexed(Shader::default()).unwrap();
        assert_eq!(
            indexed.draw_params(),
            DrawParams::Indexed { index_count: 6, instance_count: 1 }
        );
    }

    #[test]
    fn vertex_slots_follow_location_order() {
        let Some(gpu) = test_gpu::headless() else { return };
        let ctx = gpu.ctx();
        let mut geometry = Geometry::new([
            color(3),
            BufferAttribute::index(vec![0u16, 1, 2]).unwrap(),
            BufferAttribute::position(vec![0.0; 12], 2).unwrap(),
        ])
        .unwrap();

        let prepared = geometry.prepare(&ctx).unwrap();
        let locations: Vec<u32> = prepared
            .layouts
            .iter()
            .map(|l| l.attribute.shader_location)
            .collect();
        assert_eq!(locations, [0, 3]);
        assert_eq!(prepared.vertex_buffers.len(), 2);
        assert!(matches!(prepared.index, Some((_, wgpu::IndexFormat::Uint16))));
    }

    #[test]
    fn prepare_uploads_once_and_dispose_releases() {
        let Some(gpu) = test_gpu::headless() else { return };
        let ctx = gpu.ctx();
        let mut geometry = unit_quad(Shader::default()).unwrap();

        geometry.prepare(&ctx).unwrap();
        let size = geometry.attributes()[0].buffer().map(wgpu::Buffer::size);
        geometry.prepare(&ctx).unwrap();
        assert_eq!(geometry.attributes()[0].state(), LifecycleState::Allocated);
        assert_eq!(geometry.attributes()[0].buffer().map(wgpu::Buffer::size), size);

        geometry.dispose();
        assert_eq!(geometry.attributes()[0].state(), LifecycleState::Disposed);
        assert!(geometry.prepare(&ctx).is_err());
    }

    #[test]
    fn shaderless_geometry_cannot_prepare_for_drawing() {
        let Some(gpu) = test_gpu::headless() else { return };
        let ctx = gpu.ctx();
        let mut geometry = Geometry::new([BufferAttribute::position(vec![0.0; 12], 2).unwrap()]).unwrap();
        assert!(geometry.prepare_with_shader(&ctx).is_err());
    }
}
