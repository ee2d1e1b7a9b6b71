use anyhow::Result;
use wgpu::util::DeviceExt;

use crate::device::GpuCtx;
use crate::resource::{HostData, Lifecycle, LifecycleState};

/// Semantic role of an attribute buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeLabel {
    Index,
    Position,
    Other(String),
}

/// Element format of an attribute buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttributeFormat {
    Vertex(wgpu::VertexFormat),
    Index(wgpu::IndexFormat),
}

/// Vertex-buffer layout with a single attribute.
#[derive(Debug, Copy, Clone)]
pub struct VertexLayout {
    pub array_stride: wgpu::BufferAddress,
    pub step_mode: wgpu::VertexStepMode,
    pub attribute: wgpu::VertexAttribute,
}

impl VertexLayout {
    pub fn as_wgpu(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: self.step_mode,
            attributes: std::slice::from_ref(&self.attribute),
        }
    }
}

#[derive(Debug)]
pub(super) struct PreparedAttribute {
    pub(super) buffer: wgpu::Buffer,
}

/// One vertex or index buffer of a [`Geometry`](super::Geometry).
///
/// Attribute data is uploaded once and never updated afterwards.
#[derive(Debug)]
pub struct BufferAttribute {
    label: AttributeLabel,
    format: AttributeFormat,
    location: u32,
    item_size: u32,
    offset: wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode,
    usage: wgpu::BufferUsages,
    data: HostData,
    prepared: Lifecycle<PreparedAttribute>,
}

impl BufferAttribute {
    /// A vertex attribute at shader `location` with `item_size` components per vertex.
    pub fn vertex(
        label: AttributeLabel,
        location: u32,
        format: wgpu::VertexFormat,
        item_size: u32,
        data: impl Into<HostData>,
    ) -> Result<Self> {
        anyhow::ensure!(label != AttributeLabel::Index, "index attributes need an index format");
        anyhow::ensure!(item_size > 0, "attribute item size must be positive");
        Ok(Self::from_parts(
            label,
            AttributeFormat::Vertex(format),
            location,
            item_size,
            data.into(),
        ))
    }

    /// 2D/3D/4D `f32` positions at location 0.
    pub fn position(data: Vec<f32>, item_size: u32) -> Result<Self> {
        let format = match item_size {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            4 => wgpu::VertexFormat::Float32x4,
            n => anyhow::bail!("position item size must be 1..=4, got {n}"),
        };
        Self::vertex(AttributeLabel::Position, 0, format, item_size, data)
    }

    /// Index buffer; the format follows the data (`u16` or `u32`).
    pub fn index(data: impl Into<HostData>) -> Result<Self> {
        let data = data.into();
        let format = match &data {
            HostData::U16(_) => wgpu::IndexFormat::Uint16,
            HostData::U32(_) => wgpu::IndexFormat::Uint32,
            _ => anyhow::bail!("index data must be u16 or u32"),
        };
        Ok(Self::from_parts(
            AttributeLabel::Index,
            AttributeFormat::Index(format),
            0,
            1,
            data,
        ))
    }

    fn from_parts(
        label: AttributeLabel,
        format: AttributeFormat,
        location: u32,
        item_size: u32,
        data: HostData,
    ) -> Self {
        Self {
            label,
            format,
            location,
            item_size,
            offset: 0,
            step_mode: wgpu::VertexStepMode::Vertex,
            usage: wgpu::BufferUsages::empty(),
            data,
            prepared: Lifecycle::default(),
        }
    }

    /// Byte offset of the attribute within each element.
    pub fn with_offset(mut self, offset: wgpu::BufferAddress) -> Self {
        self.offset = offset;
        self
    }

    /// Advances the attribute once per instance instead of once per vertex.
    pub fn per_instance(mut self) -> Self {
        self.step_mode = wgpu::VertexStepMode::Instance;
        self
    }

    /// Extra usage flags added to VERTEX/INDEX.
    pub fn with_usage(mut self, usage: wgpu::BufferUsages) -> Self {
        self.usage |= usage;
        self
    }

    pub fn label(&self) -> &AttributeLabel {
        &self.label
    }

    pub fn format(&self) -> AttributeFormat {
        self.format
    }

    pub fn location(&self) -> u32 {
        self.location
    }

    pub fn item_size(&self) -> u32 {
        self.item_size
    }

    pub fn data(&self) -> &HostData {
        &self.data
    }

    pub fn is_index(&self) -> bool {
        self.label == AttributeLabel::Index
    }

    /// Number of items (vertices or indices) in the host array.
    pub fn count(&self) -> u32 {
        (self.data.len() / self.item_size as usize) as u32
    }

    pub fn state(&self) -> LifecycleState {
        self.prepared.state()
    }

    /// Vertex-buffer layout, or `None` for an index attribute.
    pub fn layout(&self) -> Option<VertexLayout> {
        let AttributeFormat::Vertex(format) = self.format else { return None };
        Some(VertexLayout {
            array_stride: u64::from(self.item_size) * self.data.element_size() as u64,
            step_mode: self.step_mode,
            attribute: wgpu::VertexAttribute {
                format,
                offset: self.offset,
                shader_location: self.location,
            },
        })
    }

    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.prepared.get().map(|p| &p.buffer)
    }

    /// Uploads the host array on first call; later calls are no-ops.
    pub(super) fn prepare(&mut self, ctx: &GpuCtx<'_>) -> Result<()> {
        match self.prepared.state() {
            LifecycleState::Allocated => return Ok(()),
            LifecycleState::Disposed => anyhow::bail!("attribute {:?} was disposed", self.label),
            LifecycleState::Unallocated => {}
        }
        anyhow::ensure!(!self.data.is_empty(), "attribute {:?} has no data", self.label);

        let role = match self.format {
            AttributeFormat::Vertex(_) => wgpu::BufferUsages::VERTEX,
            AttributeFormat::Index(_) => wgpu::BufferUsages::INDEX,
        };
        let name = format!("attribute {:?}", self.label);
        let buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(name.as_str()),
            contents: self.data.bytes(),
            usage: role | self.usage,
        });
        log::debug!("uploaded {name} ({} bytes)", self.data.byte_len());

        self.prepared = Lifecycle::Allocated(PreparedAttribute { buffer });
        Ok(())
    }

    pub(super) fn dispose(&mut self) {
        if let Some(prepared) = self.prepared.dispose() {
            prepared.buffer.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_is_item_size_times_element_width() {
        let attr = BufferAttribute::position(vec![0.0; 12], 2).unwrap();
        let layout = attr.layout().unwrap();
        assert_eq!(layout.array_stride, 8);
        assert_eq!(layout.attribute.shader_location, 0);
        assert_eq!(layout.attribute.format, wgpu::VertexFormat::Float32x2);
        assert_eq!(attr.count(), 6);
    }

    #[test]
    fn index_format_follows_data() {
        let short = BufferAttribute::index(vec![0u16, 1, 2]).unwrap();
        assert_eq!(short.format(), AttributeFormat::Index(wgpu::IndexFormat::Uint16));
        assert!(short.layout().is_none());

        let wide = BufferAttribute::index(vec![0u32, 1, 2]).unwrap();
        assert_eq!(wide.format(), AttributeFormat::Index(wgpu::IndexFormat::Uint32));

        assert!(BufferAttribute::index(vec![0.0f32]).is_err());
    }

    #[test]
    fn offset_and_step_mode_reach_layout() {
        let attr = BufferAttribute::vertex(
            AttributeLabel::Other("color".into()),
            2,
            wgpu::VertexFormat::Float32x3,
            4,
            vec![0.0f32; 8],
        )
        .unwrap()
        .with_offset(4)
        .per_instance();

        let layout = attr.layout().unwrap();
        assert_eq!(layout.array_stride, 16);
        assert_eq!(layout.attribute.offset, 4);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(layout.as_wgpu().attributes.len(), 1);
    }

    #[test]
    fn vertex_constructor_rejects_index_label() {
        let attr = BufferAttribute::vertex(
            AttributeLabel::Index,
            0,
            wgpu::VertexFormat::Uint32,
            1,
            vec![0u32; 3],
        );
        assert!(attr.is_err());
    }
}
