use anyhow::Result;

use super::{BufferAttribute, Geometry};
use crate::shader::Shader;

/// Two clip-space triangles covering the viewport, as 2D positions.
pub const QUAD_VERTICES: [f32; 12] = [
    -1.0, -1.0, //
    1.0, -1.0, //
    1.0, 1.0, //
    -1.0, -1.0, //
    1.0, 1.0, //
    -1.0, 1.0, //
];

/// Index list over [`QUAD_VERTICES`]. Vertex 5 duplicates the upper-left corner,
/// so the second triangle is `(0, 2, 5)`.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 5];

/// Non-indexed full-screen quad (six vertices).
pub fn unit_quad(shader: Shader) -> Result<Geometry> {
    Ok(Geometry::new([BufferAttribute::position(QUAD_VERTICES.to_vec(), 2)?])?.with_shader(shader))
}

/// Indexed full-screen quad.
pub fn unit_quad_indexed(shader: Shader) -> Result<Geometry> {
    Ok(Geometry::new([
        BufferAttribute::position(QUAD_VERTICES.to_vec(), 2)?,
        BufferAttribute::index(QUAD_INDICES.to_vec())?,
    ])?
    .with_shader(shader))
}
