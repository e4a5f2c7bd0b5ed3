//! Vertex/index buffers for programs that draw generated geometry (grid
//! lines, cubes) instead of loaded models.

use asset::Vertex;
use gpu::{BufferKind, OwnedBuffer, SharedDevice};

/// Buffers use the model [`Vertex`] layout; normals and uvs are zero.
#[derive(Debug)]
pub struct PrimitiveGeometry {
    vertices: OwnedBuffer,
    indices: Option<OwnedBuffer>,
    vertex_count: u32,
    index_count: u32,
}

impl PrimitiveGeometry {
    pub fn new(device: &SharedDevice, positions: &[[f32; 3]], indices: Option<&[u32]>) -> Self {
        let vertices: Vec<Vertex> = positions.iter().copied().map(Vertex::at).collect();
        let vertex_buffer =
            OwnedBuffer::create(device, BufferKind::Vertex, bytemuck::cast_slice(&vertices));
        let index_buffer = indices
            .map(|indices| OwnedBuffer::create(device, BufferKind::Index, bytemuck::cast_slice(indices)));

        Self {
            vertices: vertex_buffer,
            indices: index_buffer,
            vertex_count: positions.len() as u32,
            index_count: indices.map_or(0, |indices| indices.len() as u32),
        }
    }

    /// Cube spanning -1..1 on every axis, CCW faces.
    pub fn unit_cube(device: &SharedDevice) -> Self {
        let (positions, indices) = cube_geometry();
        Self::new(device, &positions, Some(&indices[..]))
    }

    /// Non-indexed line list: one segment per axis through the origin,
    /// `-half_extent..half_extent`.
    pub fn axis_lines(device: &SharedDevice, half_extent: f32) -> Self {
        Self::new(device, &axis_line_positions(half_extent), None)
    }

    #[inline]
    pub fn vertex_buffer(&self) -> &OwnedBuffer {
        &self.vertices
    }

    #[inline]
    pub fn index_buffer(&self) -> Option<&OwnedBuffer> {
        self.indices.as_ref()
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Zero for non-indexed geometry.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[rustfmt::skip]
fn axis_line_positions(half_extent: f32) -> [[f32; 3]; 6] {
    let e = half_extent;
    [
        [-e, 0.0, 0.0], [e, 0.0, 0.0],
        [0.0, -e, 0.0], [0.0, e, 0.0],
        [0.0, 0.0, -e], [0.0, 0.0, e],
    ]
}

#[rustfmt::skip]
fn cube_geometry() -> ([[f32; 3]; 8], [u32; 36]) {
    let positions = [
        // back z=-1
        [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],
        // front z=+1
        [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0],
    ];
    let indices = [
        4, 5, 6, 4, 6, 7, // front (+Z)
        0, 2, 1, 0, 3, 2, // back (-Z)
        3, 2, 6, 3, 6, 7, // top (+Y)
        0, 5, 1, 0, 4, 5, // bottom (-Y)
        0, 3, 7, 0, 7, 4, // left (-X)
        1, 2, 6, 1, 6, 5, // right (+X)
    ];
    (positions, indices)
}
