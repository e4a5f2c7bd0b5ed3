//! Vertex layout shared by the scene loader and GPU uploads.

use bytemuck::{Pod, Zeroable};

/// Vertex with position/normal/uv. Values are in object space.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Byte stride of one vertex in a vertex buffer.
    pub const STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Position-only vertex, as used by primitive geometry.
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_is_tightly_packed() {
        assert_eq!(Vertex::STRIDE, 32);
        let v = Vertex::at([1.0, 2.0, 3.0]);
        let bytes: &[u8] = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 32);
        assert_eq!(v.uv, [0.0, 0.0]);
    }
}
