use std::path::{Path, PathBuf};

use asset::Vertex;
use corelib::{Aabb, Vec3};

use crate::cache::MeshTexture;

#[derive(Clone, Debug)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    /// Triangle list.
    pub indices: Vec<u32>,
    /// Diffuse textures first, then specular.
    pub textures: Vec<MeshTexture>,
    pub diffuse_color: Vec3,
    pub aabb: Aabb,
}

impl Mesh {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Meshes in depth-first node order.
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub directory: PathBuf,
    pub meshes: Vec<Mesh>,
}

impl Model {
    #[inline]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Union of the mesh boxes; computed on every call.
    pub fn aabb(&self) -> Aabb {
        self.meshes
            .iter()
            .fold(Aabb::EMPTY, |acc, mesh| acc.union(mesh.aabb))
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.vertices.len()).sum()
    }
}
