//! Importer-neutral scene description.
//!
//! Importers turn a file into an [`ImportedScene`]: a node tree that refers to
//! meshes by index, the meshes themselves, and their materials. The resource
//! layer walks this tree; it never sees format-specific types.

use std::path::Path;

use corelib::{AssetError, AssetResult};

use crate::{gltf_scene::GltfImporter, obj::ObjImporter};

/// Post-processing applied while importing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    /// Split every polygon into triangles.
    pub triangulate: bool,
    /// Replace every texture coordinate `v` with `1 - v`.
    pub flip_uvs: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            triangulate: true,
            flip_uvs: true,
        }
    }
}

/// Semantic role of a material texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureRole {
    Diffuse,
    Specular,
}

impl TextureRole {
    /// Sampler name the model shaders bind this role to.
    pub const fn uniform_name(self) -> &'static str {
        match self {
            TextureRole::Diffuse => "textureDiffuse",
            TextureRole::Specular => "textureSpecular",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneNode {
    pub name: String,
    /// Indices into [`ImportedScene::meshes`].
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, meshes: Vec<usize>, children: Vec<SceneNode>) -> Self {
        Self {
            name: name.into(),
            meshes,
            children,
        }
    }

    /// Mesh indices in depth-first order: this node's own meshes, then each
    /// child subtree in sequence.
    pub fn mesh_order(&self) -> Vec<usize> {
        let mut order = Vec::new();
        self.collect_mesh_order(&mut order);
        order
    }

    fn collect_mesh_order(&self, order: &mut Vec<usize>) {
        order.extend_from_slice(&self.meshes);
        for child in &self.children {
            child.collect_mesh_order(order);
        }
    }
}

/// Geometry as the importer produced it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// Empty when the file has no normals.
    pub normals: Vec<[f32; 3]>,
    /// One entry per UV channel; empty when the mesh has no texture coordinates.
    pub uv_channels: Vec<Vec<[f32; 2]>>,
    /// Faces as vertex indices; triangles after triangulation.
    pub faces: Vec<Vec<u32>>,
    /// Index into [`ImportedScene::materials`]; `None` means the default material.
    pub material: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceMaterial {
    pub name: String,
    pub diffuse_color: Option<[f32; 3]>,
    pub diffuse_textures: Vec<String>,
    pub specular_textures: Vec<String>,
}

impl SourceMaterial {
    /// Texture references for `role`, exactly as written in the source file.
    pub fn textures(&self, role: TextureRole) -> &[String] {
        match role {
            TextureRole::Diffuse => &self.diffuse_textures,
            TextureRole::Specular => &self.specular_textures,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedScene {
    pub root: Option<SceneNode>,
    pub meshes: Vec<SourceMesh>,
    pub materials: Vec<SourceMaterial>,
    /// Set by importers that could only read part of the file.
    pub incomplete: bool,
}

impl ImportedScene {
    /// Reject scenes the loader cannot walk safely.
    pub fn validate(&self, path: &Path) -> AssetResult<()> {
        if self.incomplete {
            return Err(AssetError::scene_parse(path, "scene is incomplete"));
        }
        let Some(root) = &self.root else {
            return Err(AssetError::scene_parse(path, "scene has no root node"));
        };

        for index in root.mesh_order() {
            if index >= self.meshes.len() {
                return Err(AssetError::scene_parse(
                    path,
                    format!("node references mesh {index}, scene has {}", self.meshes.len()),
                ));
            }
        }

        for mesh in &self.meshes {
            let count = mesh.positions.len();
            if !mesh.normals.is_empty() && mesh.normals.len() != count {
                return Err(AssetError::scene_parse(
                    path,
                    format!("mesh '{}' has {} normals for {count} vertices", mesh.name, mesh.normals.len()),
                ));
            }
            if let Some(uvs) = mesh.uv_channels.first() {
                if uvs.len() != count {
                    return Err(AssetError::scene_parse(
                        path,
                        format!("mesh '{}' has {} uvs for {count} vertices", mesh.name, uvs.len()),
                    ));
                }
            }
            let out_of_range = mesh
                .faces
                .iter()
                .flatten()
                .any(|&i| i as usize >= count);
            if out_of_range {
                return Err(AssetError::scene_parse(
                    path,
                    format!("mesh '{}' has a face index past its {count} vertices", mesh.name),
                ));
            }
        }
        Ok(())
    }
}

/// Reads a scene file into an [`ImportedScene`].
pub trait SceneImporter {
    fn import(&self, path: &Path, options: ImportOptions) -> AssetResult<ImportedScene>;
}

/// Dispatches on file extension to the OBJ or glTF importer.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileImporter;

impl SceneImporter for FileImporter {
    fn import(&self, path: &Path, options: ImportOptions) -> AssetResult<ImportedScene> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("obj") => ObjImporter.import(path, options),
            Some("gltf") | Some("glb") => GltfImporter.import(path, options),
            _ => Err(AssetError::scene_parse(path, "unsupported scene format")),
        }
    }
}

/// Split a polygon into a triangle fan. Triangles and degenerate faces pass through.
pub(crate) fn fan_triangulate(face: &[u32]) -> Vec<Vec<u32>> {
    if face.len() <= 3 {
        return vec![face.to_vec()];
    }
    (1..face.len() - 1)
        .map(|i| vec![face[0], face[i], face[i + 1]])
        .collect()
}
