//! Scene Loader: an imported scene turned into a [`Model`].
//!
//! Conversion is a pure walk over the node tree; texture resolution is
//! injected so the walk can be tested without a device.

use std::path::Path;

use asset::{
    ImportOptions, ImportedScene, SceneImporter, SourceMaterial, SourceMesh, TextureRole, Vertex,
};
use corelib::{Aabb, AssetResult, Vec3};
use gpu::SharedDevice;

use crate::{
    cache::{MeshTexture, TextureCache},
    model::{Mesh, Model},
};

/// Import `path`, validate it and build a model whose textures go through `cache`.
pub fn load_model_file(
    device: &SharedDevice,
    importer: &dyn SceneImporter,
    path: &Path,
    options: ImportOptions,
    cache: &mut TextureCache,
) -> AssetResult<Model> {
    let scene = importer.import(path, options)?;
    scene.validate(path)?;

    let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let meshes = convert_scene(&scene, |role, references| {
        cache.resolve(device, role, references, &directory)
    });

    let model = Model { directory, meshes };
    let extent = model.aabb();
    log::info!(
        "Loaded {}: {} mesh(es), {} vertices, extent {}..{}",
        path.display(),
        model.meshes.len(),
        model.vertex_count(),
        extent.min,
        extent.max
    );
    Ok(model)
}

/// Meshes in depth-first node order. `resolve` maps a role and its texture
/// references to the textures that could be loaded.
pub fn convert_scene<F>(scene: &ImportedScene, mut resolve: F) -> Vec<Mesh>
where
    F: FnMut(TextureRole, &[String]) -> Vec<MeshTexture>,
{
    let Some(root) = &scene.root else {
        return Vec::new();
    };

    root.mesh_order()
        .into_iter()
        .filter_map(|index| scene.meshes.get(index))
        .map(|source| convert_mesh(source, &scene.materials, &mut resolve))
        .collect()
}

fn convert_mesh<F>(source: &SourceMesh, materials: &[SourceMaterial], resolve: &mut F) -> Mesh
where
    F: FnMut(TextureRole, &[String]) -> Vec<MeshTexture>,
{
    let uvs = source.uv_channels.first();
    let vertices: Vec<Vertex> = source
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| {
            let normal = source.normals.get(i).copied().unwrap_or_default();
            let uv = uvs.and_then(|channel| channel.get(i)).copied().unwrap_or_default();
            Vertex::new(position, normal, uv)
        })
        .collect();
    let aabb = Aabb::from_points(source.positions.iter().copied().map(Vec3::from_array));

    let (triangles, others): (Vec<_>, Vec<_>) = source.faces.iter().partition(|face| face.len() == 3);
    if !others.is_empty() {
        log::warn!(
            "mesh '{}': dropping {} non-triangle face(s); import with triangulation",
            source.name,
            others.len()
        );
    }
    let indices = triangles.into_iter().flatten().copied().collect();

    let material = source.material.and_then(|index| {
        let found = materials.get(index);
        if found.is_none() {
            log::warn!("mesh '{}': material {index} does not exist, using default", source.name);
        }
        found
    });

    let diffuse_color = material
        .and_then(|m| m.diffuse_color)
        .map_or(Vec3::ONE, Vec3::from_array);

    let mut textures = Vec::new();
    if let Some(material) = material {
        for role in [TextureRole::Diffuse, TextureRole::Specular] {
            let references = material.textures(role);
            if !references.is_empty() {
                textures.extend(resolve(role, references));
            }
        }
    }

    Mesh {
        vertices,
        indices,
        textures,
        diffuse_color,
        aabb,
    }
}
