//! Wavefront OBJ import through `tobj`.
//!
//! Every OBJ object becomes one child of a synthetic root node holding exactly
//! one mesh, so mesh order follows object order in the file.

use std::path::Path;

use anyhow::{Context, Result};
use corelib::{AssetError, AssetResult};

use crate::scene::{
    ImportOptions, ImportedScene, SceneImporter, SceneNode, SourceMaterial, SourceMesh,
    fan_triangulate,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct ObjImporter;

impl SceneImporter for ObjImporter {
    fn import(&self, path: &Path, options: ImportOptions) -> AssetResult<ImportedScene> {
        load_obj_from_path(path, options)
            .map_err(|e| AssetError::scene_parse(path, format!("{e:#}")))
    }
}

/// Load an OBJ scene (and its `.mtl` libraries) from a file path.
pub fn load_obj_from_path(path: &Path, options: ImportOptions) -> Result<ImportedScene> {
    let load_options = tobj::LoadOptions {
        triangulate: options.triangulate,
        single_index: true,
        ..Default::default()
    };
    let (models, materials) = tobj::load_obj(path, &load_options)
        .with_context(|| format!("Failed to parse OBJ file: {}", path.display()))?;

    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            log::warn!(
                "{}: material library failed to load ({e}); using default materials",
                path.display()
            );
            Vec::new()
        }
    };

    let mut children = Vec::with_capacity(models.len());
    let mut meshes = Vec::with_capacity(models.len());
    for (index, model) in models.into_iter().enumerate() {
        let mesh = convert_mesh(&model, materials.len(), options);
        children.push(SceneNode::new(model.name, vec![index], Vec::new()));
        meshes.push(mesh);
    }

    Ok(ImportedScene {
        root: Some(SceneNode::new("root", Vec::new(), children)),
        meshes,
        materials: materials.iter().map(convert_material).collect(),
        incomplete: false,
    })
}

fn convert_mesh(model: &tobj::Model, material_count: usize, options: ImportOptions) -> SourceMesh {
    let mesh = &model.mesh;

    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
        .collect();
    let normals: Vec<[f32; 3]> = mesh
        .normals
        .chunks_exact(3)
        .map(|n| [n[0] as f32, n[1] as f32, n[2] as f32])
        .collect();

    let mut uv_channels = Vec::new();
    if !mesh.texcoords.is_empty() {
        let uvs = mesh
            .texcoords
            .chunks_exact(2)
            .map(|t| {
                let v = t[1] as f32;
                [t[0] as f32, if options.flip_uvs { 1.0 - v } else { v }]
            })
            .collect();
        uv_channels.push(uvs);
    }

    let faces = if mesh.face_arities.is_empty() {
        mesh.indices.chunks(3).map(<[u32]>::to_vec).collect()
    } else {
        let mut faces = Vec::with_capacity(mesh.face_arities.len());
        let mut start = 0usize;
        for &arity in &mesh.face_arities {
            let end = start + arity as usize;
            let face = &mesh.indices[start..end.min(mesh.indices.len())];
            if options.triangulate {
                faces.extend(fan_triangulate(face));
            } else {
                faces.push(face.to_vec());
            }
            start = end;
        }
        faces
    };

    SourceMesh {
        name: model.name.clone(),
        positions,
        normals,
        uv_channels,
        faces,
        material: mesh.material_id.filter(|&id| id < material_count),
    }
}

fn convert_material(material: &tobj::Material) -> SourceMaterial {
    SourceMaterial {
        name: material.name.clone(),
        diffuse_color: material
            .diffuse
            .map(|[r, g, b]| [r as f32, g as f32, b as f32]),
        diffuse_textures: material.diffuse_texture.iter().cloned().collect(),
        specular_textures: material.specular_texture.iter().cloned().collect(),
    }
}
