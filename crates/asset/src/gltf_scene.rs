//! glTF 2.0 import (`.gltf` and `.glb`) through the `gltf` crate.
//!
//! The default scene (or the first one) becomes the children of a synthetic
//! root. Each primitive is imported as its own mesh, so a node referencing a
//! glTF mesh with three primitives lists three mesh indices.

use std::path::Path;

use anyhow::{Context, Result};
use corelib::{AssetError, AssetResult};
use gltf::mesh::Mode;

use crate::scene::{
    ImportOptions, ImportedScene, SceneImporter, SceneNode, SourceMaterial, SourceMesh,
    fan_triangulate,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct GltfImporter;

impl SceneImporter for GltfImporter {
    fn import(&self, path: &Path, options: ImportOptions) -> AssetResult<ImportedScene> {
        load_gltf_from_path(path, options)
            .map_err(|e| AssetError::scene_parse(path, format!("{e:#}")))
    }
}

pub fn load_gltf_from_path(path: &Path, options: ImportOptions) -> Result<ImportedScene> {
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path)
        .with_context(|| format!("Failed to parse glTF file: {}", path.display()))?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob)
        .with_context(|| format!("Failed to load buffers of {}", path.display()))?;

    let materials = document.materials().map(convert_material).collect();

    let mut meshes = Vec::new();
    // glTF mesh index -> imported mesh indices, one per kept primitive
    let mut primitive_meshes: Vec<Vec<usize>> = Vec::with_capacity(document.meshes().len());
    for mesh in document.meshes() {
        let mut imported = Vec::new();
        for primitive in mesh.primitives() {
            if let Some(source) = convert_primitive(&mesh, &primitive, &buffers, options)? {
                imported.push(meshes.len());
                meshes.push(source);
            }
        }
        primitive_meshes.push(imported);
    }

    let root = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .map(|scene| {
            let children = scene
                .nodes()
                .map(|node| convert_node(&node, &primitive_meshes))
                .collect();
            SceneNode::new(scene.name().unwrap_or("root"), Vec::new(), children)
        });

    Ok(ImportedScene {
        root,
        meshes,
        materials,
        incomplete: false,
    })
}

fn convert_node(node: &gltf::Node<'_>, primitive_meshes: &[Vec<usize>]) -> SceneNode {
    let meshes = node
        .mesh()
        .and_then(|mesh| primitive_meshes.get(mesh.index()))
        .cloned()
        .unwrap_or_default();
    let children = node
        .children()
        .map(|child| convert_node(&child, primitive_meshes))
        .collect();
    SceneNode::new(node.name().unwrap_or_default(), meshes, children)
}

fn convert_primitive(
    mesh: &gltf::Mesh<'_>,
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
    options: ImportOptions,
) -> Result<Option<SourceMesh>> {
    let name = format!("{}#{}", mesh.name().unwrap_or("mesh"), primitive.index());
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .with_context(|| format!("Primitive {name} has no positions"))?
        .collect();
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|normals| normals.collect())
        .unwrap_or_default();
    let uv_channels: Vec<Vec<[f32; 2]>> = reader
        .read_tex_coords(0)
        .map(|uvs| {
            uvs.into_f32()
                .map(|[u, v]| [u, if options.flip_uvs { 1.0 - v } else { v }])
                .collect()
        })
        .into_iter()
        .collect();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let faces = match primitive.mode() {
        Mode::Triangles => indices.chunks(3).map(<[u32]>::to_vec).collect(),
        Mode::TriangleStrip if options.triangulate => strip_triangles(&indices),
        Mode::TriangleFan if options.triangulate => fan_triangulate(&indices),
        // A fan's outline is already a polygon.
        Mode::TriangleFan => vec![indices],
        Mode::TriangleStrip => {
            log::warn!("Skipping strip primitive {name}: strips need triangulation");
            return Ok(None);
        }
        other => {
            log::warn!("Skipping {other:?} primitive {name}: only triangle topologies are imported");
            return Ok(None);
        }
    };

    Ok(Some(SourceMesh {
        name,
        positions,
        normals,
        uv_channels,
        faces,
        material: primitive.material().index(),
    }))
}

/// Unroll a triangle strip, alternating winding so every triangle faces the same way.
fn strip_triangles(indices: &[u32]) -> Vec<Vec<u32>> {
    indices
        .windows(3)
        .enumerate()
        .map(|(i, w)| {
            if i % 2 == 0 {
                vec![w[0], w[1], w[2]]
            } else {
                vec![w[1], w[0], w[2]]
            }
        })
        .collect()
}

fn convert_material(material: gltf::Material<'_>) -> SourceMaterial {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();

    let diffuse_textures = pbr
        .base_color_texture()
        .and_then(|info| texture_reference(&info.texture()))
        .into_iter()
        .collect();
    let specular_textures = material
        .specular()
        .and_then(|specular| specular.specular_texture())
        .and_then(|info| texture_reference(&info.texture()))
        .into_iter()
        .collect();

    SourceMaterial {
        name: material.name().unwrap_or_default().to_string(),
        diffuse_color: Some([r, g, b]),
        diffuse_textures,
        specular_textures,
    }
}

/// File reference of a texture's image, percent-decoded.
///
/// `None` for images embedded in a buffer view or inlined as a `data:` URI.
fn texture_reference(texture: &gltf::Texture<'_>) -> Option<String> {
    match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } if uri.starts_with("data:") => {
            log::debug!("Image {} is an inline data URI, not a file; skipped", texture.source().index());
            None
        }
        gltf::image::Source::Uri { uri, .. } => match urlencoding::decode(uri) {
            Ok(decoded) => Some(decoded.into_owned()),
            Err(e) => {
                log::warn!("Image URI {uri} is not valid UTF-8 once decoded ({e}); using it as written");
                Some(uri.to_string())
            }
        },
        gltf::image::Source::View { .. } => {
            log::debug!(
                "Image {} is embedded in a buffer view, not a file; skipped",
                texture.source().index()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    // One triangle (positions, uvs, u16 indices) in a base64 data URI. Node 0
    // has two children: node 1 draws mesh 0, node 2 draws mesh 1 which has
    // two primitives.
    const HIERARCHY_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [
            { "name": "a", "children": [1, 2] },
            { "name": "b", "mesh": 0 },
            { "name": "c", "mesh": 1 }
        ],
        "meshes": [
            { "name": "first", "primitives": [
                { "attributes": { "POSITION": 0, "TEXCOORD_0": 1 }, "indices": 2 }
            ] },
            { "name": "second", "primitives": [
                { "attributes": { "POSITION": 0 }, "indices": 2 },
                { "attributes": { "POSITION": 0 }, "indices": 2, "material": 0 }
            ] }
        ],
        "materials": [
            { "name": "painted", "pbrMetallicRoughness": {
                "baseColorFactor": [0.25, 0.5, 0.75, 1.0],
                "baseColorTexture": { "index": 0 }
            } }
        ],
        "textures": [ { "source": 0 } ],
        "images": [ { "uri": "albedo.png" } ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" },
            { "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 24 },
            { "buffer": 0, "byteOffset": 60, "byteLength": 6 }
        ],
        "buffers": [ {
            "byteLength": 68,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAABAAIAAAA="
        } ]
    }"#;

    // One node drawing a line primitive, a triangle, a strip and a fan. The
    // materials cover a percent-encoded URI with a specular texture, an image
    // stored in a buffer view and an inline data URI image.
    const VARIANTS_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "extensionsUsed": ["KHR_materials_specular"],
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "name": "mixed", "mesh": 0 } ],
        "meshes": [
            { "name": "mixed", "primitives": [
                { "attributes": { "POSITION": 0 }, "mode": 1 },
                { "attributes": { "POSITION": 0 }, "indices": 2, "material": 0 },
                { "attributes": { "POSITION": 0 }, "indices": 3, "mode": 5, "material": 1 },
                { "attributes": { "POSITION": 0 }, "indices": 3, "mode": 6, "material": 2 }
            ] }
        ],
        "materials": [
            { "name": "decoded",
              "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } },
              "extensions": { "KHR_materials_specular": { "specularTexture": { "index": 1 } } } },
            { "name": "embedded", "pbrMetallicRoughness": { "baseColorTexture": { "index": 2 } } },
            { "name": "inline", "pbrMetallicRoughness": { "baseColorTexture": { "index": 3 } } }
        ],
        "textures": [ { "source": 0 }, { "source": 1 }, { "source": 2 }, { "source": 3 } ],
        "images": [
            { "uri": "albedo%20map.png" },
            { "uri": "spec.png" },
            { "bufferView": 2, "mimeType": "image/png" },
            { "uri": "data:image/png;base64,AAAA" }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" },
            { "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" },
            { "bufferView": 3, "componentType": 5123, "count": 4, "type": "SCALAR" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 24 },
            { "buffer": 0, "byteOffset": 60, "byteLength": 6 },
            { "buffer": 1, "byteOffset": 0, "byteLength": 8 }
        ],
        "buffers": [
            { "byteLength": 68,
              "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAABAAIAAAA=" },
            { "byteLength": 8, "uri": "data:application/octet-stream;base64,AAABAAIAAQA=" }
        ]
    }"#;

    fn import_json(json: &str, options: ImportOptions) -> ImportedScene {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.gltf");
        fs::write(&path, json).unwrap();
        let scene = GltfImporter.import(&path, options).expect("import gltf");
        scene.validate(&path).expect("valid scene");
        scene
    }

    fn import_fixture() -> ImportedScene {
        import_json(HIERARCHY_GLTF, ImportOptions::default())
    }

    fn material_named<'s>(scene: &'s ImportedScene, name: &str) -> &'s SourceMaterial {
        scene
            .materials
            .iter()
            .find(|material| material.name == name)
            .unwrap_or_else(|| panic!("no material {name}"))
    }

    #[test]
    fn primitives_follow_node_order() {
        let scene = import_fixture();
        assert_eq!(scene.meshes.len(), 3);

        let root = scene.root.as_ref().unwrap();
        assert_eq!(root.children.len(), 1);
        let a = &root.children[0];
        assert_eq!(a.name, "a");
        assert_eq!(a.children[0].meshes, vec![0]);
        assert_eq!(a.children[1].meshes, vec![1, 2]);
        assert_eq!(root.mesh_order(), vec![0, 1, 2]);

        assert_eq!(scene.meshes[0].faces, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn reads_material_and_flips_uvs() {
        let scene = import_fixture();
        assert_eq!(scene.meshes[0].uv_channels[0][1], [1.0, 1.0]);
        assert!(scene.meshes[1].uv_channels.is_empty());

        assert_eq!(scene.meshes[1].material, None);
        let material = &scene.materials[scene.meshes[2].material.unwrap()];
        assert_eq!(material.diffuse_color, Some([0.25, 0.5, 0.75]));
        assert_eq!(material.diffuse_textures, vec!["albedo.png".to_string()]);
        assert!(material.specular_textures.is_empty());
    }

    #[test]
    fn strip_keeps_winding() {
        assert_eq!(
            strip_triangles(&[0, 1, 2, 3]),
            vec![vec![0, 1, 2], vec![2, 1, 3]]
        );
    }

    #[test]
    fn texture_uris_are_percent_decoded() {
        let scene = import_json(VARIANTS_GLTF, ImportOptions::default());
        let decoded = material_named(&scene, "decoded");
        assert_eq!(decoded.diffuse_textures, vec!["albedo map.png".to_string()]);
        assert_eq!(decoded.specular_textures, vec!["spec.png".to_string()]);
    }

    #[test]
    fn embedded_and_inline_images_are_not_references() {
        let scene = import_json(VARIANTS_GLTF, ImportOptions::default());
        assert!(material_named(&scene, "embedded").diffuse_textures.is_empty());
        assert!(material_named(&scene, "inline").diffuse_textures.is_empty());
    }

    #[test]
    fn line_primitives_are_skipped() {
        let scene = import_json(VARIANTS_GLTF, ImportOptions::default());
        let names: Vec<&str> = scene.meshes.iter().map(|mesh| mesh.name.as_str()).collect();
        assert_eq!(names, vec!["mixed#1", "mixed#2", "mixed#3"]);

        let root = scene.root.as_ref().unwrap();
        assert_eq!(root.mesh_order(), vec![0, 1, 2]);
    }

    #[test]
    fn strips_and_fans_are_triangulated_on_request() {
        let scene = import_json(VARIANTS_GLTF, ImportOptions::default());
        assert_eq!(scene.meshes[1].faces, vec![vec![0, 1, 2], vec![2, 1, 1]]);
        assert_eq!(scene.meshes[2].faces, vec![vec![0, 1, 2], vec![0, 2, 1]]);
    }

    #[test]
    fn fans_stay_polygons_without_triangulation() {
        let options = ImportOptions {
            triangulate: false,
            ..ImportOptions::default()
        };
        let scene = import_json(VARIANTS_GLTF, options);

        // The strip cannot be expressed as polygons and is dropped.
        let names: Vec<&str> = scene.meshes.iter().map(|mesh| mesh.name.as_str()).collect();
        assert_eq!(names, vec!["mixed#1", "mixed#3"]);
        assert_eq!(scene.meshes[0].faces, vec![vec![0, 1, 2]]);
        assert_eq!(scene.meshes[1].faces, vec![vec![0, 1, 2, 1]]);
    }
}
