//! CPU-side asset decoding: images, scene import and vertex data.
//! Nothing in here touches the GPU; see the `gpu` and `resource` crates.

pub mod gltf_scene;
pub mod image;
pub mod mesh;
pub mod obj;
pub mod scene;

pub use image::ImageData;
pub use mesh::Vertex;
pub use scene::{
    FileImporter, ImportOptions, ImportedScene, SceneImporter, SceneNode, SourceMaterial,
    SourceMesh, TextureRole,
};
