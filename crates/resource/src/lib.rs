//! GPU-resident resources for the level editor.
//!
//! - `shader`: compile + link with cleanup on every failure path
//! - `texture`: decode and upload images
//! - `cache`: material textures deduplicated by reference
//! - `loader`: imported scenes converted into models
//! - `registry`: owner of everything above, plus entity → model lookups
//!
//! Everything runs synchronously on the thread that owns the GPU device.

pub mod cache;
pub mod config;
pub mod loader;
pub mod model;
pub mod primitive;
pub mod registry;
pub mod shader;
pub mod texture;

pub use cache::{MeshTexture, TextureCache};
pub use config::{CacheKeyPolicy, ResourceConfig};
pub use model::{Mesh, Model};
pub use primitive::PrimitiveGeometry;
pub use registry::ResourceRegistry;
pub use shader::ShaderProgram;
pub use texture::{GpuTexture, TextureOptions};
