//! Core shared types: bounding volumes, stable resource keys, entity ids, errors.
//! Renderer-agnostic; every other crate in the workspace builds on these.

pub use glam::{Vec2, Vec3, vec3};

pub mod aabb;
pub mod entity;
pub mod error;
pub mod hash;
pub mod ids;

pub use aabb::Aabb;
pub use entity::EntityId;
pub use error::{AssetError, AssetResult, ShaderStage};
pub use ids::{ModelType, ResourceId, ShaderKey, TextureKey};
