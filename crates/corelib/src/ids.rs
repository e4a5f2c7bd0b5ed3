//! Closed sets of fixed, named resources and their stable integer keys.
//!
//! Every key is `fnv1a(name)`, so the same name produces the same
//! [`ResourceId`] across runs and builds.

use std::fmt;

use crate::hash::fnv1a;

/// Small integer key derived from a human-readable resource name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub u32);

impl ResourceId {
    #[inline]
    pub const fn from_name(name: &str) -> Self {
        Self(fnv1a(name))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Shader programs known at build time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderKey {
    LevelEditorModelWithTexture,
    LevelEditorModelWithoutTexture,
    Primitive,
    GridAxisLine,
    GridAxisCheckerboard,
}

impl ShaderKey {
    pub const ALL: [ShaderKey; 5] = [
        ShaderKey::LevelEditorModelWithTexture,
        ShaderKey::LevelEditorModelWithoutTexture,
        ShaderKey::Primitive,
        ShaderKey::GridAxisLine,
        ShaderKey::GridAxisCheckerboard,
    ];

    /// Programs the editor cannot start without.
    pub const REQUIRED: [ShaderKey; 3] = [
        ShaderKey::LevelEditorModelWithTexture,
        ShaderKey::LevelEditorModelWithoutTexture,
        ShaderKey::Primitive,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ShaderKey::LevelEditorModelWithTexture => "LevelEditorModelWithTexture",
            ShaderKey::LevelEditorModelWithoutTexture => "LevelEditorModelWithoutTextureShader",
            ShaderKey::Primitive => "Primitive",
            ShaderKey::GridAxisLine => "GridAxisLine",
            ShaderKey::GridAxisCheckerboard => "GridAxisCheckerboard",
        }
    }

    #[inline]
    pub const fn id(self) -> ResourceId {
        ResourceId::from_name(self.name())
    }

    /// Vertex and fragment source paths, relative to the asset root.
    pub const fn sources(self) -> (&'static str, &'static str) {
        match self {
            ShaderKey::LevelEditorModelWithTexture => (
                "shaders/level_editor_model_with_textures.vert.wgsl",
                "shaders/level_editor_model_with_textures.frag.wgsl",
            ),
            ShaderKey::LevelEditorModelWithoutTexture => (
                "shaders/level_editor_model_without_textures.vert.wgsl",
                "shaders/level_editor_model_without_textures.frag.wgsl",
            ),
            ShaderKey::Primitive => (
                "shaders/primitive.vert.wgsl",
                "shaders/primitive.frag.wgsl",
            ),
            ShaderKey::GridAxisLine => (
                "shaders/grid_axis_line.vert.wgsl",
                "shaders/grid_axis_line.frag.wgsl",
            ),
            ShaderKey::GridAxisCheckerboard => (
                "shaders/grid_axis_checkerboard.vert.wgsl",
                "shaders/grid_axis_checkerboard.frag.wgsl",
            ),
        }
    }
}

/// Fixed textures loaded by explicit key (as opposed to material textures).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKey {
    Cursor,
}

impl TextureKey {
    pub const ALL: [TextureKey; 1] = [TextureKey::Cursor];

    pub const fn name(self) -> &'static str {
        match self {
            TextureKey::Cursor => "Cursor",
        }
    }

    #[inline]
    pub const fn id(self) -> ResourceId {
        ResourceId::from_name(self.name())
    }

    pub const fn relative_path(self) -> &'static str {
        match self {
            TextureKey::Cursor => "textures/cursor.png",
        }
    }
}

/// Model assets the editor can place. Closed set; each maps to one file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelType {
    Maze,
    Ball,
}

impl ModelType {
    pub const ALL: [ModelType; 2] = [ModelType::Maze, ModelType::Ball];

    pub const fn name(self) -> &'static str {
        match self {
            ModelType::Maze => "maze",
            ModelType::Ball => "ball",
        }
    }

    #[inline]
    pub const fn id(self) -> ResourceId {
        ResourceId::from_name(self.name())
    }

    pub const fn relative_path(self) -> &'static str {
        match self {
            ModelType::Maze => "models/maze.obj",
            ModelType::Ball => "models/ball.obj",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn keys_are_stable_name_hashes() {
        assert_eq!(ShaderKey::Primitive.id(), ResourceId(fnv1a("Primitive")));
        assert_eq!(TextureKey::Cursor.id(), ResourceId(fnv1a("Cursor")));
        assert_eq!(ModelType::Ball.id(), ResourceId::from_name("ball"));
    }

    #[test]
    fn shader_keys_do_not_collide() {
        let ids: HashSet<_> = ShaderKey::ALL.iter().map(|k| k.id()).collect();
        assert_eq!(ids.len(), ShaderKey::ALL.len());
    }

    #[test]
    fn required_shaders_are_a_subset() {
        for key in ShaderKey::REQUIRED {
            assert!(ShaderKey::ALL.contains(&key));
        }
    }
}
