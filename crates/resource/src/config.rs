//! Where assets live and how the texture cache keys them.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use asset::ImportOptions;
use corelib::{ModelType, ShaderKey, TextureKey};

/// Key under which a material texture is remembered by the [`TextureCache`](crate::TextureCache).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheKeyPolicy {
    /// The reference exactly as written in the material. Two models that use
    /// the same relative name share one entry even if the files differ.
    #[default]
    ReferenceString,
    /// The reference joined onto the model's directory, with `.` and `..`
    /// segments folded (symlinks too, when the file exists).
    ResolvedPath,
}

impl FromStr for CacheKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reference" => Ok(CacheKeyPolicy::ReferenceString),
            "resolved" => Ok(CacheKeyPolicy::ResolvedPath),
            other => Err(format!("unknown cache key policy '{other}' (expected reference|resolved)")),
        }
    }
}

impl fmt::Display for CacheKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheKeyPolicy::ReferenceString => "reference",
            CacheKeyPolicy::ResolvedPath => "resolved",
        })
    }
}

#[derive(Clone, Debug)]
pub struct ResourceConfig {
    /// Directory the fixed shader, texture and model paths are relative to.
    pub asset_root: PathBuf,
    pub cache_keys: CacheKeyPolicy,
    pub import: ImportOptions,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("./res"),
            cache_keys: CacheKeyPolicy::default(),
            import: ImportOptions::default(),
        }
    }
}

impl ResourceConfig {
    pub fn with_root(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            ..Self::default()
        }
    }

    pub fn model_path(&self, model: ModelType) -> PathBuf {
        self.asset_root.join(model.relative_path())
    }

    /// Vertex and fragment source paths of a fixed shader.
    pub fn shader_paths(&self, key: ShaderKey) -> (PathBuf, PathBuf) {
        let (vertex, fragment) = key.sources();
        (self.asset_root.join(vertex), self.asset_root.join(fragment))
    }

    pub fn texture_path(&self, key: TextureKey) -> PathBuf {
        self.asset_root.join(key.relative_path())
    }

    #[inline]
    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }
}
