//! Error taxonomy shared by the asset, gpu and resource crates.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Programmable pipeline stage of a shader source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("couldn't read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("couldn't decode image {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
    #[error("couldn't compile {stage} shader: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },
    #[error("couldn't link program: {log}")]
    ShaderLink { log: String },
    #[error("couldn't load scene {}: {reason}", path.display())]
    SceneParse { path: PathBuf, reason: String },
}

impl AssetError {
    /// File could not be opened or decoded. Callers resolving optional assets
    /// (material textures) log and skip these.
    pub fn is_io(&self) -> bool {
        matches!(self, AssetError::Io { .. } | AssetError::Decode { .. })
    }

    pub fn scene_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AssetError::SceneParse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;
