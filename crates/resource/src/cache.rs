//! Texture Cache: material texture references resolved at most once.

use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
    rc::Rc,
};

use asset::TextureRole;
use gpu::SharedDevice;

use crate::{
    config::CacheKeyPolicy,
    texture::{self, GpuTexture},
};

/// A texture as used by one mesh.
#[derive(Clone, Debug)]
pub struct MeshTexture {
    pub texture: Rc<GpuTexture>,
    pub role: TextureRole,
    /// Reference exactly as the material wrote it.
    pub path: String,
}

/// Grows for the lifetime of the registry; entries are never evicted.
#[derive(Debug, Default)]
pub struct TextureCache {
    policy: CacheKeyPolicy,
    entries: HashMap<String, MeshTexture>,
}

impl TextureCache {
    pub fn new(policy: CacheKeyPolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
        }
    }

    #[inline]
    pub fn policy(&self) -> CacheKeyPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&MeshTexture> {
        self.entries.get(key)
    }

    fn key_for(&self, reference: &str, directory: &Path) -> String {
        match self.policy {
            CacheKeyPolicy::ReferenceString => reference.to_owned(),
            CacheKeyPolicy::ResolvedPath => resolved_key(&directory.join(reference)),
        }
    }

    /// Resolve `references` for `role`, in order. References that fail to
    /// decode are logged and left out; the rest keep their relative order.
    pub fn resolve(
        &mut self,
        device: &SharedDevice,
        role: TextureRole,
        references: &[String],
        directory: &Path,
    ) -> Vec<MeshTexture> {
        let mut resolved = Vec::with_capacity(references.len());

        for reference in references {
            let key = self.key_for(reference, directory);
            if let Some(hit) = self.entries.get(&key) {
                log::debug!("texture cache hit: {key}");
                resolved.push(hit.clone());
                continue;
            }

            let path = directory.join(reference);
            match texture::load_texture_default(device, &path) {
                Ok(loaded) => {
                    let entry = MeshTexture {
                        texture: Rc::new(loaded),
                        role,
                        path: reference.clone(),
                    };
                    self.entries.insert(key, entry.clone());
                    resolved.push(entry);
                }
                Err(err) => {
                    log::warn!("skipping {} texture {}: {err}", role.uniform_name(), path.display());
                }
            }
        }

        resolved
    }
}

/// Canonical form of an existing file, lexical normalization otherwise, so
/// `a/./b.png`, `a/x/../b.png` and `a/b.png` share one key.
fn resolved_key(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| normalize_lexically(path))
        .to_string_lossy()
        .into_owned()
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) =>
            {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_normalization_folds_dots() {
        assert_eq!(normalize_lexically(Path::new("a/./b.png")), Path::new("a/b.png"));
        assert_eq!(normalize_lexically(Path::new("a/x/../b.png")), Path::new("a/b.png"));
        assert_eq!(normalize_lexically(Path::new("../b.png")), Path::new("../b.png"));
    }

    #[test]
    fn missing_files_still_share_a_key() {
        let cache = TextureCache::new(CacheKeyPolicy::ResolvedPath);
        let base = Path::new("no/such/models");
        assert_eq!(
            cache.key_for("crate.png", base),
            cache.key_for("./crate.png", &base.join("sub").join("..")),
        );
        assert_ne!(cache.key_for("crate.png", base), cache.key_for("crate.png", Path::new("no/such")));
    }
}
