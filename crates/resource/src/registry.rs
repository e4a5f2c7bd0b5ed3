//! Resource Registry: the owner of every loaded shader, fixed texture and
//! model, plus the entity → model table.
//!
//! Keys form closed sets known at build time, so the plain accessors treat a
//! missing entry as a programming error and panic; `try_*` variants exist for
//! callers that want to probe. Dropping the registry releases every GPU object
//! it owns.

use std::{collections::HashMap, path::Path};

use asset::{FileImporter, SceneImporter};
use corelib::{AssetResult, EntityId, ModelType, ShaderKey, TextureKey};
use gpu::SharedDevice;

use crate::{
    cache::TextureCache,
    config::ResourceConfig,
    loader,
    model::Model,
    primitive::PrimitiveGeometry,
    shader::{self, ShaderProgram},
    texture::{self, GpuTexture, TextureOptions},
};

pub struct ResourceRegistry {
    device: SharedDevice,
    config: ResourceConfig,
    importer: Box<dyn SceneImporter>,
    shaders: HashMap<ShaderKey, ShaderProgram>,
    textures: HashMap<TextureKey, GpuTexture>,
    models: HashMap<ModelType, Model>,
    entity_models: HashMap<EntityId, ModelType>,
    texture_cache: TextureCache,
}

impl ResourceRegistry {
    pub fn new(device: SharedDevice, config: ResourceConfig) -> Self {
        Self::with_importer(device, config, FileImporter)
    }

    pub fn with_importer(
        device: SharedDevice,
        config: ResourceConfig,
        importer: impl SceneImporter + 'static,
    ) -> Self {
        let texture_cache = TextureCache::new(config.cache_keys);
        Self {
            device,
            config,
            importer: Box::new(importer),
            shaders: HashMap::new(),
            textures: HashMap::new(),
            models: HashMap::new(),
            entity_models: HashMap::new(),
            texture_cache,
        }
    }

    /// Build the required shaders, then load every model type.
    ///
    /// Models are loaded eagerly so nothing is parsed or uploaded once the
    /// editor is running. Any failure here is fatal for startup and is
    /// returned unchanged.
    pub fn initialise(&mut self) -> AssetResult<()> {
        for key in ShaderKey::REQUIRED {
            if let Err(err) = self.build_fixed_shader(key) {
                log::error!("couldn't create required shader {}: {err}", key.name());
                return Err(err);
            }
        }

        for model in ModelType::ALL {
            if let Err(err) = self.load_model(model) {
                log::error!("couldn't load model {model}: {err}");
                return Err(err);
            }
        }

        log::info!(
            "Resources ready: {} shader(s), {} model(s), {} cached texture(s)",
            self.shaders.len(),
            self.models.len(),
            self.texture_cache.len()
        );
        Ok(())
    }

    /// Compile and link a program and store it under `key`, replacing any
    /// previous program with that key.
    pub fn build_shader(
        &mut self,
        key: ShaderKey,
        vertex_path: &Path,
        fragment_path: &Path,
    ) -> AssetResult<&ShaderProgram> {
        let program = shader::build_program(&self.device, vertex_path, fragment_path)?;
        Ok(self.insert_shader(key, program))
    }

    /// Like [`build_shader`](Self::build_shader), with buffers for a primitive-only program.
    pub fn build_shader_with_geometry(
        &mut self,
        key: ShaderKey,
        vertex_path: &Path,
        fragment_path: &Path,
        geometry: PrimitiveGeometry,
    ) -> AssetResult<&ShaderProgram> {
        let program = shader::build_program(&self.device, vertex_path, fragment_path)?;
        Ok(self.insert_shader(key, program.with_geometry(geometry)))
    }

    /// Build `key` from its sources under the asset root.
    pub fn build_fixed_shader(&mut self, key: ShaderKey) -> AssetResult<&ShaderProgram> {
        let (vertex, fragment) = self.config.shader_paths(key);
        self.build_shader(key, &vertex, &fragment)
    }

    fn insert_shader(&mut self, key: ShaderKey, program: ShaderProgram) -> &ShaderProgram {
        if self.shaders.insert(key, program).is_some() {
            log::debug!("replaced shader {}", key.name());
        }
        log::debug!("shader {} ({}) ready", key.name(), key.id());
        &self.shaders[&key]
    }

    /// Load a fixed texture from `path` and store it under `key`.
    pub fn load_texture(
        &mut self,
        key: TextureKey,
        path: &Path,
        options: TextureOptions,
    ) -> AssetResult<&GpuTexture> {
        let loaded = texture::load_texture(&self.device, path, options)?;
        self.textures.insert(key, loaded);
        Ok(&self.textures[&key])
    }

    /// Load `key` from its path under the asset root.
    pub fn load_fixed_texture(
        &mut self,
        key: TextureKey,
        options: TextureOptions,
    ) -> AssetResult<&GpuTexture> {
        let path = self.config.texture_path(key);
        self.load_texture(key, &path, options)
    }

    /// Load `model` unless it is already loaded; a second call neither parses
    /// nor uploads anything.
    pub fn load_model(&mut self, model: ModelType) -> AssetResult<&Model> {
        if !self.models.contains_key(&model) {
            let path = self.config.model_path(model);
            let loaded = loader::load_model_file(
                &self.device,
                self.importer.as_ref(),
                &path,
                self.config.import,
                &mut self.texture_cache,
            )?;
            self.models.insert(model, loaded);
        }
        Ok(&self.models[&model])
    }

    pub fn associate_entity(&mut self, entity: EntityId, model: ModelType) {
        if let Some(previous) = self.entity_models.insert(entity, model) {
            if previous != model {
                log::debug!("{entity} now uses {model} instead of {previous}");
            }
        }
    }

    /// Forget the entity's model. Entities without one are ignored.
    pub fn dissociate_entity(&mut self, entity: EntityId) {
        self.entity_models.remove(&entity);
    }

    pub fn model_type_of(&self, entity: EntityId) -> Option<ModelType> {
        self.entity_models.get(&entity).copied()
    }

    /// # Panics
    ///
    /// If the entity has no model or its model was never loaded.
    pub fn model_for_entity(&self, entity: EntityId) -> &Model {
        let model = self
            .model_type_of(entity)
            .unwrap_or_else(|| panic!("{entity} has no associated model"));
        self.model(model)
    }

    pub fn try_model_for_entity(&self, entity: EntityId) -> Option<&Model> {
        self.try_model(self.model_type_of(entity)?)
    }

    /// # Panics
    ///
    /// If `key` was never built.
    pub fn shader(&self, key: ShaderKey) -> &ShaderProgram {
        self.try_shader(key)
            .unwrap_or_else(|| panic!("shader {} was never built", key.name()))
    }

    pub fn try_shader(&self, key: ShaderKey) -> Option<&ShaderProgram> {
        self.shaders.get(&key)
    }

    /// # Panics
    ///
    /// If `key` was never loaded.
    pub fn texture(&self, key: TextureKey) -> &GpuTexture {
        self.try_texture(key)
            .unwrap_or_else(|| panic!("texture {} was never loaded", key.name()))
    }

    pub fn try_texture(&self, key: TextureKey) -> Option<&GpuTexture> {
        self.textures.get(&key)
    }

    /// # Panics
    ///
    /// If `model` was never loaded.
    pub fn model(&self, model: ModelType) -> &Model {
        self.try_model(model)
            .unwrap_or_else(|| panic!("model {model} was never loaded"))
    }

    pub fn try_model(&self, model: ModelType) -> Option<&Model> {
        self.models.get(&model)
    }

    pub fn has_model(&self, model: ModelType) -> bool {
        self.models.contains_key(&model)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn cached_texture_count(&self) -> usize {
        self.texture_cache.len()
    }

    #[inline]
    pub fn texture_cache(&self) -> &TextureCache {
        &self.texture_cache
    }

    #[inline]
    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    #[inline]
    pub fn device(&self) -> &SharedDevice {
        &self.device
    }
}
