//! Asset preflight: loads every fixed shader, texture and model the level
//! editor needs on a headless device and reports what it found.

use std::{cell::RefCell, path::PathBuf, rc::Rc};

use anyhow::{Context, Result};
use corelib::{ModelType, ShaderKey, TextureKey};
use gpu::{SharedDevice, WgpuDevice, WgpuDeviceConfig};
use resource::{CacheKeyPolicy, PrimitiveGeometry, ResourceConfig, ResourceRegistry, TextureOptions};

fn parse_backend_arg() -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all();
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{other}', falling back to auto.");
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_config_args() -> ResourceConfig {
    let mut config = ResourceConfig::default();
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix("--asset-root=") {
            config.asset_root = PathBuf::from(val);
        } else if let Some(val) = arg.strip_prefix("--cache-keys=") {
            match val.parse::<CacheKeyPolicy>() {
                Ok(policy) => config.cache_keys = policy,
                Err(e) => log::warn!("{e}; keeping '{}'", config.cache_keys),
            }
        }
    }
    config
}

const GRID_HALF_EXTENT: f32 = 100.0;

/// Grid shaders are optional; a missing or broken one only costs the grid.
fn build_grid_shaders(registry: &mut ResourceRegistry) {
    for key in [ShaderKey::GridAxisLine, ShaderKey::GridAxisCheckerboard] {
        let (vertex, fragment) = registry.config().shader_paths(key);
        let geometry = match key {
            ShaderKey::GridAxisLine => PrimitiveGeometry::axis_lines(registry.device(), GRID_HALF_EXTENT),
            _ => PrimitiveGeometry::unit_cube(registry.device()),
        };
        if let Err(e) = registry.build_shader_with_geometry(key, &vertex, &fragment, geometry) {
            log::warn!("Optional shader {} unavailable: {e}", key.name());
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let backends = parse_backend_arg();
    let config = parse_config_args();
    log::info!(
        "Preflight. Backend: {:?}, asset_root={}, cache_keys={}",
        backends,
        config.asset_root.display(),
        config.cache_keys
    );

    let device = WgpuDevice::headless(backends, WgpuDeviceConfig::default())
        .context("couldn't create a GPU device")?;
    let device: SharedDevice = Rc::new(RefCell::new(device));

    let mut registry = ResourceRegistry::new(Rc::clone(&device), config);
    registry
        .initialise()
        .context("required resources failed to load")?;

    build_grid_shaders(&mut registry);
    if let Err(e) = registry.load_fixed_texture(TextureKey::Cursor, TextureOptions::default()) {
        log::warn!("Cursor texture unavailable: {e}");
    }

    for model in ModelType::ALL {
        let loaded = registry.model(model);
        let extent = loaded.aabb();
        log::info!(
            "{model} ({}): {} mesh(es), size {}",
            model.id(),
            loaded.meshes.len(),
            extent.size()
        );
    }
    log::info!(
        "{} cached material texture(s), {} live GPU object(s)",
        registry.cached_texture_count(),
        device.borrow().live_objects()
    );

    drop(registry);
    log::info!("Released resources; {} GPU object(s) left", device.borrow().live_objects());
    Ok(())
}
