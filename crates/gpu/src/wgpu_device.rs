//! [`GpuDevice`] on top of `wgpu`.
//!
//! wgpu has no separate compile/link objects, so they are emulated:
//! - a stage is a `wgpu::ShaderModule` (WGSL), created inside a validation
//!   error scope whose error text becomes the stage log;
//! - linking builds a `wgpu::RenderPipeline` from the attached vertex and
//!   fragment modules (`vs_main` / `fs_main`, model [`Vertex`] layout), again
//!   inside an error scope.
//!
//! Textures keep their level-0 pixels until [`GpuDevice::generate_mipmaps`]
//! downsamples them on the CPU and writes the rest of the chain.

use std::collections::HashMap;

use asset::Vertex;
use corelib::ShaderStage;
use image::{ImageBuffer, Luma, LumaA, Pixel, Rgba, imageops};
use wgpu::util::DeviceExt;

use crate::device::{
    BufferHandle, BufferKind, FilterMode, GpuDevice, PixelFormat, ProgramHandle, StageHandle,
    TextureHandle, TextureUpload, WrapMode,
};

const VERTEX_ENTRY: &str = "vs_main";
const FRAGMENT_ENTRY: &str = "fs_main";

/// Vertex buffer layout every linked pipeline expects: position, normal, uv.
pub const MODEL_VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: Vertex::STRIDE,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
};

/// Render target formats linked pipelines are built for.
#[derive(Clone, Copy, Debug)]
pub struct WgpuDeviceConfig {
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
}

impl Default for WgpuDeviceConfig {
    fn default() -> Self {
        Self {
            color_format: wgpu::TextureFormat::Rgba8UnormSrgb,
            depth_format: Some(wgpu::TextureFormat::Depth32Float),
        }
    }
}

/// Failure to bring up an offscreen device.
#[derive(Debug, thiserror::Error)]
pub enum HeadlessError {
    #[error("no suitable GPU adapter for backends {0:?}")]
    NoAdapter(wgpu::Backends),
    #[error("request_device failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

struct TextureSlot {
    texture: Option<wgpu::Texture>,
    view: Option<wgpu::TextureView>,
    sampler: Option<wgpu::Sampler>,
    /// Channel layout as stored on the GPU (RGB is widened to RGBA).
    format: PixelFormat,
    width: u32,
    height: u32,
    /// Level-0 pixels, kept until mipmaps are generated.
    base_level: Vec<u8>,
    wrap: [wgpu::AddressMode; 2],
    filter: [wgpu::FilterMode; 2],
}

struct StageSlot {
    stage: ShaderStage,
    module: Option<wgpu::ShaderModule>,
    log: String,
}

#[derive(Default)]
struct ProgramSlot {
    stages: Vec<StageHandle>,
    pipeline: Option<wgpu::RenderPipeline>,
    log: String,
}

pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: WgpuDeviceConfig,
    next_id: u32,
    textures: HashMap<u32, TextureSlot>,
    stages: HashMap<u32, StageSlot>,
    programs: HashMap<u32, ProgramSlot>,
    buffers: HashMap<u32, wgpu::Buffer>,
}

impl WgpuDevice {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, config: WgpuDeviceConfig) -> Self {
        Self {
            device,
            queue,
            config,
            next_id: 0,
            textures: HashMap::new(),
            stages: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
        }
    }

    /// Create a device with no surface, for tools and tests.
    pub fn headless(backends: wgpu::Backends, config: WgpuDeviceConfig) -> Result<Self, HeadlessError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(HeadlessError::NoAdapter(backends))?;
        let info = adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Asset device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        Ok(Self::new(device, queue, config))
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn texture_view(&self, texture: TextureHandle) -> Option<&wgpu::TextureView> {
        self.textures.get(&texture.0)?.view.as_ref()
    }

    pub fn sampler(&self, texture: TextureHandle) -> Option<&wgpu::Sampler> {
        self.textures.get(&texture.0)?.sampler.as_ref()
    }

    pub fn pipeline(&self, program: ProgramHandle) -> Option<&wgpu::RenderPipeline> {
        self.programs.get(&program.0)?.pipeline.as_ref()
    }

    pub fn buffer(&self, buffer: BufferHandle) -> Option<&wgpu::Buffer> {
        self.buffers.get(&buffer.0)
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Run `create` inside a validation error scope and return the error text, if any.
    fn scoped<T>(&self, create: impl FnOnce(&wgpu::Device) -> T) -> (T, Option<String>) {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(&self.device);
        let error = pollster::block_on(self.device.pop_error_scope());
        (value, error.map(|e| e.to_string()))
    }

    fn rebuild_sampler(device: &wgpu::Device, slot: &mut TextureSlot) {
        slot.sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Texture sampler"),
            address_mode_u: slot.wrap[0],
            address_mode_v: slot.wrap[1],
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: slot.filter[1],
            min_filter: slot.filter[0],
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        }));
    }

    fn write_level(&self, texture: &wgpu::Texture, level: u32, slot: &TextureSlot, pixels: &[u8]) {
        let (width, height) = mip_size(slot.width, slot.height, level);
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(width * slot.format.channels() as u32),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }
}

fn wrap_mode(mode: WrapMode) -> wgpu::AddressMode {
    match mode {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
    }
}

fn filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn texture_format(format: PixelFormat) -> wgpu::TextureFormat {
    match format {
        PixelFormat::R8 => wgpu::TextureFormat::R8Unorm,
        PixelFormat::Rg8 => wgpu::TextureFormat::Rg8Unorm,
        PixelFormat::Rgb8 | PixelFormat::Rgba8 => wgpu::TextureFormat::Rgba8UnormSrgb,
    }
}

fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

fn mip_size(width: u32, height: u32, level: u32) -> (u32, u32) {
    ((width >> level).max(1), (height >> level).max(1))
}

/// wgpu has no 3-byte texel format.
fn widen_rgb(pixels: &[u8]) -> Vec<u8> {
    pixels
        .chunks_exact(3)
        .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], u8::MAX])
        .collect()
}

fn resize_as<P>(width: u32, height: u32, pixels: Vec<u8>, new_width: u32, new_height: u32) -> Option<Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let image = ImageBuffer::<P, Vec<u8>>::from_raw(width, height, pixels)?;
    Some(imageops::resize(&image, new_width, new_height, imageops::FilterType::Triangle).into_raw())
}

fn downsample(format: PixelFormat, size: (u32, u32), pixels: Vec<u8>, new_size: (u32, u32)) -> Option<Vec<u8>> {
    let ((w, h), (nw, nh)) = (size, new_size);
    match format {
        PixelFormat::R8 => resize_as::<Luma<u8>>(w, h, pixels, nw, nh),
        PixelFormat::Rg8 => resize_as::<LumaA<u8>>(w, h, pixels, nw, nh),
        PixelFormat::Rgb8 | PixelFormat::Rgba8 => resize_as::<Rgba<u8>>(w, h, pixels, nw, nh),
    }
}

impl GpuDevice for WgpuDevice {
    fn create_texture(&mut self) -> TextureHandle {
        let id = self.allocate();
        self.textures.insert(
            id,
            TextureSlot {
                texture: None,
                view: None,
                sampler: None,
                format: PixelFormat::Rgba8,
                width: 0,
                height: 0,
                base_level: Vec::new(),
                wrap: [wgpu::AddressMode::Repeat; 2],
                filter: [wgpu::FilterMode::Linear; 2],
            },
        );
        TextureHandle(id)
    }

    fn upload_texture_2d(&mut self, texture: TextureHandle, upload: &TextureUpload<'_>) {
        let Some(mut slot) = self.textures.remove(&texture.0) else {
            log::error!("upload to unknown texture {}", texture.0);
            return;
        };

        let (format, pixels) = match upload.format {
            PixelFormat::Rgb8 => (PixelFormat::Rgba8, widen_rgb(upload.pixels)),
            other => (other, upload.pixels.to_vec()),
        };
        let width = upload.width.max(1);
        let height = upload.height.max(1);

        let gpu_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Asset texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mip_level_count(width, height),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format(format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        if let Some(old) = slot.texture.take() {
            old.destroy();
        }
        slot.format = format;
        slot.width = width;
        slot.height = height;
        self.write_level(&gpu_texture, 0, &slot, &pixels);
        slot.base_level = pixels;
        slot.view = Some(gpu_texture.create_view(&wgpu::TextureViewDescriptor::default()));
        slot.texture = Some(gpu_texture);
        Self::rebuild_sampler(&self.device, &mut slot);

        self.textures.insert(texture.0, slot);
    }

    fn generate_mipmaps(&mut self, texture: TextureHandle) {
        let Some(mut slot) = self.textures.remove(&texture.0) else {
            log::error!("generate_mipmaps on unknown texture {}", texture.0);
            return;
        };

        if let Some(gpu_texture) = slot.texture.take() {
            let mut size = (slot.width, slot.height);
            let mut pixels = std::mem::take(&mut slot.base_level);
            for level in 1..mip_level_count(slot.width, slot.height) {
                let next = mip_size(slot.width, slot.height, level);
                match downsample(slot.format, size, pixels, next) {
                    Some(level_pixels) => {
                        self.write_level(&gpu_texture, level, &slot, &level_pixels);
                        pixels = level_pixels;
                        size = next;
                    }
                    None => {
                        log::error!("texture {} has a short pixel buffer; mip chain stops at {level}", texture.0);
                        break;
                    }
                }
            }
            slot.texture = Some(gpu_texture);
        }

        self.textures.insert(texture.0, slot);
    }

    fn set_texture_wrap(&mut self, texture: TextureHandle, s: WrapMode, t: WrapMode) {
        if let Some(slot) = self.textures.get_mut(&texture.0) {
            slot.wrap = [wrap_mode(s), wrap_mode(t)];
            Self::rebuild_sampler(&self.device, slot);
        }
    }

    fn set_texture_filter(&mut self, texture: TextureHandle, min: FilterMode, mag: FilterMode) {
        if let Some(slot) = self.textures.get_mut(&texture.0) {
            slot.filter = [filter_mode(min), filter_mode(mag)];
            Self::rebuild_sampler(&self.device, slot);
        }
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if let Some(slot) = self.textures.remove(&texture.0) {
            if let Some(gpu_texture) = slot.texture {
                gpu_texture.destroy();
            }
        }
    }

    fn create_stage(&mut self, stage: ShaderStage) -> StageHandle {
        let id = self.allocate();
        self.stages.insert(
            id,
            StageSlot {
                stage,
                module: None,
                log: String::new(),
            },
        );
        StageHandle(id)
    }

    fn compile_stage(&mut self, stage: StageHandle, source: &str) -> bool {
        let Some(kind) = self.stages.get(&stage.0).map(|slot| slot.stage) else {
            log::error!("compile of unknown shader stage {}", stage.0);
            return false;
        };
        let label = format!("{kind} stage {}", stage.0);
        let (module, error) = self.scoped(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label.as_str()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        });

        let Some(slot) = self.stages.get_mut(&stage.0) else {
            return false;
        };
        match error {
            Some(log) => {
                slot.module = None;
                slot.log = log;
                false
            }
            None => {
                slot.module = Some(module);
                slot.log.clear();
                true
            }
        }
    }

    fn stage_log(&self, stage: StageHandle) -> String {
        self.stages
            .get(&stage.0)
            .map(|slot| slot.log.clone())
            .unwrap_or_default()
    }

    fn delete_stage(&mut self, stage: StageHandle) {
        self.stages.remove(&stage.0);
        for program in self.programs.values_mut() {
            program.stages.retain(|&attached| attached != stage);
        }
    }

    fn create_program(&mut self) -> ProgramHandle {
        let id = self.allocate();
        self.programs.insert(id, ProgramSlot::default());
        ProgramHandle(id)
    }

    fn attach_stage(&mut self, program: ProgramHandle, stage: StageHandle) {
        if let Some(slot) = self.programs.get_mut(&program.0) {
            if !slot.stages.contains(&stage) {
                slot.stages.push(stage);
            }
        }
    }

    fn detach_stage(&mut self, program: ProgramHandle, stage: StageHandle) {
        if let Some(slot) = self.programs.get_mut(&program.0) {
            slot.stages.retain(|&attached| attached != stage);
        }
    }

    fn link_program(&mut self, program: ProgramHandle) -> bool {
        let Some(attached) = self.programs.get(&program.0).map(|slot| slot.stages.clone()) else {
            log::error!("link of unknown program {}", program.0);
            return false;
        };

        let module_for = |kind: ShaderStage| {
            attached
                .iter()
                .filter_map(|stage| self.stages.get(&stage.0))
                .find(|slot| slot.stage == kind)
                .and_then(|slot| slot.module.as_ref())
        };

        let result = match (module_for(ShaderStage::Vertex), module_for(ShaderStage::Fragment)) {
            (Some(vertex), Some(fragment)) => {
                let config = self.config;
                let label = format!("Program {}", program.0);
                let (pipeline, error) = self.scoped(|device| {
                    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some(label.as_str()),
                        layout: None,
                        vertex: wgpu::VertexState {
                            module: vertex,
                            entry_point: Some(VERTEX_ENTRY),
                            buffers: &[MODEL_VERTEX_LAYOUT],
                            compilation_options: wgpu::PipelineCompilationOptions::default(),
                        },
                        fragment: Some(wgpu::FragmentState {
                            module: fragment,
                            entry_point: Some(FRAGMENT_ENTRY),
                            targets: &[Some(wgpu::ColorTargetState {
                                format: config.color_format,
                                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                                write_mask: wgpu::ColorWrites::ALL,
                            })],
                            compilation_options: wgpu::PipelineCompilationOptions::default(),
                        }),
                        primitive: wgpu::PrimitiveState::default(),
                        depth_stencil: config.depth_format.map(|format| wgpu::DepthStencilState {
                            format,
                            depth_write_enabled: true,
                            depth_compare: wgpu::CompareFunction::LessEqual,
                            stencil: wgpu::StencilState::default(),
                            bias: wgpu::DepthBiasState::default(),
                        }),
                        multisample: wgpu::MultisampleState::default(),
                        multiview: None,
                        cache: None,
                    })
                });
                match error {
                    Some(log) => Err(log),
                    None => Ok(pipeline),
                }
            }
            _ => Err("program needs one compiled vertex stage and one compiled fragment stage".to_string()),
        };

        let Some(slot) = self.programs.get_mut(&program.0) else {
            return false;
        };
        match result {
            Ok(pipeline) => {
                slot.pipeline = Some(pipeline);
                slot.log.clear();
                true
            }
            Err(log) => {
                slot.pipeline = None;
                slot.log = log;
                false
            }
        }
    }

    fn program_log(&self, program: ProgramHandle) -> String {
        self.programs
            .get(&program.0)
            .map(|slot| slot.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program.0);
    }

    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> BufferHandle {
        let id = self.allocate();
        let (label, usage) = match kind {
            BufferKind::Vertex => ("Primitive VB", wgpu::BufferUsages::VERTEX),
            BufferKind::Index => ("Primitive IB", wgpu::BufferUsages::INDEX),
        };
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        });
        self.buffers.insert(id, buffer);
        BufferHandle(id)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if let Some(buffer) = self.buffers.remove(&buffer.0) {
            buffer.destroy();
        }
    }

    fn live_objects(&self) -> usize {
        self.textures.len() + self.stages.len() + self.programs.len() + self.buffers.len()
    }
}
