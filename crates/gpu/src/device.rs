//! The capability surface the resource layer is written against.
//!
//! Mirrors a classic graphics API: create an object, get back a small integer
//! handle, operate on it by handle, delete it explicitly. Compile and link
//! report success as a `bool` and keep their diagnostic text for the matching
//! `*_log` query.

use std::{cell::RefCell, rc::Rc};

use corelib::ShaderStage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StageHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Layout of uploaded pixel rows, one byte per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    /// `None` for anything outside 1..=4.
    pub const fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(PixelFormat::R8),
            2 => Some(PixelFormat::Rg8),
            3 => Some(PixelFormat::Rgb8),
            4 => Some(PixelFormat::Rgba8),
            _ => None,
        }
    }

    pub const fn channels(self) -> u8 {
        match self {
            PixelFormat::R8 => 1,
            PixelFormat::Rg8 => 2,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Level-0 pixel data for a 2D texture. Rows are tightly packed.
#[derive(Clone, Copy, Debug)]
pub struct TextureUpload<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: &'a [u8],
}

pub trait GpuDevice {
    fn create_texture(&mut self) -> TextureHandle;
    fn upload_texture_2d(&mut self, texture: TextureHandle, upload: &TextureUpload<'_>);
    fn generate_mipmaps(&mut self, texture: TextureHandle);
    fn set_texture_wrap(&mut self, texture: TextureHandle, s: WrapMode, t: WrapMode);
    fn set_texture_filter(&mut self, texture: TextureHandle, min: FilterMode, mag: FilterMode);
    fn delete_texture(&mut self, texture: TextureHandle);

    fn create_stage(&mut self, stage: ShaderStage) -> StageHandle;
    /// Returns `false` on failure; the reason is available from [`GpuDevice::stage_log`].
    fn compile_stage(&mut self, stage: StageHandle, source: &str) -> bool;
    fn stage_log(&self, stage: StageHandle) -> String;
    fn delete_stage(&mut self, stage: StageHandle);

    fn create_program(&mut self) -> ProgramHandle;
    fn attach_stage(&mut self, program: ProgramHandle, stage: StageHandle);
    fn detach_stage(&mut self, program: ProgramHandle, stage: StageHandle);
    /// Returns `false` on failure; the reason is available from [`GpuDevice::program_log`].
    fn link_program(&mut self, program: ProgramHandle) -> bool;
    fn program_log(&self, program: ProgramHandle) -> String;
    fn delete_program(&mut self, program: ProgramHandle);

    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> BufferHandle;
    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Objects of any kind created and not yet deleted.
    fn live_objects(&self) -> usize;
}

/// The single device every owning handle releases into.
pub type SharedDevice = Rc<RefCell<dyn GpuDevice>>;
