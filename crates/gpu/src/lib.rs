//! GPU object management behind a small capability trait.
//!
//! - `device`: the [`GpuDevice`] capability surface and raw handle types
//! - `handle`: owning handles that delete their GPU object on drop
//! - `wgpu_device`: [`GpuDevice`] implemented on top of `wgpu`
//!
//! All GPU work happens on the thread that owns the device; handles share it
//! through [`SharedDevice`] (`Rc<RefCell<..>>`), so nothing here is `Send`.

pub mod device;
pub mod handle;
pub mod wgpu_device;

pub use device::{
    BufferHandle, BufferKind, FilterMode, GpuDevice, PixelFormat, ProgramHandle, SharedDevice,
    StageHandle, TextureHandle, TextureUpload, WrapMode,
};
pub use handle::{OwnedBuffer, OwnedProgram, OwnedStage, OwnedTexture};
pub use wgpu_device::{HeadlessError, WgpuDevice, WgpuDeviceConfig};
