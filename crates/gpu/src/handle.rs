//! Owning wrappers around raw GPU handles.
//!
//! Each wrapper keeps the [`SharedDevice`] alive and deletes its object when
//! dropped, so early returns and `?` never leak GPU objects. `raw()` exposes the
//! handle to code that issues draw calls.

use std::{fmt, rc::Rc};

use corelib::ShaderStage;

use crate::device::{
    BufferHandle, BufferKind, GpuDevice, ProgramHandle, SharedDevice, StageHandle, TextureHandle,
};

fn release(device: &SharedDevice, delete: impl FnOnce(&mut dyn GpuDevice)) {
    match device.try_borrow_mut() {
        Ok(mut gpu) => delete(&mut *gpu),
        Err(_) => log::error!("GPU device is busy while releasing an object; object leaked"),
    }
}

macro_rules! owned_handle {
    ($(#[$meta:meta])* $name:ident, $raw:ty, $delete:ident) => {
        $(#[$meta])*
        pub struct $name {
            device: SharedDevice,
            raw: $raw,
        }

        impl $name {
            /// Take ownership of `raw`; it is deleted when the wrapper drops.
            pub fn from_raw(device: &SharedDevice, raw: $raw) -> Self {
                Self {
                    device: Rc::clone(device),
                    raw,
                }
            }

            #[inline]
            pub fn raw(&self) -> $raw {
                self.raw
            }

            #[inline]
            pub fn device(&self) -> &SharedDevice {
                &self.device
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                let raw = self.raw;
                release(&self.device, |gpu| gpu.$delete(raw));
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.raw.0).finish()
            }
        }
    };
}

owned_handle!(
    /// A texture object.
    OwnedTexture,
    TextureHandle,
    delete_texture
);
owned_handle!(
    /// A single compiled (or failed) shader stage.
    OwnedStage,
    StageHandle,
    delete_stage
);
owned_handle!(
    /// A program object, linked or not.
    OwnedProgram,
    ProgramHandle,
    delete_program
);
owned_handle!(OwnedBuffer, BufferHandle, delete_buffer);

impl OwnedTexture {
    pub fn create(device: &SharedDevice) -> Self {
        let raw = device.borrow_mut().create_texture();
        Self::from_raw(device, raw)
    }
}

impl OwnedStage {
    pub fn create(device: &SharedDevice, stage: ShaderStage) -> Self {
        let raw = device.borrow_mut().create_stage(stage);
        Self::from_raw(device, raw)
    }
}

impl OwnedProgram {
    pub fn create(device: &SharedDevice) -> Self {
        let raw = device.borrow_mut().create_program();
        Self::from_raw(device, raw)
    }
}

impl OwnedBuffer {
    pub fn create(device: &SharedDevice, kind: BufferKind, contents: &[u8]) -> Self {
        let raw = device.borrow_mut().create_buffer(kind, contents);
        Self::from_raw(device, raw)
    }
}
