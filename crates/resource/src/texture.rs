//! Image Decoder/Uploader.

use std::path::Path;

use asset::ImageData;
use corelib::AssetResult;
use gpu::{FilterMode, OwnedTexture, PixelFormat, SharedDevice, TextureHandle, TextureUpload, WrapMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureOptions {
    pub flip_vertically: bool,
    /// Wrap mode on the s and t axes. `None` keeps the device default.
    pub wrap: Option<[WrapMode; 2]>,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            flip_vertically: false,
            wrap: Some([WrapMode::Repeat; 2]),
        }
    }
}

/// A texture on the GPU plus the dimensions it was decoded with.
#[derive(Debug)]
pub struct GpuTexture {
    texture: OwnedTexture,
    width: u32,
    height: u32,
    channels: u8,
}

impl GpuTexture {
    #[inline]
    pub fn handle(&self) -> TextureHandle {
        self.texture.raw()
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }
}

/// Decode `path` and upload it with mipmaps and linear filtering.
///
/// A missing or undecodable file is an `Io`/`Decode` error the caller may
/// log and skip.
pub fn load_texture(device: &SharedDevice, path: &Path, options: TextureOptions) -> AssetResult<GpuTexture> {
    let image = ImageData::load(path, options.flip_vertically)?;
    Ok(upload(device, image, options.wrap))
}

/// Ad hoc load: no flip, device-default wrapping.
pub fn load_texture_default(device: &SharedDevice, path: &Path) -> AssetResult<GpuTexture> {
    load_texture(
        device,
        path,
        TextureOptions {
            flip_vertically: false,
            wrap: None,
        },
    )
}

/// Upload decoded pixels. The pixel buffer is dropped once the GPU has a copy.
///
/// # Panics
///
/// If `image.channels` is not 1 to 4; decoders never produce anything else.
pub fn upload(device: &SharedDevice, image: ImageData, wrap: Option<[WrapMode; 2]>) -> GpuTexture {
    let format = PixelFormat::from_channels(image.channels)
        .unwrap_or_else(|| panic!("unsupported channel count {}", image.channels));

    let texture = OwnedTexture::create(device);
    {
        let mut gpu = device.borrow_mut();
        gpu.upload_texture_2d(
            texture.raw(),
            &TextureUpload {
                width: image.width,
                height: image.height,
                format,
                pixels: &image.pixels,
            },
        );
        gpu.generate_mipmaps(texture.raw());
        if let Some([s, t]) = wrap {
            gpu.set_texture_wrap(texture.raw(), s, t);
        }
        gpu.set_texture_filter(texture.raw(), FilterMode::Linear, FilterMode::Linear);
    }

    GpuTexture {
        texture,
        width: image.width,
        height: image.height,
        channels: image.channels,
    }
}
