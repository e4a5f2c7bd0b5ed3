//! Image decoding into tightly packed 8-bit pixel rows.

use std::path::Path;

use corelib::{AssetError, AssetResult};
use image::{ColorType, DynamicImage};

/// Decoded pixels in CPU memory before GPU upload.
///
/// Rows are tightly packed (`width * channels` bytes, no padding) and the
/// channel count is whatever the file carried: 1 (grey), 2 (grey + alpha),
/// 3 (RGB) or 4 (RGBA).
#[derive(Clone, Debug)]
pub struct ImageData {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl ImageData {
    /// Decode an image file, optionally flipping it vertically on load.
    pub fn load(path: impl AsRef<Path>, flip_vertically: bool) -> AssetResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| AssetError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let img = if flip_vertically { img.flipv() } else { img };
        let data = Self::from_dynamic(img);

        log::debug!(
            "Decoded {:?}: {}x{}, {} channel(s)",
            path,
            data.width,
            data.height,
            data.channels
        );
        Ok(data)
    }

    /// Keep the source channel count, narrowing 16-bit and float images to 8 bits.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let (channels, pixels) = match img.color() {
            ColorType::L8 | ColorType::L16 => (1, img.into_luma8().into_raw()),
            ColorType::La8 | ColorType::La16 => (2, img.into_luma_alpha8().into_raw()),
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => {
                (3, img.into_rgb8().into_raw())
            }
            _ => (4, img.into_rgba8().into_raw()),
        };
        Self {
            pixels,
            width,
            height,
            channels,
        }
    }

    /// Bytes in one row of pixels.
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && (1..=4).contains(&self.channels)
            && self.pixels.len() == self.row_bytes() * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma, Rgb, RgbImage};

    use super::*;

    #[test]
    fn keeps_channel_count_of_source() {
        let dir = tempfile::tempdir().unwrap();
        let grey = dir.path().join("grey.png");
        let rgb = dir.path().join("rgb.png");
        GrayImage::from_pixel(3, 2, Luma([7])).save(&grey).unwrap();
        RgbImage::from_pixel(5, 1, Rgb([1, 2, 3])).save(&rgb).unwrap();

        let g = ImageData::load(&grey, false).unwrap();
        assert_eq!((g.width, g.height, g.channels), (3, 2, 1));
        assert!(g.is_valid());

        let c = ImageData::load(&rgb, false).unwrap();
        assert_eq!(c.channels, 3);
        assert_eq!(c.row_bytes(), 15);
        assert_eq!(&c.pixels[..3], &[1, 2, 3]);
    }

    #[test]
    fn flip_swaps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.png");
        let mut img = GrayImage::new(1, 2);
        img.put_pixel(0, 0, Luma([10]));
        img.put_pixel(0, 1, Luma([20]));
        img.save(&path).unwrap();

        assert_eq!(ImageData::load(&path, false).unwrap().pixels, vec![10, 20]);
        assert_eq!(ImageData::load(&path, true).unwrap().pixels, vec![20, 10]);
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let err = ImageData::load("does/not/exist.png", false).unwrap_err();
        assert!(err.is_io());
    }
}
