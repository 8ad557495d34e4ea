//! System clipboard access
//!
//! Text and image transfer through `arboard`. Images are exchanged with the
//! host as packed 32-bit pixels described by a [`PackedPixelFormat`]; the
//! clipboard side always uses tightly packed RGBA8.

use std::borrow::Cow;

use arboard::ImageData;

use crate::error::{FrameworkError, FrameworkResult};

/// Channel layout of a packed 32-bit pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedPixelFormat {
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
    pub alpha_mask: u32,
}

impl PackedPixelFormat {
    /// `0xAARRGGBB`
    pub const ARGB8888: Self = Self {
        red_mask: 0x00FF_0000,
        green_mask: 0x0000_FF00,
        blue_mask: 0x0000_00FF,
        alpha_mask: 0xFF00_0000,
    };

    /// `0xAABBGGRR` (RGBA bytes read as a little-endian word)
    pub const ABGR8888: Self = Self {
        red_mask: 0x0000_00FF,
        green_mask: 0x0000_FF00,
        blue_mask: 0x00FF_0000,
        alpha_mask: 0xFF00_0000,
    };

    /// Shift of each channel's lowest mask bit, in RGBA order
    pub fn shifts(&self) -> [u32; 4] {
        self.masks().map(mask_shift)
    }

    pub fn masks(&self) -> [u32; 4] {
        [self.red_mask, self.green_mask, self.blue_mask, self.alpha_mask]
    }

    /// Unpack one pixel into RGBA8
    ///
    /// Channels narrower than 8 bits are scaled up; a zero alpha mask means
    /// the pixel is opaque.
    pub fn unpack(&self, pixel: u32) -> [u8; 4] {
        let mut out = [0u8; 4];
        for (i, mask) in self.masks().into_iter().enumerate() {
            out[i] = match mask {
                0 if i == 3 => u8::MAX,
                0 => 0,
                _ => {
                    // u64: a channel may span all 32 bits
                    let max = (mask >> mask_shift(mask)) as u64;
                    let value = ((pixel & mask) >> mask_shift(mask)) as u64;
                    ((value * 255 + max / 2) / max) as u8
                }
            };
        }
        out
    }

    /// Pack RGBA8 into one pixel of this format
    pub fn pack(&self, rgba: [u8; 4]) -> u32 {
        self.masks()
            .into_iter()
            .zip(rgba)
            .filter(|(mask, _)| *mask != 0)
            .fold(0, |pixel, (mask, channel)| {
                let shift = mask_shift(mask);
                let max = (mask >> shift) as u64;
                let value = ((channel as u64 * max + 127) / 255) as u32;
                pixel | ((value << shift) & mask)
            })
    }
}

fn mask_shift(mask: u32) -> u32 {
    if mask == 0 {
        0
    } else {
        mask.trailing_zeros()
    }
}

/// Host-side image: row-major packed pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
    pub format: PackedPixelFormat,
}

impl PackedImage {
    /// Convert to tightly packed RGBA8 bytes
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&p| self.format.unpack(p))
            .collect()
    }

    /// Build from RGBA8 bytes; trailing partial pixels are ignored
    pub fn from_rgba8(
        width: usize,
        height: usize,
        bytes: &[u8],
        format: PackedPixelFormat,
    ) -> Self {
        let pixels = bytes
            .chunks_exact(4)
            .take(width * height)
            .map(|c| format.pack([c[0], c[1], c[2], c[3]]))
            .collect();
        Self {
            width,
            height,
            pixels,
            format,
        }
    }
}

/// Handle to the system clipboard
pub struct Clipboard {
    inner: arboard::Clipboard,
}

impl Clipboard {
    pub fn new() -> FrameworkResult<Self> {
        let inner = arboard::Clipboard::new().map_err(clipboard_error)?;
        Ok(Self { inner })
    }

    pub fn text(&mut self) -> Option<String> {
        self.inner.get_text().ok()
    }

    pub fn set_text(&mut self, text: &str) -> FrameworkResult<()> {
        self.inner.set_text(text).map_err(clipboard_error)
    }

    pub fn has_text(&mut self) -> bool {
        self.inner.get_text().is_ok_and(|t| !t.is_empty())
    }

    /// Current clipboard image converted into `format`
    pub fn image(&mut self, format: PackedPixelFormat) -> Option<PackedImage> {
        let image = self.inner.get_image().ok()?;
        Some(PackedImage::from_rgba8(
            image.width,
            image.height,
            &image.bytes,
            format,
        ))
    }

    pub fn set_image(&mut self, image: &PackedImage) -> FrameworkResult<()> {
        if image.pixels.len() != image.width * image.height {
            return Err(FrameworkError::Clipboard(format!(
                "image has {} pixels, expected {}x{}",
                image.pixels.len(),
                image.width,
                image.height
            )));
        }
        self.inner
            .set_image(ImageData {
                width: image.width,
                height: image.height,
                bytes: Cow::Owned(image.to_rgba8()),
            })
            .map_err(clipboard_error)
    }

    pub fn has_image(&mut self) -> bool {
        self.inner.get_image().is_ok()
    }
}

fn clipboard_error(err: arboard::Error) -> FrameworkError {
    FrameworkError::Clipboard(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shifts() {
        assert_eq!(PackedPixelFormat::ARGB8888.shifts(), [16, 8, 0, 24]);
        assert_eq!(PackedPixelFormat::ABGR8888.shifts(), [0, 8, 16, 24]);
    }

    #[test]
    fn test_unpack_argb() {
        let rgba = PackedPixelFormat::ARGB8888.unpack(0x80FF_4020);
        assert_eq!(rgba, [0xFF, 0x40, 0x20, 0x80]);
    }

    #[test]
    fn test_wide_channel_masks() {
        let format = PackedPixelFormat {
            red_mask: 0xFFFF_FFFF,
            green_mask: 0,
            blue_mask: 0,
            alpha_mask: 0,
        };
        assert_eq!(format.unpack(0xFFFF_FFFF), [255, 0, 0, 255]);
        assert_eq!(format.unpack(0x8000_0000), [128, 0, 0, 255]);
        assert_eq!(format.pack([255, 0, 0, 255]), 0xFFFF_FFFF);

        let high = PackedPixelFormat {
            red_mask: 0xFFFF_FFF0,
            ..format
        };
        assert_eq!(high.pack([255, 0, 0, 0]), 0xFFFF_FFF0);
        assert_eq!(high.unpack(0xFFFF_FFF0)[0], 255);
    }

    #[test]
    fn test_pack_abgr() {
        let pixel = PackedPixelFormat::ABGR8888.pack([1, 2, 3, 4]);
        assert_eq!(pixel, 0x0403_0201);
    }

    #[test]
    fn test_missing_alpha_is_opaque() {
        let rgb = PackedPixelFormat {
            alpha_mask: 0,
            ..PackedPixelFormat::ARGB8888
        };
        assert_eq!(rgb.unpack(0x0012_3456)[3], 255);
        assert_eq!(rgb.pack([0x12, 0x34, 0x56, 0x00]), 0x0012_3456);
    }

    #[test]
    fn test_narrow_channels_scale() {
        // RGB565
        let rgb565 = PackedPixelFormat {
            red_mask: 0xF800,
            green_mask: 0x07E0,
            blue_mask: 0x001F,
            alpha_mask: 0,
        };
        assert_eq!(rgb565.unpack(0xFFFF), [255, 255, 255, 255]);
        assert_eq!(rgb565.unpack(0x0000), [0, 0, 0, 255]);
        assert_eq!(rgb565.pack([255, 0, 255, 255]), 0xF81F);
    }

    #[test]
    fn test_image_conversion() {
        let image = PackedImage {
            width: 2,
            height: 1,
            pixels: vec![0xFF00_00FF, 0x00FF_0000],
            format: PackedPixelFormat::ARGB8888,
        };
        let bytes = image.to_rgba8();
        assert_eq!(bytes, vec![0, 0, 255, 255, 255, 0, 0, 0]);

        let back = PackedImage::from_rgba8(2, 1, &bytes, PackedPixelFormat::ARGB8888);
        assert_eq!(back, image);
    }
}
