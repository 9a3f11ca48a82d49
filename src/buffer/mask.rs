use crate::foundation::core::PixelRect;
use crate::foundation::error::{FuseError, FuseResult};

/// 8-bit single-channel mask. 255 keeps a pixel, 0 hides it.
#[derive(Clone, PartialEq, Eq)]
pub struct MaskBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for MaskBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl MaskBuffer {
    /// Mask where every pixel is `value`.
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; (width as usize) * (height as usize)],
        }
    }

    /// Fully revealing (all-white) mask.
    pub fn white(width: u32, height: u32) -> Self {
        Self::filled(width, height, 255)
    }

    /// Wrap raw grey bytes, validating the length.
    pub fn from_data(width: u32, height: u32, data: Vec<u8>) -> FuseResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| FuseError::validation("mask buffer size overflow"))?;
        if data.len() != expected {
            return Err(FuseError::validation(format!(
                "mask buffer {width}x{height} expects {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Take ownership of a decoded `image` grey buffer.
    pub fn from_luma_image(img: image::GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Rectangle covering the whole mask.
    pub fn bounds(&self) -> PixelRect {
        PixelRect::from_size(self.width, self.height)
    }

    /// Raw mask bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw mask bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Offset of pixel `(x, y)`.
    #[inline]
    pub fn offset_of_pixel(&self, x: i32, y: i32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Read one mask value.
    pub fn value(&self, x: i32, y: i32) -> u8 {
        self.data[self.offset_of_pixel(x, y)]
    }

    /// Fill the part of `rect` inside the mask with `value`.
    pub fn fill_rect(&mut self, rect: PixelRect, value: u8) {
        let rect = rect.clip_to(self.width, self.height);
        for y in rect.top..rect.bottom {
            let start = self.offset_of_pixel(rect.left, y);
            self.data[start..start + rect.width() as usize].fill(value);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/buffer/mask.rs"]
mod tests;
