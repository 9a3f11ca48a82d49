use crate::foundation::core::{PixelRect, Rgba8};
use crate::foundation::error::{FuseError, FuseResult};

/// Bytes per pixel of a [`ColorBuffer`].
pub const BYTES_PER_PIXEL: usize = 4;

/// Offset of the alpha channel inside a pixel.
pub(crate) const ALPHA: usize = 3;

/// 8-bit straight-alpha RGBA pixel buffer, row-major and tightly packed.
#[derive(Clone, PartialEq, Eq)]
pub struct ColorBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for ColorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl ColorBuffer {
    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize) * BYTES_PER_PIXEL;
        Self {
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Buffer where every pixel is `color`.
    pub fn filled(width: u32, height: u32, color: Rgba8) -> Self {
        let px = color.to_array();
        let count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            data: px.repeat(count),
        }
    }

    /// Wrap raw RGBA bytes, validating the length.
    pub fn from_data(width: u32, height: u32, data: Vec<u8>) -> FuseResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| FuseError::validation("color buffer size overflow"))?;
        if data.len() != expected {
            return Err(FuseError::validation(format!(
                "color buffer {width}x{height} expects {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Take ownership of a decoded `image` RGBA buffer.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }

    /// Convert into an `image` RGBA buffer for encoding.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Rectangle covering the whole buffer.
    pub fn bounds(&self) -> PixelRect {
        PixelRect::from_size(self.width, self.height)
    }

    /// Raw pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw pixel bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Byte offset of pixel `(x, y)`.
    #[inline]
    pub fn offset_of_pixel(&self, x: i32, y: i32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * BYTES_PER_PIXEL
    }

    /// Read one pixel.
    pub fn pixel(&self, x: i32, y: i32) -> Rgba8 {
        let o = self.offset_of_pixel(x, y);
        Rgba8::from_slice(&self.data[o..o + BYTES_PER_PIXEL])
    }

    /// Write one pixel.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba8) {
        let o = self.offset_of_pixel(x, y);
        self.data[o..o + BYTES_PER_PIXEL].copy_from_slice(&color.to_array());
    }

    /// Return `true` when `other` has the same dimensions.
    pub fn same_size(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Fill the part of `rect` inside the buffer with `color`.
    pub fn fill_rect(&mut self, rect: PixelRect, color: Rgba8) {
        let rect = rect.clip_to(self.width, self.height);
        let px = color.to_array();
        for y in rect.top..rect.bottom {
            let start = self.offset_of_pixel(rect.left, y);
            let end = start + (rect.width() as usize) * BYTES_PER_PIXEL;
            for dst in self.data[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
                dst.copy_from_slice(&px);
            }
        }
    }

    /// Make the part of `rect` inside the buffer fully transparent.
    pub fn clear_rect(&mut self, rect: PixelRect) {
        self.fill_rect(rect, Rgba8::TRANSPARENT);
    }

    /// Copy `rect` from a same-sized buffer, replacing color and alpha.
    ///
    /// # Panics
    ///
    /// Panics when the buffers differ in size.
    pub fn copy_region_from(&mut self, src: &Self, rect: PixelRect) {
        assert!(
            self.same_size(src),
            "copy_region_from expects equal buffer sizes"
        );
        let rect = rect.clip_to(self.width, self.height);
        for y in rect.top..rect.bottom {
            let start = self.offset_of_pixel(rect.left, y);
            let end = start + (rect.width() as usize) * BYTES_PER_PIXEL;
            self.data[start..end].copy_from_slice(&src.data[start..end]);
        }
    }

    /// Return `true` when any pixel of `rect` has an alpha below 255.
    pub fn has_transparency(&self, rect: PixelRect) -> bool {
        let rect = rect.clip_to(self.width, self.height);
        for y in rect.top..rect.bottom {
            let start = self.offset_of_pixel(rect.left, y);
            let end = start + (rect.width() as usize) * BYTES_PER_PIXEL;
            if self.data[start..end]
                .chunks_exact(BYTES_PER_PIXEL)
                .any(|px| px[ALPHA] != 255)
            {
                return true;
            }
        }
        false
    }

    /// Return `true` when every pixel of `rect` has an alpha of 0.
    pub fn is_transparent(&self, rect: PixelRect) -> bool {
        let rect = rect.clip_to(self.width, self.height);
        for y in rect.top..rect.bottom {
            let start = self.offset_of_pixel(rect.left, y);
            let end = start + (rect.width() as usize) * BYTES_PER_PIXEL;
            if self.data[start..end]
                .chunks_exact(BYTES_PER_PIXEL)
                .any(|px| px[ALPHA] != 0)
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/buffer/color.rs"]
mod tests;
