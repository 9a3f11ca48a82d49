use crate::foundation::error::{FuseError, FuseResult};

pub use kurbo::Rect;

/// Canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas with non-zero dimensions.
    pub fn new(width: u32, height: u32) -> FuseResult<Self> {
        if width == 0 || height == 0 {
            return Err(FuseError::validation("canvas dimensions must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// The full canvas rectangle.
    pub fn rect(self) -> PixelRect {
        PixelRect::from_size(self.width, self.height)
    }

    /// Number of pixels on the canvas.
    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// Half-open integer rectangle `[left, right) x [top, bottom)` in pixel space.
///
/// Any rectangle with `right <= left` or `bottom <= top` is empty. All empty rectangles compare
/// equal to [`PixelRect::EMPTY`] after normalization through [`PixelRect::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    /// Inclusive left edge.
    pub left: i32,
    /// Inclusive top edge.
    pub top: i32,
    /// Exclusive right edge.
    pub right: i32,
    /// Exclusive bottom edge.
    pub bottom: i32,
}

impl PixelRect {
    /// The canonical empty rectangle.
    pub const EMPTY: Self = Self {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    /// Build a rectangle from its edges, collapsing inverted input to [`PixelRect::EMPTY`].
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        if right <= left || bottom <= top {
            return Self::EMPTY;
        }
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build a rectangle from an origin and a size.
    pub fn from_xywh(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self::new(
            x,
            y,
            x.saturating_add(width as i32),
            y.saturating_add(height as i32),
        )
    }

    /// Rectangle covering a `width x height` buffer.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Round a float rectangle outward to the pixel grid.
    pub fn from_kurbo_outset(r: Rect) -> Self {
        let r = r.abs().expand();
        Self::new(
            clamp_i32(r.x0),
            clamp_i32(r.y0),
            clamp_i32(r.x1),
            clamp_i32(r.y1),
        )
    }

    /// Return `true` when the rectangle contains no pixels.
    pub fn is_empty(self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    /// Width in pixels (0 when empty).
    pub fn width(self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (self.right - self.left) as u32
        }
    }

    /// Height in pixels (0 when empty).
    pub fn height(self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (self.bottom - self.top) as u32
        }
    }

    /// Number of pixels covered.
    pub fn area(self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// Smallest rectangle containing both. Empty rectangles are the identity.
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Overlap of both rectangles, [`PixelRect::EMPTY`] when disjoint.
    pub fn intersect(self, other: Self) -> Self {
        Self::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        )
    }

    /// Clip to the bounds of a `width x height` buffer.
    pub fn clip_to(self, width: u32, height: u32) -> Self {
        self.intersect(Self::from_size(width, height))
    }

    /// Shift by `(dx, dy)`.
    pub fn translate(self, dx: i32, dy: i32) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        Self {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }

    /// Return `true` when `other` lies entirely inside `self`.
    ///
    /// Every rectangle contains an empty one.
    pub fn contains_rect(self, other: Self) -> bool {
        other.is_empty()
            || (self.left <= other.left
                && self.top <= other.top
                && self.right >= other.right
                && self.bottom >= other.bottom)
    }
}

fn clamp_i32(v: f64) -> i32 {
    v.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from RGB.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Channels in buffer order.
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Read a color from a 4-byte buffer slice.
    pub fn from_slice(px: &[u8]) -> Self {
        Self::new(px[0], px[1], px[2], px[3])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
