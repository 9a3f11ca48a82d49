//! Kernel selection and the bulk buffer helpers built on it.

use rayon::prelude::*;

use crate::blend::kernel::{self, LayerInput, MultiplyRounding};
use crate::blend::mode::BlendMode;
use crate::blend::ops::separable_op;
use crate::buffer::color::{ALPHA, BYTES_PER_PIXEL, ColorBuffer};
use crate::buffer::mask::MaskBuffer;
use crate::foundation::core::PixelRect;
use crate::foundation::math::mul_div255;

/// Whether every fusion pixel in the blended rectangle is known to have alpha 255.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FusionOpacity {
    /// Every pixel is opaque; the cheaper kernel family applies.
    Opaque,
    /// Some pixel may be translucent.
    Transparent,
}

impl FusionOpacity {
    /// Classify from a "fusion has transparency" flag.
    pub fn from_has_transparency(has_transparency: bool) -> Self {
        if has_transparency {
            Self::Transparent
        } else {
            Self::Opaque
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Opaque => "opaque",
            Self::Transparent => "transparent",
        }
    }
}

/// Whether the layer opacity is 100.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerOpacity {
    /// Layer alpha is 100.
    Opaque,
    /// Layer alpha is below 100.
    Transparent,
}

impl LayerOpacity {
    /// Classify a layer alpha (0..=100).
    pub fn from_alpha(alpha: u8) -> Self {
        if alpha >= 100 {
            Self::Opaque
        } else {
            Self::Transparent
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Opaque => "opaque",
            Self::Transparent => "transparent",
        }
    }
}

/// The operation a kernel performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KernelOp {
    /// Blend with one of the layer blend modes.
    Blend(BlendMode),
    /// Overwrite color and alpha from the layer.
    Replace,
    /// Overwrite only alpha from the layer.
    ReplaceAlpha,
}

/// Fully resolved kernel selection: operation plus structural variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KernelKey {
    /// What the kernel computes.
    pub op: KernelOp,
    /// Opacity class of the fusion.
    pub fusion: FusionOpacity,
    /// Opacity class of the layer.
    pub layer: LayerOpacity,
    /// Whether a mask is applied.
    pub masked: bool,
}

impl KernelKey {
    /// Resolve the blend kernel for a runtime parameter tuple.
    pub fn for_parameters(
        fusion_has_transparency: bool,
        alpha: u8,
        mode: BlendMode,
        has_mask: bool,
    ) -> Self {
        Self {
            op: KernelOp::Blend(mode),
            fusion: FusionOpacity::from_has_transparency(fusion_has_transparency),
            layer: LayerOpacity::from_alpha(alpha),
            masked: has_mask,
        }
    }

    /// Resolve a `replace` or `replace_alpha` kernel.
    pub fn for_replace(op: KernelOp, alpha: u8, has_mask: bool) -> Self {
        Self {
            op,
            fusion: FusionOpacity::Transparent,
            layer: LayerOpacity::from_alpha(alpha),
            masked: has_mask,
        }
    }

    /// Apply the kernel over `rect`.
    ///
    /// # Panics
    ///
    /// Panics when the buffers differ in size, `rect` leaves them, or the mask/alpha disagree with
    /// the key's structural variant.
    pub fn apply(
        self,
        fusion: &mut ColorBuffer,
        layer: &ColorBuffer,
        alpha: u8,
        rect: PixelRect,
        mask: Option<&MaskBuffer>,
    ) {
        assert_eq!(
            self.masked,
            mask.is_some(),
            "kernel {self} called with mismatched mask presence"
        );
        assert_eq!(
            self.layer,
            LayerOpacity::from_alpha(alpha),
            "kernel {self} called with layer alpha {alpha}"
        );

        let input = LayerInput::new(layer, alpha.min(100), mask);
        let opaque = self.fusion == FusionOpacity::Opaque;
        match self.op {
            KernelOp::Replace => kernel::replace(fusion, input, rect),
            KernelOp::ReplaceAlpha => kernel::replace_alpha(fusion, input, rect),
            KernelOp::Blend(BlendMode::Passthrough) => {
                kernel::blend_passthrough(fusion, input, rect);
            }
            KernelOp::Blend(BlendMode::Multiply) => {
                kernel::blend_multiply(fusion, input, rect, opaque, MultiplyRounding::Floor);
            }
            KernelOp::Blend(BlendMode::Multiply2) => {
                kernel::blend_multiply(fusion, input, rect, opaque, MultiplyRounding::Ceil);
            }
            KernelOp::Blend(mode) => {
                if let Some(op) = separable_op(mode) {
                    kernel::blend_separable(fusion, input, rect, opaque, op);
                }
            }
        }
    }
}

impl std::fmt::Display for KernelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.op {
            KernelOp::Blend(mode) => write!(
                f,
                "{mode}_onto_{}_fusion_with_{}_layer",
                self.fusion.name(),
                self.layer.name()
            )?,
            KernelOp::Replace => write!(f, "replace_onto_fusion_with_{}_layer", self.layer.name())?,
            KernelOp::ReplaceAlpha => write!(
                f,
                "replace_alpha_onto_fusion_with_{}_layer",
                self.layer.name()
            )?,
        }
        if self.masked {
            f.write_str("_masked")?;
        }
        Ok(())
    }
}

/// Name of the kernel selected for the given parameters, e.g.
/// `multiply2_onto_opaque_fusion_with_transparent_layer_masked`.
pub fn blend_function_name_for_parameters(
    fusion_has_transparency: bool,
    alpha: u8,
    mode: BlendMode,
    has_mask: bool,
) -> String {
    KernelKey::for_parameters(fusion_has_transparency, alpha, mode, has_mask).to_string()
}

/// Blend `layer` onto a same-sized `fusion` over `rect` (clipped to both buffers).
///
/// `fusion_has_transparency` must be `true` unless every fusion pixel in `rect` is opaque. A
/// layer alpha of 0 leaves the fusion untouched.
pub fn fuse_image_onto_image(
    fusion: &mut ColorBuffer,
    layer: &ColorBuffer,
    fusion_has_transparency: bool,
    alpha: u8,
    mode: BlendMode,
    rect: PixelRect,
    mask: Option<&MaskBuffer>,
) {
    let alpha = alpha.min(100);
    if alpha == 0 {
        return;
    }
    let rect = rect.intersect(fusion.bounds()).intersect(layer.bounds());
    KernelKey::for_parameters(fusion_has_transparency, alpha, mode, mask.is_some())
        .apply(fusion, layer, alpha, rect, mask);
}

/// Normal-mode blend of `src_rect` of `image` onto `fusion`, top-left at `(dest_x, dest_y)`.
///
/// The buffers may differ in size; the rectangle is clipped against both.
pub fn fuse_image_onto_image_at(
    fusion: &mut ColorBuffer,
    image: &ColorBuffer,
    alpha: u8,
    src_rect: PixelRect,
    dest_x: i32,
    dest_y: i32,
) {
    let alpha = alpha.min(100);
    if alpha == 0 {
        return;
    }
    let src = src_rect.intersect(image.bounds());
    let dest = src.translate(dest_x, dest_y).intersect(fusion.bounds());
    let src = dest.translate(-dest_x, -dest_y);
    kernel::blend_normal_at(
        fusion,
        LayerInput::new(image, alpha, None),
        src,
        dest_x,
        dest_y,
    );
}

/// Scale every pixel's alpha by `alpha / 100`, truncating.
pub fn multiply_alpha_by(buffer: &mut ColorBuffer, alpha: u8) {
    let alpha = u32::from(alpha.min(100));
    if alpha == 100 {
        return;
    }
    buffer
        .data_mut()
        .par_chunks_exact_mut(BYTES_PER_PIXEL)
        .for_each(|px| {
            px[ALPHA] = (u32::from(px[ALPHA]) * alpha / 100) as u8;
        });
}

/// Scale every pixel's alpha by the mask value over 255, truncating.
///
/// # Panics
///
/// Panics when the mask does not match the buffer dimensions.
pub fn multiply_alpha_by_mask(buffer: &mut ColorBuffer, mask: &MaskBuffer) {
    assert!(
        buffer.width() == mask.width() && buffer.height() == mask.height(),
        "mask must match the buffer it scales"
    );
    buffer
        .data_mut()
        .par_chunks_exact_mut(BYTES_PER_PIXEL)
        .zip(mask.data().par_iter())
        .for_each(|(px, &m)| {
            px[ALPHA] = mul_div255(u32::from(px[ALPHA]), u32::from(m)) as u8;
        });
}

#[cfg(test)]
#[path = "../../tests/unit/blend/dispatch.rs"]
mod tests;
