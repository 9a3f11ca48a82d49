//! Parameterized blend kernels.
//!
//! Every kernel walks a rectangle that the caller has already clipped to the buffers, pairing each
//! fusion pixel with the layer pixel and mask value at the same position (or at an offset, for the
//! positioned normal fuse). Contract violations panic before any pixel is touched.
//!
//! The over algebra runs on exact numerators over [`ALPHA_ONE`]; only the stored channel values
//! are truncated. The opaque-fusion path is the transparent formula with `a2 == 1` substituted, so
//! both produce the same bytes for opaque input. Legacy multiply is the one deliberate exception.

use crate::blend::ops::PreBlendFn;
use crate::buffer::color::{ALPHA, BYTES_PER_PIXEL, ColorBuffer};
use crate::buffer::mask::MaskBuffer;
use crate::foundation::core::PixelRect;
use crate::foundation::math::{
    ALPHA_ONE, FUSION_ALPHA_SCALE, MIX_ONE, alpha_to_u8, clamp_u8, effective_alpha,
};

const ONE: i64 = ALPHA_ONE as i64;
const ONE_SQ: i64 = ONE * ONE;
const SCALE: i64 = FUSION_ALPHA_SCALE as i64;
const MIX: i64 = MIX_ONE as i64;

/// A layer as seen by a kernel: its pixels, its opacity (0..=100) and an optional mask.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LayerInput<'a> {
    pub(crate) image: &'a ColorBuffer,
    pub(crate) alpha: u8,
    pub(crate) mask: Option<&'a MaskBuffer>,
}

impl<'a> LayerInput<'a> {
    pub(crate) fn new(image: &'a ColorBuffer, alpha: u8, mask: Option<&'a MaskBuffer>) -> Self {
        Self { image, alpha, mask }
    }
}

/// Which rounding the multiply darkening factor uses on the opaque-fusion path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MultiplyRounding {
    /// Legacy `multiply`: darkening amount rounded down.
    Floor,
    /// `multiply2`: darkening amount rounded up, matching the transparent path.
    Ceil,
}

fn check_same_size(fusion: &ColorBuffer, layer: &LayerInput<'_>) {
    assert!(
        fusion.same_size(layer.image),
        "fusion {}x{} and layer {}x{} must have equal dimensions",
        fusion.width(),
        fusion.height(),
        layer.image.width(),
        layer.image.height()
    );
}

fn check_bounds(fusion: &ColorBuffer, layer: &LayerInput<'_>, rect: PixelRect, dx: i32, dy: i32) {
    assert!(
        layer.image.bounds().contains_rect(rect),
        "blend rect {rect:?} exceeds layer bounds"
    );
    assert!(
        fusion.bounds().contains_rect(rect.translate(dx, dy)),
        "blend rect {rect:?} offset by ({dx}, {dy}) exceeds fusion bounds"
    );
    if let Some(mask) = layer.mask {
        assert!(
            mask.width() == layer.image.width() && mask.height() == layer.image.height(),
            "mask {}x{} must match layer {}x{}",
            mask.width(),
            mask.height(),
            layer.image.width(),
            layer.image.height()
        );
    }
}

/// Visit every pixel of `rect` (layer space) with the fusion pixel at `(x + dx, y + dy)`.
fn for_each_pixel(
    fusion: &mut ColorBuffer,
    layer: LayerInput<'_>,
    rect: PixelRect,
    dx: i32,
    dy: i32,
    mut f: impl FnMut(&mut [u8], &[u8], u8),
) {
    check_bounds(fusion, &layer, rect, dx, dy);
    if rect.is_empty() {
        return;
    }

    let row_px = rect.width() as usize;
    let row_bytes = row_px * BYTES_PER_PIXEL;
    for y in rect.top..rect.bottom {
        let lo = layer.image.offset_of_pixel(rect.left, y);
        let fo = fusion.offset_of_pixel(rect.left + dx, y + dy);
        let l_row = &layer.image.data()[lo..lo + row_bytes];
        let f_row = &mut fusion.data_mut()[fo..fo + row_bytes];
        let pixels = f_row
            .chunks_exact_mut(BYTES_PER_PIXEL)
            .zip(l_row.chunks_exact(BYTES_PER_PIXEL));

        match layer.mask {
            Some(mask) => {
                let mo = mask.offset_of_pixel(rect.left, y);
                let m_row = &mask.data()[mo..mo + row_px];
                for ((fp, lp), &mv) in pixels.zip(m_row) {
                    f(fp, lp, mv);
                }
            }
            None => {
                for (fp, lp) in pixels {
                    f(fp, lp, 255);
                }
            }
        }
    }
}

#[inline]
fn layer_alpha(lp: &[u8], alpha: u8, mask: u8) -> i64 {
    effective_alpha(lp[ALPHA], alpha, mask) as i64
}

#[inline]
fn over_opaque(fp: &mut [u8], lp: &[u8], a1: i64, op: PreBlendFn) {
    let inv = ONE - a1;
    for c in 0..3 {
        let b = i64::from(fp[c]);
        let pre = i64::from(op(i32::from(lp[c]), i32::from(fp[c])));
        fp[c] = clamp_u8((b * inv + pre * a1) / ONE);
    }
}

#[inline]
fn over_transparent(fp: &mut [u8], lp: &[u8], a1: i64, op: PreBlendFn) {
    let a2 = i64::from(fp[ALPHA]) * SCALE;
    let w12 = a1 * a2;
    let w1n2 = a1 * (ONE - a2);
    let wn12 = (ONE - a1) * a2;
    let new_alpha = w12 + w1n2 + wn12;

    for c in 0..3 {
        let a = i64::from(lp[c]);
        let b = i64::from(fp[c]);
        let pre = i64::from(op(i32::from(lp[c]), i32::from(fp[c])));
        fp[c] = clamp_u8((a * w1n2 + b * wn12 + pre * w12) / new_alpha);
    }
    fp[ALPHA] = (255 * new_alpha / ONE_SQ) as u8;
}

/// Blend a layer through the over algebra with a separable pre-blend operator.
pub(crate) fn blend_separable(
    fusion: &mut ColorBuffer,
    layer: LayerInput<'_>,
    rect: PixelRect,
    fusion_opaque: bool,
    op: PreBlendFn,
) {
    check_same_size(fusion, &layer);
    let alpha = layer.alpha;
    if fusion_opaque {
        for_each_pixel(fusion, layer, rect, 0, 0, |fp, lp, m| {
            let a1 = layer_alpha(lp, alpha, m);
            if a1 != 0 {
                over_opaque(fp, lp, a1, op);
            }
        });
    } else {
        for_each_pixel(fusion, layer, rect, 0, 0, |fp, lp, m| {
            let a1 = layer_alpha(lp, alpha, m);
            if a1 != 0 {
                over_transparent(fp, lp, a1, op);
            }
        });
    }
}

/// Fusion multiplier `g` (0..=255) for a multiply layer channel: `255 - round(a1 * (255 - a))`.
#[inline]
fn multiply_factor(a: u8, a1: i64, rounding: MultiplyRounding) -> i64 {
    let darken = a1 * i64::from(255 - a);
    match rounding {
        MultiplyRounding::Floor => 255 - darken / ONE,
        MultiplyRounding::Ceil => 255 - (darken + ONE - 1) / ONE,
    }
}

/// Blend a multiply layer.
///
/// `rounding` only affects the opaque-fusion path; the transparent path always rounds the
/// darkening amount up.
pub(crate) fn blend_multiply(
    fusion: &mut ColorBuffer,
    layer: LayerInput<'_>,
    rect: PixelRect,
    fusion_opaque: bool,
    rounding: MultiplyRounding,
) {
    check_same_size(fusion, &layer);
    let alpha = layer.alpha;
    if fusion_opaque {
        for_each_pixel(fusion, layer, rect, 0, 0, |fp, lp, m| {
            let a1 = layer_alpha(lp, alpha, m);
            if a1 == 0 {
                return;
            }
            for c in 0..3 {
                let g = multiply_factor(lp[c], a1, rounding);
                fp[c] = (i64::from(fp[c]) * g / 255) as u8;
            }
        });
    } else {
        for_each_pixel(fusion, layer, rect, 0, 0, |fp, lp, m| {
            let a1 = layer_alpha(lp, alpha, m);
            if a1 == 0 {
                return;
            }
            let a2 = i64::from(fp[ALPHA]) * SCALE;
            let w1n2 = a1 * (ONE - a2);
            let new_alpha = a1 * ONE + a2 * ONE - a1 * a2;
            for c in 0..3 {
                let g = multiply_factor(lp[c], a1, MultiplyRounding::Ceil);
                let num = i64::from(lp[c]) * w1n2 + i64::from(fp[c]) * g * a2 * SCALE;
                fp[c] = clamp_u8(num / new_alpha);
            }
            fp[ALPHA] = (255 * new_alpha / ONE_SQ) as u8;
        });
    }
}

/// Mix a passthrough group's result with the fusion it was built on.
///
/// The mix fraction is `mask * alpha / 25500`; colors are interpolated premultiplied so that
/// transparent pixels do not bleed their color.
pub(crate) fn blend_passthrough(fusion: &mut ColorBuffer, layer: LayerInput<'_>, rect: PixelRect) {
    check_same_size(fusion, &layer);
    let alpha = i64::from(layer.alpha);
    for_each_pixel(fusion, layer, rect, 0, 0, |fp, lp, m| {
        let mix = i64::from(m) * alpha;
        if mix == 0 {
            return;
        }
        let w1 = i64::from(lp[ALPHA]) * mix;
        let w2 = i64::from(fp[ALPHA]) * (MIX - mix);
        let real = w1 + w2;
        if real == 0 {
            fp[ALPHA] = 0;
            return;
        }
        for c in 0..3 {
            fp[c] = ((i64::from(lp[c]) * w1 + i64::from(fp[c]) * w2) / real) as u8;
        }
        fp[ALPHA] = (real / MIX) as u8;
    });
}

/// Overwrite color and alpha with the layer's, honoring its opacity and mask.
pub(crate) fn replace(fusion: &mut ColorBuffer, layer: LayerInput<'_>, rect: PixelRect) {
    check_same_size(fusion, &layer);
    let alpha = layer.alpha;
    for_each_pixel(fusion, layer, rect, 0, 0, |fp, lp, m| {
        fp[..3].copy_from_slice(&lp[..3]);
        fp[ALPHA] = alpha_to_u8(effective_alpha(lp[ALPHA], alpha, m));
    });
}

/// Overwrite only the alpha channel with the layer's effective alpha.
pub(crate) fn replace_alpha(fusion: &mut ColorBuffer, layer: LayerInput<'_>, rect: PixelRect) {
    check_same_size(fusion, &layer);
    let alpha = layer.alpha;
    for_each_pixel(fusion, layer, rect, 0, 0, |fp, lp, m| {
        fp[ALPHA] = alpha_to_u8(effective_alpha(lp[ALPHA], alpha, m));
    });
}

/// Normal-mode blend of `src_rect` of a differently sized layer onto the fusion at `(dx, dy)`.
///
/// Always takes the transparent-fusion path, which is exact for opaque fusions too.
pub(crate) fn blend_normal_at(
    fusion: &mut ColorBuffer,
    layer: LayerInput<'_>,
    src_rect: PixelRect,
    dx: i32,
    dy: i32,
) {
    let alpha = layer.alpha;
    for_each_pixel(fusion, layer, src_rect, dx, dy, |fp, lp, m| {
        let a1 = layer_alpha(lp, alpha, m);
        if a1 != 0 {
            over_transparent(fp, lp, a1, crate::blend::ops::normal);
        }
    });
}

/// Migrate a layer authored against legacy `multiply` so that `multiply2` renders it identically
/// onto opaque fusions.
///
/// For each channel the legacy darkening amount `q = floor(a1 * (255 - a))` is kept, and the
/// channel is lightened to the largest value whose rounded-up darkening is still `q`. The layer's
/// alpha and mask are not modified; `alpha` and `mask` must be the values the layer is rendered
/// with.
///
/// # Panics
///
/// Panics when `mask` does not match the image dimensions.
pub fn upgrade_multiply_layer(image: &mut ColorBuffer, alpha: u8, mask: Option<&MaskBuffer>) {
    if let Some(mask) = mask {
        assert!(
            mask.width() == image.width() && mask.height() == image.height(),
            "mask must match the layer it upgrades"
        );
    }
    let mask_data = mask.map(MaskBuffer::data);
    for (i, px) in image
        .data_mut()
        .chunks_exact_mut(BYTES_PER_PIXEL)
        .enumerate()
    {
        let m = mask_data.map_or(255, |d| d[i]);
        let a1 = layer_alpha(px, alpha, m);
        if a1 == 0 {
            continue;
        }
        for c in &mut px[..3] {
            let q = a1 * i64::from(255 - *c) / ONE;
            let darken = q * ONE / a1;
            *c = (255 - darken) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/blend/kernel.rs"]
mod tests;
