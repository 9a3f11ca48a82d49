//! Fixed-point helpers shared by the blend kernels.
//!
//! Alphas are carried at full precision as integer numerators over [`ALPHA_ONE`]:
//! `pixel_alpha (0..=255) * layer_alpha (0..=100) * mask (0..=255)`. Every product the kernels
//! form stays below `255 * 2 * ALPHA_ONE^2`, which fits in `i64`.

/// Denominator representing an alpha of 1.0 (`255 * 100 * 255`).
pub(crate) const ALPHA_ONE: u64 = 255 * 100 * 255;

/// Scale turning an 8-bit fusion alpha into an [`ALPHA_ONE`] numerator.
pub(crate) const FUSION_ALPHA_SCALE: u64 = ALPHA_ONE / 255;

/// Denominator of a passthrough mix fraction (`mask * layer_alpha`).
pub(crate) const MIX_ONE: u64 = 255 * 100;

/// Effective layer alpha numerator over [`ALPHA_ONE`].
#[inline]
pub(crate) fn effective_alpha(pixel_alpha: u8, layer_alpha: u8, mask: u8) -> u64 {
    u64::from(pixel_alpha) * u64::from(layer_alpha) * u64::from(mask)
}

/// Truncating `x * y / 255`.
#[inline]
pub(crate) fn mul_div255(x: u32, y: u32) -> u32 {
    x * y / 255
}

/// Clamp a signed intermediate into a channel value.
#[inline]
pub(crate) fn clamp_u8(v: i64) -> u8 {
    v.clamp(0, 255) as u8
}

/// 8-bit alpha stored for an [`ALPHA_ONE`] numerator, truncated.
#[inline]
pub(crate) fn alpha_to_u8(alpha: u64) -> u8 {
    (alpha * 255 / ALPHA_ONE) as u8
}

/// Combine a group alpha with a child alpha (both percentages), rounding half up.
pub(crate) fn combine_percent(group: u8, child: u8) -> u8 {
    ((u32::from(group) * u32::from(child) + 50) / 100) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
