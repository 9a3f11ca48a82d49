//! Pre-blend color formulas.
//!
//! Each operator maps a straight layer channel `a` and a straight fusion channel `b` (both
//! 0..=255) to the color used where both are visible. Results may leave 0..=255 (`add`,
//! `subtract`); the kernels clamp the final channel, not the intermediate.

use crate::blend::mode::BlendMode;

/// Signature of a separable pre-blend operator.
pub(crate) type PreBlendFn = fn(i32, i32) -> i32;

const fn soft_light_low_table() -> [i32; 256] {
    let mut t = [0i32; 256];
    let mut b = 0;
    while b < 256 {
        let v = b as i32;
        t[b] = v - v * v / 255;
        b += 1;
    }
    t
}

const fn soft_light_high_table() -> [i32; 256] {
    let mut t = [0i32; 256];
    let mut b = 0;
    while b < 256 {
        t[b] = (255 * b as u32).isqrt() as i32 - b as i32;
        b += 1;
    }
    t
}

/// `b - b*b/255`, used when the layer channel is dark.
pub(crate) const SOFT_LIGHT_LOW: [i32; 256] = soft_light_low_table();
/// `sqrt(255*b) - b`, used when the layer channel is light.
pub(crate) const SOFT_LIGHT_HIGH: [i32; 256] = soft_light_high_table();

/// Operator for modes blended through the generic over algebra.
///
/// Returns `None` for the modes with dedicated kernels (`multiply`, `multiply2`, `passthrough`).
pub(crate) fn separable_op(mode: BlendMode) -> Option<PreBlendFn> {
    let op: PreBlendFn = match mode {
        BlendMode::Normal => normal,
        BlendMode::Add => add,
        BlendMode::Subtract => subtract,
        BlendMode::Screen => screen,
        BlendMode::Lighten => lighten,
        BlendMode::Darken => darken,
        BlendMode::Dodge => dodge,
        BlendMode::Burn => burn,
        BlendMode::Overlay => overlay,
        BlendMode::HardLight => hard_light,
        BlendMode::SoftLight => soft_light,
        BlendMode::VividLight => vivid_light,
        BlendMode::LinearLight => linear_light,
        BlendMode::PinLight => pin_light,
        BlendMode::Multiply | BlendMode::Multiply2 | BlendMode::Passthrough => return None,
    };
    Some(op)
}

pub(crate) fn normal(a: i32, _b: i32) -> i32 {
    a
}

pub(crate) fn add(a: i32, b: i32) -> i32 {
    a + b
}

pub(crate) fn subtract(a: i32, b: i32) -> i32 {
    a + b - 255
}

pub(crate) fn screen(a: i32, b: i32) -> i32 {
    255 - (255 - a) * (255 - b) / 255
}

pub(crate) fn lighten(a: i32, b: i32) -> i32 {
    a.max(b)
}

pub(crate) fn darken(a: i32, b: i32) -> i32 {
    a.min(b)
}

pub(crate) fn dodge(a: i32, b: i32) -> i32 {
    if a == 255 {
        255
    } else {
        (255 * b / (255 - a)).min(255)
    }
}

pub(crate) fn burn(a: i32, b: i32) -> i32 {
    if a == 0 {
        0
    } else {
        255 - (255 * (255 - b) / a).min(255)
    }
}

pub(crate) fn overlay(a: i32, b: i32) -> i32 {
    if b <= 127 {
        2 * a * b / 255
    } else {
        255 - 2 * (255 - a) * (255 - b) / 255
    }
}

pub(crate) fn hard_light(a: i32, b: i32) -> i32 {
    if a <= 127 {
        2 * a * b / 255
    } else {
        255 - 2 * (255 - a) * (255 - b) / 255
    }
}

pub(crate) fn soft_light(a: i32, b: i32) -> i32 {
    let idx = b as usize;
    if a <= 127 {
        b + (2 * a - 255) * SOFT_LIGHT_LOW[idx] / 255
    } else {
        b + (2 * a - 255) * SOFT_LIGHT_HIGH[idx] / 255
    }
}

pub(crate) fn vivid_light(a: i32, b: i32) -> i32 {
    if a <= 127 {
        if a == 0 {
            0
        } else {
            255 - (255 * (255 - b) / (2 * a)).min(255)
        }
    } else if a == 255 {
        255
    } else {
        (255 * b / (2 * (255 - a))).min(255)
    }
}

pub(crate) fn linear_light(a: i32, b: i32) -> i32 {
    (b + 2 * a - 255).clamp(0, 255)
}

pub(crate) fn pin_light(a: i32, b: i32) -> i32 {
    if b >= 2 * a {
        2 * a
    } else if b <= 2 * a - 255 {
        2 * a - 255
    } else {
        b
    }
}

#[cfg(test)]
#[path = "../../tests/unit/blend/ops.rs"]
mod tests;
