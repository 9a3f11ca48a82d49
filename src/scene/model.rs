use serde::{Deserialize, Serialize};

use crate::blend::mode::BlendMode;
use crate::foundation::core::{Rect, Rgba8};
use crate::foundation::error::FuseError;

/// The only scene format version understood by this crate.
pub(crate) const SCENE_VERSION_STR: &str = "1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SceneDef {
    pub(crate) version: String,
    pub(crate) canvas: CanvasDef,
    /// Bottom first.
    #[serde(default)]
    pub(crate) layers: Vec<LayerDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub(crate) struct CanvasDef {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum LayerDef {
    Image(ImageLayerDef),
    Group(GroupDef),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ImageLayerDef {
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) fill: Option<ColorDef>,
    /// PNG path, relative to the scene file.
    #[serde(default)]
    pub(crate) source: Option<String>,
    #[serde(default)]
    pub(crate) paint: Vec<PaintDef>,
    #[serde(default = "default_alpha")]
    pub(crate) alpha: u8,
    #[serde(default)]
    pub(crate) blend: BlendMode,
    #[serde(default = "default_true")]
    pub(crate) visible: bool,
    #[serde(default)]
    pub(crate) clip: bool,
    #[serde(default)]
    pub(crate) mask: Option<MaskDef>,
    /// Authored against legacy `multiply`; upgraded to `multiply2` on load.
    #[serde(default)]
    pub(crate) legacy_multiply: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct GroupDef {
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) children: Vec<LayerDef>,
    #[serde(default = "default_alpha")]
    pub(crate) alpha: u8,
    #[serde(default)]
    pub(crate) blend: BlendMode,
    #[serde(default = "default_true")]
    pub(crate) visible: bool,
    #[serde(default)]
    pub(crate) mask: Option<MaskDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PaintDef {
    pub(crate) rect: Rect,
    pub(crate) color: ColorDef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct MaskDef {
    /// Grey value of the whole mask before `source` and `paint`; white when absent.
    #[serde(default)]
    pub(crate) fill: Option<u8>,
    #[serde(default)]
    pub(crate) source: Option<String>,
    #[serde(default)]
    pub(crate) paint: Vec<MaskPaintDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct MaskPaintDef {
    pub(crate) rect: Rect,
    pub(crate) value: u8,
}

fn default_alpha() -> u8 {
    100
}

fn default_true() -> bool {
    true
}

/// Straight RGBA color written as `#RRGGBB`, `#RRGGBBAA` or `[r, g, b(, a)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColorDef(pub(crate) Rgba8);

impl Serialize for ColorDef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let Rgba8 { r, g, b, a } = self.0;
        serializer.serialize_str(&format!("#{r:02x}{g:02x}{b:02x}{a:02x}"))
    }
}

impl<'de> Deserialize<'de> for ColorDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Arr(Vec<u8>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map(Self).map_err(serde::de::Error::custom),
            Repr::Arr(v) => match v.as_slice() {
                &[r, g, b] => Ok(Self(Rgba8::opaque(r, g, b))),
                &[r, g, b, a] => Ok(Self(Rgba8::new(r, g, b, a))),
                _ => Err(serde::de::Error::custom(
                    "rgba array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

impl std::str::FromStr for Rgba8 {
    type Err = FuseError;

    /// Parse `#RRGGBB` or `#RRGGBBAA`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex(s).map_err(FuseError::validation)
    }
}

/// Parse `#RRGGBB` or `#RRGGBBAA` (the `#` is optional, hex digits are case-insensitive).
pub(crate) fn parse_hex(s: &str) -> Result<Rgba8, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() {
        return Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned());
    }
    match s.len() {
        6 => Ok(Rgba8::opaque(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        8 => Ok(Rgba8::new(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        )),
        _ => Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
