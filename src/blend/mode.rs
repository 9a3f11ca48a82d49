use crate::foundation::error::{FuseError, FuseResult};

/// The fixed table of layer blend operators.
///
/// Discriminants are the stable ids used by scene files and saved documents.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BlendMode {
    /// Layer color over the fusion.
    #[default]
    Normal = 0,
    /// Legacy multiply. Rounds the opaque-fusion path differently from [`BlendMode::Multiply2`].
    Multiply = 1,
    /// Linear dodge.
    #[serde(alias = "linear_dodge")]
    Add = 2,
    /// Inverted multiply of the inverted colors.
    Screen = 3,
    /// Per-channel maximum.
    Lighten = 4,
    /// Per-channel minimum.
    Darken = 5,
    /// Linear burn.
    #[serde(alias = "linear_burn")]
    Subtract = 6,
    /// Color dodge.
    Dodge = 7,
    /// Color burn.
    Burn = 8,
    /// Multiply or screen depending on the fusion.
    Overlay = 9,
    /// Multiply or screen depending on the layer.
    HardLight = 10,
    /// Softened hard light.
    SoftLight = 11,
    /// Burn or dodge depending on the layer.
    VividLight = 12,
    /// Linear burn or linear dodge depending on the layer.
    LinearLight = 13,
    /// Darken or lighten depending on the layer.
    PinLight = 14,
    /// Group mode: children blend against whatever lies beneath the group.
    #[serde(alias = "pass_through")]
    Passthrough = 15,
    /// Multiply with rounding that agrees between opaque and transparent fusions.
    Multiply2 = 16,
}

impl BlendMode {
    /// Every mode, ordered by id.
    pub const ALL: [Self; 17] = [
        Self::Normal,
        Self::Multiply,
        Self::Add,
        Self::Screen,
        Self::Lighten,
        Self::Darken,
        Self::Subtract,
        Self::Dodge,
        Self::Burn,
        Self::Overlay,
        Self::HardLight,
        Self::SoftLight,
        Self::VividLight,
        Self::LinearLight,
        Self::PinLight,
        Self::Passthrough,
        Self::Multiply2,
    ];

    /// Stable numeric id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Look up a mode by id.
    pub fn from_id(id: u8) -> FuseResult<Self> {
        Self::ALL
            .get(usize::from(id))
            .copied()
            .ok_or_else(|| FuseError::validation(format!("unknown blend mode id {id}")))
    }

    /// Lower-case identifier, also used in kernel names.
    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Add => "add",
            Self::Screen => "screen",
            Self::Lighten => "lighten",
            Self::Darken => "darken",
            Self::Subtract => "subtract",
            Self::Dodge => "dodge",
            Self::Burn => "burn",
            Self::Overlay => "overlay",
            Self::HardLight => "hard_light",
            Self::SoftLight => "soft_light",
            Self::VividLight => "vivid_light",
            Self::LinearLight => "linear_light",
            Self::PinLight => "pin_light",
            Self::Passthrough => "passthrough",
            Self::Multiply2 => "multiply2",
        }
    }

    /// Return `true` for [`BlendMode::Passthrough`].
    pub fn is_passthrough(self) -> bool {
        self == Self::Passthrough
    }
}

impl std::fmt::Display for BlendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/blend/mode.rs"]
mod tests;
