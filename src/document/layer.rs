use crate::blend::mode::BlendMode;
use crate::buffer::color::ColorBuffer;
use crate::buffer::mask::MaskBuffer;
use crate::foundation::core::Rgba8;

/// Stable identity of a layer or group within a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u32);

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out increasing [`LayerId`]s.
#[derive(Clone, Debug, Default)]
pub struct LayerIdAllocator {
    next: u32,
}

impl LayerIdAllocator {
    /// Allocator whose first id is `LayerId(0)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unused id.
    pub fn alloc(&mut self) -> LayerId {
        let id = LayerId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Which layer attribute an edit touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerProperty {
    /// Opacity.
    Alpha,
    /// Blend mode.
    BlendMode,
    /// Visibility toggle.
    Visible,
    /// Clipping flag.
    Clip,
    /// Mask added, removed or replaced.
    Mask,
    /// Display name.
    Name,
}

/// A raster layer with its own canvas-sized pixels.
#[derive(Clone, Debug)]
pub struct ImageLayer {
    /// Identity.
    pub id: LayerId,
    /// Display name.
    pub name: String,
    /// Straight-alpha pixels.
    pub image: ColorBuffer,
    /// Optional mask, same size as `image`.
    pub mask: Option<MaskBuffer>,
    /// Opacity, 0..=100.
    pub alpha: u8,
    /// Blend mode. Passthrough is only meaningful for groups and composites as normal.
    pub blend_mode: BlendMode,
    /// Hidden layers do not contribute.
    pub visible: bool,
    /// Clip to the nearest non-clipping layer below.
    pub clip: bool,
}

impl ImageLayer {
    /// Transparent, visible, normal layer at full opacity.
    pub fn new(id: LayerId, width: u32, height: u32) -> Self {
        Self {
            id,
            name: String::new(),
            image: ColorBuffer::new(width, height),
            mask: None,
            alpha: 100,
            blend_mode: BlendMode::Normal,
            visible: true,
            clip: false,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Fill every pixel with `color`.
    pub fn with_fill(mut self, color: Rgba8) -> Self {
        let bounds = self.image.bounds();
        self.image.fill_rect(bounds, color);
        self
    }

    /// Replace the pixels.
    pub fn with_image(mut self, image: ColorBuffer) -> Self {
        self.image = image;
        self
    }

    /// Attach a mask.
    pub fn with_mask(mut self, mask: MaskBuffer) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Set opacity, clamped to 100.
    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha.min(100);
        self
    }

    /// Set the blend mode.
    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    /// Show or hide.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set the clipping flag.
    pub fn with_clip(mut self, clip: bool) -> Self {
        self.clip = clip;
        self
    }
}

/// A group of layers, bottom first.
#[derive(Clone, Debug)]
pub struct LayerGroup {
    /// Identity.
    pub id: LayerId,
    /// Display name.
    pub name: String,
    /// Children, bottom first.
    pub children: Vec<Layer>,
    /// Optional canvas-sized mask.
    pub mask: Option<MaskBuffer>,
    /// Opacity, 0..=100.
    pub alpha: u8,
    /// Blend mode of the merged group.
    pub blend_mode: BlendMode,
    /// Hidden groups do not contribute.
    pub visible: bool,
}

impl LayerGroup {
    /// Empty, visible, normal group at full opacity.
    pub fn new(id: LayerId) -> Self {
        Self {
            id,
            name: String::new(),
            children: Vec::new(),
            mask: None,
            alpha: 100,
            blend_mode: BlendMode::Normal,
            visible: true,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Attach a mask.
    pub fn with_mask(mut self, mask: MaskBuffer) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Set opacity, clamped to 100.
    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha.min(100);
        self
    }

    /// Set the blend mode.
    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    /// Show or hide.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Append a child on top of the existing ones.
    pub fn with_child(mut self, child: impl Into<Layer>) -> Self {
        self.push(child);
        self
    }

    /// Append a child on top of the existing ones.
    pub fn push(&mut self, child: impl Into<Layer>) {
        self.children.push(child.into());
    }

    /// Find a descendant by id.
    pub fn find(&self, id: LayerId) -> Option<&Layer> {
        for child in &self.children {
            if child.id() == id {
                return Some(child);
            }
            if let Layer::Group(g) = child
                && let Some(found) = g.find(id)
            {
                return Some(found);
            }
        }
        None
    }

    /// Find a descendant by id, mutably.
    pub fn find_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        for child in &mut self.children {
            if child.id() == id {
                return Some(child);
            }
            if let Layer::Group(g) = child
                && let Some(found) = g.find_mut(id)
            {
                return Some(found);
            }
        }
        None
    }

    /// Visit every descendant in pre-order (a group before its children, children bottom first).
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Layer)) {
        for child in &self.children {
            f(child);
            if let Layer::Group(g) = child {
                g.visit(f);
            }
        }
    }
}

/// A node of the layer hierarchy.
#[derive(Clone, Debug)]
pub enum Layer {
    /// Raster layer.
    Image(ImageLayer),
    /// Nested group.
    Group(LayerGroup),
}

impl From<ImageLayer> for Layer {
    fn from(value: ImageLayer) -> Self {
        Self::Image(value)
    }
}

impl From<LayerGroup> for Layer {
    fn from(value: LayerGroup) -> Self {
        Self::Group(value)
    }
}

impl Layer {
    /// Identity.
    pub fn id(&self) -> LayerId {
        match self {
            Self::Image(l) => l.id,
            Self::Group(g) => g.id,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Image(l) => &l.name,
            Self::Group(g) => &g.name,
        }
    }

    /// Opacity, 0..=100.
    pub fn alpha(&self) -> u8 {
        match self {
            Self::Image(l) => l.alpha,
            Self::Group(g) => g.alpha,
        }
    }

    /// Blend mode.
    pub fn blend_mode(&self) -> BlendMode {
        match self {
            Self::Image(l) => l.blend_mode,
            Self::Group(g) => g.blend_mode,
        }
    }

    /// Visibility.
    pub fn visible(&self) -> bool {
        match self {
            Self::Image(l) => l.visible,
            Self::Group(g) => g.visible,
        }
    }

    /// Mask, if any.
    pub fn mask(&self) -> Option<&MaskBuffer> {
        match self {
            Self::Image(l) => l.mask.as_ref(),
            Self::Group(g) => g.mask.as_ref(),
        }
    }

    /// Clipping flag. Groups never clip.
    pub fn clip(&self) -> bool {
        match self {
            Self::Image(l) => l.clip,
            Self::Group(_) => false,
        }
    }

    /// Visible with non-zero opacity.
    pub fn contributes(&self) -> bool {
        self.visible() && self.alpha() > 0
    }

    /// Pixels of an image layer.
    pub fn image(&self) -> Option<&ColorBuffer> {
        match self {
            Self::Image(l) => Some(&l.image),
            Self::Group(_) => None,
        }
    }

    /// Set the opacity, clamped to 100.
    pub fn set_alpha(&mut self, alpha: u8) {
        let alpha = alpha.min(100);
        match self {
            Self::Image(l) => l.alpha = alpha,
            Self::Group(g) => g.alpha = alpha,
        }
    }

    /// Set the blend mode.
    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        match self {
            Self::Image(l) => l.blend_mode = mode,
            Self::Group(g) => g.blend_mode = mode,
        }
    }

    /// Show or hide.
    pub fn set_visible(&mut self, visible: bool) {
        match self {
            Self::Image(l) => l.visible = visible,
            Self::Group(g) => g.visible = visible,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/layer.rs"]
mod tests;
