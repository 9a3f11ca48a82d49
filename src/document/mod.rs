//! The layer hierarchy a [`crate::BlendTree`] composites.

pub(crate) mod layer;

use std::collections::HashSet;

use crate::foundation::core::Canvas;
use crate::foundation::error::{FuseError, FuseResult};
use layer::{Layer, LayerGroup, LayerId};

/// A canvas plus its root group.
///
/// Every image and mask in the hierarchy has the canvas dimensions and every id is unique; the
/// constructor checks both.
#[derive(Clone, Debug)]
pub struct Document {
    canvas: Canvas,
    root: LayerGroup,
}

impl Document {
    /// Validate and wrap a layer hierarchy.
    pub fn new(canvas: Canvas, root: LayerGroup) -> FuseResult<Self> {
        let mut seen = HashSet::from([root.id]);
        let mut problems = Vec::new();
        if let Some(m) = &root.mask
            && (m.width(), m.height()) != (canvas.width, canvas.height)
        {
            problems.push(format!("root group {} mask has the wrong size", root.id));
        }
        root.visit(&mut |layer: &Layer| {
            let id = layer.id();
            if !seen.insert(id) {
                problems.push(format!("duplicate layer id {id}"));
            }
            if let Some(img) = layer.image()
                && (img.width(), img.height()) != (canvas.width, canvas.height)
            {
                problems.push(format!(
                    "layer {id} is {}x{}, canvas is {}x{}",
                    img.width(),
                    img.height(),
                    canvas.width,
                    canvas.height
                ));
            }
            if let Some(m) = layer.mask()
                && (m.width(), m.height()) != (canvas.width, canvas.height)
            {
                problems.push(format!("layer {id} mask has the wrong size"));
            }
        });

        if !problems.is_empty() {
            return Err(FuseError::validation(problems.join("; ")));
        }
        Ok(Self { canvas, root })
    }

    /// Canvas dimensions.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Canvas width.
    pub fn width(&self) -> u32 {
        self.canvas.width
    }

    /// Canvas height.
    pub fn height(&self) -> u32 {
        self.canvas.height
    }

    /// Root group.
    pub fn root(&self) -> &LayerGroup {
        &self.root
    }

    /// Root group, mutably. Edits must keep buffers canvas-sized.
    pub fn root_mut(&mut self) -> &mut LayerGroup {
        &mut self.root
    }

    /// Look up a layer or group below the root.
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.root.find(id)
    }

    /// Look up a layer or group below the root, mutably.
    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.root.find_mut(id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/mod.rs"]
mod tests;
