//! Bottom-up recomposition of dirty nodes.

use crate::blend::dispatch::{KernelKey, KernelOp, fuse_image_onto_image};
use crate::blend::mode::BlendMode;
use crate::buffer::color::ColorBuffer;
use crate::buffer::mask::MaskBuffer;
use crate::document::layer::LayerId;
use crate::foundation::core::PixelRect;
use crate::tree::node::{Node, NodeId, NodeSource};
use crate::tree::{BlendTree, LayerIndex};

/// What a child contributes when it is blended into its parent.
struct NodeInput<'s> {
    image: &'s ColorBuffer,
    alpha: u8,
    blend_mode: BlendMode,
    mask: Option<&'s MaskBuffer>,
}

pub(super) fn layer_image<'a>(layers: &LayerIndex<'a>, id: LayerId) -> &'a ColorBuffer {
    layers
        .get(&id)
        .and_then(|layer| layer.image())
        .unwrap_or_else(|| {
            panic!("image layer {id} is not in the document the tree was built from")
        })
}

pub(super) fn layer_mask<'a>(layers: &LayerIndex<'a>, id: LayerId) -> &'a MaskBuffer {
    layers
        .get(&id)
        .and_then(|layer| layer.mask())
        .unwrap_or_else(|| {
            panic!("mask of layer {id} is not in the document the tree was built from")
        })
}

pub(super) fn group_image(node: &Node) -> &ColorBuffer {
    node.image
        .as_ref()
        .unwrap_or_else(|| panic!("group node {:?} has no buffer", node.source))
}

impl BlendTree {
    pub(super) fn blend_nodes(&mut self, root: NodeId, layers: &LayerIndex<'_>) {
        if !self.nodes[root.0].is_leaf() {
            self.blend_group(root, layers);
        }
        for node in &mut self.nodes {
            node.dirty = PixelRect::EMPTY;
        }
    }

    fn input<'s>(&'s self, id: NodeId, layers: &LayerIndex<'s>) -> NodeInput<'s> {
        let node = &self.nodes[id.0];
        let image = match node.source {
            NodeSource::Layer(layer) => layer_image(layers, layer),
            NodeSource::Group(_) => group_image(node),
        };
        NodeInput {
            image,
            alpha: node.alpha,
            blend_mode: node.blend_mode,
            mask: node.mask.map(|m| layer_mask(layers, m)),
        }
    }

    /// Recomposite the isolated groups below `id`, looking through passthrough groups.
    fn blend_subgroups(&mut self, id: NodeId, layers: &LayerIndex<'_>) {
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let node = &self.nodes[child.0];
            if node.is_leaf() {
                continue;
            }
            if node.is_passthrough_group() {
                self.blend_subgroups(child, layers);
            } else {
                self.blend_group(child, layers);
            }
        }
    }

    fn blend_group(&mut self, id: NodeId, layers: &LayerIndex<'_>) {
        self.blend_subgroups(id, layers);

        let rect = self.nodes[id.0].dirty;
        if rect.is_empty() {
            return;
        }
        let Some(mut fusion) = self.nodes[id.0].image.take() else {
            return;
        };
        tracing::trace!(node = id.0, ?rect, "recompositing group");
        self.merge_children(id, &mut fusion, rect, false, layers);
        self.nodes[id.0].image = Some(fusion);
        self.stats.merges = self.stats.merges.saturating_add(1);
    }

    /// Blend every child of `id` into `fusion` over `rect`.
    ///
    /// Unless `onto_existing`, the first child replaces the rectangle instead of blending onto it.
    fn merge_children(
        &mut self,
        id: NodeId,
        fusion: &mut ColorBuffer,
        rect: PixelRect,
        onto_existing: bool,
        layers: &LayerIndex<'_>,
    ) {
        let children = self.nodes[id.0].children.clone();
        let mut first = !onto_existing;
        for &child in &children {
            if self.nodes[child.0].is_passthrough_group() {
                self.merge_passthrough(child, fusion, rect, first, layers);
            } else {
                let input = self.input(child, layers);
                if first {
                    KernelKey::for_replace(KernelOp::Replace, input.alpha, input.mask.is_some())
                        .apply(fusion, input.image, input.alpha, rect, input.mask);
                } else {
                    let has_transparency = fusion.has_transparency(rect);
                    fuse_image_onto_image(
                        fusion,
                        input.image,
                        has_transparency,
                        input.alpha,
                        input.blend_mode,
                        rect,
                        input.mask,
                    );
                }
            }
            first = false;
        }
        if first {
            fusion.clear_rect(rect);
        }

        if self.nodes[id.0].clip
            && let Some(&base) = children.first()
        {
            let input = self.input(base, layers);
            KernelKey::for_replace(KernelOp::ReplaceAlpha, input.alpha, input.mask.is_some())
                .apply(fusion, input.image, input.alpha, rect, input.mask);
        }
    }

    /// Recomposite a passthrough group on top of the parent's fusion so far, then mix it back in.
    fn merge_passthrough(
        &mut self,
        id: NodeId,
        fusion: &mut ColorBuffer,
        rect: PixelRect,
        first: bool,
        layers: &LayerIndex<'_>,
    ) {
        if first {
            fusion.clear_rect(rect);
        }
        let Some(mut group) = self.nodes[id.0].image.take() else {
            return;
        };
        tracing::trace!(node = id.0, ?rect, "recompositing passthrough group");
        group.copy_region_from(fusion, rect);
        self.merge_children(id, &mut group, rect, true, layers);

        let node = &self.nodes[id.0];
        let mask = node.mask.map(|m| layer_mask(layers, m));
        fuse_image_onto_image(
            fusion,
            &group,
            true,
            node.alpha,
            BlendMode::Passthrough,
            rect,
            mask,
        );
        self.nodes[id.0].image = Some(group);
        self.stats.merges = self.stats.merges.saturating_add(1);
    }
}
