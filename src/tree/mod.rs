//! Incremental compositing tree.
//!
//! A [`BlendTree`] mirrors a [`LayerGroup`] hierarchy as an arena of nodes. Building applies the
//! structural optimizations (pruning, single-child folding, passthrough splicing, clip groups);
//! blending recomposites only the dirty rectangles, bottom-up.

mod blend;
pub(crate) mod build;
pub(crate) mod node;
pub(crate) mod pool;

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::blend::dispatch::{KernelKey, KernelOp};
use crate::blend::mode::BlendMode;
use crate::buffer::color::ColorBuffer;
use crate::buffer::mask::MaskBuffer;
use crate::document::Document;
use crate::document::layer::{Layer, LayerGroup, LayerId, LayerProperty};
use crate::foundation::core::{Canvas, PixelRect};
use build::Plan;
use node::{Node, NodeChildren, NodeId, NodeSource};
use pool::{BufferPool, BufferPoolOpts, BufferPoolStats};

/// Options for a [`BlendTree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlendTreeOpts {
    /// Guarantee that [`BlendTree::blend_tree`] returns an owned buffer at alpha 100, normal mode
    /// and without mask, wrapping the root in a synthetic group when needed.
    pub require_simple_fusion: bool,
    /// Spare buffer retention.
    pub pool: BufferPoolOpts,
}

impl BlendTreeOpts {
    /// Set [`BlendTreeOpts::require_simple_fusion`].
    pub fn with_require_simple_fusion(mut self, on: bool) -> Self {
        self.require_simple_fusion = on;
        self
    }

    /// Set [`BlendTreeOpts::pool`].
    pub fn with_pool(mut self, pool: BufferPoolOpts) -> Self {
        self.pool = pool;
        self
    }
}

/// Counters for tests and diagnostics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlendTreeStats {
    /// Completed [`BlendTree::build_tree`] calls that built something.
    pub builds: u64,
    /// [`BlendTree::reset_tree`] calls that tore down a built tree.
    pub resets: u64,
    /// Group nodes recomposited over a non-empty dirty rectangle.
    pub merges: u64,
    /// Buffer pool counters.
    pub pool: BufferPoolStats,
}

/// Result of [`BlendTree::blend_tree`]: the root buffer plus how it should be applied.
#[derive(Debug, Clone, Copy)]
pub struct Fusion<'a> {
    /// Root pixels. Borrowed from a layer when the whole document folds into one layer.
    pub image: &'a ColorBuffer,
    /// Opacity, 0..=100.
    pub alpha: u8,
    /// Blend mode of the root.
    pub blend_mode: BlendMode,
    /// Mask of the root, if any.
    pub mask: Option<&'a MaskBuffer>,
}

impl Fusion<'_> {
    /// Copy of the image with alpha and mask applied to its alpha channel.
    ///
    /// The alpha is computed with the same single truncation the `replace` kernel uses, so a
    /// folded root flattens to the same bytes as the group it replaces.
    pub fn flatten(&self) -> ColorBuffer {
        let mut out = ColorBuffer::new(self.image.width(), self.image.height());
        let rect = out.bounds();
        let alpha = self.alpha.min(100);
        KernelKey::for_replace(KernelOp::Replace, alpha, self.mask.is_some()).apply(
            &mut out,
            self.image,
            alpha,
            rect,
            self.mask,
        );
        out
    }
}

pub(crate) type LayerIndex<'a> = HashMap<LayerId, &'a Layer>;

fn index_layers<'a>(group: &'a LayerGroup, out: &mut LayerIndex<'a>) {
    for child in &group.children {
        out.insert(child.id(), child);
        if let Layer::Group(g) = child {
            index_layers(g, out);
        }
    }
}

/// The compositing tree for one canvas.
#[derive(Debug)]
pub struct BlendTree {
    opts: BlendTreeOpts,
    canvas: Canvas,
    nodes: Vec<Node>,
    root: Option<NodeId>,
    by_layer: HashMap<LayerId, NodeId>,
    pool: BufferPool,
    stats: BlendTreeStats,
}

impl BlendTree {
    /// Unbuilt tree for a canvas.
    pub fn new(canvas: Canvas, opts: BlendTreeOpts) -> Self {
        let mut pool = BufferPool::new(opts.pool);
        pool.resize(canvas.width, canvas.height);
        Self {
            opts,
            canvas,
            nodes: Vec::new(),
            root: None,
            by_layer: HashMap::new(),
            pool,
            stats: BlendTreeStats::default(),
        }
    }

    /// Unbuilt tree sized for `doc`.
    pub fn for_document(doc: &Document, opts: BlendTreeOpts) -> Self {
        Self::new(doc.canvas(), opts)
    }

    /// Options the tree was created with.
    pub fn opts(&self) -> BlendTreeOpts {
        self.opts
    }

    /// Return `true` once [`BlendTree::build_tree`] has run since the last reset.
    pub fn is_built(&self) -> bool {
        self.root.is_some()
    }

    /// Counters, including the buffer pool's.
    pub fn stats(&self) -> BlendTreeStats {
        let mut stats = self.stats.clone();
        stats.pool = self.pool.stats();
        stats
    }

    /// Dirty rectangle of the node a layer maps to, if it is in the tree.
    pub fn dirty_rect(&self, layer: LayerId) -> Option<PixelRect> {
        self.by_layer.get(&layer).map(|id| self.nodes[id.0].dirty)
    }

    /// Dirty rectangle of the root node, empty when unbuilt.
    pub fn root_dirty_rect(&self) -> PixelRect {
        self.root.map_or(PixelRect::EMPTY, |id| self.nodes[id.0].dirty)
    }

    /// Number of materialized nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Mark `rect` of a layer (and every ancestor) for recomposition.
    ///
    /// Unknown or pruned layers and an unbuilt tree are ignored.
    pub fn invalidate_layer_rect(&mut self, layer: LayerId, rect: PixelRect) {
        let rect = rect.intersect(self.canvas.rect());
        if rect.is_empty() {
            return;
        }
        let Some(&id) = self.by_layer.get(&layer) else {
            tracing::trace!(%layer, "invalidation of a layer outside the tree ignored");
            return;
        };
        self.invalidate_node(id, rect);
    }

    fn invalidate_node(&mut self, id: NodeId, rect: PixelRect) {
        let mut cur = Some(id);
        while let Some(n) = cur {
            let node = &mut self.nodes[n.0];
            node.dirty = node.dirty.union(rect);
            cur = node.parent;
        }
    }

    /// Build the tree from `root` unless it is already built.
    #[tracing::instrument(skip_all, fields(width = self.canvas.width, height = self.canvas.height))]
    pub fn build_tree(&mut self, root: &LayerGroup) {
        self.ensure_built(root);
    }

    fn ensure_built(&mut self, root: &LayerGroup) -> NodeId {
        if let Some(id) = self.root {
            return id;
        }

        let plan = build::plan_root(root, self.opts.require_simple_fusion);
        let id = self.materialize(plan, None);
        self.root = Some(id);
        self.pool.drain();
        self.stats.builds = self.stats.builds.saturating_add(1);
        tracing::debug!(
            nodes = self.nodes.len(),
            mapped_layers = self.by_layer.len(),
            pool = ?self.pool.stats(),
            "compositing tree built"
        );
        id
    }

    fn materialize(&mut self, plan: Plan, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let image = match plan.source {
            NodeSource::Layer(_) => None,
            NodeSource::Group(_) => Some(self.pool.take()),
        };
        self.nodes.push(Node {
            source: plan.source,
            image,
            mask: plan.mask,
            alpha: plan.alpha,
            blend_mode: plan.blend_mode,
            clip: plan.clip,
            folded: plan.folded,
            dirty: self.canvas.rect(),
            children: NodeChildren::new(),
            parent,
        });

        match plan.source {
            NodeSource::Layer(layer) | NodeSource::Group(Some(layer)) => {
                self.by_layer.insert(layer, id);
            }
            NodeSource::Group(None) => {}
        }
        for alias in plan.aliases {
            self.by_layer.insert(alias, id);
        }

        for child in plan.children {
            let child_id = self.materialize(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    /// Tear the tree down, returning every owned buffer to the pool.
    #[tracing::instrument(skip_all)]
    pub fn reset_tree(&mut self) {
        if self.root.is_none() {
            return;
        }
        for node in self.nodes.drain(..) {
            if let Some(buf) = node.image {
                self.pool.release(buf);
            }
        }
        self.by_layer.clear();
        self.root = None;
        self.stats.resets = self.stats.resets.saturating_add(1);
        tracing::debug!(pool = ?self.pool.stats(), "compositing tree reset");
    }

    /// React to an edit of one layer attribute in `root`.
    ///
    /// Opacity and blend-mode edits that leave the tree shape valid are applied in place and
    /// invalidate the whole canvas. Name edits are ignored. Anything else resets the tree.
    pub fn layer_property_changed(
        &mut self,
        root: &LayerGroup,
        layer: LayerId,
        property: LayerProperty,
    ) {
        match property {
            LayerProperty::Name => return,
            LayerProperty::Alpha | LayerProperty::BlendMode => {
                if self.update_in_place(root, layer) {
                    tracing::debug!(%layer, ?property, "layer property updated in place");
                    return;
                }
            }
            LayerProperty::Visible | LayerProperty::Clip | LayerProperty::Mask => {}
        }
        self.reset_tree();
    }

    fn update_in_place(&mut self, root: &LayerGroup, layer: LayerId) -> bool {
        let Some(&id) = self.by_layer.get(&layer) else {
            return false;
        };
        let Some(doc_layer) = root.find(layer) else {
            return false;
        };
        let node = &self.nodes[id.0];
        if node.direct_layer() != Some(layer) || !doc_layer.contributes() {
            return false;
        }

        let mut blend_mode = doc_layer.blend_mode();
        if node.is_leaf() {
            if blend_mode.is_passthrough() {
                blend_mode = BlendMode::Normal;
            }
        } else if node.blend_mode.is_passthrough() || blend_mode.is_passthrough() {
            return false;
        }

        // The base of a clip group also decides the clip group's mode.
        if let Some(parent) = node.parent {
            let parent = &self.nodes[parent.0];
            if parent.clip && parent.children.first() == Some(&id) && blend_mode != node.blend_mode
            {
                return false;
            }
        }

        let node = &mut self.nodes[id.0];
        node.alpha = doc_layer.alpha().min(100);
        node.blend_mode = blend_mode;
        let full = self.canvas.rect();
        self.invalidate_node(id, full);
        true
    }

    /// Build if needed, recomposite every dirty node and return the root fusion.
    ///
    /// # Panics
    ///
    /// Panics when `root` no longer contains a layer the tree was built from; structural edits
    /// must be followed by [`BlendTree::reset_tree`] or [`BlendTree::layer_property_changed`].
    #[tracing::instrument(skip_all)]
    pub fn blend_tree<'a>(&'a mut self, root: &'a LayerGroup) -> Fusion<'a> {
        let root_id = self.ensure_built(root);
        let mut layers = LayerIndex::new();
        index_layers(root, &mut layers);

        self.blend_nodes(root_id, &layers);

        let this: &'a BlendTree = self;
        let node = &this.nodes[root_id.0];
        let image = match node.source {
            NodeSource::Layer(layer) => blend::layer_image(&layers, layer),
            NodeSource::Group(_) => blend::group_image(node),
        };
        Fusion {
            image,
            alpha: node.alpha,
            blend_mode: node.blend_mode,
            mask: node.mask.map(|id| blend::layer_mask(&layers, id)),
        }
    }

    /// Indented, human-readable dump of the built tree.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        match self.root {
            Some(root) => self.describe_node(root, 0, &mut out),
            None => out.push_str("(not built)\n"),
        }
        out
    }

    fn describe_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = &self.nodes[id.0];
        let kind = match node.source {
            NodeSource::Layer(layer) => format!("layer {layer}"),
            NodeSource::Group(Some(layer)) => format!("group {layer}"),
            NodeSource::Group(None) if node.clip => "clip group".to_string(),
            NodeSource::Group(None) => "group".to_string(),
        };
        let _ = write!(
            out,
            "{:indent$}{kind} {} alpha={}",
            "",
            node.blend_mode,
            node.alpha,
            indent = depth * 2
        );
        if let Some(mask) = node.mask {
            let _ = write!(out, " mask={mask}");
        }
        if node.folded {
            out.push_str(" folded");
        }
        out.push('\n');
        for &child in &node.children {
            self.describe_node(child, depth + 1, out);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tree/mod.rs"]
mod tests;
