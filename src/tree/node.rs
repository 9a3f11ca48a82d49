use smallvec::SmallVec;

use crate::blend::mode::BlendMode;
use crate::buffer::color::ColorBuffer;
use crate::document::layer::LayerId;
use crate::foundation::core::PixelRect;

/// Index of a node in the tree arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

pub(crate) type NodeChildren = SmallVec<[NodeId; 4]>;

/// What a node reads its pixels from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NodeSource {
    /// Reads the image buffer of an image layer. Never owns a buffer.
    Layer(LayerId),
    /// Merges its children into an owned buffer. `None` for synthesized nodes.
    Group(Option<LayerId>),
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) source: NodeSource,
    /// Owned merge buffer; present on every group node while the tree is built.
    pub(crate) image: Option<ColorBuffer>,
    /// Layer or group whose mask applies when this node is blended into its parent.
    pub(crate) mask: Option<LayerId>,
    pub(crate) alpha: u8,
    pub(crate) blend_mode: BlendMode,
    /// Synthesized clip group: alpha is restored from the first child after merging.
    pub(crate) clip: bool,
    /// Carries the opacity, mode or mask of an eliminated single-child group.
    pub(crate) folded: bool,
    pub(crate) dirty: PixelRect,
    pub(crate) children: NodeChildren,
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.source, NodeSource::Layer(_))
    }

    /// Group recomposited against its parent's fusion instead of in isolation.
    pub(crate) fn is_passthrough_group(&self) -> bool {
        !self.is_leaf() && self.blend_mode.is_passthrough()
    }

    /// The layer this node mirrors without any folding.
    pub(crate) fn direct_layer(&self) -> Option<LayerId> {
        if self.folded {
            return None;
        }
        match self.source {
            NodeSource::Layer(id) | NodeSource::Group(Some(id)) => Some(id),
            NodeSource::Group(None) => None,
        }
    }
}
