//! Layerfuse is an incremental raster layer compositor for painting applications.
//!
//! Images are straight (non-premultiplied) 8-bit RGBA. The crate is organized around three
//! pieces:
//!
//! - The kernel library: [`fuse_image_onto_image`] blends one buffer onto another with any of
//!   the 17 [`BlendMode`]s, choosing a specialized kernel through [`KernelKey`]
//! - The [`Document`] model: a tree of [`ImageLayer`]s and [`LayerGroup`]s with opacity, masks,
//!   clipping and visibility
//! - The [`BlendTree`]: a compositing tree built from a document that recomposites only dirty
//!   rectangles and recycles group buffers through a pool
//!
//! Documents can be authored as JSON and loaded with [`Scene`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub(crate) mod blend;
pub(crate) mod buffer;
pub(crate) mod document;
pub(crate) mod foundation;
pub(crate) mod scene;
pub(crate) mod tree;

pub use crate::blend::dispatch::{
    FusionOpacity, KernelKey, KernelOp, LayerOpacity, blend_function_name_for_parameters,
    fuse_image_onto_image, fuse_image_onto_image_at, multiply_alpha_by, multiply_alpha_by_mask,
};
pub use crate::blend::kernel::upgrade_multiply_layer;
pub use crate::blend::mode::BlendMode;
pub use crate::buffer::color::{BYTES_PER_PIXEL, ColorBuffer};
pub use crate::buffer::mask::MaskBuffer;
pub use crate::document::Document;
pub use crate::document::layer::{
    ImageLayer, Layer, LayerGroup, LayerId, LayerIdAllocator, LayerProperty,
};
pub use crate::foundation::core::{Canvas, PixelRect, Rect, Rgba8};
pub use crate::foundation::error::{FuseError, FuseResult};
pub use crate::scene::composition::Scene;
pub use crate::tree::pool::{BufferPoolOpts, BufferPoolStats};
pub use crate::tree::{BlendTree, BlendTreeOpts, BlendTreeStats, Fusion};
