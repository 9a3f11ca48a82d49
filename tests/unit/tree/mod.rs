use super::*;
use crate::document::layer::ImageLayer;
use crate::foundation::core::Rgba8;

const W: u32 = 4;
const H: u32 = 4;

fn canvas() -> Canvas {
    Canvas::new(W, H).unwrap()
}

fn solid(id: u32, color: Rgba8) -> ImageLayer {
    ImageLayer::new(LayerId(id), W, H).with_fill(color)
}

fn root() -> LayerGroup {
    LayerGroup::new(LayerId(0))
}

fn render(root: &LayerGroup, opts: BlendTreeOpts) -> ColorBuffer {
    let mut tree = BlendTree::new(canvas(), opts);
    tree.blend_tree(root).flatten()
}

fn render_default(root: &LayerGroup) -> ColorBuffer {
    render(root, BlendTreeOpts::default())
}

const BOTTOM: Rgba8 = Rgba8::opaque(200, 50, 50);
const TOP: Rgba8 = Rgba8::opaque(0, 100, 200);

#[test]
fn normal_half_alpha_scenario() {
    let doc = root()
        .with_child(solid(1, BOTTOM))
        .with_child(solid(2, TOP).with_alpha(50));
    assert_eq!(render_default(&doc).pixel(2, 2), Rgba8::opaque(100, 75, 125));
}

#[test]
fn multiply2_full_alpha_scenario() {
    let doc = root()
        .with_child(solid(1, BOTTOM))
        .with_child(solid(2, TOP).with_blend_mode(BlendMode::Multiply2));
    assert_eq!(render_default(&doc).pixel(0, 3), Rgba8::opaque(0, 19, 39));
}

#[test]
fn empty_document_is_transparent() {
    let doc = root().with_child(solid(1, TOP).with_visible(false));
    let out = render_default(&doc);
    assert!(out.is_transparent(out.bounds()));

    let out = render(&root(), BlendTreeOpts::default().with_require_simple_fusion(true));
    assert!(out.is_transparent(out.bounds()));
}

#[test]
fn single_layer_folds_into_fusion() {
    let doc = root().with_child(solid(1, TOP).with_alpha(50));
    let mut tree = BlendTree::new(canvas(), BlendTreeOpts::default());
    let fusion = tree.blend_tree(&doc);
    assert_eq!(fusion.alpha, 50);
    assert_eq!(fusion.image.pixel(0, 0), TOP);
    assert_eq!(fusion.flatten().pixel(0, 0), Rgba8::new(0, 100, 200, 127));
}

#[test]
fn simple_fusion_is_always_normal_opaque_unmasked() {
    let doc = root().with_child(
        solid(1, TOP)
            .with_alpha(50)
            .with_blend_mode(BlendMode::Screen)
            .with_mask(MaskBuffer::white(W, H)),
    );
    let mut tree = BlendTree::new(
        canvas(),
        BlendTreeOpts::default().with_require_simple_fusion(true),
    );
    let fusion = tree.blend_tree(&doc);
    assert_eq!(fusion.alpha, 100);
    assert_eq!(fusion.blend_mode, BlendMode::Normal);
    assert!(fusion.mask.is_none());
    assert_eq!(fusion.image.pixel(1, 1), Rgba8::new(0, 100, 200, 127));
}

#[test]
fn folded_and_simple_roots_flatten_identically() {
    let mut mask = MaskBuffer::filled(W, H, 200);
    mask.fill_rect(PixelRect::new(0, 0, 2, 2), 77);
    let mut image = ColorBuffer::filled(W, H, Rgba8::new(1, 185, 216, 37));
    image.fill_rect(PixelRect::new(2, 0, 4, 4), Rgba8::new(90, 3, 40, 255));
    let doc = root().with_child(
        ImageLayer::new(LayerId(1), W, H)
            .with_image(image)
            .with_alpha(40)
            .with_mask(mask),
    );

    let mut folded = BlendTree::new(canvas(), BlendTreeOpts::default());
    let mut simple = BlendTree::new(
        canvas(),
        BlendTreeOpts::default().with_require_simple_fusion(true),
    );
    let a = folded.blend_tree(&doc).flatten();
    let b = simple.blend_tree(&doc).flatten();
    assert_eq!(folded.node_count(), 1);
    assert_eq!(simple.node_count(), 2);
    assert_eq!(a, b);
    assert_eq!(a.pixel(2, 2).a, 80);
}

#[test]
fn second_blend_without_invalidation_does_no_work() {
    let doc = root()
        .with_child(solid(1, BOTTOM))
        .with_child(solid(2, TOP).with_alpha(70));
    let mut tree = BlendTree::new(canvas(), BlendTreeOpts::default());
    let first = tree.blend_tree(&doc).flatten();
    let merges = tree.stats().merges;
    let second = tree.blend_tree(&doc).flatten();
    assert_eq!(first, second);
    assert_eq!(tree.stats().merges, merges);
    assert_eq!(tree.stats().builds, 1);
}

#[test]
fn invalidation_reaches_the_root_and_blend_clears_it() {
    let doc = root().with_child(solid(1, BOTTOM)).with_child(
        LayerGroup::new(LayerId(2))
            .with_alpha(80)
            .with_child(solid(3, TOP))
            .with_child(solid(4, BOTTOM).with_blend_mode(BlendMode::Screen)),
    );
    let mut tree = BlendTree::new(canvas(), BlendTreeOpts::default());
    tree.blend_tree(&doc);
    assert!(tree.root_dirty_rect().is_empty());

    let rect = PixelRect::new(1, 1, 3, 2);
    tree.invalidate_layer_rect(LayerId(4), rect);
    assert_eq!(tree.dirty_rect(LayerId(4)), Some(rect));
    assert_eq!(tree.dirty_rect(LayerId(2)), Some(rect));
    assert!(tree.root_dirty_rect().contains_rect(rect));
    assert_eq!(tree.dirty_rect(LayerId(1)), Some(PixelRect::EMPTY));

    tree.blend_tree(&doc);
    for id in 1..=4 {
        assert_eq!(tree.dirty_rect(LayerId(id)), Some(PixelRect::EMPTY));
    }
    assert!(tree.root_dirty_rect().is_empty());
}

#[test]
fn invalidation_is_clipped_and_ignores_unknown_layers() {
    let doc = root()
        .with_child(solid(1, BOTTOM))
        .with_child(solid(2, TOP));
    let mut tree = BlendTree::new(canvas(), BlendTreeOpts::default());
    tree.invalidate_layer_rect(LayerId(1), PixelRect::from_size(1, 1));
    tree.blend_tree(&doc);

    tree.invalidate_layer_rect(LayerId(99), PixelRect::from_size(W, H));
    tree.invalidate_layer_rect(LayerId(1), PixelRect::new(3, 3, 40, 40));
    assert_eq!(tree.root_dirty_rect(), PixelRect::new(3, 3, 4, 4));
}

#[test]
fn incremental_update_matches_full_render() {
    let mut doc = root()
        .with_child(solid(1, BOTTOM))
        .with_child(
            LayerGroup::new(LayerId(2))
                .with_alpha(60)
                .with_blend_mode(BlendMode::Overlay)
                .with_child(solid(3, Rgba8::new(10, 200, 30, 128)))
                .with_child(
                    solid(4, TOP)
                        .with_blend_mode(BlendMode::HardLight)
                        .with_alpha(50),
                ),
        )
        .with_child(solid(5, Rgba8::new(255, 255, 0, 60)).with_blend_mode(BlendMode::Dodge));

    let mut tree = BlendTree::new(canvas(), BlendTreeOpts::default());
    tree.blend_tree(&doc);

    let rect = PixelRect::new(0, 1, 2, 3);
    if let Some(Layer::Image(l)) = doc.find_mut(LayerId(3)) {
        l.image.fill_rect(rect, Rgba8::new(90, 10, 250, 200));
    }
    tree.invalidate_layer_rect(LayerId(3), rect);
    let incremental = tree.blend_tree(&doc).flatten();

    assert_eq!(incremental, render_default(&doc));
}

#[test]
fn passthrough_group_matches_direct_siblings() {
    let b = solid(2, Rgba8::new(30, 160, 90, 200)).with_blend_mode(BlendMode::Multiply2);
    let c = solid(3, Rgba8::new(250, 20, 20, 90)).with_blend_mode(BlendMode::Screen);

    let direct = root()
        .with_child(solid(1, BOTTOM))
        .with_child(b.clone())
        .with_child(c.clone());
    let spliced = root().with_child(solid(1, BOTTOM)).with_child(
        LayerGroup::new(LayerId(4))
            .with_blend_mode(BlendMode::Passthrough)
            .with_child(b.clone())
            .with_child(c.clone()),
    );
    // A white mask keeps the group from being spliced, exercising the passthrough kernel.
    let masked = root().with_child(solid(1, BOTTOM)).with_child(
        LayerGroup::new(LayerId(4))
            .with_blend_mode(BlendMode::Passthrough)
            .with_mask(MaskBuffer::white(W, H))
            .with_child(b)
            .with_child(c),
    );

    let expected = render_default(&direct);
    assert_eq!(render_default(&spliced), expected);
    assert_eq!(render_default(&masked), expected);
}

#[test]
fn passthrough_group_at_zero_mix_leaves_fusion() {
    let doc = root().with_child(solid(1, BOTTOM)).with_child(
        LayerGroup::new(LayerId(4))
            .with_blend_mode(BlendMode::Passthrough)
            .with_mask(MaskBuffer::filled(W, H, 0))
            .with_child(solid(2, TOP))
            .with_child(solid(3, TOP)),
    );
    assert_eq!(render_default(&doc).pixel(1, 2), BOTTOM);
}

#[test]
fn clipping_restricts_to_base_alpha() {
    let mut base = ImageLayer::new(LayerId(2), W, H);
    base.image.fill_rect(PixelRect::new(0, 0, 2, H as i32), Rgba8::opaque(255, 0, 0));
    let doc = root()
        .with_child(solid(1, Rgba8::opaque(255, 255, 255)))
        .with_child(base)
        .with_child(solid(3, Rgba8::opaque(0, 0, 255)).with_clip(true));
    let out = render_default(&doc);
    assert_eq!(out.pixel(0, 0), Rgba8::opaque(0, 0, 255));
    assert_eq!(out.pixel(3, 0), Rgba8::opaque(255, 255, 255));
}

#[test]
fn alpha_edit_is_applied_in_place() {
    let mut doc = root()
        .with_child(solid(1, BOTTOM))
        .with_child(solid(2, TOP).with_alpha(50));
    let mut tree = BlendTree::new(canvas(), BlendTreeOpts::default());
    tree.blend_tree(&doc);

    if let Some(layer) = doc.find_mut(LayerId(2)) {
        layer.set_alpha(100);
        layer.set_blend_mode(BlendMode::Multiply2);
    }
    tree.layer_property_changed(&doc, LayerId(2), LayerProperty::Alpha);
    assert!(tree.is_built());
    assert_eq!(tree.root_dirty_rect(), PixelRect::from_size(W, H));

    let out = tree.blend_tree(&doc).flatten();
    assert_eq!(out.pixel(0, 0), Rgba8::opaque(0, 19, 39));
    assert_eq!(tree.stats().builds, 1);
    assert_eq!(tree.stats().resets, 0);
}

#[test]
fn structural_edits_reset_the_tree() {
    let mut doc = root()
        .with_child(solid(1, BOTTOM))
        .with_child(solid(2, TOP).with_alpha(50));
    let mut tree = BlendTree::new(canvas(), BlendTreeOpts::default());
    tree.blend_tree(&doc);

    tree.layer_property_changed(&doc, LayerId(2), LayerProperty::Name);
    assert!(tree.is_built());

    if let Some(layer) = doc.find_mut(LayerId(2)) {
        layer.set_visible(false);
    }
    tree.layer_property_changed(&doc, LayerId(2), LayerProperty::Visible);
    assert!(!tree.is_built());
    assert_eq!(tree.blend_tree(&doc).flatten().pixel(0, 0), BOTTOM);
    assert_eq!(tree.stats().builds, 2);
}

#[test]
fn alpha_edit_on_folded_layer_resets() {
    let mut doc = root().with_child(solid(1, BOTTOM)).with_child(
        LayerGroup::new(LayerId(2))
            .with_alpha(50)
            .with_child(solid(3, TOP)),
    );
    let mut tree = BlendTree::new(canvas(), BlendTreeOpts::default());
    tree.blend_tree(&doc);

    if let Some(layer) = doc.find_mut(LayerId(3)) {
        layer.set_alpha(40);
    }
    tree.layer_property_changed(&doc, LayerId(3), LayerProperty::Alpha);
    assert!(!tree.is_built());
    assert_eq!(tree.blend_tree(&doc).flatten(), render_default(&doc));
}

#[test]
fn rebuild_reuses_pooled_buffers() {
    let doc = root().with_child(solid(1, BOTTOM)).with_child(
        LayerGroup::new(LayerId(2))
            .with_mask(MaskBuffer::white(W, H))
            .with_child(solid(3, TOP).with_mask(MaskBuffer::white(W, H))),
    );
    let mut tree = BlendTree::new(canvas(), BlendTreeOpts::default());
    tree.build_tree(&doc);
    let allocated = tree.stats().pool.alloc_buffers;
    assert_eq!(allocated, 2);

    tree.reset_tree();
    assert_eq!(tree.stats().pool.retained_buffers, 2);
    tree.build_tree(&doc);
    let st = tree.stats();
    assert_eq!(st.pool.alloc_buffers, allocated);
    assert_eq!(st.pool.reused_buffers, 2);
    assert_eq!(st.pool.retained_buffers, 0);
    assert_eq!(tree.blend_tree(&doc).flatten(), render_default(&doc));
}

#[test]
fn zero_retention_pool_drops_buffers() {
    let doc = root()
        .with_child(solid(1, BOTTOM))
        .with_child(solid(2, TOP));
    let opts = BlendTreeOpts::default()
        .with_pool(BufferPoolOpts::default().with_max_retained_buffers(0));
    let mut tree = BlendTree::new(canvas(), opts);
    tree.build_tree(&doc);
    tree.reset_tree();
    assert_eq!(tree.stats().pool.retained_buffers, 0);
    assert_eq!(tree.stats().pool.dropped_on_release, 1);
}

#[test]
fn describe_lists_nodes() {
    let doc = root()
        .with_child(solid(1, BOTTOM))
        .with_child(solid(2, TOP).with_blend_mode(BlendMode::Screen).with_alpha(30));
    let mut tree = BlendTree::new(canvas(), BlendTreeOpts::default());
    assert_eq!(tree.describe(), "(not built)\n");
    tree.build_tree(&doc);
    assert_eq!(
        tree.describe(),
        "group #0 normal alpha=100\n  layer #1 normal alpha=100\n  layer #2 screen alpha=30\n"
    );
}
