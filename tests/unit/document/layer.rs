use super::*;

fn sample() -> LayerGroup {
    let mut ids = LayerIdAllocator::new();
    let root_id = ids.alloc();
    let bottom = ImageLayer::new(ids.alloc(), 2, 2).with_name("bottom");
    let inner = ImageLayer::new(ids.alloc(), 2, 2).with_name("inner");
    let group = LayerGroup::new(ids.alloc())
        .with_name("group")
        .with_child(inner);
    LayerGroup::new(root_id).with_child(bottom).with_child(group)
}

#[test]
fn allocator_hands_out_increasing_ids() {
    let mut ids = LayerIdAllocator::new();
    assert_eq!(ids.alloc(), LayerId(0));
    assert_eq!(ids.alloc(), LayerId(1));
    assert_eq!(LayerId(7).to_string(), "#7");
}

#[test]
fn find_reaches_nested_layers() {
    let root = sample();
    assert_eq!(root.find(LayerId(2)).map(Layer::name), Some("inner"));
    assert_eq!(root.find(LayerId(3)).map(Layer::name), Some("group"));
    assert!(root.find(LayerId(0)).is_none());
    assert!(root.find(LayerId(42)).is_none());
}

#[test]
fn find_mut_edits_in_place() {
    let mut root = sample();
    let layer = root.find_mut(LayerId(2)).unwrap();
    layer.set_alpha(250);
    layer.set_blend_mode(BlendMode::Screen);
    layer.set_visible(false);
    let layer = root.find(LayerId(2)).unwrap();
    assert_eq!(layer.alpha(), 100);
    assert_eq!(layer.blend_mode(), BlendMode::Screen);
    assert!(!layer.visible());
    assert!(!layer.contributes());
}

#[test]
fn visit_is_pre_order_bottom_first() {
    let root = sample();
    let mut order = Vec::new();
    root.visit(&mut |l: &Layer| order.push(l.id().0));
    assert_eq!(order, vec![1, 3, 2]);
}

#[test]
fn builders_set_fields() {
    let layer = ImageLayer::new(LayerId(5), 3, 1)
        .with_fill(Rgba8::opaque(1, 2, 3))
        .with_alpha(140)
        .with_blend_mode(BlendMode::Multiply2)
        .with_clip(true)
        .with_mask(MaskBuffer::white(3, 1));
    assert_eq!(layer.alpha, 100);
    assert_eq!(layer.image.pixel(2, 0), Rgba8::opaque(1, 2, 3));
    let layer = Layer::from(layer);
    assert!(layer.clip());
    assert!(layer.mask().is_some());
    assert!(!Layer::from(LayerGroup::new(LayerId(6))).clip());
}
