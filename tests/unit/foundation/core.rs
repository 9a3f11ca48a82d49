use super::*;

#[test]
fn canvas_rejects_zero_dimensions() {
    assert!(Canvas::new(0, 4).is_err());
    assert!(Canvas::new(4, 0).is_err());
    let c = Canvas::new(3, 2).unwrap();
    assert_eq!(c.rect(), PixelRect::new(0, 0, 3, 2));
    assert_eq!(c.pixel_count(), 6);
}

#[test]
fn inverted_rect_collapses_to_empty() {
    let r = PixelRect::new(5, 5, 2, 9);
    assert!(r.is_empty());
    assert_eq!(r, PixelRect::EMPTY);
    assert_eq!(r.width(), 0);
    assert_eq!(r.area(), 0);
}

#[test]
fn union_treats_empty_as_identity() {
    let a = PixelRect::new(1, 2, 4, 6);
    assert_eq!(PixelRect::EMPTY.union(a), a);
    assert_eq!(a.union(PixelRect::EMPTY), a);

    let b = PixelRect::new(3, 0, 10, 3);
    assert_eq!(a.union(b), PixelRect::new(1, 0, 10, 6));
}

#[test]
fn intersect_and_clip() {
    let a = PixelRect::new(-4, -4, 8, 8);
    assert_eq!(a.clip_to(5, 6), PixelRect::new(0, 0, 5, 6));
    assert!(a.intersect(PixelRect::new(20, 20, 30, 30)).is_empty());
}

#[test]
fn contains_rect_boundaries() {
    let outer = PixelRect::new(0, 0, 10, 10);
    assert!(outer.contains_rect(PixelRect::new(0, 0, 10, 10)));
    assert!(outer.contains_rect(PixelRect::EMPTY));
    assert!(!outer.contains_rect(PixelRect::new(5, 5, 11, 6)));
}

#[test]
fn kurbo_rect_rounds_outward() {
    let r = PixelRect::from_kurbo_outset(Rect::new(1.2, 2.7, 3.1, 3.0));
    assert_eq!(r, PixelRect::new(1, 2, 4, 3));

    let flipped = PixelRect::from_kurbo_outset(Rect::new(3.1, 3.0, 1.2, 2.7));
    assert_eq!(flipped, r);
}

#[test]
fn translate_moves_both_corners() {
    let r = PixelRect::from_xywh(2, 3, 4, 5).translate(-2, 1);
    assert_eq!(r, PixelRect::new(0, 4, 4, 9));
}
