use super::*;
use serde_json::json;

#[test]
fn parses_hex_rgb_and_rgba() {
    let c: ColorDef = serde_json::from_value(json!("#ff0000")).unwrap();
    assert_eq!(c.0, Rgba8::opaque(255, 0, 0));

    let c: ColorDef = serde_json::from_value(json!("0000FF80")).unwrap();
    assert_eq!(c.0, Rgba8::new(0, 0, 255, 128));
}

#[test]
fn parses_byte_arrays() {
    let c: ColorDef = serde_json::from_value(json!([1, 2, 3])).unwrap();
    assert_eq!(c.0, Rgba8::opaque(1, 2, 3));
    let c: ColorDef = serde_json::from_value(json!([1, 2, 3, 4])).unwrap();
    assert_eq!(c.0, Rgba8::new(1, 2, 3, 4));
    assert!(serde_json::from_value::<ColorDef>(json!([1, 2])).is_err());
}

#[test]
fn rejects_malformed_hex() {
    assert!(parse_hex("#12345").is_err());
    assert!(parse_hex("#gg0000").is_err());
    assert!(parse_hex("#ééé").is_err());
}

#[test]
fn color_serializes_as_hex() {
    let v = serde_json::to_value(ColorDef(Rgba8::new(0x12, 0xab, 0, 0xff))).unwrap();
    assert_eq!(v, json!("#12ab00ff"));
}

#[test]
fn layer_defaults_apply() {
    let def: SceneDef = serde_json::from_value(json!({
        "version": "1",
        "canvas": {"width": 4, "height": 2},
        "layers": [
            {"kind": "image", "fill": "#102030"},
            {"kind": "group", "blend": "pass_through", "children": [
                {"kind": "image", "alpha": 40, "blend": "multiply", "clip": true,
                 "paint": [{"rect": {"x0": 0.0, "y0": 0.0, "x1": 1.5, "y1": 1.0}, "color": "#ffffff"}]}
            ]}
        ]
    }))
    .unwrap();

    assert_eq!(def.layers.len(), 2);
    let LayerDef::Image(bottom) = &def.layers[0] else {
        panic!("expected image layer");
    };
    assert_eq!(bottom.alpha, 100);
    assert_eq!(bottom.blend, BlendMode::Normal);
    assert!(bottom.visible);
    assert!(!bottom.clip);

    let LayerDef::Group(group) = &def.layers[1] else {
        panic!("expected group");
    };
    assert_eq!(group.blend, BlendMode::Passthrough);
    let LayerDef::Image(inner) = &group.children[0] else {
        panic!("expected image layer");
    };
    assert_eq!(inner.alpha, 40);
    assert!(inner.clip);
    assert_eq!(inner.paint[0].rect.x1, 1.5);
}

#[test]
fn unknown_kind_is_rejected() {
    let r = serde_json::from_value::<LayerDef>(json!({"kind": "text"}));
    assert!(r.is_err());
}

#[test]
fn rgba8_from_str_uses_hex_syntax() {
    assert_eq!("#0a0b0c".parse::<Rgba8>().unwrap(), Rgba8::opaque(10, 11, 12));
    let err = "red".parse::<Rgba8>().unwrap_err();
    assert!(matches!(err, FuseError::Validation(_)));
}
