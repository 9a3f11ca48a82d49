use std::fmt;

use crate::blend::mode::BlendMode;
use crate::foundation::core::Rect;
use crate::scene::model::{
    GroupDef, ImageLayerDef, LayerDef, MaskDef, SCENE_VERSION_STR, SceneDef,
};

/// Largest accepted canvas edge.
pub(crate) const MAX_CANVAS_EDGE: u32 = 1 << 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SchemaPathElem {
    Field(&'static str),
    Index(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct SchemaError {
    pub(crate) path: Vec<SchemaPathElem>,
    pub(crate) message: String,
}

impl SchemaError {
    fn at(path: &[SchemaPathElem], message: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return write!(f, "{}", self.message);
        }
        write!(f, "{}: {}", format_path(&self.path), self.message)
    }
}

fn format_path(path: &[SchemaPathElem]) -> String {
    let mut s = String::from("$");
    for p in path {
        match *p {
            SchemaPathElem::Field(name) => {
                s.push('.');
                s.push_str(name);
            }
            SchemaPathElem::Index(i) => {
                s.push('[');
                s.push_str(&i.to_string());
                s.push(']');
            }
        }
    }
    s
}

#[derive(Debug, Clone)]
pub(crate) struct SchemaErrors {
    pub(crate) errors: Vec<SchemaError>,
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

pub(crate) fn validate_scene(def: &SceneDef) -> Result<(), SchemaErrors> {
    let mut errors = Vec::new();

    if def.version != SCENE_VERSION_STR {
        errors.push(SchemaError::at(
            &[SchemaPathElem::Field("version")],
            format!("version must be \"{SCENE_VERSION_STR}\""),
        ));
    }

    for (field, v) in [("width", def.canvas.width), ("height", def.canvas.height)] {
        if v == 0 || v > MAX_CANVAS_EDGE {
            errors.push(SchemaError::at(
                &[SchemaPathElem::Field("canvas"), SchemaPathElem::Field(field)],
                format!("canvas {field} must be in 1..={MAX_CANVAS_EDGE}"),
            ));
        }
    }

    validate_layers(
        &def.layers,
        &mut vec![SchemaPathElem::Field("layers")],
        &mut errors,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaErrors { errors })
    }
}

fn validate_layers(
    layers: &[LayerDef],
    path: &mut Vec<SchemaPathElem>,
    errors: &mut Vec<SchemaError>,
) {
    for (i, layer) in layers.iter().enumerate() {
        path.push(SchemaPathElem::Index(i));
        match layer {
            LayerDef::Image(l) => validate_image(l, path, errors),
            LayerDef::Group(g) => validate_group(g, path, errors),
        }
        path.pop();
    }
}

fn validate_alpha(alpha: u8, path: &mut Vec<SchemaPathElem>, errors: &mut Vec<SchemaError>) {
    if alpha > 100 {
        path.push(SchemaPathElem::Field("alpha"));
        errors.push(SchemaError::at(path, "alpha must be in 0..=100"));
        path.pop();
    }
}

fn validate_rect(rect: Rect, path: &mut Vec<SchemaPathElem>, errors: &mut Vec<SchemaError>) {
    let finite = [rect.x0, rect.y0, rect.x1, rect.y1]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        path.push(SchemaPathElem::Field("rect"));
        errors.push(SchemaError::at(path, "rect coordinates must be finite"));
        path.pop();
    }
}

fn validate_image(
    l: &ImageLayerDef,
    path: &mut Vec<SchemaPathElem>,
    errors: &mut Vec<SchemaError>,
) {
    validate_alpha(l.alpha, path, errors);

    if l.fill.is_some() && l.source.is_some() {
        path.push(SchemaPathElem::Field("source"));
        errors.push(SchemaError::at(path, "fill and source are mutually exclusive"));
        path.pop();
    }
    if let Some(src) = &l.source
        && src.trim().is_empty()
    {
        path.push(SchemaPathElem::Field("source"));
        errors.push(SchemaError::at(path, "source must be a non-empty path"));
        path.pop();
    }

    path.push(SchemaPathElem::Field("paint"));
    for (i, p) in l.paint.iter().enumerate() {
        path.push(SchemaPathElem::Index(i));
        validate_rect(p.rect, path, errors);
        path.pop();
    }
    path.pop();

    if l.legacy_multiply && l.blend != BlendMode::Multiply {
        path.push(SchemaPathElem::Field("legacy_multiply"));
        errors.push(SchemaError::at(path, "legacy_multiply requires blend \"multiply\""));
        path.pop();
    }

    if let Some(mask) = &l.mask {
        validate_mask(mask, path, errors);
    }
}

fn validate_group(g: &GroupDef, path: &mut Vec<SchemaPathElem>, errors: &mut Vec<SchemaError>) {
    validate_alpha(g.alpha, path, errors);
    if let Some(mask) = &g.mask {
        validate_mask(mask, path, errors);
    }
    path.push(SchemaPathElem::Field("children"));
    validate_layers(&g.children, path, errors);
    path.pop();
}

fn validate_mask(m: &MaskDef, path: &mut Vec<SchemaPathElem>, errors: &mut Vec<SchemaError>) {
    path.push(SchemaPathElem::Field("mask"));
    if m.fill.is_some() && m.source.is_some() {
        path.push(SchemaPathElem::Field("source"));
        errors.push(SchemaError::at(path, "fill and source are mutually exclusive"));
        path.pop();
    }
    path.push(SchemaPathElem::Field("paint"));
    for (i, p) in m.paint.iter().enumerate() {
        path.push(SchemaPathElem::Index(i));
        validate_rect(p.rect, path, errors);
        path.pop();
    }
    path.pop();
    path.pop();
}

#[cfg(test)]
#[path = "../../tests/unit/scene/validate.rs"]
mod tests;
