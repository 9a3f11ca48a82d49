use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::blend::dispatch::fuse_image_onto_image_at;
use crate::blend::kernel::upgrade_multiply_layer;
use crate::blend::mode::BlendMode;
use crate::buffer::color::ColorBuffer;
use crate::buffer::mask::MaskBuffer;
use crate::document::Document;
use crate::document::layer::{ImageLayer, Layer, LayerGroup, LayerIdAllocator};
use crate::foundation::core::{Canvas, PixelRect};
use crate::foundation::error::{FuseError, FuseResult};
use crate::scene::model::{GroupDef, ImageLayerDef, LayerDef, MaskDef, SceneDef};
use crate::scene::validate::validate_scene;

/// JSON scene boundary object.
///
/// This is the human-edited description of a layer stack. It is validated and turned into a
/// [`Document`] with [`Scene::to_document`]; relative `source` paths resolve against the
/// directory of the scene file.
#[derive(Debug, Clone)]
pub struct Scene {
    def: SceneDef,
    base_dir: PathBuf,
}

impl Scene {
    /// Parse a scene from a JSON reader. Relative sources resolve against the working directory.
    pub fn from_reader<R: std::io::Read>(r: R) -> FuseResult<Self> {
        let def: SceneDef = serde_json::from_reader(r)
            .map_err(|e| FuseError::serde(format!("parse scene JSON: {e}")))?;
        Ok(Self {
            def,
            base_dir: PathBuf::from("."),
        })
    }

    /// Parse a scene from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FuseResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FuseError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        let mut scene = Self::from_reader(BufReader::new(f))?;
        if let Some(dir) = path.parent() {
            scene.base_dir = dir.to_path_buf();
        }
        Ok(scene)
    }

    /// Resolve relative sources against `dir` instead.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Check the scene for structural problems, reporting all of them with their JSON paths.
    pub fn validate(&self) -> FuseResult<()> {
        validate_scene(&self.def)
            .map_err(|e| FuseError::scene(format!("scene validation failed: {e}")))
    }

    /// Canvas dimensions.
    pub fn canvas(&self) -> FuseResult<Canvas> {
        Canvas::new(self.def.canvas.width, self.def.canvas.height)
    }

    /// Validate, decode every source image and build the layer document.
    ///
    /// Layer ids are assigned in document order starting after the root group, which gets `#0`.
    #[tracing::instrument(skip(self), fields(base_dir = %self.base_dir.display()))]
    pub fn to_document(&self) -> FuseResult<Document> {
        self.validate()?;
        let canvas = self.canvas()?;
        let mut ids = LayerIdAllocator::new();
        let mut root = LayerGroup::new(ids.alloc()).with_name("root");
        for def in &self.def.layers {
            root.push(self.build_layer(def, canvas, &mut ids)?);
        }
        let doc = Document::new(canvas, root)?;
        tracing::debug!(
            width = canvas.width,
            height = canvas.height,
            layers = self.def.layers.len(),
            "scene loaded"
        );
        Ok(doc)
    }

    fn build_layer(
        &self,
        def: &LayerDef,
        canvas: Canvas,
        ids: &mut LayerIdAllocator,
    ) -> FuseResult<Layer> {
        match def {
            LayerDef::Image(l) => self.build_image(l, canvas, ids).map(Layer::from),
            LayerDef::Group(g) => self.build_group(g, canvas, ids).map(Layer::from),
        }
    }

    fn build_image(
        &self,
        def: &ImageLayerDef,
        canvas: Canvas,
        ids: &mut LayerIdAllocator,
    ) -> FuseResult<ImageLayer> {
        let mut layer = ImageLayer::new(ids.alloc(), canvas.width, canvas.height)
            .with_name(def.name.clone())
            .with_alpha(def.alpha)
            .with_blend_mode(def.blend)
            .with_visible(def.visible)
            .with_clip(def.clip);

        if let Some(fill) = def.fill {
            layer = layer.with_fill(fill.0);
        }
        if let Some(src) = &def.source {
            let img = self.decode_rgba(src)?;
            let bounds = img.bounds();
            fuse_image_onto_image_at(&mut layer.image, &img, 100, bounds, 0, 0);
        }
        for p in &def.paint {
            layer
                .image
                .fill_rect(PixelRect::from_kurbo_outset(p.rect), p.color.0);
        }
        if let Some(mask) = &def.mask {
            layer.mask = Some(self.build_mask(mask, canvas)?);
        }

        if def.legacy_multiply {
            upgrade_multiply_layer(&mut layer.image, layer.alpha, layer.mask.as_ref());
            layer.blend_mode = BlendMode::Multiply2;
            tracing::debug!(layer = %layer.id, "legacy multiply layer upgraded");
        }
        Ok(layer)
    }

    fn build_group(
        &self,
        def: &GroupDef,
        canvas: Canvas,
        ids: &mut LayerIdAllocator,
    ) -> FuseResult<LayerGroup> {
        let mut group = LayerGroup::new(ids.alloc())
            .with_name(def.name.clone())
            .with_alpha(def.alpha)
            .with_blend_mode(def.blend)
            .with_visible(def.visible);
        if let Some(mask) = &def.mask {
            group.mask = Some(self.build_mask(mask, canvas)?);
        }
        for child in &def.children {
            group.push(self.build_layer(child, canvas, ids)?);
        }
        Ok(group)
    }

    fn build_mask(&self, def: &MaskDef, canvas: Canvas) -> FuseResult<MaskBuffer> {
        let mut mask = MaskBuffer::filled(canvas.width, canvas.height, def.fill.unwrap_or(255));
        if let Some(src) = &def.source {
            let grey = self.decode_luma(src)?;
            let rows = grey.height().min(mask.height()) as usize;
            let cols = grey.width().min(mask.width()) as usize;
            for y in 0..rows {
                let s = grey.offset_of_pixel(0, y as i32);
                let d = mask.offset_of_pixel(0, y as i32);
                mask.data_mut()[d..d + cols].copy_from_slice(&grey.data()[s..s + cols]);
            }
        }
        for p in &def.paint {
            mask.fill_rect(PixelRect::from_kurbo_outset(p.rect), p.value);
        }
        Ok(mask)
    }

    fn resolve(&self, src: &str) -> PathBuf {
        let p = Path::new(src);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    fn decode_rgba(&self, src: &str) -> FuseResult<ColorBuffer> {
        let path = self.resolve(src);
        let img = image::open(&path)
            .with_context(|| format!("decode layer source '{}'", path.display()))?;
        Ok(ColorBuffer::from_rgba_image(img.to_rgba8()))
    }

    fn decode_luma(&self, src: &str) -> FuseResult<MaskBuffer> {
        let path = self.resolve(src);
        let img = image::open(&path)
            .with_context(|| format!("decode mask source '{}'", path.display()))?;
        Ok(MaskBuffer::from_luma_image(img.to_luma8()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/composition.rs"]
mod tests;
