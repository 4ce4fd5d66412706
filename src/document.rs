//! # Document
//!
//! The root of an image: a top-level block, the pixel format of the surface
//! and the backend that measures, draws and encodes. Nothing is resolved
//! until the document is rendered; rendering again after a mutation only
//! re-resolves the parts of the tree that changed.

use crate::backend::{
    Backend, Bitmap, Canvas, EncodeOptions, ImagePlacement, OutputFormat, PixelFormat,
};
use crate::error::{BackendError, ConfigError, DynImageError, Result};
use crate::geometry::{Axis, Dimensions, Point, Rect};
use crate::image_loader::{self, ImageSource};
use crate::layout::{Block, ImageOptions, Scope, Table, TableOptions};
use crate::style::{BoxOptions, Size};
use crate::text::TextOptions;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    #[serde(flatten)]
    pub frame: BoxOptions,
    #[serde(deserialize_with = "crate::style::lenient")]
    pub pixel_format: PixelFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SaveOptions {
    /// Taken from the file extension when unset.
    pub format: Option<OutputFormat>,
    /// JPEG quality, 1-100.
    pub quality: Option<u8>,
}

impl SaveOptions {
    fn encode_options(&self) -> EncodeOptions {
        let mut options = EncodeOptions::default();
        if let Some(quality) = self.quality {
            options.quality = quality.clamp(1, 100);
        }
        options
    }
}

pub struct Document {
    root: Block,
    pixel_format: PixelFormat,
    backend: Box<dyn Backend>,
    /// Drawn under the tree, see [`Document::from_image`].
    base: Option<Bitmap>,
}

impl Document {
    pub fn new(options: DocumentOptions, backend: impl Backend + 'static) -> Self {
        Self {
            root: Block::new(options.frame),
            pixel_format: options.pixel_format,
            backend: Box::new(backend),
            base: None,
        }
    }

    /// Start from an existing image. Its size fills in whatever the options
    /// leave unset, and it is drawn before anything else.
    pub fn from_image(
        source: impl Into<ImageSource>,
        mut options: DocumentOptions,
        backend: impl Backend + 'static,
    ) -> Result<Self> {
        let bytes = image_loader::read_source(&source.into())
            .map_err(DynImageError::UnsupportedSource)?;
        let base = backend.decode_image(&bytes)?;
        if options.frame.width == Size::Auto {
            options.frame.width = Size::Fixed(base.width() as f64);
        }
        if options.frame.height == Size::Auto {
            options.frame.height = Size::Fixed(base.height() as f64);
        }
        let mut document = Document::new(options, backend);
        document.base = Some(base);
        Ok(document)
    }

    pub fn block(&mut self, options: BoxOptions, build: impl FnOnce(&mut Block)) -> &mut Self {
        self.root.block(options, build);
        self
    }

    pub fn text(&mut self, content: impl Into<String>, options: TextOptions) -> &mut Self {
        self.root.text(content, options);
        self
    }

    pub fn image(&mut self, source: impl Into<ImageSource>, options: ImageOptions) -> &mut Self {
        self.root.image(source, options);
        self
    }

    pub fn table(&mut self, options: TableOptions, build: impl FnOnce(&mut Table)) -> &mut Self {
        self.root.table(options, build);
        self
    }

    pub fn root(&self) -> &Block {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Block {
        &mut self.root
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// The size of the image in pixels.
    pub fn resolve_size(&mut self) -> Result<Dimensions> {
        for axis in [Axis::Horizontal, Axis::Vertical] {
            if let Size::Percent(_) = self.root.options().size(axis) {
                return Err(ConfigError::UndecidableSize {
                    width: 0.0,
                    height: 0.0,
                }
                .into());
            }
        }
        let scope = Scope::root(self.backend.as_ref());
        let outer = self.root.resolve(&scope)?.outer;
        if outer.width < 1.0 || outer.height < 1.0 {
            return Err(ConfigError::UndecidableSize {
                width: outer.width,
                height: outer.height,
            }
            .into());
        }
        Ok(outer)
    }

    /// Resolve and draw the whole tree onto a fresh surface.
    pub fn render(&mut self) -> Result<Box<dyn Canvas>> {
        let size = self.resolve_size()?;
        let width = size.width.ceil() as u32;
        let height = size.height.ceil() as u32;
        log::debug!("rendering {}x{} image", width, height);

        let mut canvas = self
            .backend
            .create_canvas(width, height, self.pixel_format)?;
        if let Some(base) = &self.base {
            let dest = Rect::new(0.0, 0.0, base.width() as f64, base.height() as f64);
            canvas.draw_image(
                base,
                &ImagePlacement {
                    dest,
                    crop: None,
                    alpha: 1.0,
                },
            );
        }

        let scope = Scope::root(self.backend.as_ref());
        self.root
            .draw(canvas.as_mut(), Point::new(0.0, 0.0), &scope)?;
        Ok(canvas)
    }

    /// Render and encode. PNG unless `options` ask otherwise.
    pub fn encode(&mut self, options: &SaveOptions) -> Result<Vec<u8>> {
        let format = options.format.unwrap_or_default();
        let canvas = self.render()?;
        Ok(canvas.encode(format, &options.encode_options())?)
    }

    /// Render, encode and write to `path`. The format comes from `options`,
    /// else from the file extension.
    pub fn save(&mut self, path: impl AsRef<Path>, options: &SaveOptions) -> Result<()> {
        let path = path.as_ref();
        let format = match options.format.or_else(|| OutputFormat::from_path(path)) {
            Some(format) => format,
            None => {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default();
                return Err(BackendError::UnsupportedFormat(format!("'{}'", ext)).into());
            }
        };
        let bytes = self.encode(&SaveOptions {
            format: Some(format),
            quality: options.quality,
        })?;
        std::fs::write(path, bytes)?;
        log::debug!("saved {} as {}", path.display(), format);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DrawOp, RasterBackend, RecordingBackend};
    use crate::paint::{Color, PaintSource};

    fn sized(width: f64, height: f64) -> DocumentOptions {
        DocumentOptions {
            frame: BoxOptions {
                width: Size::Fixed(width),
                height: Size::Fixed(height),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_auto_document_is_undecidable() {
        let mut doc = Document::new(DocumentOptions::default(), RecordingBackend::new());
        let err = doc.resolve_size().unwrap_err();
        assert!(matches!(
            err,
            DynImageError::Config(ConfigError::UndecidableSize { .. })
        ));
    }

    #[test]
    fn test_percentage_root_is_undecidable() {
        let mut options = sized(10.0, 10.0);
        options.frame.width = Size::Percent(0.5);
        let mut doc = Document::new(options, RecordingBackend::new());
        assert!(matches!(
            doc.resolve_size(),
            Err(DynImageError::Config(ConfigError::UndecidableSize { .. }))
        ));
    }

    #[test]
    fn test_auto_document_wraps_content() {
        let mut doc = Document::new(DocumentOptions::default(), RecordingBackend::new());
        doc.block(
            BoxOptions {
                width: Size::Fixed(30.0),
                height: Size::Fixed(20.0),
                margin: crate::style::Edges::uniform(5.0),
                ..Default::default()
            },
            |_| {},
        );
        assert_eq!(doc.resolve_size().unwrap(), Dimensions::new(40.0, 30.0));
    }

    #[test]
    fn test_render_records_surface_then_tree() {
        let backend = RecordingBackend::new();
        let log = backend.log();
        let mut options = sized(20.0, 10.0);
        options.frame.background = Some(PaintSource::from(Color::WHITE));
        let mut doc = Document::new(options, backend);
        doc.text("hi", TextOptions::default());
        doc.render().unwrap();

        let ops = log.ops();
        assert_eq!(
            ops[0],
            DrawOp::CreateCanvas {
                width: 20,
                height: 10,
                format: PixelFormat::Argb32
            }
        );
        assert!(matches!(ops.last(), Some(DrawOp::Text { .. })));
    }

    #[test]
    fn test_save_png_with_raster_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let mut options = sized(4.0, 3.0);
        options.frame.background = Some(PaintSource::from(Color::WHITE));
        let mut doc = Document::new(options, RasterBackend::new());
        doc.save(&path, &SaveOptions::default()).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(2, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_save_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new(sized(4.0, 4.0), RecordingBackend::new());
        let err = doc
            .save(dir.path().join("out.gif"), &SaveOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DynImageError::Backend(BackendError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_from_image_takes_its_size() {
        let img = image::RgbaImage::from_pixel(6, 5, image::Rgba([9, 9, 9, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 6, 5, image::ColorType::Rgba8)
            .unwrap();

        let backend = RecordingBackend::new();
        let log = backend.log();
        let mut doc = Document::from_image(buf, DocumentOptions::default(), backend).unwrap();
        assert_eq!(doc.resolve_size().unwrap(), Dimensions::new(6.0, 5.0));
        doc.render().unwrap();
        assert!(matches!(
            log.ops()[1],
            DrawOp::Image {
                width: 6,
                height: 5,
                ..
            }
        ));
    }
}
