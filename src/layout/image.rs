//! Embedded raster images.

use super::{explicit_content, paint_frame, Boxes, Extent, Scope, ScopeKey};
use crate::backend::{Bitmap, Canvas, ImagePlacement};
use crate::error::{DynImageError, Result};
use crate::geometry::{Dimensions, Point, Rect};
use crate::image_loader::{self, ImageSource};
use crate::style::{number, BoxOptions};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    #[serde(flatten)]
    pub frame: BoxOptions,
    /// Opacity, 0 to 1. `"50%"` is accepted too.
    #[serde(deserialize_with = "deserialize_alpha")]
    pub alpha: f64,
    /// Source region `[x, y, width, height]` in image pixels.
    #[serde(deserialize_with = "deserialize_crop")]
    pub crop: Option<Rect>,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            frame: BoxOptions::default(),
            alpha: 1.0,
            crop: None,
        }
    }
}

fn deserialize_alpha<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let alpha = match &value {
        Value::String(s) if s.trim().ends_with('%') => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .ok()
            .map(|v| v / 100.0),
        other => number(other),
    };
    Ok(alpha.unwrap_or(1.0).clamp(0.0, 1.0))
}

fn deserialize_crop<'de, D>(deserializer: D) -> std::result::Result<Option<Rect>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parts: Vec<f64> = match &value {
        Value::Array(items) => items.iter().filter_map(number).collect(),
        Value::String(s) => s.split_whitespace().filter_map(|v| v.parse().ok()).collect(),
        _ => Vec::new(),
    };
    Ok(match parts[..] {
        [x, y, width, height] if width > 0.0 && height > 0.0 => {
            Some(Rect::new(x.max(0.0), y.max(0.0), width, height))
        }
        _ => None,
    })
}

#[derive(Debug, Clone)]
struct ImageLayout {
    key: ScopeKey,
    boxes: Boxes,
}

#[derive(Debug, Clone)]
pub struct Image {
    source: ImageSource,
    options: ImageOptions,
    bitmap: Option<Bitmap>,
    cache: Option<ImageLayout>,
}

impl Image {
    pub fn new(source: impl Into<ImageSource>, options: ImageOptions) -> Self {
        Self {
            source: source.into(),
            options,
            bitmap: None,
            cache: None,
        }
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn set_source(&mut self, source: impl Into<ImageSource>) {
        self.source = source.into();
        self.bitmap = None;
        self.cache = None;
    }

    pub fn options(&self) -> &ImageOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ImageOptions {
        self.cache = None;
        &mut self.options
    }

    pub fn is_dirty(&self) -> bool {
        self.cache.is_none()
    }

    /// Decode on first use; the backend owns the codec.
    fn bitmap(&mut self, scope: &Scope<'_>) -> Result<Bitmap> {
        if let Some(bitmap) = &self.bitmap {
            return Ok(bitmap.clone());
        }
        let bytes =
            image_loader::read_source(&self.source).map_err(DynImageError::UnsupportedSource)?;
        let bitmap = scope.backend.decode_image(&bytes)?;
        log::debug!("decoded image {}x{}", bitmap.width(), bitmap.height());
        self.bitmap = Some(bitmap.clone());
        Ok(bitmap)
    }

    /// Pixel size of the part of the image that is drawn.
    fn natural(&self, bitmap: &Bitmap) -> Dimensions {
        match self.options.crop {
            Some(crop) => Dimensions::new(crop.width, crop.height),
            None => Dimensions::new(bitmap.width() as f64, bitmap.height() as f64),
        }
    }

    pub fn resolve(&mut self, scope: &Scope<'_>) -> Result<Boxes> {
        let key = scope.key();
        if let Some(layout) = self.cache.as_ref().filter(|l| l.key == key) {
            return Ok(layout.boxes);
        }

        let explicit = explicit_content(&self.options.frame, scope, Extent::default())?;
        let content = match (explicit.width, explicit.height) {
            (Some(width), Some(height)) => Dimensions::new(width, height),
            (width, height) => {
                let bitmap = self.bitmap(scope)?;
                let natural = self.natural(&bitmap);
                let ratio = if natural.height > 0.0 {
                    natural.width / natural.height
                } else {
                    1.0
                };
                match (width, height) {
                    (Some(w), None) => Dimensions::new(w, if ratio > 0.0 { w / ratio } else { 0.0 }),
                    (None, Some(h)) => Dimensions::new(h * ratio, h),
                    _ => natural,
                }
            }
        };

        let boxes = Boxes::around(content, &self.options.frame);
        self.cache = Some(ImageLayout { key, boxes });
        Ok(boxes)
    }

    pub fn draw(&mut self, canvas: &mut dyn Canvas, origin: Point, scope: &Scope<'_>) -> Result<()> {
        let boxes = self.resolve(scope)?;
        let bitmap = self.bitmap(scope)?;
        paint_frame(canvas, &self.options.frame, origin, &boxes);

        let insets = self.options.frame.insets();
        let dest = Rect::from_origin(origin.offset(insets.left, insets.top), boxes.content);
        if dest.is_empty() {
            return Ok(());
        }
        canvas.draw_image(
            &bitmap,
            &ImagePlacement {
                dest,
                crop: self.options.crop,
                alpha: self.options.alpha,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, DrawOp, RecordingBackend};
    use crate::style::{Edges, Size};
    use serde_json::json;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 255, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            width,
            height,
            image::ColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn test_natural_size() {
        let backend = RecordingBackend::new();
        let mut image = Image::new(png(40, 20), ImageOptions::default());
        let boxes = image.resolve(&Scope::root(&backend)).unwrap();
        assert_eq!(boxes.content, Dimensions::new(40.0, 20.0));
    }

    #[test]
    fn test_one_axis_keeps_aspect_ratio() {
        let backend = RecordingBackend::new();
        let mut options = ImageOptions::default();
        options.frame.width = Size::Fixed(80.0);
        let mut image = Image::new(png(40, 20), options);
        let boxes = image.resolve(&Scope::root(&backend)).unwrap();
        assert_eq!(boxes.content, Dimensions::new(80.0, 40.0));
    }

    #[test]
    fn test_crop_sets_natural_size() {
        let backend = RecordingBackend::new();
        let options: ImageOptions = serde_json::from_value(json!({"crop": [4, 4, 10, 5]})).unwrap();
        let mut image = Image::new(png(40, 20), options);
        let boxes = image.resolve(&Scope::root(&backend)).unwrap();
        assert_eq!(boxes.content, Dimensions::new(10.0, 5.0));
    }

    #[test]
    fn test_unreadable_source() {
        let backend = RecordingBackend::new();
        let mut image = Image::new("./no/such/image.png", ImageOptions::default());
        let err = image.resolve(&Scope::root(&backend)).unwrap_err();
        assert!(matches!(err, DynImageError::UnsupportedSource(_)));
    }

    #[test]
    fn test_explicit_size_skips_decoding() {
        let backend = RecordingBackend::new();
        let mut options = ImageOptions::default();
        options.frame.width = Size::Fixed(10.0);
        options.frame.height = Size::Fixed(10.0);
        let mut image = Image::new("./no/such/image.png", options);
        assert!(image.resolve(&Scope::root(&backend)).is_ok());
    }

    #[test]
    fn test_draw_places_image_in_content_box() {
        let backend = RecordingBackend::new();
        let log = backend.log();
        let mut canvas = backend.create_canvas(100, 100, Default::default()).unwrap();
        let mut options: ImageOptions = serde_json::from_value(json!({"alpha": "50%"})).unwrap();
        options.frame.padding = Edges::uniform(5.0);
        let mut image = Image::new(png(8, 8), options);
        let scope = Scope::root(&backend);
        image.draw(canvas.as_mut(), Point::new(10.0, 10.0), &scope).unwrap();

        let ops = log.ops();
        match ops.last() {
            Some(DrawOp::Image {
                width,
                height,
                placement,
            }) => {
                assert_eq!((*width, *height), (8, 8));
                assert_eq!(placement.dest, Rect::new(15.0, 15.0, 8.0, 8.0));
                assert_eq!(placement.alpha, 0.5);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_alpha_and_crop_are_lenient() {
        let options: ImageOptions =
            serde_json::from_value(json!({"alpha": 3, "crop": [1, 2]})).unwrap();
        assert_eq!(options.alpha, 1.0);
        assert_eq!(options.crop, None);
    }
}
