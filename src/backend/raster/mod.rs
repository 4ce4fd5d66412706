//! # Raster Backend
//!
//! Draws onto a tiny-skia [`Pixmap`]. Clips are rectangle masks, strokes go
//! through tiny-skia's stroker and dasher, and text is filled from the glyph
//! outlines of registered fonts. PNG and JPEG encoding go through the
//! `image` crate.

pub mod glyph;
pub mod shader;

use super::{
    Backend, Bitmap, Canvas, EncodeOptions, ImagePlacement, OutputFormat, PixelFormat, Stroke,
    TextExtents, TextRequest,
};
use crate::error::BackendError;
use crate::font::FontBook;
use crate::geometry::{Point, Rect};
use crate::paint::RealizedPaint;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use std::borrow::Cow;
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, LineCap, Mask, Paint, Path, PathBuilder, Pattern, Pixmap,
    SpreadMode, StrokeDash, Transform,
};

/// Surfaces larger than this on either side are refused.
const MAX_SURFACE_SIDE: u32 = 1 << 15;

#[derive(Debug, Clone, Default)]
pub struct RasterBackend {
    fonts: Arc<FontBook>,
}

impl RasterBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fonts(fonts: FontBook) -> Self {
        Self {
            fonts: Arc::new(fonts),
        }
    }

    /// Register a TTF/OTF face for a family. Canvases created afterwards can
    /// draw it.
    pub fn register_font(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        data: Vec<u8>,
    ) -> Result<(), BackendError> {
        Arc::make_mut(&mut self.fonts).register(family, bold, italic, data)
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }
}

impl Backend for RasterBackend {
    fn create_canvas(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Box<dyn Canvas>, BackendError> {
        if width == 0 || height == 0 || width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
            return Err(BackendError::InvalidSurface { width, height });
        }
        log::debug!("creating {}x{} {:?} surface", width, height, format);
        let canvas = RasterCanvas::new(width, height, format, Arc::clone(&self.fonts))
            .ok_or(BackendError::InvalidSurface { width, height })?;
        Ok(Box::new(canvas))
    }

    fn measure_text(&self, request: &TextRequest<'_>) -> Result<TextExtents, BackendError> {
        Ok(self.fonts.measure(request))
    }

    fn decode_image(&self, bytes: &[u8]) -> Result<Bitmap, BackendError> {
        crate::image_loader::decode_bitmap(bytes)
    }
}

pub struct RasterCanvas {
    pixmap: Pixmap,
    format: PixelFormat,
    clip: Rect,
    mask: Option<Mask>,
    saved: Vec<(Rect, Option<Mask>)>,
    fonts: Arc<FontBook>,
}

impl RasterCanvas {
    /// `None` when tiny-skia cannot allocate the surface.
    pub fn new(width: u32, height: u32, format: PixelFormat, fonts: Arc<FontBook>) -> Option<Self> {
        let mut pixmap = Pixmap::new(width, height)?;
        if format == PixelFormat::Rgb24 {
            pixmap.fill(tiny_skia::Color::BLACK);
        }
        Some(Self {
            pixmap,
            format,
            clip: Rect::new(0.0, 0.0, width as f64, height as f64),
            mask: None,
            saved: Vec::new(),
            fonts,
        })
    }

    fn surface(&self) -> Rect {
        Rect::new(0.0, 0.0, self.pixmap.width() as f64, self.pixmap.height() as f64)
    }

    /// Straight-alpha copy of the surface.
    pub fn to_rgba(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.pixmap.width(), self.pixmap.height());
        for (dst, src) in out.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }

    fn rebuild_mask(&mut self) {
        if self.clip == self.surface() {
            self.mask = None;
            return;
        }
        let mask = Mask::new(self.pixmap.width(), self.pixmap.height());
        self.mask = mask.map(|mut mask| {
            if let Some(path) = rect_path(self.clip) {
                mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
            }
            mask
        });
    }

    fn fill(&mut self, path: &Path, paint: &RealizedPaint) {
        let Some(sk_paint) = shader::to_paint(paint) else {
            return;
        };
        let mask = draw_mask(self.mask.as_ref(), paint, self.surface());
        self.pixmap.fill_path(
            path,
            &sk_paint,
            FillRule::Winding,
            Transform::identity(),
            mask.as_deref(),
        );
    }
}

/// The mask to draw `paint` through: the clip, narrowed to the band a
/// linear pad gradient covers.
fn draw_mask<'a>(
    clip: Option<&'a Mask>,
    paint: &RealizedPaint,
    surface: Rect,
) -> Option<Cow<'a, Mask>> {
    let Some(band) = shader::pad_band(paint, surface) else {
        return clip.map(Cow::Borrowed);
    };
    let mut mask = Mask::new(surface.width as u32, surface.height as u32)?;
    mask.fill_path(&band, FillRule::Winding, true, Transform::identity());
    if let Some(clip) = clip {
        for (m, c) in mask.data_mut().iter_mut().zip(clip.data()) {
            *m = ((*m as u16 * *c as u16 + 127) / 255) as u8;
        }
    }
    Some(Cow::Owned(mask))
}

fn rect_path(rect: Rect) -> Option<Path> {
    if rect.is_empty() {
        return None;
    }
    tiny_skia::Rect::from_xywh(
        rect.x as f32,
        rect.y as f32,
        rect.width as f32,
        rect.height as f32,
    )
    .map(PathBuilder::from_rect)
}

/// tiny-skia dash arrays need an even number of entries.
fn dash(pattern: &[f64]) -> Option<StrokeDash> {
    if pattern.is_empty() {
        return None;
    }
    let mut array: Vec<f32> = pattern.iter().map(|&v| v.max(0.0) as f32).collect();
    if array.len() % 2 == 1 {
        array.extend_from_within(..);
    }
    StrokeDash::new(array, 0.0)
}

fn bitmap_pixmap(image: &Bitmap) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels().pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

impl Canvas for RasterCanvas {
    fn save_state(&mut self) {
        self.saved.push((self.clip, self.mask.clone()));
    }

    fn restore_state(&mut self) {
        match self.saved.pop() {
            Some((clip, mask)) => {
                self.clip = clip;
                self.mask = mask;
            }
            None => log::warn!("restore_state without a matching save_state"),
        }
    }

    fn set_clip_rect(&mut self, rect: Rect) {
        self.clip = self.clip.intersect(&rect);
        self.rebuild_mask();
    }

    fn fill_with(&mut self, paint: &RealizedPaint) {
        if let Some(path) = rect_path(self.clip) {
            self.fill(&path, paint);
        }
    }

    fn stroke_path(&mut self, points: &[Point], stroke: &Stroke) {
        if stroke.width <= 0.0 || points.len() < 2 {
            return;
        }
        let mut pb = PathBuilder::new();
        pb.move_to(points[0].x as f32, points[0].y as f32);
        for p in &points[1..] {
            pb.line_to(p.x as f32, p.y as f32);
        }
        let Some(path) = pb.finish() else {
            return;
        };
        let Some(paint) = shader::to_paint(&stroke.paint) else {
            return;
        };

        let sk_stroke = tiny_skia::Stroke {
            width: stroke.width as f32,
            line_cap: LineCap::Butt,
            dash: dash(&stroke.dash),
            ..Default::default()
        };
        let mask = draw_mask(self.mask.as_ref(), &stroke.paint, self.surface());
        self.pixmap.stroke_path(
            &path,
            &paint,
            &sk_stroke,
            Transform::identity(),
            mask.as_deref(),
        );
    }

    fn draw_text(
        &mut self,
        origin: Point,
        request: &TextRequest<'_>,
        paint: &RealizedPaint,
    ) -> Result<(), BackendError> {
        let fonts = Arc::clone(&self.fonts);
        let Some(face) = fonts.resolve(request.font) else {
            log::warn!("no font registered for '{}', text is not drawn", request.font);
            return Ok(());
        };
        let parsed = face
            .parse()
            .ok_or_else(|| BackendError::Font(format!("cannot parse face for '{}'", request.font)))?;

        let lines = fonts.layout(request);
        let line_height = fonts.line_height(request.font);
        let ascent = fonts.ascent(request.font);
        let box_width = request
            .max_width
            .unwrap_or_else(|| lines.iter().map(|l| l.width).fold(0.0, f64::max));
        let scale = (request.font.size / parsed.units_per_em() as f64) as f32;

        let mut pb = PathBuilder::new();
        for (i, line) in lines.iter().enumerate() {
            let baseline = origin.y + i as f64 * (line_height + request.spacing) + ascent;
            let is_last = i + 1 == lines.len();
            let gaps = line.text.trim_end().matches(' ').count();
            let stretch = if request.justify && !is_last && gaps > 0 {
                (box_width - line.width).max(0.0) / gaps as f64
            } else {
                0.0
            };
            let shift = if stretch > 0.0 {
                0.0
            } else {
                request.align.offset(box_width, line.width)
            };

            let mut pen = origin.x + shift + line.indent;
            for (ch, advance) in line.text.chars().zip(&line.advances) {
                if let Some(id) = parsed.glyph_index(ch) {
                    let transform = glyph::glyph_transform(scale, pen as f32, baseline as f32);
                    if let Some(path) = glyph::glyph_path(&parsed, id, transform) {
                        pb.push_path(&path);
                    }
                }
                pen += advance;
                if ch == ' ' {
                    pen += stretch;
                }
            }
        }

        if let Some(path) = pb.finish() {
            self.fill(&path, paint);
        }
        Ok(())
    }

    fn draw_image(&mut self, image: &Bitmap, placement: &ImagePlacement) {
        let dest = placement.dest;
        if dest.is_empty() || placement.alpha <= 0.0 {
            return;
        }
        let full = Rect::new(0.0, 0.0, image.width() as f64, image.height() as f64);
        let crop = placement.crop.map(|c| c.intersect(&full)).unwrap_or(full);
        if crop.is_empty() {
            return;
        }
        let (Some(source), Some(path)) = (bitmap_pixmap(image), rect_path(dest)) else {
            return;
        };

        let sx = dest.width / crop.width;
        let sy = dest.height / crop.height;
        let transform = Transform::from_row(
            sx as f32,
            0.0,
            0.0,
            sy as f32,
            (dest.x - crop.x * sx) as f32,
            (dest.y - crop.y * sy) as f32,
        );
        let mut paint = Paint::default();
        paint.shader = Pattern::new(
            source.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Nearest,
            placement.alpha.clamp(0.0, 1.0) as f32,
            transform,
        );
        self.pixmap.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            self.mask.as_ref(),
        );
    }

    fn encode(&self, format: OutputFormat, options: &EncodeOptions) -> Result<Vec<u8>, BackendError> {
        let rgba = DynamicImage::ImageRgba8(self.to_rgba());
        let (image, output) = match format {
            OutputFormat::Png => match self.format {
                PixelFormat::Argb32 => (rgba, ImageOutputFormat::Png),
                PixelFormat::Rgb24 => (DynamicImage::ImageRgb8(rgba.to_rgb8()), ImageOutputFormat::Png),
            },
            OutputFormat::Jpeg => (
                DynamicImage::ImageRgb8(rgba.to_rgb8()),
                ImageOutputFormat::Jpeg(options.quality.clamp(1, 100)),
            ),
        };

        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), output)?;
        log::debug!("encoded {} ({} bytes)", format, buf.len());
        Ok(buf)
    }
}
