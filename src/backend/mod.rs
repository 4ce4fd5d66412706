//! # Backend Contract
//!
//! Everything that touches pixels, glyphs or codecs goes through these two
//! traits. A [`Backend`] measures text, decodes images and creates canvases;
//! a [`Canvas`] is one drawing surface with its graphics state.
//!
//! Two implementations ship with the crate:
//! - [`RasterBackend`]: anti-aliased tiny-skia rasterizer, encodes PNG
//!   and JPEG.
//! - [`RecordingBackend`]: records every call as a [`DrawOp`]; deterministic
//!   metrics, handy for tests and for inspecting layouts.

pub mod raster;
pub mod recording;

pub use raster::RasterBackend;
pub use recording::{DrawOp, OpLog, RecordingBackend};

use crate::error::BackendError;
use crate::geometry::{Point, Rect};
use crate::paint::RealizedPaint;
use crate::style::Align;
use crate::text::FontSpec;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub trait Backend {
    fn create_canvas(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Box<dyn Canvas>, BackendError>;

    fn measure_text(&self, request: &TextRequest<'_>) -> Result<TextExtents, BackendError>;

    fn decode_image(&self, bytes: &[u8]) -> Result<Bitmap, BackendError>;
}

pub trait Canvas {
    fn save_state(&mut self);

    fn restore_state(&mut self);

    /// Intersect the current clip with `rect`.
    fn set_clip_rect(&mut self, rect: Rect);

    /// Fill the whole current clip.
    fn fill_with(&mut self, paint: &RealizedPaint);

    fn stroke_path(&mut self, points: &[Point], stroke: &Stroke);

    /// Draw text with its top-left corner at `origin`.
    fn draw_text(
        &mut self,
        origin: Point,
        request: &TextRequest<'_>,
        paint: &RealizedPaint,
    ) -> Result<(), BackendError>;

    fn draw_image(&mut self, image: &Bitmap, placement: &ImagePlacement);

    fn encode(&self, format: OutputFormat, options: &EncodeOptions)
        -> Result<Vec<u8>, BackendError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Straight RGBA, starts fully transparent.
    #[default]
    Argb32,
    /// Opaque RGB, starts black.
    Rgb24,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
}

impl OutputFormat {
    /// Guess from a file extension.
    pub fn from_path(path: &Path) -> Option<OutputFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Png => write!(f, "png"),
            OutputFormat::Jpeg => write!(f, "jpeg"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// JPEG quality, 1-100.
    pub quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub width: f64,
    /// Alternating on/off lengths. Empty is a solid line.
    pub dash: Vec<f64>,
    pub paint: RealizedPaint,
}

/// A paragraph of marked-up text and how to lay it out.
#[derive(Debug, Clone, Copy)]
pub struct TextRequest<'a> {
    pub font: &'a FontSpec,
    pub markup: &'a str,
    /// Wrap width; `None` lays out on unbounded lines.
    pub max_width: Option<f64>,
    pub align: Align,
    pub justify: bool,
    /// First-line indent.
    pub indent: f64,
    /// Extra space between lines.
    pub spacing: f64,
    pub auto_dir: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TextExtents {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

/// Decoded RGBA pixels, cheap to clone.
#[derive(Clone)]
pub struct Bitmap(Arc<RgbaImage>);

impl Bitmap {
    pub fn new(pixels: RgbaImage) -> Self {
        Self(Arc::new(pixels))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.0
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitmap({}x{})", self.width(), self.height())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImagePlacement {
    pub dest: Rect,
    /// Source region in image pixels; the whole image when `None`.
    pub crop: Option<Rect>,
    pub alpha: f64,
}
