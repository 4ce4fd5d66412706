//! A backend that draws nothing and remembers everything.
//!
//! Every canvas call becomes a [`DrawOp`] in a shared [`OpLog`]. Text is
//! measured with the same [`FontBook`] metrics the raster backend uses, so a
//! layout resolved against either backend is identical. `encode` returns the
//! log as JSON.

use super::{
    Backend, Bitmap, Canvas, EncodeOptions, ImagePlacement, OutputFormat, PixelFormat, Stroke,
    TextExtents, TextRequest,
};
use crate::error::BackendError;
use crate::font::FontBook;
use crate::geometry::{Point, Rect};
use crate::paint::RealizedPaint;
use crate::style::Align;
use serde::Serialize;
use std::cell::{Ref, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    CreateCanvas {
        width: u32,
        height: u32,
        format: PixelFormat,
    },
    SaveState,
    RestoreState,
    SetClip {
        rect: Rect,
    },
    Fill {
        paint: RealizedPaint,
    },
    Stroke {
        points: Vec<Point>,
        stroke: Stroke,
    },
    Text {
        origin: Point,
        markup: String,
        font: String,
        max_width: Option<f64>,
        align: Align,
        justify: bool,
        paint: RealizedPaint,
    },
    Image {
        width: u32,
        height: u32,
        placement: ImagePlacement,
    },
}

/// Shared handle to the recorded operations.
#[derive(Debug, Clone, Default)]
pub struct OpLog(Rc<RefCell<Vec<DrawOp>>>);

impl OpLog {
    pub fn ops(&self) -> Ref<'_, Vec<DrawOp>> {
        self.0.borrow()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    fn push(&self, op: DrawOp) {
        self.0.borrow_mut().push(op);
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    fonts: FontBook,
    log: OpLog,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fonts(fonts: FontBook) -> Self {
        Self {
            fonts,
            log: OpLog::default(),
        }
    }

    /// A handle that stays valid after the backend moves into a document.
    pub fn log(&self) -> OpLog {
        self.log.clone()
    }
}

impl Backend for RecordingBackend {
    fn create_canvas(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Box<dyn Canvas>, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidSurface { width, height });
        }
        self.log.push(DrawOp::CreateCanvas {
            width,
            height,
            format,
        });
        Ok(Box::new(RecordingCanvas {
            log: self.log.clone(),
        }))
    }

    fn measure_text(&self, request: &TextRequest<'_>) -> Result<TextExtents, BackendError> {
        Ok(self.fonts.measure(request))
    }

    fn decode_image(&self, bytes: &[u8]) -> Result<Bitmap, BackendError> {
        crate::image_loader::decode_bitmap(bytes)
    }
}

struct RecordingCanvas {
    log: OpLog,
}

impl Canvas for RecordingCanvas {
    fn save_state(&mut self) {
        self.log.push(DrawOp::SaveState);
    }

    fn restore_state(&mut self) {
        self.log.push(DrawOp::RestoreState);
    }

    fn set_clip_rect(&mut self, rect: Rect) {
        self.log.push(DrawOp::SetClip { rect });
    }

    fn fill_with(&mut self, paint: &RealizedPaint) {
        self.log.push(DrawOp::Fill {
            paint: paint.clone(),
        });
    }

    fn stroke_path(&mut self, points: &[Point], stroke: &Stroke) {
        self.log.push(DrawOp::Stroke {
            points: points.to_vec(),
            stroke: stroke.clone(),
        });
    }

    fn draw_text(
        &mut self,
        origin: Point,
        request: &TextRequest<'_>,
        paint: &RealizedPaint,
    ) -> Result<(), BackendError> {
        self.log.push(DrawOp::Text {
            origin,
            markup: request.markup.to_string(),
            font: request.font.to_string(),
            max_width: request.max_width,
            align: request.align,
            justify: request.justify,
            paint: paint.clone(),
        });
        Ok(())
    }

    fn draw_image(&mut self, image: &Bitmap, placement: &ImagePlacement) {
        self.log.push(DrawOp::Image {
            width: image.width(),
            height: image.height(),
            placement: *placement,
        });
    }

    fn encode(&self, _format: OutputFormat, _options: &EncodeOptions) -> Result<Vec<u8>, BackendError> {
        serde_json::to_vec(&*self.log.ops()).map_err(|e| BackendError::Encode(e.to_string()))
    }
}
