//! # Text
//!
//! A run of marked-up text laid out by the backend. Text wraps to its
//! explicit width, or else to the width its parent leaves it, and can be
//! cropped or shrunk to fit (see [`fit`]).
//!
//! Alignment comes from the text's own `align`, else the nearest ancestor
//! that sets one. Left-aligned text is only as wide as its longest line;
//! centred and right-aligned text takes the full wrap width so the lines
//! have room to move.

pub mod fit;
pub mod font;

pub use fit::{CropTo, CropUnit, FitStage, FitState, Limits, FIT_TOLERANCE};
pub use font::{FontSpec, FontStyle, FontWeight};

use crate::backend::{Canvas, TextRequest};
use crate::error::Result;
use crate::geometry::{Axis, Dimensions, Point, Rect};
use crate::layout::{paint_frame, Boxes, Scope, ScopeKey};
use crate::paint::{self, Color, PaintSource, RealizedPaint};
use crate::style::{lenient_bool, lenient_f64, Align, BoxOptions};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    #[serde(flatten)]
    pub frame: BoxOptions,
    pub font: Option<FontSpec>,
    #[serde(deserialize_with = "paint::deserialize_lenient")]
    pub color: Option<PaintSource>,
    #[serde(deserialize_with = "lenient_bool")]
    pub justify: bool,
    /// First-line indent in pixels.
    #[serde(deserialize_with = "lenient_f64")]
    pub indent: Option<f64>,
    /// Extra space between lines in pixels.
    #[serde(deserialize_with = "lenient_f64")]
    pub spacing: Option<f64>,
    #[serde(deserialize_with = "lenient_bool")]
    pub auto_dir: bool,
    #[serde(deserialize_with = "fit::deserialize_crop_to")]
    pub crop_to: Option<CropTo>,
    pub crop_suffix: String,
    #[serde(deserialize_with = "fit::deserialize_stages")]
    pub to_fit: Vec<FitStage>,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            frame: BoxOptions::default(),
            font: None,
            color: None,
            justify: false,
            indent: None,
            spacing: None,
            auto_dir: false,
            crop_to: None,
            crop_suffix: "...".to_string(),
            to_fit: Vec::new(),
        }
    }
}

impl TextOptions {
    pub fn with_font(description: &str) -> Self {
        Self {
            font: Some(FontSpec::parse(description)),
            ..Self::default()
        }
    }

    fn request<'a>(
        &self,
        font: &'a FontSpec,
        markup: &'a str,
        max_width: Option<f64>,
        align: Align,
    ) -> TextRequest<'a> {
        TextRequest {
            font,
            markup,
            max_width,
            align,
            justify: self.justify,
            indent: self.indent.unwrap_or(0.0),
            spacing: self.spacing.unwrap_or(0.0),
            auto_dir: self.auto_dir,
        }
    }
}

#[derive(Debug, Clone)]
struct TextLayout {
    key: ScopeKey,
    boxes: Boxes,
    markup: String,
    font: FontSpec,
    wrap_width: Option<f64>,
    align: Align,
}

#[derive(Debug, Clone)]
pub struct Text {
    content: String,
    options: TextOptions,
    cache: Option<TextLayout>,
}

impl Text {
    pub fn new(content: impl Into<String>, options: TextOptions) -> Self {
        Self {
            content: content.into(),
            options,
            cache: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.cache = None;
    }

    pub fn options(&self) -> &TextOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut TextOptions {
        self.cache = None;
        &mut self.options
    }

    /// Markup and font after fitting, once resolved.
    pub fn fitted(&self) -> Option<(&str, &FontSpec)> {
        self.cache.as_ref().map(|l| (l.markup.as_str(), &l.font))
    }

    pub fn is_dirty(&self) -> bool {
        self.cache.is_none()
    }

    pub fn resolve(&mut self, scope: &Scope<'_>) -> Result<Boxes> {
        Ok(self.layout(scope)?.boxes)
    }

    fn layout(&mut self, scope: &Scope<'_>) -> Result<&TextLayout> {
        let key = scope.key();
        let layout = match self.cache.take() {
            Some(layout) if layout.key == key => layout,
            _ => self.compute(scope)?,
        };
        Ok(self.cache.insert(layout))
    }

    fn compute(&self, scope: &Scope<'_>) -> Result<TextLayout> {
        let frame = &self.options.frame;
        let insets = frame.insets();
        let explicit_width = frame.width.resolve(scope.parent.width, Axis::Horizontal, scope.strict)?;
        let explicit_height = frame.height.resolve(scope.parent.height, Axis::Vertical, scope.strict)?;

        let wrap_width = explicit_width.or_else(|| {
            scope
                .parent
                .width
                .map(|w| (w - insets.horizontal()).max(0.0))
        });
        let limits = Limits {
            width: wrap_width,
            height: explicit_height.or_else(|| {
                scope
                    .parent
                    .height
                    .map(|h| (h - insets.vertical()).max(0.0))
            }),
        };
        let align = frame.align.or(scope.align).unwrap_or_default();
        let base_font = self.options.font.clone().unwrap_or_default();
        let suffix = self.options.crop_suffix.as_str();

        let mut measure = |markup: &str, size: f64| -> Result<crate::backend::TextExtents> {
            let font = base_font.with_size(size);
            let request = self.options.request(&font, markup, wrap_width, align);
            Ok(scope.backend.measure_text(&request)?)
        };

        let mut state = FitState::new(&self.content, base_font.size);
        if let Some(crop) = &self.options.crop_to {
            state.crop_to(crop, suffix, &mut measure)?;
        }
        if !self.options.to_fit.is_empty() {
            state.to_fit(&self.options.to_fit, &limits, suffix, &mut measure)?;
        }

        let markup = state.markup(suffix);
        let extents = measure(&markup, state.size)?;
        let width = explicit_width.unwrap_or(match wrap_width {
            Some(w) if align != Align::Left => w,
            _ => extents.width,
        });
        let height = explicit_height.unwrap_or(extents.height);
        log::debug!(
            "text {:?} resolved to {}x{} ({} lines)",
            markup,
            width,
            height,
            extents.line_count
        );

        Ok(TextLayout {
            key: scope.key(),
            boxes: Boxes::around(Dimensions::new(width, height), frame),
            font: base_font.with_size(state.size),
            markup,
            wrap_width,
            align,
        })
    }

    pub fn draw(&mut self, canvas: &mut dyn Canvas, origin: Point, scope: &Scope<'_>) -> Result<()> {
        let layout = self.layout(scope)?.clone();
        let frame = &self.options.frame;
        paint_frame(canvas, frame, origin, &layout.boxes);

        let insets = frame.insets();
        let text_origin = origin.offset(insets.left, insets.top);
        let available = scope
            .parent
            .width
            .map(|w| w - insets.horizontal())
            .unwrap_or(0.0);
        let paint_box = Rect::new(
            text_origin.x,
            text_origin.y,
            layout.boxes.content.width.max(available),
            layout.boxes.content.height,
        );
        let paint = match &self.options.color {
            Some(color) => color.realize(paint_box),
            None => RealizedPaint::Solid(Color::BLACK),
        };

        let request = self
            .options
            .request(&layout.font, &layout.markup, layout.wrap_width, layout.align);
        canvas.draw_text(text_origin, &request, &paint)?;
        Ok(())
    }
}
