//! # Paint Sources
//!
//! Colour and gradient descriptors. A descriptor is either a token string
//! (`"#ff8800"`, `"gradient_radial 0% white 100% black"`) or a structured
//! value (`[255, 128, 0, 0.5]`); both reduce to the same lower-cased token
//! list. Parsing is lenient: anything unrecognised yields `None` and the
//! element simply isn't painted.
//!
//! Parsing and realization are separate phases. A [`PaintSource`] is
//! immutable and can be shared; [`PaintSource::realize`] resolves the
//! relative parts (angles, percentages) against the box being drawn.

pub mod color;
pub mod gradient;

pub use color::Color;
pub use gradient::{
    ColorStop, Extend, Geometry, Gradient, GradientKind, Length, RealizedGeometry,
    RealizedGradient,
};

use crate::geometry::Rect;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintSource {
    Solid(Color),
    Gradient(Gradient),
}

/// A paint source with all geometry in absolute pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RealizedPaint {
    Solid(Color),
    Gradient(RealizedGradient),
}

impl PaintSource {
    /// Colours are tried before gradients.
    pub fn parse(tokens: &[String]) -> Option<PaintSource> {
        if let Some(color) = Color::parse(tokens) {
            return Some(PaintSource::Solid(color));
        }
        Gradient::parse(tokens).map(PaintSource::Gradient)
    }

    pub fn parse_str(descriptor: &str) -> Option<PaintSource> {
        PaintSource::parse(&tokenize(descriptor))
    }

    pub fn from_value(value: &Value) -> Option<PaintSource> {
        let mut tokens = Vec::new();
        tokenize_value(value, &mut tokens);
        PaintSource::parse(&tokens)
    }

    pub fn realize(&self, bounds: Rect) -> RealizedPaint {
        match self {
            PaintSource::Solid(color) => RealizedPaint::Solid(*color),
            PaintSource::Gradient(gradient) => RealizedPaint::Gradient(gradient.realize(bounds)),
        }
    }
}

impl From<Color> for PaintSource {
    fn from(color: Color) -> Self {
        PaintSource::Solid(color)
    }
}

/// Lower-case and split on whitespace.
pub fn tokenize(descriptor: &str) -> Vec<String> {
    descriptor
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect()
}

pub(crate) fn tokenize_value(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(tokenize(s)),
        Value::Number(n) => out.push(n.to_string()),
        Value::Array(items) => {
            for item in items {
                tokenize_value(item, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Object(_) => {}
    }
}

/// Deserialize an optional paint descriptor. Malformed descriptors log a
/// warning and become `None` instead of failing the whole document.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<PaintSource>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    let paint = PaintSource::from_value(&value);
    if paint.is_none() {
        log::warn!("ignoring unparsable paint source {}", value);
    }
    Ok(paint)
}
