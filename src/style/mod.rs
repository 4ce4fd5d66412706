//! # Box Options
//!
//! The attributes every node shares: sizing, insets, borders, background,
//! positioning and alignment. Option values are forgiving. A width of
//! `"abc"` or `-5` is simply `Auto`, a margin of `"5 10"` means
//! `5 10 5 10`, and a border that cannot be understood is not drawn.

use crate::error::ConfigError;
use crate::geometry::Axis;
use crate::paint::{self, PaintSource};
use serde::de::{DeserializeOwned, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

// ── Sizing ──────────────────────────────────────────────────────

/// A requested size on one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Size {
    /// Absolute pixels.
    Fixed(f64),
    /// Fraction (0..1) of the parent's content size.
    Percent(f64),
    /// `"0%"`: take whatever space a table leaves over. Outside a table
    /// this behaves like `Auto`.
    Fill,
    /// Sized by content.
    #[default]
    Auto,
}

impl Size {
    /// `100`, `"100"`, `"50%"`, `"0%"`, `"auto"`. Anything else is `Auto`.
    pub fn parse(raw: &str) -> Size {
        let raw = raw.trim();
        if let Some(pct) = raw.strip_suffix('%') {
            return match pct.trim().parse::<f64>() {
                Ok(v) if v == 0.0 => Size::Fill,
                Ok(v) if v > 0.0 && v.is_finite() => Size::Percent(v / 100.0),
                _ => Size::Auto,
            };
        }
        match raw.parse::<f64>() {
            Ok(v) => Size::from_px(v),
            Err(_) => Size::Auto,
        }
    }

    pub fn from_px(px: f64) -> Size {
        if px > 0.0 && px.is_finite() {
            Size::Fixed(px)
        } else {
            Size::Auto
        }
    }

    pub fn from_value(value: &Value) -> Size {
        match value {
            Value::Number(n) => n.as_f64().map(Size::from_px).unwrap_or(Size::Auto),
            Value::String(s) => Size::parse(s),
            _ => Size::Auto,
        }
    }

    /// Resolve against the parent's content size on the same axis.
    ///
    /// `Ok(None)` means "size by content". A percentage without a known
    /// parent size is an error when `strict`, content-sized otherwise.
    pub fn resolve(
        &self,
        parent: Option<f64>,
        axis: Axis,
        strict: bool,
    ) -> Result<Option<f64>, ConfigError> {
        match *self {
            Size::Fixed(px) => Ok(Some(px)),
            Size::Percent(f) => match parent {
                Some(p) => Ok(Some((p * f).max(0.0))),
                None if strict => Err(ConfigError::UnresolvablePercentage { axis: axis.name() }),
                None => Ok(None),
            },
            Size::Fill | Size::Auto => Ok(None),
        }
    }
}

impl<'de> Deserialize<'de> for Size {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Size::from_value(&Value::deserialize(deserializer)?))
    }
}

// ── Box Model ───────────────────────────────────────────────────

/// Four-sided insets (margin or padding).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }

    pub fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.horizontal(),
            Axis::Vertical => self.vertical(),
        }
    }

    /// Top, right, bottom, left. Shorter lists repeat from the start, so
    /// `[5, 10]` is `5 10 5 10` and `[1, 2, 3]` is `1 2 3 1`. Negative
    /// values clamp to zero.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Edges::default();
        }
        let side = |i: usize| values[i % values.len()].max(0.0);
        Self {
            top: side(0),
            right: side(1),
            bottom: side(2),
            left: side(3),
        }
    }

    /// Space or comma separated: `"5"`, `"5 10"`, `"1,2,3,4"`.
    pub fn parse(raw: &str) -> Self {
        let values: Vec<f64> = raw
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter_map(|t| t.parse::<f64>().ok())
            .collect();
        Edges::from_values(&values)
    }

    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => Edges::uniform(n.as_f64().unwrap_or(0.0).max(0.0)),
            Value::String(s) => Edges::parse(s),
            Value::Array(items) => {
                let values: Vec<f64> = items.iter().filter_map(number).collect();
                Edges::from_values(&values)
            }
            _ => Edges::default(),
        }
    }

    fn with_overrides(mut self, sides: [Option<f64>; 4]) -> Self {
        let [top, right, bottom, left] = sides;
        if let Some(v) = top {
            self.top = v.max(0.0);
        }
        if let Some(v) = right {
            self.right = v.max(0.0);
        }
        if let Some(v) = bottom {
            self.bottom = v.max(0.0);
        }
        if let Some(v) = left {
            self.left = v.max(0.0);
        }
        self
    }
}

impl<'de> Deserialize<'de> for Edges {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Edges::from_value(&Value::deserialize(deserializer)?))
    }
}

// ── Borders ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dotted,
    Dashed,
}

impl LineStyle {
    fn from_token(token: &str) -> Option<LineStyle> {
        match token {
            "solid" => Some(LineStyle::Solid),
            "dotted" => Some(LineStyle::Dotted),
            "dashed" | "dash" => Some(LineStyle::Dashed),
            _ => None,
        }
    }

    /// On/off lengths for a line of the given width. Empty means solid.
    pub fn dash_pattern(self, width: f64) -> Vec<f64> {
        match self {
            LineStyle::Solid => Vec::new(),
            LineStyle::Dotted => vec![width, width],
            LineStyle::Dashed => vec![width * 4.0, width * 2.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// One border edge: `"2 dotted red"`, `[1, "solid", 0, 0, 255]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderSide {
    pub width: f64,
    pub style: LineStyle,
    pub paint: PaintSource,
}

impl BorderSide {
    pub fn new(width: f64, style: LineStyle, paint: impl Into<PaintSource>) -> Self {
        Self {
            width,
            style,
            paint: paint.into(),
        }
    }

    /// Width first, then an optional line style, then a paint descriptor
    /// (black when omitted). `None` when the width is missing or not
    /// positive, or the paint does not parse.
    pub fn parse(tokens: &[String]) -> Option<BorderSide> {
        let width = tokens.first()?.parse::<f64>().ok()?;
        if width <= 0.0 || !width.is_finite() {
            return None;
        }
        let mut rest = &tokens[1..];
        let mut style = LineStyle::Solid;
        if let Some(s) = rest.first().and_then(|t| LineStyle::from_token(t)) {
            style = s;
            rest = &rest[1..];
        }
        let paint = if rest.is_empty() {
            PaintSource::Solid(paint::Color::BLACK)
        } else {
            PaintSource::parse(rest)?
        };
        Some(BorderSide {
            width,
            style,
            paint,
        })
    }

    pub fn parse_str(raw: &str) -> Option<BorderSide> {
        BorderSide::parse(&paint::tokenize(raw))
    }

    fn from_value(value: &Value) -> Option<BorderSide> {
        let tokens = match value {
            Value::Array(items) => items
                .iter()
                .flat_map(|item| match item {
                    Value::String(s) => paint::tokenize(s),
                    Value::Number(n) => vec![n.to_string()],
                    _ => Vec::new(),
                })
                .collect(),
            Value::String(s) => paint::tokenize(s),
            Value::Number(n) => vec![n.to_string()],
            _ => Vec::new(),
        };
        BorderSide::parse(&tokens)
    }
}

/// Border edges in the order they were first declared. Later sides draw
/// over the corners they share with earlier ones.
///
/// Deserialized from the `border` shorthand and the `border_top`,
/// `border_right`, `border_bottom` and `border_left` keys. The shorthand
/// declares all four sides (top, right, bottom, left) at its position; a key
/// naming a side that is already declared replaces it in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Borders(Vec<(Side, BorderSide)>);

impl Borders {
    /// All four sides alike.
    pub fn all(border: BorderSide) -> Self {
        let mut borders = Borders::default();
        borders.set_all(border);
        borders
    }

    /// Builder form of [`Borders::set`].
    pub fn with(mut self, side: Side, border: BorderSide) -> Self {
        self.set(side, border);
        self
    }

    pub fn set(&mut self, side: Side, border: BorderSide) {
        match self.0.iter_mut().find(|(s, _)| *s == side) {
            Some(slot) => slot.1 = border,
            None => self.0.push((side, border)),
        }
    }

    pub fn set_all(&mut self, border: BorderSide) {
        for side in [Side::Top, Side::Right, Side::Bottom, Side::Left] {
            self.set(side, border.clone());
        }
    }

    pub fn get(&self, side: Side) -> Option<&BorderSide> {
        self.0.iter().find(|(s, _)| *s == side).map(|(_, b)| b)
    }

    /// Declared sides in drawing order.
    pub fn sides(&self) -> &[(Side, BorderSide)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Borders {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BordersVisitor;

        impl<'de> Visitor<'de> for BordersVisitor {
            type Value = Borders;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of border options")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Borders, A::Error> {
                let mut borders = Borders::default();
                while let Some(key) = map.next_key::<String>()? {
                    let side = match key.as_str() {
                        "border" => None,
                        "border_top" => Some(Side::Top),
                        "border_right" => Some(Side::Right),
                        "border_bottom" => Some(Side::Bottom),
                        "border_left" => Some(Side::Left),
                        _ => {
                            map.next_value::<IgnoredAny>()?;
                            continue;
                        }
                    };
                    let value: Value = map.next_value()?;
                    let Some(border) = BorderSide::from_value(&value) else {
                        if !value.is_null() {
                            log::warn!("ignoring unusable {} {}", key, value);
                        }
                        continue;
                    };
                    match side {
                        Some(side) => borders.set(side, border),
                        None => borders.set_all(border),
                    }
                }
                Ok(borders)
            }
        }

        deserializer.deserialize_map(BordersVisitor)
    }
}

// ── Positioning ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Stacked below the previous in-flow sibling.
    #[default]
    Static,
    /// Takes its flow slot, then is displaced by `x`/`y`.
    Relative,
    /// Placed at `x`/`y` against the parent's content origin, out of flow.
    Absolute,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    #[serde(alias = "middle")]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    #[serde(alias = "center")]
    Middle,
    Bottom,
}

impl Align {
    /// Offset of a run of `used` pixels inside `available`.
    pub fn offset(self, available: f64, used: f64) -> f64 {
        let free = (available - used).max(0.0);
        match self {
            Align::Left => 0.0,
            Align::Center => free / 2.0,
            Align::Right => free,
        }
    }
}

impl VerticalAlign {
    pub fn offset(self, available: f64, used: f64) -> f64 {
        let free = (available - used).max(0.0);
        match self {
            VerticalAlign::Top => 0.0,
            VerticalAlign::Middle => free / 2.0,
            VerticalAlign::Bottom => free,
        }
    }
}

// ── Node options ────────────────────────────────────────────────

/// Attributes shared by every node.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BoxOptions {
    #[serde(alias = "w")]
    pub width: Size,
    #[serde(alias = "h")]
    pub height: Size,

    pub margin: Edges,
    #[serde(deserialize_with = "lenient_f64")]
    pub margin_top: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub margin_right: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub margin_bottom: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub margin_left: Option<f64>,

    pub padding: Edges,
    #[serde(deserialize_with = "lenient_f64")]
    pub padding_top: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub padding_right: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub padding_bottom: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub padding_left: Option<f64>,

    /// `border` and `border_top` .. `border_left`.
    #[serde(flatten)]
    pub borders: Borders,

    #[serde(alias = "bg", deserialize_with = "paint::deserialize_lenient")]
    pub background: Option<PaintSource>,

    #[serde(deserialize_with = "lenient")]
    pub position: Position,
    #[serde(deserialize_with = "lenient_f64")]
    pub x: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub y: Option<f64>,
    #[serde(deserialize_with = "lenient_i32")]
    pub z: i32,

    #[serde(deserialize_with = "lenient")]
    pub align: Option<Align>,
    #[serde(alias = "valign", deserialize_with = "lenient")]
    pub vertical_align: Option<VerticalAlign>,
}

impl BoxOptions {
    /// Margin with per-side overrides applied over the shorthand.
    pub fn margin(&self) -> Edges {
        self.margin.with_overrides([
            self.margin_top,
            self.margin_right,
            self.margin_bottom,
            self.margin_left,
        ])
    }

    pub fn padding(&self) -> Edges {
        self.padding.with_overrides([
            self.padding_top,
            self.padding_right,
            self.padding_bottom,
            self.padding_left,
        ])
    }

    /// Combined margin and padding, the distance from the outer box to the
    /// content box.
    pub fn insets(&self) -> Edges {
        let m = self.margin();
        let p = self.padding();
        Edges {
            top: m.top + p.top,
            right: m.right + p.right,
            bottom: m.bottom + p.bottom,
            left: m.left + p.left,
        }
    }

    /// Borders to draw, in drawing order.
    pub fn border_sides(&self) -> &[(Side, BorderSide)] {
        self.borders.sides()
    }

    pub fn size(&self, axis: Axis) -> Size {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

pub(crate) fn number(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    v.filter(|v| v.is_finite())
}

pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(deserializer)?))
}

/// Any option with a default: values that do not deserialize log a warning
/// and fall back to the default instead of rejecting the document.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    match T::deserialize(&value) {
        Ok(v) => Ok(v),
        Err(e) => {
            log::warn!("ignoring option value {}: {}", value, e);
            Ok(T::default())
        }
    }
}

/// `true`/`false`, numbers (non-zero is true) and the strings `"true"`,
/// `"yes"`, `"1"` and their negatives.
pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => true,
            "false" | "no" | "0" | "" => false,
            _ => {
                log::warn!("ignoring flag value {}", value);
                false
            }
        },
        _ => {
            log::warn!("ignoring flag value {}", value);
            false
        }
    })
}

fn lenient_i32<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(deserializer)?)
        .map(|v| v.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32)
        .unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;
    use serde_json::json;

    #[test]
    fn test_inset_forms_agree() {
        let expected = Edges {
            top: 5.0,
            right: 10.0,
            bottom: 5.0,
            left: 10.0,
        };
        assert_eq!(Edges::parse("5 10"), expected);
        assert_eq!(Edges::from_value(&json!([5, 10])), expected);
        assert_eq!(Edges::from_value(&json!([5, 10, 5, 10])), expected);
        assert_eq!(Edges::symmetric(5.0, 10.0), expected);
        assert_eq!(Edges::from_value(&json!(7)), Edges::uniform(7.0));
        assert_eq!(Edges::from_value(&json!("7")), Edges::uniform(7.0));
    }

    #[test]
    fn test_four_values_are_kept_in_order() {
        let e = Edges::from_value(&json!([5, 10, 10, 5]));
        assert_eq!((e.top, e.right, e.bottom, e.left), (5.0, 10.0, 10.0, 5.0));
    }

    #[test]
    fn test_three_values_repeat_from_start() {
        let e = Edges::parse("1 2 3");
        assert_eq!((e.top, e.right, e.bottom, e.left), (1.0, 2.0, 3.0, 1.0));
    }

    #[test]
    fn test_malformed_insets_are_zero() {
        assert_eq!(Edges::parse("wide"), Edges::default());
        assert_eq!(Edges::from_value(&json!(true)), Edges::default());
        assert_eq!(Edges::from_value(&json!(-4)), Edges::default());
    }

    #[test]
    fn test_size_parsing() {
        assert_eq!(Size::from_value(&json!(100)), Size::Fixed(100.0));
        assert_eq!(Size::parse("100"), Size::Fixed(100.0));
        assert_eq!(Size::parse("50%"), Size::Percent(0.5));
        assert_eq!(Size::parse("0%"), Size::Fill);
        assert_eq!(Size::parse("auto"), Size::Auto);
        assert_eq!(Size::parse("abc"), Size::Auto);
        assert_eq!(Size::from_value(&json!(-100)), Size::Auto);
        assert_eq!(Size::from_value(&json!(0)), Size::Auto);
    }

    #[test]
    fn test_percent_resolution() {
        let half = Size::Percent(0.5);
        assert_eq!(half.resolve(Some(300.0), Axis::Horizontal, true), Ok(Some(150.0)));
        assert_eq!(half.resolve(None, Axis::Horizontal, false), Ok(None));
        assert_eq!(
            half.resolve(None, Axis::Vertical, true),
            Err(ConfigError::UnresolvablePercentage { axis: "height" })
        );
        assert_eq!(Size::Fill.resolve(Some(300.0), Axis::Horizontal, true), Ok(None));
    }

    #[test]
    fn test_border_parsing() {
        let b = BorderSide::parse_str("2 dotted red").unwrap();
        assert_eq!(b.width, 2.0);
        assert_eq!(b.style, LineStyle::Dotted);
        assert_eq!(b.paint, PaintSource::Solid(Color::rgb(1.0, 0.0, 0.0)));

        let b = BorderSide::from_value(&json!([1, "solid", 1.0, 0, 0])).unwrap();
        assert_eq!(b.paint, PaintSource::Solid(Color::rgb(1.0, 0.0, 0.0)));

        let b = BorderSide::parse_str("3").unwrap();
        assert_eq!(b.paint, PaintSource::Solid(Color::BLACK));

        assert!(BorderSide::parse_str("0 solid red").is_none());
        assert!(BorderSide::parse_str("thick").is_none());
        assert!(BorderSide::parse_str("1 solid nocolor").is_none());
    }

    #[test]
    fn test_border_side_overrides_keep_order() {
        let options: BoxOptions = serde_json::from_value(json!({
            "border": "1 solid black",
            "border_right": "4 dashed red"
        }))
        .unwrap();
        let sides = options.border_sides();
        let order: Vec<Side> = sides.iter().map(|(s, _)| *s).collect();
        assert_eq!(order, vec![Side::Top, Side::Right, Side::Bottom, Side::Left]);
        assert_eq!(sides[1].1.width, 4.0);
    }

    #[test]
    fn test_borders_follow_declaration_order() {
        let options: BoxOptions = serde_json::from_value(json!({
            "border_left": "2 solid red",
            "width": 10,
            "border_top": "2 solid blue"
        }))
        .unwrap();
        let order: Vec<Side> = options.border_sides().iter().map(|(s, _)| *s).collect();
        assert_eq!(order, vec![Side::Left, Side::Top]);

        // A shorthand after a side keeps that side first but restyles it.
        let options: BoxOptions = serde_json::from_value(json!({
            "border_bottom": "5 solid red",
            "border": "1 solid black"
        }))
        .unwrap();
        let sides = options.border_sides();
        let order: Vec<Side> = sides.iter().map(|(s, _)| *s).collect();
        assert_eq!(order, vec![Side::Bottom, Side::Top, Side::Right, Side::Left]);
        assert_eq!(sides[0].1.width, 1.0);
    }

    #[test]
    fn test_borders_builder() {
        let borders = Borders::all(BorderSide::new(1.0, LineStyle::Solid, Color::BLACK))
            .with(Side::Right, BorderSide::new(3.0, LineStyle::Dotted, Color::WHITE));
        assert_eq!(borders.sides().len(), 4);
        assert_eq!(borders.get(Side::Right).map(|b| b.width), Some(3.0));

        let borders = Borders::default()
            .with(Side::Left, BorderSide::new(1.0, LineStyle::Solid, Color::BLACK))
            .with(Side::Top, BorderSide::new(1.0, LineStyle::Solid, Color::WHITE));
        assert_eq!(borders.sides()[0].0, Side::Left);
        assert!(borders.get(Side::Bottom).is_none());
    }

    #[test]
    fn test_unknown_keywords_fall_back() {
        let options: BoxOptions = serde_json::from_value(json!({
            "width": 10,
            "position": "fixed",
            "align": "justify",
            "vertical_align": 3,
            "border_top": "thick"
        }))
        .unwrap();
        assert_eq!(options.width, Size::Fixed(10.0));
        assert_eq!(options.position, Position::Static);
        assert_eq!(options.align, None);
        assert_eq!(options.vertical_align, None);
        assert!(options.borders.is_empty());

        let options: BoxOptions =
            serde_json::from_value(json!({ "position": "absolute", "align": "middle" })).unwrap();
        assert_eq!(options.position, Position::Absolute);
        assert_eq!(options.align, Some(Align::Center));
    }

    #[test]
    fn test_deserialize_with_aliases_and_garbage() {
        let options: BoxOptions = serde_json::from_value(json!({
            "w": "50%",
            "h": "abc",
            "bg": "#ffffff",
            "margin": "5 10",
            "margin_top": 1,
            "valign": "bottom",
            "x": "12",
            "z": "3",
            "border": [1, "solid", "red"]
        }))
        .unwrap();
        assert_eq!(options.width, Size::Percent(0.5));
        assert_eq!(options.height, Size::Auto);
        assert_eq!(options.background, Some(PaintSource::Solid(Color::WHITE)));
        assert_eq!(options.margin().top, 1.0);
        assert_eq!(options.margin().left, 10.0);
        assert_eq!(options.vertical_align, Some(VerticalAlign::Bottom));
        assert_eq!(options.x, Some(12.0));
        assert_eq!(options.z, 3);
        assert_eq!(options.border_sides().len(), 4);
    }

    #[test]
    fn test_align_offsets() {
        assert_eq!(Align::Center.offset(100.0, 40.0), 30.0);
        assert_eq!(Align::Right.offset(100.0, 40.0), 60.0);
        assert_eq!(Align::Right.offset(10.0, 40.0), 0.0);
        assert_eq!(VerticalAlign::Bottom.offset(50.0, 20.0), 30.0);
    }
}
