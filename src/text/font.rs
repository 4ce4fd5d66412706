//! Font descriptions: `"[FAMILY-LIST] [STYLE-OPTIONS] [SIZE]"`, e.g.
//! `"Georgia, serif bold italic 14"`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Comma separated family list; empty means the backend default.
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
    /// Point size.
    pub size: f64,
}

impl FontSpec {
    pub const DEFAULT_SIZE: f64 = 10.0;

    pub fn parse(description: &str) -> FontSpec {
        let mut words: Vec<&str> = description.split_whitespace().collect();
        let mut spec = FontSpec::default();

        if let Some(size) = words.last().and_then(|w| parse_size(w)) {
            spec.size = size;
            words.pop();
        }
        while let Some(word) = words.last() {
            match word.to_lowercase().as_str() {
                "bold" | "heavy" | "semi-bold" | "ultra-bold" => spec.weight = FontWeight::Bold,
                "italic" | "oblique" => spec.style = FontStyle::Italic,
                "normal" | "regular" | "book" | "light" | "roman" => {}
                _ => break,
            }
            words.pop();
        }
        spec.family = words.join(" ").trim_end_matches(',').to_string();
        spec
    }

    pub fn with_size(&self, size: f64) -> FontSpec {
        FontSpec {
            size,
            ..self.clone()
        }
    }

    /// Individual family names, in preference order.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.family
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }

    pub fn is_bold(&self) -> bool {
        self.weight == FontWeight::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.style == FontStyle::Italic
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: String::new(),
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
            size: Self::DEFAULT_SIZE,
        }
    }
}

fn parse_size(word: &str) -> Option<f64> {
    let digits = word.strip_suffix("px").unwrap_or(word);
    digits
        .parse::<f64>()
        .ok()
        .filter(|v| *v > 0.0 && v.is_finite())
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.family.is_empty() {
            write!(f, "{} ", self.family)?;
        }
        if self.is_bold() {
            write!(f, "Bold ")?;
        }
        if self.is_italic() {
            write!(f, "Italic ")?;
        }
        write!(f, "{}", self.size)
    }
}

impl<'de> Deserialize<'de> for FontSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => FontSpec::parse(&s),
            Value::Number(n) => n
                .as_f64()
                .and_then(|v| parse_size(&v.to_string()))
                .map(|size| FontSpec::default().with_size(size))
                .unwrap_or_default(),
            _ => FontSpec::default(),
        })
    }
}
