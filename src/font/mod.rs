//! # Font Management
//!
//! Registered TrueType/OpenType faces (parsed with ttf-parser) and the text
//! metrics the bundled backends measure with. Families that are not
//! registered fall back to built-in proportional metrics, so measurement is
//! always available and deterministic.

pub mod lines;
pub mod markup;

use crate::backend::{TextExtents, TextRequest};
use crate::error::BackendError;
use crate::text::FontSpec;
use std::collections::HashMap;

pub use lines::Line;

/// Line height of the fallback metrics, in em.
const FALLBACK_LINE_HEIGHT: f64 = 1.2;
const FALLBACK_ASCENT: f64 = 0.95;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    /// Lower-cased family name.
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct FaceMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
}

impl FaceMetrics {
    /// Advance width of a character in pixels.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    pub fn line_height(&self, font_size: f64) -> f64 {
        let units = self.ascender as f64 - self.descender as f64 + self.line_gap as f64;
        units / self.units_per_em as f64 * font_size
    }

    pub fn ascent(&self, font_size: f64) -> f64 {
        self.ascender as f64 / self.units_per_em as f64 * font_size
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;

        for code in 32u32..=0xFFFF {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Some(FaceMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            line_gap: face.line_gap(),
        })
    }
}

/// A registered face: its raw bytes (for outlines) and parsed metrics.
#[derive(Debug, Clone)]
pub struct FontFace {
    pub data: Vec<u8>,
    pub metrics: FaceMetrics,
}

impl FontFace {
    pub fn parse(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, 0).ok()
    }
}

/// Font faces by family and style.
#[derive(Debug, Clone, Default)]
pub struct FontBook {
    fonts: HashMap<FontKey, FontFace>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a face from raw TTF/OTF bytes.
    pub fn register(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        data: Vec<u8>,
    ) -> Result<(), BackendError> {
        let metrics = FaceMetrics::from_font_data(&data)
            .ok_or_else(|| BackendError::Font(format!("cannot parse font data for '{}'", family)))?;
        log::debug!("registered font '{}' (bold: {}, italic: {})", family, bold, italic);
        self.fonts.insert(
            FontKey {
                family: family.to_lowercase(),
                bold,
                italic,
            },
            FontFace { data, metrics },
        );
        Ok(())
    }

    /// Register a face from a path, data URI or base64 string.
    pub fn register_src(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        src: &str,
    ) -> Result<(), BackendError> {
        let data = crate::image_loader::read_source_bytes(src).map_err(BackendError::Font)?;
        self.register(family, bold, italic, data)
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// The first family in the list that has any registered face, preferring
    /// an exact style match. An empty family list picks any registered face.
    pub fn resolve(&self, font: &FontSpec) -> Option<&FontFace> {
        let bold = font.is_bold();
        let italic = font.is_italic();
        for family in font.families() {
            let family = family.to_lowercase();
            let candidates = [(bold, italic), (bold, false), (false, italic), (false, false)];
            for (bold, italic) in candidates {
                let key = FontKey {
                    family: family.clone(),
                    bold,
                    italic,
                };
                if let Some(face) = self.fonts.get(&key) {
                    return Some(face);
                }
            }
        }
        if font.family.is_empty() {
            let mut keys: Vec<&FontKey> = self.fonts.keys().collect();
            keys.sort_by(|a, b| a.family.cmp(&b.family));
            return keys.first().and_then(|k| self.fonts.get(*k));
        }
        None
    }

    pub fn char_width(&self, font: &FontSpec, ch: char) -> f64 {
        match self.resolve(font) {
            Some(face) => face.metrics.char_width(ch, font.size),
            None => fallback_advance(ch, font.is_bold()) * font.size,
        }
    }

    pub fn line_height(&self, font: &FontSpec) -> f64 {
        match self.resolve(font) {
            Some(face) => face.metrics.line_height(font.size),
            None => FALLBACK_LINE_HEIGHT * font.size,
        }
    }

    pub fn ascent(&self, font: &FontSpec) -> f64 {
        match self.resolve(font) {
            Some(face) => face.metrics.ascent(font.size),
            None => FALLBACK_ASCENT * font.size,
        }
    }

    /// Break the request's text into lines.
    pub fn layout(&self, request: &TextRequest<'_>) -> Vec<Line> {
        let text = markup::plain_text(request.markup);
        lines::break_lines(self, request.font, &text, request.max_width, request.indent)
    }

    pub fn measure(&self, request: &TextRequest<'_>) -> TextExtents {
        let lines = self.layout(request);
        let line_count = lines.len();
        let width = lines.iter().map(|l| l.width).fold(0.0, f64::max);
        let height = line_count as f64 * self.line_height(request.font)
            + line_count.saturating_sub(1) as f64 * request.spacing;
        TextExtents {
            width,
            height,
            line_count,
        }
    }
}

/// Proportional advance widths in em for text without a registered face.
fn fallback_advance(ch: char, bold: bool) -> f64 {
    let em = match ch {
        ' ' | '\u{00A0}' => 0.28,
        'i' | 'j' | 'l' | 'I' | '!' | '.' | ',' | ':' | ';' | '\'' | '|' => 0.28,
        'f' | 't' | 'r' | '(' | ')' | '-' => 0.36,
        'm' | 'w' | 'M' | 'W' | '@' => 0.83,
        c if c.is_ascii_uppercase() => 0.67,
        c if c.is_ascii_digit() => 0.56,
        c if c.is_whitespace() => 0.28,
        c if c.is_ascii() => 0.5,
        // wide scripts
        _ => 1.0,
    };
    if bold {
        em * 1.06
    } else {
        em
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Align;

    fn request<'a>(font: &'a FontSpec, text: &'a str, max_width: Option<f64>) -> TextRequest<'a> {
        TextRequest {
            font,
            markup: text,
            max_width,
            align: Align::Left,
            justify: false,
            indent: 0.0,
            spacing: 0.0,
            auto_dir: false,
        }
    }

    #[test]
    fn test_fallback_widths_scale_with_size() {
        let book = FontBook::new();
        let small = FontSpec::parse("10");
        let large = FontSpec::parse("20");
        let w1 = book.char_width(&small, 'a');
        let w2 = book.char_width(&large, 'a');
        assert!((w1 - 5.0).abs() < 0.001);
        assert!((w2 - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_bold_fallback_is_wider() {
        let book = FontBook::new();
        let regular = book.char_width(&FontSpec::parse("12"), 'A');
        let bold = book.char_width(&FontSpec::parse("bold 12"), 'A');
        assert!(bold > regular, "Bold A should be wider than regular A");
    }

    #[test]
    fn test_measure_single_line() {
        let book = FontBook::new();
        let font = FontSpec::parse("10");
        let extents = book.measure(&request(&font, "aaaa", None));
        assert_eq!(extents.line_count, 1);
        assert!((extents.width - 20.0).abs() < 0.001);
        assert!((extents.height - 12.0).abs() < 0.001);
    }

    #[test]
    fn test_measure_wraps_and_adds_spacing() {
        let book = FontBook::new();
        let font = FontSpec::parse("10");
        let mut req = request(&font, "aaaa aaaa aaaa", Some(25.0));
        req.spacing = 3.0;
        let extents = book.measure(&req);
        assert_eq!(extents.line_count, 3);
        assert!((extents.height - (3.0 * 12.0 + 2.0 * 3.0)).abs() < 0.001);
    }

    #[test]
    fn test_markup_is_not_measured() {
        let book = FontBook::new();
        let font = FontSpec::parse("10");
        let plain = book.measure(&request(&font, "bold", None));
        let marked = book.measure(&request(&font, "<b>bold</b>", None));
        assert_eq!(plain, marked);
    }

    #[test]
    fn test_register_rejects_garbage() {
        let mut book = FontBook::new();
        assert!(book.register("Broken", false, false, vec![0, 1, 2, 3]).is_err());
        assert!(book.is_empty());
        assert!(book.resolve(&FontSpec::parse("Broken 12")).is_none());
    }
}
