//! Glyph outlines from `ttf-parser` as tiny-skia paths.

use tiny_skia::{Path, PathBuilder, Transform};

/// Collects the outline of one glyph in font units (y up).
pub struct GlyphOutline {
    builder: PathBuilder,
}

impl GlyphOutline {
    pub fn new() -> Self {
        Self {
            builder: PathBuilder::new(),
        }
    }

    pub fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl ttf_parser::OutlineBuilder for GlyphOutline {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Maps font units to device pixels with the pen at `(x, baseline)`,
/// flipping y.
pub fn glyph_transform(scale: f32, x: f32, baseline: f32) -> Transform {
    Transform::from_row(scale, 0.0, 0.0, -scale, x, baseline)
}

/// The device-space outline of `glyph`, or `None` for glyphs without one
/// (spaces).
pub fn glyph_path(
    face: &ttf_parser::Face<'_>,
    glyph: ttf_parser::GlyphId,
    transform: Transform,
) -> Option<Path> {
    let mut outline = GlyphOutline::new();
    face.outline_glyph(glyph, &mut outline)?;
    outline.finish()?.transform(transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttf_parser::OutlineBuilder;

    #[test]
    fn test_outline_becomes_device_path() {
        let mut outline = GlyphOutline::new();
        outline.move_to(0.0, 0.0);
        outline.line_to(100.0, 0.0);
        outline.quad_to(150.0, 50.0, 100.0, 100.0);
        outline.curve_to(80.0, 120.0, 20.0, 120.0, 0.0, 100.0);
        outline.close();
        let path = outline.finish().unwrap();

        let device = path.transform(glyph_transform(0.1, 10.0, 20.0)).unwrap();
        let bounds = device.bounds();
        assert!((bounds.left() - 10.0).abs() < 1e-3);
        assert!((bounds.bottom() - 20.0).abs() < 1e-3);
        assert!(bounds.top() < 10.0);
    }

    #[test]
    fn test_empty_outline() {
        assert!(GlyphOutline::new().finish().is_none());
    }
}
