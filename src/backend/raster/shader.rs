//! Realized paints as tiny-skia shaders.
//!
//! Linear gradients with `Pad` extend only cover the band between the lines
//! through their start and end points; outside it they paint nothing. The
//! canvas turns that band into a mask (see [`pad_band`]). Radial gradients
//! pad in both directions.

use crate::geometry::{Point, Rect};
use crate::paint::{Color, ColorStop, Extend, RealizedGeometry, RealizedGradient, RealizedPaint};
use tiny_skia::{
    GradientStop, LinearGradient, Paint, Path, PathBuilder, RadialGradient, Shader, SpreadMode,
    Transform,
};

pub fn color(color: Color) -> tiny_skia::Color {
    let channel = |v: f64| v.clamp(0.0, 1.0) as f32;
    tiny_skia::Color::from_rgba(
        channel(color.r),
        channel(color.g),
        channel(color.b),
        channel(color.a),
    )
    .unwrap_or(tiny_skia::Color::TRANSPARENT)
}

fn point(p: Point) -> tiny_skia::Point {
    tiny_skia::Point::from_xy(p.x as f32, p.y as f32)
}

fn spread(extend: Extend) -> SpreadMode {
    match extend {
        Extend::Pad => SpreadMode::Pad,
        Extend::Repeat => SpreadMode::Repeat,
        Extend::Reflect => SpreadMode::Reflect,
    }
}

fn stops(stops: &[ColorStop], remap: impl Fn(f64) -> f64) -> Vec<GradientStop> {
    stops
        .iter()
        .map(|stop| GradientStop::new(remap(stop.offset).clamp(0.0, 1.0) as f32, color(stop.color)))
        .collect()
}

/// A tiny-skia paint for `paint`, or `None` when it would draw nothing
/// (no stops, a zero-length line, a zero radius).
pub fn to_paint(paint: &RealizedPaint) -> Option<Paint<'static>> {
    let shader = match paint {
        RealizedPaint::Solid(c) => Shader::SolidColor(color(*c)),
        RealizedPaint::Gradient(gradient) => gradient_shader(gradient)?,
    };
    let mut paint = Paint::default();
    paint.shader = shader;
    paint.anti_alias = true;
    Some(paint)
}

fn gradient_shader(gradient: &RealizedGradient) -> Option<Shader<'static>> {
    if gradient.stops.is_empty() {
        return None;
    }
    match gradient.geometry {
        RealizedGeometry::Linear { start, end } => {
            if (end.x - start.x).hypot(end.y - start.y) <= f64::EPSILON {
                return None;
            }
            LinearGradient::new(
                point(start),
                point(end),
                stops(&gradient.stops, |t| t),
                spread(gradient.extend),
                Transform::identity(),
            )
        }
        RealizedGeometry::Radial {
            inner_center,
            inner_radius,
            outer_center,
            outer_radius,
        } => {
            // tiny-skia gradients start from a point, so a start circle with
            // a radius becomes a start offset along the outer radius.
            let reversed = inner_radius > outer_radius;
            let (focal, r0, center, r1) = if reversed {
                (outer_center, outer_radius, inner_center, inner_radius)
            } else {
                (inner_center, inner_radius, outer_center, outer_radius)
            };
            if r1 <= 0.0 {
                return None;
            }
            let remap = |t: f64| {
                let t = if reversed { 1.0 - t } else { t };
                (r0 + t * (r1 - r0)) / r1
            };
            let mut sk_stops = stops(&gradient.stops, remap);
            if reversed {
                sk_stops.reverse();
            }
            RadialGradient::new(
                point(focal),
                point(center),
                r1 as f32,
                sk_stops,
                spread(gradient.extend),
                Transform::identity(),
            )
        }
    }
}

/// The area a linear `Pad` gradient covers inside `surface`: the band
/// between the perpendiculars through its start and end points. `None` for
/// every other paint.
pub fn pad_band(paint: &RealizedPaint, surface: Rect) -> Option<Path> {
    let RealizedPaint::Gradient(RealizedGradient {
        geometry: RealizedGeometry::Linear { start, end },
        extend: Extend::Pad,
        ..
    }) = paint
    else {
        return None;
    };
    let (dx, dy) = (end.x - start.x, end.y - start.y);
    let len = dx.hypot(dy);
    if len <= f64::EPSILON {
        return None;
    }

    let centre = surface.center();
    let reach = surface.diagonal()
        + (start.x - centre.x).hypot(start.y - centre.y)
        + (end.x - centre.x).hypot(end.y - centre.y);
    let (nx, ny) = (-dy / len * reach, dx / len * reach);

    let mut pb = PathBuilder::new();
    pb.move_to((start.x + nx) as f32, (start.y + ny) as f32);
    pb.line_to((end.x + nx) as f32, (end.y + ny) as f32);
    pb.line_to((end.x - nx) as f32, (end.y - ny) as f32);
    pb.line_to((start.x - nx) as f32, (start.y - ny) as f32);
    pb.close();
    pb.finish()
}
