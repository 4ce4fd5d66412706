//! Linear and radial gradient descriptors.
//!
//! ```text
//! gradient[_radial][_repeat|_reflect] <geometry> <stop>...
//!
//! linear geometry:  x0 y0 x1 y1
//!                   [Ndeg] [length | N%]
//! radial geometry:  x0 y0 r0 x1 y1 r1
//!                   [radius | N%] [Ndeg dist[%]] [Ndeg dist[%]]
//! stop:             N% <colour tokens>
//! ```
//!
//! Geometry given as angles and percentages stays relative until it is
//! realized against the box being painted.

use super::color::{is_decimal, is_integer, Color};
use crate::geometry::{Point, Rect};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GradientKind {
    Linear,
    Radial,
}

/// How the gradient continues outside the 0..1 parameter range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Extend {
    #[default]
    Pad,
    Repeat,
    Reflect,
}

/// A length that is either absolute or a fraction of some reference length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f64),
    Fraction(f64),
}

impl Length {
    fn of(self, reference: f64) -> f64 {
        match self {
            Length::Px(px) => px,
            Length::Fraction(f) => reference * f,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Start and end points relative to the box origin.
    LinearPoints { x0: f64, y0: f64, x1: f64, y1: f64 },
    /// Start at the box origin and run `length` along `angle`.
    LinearAngle { angle: f64, length: Length },
    /// Two circles relative to the box origin.
    RadialCircles {
        x0: f64,
        y0: f64,
        r0: f64,
        x1: f64,
        y1: f64,
        r1: f64,
    },
    /// Circles placed around the box centre. The inner circle has radius 0,
    /// the outer one `radius`; distances as fractions are of the radius.
    RadialAngles {
        radius: Length,
        angle1: f64,
        dist1: Length,
        angle2: f64,
        dist2: Length,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    pub extend: Extend,
    pub geometry: Geometry,
    /// Sorted by offset.
    pub stops: Vec<ColorStop>,
}

/// Gradient geometry resolved to absolute coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RealizedGeometry {
    Linear {
        start: Point,
        end: Point,
    },
    Radial {
        inner_center: Point,
        inner_radius: f64,
        outer_center: Point,
        outer_radius: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealizedGradient {
    pub geometry: RealizedGeometry,
    pub extend: Extend,
    pub stops: Vec<ColorStop>,
}

impl Gradient {
    /// Parse a gradient from lower-cased tokens. Any stop whose colour does
    /// not parse rejects the whole gradient, as does a gradient without stops.
    pub fn parse(tokens: &[String]) -> Option<Gradient> {
        let (kind, extend) = parse_keyword(tokens.first()?)?;
        let mut rest = &tokens[1..];
        let geometry = match kind {
            GradientKind::Linear => parse_linear(&mut rest),
            GradientKind::Radial => parse_radial(&mut rest),
        };
        let stops = parse_stops(rest)?;
        Some(Gradient {
            kind,
            extend,
            geometry,
            stops,
        })
    }

    pub fn realize(&self, bounds: Rect) -> RealizedGradient {
        let origin = Point::new(bounds.x, bounds.y);
        let geometry = match self.geometry {
            Geometry::LinearPoints { x0, y0, x1, y1 } => RealizedGeometry::Linear {
                start: origin.offset(x0, y0),
                end: origin.offset(x1, y1),
            },
            Geometry::LinearAngle { angle, length } => {
                let dist = match length {
                    Length::Px(px) => px,
                    Length::Fraction(f) => projected_diagonal(angle, bounds) * f,
                };
                RealizedGeometry::Linear {
                    start: origin,
                    end: origin.toward(angle, dist),
                }
            }
            Geometry::RadialCircles {
                x0,
                y0,
                r0,
                x1,
                y1,
                r1,
            } => RealizedGeometry::Radial {
                inner_center: origin.offset(x0, y0),
                inner_radius: r0,
                outer_center: origin.offset(x1, y1),
                outer_radius: r1,
            },
            Geometry::RadialAngles {
                radius,
                angle1,
                dist1,
                angle2,
                dist2,
            } => {
                let center = bounds.center();
                let radius = radius.of(bounds.diagonal() / 2.0);
                RealizedGeometry::Radial {
                    inner_center: center.toward(angle1, dist1.of(radius)),
                    inner_radius: 0.0,
                    outer_center: center.toward(angle2, dist2.of(radius)),
                    outer_radius: radius,
                }
            }
        };
        RealizedGradient {
            geometry,
            extend: self.extend,
            stops: self.stops.clone(),
        }
    }
}

/// Length of the box diagonal projected onto the gradient direction, so that
/// `100%` always spans the box corner to corner.
fn projected_diagonal(angle: f64, bounds: Rect) -> f64 {
    if bounds.width <= 0.0 && bounds.height <= 0.0 {
        return 0.0;
    }
    let mut deg = angle.rem_euclid(180.0);
    if deg > 90.0 {
        deg = 180.0 - deg;
    }
    let theta = deg.to_radians() - (bounds.height / bounds.width).atan();
    bounds.diagonal() * theta.cos()
}

fn parse_keyword(token: &str) -> Option<(GradientKind, Extend)> {
    let rest = token.strip_prefix("gradient")?.replace('_', "");
    let (kind, extend) = match rest.strip_prefix("radial") {
        Some(extend) => (GradientKind::Radial, extend.to_string()),
        None => (GradientKind::Linear, rest),
    };
    let extend = match extend.as_str() {
        "" => Extend::Pad,
        "repeat" => Extend::Repeat,
        "reflect" => Extend::Reflect,
        _ => return None,
    };
    Some((kind, extend))
}

fn parse_linear(rest: &mut &[String]) -> Geometry {
    if let Some([x0, y0, x1, y1]) = integers::<4>(rest) {
        *rest = &rest[4..];
        return Geometry::LinearPoints { x0, y0, x1, y1 };
    }

    let mut angle = 0.0;
    let mut length = Length::Fraction(1.0);
    if let Some(deg) = rest.first().and_then(|t| degrees(t)) {
        angle = deg;
        *rest = &rest[1..];
    }
    if let Some(px) = rest.first().filter(|t| is_integer(t)).and_then(|t| t.parse().ok()) {
        length = Length::Px(px);
        *rest = &rest[1..];
    } else if let (Some(pct), Some(true)) = (
        rest.first().and_then(|t| percent(t)),
        rest.get(1).map(|t| percent(t).is_some()),
    ) {
        length = Length::Fraction(pct);
        *rest = &rest[1..];
    }
    Geometry::LinearAngle { angle, length }
}

fn parse_radial(rest: &mut &[String]) -> Geometry {
    if let Some([x0, y0, r0, x1, y1, r1]) = integers::<6>(rest) {
        *rest = &rest[6..];
        return Geometry::RadialCircles {
            x0,
            y0,
            r0,
            x1,
            y1,
            r1,
        };
    }

    let mut radius = Length::Fraction(1.0);
    if let Some(px) = rest.first().filter(|t| is_integer(t)).and_then(|t| t.parse().ok()) {
        radius = Length::Px(px);
        *rest = &rest[1..];
    } else if let (Some(pct), Some(true)) = (
        rest.first().and_then(|t| percent(t)),
        rest.get(1)
            .map(|t| percent(t).is_some() || degrees(t).is_some()),
    ) {
        radius = Length::Fraction(pct);
        *rest = &rest[1..];
    }

    let mut polar = || -> Option<(f64, Length)> {
        let angle = rest.first().and_then(|t| degrees(t))?;
        let dist = rest.get(1).and_then(|t| distance(t))?;
        *rest = &rest[2..];
        Some((angle, dist))
    };
    let (angle1, dist1) = polar().unwrap_or((0.0, Length::Px(0.0)));
    let (angle2, dist2) = polar().unwrap_or((0.0, Length::Px(0.0)));
    Geometry::RadialAngles {
        radius,
        angle1,
        dist1,
        angle2,
        dist2,
    }
}

fn parse_stops(tokens: &[String]) -> Option<Vec<ColorStop>> {
    let mut raw: Vec<(f64, Vec<String>)> = Vec::new();
    for token in tokens {
        if let Some(offset) = percent(token) {
            raw.push((offset.clamp(0.0, 1.0), Vec::new()));
        } else if let Some((_, color_tokens)) = raw.last_mut() {
            color_tokens.push(token.clone());
        }
    }
    if raw.is_empty() {
        return None;
    }

    let mut stops = raw
        .into_iter()
        .map(|(offset, tokens)| Color::parse(&tokens).map(|color| ColorStop { offset, color }))
        .collect::<Option<Vec<_>>>()?;
    stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    Some(stops)
}

fn integers<const N: usize>(tokens: &[String]) -> Option<[f64; N]> {
    if tokens.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        if !is_integer(token) {
            return None;
        }
        *slot = token.parse().ok()?;
    }
    Some(out)
}

fn degrees(token: &str) -> Option<f64> {
    let value = token.strip_suffix("deg")?;
    let digits = value.strip_prefix('-').unwrap_or(value);
    if is_integer(digits) || is_decimal(digits) {
        value.parse().ok()
    } else {
        None
    }
}

/// `N%` as a fraction.
fn percent(token: &str) -> Option<f64> {
    let value = token.strip_suffix('%')?;
    if is_integer(value) || is_decimal(value) {
        value.parse::<f64>().ok().map(|v| v / 100.0)
    } else {
        None
    }
}

fn distance(token: &str) -> Option<Length> {
    if let Some(f) = percent(token) {
        Some(Length::Fraction(f))
    } else if is_integer(token) {
        token.parse().ok().map(Length::Px)
    } else {
        None
    }
}
