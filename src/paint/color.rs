//! Solid colours and the colour descriptor grammar.
//!
//! ```text
//! #rgb | #rrggbb                  [alpha]
//! R G B                           [alpha]
//! cmyk C M Y K                    [alpha]
//! hsv H S V                       [alpha]
//! <named colour>                  [alpha]
//! ```
//!
//! Integer components are 0-255, decimal components are 0.0-1.0. A missing
//! alpha is fully opaque.

use serde::Serialize;

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self::rgba(self.r, self.g, self.b, a)
    }

    /// Parse a colour from already lower-cased tokens.
    pub fn parse(tokens: &[String]) -> Option<Color> {
        let mut tokens = tokens.to_vec();
        if let Some(expanded) = tokens.first().and_then(|t| expand_hex(t)) {
            tokens.splice(0..1, expanded);
        }

        let first = tokens.first()?;
        if tokens.len() >= 3 && tokens[..3].iter().all(|t| is_number(t)) {
            let [r, g, b] = components::<3>(&tokens[0..3])?;
            return Some(Color::rgba(r, g, b, alpha_at(&tokens, 3)));
        }

        match first.as_str() {
            "cmyk" => {
                let [c, m, y, k] = components::<4>(tokens.get(1..5)?)?;
                let (r, g, b) = cmyk_to_rgb(c, m, y, k);
                Some(Color::rgba(r, g, b, alpha_at(&tokens, 5)))
            }
            "hsv" => {
                let [h, s, v] = components::<3>(tokens.get(1..4)?)?;
                let (r, g, b) = hsv_to_rgb(h, s, v);
                Some(Color::rgba(r, g, b, alpha_at(&tokens, 4)))
            }
            name => {
                let named = named(name)?;
                Some(match tokens.get(1).and_then(|t| component(t)) {
                    Some(a) => named.with_alpha(a),
                    None => named,
                })
            }
        }
    }

    /// Convenience: parse a whitespace-separated descriptor such as `"red"`.
    pub fn parse_str(descriptor: &str) -> Option<Color> {
        Color::parse(&super::tokenize(descriptor))
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// `#rgb` / `#rrggbb` into three integer tokens.
fn expand_hex(token: &str) -> Option<Vec<String>> {
    let hex = token.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let pairs: Vec<String> = match hex.len() {
        3 => hex.chars().map(|c| c.to_string().repeat(2)).collect(),
        6 => (0..3).map(|i| hex[i * 2..i * 2 + 2].to_string()).collect(),
        _ => return None,
    };
    pairs
        .iter()
        .map(|p| u8::from_str_radix(p, 16).ok().map(|v| v.to_string()))
        .collect()
}

pub(crate) fn is_integer(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

pub(crate) fn is_decimal(token: &str) -> bool {
    match token.split_once('.') {
        Some((int, frac)) => is_integer(int) && is_integer(frac),
        None => false,
    }
}

fn is_number(token: &str) -> bool {
    is_integer(token) || is_decimal(token)
}

/// Integers are 0-255 channel values, decimals are already fractions.
fn component(token: &str) -> Option<f64> {
    let value = if is_integer(token) {
        token.parse::<f64>().ok()? / 255.0
    } else if is_decimal(token) {
        token.parse::<f64>().ok()?
    } else {
        return None;
    };
    Some(value.clamp(0.0, 1.0))
}

fn components<const N: usize>(tokens: &[String]) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    if tokens.len() < N {
        return None;
    }
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = component(token)?;
    }
    Some(out)
}

fn alpha_at(tokens: &[String], index: usize) -> f64 {
    tokens.get(index).and_then(|t| component(t)).unwrap_or(1.0)
}

fn cmyk_to_rgb(c: f64, m: f64, y: f64, k: f64) -> (f64, f64, f64) {
    ((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
}

/// Hue is a fraction of a full turn.
fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s <= 0.0 {
        return (v, v, v);
    }
    let sector = (h.rem_euclid(1.0)) * 6.0;
    let i = sector.floor();
    let f = sector - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match i as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// Named colours come from the CSS colour table. `light_blue` and
/// `lightblue` are the same colour.
fn named(name: &str) -> Option<Color> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
        return None;
    }
    let name = name.replace('_', "");
    let [r, g, b, a] = csscolorparser::parse(&name).ok()?.to_rgba8();
    Some(Color::rgba(
        r as f64 / 255.0,
        g as f64 / 255.0,
        b as f64 / 255.0,
        a as f64 / 255.0,
    ))
}
