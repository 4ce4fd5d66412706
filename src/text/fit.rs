//! # Text Fitting
//!
//! Two ways to make text fit its box:
//!
//! - `crop_to`: keep at most N letters, words or sentences (or N lines).
//! - `to_fit`: an ordered list of stages run while the measured text is
//!   larger than its limits. A `crop` stage removes units from the end, a
//!   `resize` stage shrinks the font one point at a time.
//!
//! Every step re-measures through the backend. Cropping only ever shortens
//! the body, and the suffix (`"..."` by default) is added once something
//! has been removed.
//!
//! Descriptors are token lists, as strings or arrays:
//!
//! ```text
//! crop_to: "10"  "10 words"  "2 lines"  "1 line words"  [3, "sentences"]
//! to_fit:  "crop"  "resize"  "crop words"  "crop 10 resize"  "crop 2 resize 8 crop"
//! ```
//!
//! A number after `crop` is the unit count the stage stops at; after
//! `resize` it is the smallest point size.

use crate::backend::TextExtents;
use crate::error::Result;
use crate::paint::tokenize_value;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Measurements may overshoot a limit by this much before the text is
/// considered too large.
pub const FIT_TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CropUnit {
    #[default]
    Letters,
    Words,
    Sentences,
}

impl CropUnit {
    pub fn parse(word: &str) -> Option<CropUnit> {
        match word {
            "letter" | "letters" | "char" | "chars" => Some(CropUnit::Letters),
            "word" | "words" => Some(CropUnit::Words),
            "sentence" | "sentences" => Some(CropUnit::Sentences),
            _ => None,
        }
    }

    pub fn count(self, body: &str) -> usize {
        match self {
            CropUnit::Letters => body.chars().filter(|c| !c.is_whitespace()).count(),
            CropUnit::Words => body.split_whitespace().count(),
            CropUnit::Sentences => body
                .split(is_terminator)
                .filter(|s| !s.trim().is_empty())
                .count(),
        }
    }

    /// `body` without its last unit and without trailing whitespace. The
    /// result is always shorter than a non-empty body.
    pub fn remove_last(self, body: &str) -> String {
        let trimmed = body.trim_end();
        let kept = match self {
            CropUnit::Letters => {
                let mut chars = trimmed.chars();
                chars.next_back();
                chars.as_str()
            }
            CropUnit::Words => match trimmed.rfind(char::is_whitespace) {
                Some(i) => &trimmed[..i],
                None => "",
            },
            CropUnit::Sentences => {
                let open = trimmed.trim_end_matches(is_terminator);
                match open.rfind(is_terminator) {
                    // terminators are single-byte
                    Some(i) => &open[..=i],
                    None => "",
                }
            }
        };
        kept.trim_end().to_string()
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Keep at most `target` units, or `target` lines when `by_lines` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropTo {
    pub target: usize,
    pub unit: CropUnit,
    pub by_lines: bool,
}

impl CropTo {
    pub fn new(target: usize, unit: CropUnit) -> Self {
        Self {
            target,
            unit,
            by_lines: false,
        }
    }

    /// Crop until the text wraps to at most `lines` lines, removing `unit`s.
    pub fn lines(lines: usize, unit: CropUnit) -> Self {
        Self {
            target: lines,
            unit,
            by_lines: true,
        }
    }

    pub fn parse(descriptor: &str) -> Option<CropTo> {
        CropTo::from_tokens(&crate::paint::tokenize(descriptor))
    }

    fn from_tokens(tokens: &[String]) -> Option<CropTo> {
        let mut target = None;
        let mut crop = CropTo::new(0, CropUnit::default());
        for token in tokens {
            if let Some(n) = count(token) {
                target = Some(n);
            } else if token == "line" || token == "lines" {
                crop.by_lines = true;
            } else if let Some(unit) = CropUnit::parse(token) {
                crop.unit = unit;
            } else {
                return None;
            }
        }
        crop.target = target?;
        Some(crop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitStage {
    /// Remove units while the text is too large and more than `stop` remain.
    Crop { unit: CropUnit, stop: usize },
    /// Shrink the font while the text is too large, never below `min`
    /// (or 1pt).
    Resize { min: f64 },
}

impl FitStage {
    pub fn crop(unit: CropUnit) -> Self {
        FitStage::Crop { unit, stop: 0 }
    }

    pub fn resize() -> Self {
        FitStage::Resize { min: 1.0 }
    }

    pub fn parse_list(descriptor: &str) -> Vec<FitStage> {
        FitStage::from_tokens(&crate::paint::tokenize(descriptor))
    }

    fn from_tokens(tokens: &[String]) -> Vec<FitStage> {
        let mut stages: Vec<FitStage> = Vec::new();
        for token in tokens {
            match token.as_str() {
                "crop" => stages.push(FitStage::crop(CropUnit::default())),
                "resize" => stages.push(FitStage::resize()),
                other => match (stages.last_mut(), other.parse::<f64>().ok()) {
                    (Some(FitStage::Crop { stop, .. }), Some(n)) if n >= 0.0 => {
                        *stop = n as usize;
                    }
                    (Some(FitStage::Resize { min }), Some(n)) => *min = n,
                    (Some(FitStage::Crop { unit, .. }), None) => match CropUnit::parse(other) {
                        Some(u) => *unit = u,
                        None => log::warn!("ignoring fit token '{}'", other),
                    },
                    _ => log::warn!("ignoring fit token '{}'", other),
                },
            }
        }
        stages
    }
}

fn count(token: &str) -> Option<usize> {
    let n = token.parse::<f64>().ok()?;
    (n >= 0.0 && n.is_finite()).then_some(n as usize)
}

fn tokens(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    tokenize_value(value, &mut out);
    out
}

pub(crate) fn deserialize_crop_to<'de, D>(deserializer: D) -> std::result::Result<Option<CropTo>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    let crop = CropTo::from_tokens(&tokens(&value));
    if crop.is_none() {
        log::warn!("ignoring malformed crop_to {}", value);
    }
    Ok(crop)
}

pub(crate) fn deserialize_stages<'de, D>(deserializer: D) -> std::result::Result<Vec<FitStage>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(FitStage::from_tokens(&tokens(&Value::deserialize(deserializer)?)))
}

/// Largest size the text may measure, per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Limits {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl Limits {
    pub fn exceeded(&self, extents: &TextExtents) -> bool {
        self.width.is_some_and(|w| extents.width > w + FIT_TOLERANCE)
            || self.height.is_some_and(|h| extents.height > h + FIT_TOLERANCE)
    }
}

/// Text being fitted: the body left after cropping and the current size.
#[derive(Debug, Clone, PartialEq)]
pub struct FitState {
    pub body: String,
    pub cropped: bool,
    pub size: f64,
}

impl FitState {
    pub fn new(body: &str, size: f64) -> Self {
        Self {
            body: body.to_string(),
            cropped: false,
            size,
        }
    }

    /// The text to lay out, suffixed once anything was cropped.
    pub fn markup(&self, suffix: &str) -> String {
        if self.cropped {
            format!("{}{}", self.body, suffix)
        } else {
            self.body.clone()
        }
    }

    fn remove_last(&mut self, unit: CropUnit) -> bool {
        if self.body.is_empty() {
            return false;
        }
        self.body = unit.remove_last(&self.body);
        self.cropped = true;
        true
    }

    pub fn crop_to<F>(&mut self, crop: &CropTo, suffix: &str, measure: &mut F) -> Result<()>
    where
        F: FnMut(&str, f64) -> Result<TextExtents>,
    {
        loop {
            let satisfied = if crop.by_lines {
                measure(&self.markup(suffix), self.size)?.line_count <= crop.target
            } else {
                crop.unit.count(&self.body) <= crop.target
            };
            if satisfied || !self.remove_last(crop.unit) {
                return Ok(());
            }
            log::trace!("crop_to: body now {:?}", self.body);
        }
    }

    pub fn to_fit<F>(
        &mut self,
        stages: &[FitStage],
        limits: &Limits,
        suffix: &str,
        measure: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&str, f64) -> Result<TextExtents>,
    {
        for stage in stages {
            match *stage {
                FitStage::Crop { unit, stop } => loop {
                    if unit.count(&self.body) <= stop {
                        break;
                    }
                    let extents = measure(&self.markup(suffix), self.size)?;
                    if !limits.exceeded(&extents) || !self.remove_last(unit) {
                        break;
                    }
                    log::trace!("to_fit crop: body now {:?}", self.body);
                },
                FitStage::Resize { min } => {
                    let floor = min.max(1.0);
                    while self.size > floor {
                        let extents = measure(&self.markup(suffix), self.size)?;
                        if !limits.exceeded(&extents) {
                            break;
                        }
                        self.size = (self.size - 1.0).max(floor);
                        log::trace!("to_fit resize: size now {}", self.size);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 5px per char, 10px lines, wrapping at `wrap` chars.
    fn fixed_metrics(wrap: usize) -> impl FnMut(&str, f64) -> Result<TextExtents> {
        move |text: &str, size: f64| {
            let chars = text.chars().count();
            let per_line = wrap.max(1);
            let lines = chars.div_ceil(per_line).max(1);
            Ok(TextExtents {
                width: chars.min(per_line) as f64 * size / 2.0,
                height: lines as f64 * size,
                line_count: lines,
            })
        }
    }

    #[test]
    fn test_unit_counts() {
        assert_eq!(CropUnit::Letters.count("ab c"), 3);
        assert_eq!(CropUnit::Words.count("  one two  three "), 3);
        assert_eq!(CropUnit::Sentences.count("Hi. How are you? Fine!"), 3);
        assert_eq!(CropUnit::Sentences.count("No terminator"), 1);
    }

    #[test]
    fn test_remove_last_unit() {
        assert_eq!(CropUnit::Letters.remove_last("ab c "), "ab");
        assert_eq!(CropUnit::Words.remove_last("one two three"), "one two");
        assert_eq!(CropUnit::Words.remove_last("single"), "");
        assert_eq!(
            CropUnit::Sentences.remove_last("Hi. How are you? Fine!"),
            "Hi. How are you?"
        );
        assert_eq!(CropUnit::Sentences.remove_last("Only one."), "");
    }

    #[test]
    fn test_parse_crop_to() {
        assert_eq!(CropTo::parse("10"), Some(CropTo::new(10, CropUnit::Letters)));
        assert_eq!(CropTo::parse("3 words"), Some(CropTo::new(3, CropUnit::Words)));
        assert_eq!(CropTo::parse("2 lines"), Some(CropTo::lines(2, CropUnit::Letters)));
        assert_eq!(CropTo::parse("1 line words"), Some(CropTo::lines(1, CropUnit::Words)));
        assert_eq!(CropTo::parse("words"), None);
        assert_eq!(CropTo::parse("3 bananas"), None);
    }

    #[test]
    fn test_parse_stages() {
        assert_eq!(
            FitStage::parse_list("crop 2 resize 8 crop words"),
            vec![
                FitStage::Crop {
                    unit: CropUnit::Letters,
                    stop: 2
                },
                FitStage::Resize { min: 8.0 },
                FitStage::crop(CropUnit::Words),
            ]
        );
        assert_eq!(FitStage::parse_list("resize"), vec![FitStage::resize()]);
    }

    #[test]
    fn test_crop_to_words_is_idempotent() {
        let crop = CropTo::new(2, CropUnit::Words);
        let mut measure = fixed_metrics(100);
        let mut state = FitState::new("one two three four", 10.0);
        state.crop_to(&crop, "...", &mut measure).unwrap();
        assert_eq!(state.markup("..."), "one two...");

        let before = state.clone();
        state.crop_to(&crop, "...", &mut measure).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_no_suffix_without_cropping() {
        let mut state = FitState::new("short", 10.0);
        state
            .crop_to(&CropTo::new(10, CropUnit::Letters), "...", &mut fixed_metrics(100))
            .unwrap();
        assert_eq!(state.markup("..."), "short");
    }

    #[test]
    fn test_crop_to_lines() {
        // 4 chars per line; "aaaa bbbb cccc" needs 4 lines with the suffix
        let mut state = FitState::new("aaaa bbbb cccc", 10.0);
        state
            .crop_to(&CropTo::lines(2, CropUnit::Words), "..", &mut fixed_metrics(4))
            .unwrap();
        assert_eq!(state.body, "aaaa");
        assert_eq!(state.markup(".."), "aaaa..");
    }

    #[test]
    fn test_crop_to_terminates_on_empty_body() {
        let mut state = FitState::new("a b", 10.0);
        state
            .crop_to(&CropTo::lines(0, CropUnit::Letters), "", &mut fixed_metrics(1))
            .unwrap();
        assert_eq!(state.body, "");
    }

    #[test]
    fn test_crop_stage_until_width_fits() {
        let limits = Limits {
            width: Some(30.0),
            height: None,
        };
        let mut state = FitState::new("abcdefghij", 10.0);
        state
            .to_fit(&[FitStage::crop(CropUnit::Letters)], &limits, ".", &mut fixed_metrics(100))
            .unwrap();
        // 5 chars including the suffix fit in 30 + tolerance
        assert_eq!(state.markup("."), "abcde.");
        assert!(state.markup(".").chars().count() * 5 <= 30);
    }

    #[test]
    fn test_crop_stage_respects_stop() {
        let limits = Limits {
            width: Some(5.0),
            height: None,
        };
        let stage = FitStage::Crop {
            unit: CropUnit::Words,
            stop: 2,
        };
        let mut state = FitState::new("one two three four", 10.0);
        state.to_fit(&[stage], &limits, "", &mut fixed_metrics(100)).unwrap();
        assert_eq!(state.body, "one two");
    }

    #[test]
    fn test_resize_never_below_floor() {
        let limits = Limits {
            width: Some(1.0),
            height: None,
        };
        let mut state = FitState::new("wide text", 20.0);
        state
            .to_fit(&[FitStage::Resize { min: 8.0 }], &limits, "", &mut fixed_metrics(100))
            .unwrap();
        assert_eq!(state.size, 8.0);

        let mut state = FitState::new("wide text", 4.0);
        state
            .to_fit(&[FitStage::Resize { min: 0.0 }], &limits, "", &mut fixed_metrics(100))
            .unwrap();
        assert_eq!(state.size, 1.0);
    }

    #[test]
    fn test_resize_stops_when_it_fits() {
        let limits = Limits {
            width: Some(40.0),
            height: None,
        };
        // 10 chars at size/2 each: fits once size <= 8
        let mut state = FitState::new("abcdefghij", 12.0);
        state
            .to_fit(&[FitStage::resize()], &limits, "", &mut fixed_metrics(100))
            .unwrap();
        assert_eq!(state.size, 8.0);
    }

    #[test]
    fn test_deserialize_descriptors() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "deserialize_crop_to")]
            crop_to: Option<CropTo>,
            #[serde(default, deserialize_with = "deserialize_stages")]
            to_fit: Vec<FitStage>,
        }
        let h: Holder =
            serde_json::from_str(r#"{"crop_to": [1, "line", "letters"], "to_fit": ["crop", 10, "resize"]}"#)
                .unwrap();
        assert_eq!(h.crop_to, Some(CropTo::lines(1, CropUnit::Letters)));
        assert_eq!(
            h.to_fit,
            vec![
                FitStage::Crop {
                    unit: CropUnit::Letters,
                    stop: 10
                },
                FitStage::resize()
            ]
        );
        let bad: Holder = serde_json::from_str(r#"{"crop_to": "lots"}"#).unwrap();
        assert_eq!(bad.crop_to, None);
    }
}
