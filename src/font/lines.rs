//! Greedy line breaking at UAX#14 opportunities.

use super::FontBook;
use crate::text::FontSpec;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    /// Advance of each character, parallel to `text.chars()`.
    pub advances: Vec<f64>,
    /// Width without trailing spaces, including any indent.
    pub width: f64,
    /// Leading indent (first line only).
    pub indent: f64,
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Each entry is the break opportunity *before* that character. Index 0 is
/// always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() yields the byte offset AFTER the break, i.e. the start of
    // the next segment.
    let byte_to_char: Vec<usize> = {
        let mut map = vec![0usize; text.len() + 1];
        let mut char_idx = 0;
        for (byte_idx, _) in text.char_indices() {
            map[byte_idx] = char_idx;
            char_idx += 1;
        }
        map[text.len()] = char_idx;
        map
    };

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Break `text` into lines no wider than `max_width` (unbounded when
/// `None`). Words wider than a whole line are split between characters.
pub fn break_lines(
    book: &FontBook,
    font: &FontSpec,
    text: &str,
    max_width: Option<f64>,
    indent: f64,
) -> Vec<Line> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![make_line(&[], &[], indent)];
    }

    let widths: Vec<f64> = chars.iter().map(|&c| book.char_width(font, c)).collect();
    let break_opps = compute_break_opportunities(text);
    let limit = max_width.unwrap_or(f64::INFINITY);

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_width = indent;
    let mut last_break_point: Option<usize> = None;

    let current_indent = |lines: &Vec<Line>| if lines.is_empty() { indent } else { 0.0 };

    for (i, &ch) in chars.iter().enumerate() {
        if i > 0 {
            match break_opps[i] {
                Some(BreakOpportunity::Mandatory) => {
                    let end = trim_newlines(&chars, line_start, i);
                    let ind = current_indent(&lines);
                    lines.push(make_line(&chars[line_start..end], &widths[line_start..end], ind));
                    line_start = i;
                    line_width = 0.0;
                    last_break_point = None;
                }
                Some(BreakOpportunity::Allowed) => last_break_point = Some(i - 1),
                None => {}
            }
        }

        if is_newline(ch) {
            continue;
        }

        let char_width = widths[i];
        // Spaces may hang past the edge; they never start a line
        if line_width + char_width > limit && line_start < i && ch != ' ' {
            let ind = current_indent(&lines);
            match last_break_point.filter(|bp| *bp >= line_start) {
                Some(bp) => {
                    let break_at = bp + 1;
                    lines.push(make_line(
                        &chars[line_start..break_at],
                        &widths[line_start..break_at],
                        ind,
                    ));
                    line_start = break_at;
                    line_width = widths[line_start..=i].iter().sum();
                }
                None => {
                    lines.push(make_line(&chars[line_start..i], &widths[line_start..i], ind));
                    line_start = i;
                    line_width = char_width;
                }
            }
            last_break_point = None;
            continue;
        }

        line_width += char_width;
    }

    let end = trim_newlines(&chars, line_start, chars.len());
    let ind = current_indent(&lines);
    lines.push(make_line(&chars[line_start..end], &widths[line_start..end], ind));
    if end < chars.len() {
        lines.push(make_line(&[], &[], 0.0));
    }

    lines
}

/// End of the line content before any line terminator characters.
fn trim_newlines(chars: &[char], start: usize, mut end: usize) -> usize {
    while end > start && is_newline(chars[end - 1]) {
        end -= 1;
    }
    end
}

fn make_line(chars: &[char], widths: &[f64], indent: f64) -> Line {
    let mut width: f64 = widths.iter().sum();

    // Trailing spaces do not count towards the line width
    let mut i = chars.len();
    while i > 0 && chars[i - 1] == ' ' {
        i -= 1;
        width -= widths[i];
    }

    Line {
        text: chars.iter().collect(),
        advances: widths.to_vec(),
        width: width + indent,
        indent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str, max_width: Option<f64>) -> Vec<Line> {
        break_lines(&FontBook::new(), &FontSpec::parse("10"), text, max_width, 0.0)
    }

    #[test]
    fn test_single_line() {
        let result = lines("Hello", Some(200.0));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, "Hello");
    }

    #[test]
    fn test_line_break_at_space() {
        let result = lines("Hello World", Some(40.0));
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "Hello ");
        assert_eq!(result[1].text, "World");
    }

    #[test]
    fn test_explicit_newline() {
        let result = lines("Hello\nWorld", None);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "Hello");
        assert_eq!(result[1].text, "World");
    }

    #[test]
    fn test_trailing_newline_opens_empty_line() {
        let result = lines("abc\r\n", None);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "abc");
        assert_eq!(result[1].text, "");
    }

    #[test]
    fn test_empty_string() {
        let result = lines("", Some(200.0));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].width, 0.0);
    }

    #[test]
    fn test_long_word_is_split() {
        // 10 chars at 5px each, 22px lines hold 4 chars
        let result = lines("aaaaaaaaaa", Some(22.0));
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|l| l.width <= 22.0));
    }

    #[test]
    fn test_indent_applies_to_first_line_only() {
        let book = FontBook::new();
        let font = FontSpec::parse("10");
        let result = break_lines(&book, &font, "aaaa aaaa", Some(30.0), 8.0);
        assert_eq!(result.len(), 2);
        assert!((result[0].width - 28.0).abs() < 0.001);
        assert_eq!(result[1].indent, 0.0);
    }
}
