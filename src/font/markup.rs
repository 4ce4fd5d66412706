//! Minimal inline markup handling: `<b>`, `<span ...>` and friends are
//! dropped, entities are decoded. The bundled backends draw every run in the
//! paragraph's font.

/// Strip tags and decode the XML entities.
pub fn plain_text(markup: &str) -> String {
    if !markup.contains('<') && !markup.contains('&') {
        return markup.to_string();
    }

    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(pos) = rest.find(['<', '&']) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        if rest.starts_with('<') {
            match rest.find('>') {
                Some(end) => rest = &rest[end + 1..],
                None => {
                    // unterminated tag, keep it as text
                    out.push_str(rest);
                    rest = "";
                }
            }
        } else {
            match decode_entity(rest) {
                Some((ch, len)) => {
                    out.push(ch);
                    rest = &rest[len..];
                }
                None => {
                    out.push('&');
                    rest = &rest[1..];
                }
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode the entity at the start of `s`, returning it and its byte length.
fn decode_entity(s: &str) -> Option<(char, usize)> {
    let end = s.find(';')?;
    let name = &s[1..end];
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some((ch, end + 1))
}
