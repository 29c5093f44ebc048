//! Byte classification, indentation arithmetic and escaping helpers shared by
//! the parsers and renderers.

use std::borrow::Cow;

/// Whitespace as CommonMark treats it at the byte level.
pub fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// ASCII punctuation, the set a backslash can escape.
pub fn is_punct(b: u8) -> bool {
    b.is_ascii_punctuation()
}

/// Punctuation for emphasis flanking rules, including non-ASCII symbols.
pub fn is_unicode_punct(c: char) -> bool {
    c.is_ascii_punctuation() || (!c.is_ascii() && !c.is_alphanumeric() && !c.is_whitespace())
}

pub fn is_blank(s: &str) -> bool {
    s.bytes().all(is_space)
}

/// Width and byte length of the leading indentation of `line`, where `column`
/// is the visual column `line` starts at.
pub fn indent_width(line: &str, column: usize) -> (usize, usize) {
    let mut width = 0;
    let mut bytes = 0;
    for b in line.bytes() {
        match b {
            b' ' => width += 1,
            b'\t' => width += 4 - (column + width) % 4,
            _ => break,
        }
        bytes += 1;
    }
    (width, bytes)
}

/// Byte position at which `width` columns of indentation have been consumed,
/// and the columns of a partially consumed tab left over as padding.
pub fn indent_position(line: &str, column: usize, width: usize) -> Option<(usize, usize)> {
    if width == 0 {
        return Some((0, 0));
    }
    let mut w: usize = 0;
    let mut i = 0;
    for b in line.bytes() {
        if w >= width {
            break;
        }
        match b {
            b'\t' => w += 4 - (column + w) % 4,
            b' ' => w += 1,
            _ => break,
        }
        i += 1;
    }
    w.checked_sub(width).map(|pad| (i, pad))
}

pub fn trim_right_space(s: &str) -> &str {
    s.trim_end_matches(|c: char| c.is_ascii() && is_space(c as u8))
}

/// Normalizes a link label: Unicode case fold, collapse internal whitespace
/// runs to one space, trim.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .to_uppercase()
        .to_lowercase()
}

/// Resolves backslash escapes and entity references.
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains(['\\', '&']) {
        return Cow::Borrowed(s);
    }
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() && is_punct(bytes[i + 1]) => {
                out.push_str(&s[last..i]);
                out.push(bytes[i + 1] as char);
                i += 2;
                last = i;
            }
            b'&' => {
                if let Some((decoded, len)) = parse_entity(&s[i..]) {
                    out.push_str(&s[last..i]);
                    out.push_str(&decoded);
                    i += len;
                    last = i;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    out.push_str(&s[last..]);
    Cow::Owned(out)
}

/// Parses an entity or numeric character reference at the start of `s`,
/// returning its text and byte length.
fn parse_entity(s: &str) -> Option<(String, usize)> {
    let end = s.find(';')?;
    let body = &s[1..end];
    if let Some(num) = body.strip_prefix('#') {
        let (digits, radix) = match num.strip_prefix(['x', 'X']) {
            Some(hex) if (1..=6).contains(&hex.len()) => (hex, 16),
            None if (1..=7).contains(&num.len()) => (num, 10),
            _ => return None,
        };
        if !digits.chars().all(|c| c.is_digit(radix)) {
            return None;
        }
        let code = u32::from_str_radix(digits, radix).ok()?;
        let c = match char::from_u32(code) {
            Some(c) if code != 0 => c,
            _ => char::REPLACEMENT_CHARACTER,
        };
        return Some((c.to_string(), end + 1));
    }
    if body.is_empty() || body.len() > 32 || !body.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    named_entity(body).map(|value| (value.to_string(), end + 1))
}

fn named_entity(name: &str) -> Option<&'static str> {
    let value = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "copy" => "©",
        "reg" => "®",
        "trade" => "™",
        "hellip" => "…",
        "mdash" => "—",
        "ndash" => "–",
        "lsquo" => "‘",
        "rsquo" => "’",
        "ldquo" => "“",
        "rdquo" => "”",
        "laquo" => "«",
        "raquo" => "»",
        "middot" => "·",
        "bull" => "•",
        "deg" => "°",
        "plusmn" => "±",
        "times" => "×",
        "divide" => "÷",
        "frac12" => "½",
        "frac14" => "¼",
        "frac34" => "¾",
        "para" => "¶",
        "sect" => "§",
        "cent" => "¢",
        "pound" => "£",
        "yen" => "¥",
        "euro" => "€",
        "auml" => "ä",
        "ouml" => "ö",
        "uuml" => "ü",
        "Auml" => "Ä",
        "Ouml" => "Ö",
        "Uuml" => "Ü",
        "szlig" => "ß",
        "eacute" => "é",
        "egrave" => "è",
        "agrave" => "à",
        "ccedil" => "ç",
        "ntilde" => "ñ",
        "AElig" => "Æ",
        "Dcaron" => "Ď",
        "HilbertSpace" => "ℋ",
        "DifferentialD" => "ⅆ",
        "ClockwiseContourIntegral" => "∲",
        "ngE" => "≧̸",
        _ => return None,
    };
    Some(value)
}

/// Escapes `&`, `<`, `>` and `"` for HTML output.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Percent-encodes a URL for an HTML attribute, leaving existing escapes and
/// URL-safe characters alone.
pub fn url_escape(url: &str) -> String {
    const SAFE: &[u8] = b"-_.!~*'();/?:@&=+$,%#[]";
    let mut out = String::with_capacity(url.len());
    let mut buf = [0u8; 4];
    for c in url.chars() {
        if c.is_ascii_alphanumeric() || (c.is_ascii() && SAFE.contains(&(c as u8))) {
            out.push(c);
        } else {
            for b in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{b:02X}"));
            }
        }
    }
    out
}
