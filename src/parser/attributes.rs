//! Block attribute syntax: `{#id .class1 .class2 key1=val1 key2="val2"}`.
//!
//! Rules:
//! - Surrounded by `{ }`, trailing the heading text
//! - Identifier: `#id` (only the first one counts)
//! - Classes: `.class`, any number, joined with spaces under `class`
//! - Key-value pairs: `key=value`, `key="value"` or `key='value'`
//! - Whitespace flexible between items

use crate::ast::Attributes;

/// Splits trailing attributes off `text`.
///
/// Returns the byte length of the text before the attribute block (trailing
/// whitespace excluded) and the parsed attributes.
pub fn parse_trailing_attributes(text: &str) -> Option<(usize, Attributes)> {
    let trimmed = text.trim_end();
    if !trimmed.ends_with('}') {
        return None;
    }
    let open_brace = trimmed.rfind('{')?;
    if open_brace > 0 && !trimmed[..open_brace].ends_with([' ', '\t']) {
        log::trace!("Attribute block not separated by whitespace: {}", text);
        return None;
    }
    let attributes = parse_attribute_content(&trimmed[open_brace + 1..trimmed.len() - 1])?;
    let before = trimmed[..open_brace].trim_end();
    Some((before.len(), attributes))
}

/// Parses the content between the braces.
fn parse_attribute_content(content: &str) -> Option<Attributes> {
    let mut attributes = Attributes::default();
    let mut classes: Vec<&str> = Vec::new();

    let content = content.trim();
    if content.is_empty() {
        return None;
    }

    let bytes = content.as_bytes();
    let mut pos = 0;
    let word_end = |mut pos: usize| {
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        pos
    };

    while pos < bytes.len() {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        match bytes[pos] {
            b'#' => {
                let end = word_end(pos + 1);
                if end == pos + 1 {
                    return None;
                }
                if !attributes.contains("id") {
                    attributes.set("id", &content[pos + 1..end]);
                }
                pos = end;
            }
            b'.' => {
                let end = word_end(pos + 1);
                if end == pos + 1 {
                    return None;
                }
                classes.push(&content[pos + 1..end]);
                pos = end;
            }
            _ => {
                let key_start = pos;
                while pos < bytes.len() && bytes[pos] != b'=' && !bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                if pos >= bytes.len() || bytes[pos] != b'=' || pos == key_start {
                    return None;
                }
                let key = &content[key_start..pos];
                pos += 1;

                let value = if pos < bytes.len() && (bytes[pos] == b'"' || bytes[pos] == b'\'') {
                    let quote = bytes[pos];
                    let start = pos + 1;
                    let len = content[start..].bytes().position(|b| b == quote)?;
                    pos = start + len + 1;
                    &content[start..start + len]
                } else {
                    let start = pos;
                    pos = word_end(pos);
                    &content[start..pos]
                };
                attributes.set(key, value);
            }
        }
    }

    if !classes.is_empty() {
        attributes.set("class", classes.join(" "));
    }
    if attributes.is_empty() {
        return None;
    }
    Some(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(attrs: &Attributes) -> Vec<(&str, &str)> {
        attrs.iter().collect()
    }

    #[test]
    fn test_identifier_only() {
        let (len, attrs) = parse_trailing_attributes("Heading {#my-id}").unwrap();
        assert_eq!(len, "Heading".len());
        assert_eq!(pairs(&attrs), vec![("id", "my-id")]);
    }

    #[test]
    fn test_classes_and_key_values() {
        let (_, attrs) =
            parse_trailing_attributes("Title {.a .b key=val data=\"x y\"}").unwrap();
        assert_eq!(
            pairs(&attrs),
            vec![("key", "val"), ("data", "x y"), ("class", "a b")]
        );
    }

    #[test]
    fn test_only_first_identifier_counts() {
        let (_, attrs) = parse_trailing_attributes("x {#one #two}").unwrap();
        assert_eq!(attrs.get("id"), Some("one"));
    }

    #[test]
    fn test_rejects_malformed_blocks() {
        assert!(parse_trailing_attributes("Heading {}").is_none());
        assert!(parse_trailing_attributes("Heading {bare}").is_none());
        assert!(parse_trailing_attributes("Heading{#id}").is_none());
        assert!(parse_trailing_attributes("Heading").is_none());
        assert!(parse_trailing_attributes("x {k=\"open}").is_none());
    }

    #[test]
    fn test_block_alone() {
        let (len, attrs) = parse_trailing_attributes("{#only}").unwrap();
        assert_eq!(len, 0);
        assert_eq!(attrs.get("id"), Some("only"));
    }
}
