//! Tag and attribute-list parsing
//!
//! Parses a start or end tag from the token stream when the tokenizer's
//! fast path fails. The tag body is joined into a working buffer up to the
//! optimistically-chosen `>` token; a quoted value with no closing quote
//! extends the buffer across further `>` tokens until the quote closes.
//!
//! Attribute extraction is deliberately permissive: garbage between
//! attributes is skipped one char at a time, values may be double-quoted,
//! single-quoted, or bare, and a valueless attribute takes its own name as
//! value (HTML boolean convention).

use memchr::memchr;

use super::entities::{strip_nuls, unescape_entities};
use super::scanner::Token;
use crate::schema::{ElementFlags, ELEMENTS};

/// A parsed attribute.
///
/// `value: None` means the attribute has been suppressed by policy and
/// must not be serialized. The parser itself always produces `Some`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// Attribute name, ASCII-lowercased
    pub name: String,
    /// Attribute value, entities decoded; `None` once policy deletes it
    pub value: Option<String>,
}

impl Attr {
    /// Create an attribute with a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attr {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// A tag parsed from the token stream.
pub(crate) struct ParsedTag {
    /// Element name, ASCII-lowercased
    pub name: String,
    /// Schema flags; `None` means the element is unknown and its events
    /// are suppressed
    pub flags: Option<ElementFlags>,
    /// Attributes in input order
    pub attrs: Vec<Attr>,
    /// Cursor position just past the closing `>` token
    pub next: usize,
}

/// Length of the leading `\w+` run.
#[inline]
fn word_run(s: &str) -> usize {
    s.bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count()
}

/// Parse a tag whose name starts at `parts[pos]`.
///
/// Returns `None` when end-of-input is reached before the tag closes; the
/// tokenizer then drops the tag and consumes the rest of the input.
pub(crate) fn parse_tag(parts: &[Token<'_>], pos: usize) -> Option<ParsedTag> {
    let first = parts[pos].text();
    let name_len = word_run(first);
    debug_assert!(name_len > 0, "tag parser entered without a leading name");
    let name = first[..name_len].to_ascii_lowercase();
    let flags = ELEMENTS.get(name.as_str()).copied();

    // Optimistically assume the next `>` token is not inside a quoted
    // value; the unterminated-quote rule below extends the buffer when
    // that turns out wrong.
    let mut buf = String::from(&first[name_len..]);
    let mut p = pos + 1;
    while p < parts.len() && parts[p] != Token::Gt {
        buf.push_str(parts[p].as_str());
        p += 1;
    }
    if p >= parts.len() {
        return None;
    }

    let mut attrs = Vec::new();
    while !buf.is_empty() {
        match match_attr(&buf) {
            AttrMatch::NoMatch => skip_garbage(&mut buf),
            AttrMatch::Unterminated(quote) => {
                // The value straddles `>` tokens. Append the `>` we stopped
                // at, scan for a token containing the open quote, then keep
                // appending until the next `>`; re-run attribute matching
                // against the extended buffer.
                buf.push_str(parts[p].as_str());
                p += 1;
                let mut saw_quote = false;
                while p < parts.len() {
                    if saw_quote {
                        if parts[p] == Token::Gt {
                            break;
                        }
                    } else if parts[p].as_str().contains(quote) {
                        saw_quote = true;
                    }
                    buf.push_str(parts[p].as_str());
                    p += 1;
                }
                if p >= parts.len() {
                    return None;
                }
            }
            AttrMatch::Attr {
                name,
                value,
                consumed,
            } => {
                attrs.push(Attr {
                    name,
                    value: Some(value),
                });
                buf.drain(..consumed);
            }
        }
    }

    Some(ParsedTag {
        name,
        flags,
        attrs,
        next: p + 1,
    })
}

enum AttrMatch {
    /// Nothing attribute-like at the start of the buffer
    NoMatch,
    /// A quoted value opened with this quote char and never closed
    Unterminated(char),
    /// A complete attribute occupying `consumed` leading bytes
    Attr {
        name: String,
        value: String,
        consumed: usize,
    },
}

/// Match one attribute at the start of the buffer.
///
/// Grammar: `\s* NAME (\s* = \s* VALUE)?` with NAME `[A-Za-z][A-Za-z-]*`
/// and VALUE one of `"…"`, `'…'`, a lookahead-empty run when the next
/// thing is itself `NAME\s*=`, or a bare `[^"'\s]*` run.
fn match_attr(buf: &str) -> AttrMatch {
    let b = buf.as_bytes();
    let mut i = 0;
    while i < b.len() && b[i].is_ascii_whitespace() {
        i += 1;
    }
    if i >= b.len() || !b[i].is_ascii_alphabetic() {
        return AttrMatch::NoMatch;
    }
    let name_start = i;
    i += 1;
    while i < b.len() && (b[i].is_ascii_alphabetic() || b[i] == b'-') {
        i += 1;
    }
    let name = buf[name_start..i].to_ascii_lowercase();

    let mut j = i;
    while j < b.len() && b[j].is_ascii_whitespace() {
        j += 1;
    }
    if j >= b.len() || b[j] != b'=' {
        // bare attribute
        return AttrMatch::Attr {
            value: name.clone(),
            name,
            consumed: i,
        };
    }
    j += 1;
    while j < b.len() && b[j].is_ascii_whitespace() {
        j += 1;
    }

    if j < b.len() && (b[j] == b'"' || b[j] == b'\'') {
        let quote = b[j];
        return match memchr(quote, &b[j + 1..]) {
            Some(off) => AttrMatch::Attr {
                name,
                value: decode_value(&buf[j + 1..j + 1 + off]),
                consumed: j + off + 2,
            },
            None => AttrMatch::Unterminated(quote as char),
        };
    }

    if lookahead_is_attr_eq(&buf[j..]) {
        // `<p a= b=c>` parses as a valueless `a` followed by `b=c`, not
        // as `a="b=c"`
        return AttrMatch::Attr {
            value: name.clone(),
            name,
            consumed: j,
        };
    }

    let mut k = j;
    while k < b.len() && !b[k].is_ascii_whitespace() && b[k] != b'"' && b[k] != b'\'' {
        k += 1;
    }
    AttrMatch::Attr {
        name,
        value: decode_value(&buf[j..k]),
        consumed: k,
    }
}

/// Does the buffer start with `NAME \s* =`, for NAME `[A-Za-z][A-Za-z-]*`?
fn lookahead_is_attr_eq(s: &str) -> bool {
    let b = s.as_bytes();
    if b.is_empty() || !b[0].is_ascii_alphabetic() {
        return false;
    }
    let mut i = 1;
    while i < b.len() && (b[i].is_ascii_alphabetic() || b[i] == b'-') {
        i += 1;
    }
    while i < b.len() && b[i].is_ascii_whitespace() {
        i += 1;
    }
    i < b.len() && b[i] == b'='
}

/// Drop the first char plus any following non-letter, non-space run.
fn skip_garbage(buf: &mut String) {
    let mut cut = buf.len();
    let mut iter = buf.char_indices();
    iter.next();
    for (idx, c) in iter {
        if c.is_ascii_alphabetic() || c.is_ascii_whitespace() {
            cut = idx;
            break;
        }
    }
    buf.drain(..cut);
}

fn decode_value(raw: &str) -> String {
    let stripped = strip_nuls(raw);
    unescape_entities(&stripped).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::split;

    fn tag(html: &str) -> Option<ParsedTag> {
        let parts = split(html);
        // parts[1] is the `<` separator; the tag body starts at parts[2]
        assert_eq!(parts[1], Token::Lt);
        parse_tag(&parts, 2)
    }

    #[test]
    fn test_simple_attributes() {
        let t = tag("<a href=\"http://x/\" title=ok>").unwrap();
        assert_eq!(t.name, "a");
        assert_eq!(
            t.attrs,
            vec![Attr::new("href", "http://x/"), Attr::new("title", "ok")]
        );
    }

    #[test]
    fn test_name_and_attr_lowercased() {
        let t = tag("<IMG SRC='x'>").unwrap();
        assert_eq!(t.name, "img");
        assert_eq!(t.attrs, vec![Attr::new("src", "x")]);
    }

    #[test]
    fn test_bare_attribute_takes_own_name() {
        let t = tag("<input checked>").unwrap();
        assert_eq!(t.attrs, vec![Attr::new("checked", "checked")]);
    }

    #[test]
    fn test_lookahead_keeps_next_attribute() {
        let t = tag("<p a= b=c>").unwrap();
        assert_eq!(t.attrs, vec![Attr::new("a", "a"), Attr::new("b", "c")]);
    }

    #[test]
    fn test_lookahead_rejects_digit_names() {
        // `a1` is not a NAME, so the lookahead fails and `a1=b` is the
        // plain unquoted value of `x`
        let t = tag("<p x=a1=b>").unwrap();
        assert_eq!(t.attrs, vec![Attr::new("x", "a1=b")]);
    }

    #[test]
    fn test_value_entities_decoded() {
        let t = tag("<a title=\"a&lt;b&#x26;c\">").unwrap();
        assert_eq!(t.attrs, vec![Attr::new("title", "a<b&c")]);
    }

    #[test]
    fn test_nuls_stripped_before_decode() {
        let t = tag("<a title=\"ja\0va\">").unwrap();
        assert_eq!(t.attrs, vec![Attr::new("title", "java")]);
    }

    #[test]
    fn test_garbage_skipped() {
        let t = tag("<p ~~@ align=center>").unwrap();
        assert_eq!(t.attrs, vec![Attr::new("align", "center")]);
    }

    #[test]
    fn test_unterminated_quote_slurps_past_gt() {
        let parts = split("<p title='>>>'>t</p>");
        let t = parse_tag(&parts, 2).unwrap();
        assert_eq!(t.attrs, vec![Attr::new("title", ">>>")]);
        // cursor lands just past the `>` that really closes the tag
        assert_eq!(parts[t.next], Token::Text("t"));
    }

    #[test]
    fn test_unterminated_quote_at_eof_fails() {
        let parts = split("<p title='never closed>");
        assert!(parse_tag(&parts, 2).is_none());
    }

    #[test]
    fn test_missing_gt_fails() {
        let parts = split("<p align=center");
        assert!(parse_tag(&parts, 2).is_none());
    }

    #[test]
    fn test_unknown_element_has_no_flags() {
        let t = tag("<blink rate=2>").unwrap();
        assert!(t.flags.is_none());
        assert_eq!(t.attrs, vec![Attr::new("rate", "2")]);
    }

    #[test]
    fn test_empty_unquoted_value() {
        let t = tag("<a href=>").unwrap();
        assert_eq!(t.attrs, vec![Attr::new("href", "")]);
    }
}
