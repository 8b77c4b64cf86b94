//! SAX emitter over the split token stream
//!
//! Walks the splitter's tokens with a monotonically advancing cursor and
//! pushes events into a [`SaxHandler`]. Never fails: every malformed
//! construct either degrades to escaped pcdata or is skipped.
//!
//! Two latches bound the lookahead cost on adversarial input: once a scan
//! for a comment terminator (or for any `>`, shared by bogus declarations
//! and processing instructions) has run off the end of the input, every
//! later occurrence short-circuits to its literal escape instead of
//! rescanning. Each potentially quadratic pattern thus costs at most one
//! full scan.

use super::attributes::parse_tag;
use super::entities::{match_entity, normalize_rcdata};
use super::scanner::{split, Token};
use crate::sax::SaxHandler;
use crate::schema::{ElementFlags, ELEMENTS};

pub(crate) struct Tokenizer<'a> {
    parts: Vec<Token<'a>>,
    pos: usize,
    no_more_gt: bool,
    no_more_end_comments: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(html: &'a str) -> Self {
        Tokenizer {
            parts: split(html),
            pos: 0,
            no_more_gt: false,
            no_more_end_comments: false,
        }
    }

    /// Emit the full event stream for the input.
    pub fn run<H: SaxHandler>(&mut self, handler: &mut H) {
        handler.start_doc();
        while self.pos < self.parts.len() {
            let current = self.parts[self.pos];
            self.pos += 1;
            match current {
                Token::Text(t) => {
                    if !t.is_empty() {
                        handler.pcdata(t);
                    }
                }
                Token::Amp => self.entity(handler),
                Token::LtSlash => self.end_tag_open(handler),
                Token::Lt => self.start_tag_open(handler),
                Token::LtBangDashDash => self.comment(handler),
                Token::LtBang => self.declaration(handler),
                Token::LtQuestion => self.skip_to_gt(handler, "&lt;?"),
                Token::Gt => handler.pcdata("&gt;"),
            }
        }
        handler.end_doc();
    }

    /// The text token following the separator just consumed.
    #[inline]
    fn next_text(&self) -> &'a str {
        self.parts.get(self.pos).map(|t| t.text()).unwrap_or("")
    }

    /// `&`: keep it when the following text begins a well-formed entity,
    /// escape it otherwise.
    fn entity<H: SaxHandler>(&mut self, handler: &mut H) {
        let next = self.next_text();
        if match_entity(next.as_bytes()).is_some() {
            let mut text = String::with_capacity(next.len() + 1);
            text.push('&');
            text.push_str(next);
            handler.pcdata(&text);
            self.pos += 1;
        } else {
            handler.pcdata("&amp;");
        }
    }

    /// `</`
    fn end_tag_open<H: SaxHandler>(&mut self, handler: &mut H) {
        let next = self.next_text();
        let Some(name_len) = tag_name_len(next) else {
            handler.pcdata("&lt;/");
            return;
        };
        if name_len == next.len() && self.parts.get(self.pos + 1) == Some(&Token::Gt) {
            // fast case, no attribute parsing needed
            self.pos += 2;
            let name = next.to_ascii_lowercase();
            if ELEMENTS.contains_key(name.as_str()) {
                handler.end_tag(&name);
            }
        } else {
            // slow case: parse to the real `>`, discarding any attributes
            match parse_tag(&self.parts, self.pos) {
                Some(tag) => {
                    self.pos = tag.next;
                    if tag.flags.is_some() {
                        handler.end_tag(&tag.name);
                    }
                }
                None => self.pos = self.parts.len(),
            }
        }
    }

    /// `<`
    fn start_tag_open<H: SaxHandler>(&mut self, handler: &mut H) {
        let next = self.next_text();
        let Some((name_len, match_len)) = tag_open_match(next) else {
            handler.pcdata("&lt;");
            return;
        };
        if match_len == next.len() && self.parts.get(self.pos + 1) == Some(&Token::Gt) {
            self.pos += 2;
            let name = next[..name_len].to_ascii_lowercase();
            if let Some(&flags) = ELEMENTS.get(name.as_str()) {
                handler.start_tag(&name, &mut Vec::new());
                if flags.intersects(ElementFlags::CDATA | ElementFlags::RCDATA) {
                    self.rawtext(&name, flags, handler);
                }
            }
        } else {
            match parse_tag(&self.parts, self.pos) {
                Some(mut tag) => {
                    self.pos = tag.next;
                    if let Some(flags) = tag.flags {
                        handler.start_tag(&tag.name, &mut tag.attrs);
                        if flags.intersects(ElementFlags::CDATA | ElementFlags::RCDATA) {
                            self.rawtext(&tag.name, flags, handler);
                        }
                    }
                }
                None => self.pos = self.parts.len(),
            }
        }
    }

    /// Body of a CDATA or RCDATA element: everything up to the matching
    /// close tag is one text event. The cursor is left on the `</` so the
    /// main loop emits the end tag normally.
    fn rawtext<H: SaxHandler>(&mut self, name: &str, flags: ElementFlags, handler: &mut H) {
        debug_assert!(
            flags.intersects(ElementFlags::CDATA | ElementFlags::RCDATA),
            "text sub-parser entered for a non-text element"
        );
        let end = self.parts.len();
        let start = self.pos;
        let mut stop = end;
        let mut p = start.max(1);
        while p < end {
            if self.parts[p - 1] == Token::LtSlash && closes(self.parts[p].text(), name) {
                stop = p - 1;
                break;
            }
            p += 1;
        }
        let mut buf = String::new();
        for part in &self.parts[start..stop] {
            buf.push_str(part.as_str());
        }
        if flags.contains(ElementFlags::CDATA) {
            handler.cdata(&buf);
        } else {
            handler.rcdata(&normalize_rcdata(&buf));
        }
        self.pos = stop;
    }

    /// `<!--`: skip through the first `>` preceded by text ending in `--`.
    fn comment<H: SaxHandler>(&mut self, handler: &mut H) {
        if !self.no_more_end_comments {
            let mut found = None;
            let mut p = self.pos + 1;
            while p < self.parts.len() {
                if self.parts[p] == Token::Gt && self.parts[p - 1].as_str().ends_with("--") {
                    found = Some(p);
                    break;
                }
                p += 1;
            }
            match found {
                Some(p) => self.pos = p + 1,
                None => self.no_more_end_comments = true,
            }
        }
        if self.no_more_end_comments {
            handler.pcdata("&lt;!--");
        }
    }

    /// `<!`: a declaration-like body (leading letter) is skipped to the
    /// next `>`; anything else is literal text.
    fn declaration<H: SaxHandler>(&mut self, handler: &mut H) {
        let starts_letter = self
            .next_text()
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_alphabetic());
        if starts_letter {
            self.skip_to_gt(handler, "&lt;!");
        } else {
            handler.pcdata("&lt;!");
        }
    }

    /// Skip to the token after the next `>`, or latch `no_more_gt` and
    /// emit the literal escape. The latch is shared between `<!` and `<?`.
    fn skip_to_gt<H: SaxHandler>(&mut self, handler: &mut H, literal: &str) {
        if !self.no_more_gt {
            let mut found = None;
            let mut p = self.pos + 1;
            while p < self.parts.len() {
                if self.parts[p] == Token::Gt {
                    found = Some(p);
                    break;
                }
                p += 1;
            }
            match found {
                Some(p) => self.pos = p + 1,
                None => self.no_more_gt = true,
            }
        }
        if self.no_more_gt {
            handler.pcdata(literal);
        }
    }
}

/// Length of a leading `[A-Za-z][A-Za-z0-9]*` tag name, if any.
fn tag_name_len(s: &str) -> Option<usize> {
    let b = s.as_bytes();
    if !b.first().is_some_and(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut i = 1;
    while i < b.len() && b[i].is_ascii_alphanumeric() {
        i += 1;
    }
    Some(i)
}

/// Match `name \s* /?` at the start of a token; returns
/// `(name_len, match_len)`.
fn tag_open_match(s: &str) -> Option<(usize, usize)> {
    let name_len = tag_name_len(s)?;
    let b = s.as_bytes();
    let mut i = name_len;
    while i < b.len() && b[i].is_ascii_whitespace() {
        i += 1;
    }
    if i < b.len() && b[i] == b'/' {
        i += 1;
    }
    Some((name_len, i))
}

/// Does this token close a raw-text element named `name`?
/// Matches `^name([\s/]|$)` case-insensitively.
fn closes(text: &str, name: &str) -> bool {
    let t = text.as_bytes();
    let n = name.as_bytes();
    t.len() >= n.len()
        && t[..n.len()].eq_ignore_ascii_case(n)
        && match t.get(n.len()) {
            None => true,
            Some(&b) => b.is_ascii_whitespace() || b == b'/',
        }
}
