//! Style attribute filtering
//!
//! The CSS collaborator behind the `css` cargo feature. Parses the value
//! of a `style` attribute as a declaration list (CSS core grammar, no
//! delimiting braces), drops declarations for unknown properties, and
//! filters each value down to tokens that cannot carry script: idents,
//! quantities, hash colors, strings, the color functions, and (for the
//! few properties that take one) scheme-vetted, rewriter-approved URLs.
//!
//! Parsing recovers per declaration: a malformed declaration (bad string,
//! bad URL, stray block, at-rule) is skipped up to the next `;` and the
//! rest of the attribute still gets filtered.

use cssparser::{
    serialize_string, BasicParseErrorKind, ParseError, ParseErrorKind, Parser, ParserInput, ToCss,
    Token,
};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::policy::{scheme_allowed, UriRewriter};

/// Value rules for one whitelisted property.
#[derive(Debug, Clone, Copy)]
pub struct CssPropertySchema {
    /// May the value contain `url(..)` tokens?
    pub allows_uri: bool,
}

const PLAIN: CssPropertySchema = CssPropertySchema { allows_uri: false };
const WITH_URI: CssPropertySchema = CssPropertySchema { allows_uri: true };

static PROPERTIES: LazyLock<HashMap<&'static str, CssPropertySchema>> = LazyLock::new(|| {
    let table = [
        ("background", WITH_URI),
        ("background-attachment", PLAIN),
        ("background-color", PLAIN),
        ("background-image", WITH_URI),
        ("background-position", PLAIN),
        ("background-repeat", PLAIN),
        ("border", PLAIN),
        ("border-bottom", PLAIN),
        ("border-bottom-color", PLAIN),
        ("border-bottom-style", PLAIN),
        ("border-bottom-width", PLAIN),
        ("border-collapse", PLAIN),
        ("border-color", PLAIN),
        ("border-left", PLAIN),
        ("border-left-color", PLAIN),
        ("border-left-style", PLAIN),
        ("border-left-width", PLAIN),
        ("border-right", PLAIN),
        ("border-right-color", PLAIN),
        ("border-right-style", PLAIN),
        ("border-right-width", PLAIN),
        ("border-spacing", PLAIN),
        ("border-style", PLAIN),
        ("border-top", PLAIN),
        ("border-top-color", PLAIN),
        ("border-top-style", PLAIN),
        ("border-top-width", PLAIN),
        ("border-width", PLAIN),
        ("caption-side", PLAIN),
        ("clear", PLAIN),
        ("color", PLAIN),
        ("cursor", PLAIN),
        ("direction", PLAIN),
        ("display", PLAIN),
        ("empty-cells", PLAIN),
        ("float", PLAIN),
        ("font", PLAIN),
        ("font-family", PLAIN),
        ("font-size", PLAIN),
        ("font-style", PLAIN),
        ("font-variant", PLAIN),
        ("font-weight", PLAIN),
        ("height", PLAIN),
        ("letter-spacing", PLAIN),
        ("line-height", PLAIN),
        ("list-style", WITH_URI),
        ("list-style-image", WITH_URI),
        ("list-style-position", PLAIN),
        ("list-style-type", PLAIN),
        ("margin", PLAIN),
        ("margin-bottom", PLAIN),
        ("margin-left", PLAIN),
        ("margin-right", PLAIN),
        ("margin-top", PLAIN),
        ("max-height", PLAIN),
        ("max-width", PLAIN),
        ("min-height", PLAIN),
        ("min-width", PLAIN),
        ("overflow", PLAIN),
        ("padding", PLAIN),
        ("padding-bottom", PLAIN),
        ("padding-left", PLAIN),
        ("padding-right", PLAIN),
        ("padding-top", PLAIN),
        ("table-layout", PLAIN),
        ("text-align", PLAIN),
        ("text-decoration", PLAIN),
        ("text-indent", PLAIN),
        ("text-transform", PLAIN),
        ("vertical-align", PLAIN),
        ("visibility", PLAIN),
        ("white-space", PLAIN),
        ("width", PLAIN),
        ("word-spacing", PLAIN),
    ];
    table.into_iter().collect()
});

/// Look up the schema for an (already lowercased) property name.
pub fn property_schema(name: &str) -> Option<&'static CssPropertySchema> {
    PROPERTIES.get(name)
}

/// One value token of a declaration.
///
/// All variants except `Url` carry their CSS serialization; `Url` carries
/// the raw URL so the rewriter sees it unquoted.
#[derive(Debug, Clone, PartialEq)]
pub enum CssToken {
    Ident(String),
    /// Number, percentage or dimension
    Quantity(String),
    /// `#rgb` / `#rrggbb` hash
    Hash(String),
    /// Quoted string, serialized with quotes and escapes
    Str(String),
    /// A function call, fully serialized; the name is kept lowercased for
    /// filtering
    Function { name: String, serialized: String },
    /// A `url(..)` value, unresolved
    Url(String),
    Delim(char),
}

impl CssToken {
    pub fn to_css_string(&self) -> String {
        match self {
            CssToken::Ident(s)
            | CssToken::Quantity(s)
            | CssToken::Hash(s)
            | CssToken::Str(s) => s.clone(),
            CssToken::Function { serialized, .. } => serialized.clone(),
            CssToken::Url(u) => {
                let mut out = String::with_capacity(u.len() + 8);
                out.push_str("url(");
                let _ = serialize_string(u, &mut out);
                out.push(')');
                out
            }
            CssToken::Delim(c) => c.to_string(),
        }
    }
}

/// Parse a style attribute as a declaration list, calling `declaration`
/// for each well-formed `property: value` pair.
pub fn parse_declarations(style: &str, mut declaration: impl FnMut(&str, Vec<CssToken>)) {
    let mut input = ParserInput::new(style);
    let mut parser = Parser::new(&mut input);

    loop {
        match parse_one_declaration(&mut parser) {
            Ok(Some((name, tokens))) => declaration(&name, tokens),
            Ok(None) => {}
            Err(e) => match e.kind {
                ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => break,
                ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(Token::Semicolon)) => {}
                _ => advance(&mut parser),
            },
        }
    }
}

fn parse_one_declaration<'i>(
    input: &mut Parser<'i, '_>,
) -> Result<Option<(String, Vec<CssToken>)>, ParseError<'i, ()>> {
    let name = input.expect_ident()?.to_string();
    input.expect_colon()?;

    let mut tokens = Vec::new();
    loop {
        let token = match input.next() {
            Err(e) if e.kind == BasicParseErrorKind::EndOfInput => break,
            Err(e) => return Err(e.into()),
            Ok(t) => t.clone(),
        };
        match token {
            Token::Semicolon => break,
            t @ Token::Ident(_) => tokens.push(CssToken::Ident(t.to_css_string())),
            t @ (Token::Number { .. } | Token::Percentage { .. } | Token::Dimension { .. }) => {
                tokens.push(CssToken::Quantity(t.to_css_string()))
            }
            t @ (Token::Hash(_) | Token::IDHash(_)) => {
                tokens.push(CssToken::Hash(t.to_css_string()))
            }
            t @ Token::QuotedString(_) => tokens.push(CssToken::Str(t.to_css_string())),
            Token::UnquotedUrl(url) => tokens.push(CssToken::Url(url.to_string())),
            Token::Comma => tokens.push(CssToken::Delim(',')),
            Token::Delim(c) => tokens.push(CssToken::Delim(c)),
            Token::Function(name) => {
                if name.eq_ignore_ascii_case("url") {
                    let url = input.parse_nested_block(|p| {
                        let url = p.expect_string()?.to_string();
                        p.expect_exhausted()?;
                        Ok(url)
                    })?;
                    tokens.push(CssToken::Url(url));
                } else {
                    let mut serialized = String::new();
                    let _ = Token::Function(name.clone()).to_css(&mut serialized);
                    input.parse_nested_block(|p| serialize_block(p, &mut serialized))?;
                    serialized.push(')');
                    tokens.push(CssToken::Function {
                        name: name.to_ascii_lowercase(),
                        serialized,
                    });
                }
            }
            t => return Err(input.new_error(BasicParseErrorKind::UnexpectedToken(t))),
        }
    }
    if tokens.is_empty() {
        Ok(None)
    } else {
        Ok(Some((name, tokens)))
    }
}

/// Serialize the inside of a function call. Nested functions and blocks
/// make the whole declaration fail.
fn serialize_block<'i>(p: &mut Parser<'i, '_>, out: &mut String) -> Result<(), ParseError<'i, ()>> {
    let mut first = true;
    loop {
        let token = match p.next() {
            Err(e) if e.kind == BasicParseErrorKind::EndOfInput => return Ok(()),
            Err(e) => return Err(e.into()),
            Ok(t) => t.clone(),
        };
        if token.is_parse_error()
            || matches!(
                token,
                Token::Function(_)
                    | Token::ParenthesisBlock
                    | Token::SquareBracketBlock
                    | Token::CurlyBracketBlock
            )
        {
            return Err(p.new_error(BasicParseErrorKind::UnexpectedToken(token)));
        }
        if !first && token != Token::Comma {
            out.push(' ');
        }
        let _ = token.to_css(out);
        first = false;
    }
}

/// Find the end of the current declaration (`;`, a block, or EOF) so
/// parsing can resume after a malformed one.
fn advance(p: &mut Parser<'_, '_>) {
    loop {
        match p.next() {
            // cssparser skips matched blocks as a unit; whatever follows a
            // stray `{ .. }` may be a fresh declaration
            Ok(Token::Semicolon) | Ok(Token::CurlyBracketBlock) => return,
            Err(_) => return,
            _ => {}
        }
    }
}

/// Filter a declaration's value tokens in place against its schema.
///
/// URLs are vetted with the same scheme rule as URI attributes and passed
/// through the rewriter; with no rewriter they are removed.
pub fn sanitize_property(
    schema: &CssPropertySchema,
    tokens: &mut Vec<CssToken>,
    uri_rewriter: Option<&UriRewriter<'_>>,
) {
    tokens.retain_mut(|token| match token {
        CssToken::Ident(_) | CssToken::Quantity(_) | CssToken::Hash(_) | CssToken::Str(_) => true,
        CssToken::Delim(c) => matches!(c, ',' | '/'),
        CssToken::Function { name, .. } => {
            matches!(name.as_str(), "rgb" | "rgba" | "hsl" | "hsla")
        }
        CssToken::Url(url) => {
            if !schema.allows_uri || !scheme_allowed(url) {
                return false;
            }
            let Some(rewrite) = uri_rewriter else {
                return false;
            };
            match rewrite(url) {
                Some(rewritten) => {
                    *url = rewritten;
                    true
                }
                None => false,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decls(style: &str) -> Vec<(String, Vec<CssToken>)> {
        let mut out = Vec::new();
        parse_declarations(style, |name, tokens| out.push((name.to_string(), tokens)));
        out
    }

    /// The policy engine's style pipeline, inlined for direct testing.
    fn filter(style: &str, rewriter: Option<&UriRewriter<'_>>) -> String {
        let mut parts = Vec::new();
        parse_declarations(style, |name, mut tokens| {
            let name = name.to_ascii_lowercase();
            let Some(schema) = property_schema(&name) else {
                return;
            };
            sanitize_property(schema, &mut tokens, rewriter);
            if tokens.is_empty() {
                return;
            }
            let value: Vec<String> = tokens.iter().map(|t| t.to_css_string()).collect();
            parts.push(format!("{}: {}", name, value.join(" ")));
        });
        parts.join(" ; ")
    }

    #[test]
    fn test_single_declaration() {
        let d = decls("color: green");
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].0, "color");
        assert_eq!(d[0].1, vec![CssToken::Ident("green".into())]);
    }

    #[test]
    fn test_terminated_declaration() {
        assert_eq!(filter("font-style: italic;", None), "font-style: italic");
    }

    #[test]
    fn test_quantities_and_slash() {
        assert_eq!(
            filter("font: 12px / 1.5 serif", None),
            "font: 12px / 1.5 serif"
        );
    }

    #[test]
    fn test_hash_colors_and_functions() {
        assert_eq!(filter("color: #ff0000", None), "color: #ff0000");
        assert_eq!(
            filter("color: rgb(255, 0, 0)", None),
            "color: rgb(255, 0, 0)"
        );
    }

    #[test]
    fn test_unknown_property_dropped() {
        assert_eq!(filter("behavior: x; color: green", None), "color: green");
        assert_eq!(filter("-moz-binding: x", None), "");
    }

    #[test]
    fn test_unknown_function_dropped() {
        assert_eq!(filter("width: expression(1)", None), "");
    }

    #[test]
    fn test_nested_function_fails_declaration() {
        assert_eq!(filter("width: calc(var(--x)); color: red", None), "color: red");
    }

    #[test]
    fn test_url_needs_schema_and_rewriter() {
        let identity: &UriRewriter = &|u| Some(u.to_string());
        // color never takes a URL
        assert_eq!(filter("color: url(\"http://x/\")", Some(identity)), "");
        // background-image does, but only with a rewriter
        assert_eq!(filter("background-image: url(\"http://x/i.png\")", None), "");
        assert_eq!(
            filter("background-image: url(\"http://x/i.png\")", Some(identity)),
            "background-image: url(\"http://x/i.png\")"
        );
    }

    #[test]
    fn test_url_scheme_vetted() {
        let identity: &UriRewriter = &|u| Some(u.to_string());
        assert_eq!(
            filter("background-image: url(\"javascript:alert(1)\")", Some(identity)),
            ""
        );
    }

    #[test]
    fn test_url_rewriter_applies() {
        let proxy: &UriRewriter = &|u| Some(format!("//proxy?u={u}"));
        assert_eq!(
            filter("list-style-image: url(\"a.png\")", Some(proxy)),
            "list-style-image: url(\"//proxy?u=a.png\")"
        );
    }

    #[test]
    fn test_bad_url_fails_declaration() {
        assert_eq!(filter("background: url(x'y); color: green", None), "color: green");
    }

    #[test]
    fn test_at_rules_skipped() {
        assert_eq!(
            filter("@media screen { color: red }; color: green", None),
            "color: green"
        );
        assert_eq!(filter("@charset 'utf-8'; color: green", None), "color: green");
    }

    #[test]
    fn test_malformed_declarations_recovered() {
        for style in [
            "color:green",
            "color:green; color",
            "color:green; color:",
            "color:green; color{;color:maroon}",
        ] {
            assert_eq!(filter(style, None), "color: green", "{}", style);
        }
    }

    #[test]
    fn test_multiple_declarations_joined() {
        assert_eq!(
            filter("color: green; width: 10px", None),
            "color: green ; width: 10px"
        );
    }
}
