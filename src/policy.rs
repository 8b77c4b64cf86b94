//! Attribute and tag policy
//!
//! The per-attribute value disciplines: event handlers are deleted, URIs
//! are scheme-vetted and passed through a caller-supplied rewriter, style
//! attributes go through the CSS collaborator, and name tokens through the
//! caller's token policy. A deleted attribute keeps its slot with
//! `value: None` so the serializer can skip it.

use crate::core::attributes::Attr;
use crate::schema::{attr_type, AttrType, ElementFlags, ELEMENTS};

/// Rewrites or rejects a URI. `None` rejects; `Some` replaces.
pub type UriRewriter<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Rewrites or rejects an HTML name token (id, class, ...).
pub type NmTokenPolicy<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Extract the RFC 3986 scheme: the leading `[^:/?# ]+` run before a `:`.
fn uri_scheme(uri: &str) -> Option<&str> {
    let end = uri
        .bytes()
        .position(|b| matches!(b, b':' | b'/' | b'?' | b'#' | b' '))?;
    (end > 0 && uri.as_bytes()[end] == b':').then(|| &uri[..end])
}

/// Scheme-absent URIs are relative and always eligible; otherwise only
/// http, https and mailto pass.
pub(crate) fn scheme_allowed(uri: &str) -> bool {
    match uri_scheme(uri) {
        None => true,
        Some(s) => {
            s.eq_ignore_ascii_case("http")
                || s.eq_ignore_ascii_case("https")
                || s.eq_ignore_ascii_case("mailto")
        }
    }
}

/// Apply the per-attribute type disciplines in place.
///
/// Attributes whose type is unknown, `Script`, a disallowed URI, or
/// rejected by a policy end up with `value: None`.
pub fn sanitize_attributes(
    tag: &str,
    attrs: &mut [Attr],
    uri_rewriter: Option<&UriRewriter<'_>>,
    nmtoken_policy: Option<&NmTokenPolicy<'_>>,
) {
    for attr in attrs.iter_mut() {
        let Some(value) = attr.value.take() else {
            continue;
        };
        attr.value = match attr_type(tag, &attr.name) {
            Some(AttrType::None) => Some(value),
            Some(AttrType::Script) => None,
            Some(AttrType::Style) => sanitize_style(&value, uri_rewriter),
            Some(
                AttrType::Id
                | AttrType::IdRef
                | AttrType::IdRefs
                | AttrType::GlobalName
                | AttrType::LocalName
                | AttrType::Classes,
            ) => match nmtoken_policy {
                Some(policy) => policy(&value),
                None => Some(value),
            },
            Some(AttrType::Uri) => match uri_rewriter {
                Some(rewrite) if scheme_allowed(&value) => rewrite(&value),
                _ => None,
            },
            Some(AttrType::UriFragment) => match value.strip_prefix('#') {
                Some(fragment) => {
                    let token = match nmtoken_policy {
                        Some(policy) => policy(fragment),
                        None => Some(fragment.to_string()),
                    };
                    token.map(|t| format!("#{t}"))
                }
                None => None,
            },
            None => None,
        };
    }
}

#[cfg(feature = "css")]
fn sanitize_style(value: &str, uri_rewriter: Option<&UriRewriter<'_>>) -> Option<String> {
    let mut declarations = Vec::new();
    crate::css::parse_declarations(value, |property, mut tokens| {
        let property = property.to_ascii_lowercase();
        let Some(schema) = crate::css::property_schema(&property) else {
            return;
        };
        crate::css::sanitize_property(schema, &mut tokens, uri_rewriter);
        if tokens.is_empty() {
            return;
        }
        let rendered: Vec<String> = tokens.iter().map(|t| t.to_css_string()).collect();
        declarations.push(format!("{}: {}", property, rendered.join(" ")));
    });
    if declarations.is_empty() {
        None
    } else {
        Some(declarations.join(" ; "))
    }
}

// Without the CSS collaborator every style attribute is dropped.
#[cfg(not(feature = "css"))]
fn sanitize_style(_value: &str, _uri_rewriter: Option<&UriRewriter<'_>>) -> Option<String> {
    None
}

/// Decides the fate of each start tag.
///
/// `apply` may mutate `attrs` (typically setting values to `None`);
/// returning `false` drops the tag, and for non-void elements its entire
/// contents. The container must not be retained across calls.
pub trait TagPolicy {
    fn apply(&self, tag: &str, attrs: &mut Vec<Attr>) -> bool;
}

impl<F> TagPolicy for F
where
    F: Fn(&str, &mut Vec<Attr>) -> bool,
{
    fn apply(&self, tag: &str, attrs: &mut Vec<Attr>) -> bool {
        self(tag, attrs)
    }
}

/// The default schema-driven policy: drop `UNSAFE` elements, run
/// [`sanitize_attributes`] on everything else.
pub struct SchemaTagPolicy<'a> {
    uri_rewriter: Option<&'a UriRewriter<'a>>,
    nmtoken_policy: Option<&'a NmTokenPolicy<'a>>,
}

impl<'a> SchemaTagPolicy<'a> {
    pub fn new(
        uri_rewriter: Option<&'a UriRewriter<'a>>,
        nmtoken_policy: Option<&'a NmTokenPolicy<'a>>,
    ) -> Self {
        SchemaTagPolicy {
            uri_rewriter,
            nmtoken_policy,
        }
    }
}

impl TagPolicy for SchemaTagPolicy<'_> {
    fn apply(&self, tag: &str, attrs: &mut Vec<Attr>) -> bool {
        if ELEMENTS
            .get(tag)
            .is_some_and(|f| f.contains(ElementFlags::UNSAFE))
        {
            return false;
        }
        sanitize_attributes(tag, attrs, self.uri_rewriter, self.nmtoken_policy);
        true
    }
}
