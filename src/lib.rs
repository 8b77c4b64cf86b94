//! htmlscrub - whitelist HTML sanitization
//!
//! Takes an untrusted fragment of HTML-like input and produces a balanced
//! fragment with scripting vectors removed: unsafe elements and their
//! contents are dropped, unknown elements are folded to their children,
//! event-handler attributes are deleted, URIs are scheme-vetted through a
//! caller-supplied rewriter, and style attributes are filtered through a
//! CSS whitelist (cargo feature `css`, on by default; without it they are
//! dropped).
//!
//! The parser is permissive and total: it never fails on malformed input,
//! makes forward progress on adversarial input (unterminated comments and
//! quotes cost at most one extra scan), and performs local tag balancing
//! rather than full HTML5 tree construction.
//!
//! Entry points:
//! - [`sanitize`] / [`sanitize_with`]: schema-driven cleaning
//! - [`sanitize_with_policy`]: caller-supplied [`TagPolicy`]
//! - [`sax::parse`]: raw event access for custom consumers
//!
//! ```
//! let clean = htmlscrub::sanitize("<b onclick=\"evil()\">hi</b><script>x</script>");
//! assert_eq!(clean, "<b>hi</b>");
//! ```
//!
//! URI attributes survive only when a rewriter approves them:
//!
//! ```
//! let identity: &htmlscrub::UriRewriter = &|uri| Some(uri.to_string());
//! let clean = htmlscrub::sanitize_with(
//!     "<a href=\"http://example.com/\">x</a><a href=\"javascript:y\">z</a>",
//!     Some(identity),
//!     None,
//! );
//! assert_eq!(clean, "<a href=\"http://example.com/\">x</a><a>z</a>");
//! ```

mod core;
#[cfg(feature = "css")]
pub mod css;
pub mod policy;
pub mod sanitizer;
pub mod sax;
pub mod schema;

pub use crate::core::attributes::Attr;
pub use crate::core::entities::{escape_attrib, normalize_rcdata, unescape_entities};
pub use policy::{sanitize_attributes, NmTokenPolicy, SchemaTagPolicy, TagPolicy, UriRewriter};
pub use sanitizer::HtmlSanitizer;
pub use sax::SaxHandler;

/// Sanitize with the default schema policy and no URI rewriter: all URI
/// attributes are deleted, name tokens are kept verbatim.
pub fn sanitize(html: &str) -> String {
    sanitize_with(html, None, None)
}

/// Sanitize with the default schema policy and the given collaborators.
///
/// `uri_rewriter` sees every URI attribute whose scheme is absent or in
/// `{http, https, mailto}` and may rewrite or reject it; without one, URI
/// attributes are deleted. `nmtoken_policy` sees id/class/name tokens.
pub fn sanitize_with(
    html: &str,
    uri_rewriter: Option<&UriRewriter<'_>>,
    nmtoken_policy: Option<&NmTokenPolicy<'_>>,
) -> String {
    let policy = SchemaTagPolicy::new(uri_rewriter, nmtoken_policy);
    sanitize_with_policy(html, &policy)
}

/// Sanitize with a caller-supplied tag policy.
pub fn sanitize_with_policy<P: TagPolicy + ?Sized>(html: &str, policy: &P) -> String {
    let mut out = String::with_capacity(html.len());
    sanitizer::sanitize_to(html, policy, &mut out);
    out
}
