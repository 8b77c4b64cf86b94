//! Balancing sanitizer
//!
//! A [`SaxHandler`] over an output string that enforces the output
//! invariant: every emitted tag is schema-known and policy-checked, every
//! attribute value is escaped and double-quoted, and every opened element
//! is closed in nesting order. Elements the policy rejects suppress their
//! entire contents via the `ignoring` latch; elements left open at end of
//! input are closed in reverse stack order.

use crate::core::attributes::Attr;
use crate::core::entities::escape_attrib;
use crate::policy::TagPolicy;
use crate::sax::{self, SaxHandler};
use crate::schema::{ElementFlags, ELEMENTS};

/// A reusable sanitizer around a tag policy.
pub struct HtmlSanitizer<P: TagPolicy> {
    policy: P,
}

impl<P: TagPolicy> HtmlSanitizer<P> {
    pub fn new(policy: P) -> Self {
        HtmlSanitizer { policy }
    }

    /// Sanitize `html`, appending the result to `out`.
    pub fn sanitize_into(&self, html: &str, out: &mut String) {
        sanitize_to(html, &self.policy, out);
    }
}

pub(crate) fn sanitize_to<P: TagPolicy + ?Sized>(html: &str, policy: &P, out: &mut String) {
    let mut handler = BalanceHandler {
        policy,
        out,
        stack: Vec::new(),
        ignoring: false,
    };
    sax::parse(html, &mut handler);
}

struct BalanceHandler<'a, P: TagPolicy + ?Sized> {
    policy: &'a P,
    out: &'a mut String,
    /// Open elements awaiting their close; holds the canonical schema key
    /// so entries never allocate. Never contains EMPTY or FOLDABLE tags.
    stack: Vec<(&'static str, ElementFlags)>,
    /// Set when the policy rejects a non-void element; suppresses all
    /// events until the next end tag clears it.
    ignoring: bool,
}

impl<P: TagPolicy + ?Sized> BalanceHandler<'_, P> {
    fn close(&mut self, name: &str) {
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }
}

impl<P: TagPolicy + ?Sized> SaxHandler for BalanceHandler<'_, P> {
    fn start_doc(&mut self) {
        self.stack.clear();
        self.ignoring = false;
    }

    fn start_tag(&mut self, name: &str, attrs: &mut Vec<Attr>) {
        if self.ignoring {
            return;
        }
        let Some((&canon, &flags)) = ELEMENTS.get_key_value(name) else {
            return;
        };
        if flags.contains(ElementFlags::FOLDABLE) {
            // drop the tag, keep the children
            return;
        }
        if !self.policy.apply(name, attrs) {
            self.ignoring = !flags.contains(ElementFlags::EMPTY);
            return;
        }
        if !flags.contains(ElementFlags::EMPTY) {
            self.stack.push((canon, flags));
        }
        self.out.push('<');
        self.out.push_str(name);
        for attr in attrs.iter() {
            if let Some(value) = &attr.value {
                self.out.push(' ');
                self.out.push_str(&attr.name);
                self.out.push_str("=\"");
                self.out.push_str(&escape_attrib(value));
                self.out.push('"');
            }
        }
        self.out.push('>');
    }

    fn end_tag(&mut self, name: &str) {
        if self.ignoring {
            self.ignoring = false;
            return;
        }
        let Some(&flags) = ELEMENTS.get(name) else {
            return;
        };
        if flags.intersects(ElementFlags::EMPTY | ElementFlags::FOLDABLE) {
            return;
        }

        let mut index = None;
        if flags.contains(ElementFlags::OPTIONAL_ENDTAG) {
            for i in (0..self.stack.len()).rev() {
                let (el, eflags) = self.stack[i];
                if el == name {
                    index = Some(i);
                    break;
                }
                // don't pop non-optional elements looking for a match
                if !eflags.contains(ElementFlags::OPTIONAL_ENDTAG) {
                    return;
                }
            }
        } else {
            for i in (0..self.stack.len()).rev() {
                if self.stack[i].0 == name {
                    index = Some(i);
                    break;
                }
            }
        }
        let Some(index) = index else {
            // stray end tag
            return;
        };

        for i in (index + 1..self.stack.len()).rev() {
            let (el, eflags) = self.stack[i];
            // optional-end-tag elements close implicitly, without output
            if !eflags.contains(ElementFlags::OPTIONAL_ENDTAG) {
                self.close(el);
            }
        }
        self.stack.truncate(index);
        self.close(name);
    }

    fn pcdata(&mut self, text: &str) {
        if !self.ignoring {
            self.out.push_str(text);
        }
    }

    fn rcdata(&mut self, text: &str) {
        if !self.ignoring {
            self.out.push_str(text);
        }
    }

    fn cdata(&mut self, text: &str) {
        if !self.ignoring {
            self.out.push_str(text);
        }
    }

    fn end_doc(&mut self) {
        while let Some((el, _)) = self.stack.pop() {
            self.close(el);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::policy::UriRewriter;
    use crate::{sanitize, sanitize_with, sanitize_with_policy};

    fn with_identity_uris(html: &str) -> String {
        let identity: &UriRewriter = &|u| Some(u.to_string());
        sanitize_with(html, Some(identity), None)
    }

    #[test]
    fn test_plain_markup_passes() {
        assert_eq!(sanitize("<b>hi</b>"), "<b>hi</b>");
    }

    #[test]
    fn test_script_element_vanishes() {
        assert_eq!(sanitize("<script>evil()</script>"), "");
        assert_eq!(sanitize("an <script>evil()</script> example"), "an  example");
    }

    #[test]
    fn test_style_element_vanishes() {
        assert_eq!(sanitize("<style>* { display: none }</style>x"), "x");
    }

    #[test]
    fn test_javascript_uri_dropped_but_tag_kept() {
        assert_eq!(
            with_identity_uris("<a href=\"javascript:bad()\">x</a>"),
            "<a>x</a>"
        );
    }

    #[test]
    fn test_allowed_uri_survives_rewriter() {
        assert_eq!(
            with_identity_uris("<a href=\"http://ok/\">x</a>"),
            "<a href=\"http://ok/\">x</a>"
        );
    }

    #[test]
    fn test_default_policy_deletes_all_uris() {
        assert_eq!(sanitize("<a href=\"http://ok/\">x</a>"), "<a>x</a>");
    }

    #[test]
    fn test_loose_text_escaped() {
        assert_eq!(sanitize("<p>1 < 2 &amp; 3</p>"), "<p>1 &lt; 2 &amp; 3</p>");
    }

    #[test]
    fn test_misnested_inline_tags_balanced() {
        assert_eq!(
            sanitize("<b>bold<i>both</b>italic</i>"),
            "<b>bold<i>both</i></b>italic"
        );
    }

    #[test]
    fn test_event_handler_dropped_from_void_element() {
        assert_eq!(
            with_identity_uris("<img src=\"x\" onerror=\"y\">"),
            "<img src=\"x\">"
        );
    }

    #[test]
    fn test_commented_script_vanishes() {
        assert_eq!(sanitize("<!--<script>x</script>-->"), "");
    }

    #[test]
    fn test_quoted_gt_reaches_attribute_value() {
        assert_eq!(
            sanitize("<p title='>>>'>t</p>"),
            "<p title=\"&gt;&gt;&gt;\">t</p>"
        );
    }

    #[test]
    fn test_textarea_body_is_rcdata() {
        assert_eq!(
            sanitize("<textarea><b>raw</b></textarea>"),
            "<textarea>&lt;b&gt;raw&lt;/b&gt;</textarea>"
        );
    }

    #[test]
    fn test_unclosed_elements_closed_at_eof() {
        assert_eq!(sanitize("<b>AWESOME!"), "<b>AWESOME!</b>");
        assert_eq!(sanitize("<ul><li>a"), "<ul><li>a</li></ul>");
    }

    #[test]
    fn test_unknown_element_folded_to_children() {
        assert_eq!(sanitize("<blink>x</blink>"), "x");
    }

    #[test]
    fn test_foldable_wrappers_elided() {
        assert_eq!(
            sanitize("<html><head><title>t</title></head><body><p>x</p></body></html>"),
            "<p>x</p>"
        );
    }

    #[test]
    fn test_unsafe_element_contents_suppressed() {
        assert_eq!(sanitize("<object><param name=\"a\"><b>x</b></object>y"), "y");
        assert_eq!(sanitize("<applet>a</applet>b"), "b");
    }

    #[test]
    fn test_optional_end_tags_close_implicitly() {
        assert_eq!(
            sanitize("<ul><li>a<li>b</ul>"),
            "<ul><li>a<li>b</ul>"
        );
    }

    #[test]
    fn test_optional_close_aborts_on_non_optional_mismatch() {
        // </p> cannot implicitly close the <b>; everything balances at EOF
        assert_eq!(sanitize("<p><b>x</p>y"), "<p><b>xy</b></p>");
    }

    #[test]
    fn test_stray_end_tags_dropped() {
        assert_eq!(sanitize("x</b>"), "x");
        assert_eq!(sanitize("</p>x"), "x");
    }

    #[test]
    fn test_table_structure_survives() {
        assert_eq!(
            sanitize("<table><tr><td>a<td>b</tr></table>"),
            "<table><tr><td>a<td>b</tr></table>"
        );
    }

    #[test]
    fn test_attribute_values_escaped() {
        assert_eq!(
            sanitize("<p title=\"a&lt;b&gt;c&amp;d&quot;e\">x</p>"),
            "<p title=\"a&lt;b&gt;c&amp;d&#34;e\">x</p>"
        );
    }

    #[test]
    fn test_custom_policy_closure() {
        let text_only = |_: &str, _: &mut Vec<crate::Attr>| false;
        assert_eq!(sanitize_with_policy("<b>x</b>y", &text_only), "y");
    }

    #[test]
    fn test_handler_reuse_resets_state() {
        let sanitizer = crate::HtmlSanitizer::new(crate::SchemaTagPolicy::new(None, None));
        let mut out = String::new();
        sanitizer.sanitize_into("<b>a", &mut out);
        assert_eq!(out, "<b>a</b>");
        let mut out2 = String::new();
        sanitizer.sanitize_into("b", &mut out2);
        assert_eq!(out2, "b");
    }
}
