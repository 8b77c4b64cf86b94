//! Element and attribute schema
//!
//! The default whitelist the sanitizer enforces: which elements may appear
//! in output, how their bodies parse (CDATA/RCDATA), which close
//! implicitly, and which attribute carries which value discipline.
//!
//! Attribute entries are keyed `"tag::attr"` with a `"*::attr"` wildcard
//! fallback; absence means the attribute is dropped. The tables cover the
//! HTML4-era vocabulary; unknown elements are dropped with their children
//! preserved.

use std::collections::HashMap;
use std::ops::BitOr;
use std::sync::LazyLock;

/// Per-element behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElementFlags(u32);

impl ElementFlags {
    /// May be closed implicitly by a sibling or ancestor close
    pub const OPTIONAL_ENDTAG: ElementFlags = ElementFlags(1 << 0);
    /// Void element; no end tag is ever emitted
    pub const EMPTY: ElementFlags = ElementFlags(1 << 1);
    /// Body is raw text until the matching close tag
    pub const CDATA: ElementFlags = ElementFlags(1 << 2);
    /// Body is text with entities, re-encoded on output
    pub const RCDATA: ElementFlags = ElementFlags(1 << 3);
    /// Element and its contents are dropped entirely
    pub const UNSAFE: ElementFlags = ElementFlags(1 << 4);
    /// Element is elided, its contents are kept
    pub const FOLDABLE: ElementFlags = ElementFlags(1 << 5);

    /// No flags set.
    #[inline]
    pub const fn empty() -> ElementFlags {
        ElementFlags(0)
    }

    /// All of `other`'s bits set?
    #[inline]
    pub const fn contains(self, other: ElementFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Any of `other`'s bits set?
    #[inline]
    pub const fn intersects(self, other: ElementFlags) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for ElementFlags {
    type Output = ElementFlags;

    #[inline]
    fn bitor(self, rhs: ElementFlags) -> ElementFlags {
        ElementFlags(self.0 | rhs.0)
    }
}

/// Value discipline enforced on an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    /// Kept as-is
    None,
    /// Event handler; always deleted
    Script,
    /// CSS; filtered through the style collaborator or deleted
    Style,
    Id,
    IdRef,
    IdRefs,
    GlobalName,
    LocalName,
    Classes,
    /// URI; scheme-vetted and passed through the rewriter
    Uri,
    /// `#fragment`; name-token checked
    UriFragment,
}

/// Element whitelist keyed by lowercase name.
pub static ELEMENTS: LazyLock<HashMap<&'static str, ElementFlags>> = LazyLock::new(|| {
    use self::ElementFlags as F;

    let plain = F::empty();
    let table = [
        ("a", plain),
        ("abbr", plain),
        ("acronym", plain),
        ("address", plain),
        ("applet", F::UNSAFE),
        ("area", F::EMPTY),
        ("b", plain),
        ("base", F::EMPTY | F::UNSAFE),
        ("basefont", F::EMPTY | F::UNSAFE),
        ("bdo", plain),
        ("big", plain),
        ("blockquote", plain),
        ("body", F::OPTIONAL_ENDTAG | F::UNSAFE | F::FOLDABLE),
        ("br", F::EMPTY),
        ("button", plain),
        ("caption", plain),
        ("center", plain),
        ("cite", plain),
        ("code", plain),
        ("col", F::EMPTY),
        ("colgroup", F::OPTIONAL_ENDTAG),
        ("dd", F::OPTIONAL_ENDTAG),
        ("del", plain),
        ("dfn", plain),
        ("dir", plain),
        ("div", plain),
        ("dl", plain),
        ("dt", F::OPTIONAL_ENDTAG),
        ("em", plain),
        ("fieldset", plain),
        ("font", plain),
        ("form", plain),
        ("frame", F::EMPTY | F::UNSAFE),
        ("frameset", F::UNSAFE),
        ("h1", plain),
        ("h2", plain),
        ("h3", plain),
        ("h4", plain),
        ("h5", plain),
        ("h6", plain),
        ("head", F::OPTIONAL_ENDTAG | F::UNSAFE | F::FOLDABLE),
        ("hr", F::EMPTY),
        ("html", F::OPTIONAL_ENDTAG | F::UNSAFE | F::FOLDABLE),
        ("i", plain),
        ("iframe", F::UNSAFE | F::CDATA),
        ("img", F::EMPTY),
        ("input", F::EMPTY),
        ("ins", plain),
        ("isindex", F::EMPTY | F::UNSAFE),
        ("kbd", plain),
        ("label", plain),
        ("legend", plain),
        ("li", F::OPTIONAL_ENDTAG),
        ("link", F::EMPTY | F::UNSAFE),
        ("map", plain),
        ("menu", plain),
        ("meta", F::EMPTY | F::UNSAFE),
        ("noembed", F::UNSAFE | F::CDATA),
        ("noframes", F::UNSAFE | F::CDATA),
        ("noscript", F::UNSAFE | F::CDATA),
        ("object", F::UNSAFE),
        ("ol", plain),
        ("optgroup", plain),
        ("option", F::OPTIONAL_ENDTAG),
        ("p", F::OPTIONAL_ENDTAG),
        ("param", F::EMPTY | F::UNSAFE),
        ("pre", plain),
        ("q", plain),
        ("s", plain),
        ("samp", plain),
        ("script", F::UNSAFE | F::CDATA),
        ("select", plain),
        ("small", plain),
        ("span", plain),
        ("strike", plain),
        ("strong", plain),
        ("style", F::UNSAFE | F::CDATA),
        ("sub", plain),
        ("sup", plain),
        ("table", plain),
        ("tbody", F::OPTIONAL_ENDTAG),
        ("td", F::OPTIONAL_ENDTAG),
        ("textarea", F::RCDATA),
        ("tfoot", F::OPTIONAL_ENDTAG),
        ("th", F::OPTIONAL_ENDTAG),
        ("thead", F::OPTIONAL_ENDTAG),
        ("title", F::RCDATA | F::UNSAFE),
        ("tr", F::OPTIONAL_ENDTAG),
        ("tt", plain),
        ("u", plain),
        ("ul", plain),
        ("var", plain),
    ];
    table.into_iter().collect()
});

/// Attribute whitelist keyed `"tag::attr"` / `"*::attr"`.
pub static ATTRIBS: LazyLock<HashMap<&'static str, AttrType>> = LazyLock::new(|| {
    use self::AttrType::*;

    let table = [
        // global
        ("*::class", Classes),
        ("*::dir", None),
        ("*::id", Id),
        ("*::lang", None),
        ("*::style", Style),
        ("*::title", None),
        // global event handlers
        ("*::onclick", Script),
        ("*::ondblclick", Script),
        ("*::onkeydown", Script),
        ("*::onkeypress", Script),
        ("*::onkeyup", Script),
        ("*::onmousedown", Script),
        ("*::onmousemove", Script),
        ("*::onmouseout", Script),
        ("*::onmouseover", Script),
        ("*::onmouseup", Script),
        // a
        ("a::accesskey", None),
        ("a::coords", None),
        ("a::href", Uri),
        ("a::hreflang", None),
        ("a::name", GlobalName),
        ("a::onblur", Script),
        ("a::onfocus", Script),
        ("a::rel", None),
        ("a::rev", None),
        ("a::shape", None),
        ("a::tabindex", None),
        ("a::type", None),
        // area
        ("area::accesskey", None),
        ("area::alt", None),
        ("area::coords", None),
        ("area::href", Uri),
        ("area::nohref", None),
        ("area::onblur", Script),
        ("area::onfocus", Script),
        ("area::shape", None),
        ("area::tabindex", None),
        // quoting and edits
        ("blockquote::cite", Uri),
        ("q::cite", Uri),
        ("del::cite", Uri),
        ("del::datetime", None),
        ("ins::cite", Uri),
        ("ins::datetime", None),
        // br
        ("br::clear", None),
        // button
        ("button::accesskey", None),
        ("button::disabled", None),
        ("button::name", LocalName),
        ("button::onblur", Script),
        ("button::onfocus", Script),
        ("button::tabindex", None),
        ("button::type", None),
        ("button::value", None),
        // caption
        ("caption::align", None),
        // col / colgroup
        ("col::align", None),
        ("col::char", None),
        ("col::charoff", None),
        ("col::span", None),
        ("col::valign", None),
        ("col::width", None),
        ("colgroup::align", None),
        ("colgroup::char", None),
        ("colgroup::charoff", None),
        ("colgroup::span", None),
        ("colgroup::valign", None),
        ("colgroup::width", None),
        // alignment on block elements
        ("div::align", None),
        ("h1::align", None),
        ("h2::align", None),
        ("h3::align", None),
        ("h4::align", None),
        ("h5::align", None),
        ("h6::align", None),
        ("p::align", None),
        // lists
        ("dir::compact", None),
        ("dl::compact", None),
        ("li::type", None),
        ("li::value", None),
        ("menu::compact", None),
        ("ol::compact", None),
        ("ol::start", None),
        ("ol::type", None),
        ("ul::compact", None),
        ("ul::type", None),
        // font
        ("font::color", None),
        ("font::face", None),
        ("font::size", None),
        // form
        ("form::accept", None),
        ("form::accept-charset", None),
        ("form::action", Uri),
        ("form::enctype", None),
        ("form::method", None),
        ("form::name", GlobalName),
        ("form::onreset", Script),
        ("form::onsubmit", Script),
        // hr
        ("hr::align", None),
        ("hr::noshade", None),
        ("hr::size", None),
        ("hr::width", None),
        // img
        ("img::align", None),
        ("img::alt", None),
        ("img::border", None),
        ("img::height", None),
        ("img::hspace", None),
        ("img::ismap", None),
        ("img::longdesc", Uri),
        ("img::name", GlobalName),
        ("img::src", Uri),
        ("img::usemap", UriFragment),
        ("img::vspace", None),
        ("img::width", None),
        // input
        ("input::accept", None),
        ("input::accesskey", None),
        ("input::align", None),
        ("input::alt", None),
        ("input::checked", None),
        ("input::disabled", None),
        ("input::ismap", None),
        ("input::maxlength", None),
        ("input::name", LocalName),
        ("input::onblur", Script),
        ("input::onchange", Script),
        ("input::onfocus", Script),
        ("input::onselect", Script),
        ("input::readonly", None),
        ("input::size", None),
        ("input::src", Uri),
        ("input::tabindex", None),
        ("input::type", None),
        ("input::usemap", UriFragment),
        ("input::value", None),
        // label / legend
        ("label::accesskey", None),
        ("label::for", IdRef),
        ("label::onblur", Script),
        ("label::onfocus", Script),
        ("legend::accesskey", None),
        ("legend::align", None),
        // map
        ("map::name", GlobalName),
        // optgroup / option
        ("optgroup::disabled", None),
        ("optgroup::label", None),
        ("option::disabled", None),
        ("option::label", None),
        ("option::selected", None),
        ("option::value", None),
        // pre
        ("pre::width", None),
        // select
        ("select::disabled", None),
        ("select::multiple", None),
        ("select::name", LocalName),
        ("select::onblur", Script),
        ("select::onchange", Script),
        ("select::onfocus", Script),
        ("select::size", None),
        ("select::tabindex", None),
        // table
        ("table::align", None),
        ("table::bgcolor", None),
        ("table::border", None),
        ("table::cellpadding", None),
        ("table::cellspacing", None),
        ("table::frame", None),
        ("table::rules", None),
        ("table::summary", None),
        ("table::width", None),
        // table sections
        ("tbody::align", None),
        ("tbody::char", None),
        ("tbody::charoff", None),
        ("tbody::valign", None),
        ("tfoot::align", None),
        ("tfoot::char", None),
        ("tfoot::charoff", None),
        ("tfoot::valign", None),
        ("thead::align", None),
        ("thead::char", None),
        ("thead::charoff", None),
        ("thead::valign", None),
        ("tr::align", None),
        ("tr::bgcolor", None),
        ("tr::char", None),
        ("tr::charoff", None),
        ("tr::valign", None),
        // table cells
        ("td::abbr", None),
        ("td::align", None),
        ("td::axis", None),
        ("td::bgcolor", None),
        ("td::char", None),
        ("td::charoff", None),
        ("td::colspan", None),
        ("td::headers", IdRefs),
        ("td::height", None),
        ("td::nowrap", None),
        ("td::rowspan", None),
        ("td::scope", None),
        ("td::valign", None),
        ("td::width", None),
        ("th::abbr", None),
        ("th::align", None),
        ("th::axis", None),
        ("th::bgcolor", None),
        ("th::char", None),
        ("th::charoff", None),
        ("th::colspan", None),
        ("th::headers", IdRefs),
        ("th::height", None),
        ("th::nowrap", None),
        ("th::rowspan", None),
        ("th::scope", None),
        ("th::valign", None),
        ("th::width", None),
        // textarea
        ("textarea::accesskey", None),
        ("textarea::cols", None),
        ("textarea::disabled", None),
        ("textarea::name", LocalName),
        ("textarea::onblur", Script),
        ("textarea::onchange", Script),
        ("textarea::onfocus", Script),
        ("textarea::onselect", Script),
        ("textarea::readonly", None),
        ("textarea::rows", None),
        ("textarea::tabindex", None),
    ];
    table.into_iter().collect()
});

/// Look up the type of `attr` on `tag`, trying the tag-specific key first
/// and the wildcard second. `None` (the Option) means unknown: drop it.
pub fn attr_type(tag: &str, attr: &str) -> Option<AttrType> {
    let key = format!("{tag}::{attr}");
    ATTRIBS
        .get(key.as_str())
        .or_else(|| {
            let wild = format!("*::{attr}");
            ATTRIBS.get(wild.as_str())
        })
        .copied()
}
