//! SAX interface
//!
//! Event-based access to the permissive tokenizer.
//!
//! ## Architecture
//!
//! ```text
//! &str ---> splitter ---> tokenizer ---> SaxHandler callbacks
//! ```
//!
//! ## Event stream
//!
//! - `start_doc` / `end_doc` bracket every parse
//! - `start_tag` / `end_tag` fire only for schema-known elements, with
//!   ASCII-lowercased names
//! - `pcdata` carries ordinary text, already entity-escaped where the
//!   input was not a well-formed reference
//! - `cdata` carries the raw body of CDATA elements (script, style, ...)
//! - `rcdata` carries the re-encoded body of RCDATA elements (textarea)
//!
//! Parsing is total: any input produces a well-defined event stream, and
//! the cursor only moves forward.

use crate::core::attributes::Attr;
use crate::core::tokenizer::Tokenizer;

/// Receiver for parse events.
///
/// Implement the methods you care about; every method defaults to a no-op.
/// The `attrs` vector passed to [`start_tag`](SaxHandler::start_tag) is the
/// parser's own container and may be mutated in place, but must not be
/// retained across events.
pub trait SaxHandler {
    /// Called once before any other event.
    fn start_doc(&mut self) {}

    /// Called once after all other events.
    fn end_doc(&mut self) {}

    /// Called for each known start tag, with its parsed attributes.
    fn start_tag(&mut self, name: &str, attrs: &mut Vec<Attr>) {
        let _ = (name, attrs);
    }

    /// Called for each known end tag.
    fn end_tag(&mut self, name: &str) {
        let _ = name;
    }

    /// Ordinary character data, safe to append to HTML output.
    fn pcdata(&mut self, text: &str) {
        let _ = text;
    }

    /// Re-encoded RCDATA element body.
    fn rcdata(&mut self, text: &str) {
        let _ = text;
    }

    /// Raw CDATA element body.
    fn cdata(&mut self, text: &str) {
        let _ = text;
    }
}

/// Parse `html`, pushing events into `handler`.
pub fn parse<H: SaxHandler>(html: &str, handler: &mut H) {
    Tokenizer::new(html).run(handler);
}
