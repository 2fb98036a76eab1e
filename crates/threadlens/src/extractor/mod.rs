//! DOM snapshot extraction pipeline
//!
//! Parses a captured thread page (outerHTML plus the address it was taken
//! from) and lifts out a stable thread identity and the normalized messages.
//! The mail client's markup is not contractually stable, so everything here
//! is heuristic structural matching with ordered fallbacks; a snapshot that
//! matches nothing yields `None`/empty rather than an error.

mod messages;
mod thread_id;

pub use messages::NormalizedMessage;

use scraper::{Html, Selector};

/// A parsed page snapshot ready for extraction.
///
/// `scraper::Html` is not `Send`; parse, extract, and drop the snapshot
/// without holding it across an await.
pub struct DomSnapshot {
    document: Html,
    url: String,
}

impl DomSnapshot {
    /// Parse a captured page. The URL participates in thread identity
    /// derivation.
    pub fn parse(html: &str, url: &str) -> Self {
        Self {
            document: Html::parse_document(html),
            url: url.to_string(),
        }
    }

    /// Derive the thread identity, or `None` when the snapshot is not a
    /// conversation view (an inbox listing, say).
    pub fn thread_id(&self) -> Option<String> {
        thread_id::resolve(&self.document, &self.url)
    }

    /// Extract the normalized messages in document order.
    pub fn messages(&self) -> Vec<NormalizedMessage> {
        messages::extract(&self.document)
    }
}

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector parses")
}
