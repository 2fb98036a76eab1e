//! Message extraction and normalization
//!
//! Selects every node that structurally represents one delivered message,
//! lifts out sender, timestamp, and body, and strips quoted replies and
//! signature blocks from the body text. Nodes whose cleaned body carries no
//! real content are dropped.

use std::sync::LazyLock;

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::selector;

/// One noise-stripped message lifted out of a conversation view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub sender: String,
    pub timestamp: String,
    pub body: String,
    /// 0-based position in the extracted sequence, in document order
    pub index: usize,
}

/// Bodies shorter than this are structural nodes, not real messages.
const MIN_BODY_LEN: usize = 10;

static MESSAGE_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| selector(".ii.gt, [data-message-id], .adn.ads"));

static SENDER: LazyLock<Selector> =
    LazyLock::new(|| selector(".go .gD, .qu .go .gD, [email], .yW span[email]"));

static TIMESTAMP: LazyLock<Selector> =
    LazyLock::new(|| selector(r#".g3, [title*=":"], .gH .g3"#));

static BODY: LazyLock<Selector> =
    LazyLock::new(|| selector(r#".ii.gt div[dir="ltr"], .ii.gt .a3s, .adn.ads .a3s"#));

static NOISE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    vec![
        // Quoted replies and forwarded-message markers
        selector(".gmail_quote, .gmail_extra, .moz-cite-prefix, blockquote"),
        // Signature blocks
        selector(r#".gmail_signature, [data-smartmail="gmail_signature"]"#),
    ]
});

pub(super) fn extract(document: &Html) -> Vec<NormalizedMessage> {
    let containers = message_containers(document);
    let mut messages = Vec::new();

    for (position, container) in containers.iter().enumerate() {
        if let Some(message) = extract_single(*container, position, messages.len()) {
            messages.push(message);
        }
    }

    messages
}

/// Containers in document order. A matching node nested inside an already
/// matched container is the same message seen through a second selector and
/// is skipped.
fn message_containers(document: &Html) -> Vec<ElementRef<'_>> {
    let mut containers: Vec<ElementRef> = Vec::new();

    for element in document.select(&MESSAGE_CONTAINER) {
        let nested = containers
            .iter()
            .any(|kept| element.ancestors().any(|ancestor| ancestor.id() == kept.id()));
        if !nested {
            containers.push(element);
        }
    }

    containers
}

fn extract_single(
    container: ElementRef<'_>,
    position: usize,
    index: usize,
) -> Option<NormalizedMessage> {
    let sender = container
        .select(&SENDER)
        .next()
        .map(|element| attr_or_text(element, "email"))
        .unwrap_or_else(|| format!("Unknown Sender {}", position + 1));

    let timestamp = container
        .select(&TIMESTAMP)
        .next()
        .map(|element| attr_or_text(element, "title"))
        .unwrap_or_else(|| "Unknown Time".to_string());

    let body = container
        .select(&BODY)
        .next()
        .map(clean_body)
        .unwrap_or_default();

    if body.len() < MIN_BODY_LEN {
        debug!(position, "skipping message node with no meaningful content");
        return None;
    }

    Some(NormalizedMessage {
        sender,
        timestamp,
        body,
        index,
    })
}

/// Prefer the machine-readable attribute over rendered display text.
fn attr_or_text(element: ElementRef<'_>, attr: &str) -> String {
    element
        .value()
        .attr(attr)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| collapse_whitespace(&element.text().collect::<String>()))
}

/// Rendered text of the content region with noise sub-trees removed.
fn clean_body(region: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(*region, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        if let Some(element) = ElementRef::wrap(child) {
            if NOISE.iter().any(|noise| noise.matches(&element)) {
                continue;
            }
            collect_text(child, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
