//! Thread identity derivation
//!
//! The mail client exposes a thread identifier in several inconsistent
//! places, so identity is resolved through an ordered fallback chain: a
//! token in the URL fragment, then an explicit id attribute in the DOM,
//! then (only when the snapshot actually shows a conversation) a token
//! elsewhere in the URL, and finally a deterministic hash of the URL
//! itself. A snapshot with none of these and no conversation markup is not
//! a thread view and yields no identity.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::selector;

static FRAGMENT_THREAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"thread-([a-f0-9]+)").expect("static regex compiles"));

static URL_THREAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#&]thread-([a-f0-9]+)").expect("static regex compiles"));

static URL_CONVERSATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#&]conversation-([a-f0-9]+)").expect("static regex compiles"));

static THREAD_ATTR: LazyLock<Selector> =
    LazyLock::new(|| selector("[data-thread-id], [data-legacy-thread-id]"));

static CONVERSATION_VIEW: LazyLock<Selector> =
    LazyLock::new(|| selector(r#".ii.gt, [role="main"] [data-thread-perm-id]"#));

pub(super) fn resolve(document: &Html, url: &str) -> Option<String> {
    if let Some(id) = url
        .split_once('#')
        .and_then(|(_, fragment)| capture(&FRAGMENT_THREAD, fragment))
    {
        return Some(id);
    }

    if let Some(element) = document.select(&THREAD_ATTR).next() {
        let value = element
            .value()
            .attr("data-thread-id")
            .or_else(|| element.value().attr("data-legacy-thread-id"));
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            return Some(value.to_string());
        }
    }

    if document.select(&CONVERSATION_VIEW).next().is_none() {
        return None;
    }

    capture(&URL_THREAD, url)
        .or_else(|| capture(&URL_CONVERSATION, url))
        .or_else(|| Some(hash_url(url)))
}

fn capture(pattern: &Regex, haystack: &str) -> Option<String> {
    pattern.captures(haystack).map(|caps| caps[1].to_string())
}

/// The browser side derives fallback ids with a 31-multiply string hash over
/// UTF-16 code units; this mirrors it exactly so ids agree on both sides of
/// the HTTP boundary.
fn hash_url(url: &str) -> String {
    let mut hash: i32 = 0;
    for unit in url.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    format!("{:x}", hash.unsigned_abs())
}
