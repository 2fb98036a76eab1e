//! threadlens - local analysis daemon for email-thread pages
//!
//! A thin browser extension posts a page's outerHTML and URL to this daemon;
//! the daemon derives the thread identity, extracts and normalizes the
//! messages, sends them to a configured LLM provider, and caches the
//! structured analysis per thread.

pub mod analysis;
pub mod analyzer;
pub mod cache;
pub mod config;
pub mod error;
pub mod extractor;
pub mod prompt;
pub mod provider;
pub mod server;
pub mod testing;

pub use error::ThreadlensError;
