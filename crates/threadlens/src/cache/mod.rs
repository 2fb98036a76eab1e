//! Per-thread analysis cache
//!
//! Holds the most recent analysis for each thread behind the storage key
//! `analysis_{threadId}`. Bounded LRU rather than an ever-growing map: the
//! browser side simply re-analyzes when an old thread has been evicted.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;

/// One cached analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAnalysis {
    pub thread_id: String,
    pub analysis: AnalysisResult,
    pub timestamp: DateTime<Utc>,
}

/// Bounded store of the last successful analysis per thread
pub struct AnalysisCache {
    entries: Mutex<LruCache<String, CachedAnalysis>>,
}

impl AnalysisCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Storage key for one thread's analysis
    pub fn key_for(thread_id: &str) -> String {
        format!("analysis_{thread_id}")
    }

    /// Store the analysis for a thread, overwriting any previous entry.
    pub fn insert(&self, thread_id: &str, analysis: AnalysisResult) -> CachedAnalysis {
        let entry = CachedAnalysis {
            thread_id: thread_id.to_string(),
            analysis,
            timestamp: Utc::now(),
        };
        self.lock().put(Self::key_for(thread_id), entry.clone());
        entry
    }

    pub fn get(&self, thread_id: &str) -> Option<CachedAnalysis> {
        self.lock().get(&Self::key_for(thread_id)).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, CachedAnalysis>> {
        // A poisoned lock means a panic happened mid-operation; the map
        // itself is still structurally sound.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
