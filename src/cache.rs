//! Read-through memo of loaded tables, keyed by source identity.
//!
//! Entries live for the whole process and are never invalidated: court exports
//! are treated as immutable for a session. Each key owns a `OnceCell`, so
//! concurrent requests for the same key share a single underlying read.

use crate::error::Result;
use crate::types::RecordSet;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Identity of an external table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKey {
    /// A table on disk, keyed by its path as given
    Path(PathBuf),
    /// An in-memory table, keyed by the hex SHA-256 of its bytes
    Content(String),
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKey::Path(path) => write!(f, "path:{}", path.display()),
            SourceKey::Content(digest) => write!(f, "sha256:{}", digest),
        }
    }
}

type Slot = Arc<OnceCell<Arc<RecordSet>>>;

/// Single-flight memoization map for table loads
#[derive(Default)]
pub struct LoadCache {
    entries: Mutex<HashMap<SourceKey, Slot>>,
    reads: AtomicUsize,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached record set for `key`, running `load` only if no
    /// earlier call has populated it. Failed loads are not cached, so a later
    /// request for the same key tries again.
    pub async fn get_or_load<F, Fut>(&self, key: SourceKey, load: F) -> Result<Arc<RecordSet>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RecordSet>>,
    {
        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.entry(key.clone()).or_default().clone()
        };

        if let Some(hit) = slot.get() {
            tracing::debug!(source = %key, "load cache hit");
            return Ok(hit.clone());
        }

        let result = slot
            .get_or_try_init(|| async {
                tracing::debug!(source = %key, "load cache miss, reading source");
                self.reads.fetch_add(1, Ordering::SeqCst);
                load().await.map(Arc::new)
            })
            .await;

        match result {
            Ok(value) => Ok(value.clone()),
            Err(e) => {
                self.forget_empty_slot(&key, &slot);
                Err(e)
            }
        }
    }

    /// Drop the slot a failed load left behind, unless another request has
    /// since filled or replaced it
    fn forget_empty_slot(&self, key: &SourceKey, slot: &Slot) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let stale = entries
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized());
        if stale {
            entries.remove(key);
        }
    }

    /// Number of keys holding a loaded record set
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of times a loader actually ran
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::{Court, Record};
    use std::time::Duration;

    fn sample_set() -> RecordSet {
        RecordSet::new(vec![Record {
            court: Court::Stf,
            decision_id: "1".to_string(),
            summary_text: "Ementa".to_string(),
            outcome: "Procedente".to_string(),
        }])
    }

    #[tokio::test]
    async fn test_second_request_reuses_first_read() {
        let cache = LoadCache::new();
        let key = SourceKey::Path(PathBuf::from("stf.xlsx"));

        let first = cache
            .get_or_load(key.clone(), || async { Ok(sample_set()) })
            .await
            .unwrap();
        let second = cache
            .get_or_load(key, || async { Ok(RecordSet::default()) })
            .await
            .unwrap();

        // the empty loader never ran
        assert_eq!(first, second);
        assert_eq!(second.len(), 1);
        assert_eq!(cache.reads(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let cache = LoadCache::new();
        let key = SourceKey::Content("abc".to_string());

        let err = cache
            .get_or_load(key.clone(), || async {
                Err(Error::SourceUnreadable("broken".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SourceUnreadable(_)));
        assert!(cache.is_empty());

        let retried = cache
            .get_or_load(key, || async { Ok(sample_set()) })
            .await
            .unwrap();
        assert_eq!(retried.len(), 1);
        assert_eq!(cache.reads(), 2);
    }

    #[tokio::test]
    async fn test_failed_loads_leave_no_slots() {
        let cache = LoadCache::new();

        for digest in ["a", "b", "c"] {
            let result = cache
                .get_or_load(SourceKey::Content(digest.to_string()), || async {
                    Err(Error::SourceUnreadable("broken upload".to_string()))
                })
                .await;
            assert!(result.is_err());
        }

        assert!(cache.entries.lock().unwrap().is_empty());
        assert_eq!(cache.reads(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_share_one_read() {
        let cache = Arc::new(LoadCache::new());
        let key = SourceKey::Path(PathBuf::from("shared.csv"));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_load(key, || async {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok(sample_set())
                        })
                        .await
                })
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            assert_eq!(result.unwrap().unwrap().len(), 1);
        }
        assert_eq!(cache.reads(), 1);
    }
}
