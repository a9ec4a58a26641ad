//! Session store: a mapping from session id to [`Session`], sharded so
//! that concurrent requests for different sessions never contend on the
//! same lock, with per-shard LRU eviction bounding total memory use.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex as SyncMutex};

use concierge_models::{CommunityReport, EnrichedCandidate, Requirements};
use concierge_scoping::Turn;
use lru::LruCache;
use tokio::sync::Mutex as AsyncMutex;

/// Production shard count. Each shard is an independently-locked LRU
/// cache, so this bounds how many concurrent sessions can be evicting at
/// once without contending on each other.
const SHARD_COUNT: usize = 16;

/// The last completed search for a session, kept so a later negotiate (or
/// a future "show me more") call can refer back to it without rerunning
/// the pipeline.
#[derive(Debug, Clone, Default)]
pub struct LastResult {
    pub requirements: Requirements,
    pub properties: Vec<EnrichedCandidate>,
    pub search_summary: String,
    pub community_analysis: Option<CommunityReport>,
}

/// Server-side memory for one conversational thread.
#[derive(Debug, Default)]
pub struct Session {
    pub transcript: Vec<Turn>,
    pub requirements: Requirements,
    pub last_result: Option<LastResult>,
}

/// A sharded map from session id to `Session`, each entry behind its own
/// `tokio::sync::Mutex` so a chat request only holds the lock while
/// reading/mutating the transcript, never across outbound I/O.
pub struct SessionStore {
    shards: Vec<SyncMutex<LruCache<String, Arc<AsyncMutex<Session>>>>>,
}

impl SessionStore {
    /// Builds a store with the production shard count.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_shards(capacity, SHARD_COUNT)
    }

    /// Builds a store with an explicit shard count. Exposed mainly so
    /// tests can pin `shard_count` to 1 and get deterministic LRU
    /// eviction; production code should use [`SessionStore::new`].
    #[must_use]
    pub fn with_shards(capacity: usize, shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let per_shard = (capacity / shard_count).max(1);
        let cap = NonZeroUsize::new(per_shard).unwrap_or(NonZeroUsize::MIN);
        let shards = (0..shard_count)
            .map(|_| SyncMutex::new(LruCache::new(cap)))
            .collect();
        Self { shards }
    }

    fn shard_for(&self, session_id: &str) -> &SyncMutex<LruCache<String, Arc<AsyncMutex<Session>>>> {
        let mut hasher = DefaultHasher::new();
        session_id.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.shards.len();
        &self.shards[index]
    }

    /// Returns the session for `session_id`, creating an empty one if
    /// absent. Touches the entry's LRU recency either way.
    pub fn get_or_create(&self, session_id: &str) -> Arc<AsyncMutex<Session>> {
        let shard = self.shard_for(session_id);
        let mut cache = shard.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(existing) = cache.get(session_id) {
            return Arc::clone(existing);
        }
        let session = Arc::new(AsyncMutex::new(Session::default()));
        cache.put(session_id.to_owned(), Arc::clone(&session));
        session
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::SessionStore;

    #[test]
    fn returns_the_same_session_for_repeat_ids() {
        let store = SessionStore::with_shards(16, 1);
        let a = store.get_or_create("s1");
        let b = store.get_or_create("s1");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn evicts_least_recently_touched_entry_at_capacity() {
        let store = SessionStore::with_shards(2, 1);
        let first = store.get_or_create("s1");
        let _second = store.get_or_create("s2");
        // touch s1 again so s2 becomes the least-recently-used entry
        let _ = store.get_or_create("s1");
        let _third = store.get_or_create("s3");

        let refreshed_first = store.get_or_create("s1");
        assert!(Arc::ptr_eq(&first, &refreshed_first));

        let fresh_second = store.get_or_create("s2");
        assert!(!Arc::ptr_eq(&_second, &fresh_second));
    }
}
