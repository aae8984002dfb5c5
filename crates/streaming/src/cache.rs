use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use parking_lot::{Mutex, MutexGuard};

use crate::page::ResultPage;

/// Number of cached paginations kept when no capacity is configured.
pub const DEFAULT_SESSION_CAPACITY: usize = 4096;

/// Number of lock stripes guarding paginations.
pub const DEFAULT_LOCK_STRIPES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionKey {
    pub session_id: String,
    pub layer_name: String,
}

impl SessionKey {
    pub fn new(session_id: impl Into<String>, layer_name: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            layer_name: layer_name.into(),
        }
    }
}

/// Full unsliced result of a paginated query.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResult {
    pub result: ResultPage,
    /// Store generation the result was computed from.
    pub generation: u64,
}

/// Cross-request storage for paginated results.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &SessionKey) -> Option<CachedResult>;
    fn put(&self, key: SessionKey, entry: CachedResult);
    fn delete(&self, key: &SessionKey);
}

#[derive(Debug)]
struct SessionEntry {
    value: CachedResult,
    last_used_tick: u64,
}

#[derive(Debug, Default)]
struct SessionCache {
    tick: u64,
    entries: BTreeMap<SessionKey, SessionEntry>,
}

impl SessionCache {
    /// Least recently used key; ties resolve to the smallest key.
    fn lru_key(&self) -> Option<SessionKey> {
        self.entries
            .iter()
            .min_by(|(ka, ea), (kb, eb)| {
                ea.last_used_tick
                    .cmp(&eb.last_used_tick)
                    .then_with(|| ka.cmp(kb))
            })
            .map(|(k, _)| k.clone())
    }
}

/// In-memory [`SessionStore`] with a fixed entry capacity.
///
/// Eviction is LRU by access tick with a tie-break by key ordering, so the same
/// sequence of calls always evicts the same entries.
#[derive(Debug)]
pub struct MemorySessionStore {
    capacity: usize,
    inner: Mutex<SessionCache>,
}

impl MemorySessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(SessionCache::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CAPACITY)
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &SessionKey) -> Option<CachedResult> {
        let mut cache = self.inner.lock();
        cache.tick += 1;
        let tick = cache.tick;
        let entry = cache.entries.get_mut(key)?;
        entry.last_used_tick = tick;
        Some(entry.value.clone())
    }

    fn put(&self, key: SessionKey, value: CachedResult) {
        let mut cache = self.inner.lock();
        cache.tick += 1;
        let tick = cache.tick;
        cache.entries.insert(
            key,
            SessionEntry {
                value,
                last_used_tick: tick,
            },
        );
        while cache.entries.len() > self.capacity {
            let Some(oldest) = cache.lru_key() else {
                break;
            };
            cache.entries.remove(&oldest);
        }
    }

    fn delete(&self, key: &SessionKey) {
        self.inner.lock().entries.remove(key);
    }
}

/// Serializes requests per (session, layer) by hashing keys onto a fixed set of
/// mutexes. Distinct keys only contend when they share a stripe.
#[derive(Debug)]
pub struct SessionLocks {
    stripes: Box<[Mutex<()>]>,
}

impl SessionLocks {
    pub fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn stripe_of(&self, key: &SessionKey) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    pub fn lock(&self, key: &SessionKey) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe_of(key)].lock()
    }
}

impl Default for SessionLocks {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_STRIPES)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{CachedResult, MemorySessionStore, SessionKey, SessionLocks, SessionStore};
    use crate::page::ResultPage;
    use poi::LayerProperties;

    fn entry(generation: u64) -> CachedResult {
        CachedResult {
            result: ResultPage::new(LayerProperties::default(), Vec::new()),
            generation,
        }
    }

    #[test]
    fn get_put_delete() {
        let store = MemorySessionStore::new(8);
        let key = SessionKey::new("user-1", "museum");
        assert_eq!(store.get(&key), None);

        store.put(key.clone(), entry(3));
        assert_eq!(store.get(&key).map(|e| e.generation), Some(3));
        assert_eq!(store.get(&SessionKey::new("user-1", "other")), None);

        store.delete(&key);
        assert!(store.is_empty());
    }

    #[test]
    fn lru_eviction_is_deterministic() {
        let store = MemorySessionStore::new(2);
        let a = SessionKey::new("a", "layer");
        let b = SessionKey::new("b", "layer");
        let c = SessionKey::new("c", "layer");

        store.put(a.clone(), entry(1));
        store.put(b.clone(), entry(1));
        // Touch 'a' so 'b' becomes the oldest.
        assert!(store.get(&a).is_some());
        store.put(c.clone(), entry(1));

        assert_eq!(store.len(), 2);
        assert!(store.get(&a).is_some());
        assert!(store.get(&b).is_none());
        assert!(store.get(&c).is_some());
    }

    #[test]
    fn same_key_maps_to_same_stripe() {
        let locks = SessionLocks::new(16);
        let key = SessionKey::new("user-1", "museum");
        assert_eq!(locks.stripe_of(&key), locks.stripe_of(&key.clone()));
        assert!(locks.stripe_of(&key) < 16);
    }

    #[test]
    fn lock_serializes_one_key() {
        let locks = Arc::new(SessionLocks::new(4));
        let inside = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                std::thread::spawn(move || {
                    let key = SessionKey::new("user-1", "museum");
                    for _ in 0..100 {
                        let _guard = locks.lock(&key);
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker panicked");
        }
    }
}
