use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::entity_id::Identity;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    input: String,
    allow_derived: bool,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    value: Identity,
    inserted: Instant,
}

/// Bounded memo of successful identity parses.
///
/// Entries are evicted least-recently-used first once `capacity` is reached,
/// and expire `max_age` after insertion. Failed parses are never stored.
#[derive(Debug)]
pub struct EntityIdCache {
    entries: Mutex<LruCache<CacheKey, Entry>>,
    max_age: Duration,
}

impl EntityIdCache {
    pub fn new(capacity: NonZeroUsize, max_age: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            max_age,
        }
    }

    /// Build from config values; `None` when the capacity is zero (cache disabled).
    pub fn from_settings(capacity: usize, max_age: Duration) -> Option<Self> {
        NonZeroUsize::new(capacity).map(|c| Self::new(c, max_age))
    }

    pub fn get(&self, input: &str, allow_derived: bool) -> Option<Identity> {
        self.get_at(input, allow_derived, Instant::now())
    }

    pub fn insert(&self, input: &str, allow_derived: bool, value: Identity) {
        self.insert_at(input, allow_derived, value, Instant::now());
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn get_at(&self, input: &str, allow_derived: bool, now: Instant) -> Option<Identity> {
        let key = CacheKey {
            input: input.to_string(),
            allow_derived,
        };
        let mut entries = self.entries.lock();
        let entry = *entries.get(&key)?;
        if now.saturating_duration_since(entry.inserted) >= self.max_age {
            entries.pop(&key);
            return None;
        }
        Some(entry.value)
    }

    fn insert_at(&self, input: &str, allow_derived: bool, value: Identity, now: Instant) {
        let key = CacheKey {
            input: input.to_string(),
            allow_derived,
        };
        self.entries.lock().put(
            key,
            Entry {
                value,
                inserted: now,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::entity_id::{EntityId, EntityIdCodec};

    fn cache(capacity: usize, max_age: Duration) -> EntityIdCache {
        EntityIdCache::new(NonZeroUsize::new(capacity).unwrap(), max_age)
    }

    fn ident(num: u64) -> Identity {
        Identity::Id(EntityId::new(0, 0, num).unwrap())
    }

    #[test]
    fn evicts_least_recently_used() {
        let c = cache(2, Duration::from_secs(60));
        c.insert("1", false, ident(1));
        c.insert("2", false, ident(2));
        assert_eq!(c.get("1", false), Some(ident(1)));
        c.insert("3", false, ident(3));

        assert_eq!(c.len(), 2);
        assert_eq!(c.get("2", false), None);
        assert_eq!(c.get("1", false), Some(ident(1)));
        assert_eq!(c.get("3", false), Some(ident(3)));
    }

    #[test]
    fn entries_expire() {
        let c = cache(4, Duration::from_secs(10));
        let t0 = Instant::now();
        c.insert_at("1", false, ident(1), t0);

        assert_eq!(c.get_at("1", false, t0 + Duration::from_secs(9)), Some(ident(1)));
        assert_eq!(c.get_at("1", false, t0 + Duration::from_secs(10)), None);
        assert!(c.is_empty());
    }

    #[test]
    fn strict_and_lenient_lookups_are_separate() {
        let c = cache(4, Duration::from_secs(60));
        c.insert("x", true, ident(1));
        assert_eq!(c.get("x", false), None);
        assert_eq!(c.get("x", true), Some(ident(1)));
    }

    #[test]
    fn zero_capacity_disables() {
        assert!(EntityIdCache::from_settings(0, Duration::from_secs(1)).is_none());
        assert!(EntityIdCache::from_settings(1, Duration::from_secs(1)).is_some());
    }

    #[test]
    fn codec_results_identical_with_and_without_cache() {
        let shared = Arc::new(cache(16, Duration::from_secs(60)));
        let cached = EntityIdCodec::default().with_cache(shared.clone());
        let plain = EntityIdCodec::default();

        for input in ["0.0.5", "5", "0x0000000000000000000000000000000000000005", "a.b"] {
            for _ in 0..2 {
                assert_eq!(
                    cached.parse(Some(input), "id", false),
                    plain.parse(Some(input), "id", false),
                    "{input}"
                );
            }
        }
        // the malformed input is not memoized
        assert_eq!(shared.len(), 3);
    }
}
