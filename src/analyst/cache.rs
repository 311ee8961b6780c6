use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use super::intent::Intent;
use crate::clock::SharedClock;

/// Cache key for a classified query: the intent followed by its parameters
/// in key order, so equal parameter sets always map to the same key.
pub fn cache_key(intent: Intent, parameters: &BTreeMap<String, String>) -> String {
    let params = parameters
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("{}:{}", intent.as_str(), params)
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: String,
    pub cached_at: DateTime<Utc>,
}

/// Answers keyed by [`cache_key`], valid for a fixed time-to-live.
///
/// Expired entries are evicted lazily when they are looked up.
pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    clock: SharedClock,
}

impl ResultCache {
    pub fn new(ttl: Duration, clock: SharedClock) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();

        let fresh = match self.entries.get(key) {
            Some(entry) if self.is_fresh(&entry, now) => Some(entry.value.clone()),
            Some(_) => None,
            None => return None,
        };

        if fresh.is_none() {
            self.entries.remove_if(key, |_, entry| !self.is_fresh(entry, now));
        }
        fresh
    }

    pub fn insert(&self, key: String, value: String) {
        let entry = CacheEntry {
            value,
            cached_at: self.clock.now(),
        };
        self.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.cached_at < self.ttl
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::ManualClock;

    fn cache(clock: &ManualClock) -> ResultCache {
        ResultCache::new(Duration::minutes(5), Arc::new(clock.clone()))
    }

    #[test]
    fn test_key_is_independent_of_insertion_order() {
        let mut a = BTreeMap::new();
        a.insert("period".to_string(), "week".to_string());
        a.insert("city".to_string(), "Madrid".to_string());

        let mut b = BTreeMap::new();
        b.insert("city".to_string(), "Madrid".to_string());
        b.insert("period".to_string(), "week".to_string());

        assert_eq!(cache_key(Intent::SalesSummary, &a), cache_key(Intent::SalesSummary, &b));
        assert_eq!(
            cache_key(Intent::SalesSummary, &a),
            "sales_summary:city=Madrid,period=week"
        );
    }

    #[test]
    fn test_key_differs_by_intent() {
        let params = BTreeMap::new();
        assert_ne!(
            cache_key(Intent::TopProducts, &params),
            cache_key(Intent::SalesSummary, &params)
        );
    }

    #[test]
    fn test_hit_within_ttl() {
        let clock = ManualClock::default();
        let cache = cache(&clock);
        cache.insert("k".into(), "answer".into());

        clock.advance(Duration::minutes(4));
        assert_eq!(cache.get("k").as_deref(), Some("answer"));
    }

    #[test]
    fn test_expired_entry_is_evicted_on_lookup() {
        let clock = ManualClock::default();
        let cache = cache(&clock);
        cache.insert("k".into(), "answer".into());

        clock.advance(Duration::minutes(5));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reinsert_refreshes_entry() {
        let clock = ManualClock::default();
        let cache = cache(&clock);
        cache.insert("k".into(), "old".into());

        clock.advance(Duration::minutes(4));
        cache.insert("k".into(), "new".into());
        clock.advance(Duration::minutes(4));

        assert_eq!(cache.get("k").as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_miss_on_unknown_key() {
        let clock = ManualClock::default();
        assert_eq!(cache(&clock).get("missing"), None);
    }
}
