use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Entries beyond this count trigger a sweep of expired keys on insert.
const PRUNE_THRESHOLD: usize = 10_000;

/// Coordinate rounded to 6 decimal places (~0.1 m), stored as fixed-point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lat_e6: i64,
    lng_e6: i64,
}

impl CacheKey {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat_e6: (lat * 1_000_000.0).round() as i64,
            lng_e6: (lng * 1_000_000.0).round() as i64,
        }
    }
}

/// What a previous scan concluded for a coordinate.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedResolution {
    Inside {
        division_id: Uuid,
        division_name: String,
    },
    Outside,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    resolution: CachedResolution,
    cached_at: DateTime<Utc>,
}

/// Read-mostly TTL cache of polygon lookups. Entries are never mutated after
/// insert; an expired entry reads as a miss and is overwritten by the next scan.
pub struct PolygonCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl PolygonCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, key: CacheKey, now: DateTime<Utc>) -> Option<CachedResolution> {
        let entries = self.entries.read().await;
        let entry = entries.get(&key)?;
        if now - entry.cached_at > self.ttl {
            return None;
        }
        Some(entry.resolution.clone())
    }

    pub async fn insert(&self, key: CacheKey, resolution: CachedResolution, now: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        if entries.len() > PRUNE_THRESHOLD {
            let ttl = self.ttl;
            entries.retain(|_, e| now - e.cached_at <= ttl);
        }
        entries.insert(
            key,
            CacheEntry {
                resolution,
                cached_at: now,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop everything, e.g. after division boundaries are edited.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_rounds_to_six_decimals() {
        assert_eq!(CacheKey::new(18.6200001, 73.8000004), CacheKey::new(18.62, 73.80));
        assert_ne!(CacheKey::new(18.620001, 73.80), CacheKey::new(18.62, 73.80));
    }

    #[tokio::test]
    async fn hit_within_ttl() {
        let cache = PolygonCache::new(Duration::hours(24));
        let now = Utc::now();
        let key = CacheKey::new(18.62, 73.80);
        cache.insert(key, CachedResolution::Outside, now).await;

        let got = cache.get(key, now + Duration::hours(23)).await;
        assert_eq!(got, Some(CachedResolution::Outside));
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = PolygonCache::new(Duration::hours(24));
        let now = Utc::now();
        let key = CacheKey::new(18.62, 73.80);
        cache
            .insert(
                key,
                CachedResolution::Inside {
                    division_id: Uuid::new_v4(),
                    division_name: "D1".to_string(),
                },
                now,
            )
            .await;

        assert!(cache.get(key, now + Duration::hours(25)).await.is_none());
    }

    #[tokio::test]
    async fn clear_empties_cache() {
        let cache = PolygonCache::new(Duration::hours(1));
        cache
            .insert(CacheKey::new(1.0, 2.0), CachedResolution::Outside, Utc::now())
            .await;
        assert_eq!(cache.len().await, 1);
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
