use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use roadwatch_common::Division;

use crate::cache::{CacheKey, CachedResolution, PolygonCache};
use crate::polygon::{ring_contains, MIN_RING_VERTICES};

/// Read-only access to division boundaries and rosters.
#[async_trait]
pub trait DivisionSource: Send + Sync {
    /// All divisions in storage order. Matching is first-wins over this order.
    async fn list_divisions(&self) -> Result<Vec<Division>>;

    async fn division_by_id(&self, id: Uuid) -> Result<Option<Division>>;
}

/// Parse a coordinate carried as text (webhook fields, form fields).
/// Anything that is not a finite float is rejected.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Resolves coordinates to the division whose boundary contains them.
///
/// Lookups are fail-closed: storage errors surface as `None` ("outside
/// jurisdiction") and are logged, never propagated.
pub struct PolygonIndex {
    source: Arc<dyn DivisionSource>,
    cache: PolygonCache,
}

impl PolygonIndex {
    pub fn new(source: Arc<dyn DivisionSource>, cache_ttl: Duration) -> Self {
        Self {
            source,
            cache: PolygonCache::new(cache_ttl),
        }
    }

    pub fn cache(&self) -> &PolygonCache {
        &self.cache
    }

    pub async fn resolve(&self, lat: f64, lng: f64) -> Option<Division> {
        self.resolve_at(lat, lng, Utc::now()).await
    }

    pub async fn resolve_at(&self, lat: f64, lng: f64, now: DateTime<Utc>) -> Option<Division> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }

        let key = CacheKey::new(lat, lng);

        if let Some(cached) = self.cache.get(key, now).await {
            return match cached {
                CachedResolution::Outside => None,
                CachedResolution::Inside { division_id, division_name } => {
                    debug!(division = division_name.as_str(), "Polygon cache hit");
                    match self.source.division_by_id(division_id).await {
                        Ok(division) => division,
                        Err(e) => {
                            warn!(error = %e, %division_id, "Failed to reload cached division");
                            None
                        }
                    }
                }
            };
        }

        let divisions = match self.source.list_divisions().await {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "Division scan failed, treating point as outside jurisdiction");
                return None;
            }
        };

        let found = find_containing(&divisions, lat, lng).cloned();

        let resolution = match &found {
            Some(d) => CachedResolution::Inside {
                division_id: d.id,
                division_name: d.name.clone(),
            },
            None => CachedResolution::Outside,
        };
        self.cache.insert(key, resolution, now).await;

        found
    }
}

/// First division (in slice order) whose outer ring contains the point.
pub fn find_containing(divisions: &[Division], lat: f64, lng: f64) -> Option<&Division> {
    divisions.iter().find(|d| {
        if d.boundary.len() < MIN_RING_VERTICES {
            debug!(division = d.name.as_str(), "Skipping division without usable boundary");
            return false;
        }
        ring_contains(&d.boundary, lng, lat)
    })
}
