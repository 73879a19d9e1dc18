//! Division resolution: point-in-polygon membership over administrative
//! boundaries, fronted by a TTL cache keyed on the rounded coordinate.

pub mod cache;
pub mod index;
pub mod polygon;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use cache::{CacheKey, CachedResolution, PolygonCache};
pub use index::{parse_coordinate, DivisionSource, PolygonIndex};
pub use polygon::{parse_ring, ring_contains};
