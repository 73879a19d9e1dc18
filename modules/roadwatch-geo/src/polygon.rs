//! Ray-casting point-in-polygon and lenient boundary parsing.
//!
//! Rings are `[lng, lat]` vertex lists (GeoJSON order). Only the outer ring of a
//! polygon is considered; holes are ignored.

use serde_json::Value;
use tracing::warn;

/// Minimum number of usable vertices for a ring to enclose anything.
pub const MIN_RING_VERTICES: usize = 3;

/// Even-odd ray-casting test. Edges are half-open in latitude, so a point lying
/// exactly on a vertex's latitude is counted by one edge only.
///
/// Non-finite vertices are skipped; a ring left with fewer than
/// [`MIN_RING_VERTICES`] usable vertices never contains anything.
pub fn ring_contains(ring: &[[f64; 2]], lng: f64, lat: f64) -> bool {
    if !lng.is_finite() || !lat.is_finite() {
        return false;
    }

    let points: Vec<[f64; 2]> = ring
        .iter()
        .copied()
        .filter(|[x, y]| x.is_finite() && y.is_finite())
        .collect();

    if points.len() != ring.len() {
        warn!(
            skipped = ring.len() - points.len(),
            "Skipping non-numeric boundary vertices"
        );
    }

    if points.len() < MIN_RING_VERTICES {
        return false;
    }

    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let [xi, yi] = points[i];
        let [xj, yj] = points[j];
        if (yi > lat) != (yj > lat) && lng < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Parse a stored boundary into an outer ring.
///
/// Accepts a bare ring (`[[lng, lat], ...]`), a list of rings
/// (`[[[lng, lat], ...], ...]`, first ring used) or a GeoJSON `Polygon`
/// object. Vertices whose coordinates are not numbers (or numeric strings)
/// are dropped with a warning rather than failing the whole boundary.
pub fn parse_ring(value: &Value) -> Vec<[f64; 2]> {
    let coordinates = match value {
        Value::Object(map) => match map.get("coordinates") {
            Some(c) => c,
            None => return Vec::new(),
        },
        other => other,
    };

    let Some(items) = coordinates.as_array() else {
        return Vec::new();
    };

    // A list of rings: take the outer one.
    let ring = match items.first() {
        Some(Value::Array(first)) if first.first().map(Value::is_array).unwrap_or(false) => first,
        _ => items,
    };

    let mut vertices = Vec::with_capacity(ring.len());
    let mut skipped = 0usize;
    for vertex in ring {
        match vertex_from_value(vertex) {
            Some(v) => vertices.push(v),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, kept = vertices.len(), "Dropped malformed boundary vertices");
    }

    vertices
}

fn vertex_from_value(value: &Value) -> Option<[f64; 2]> {
    let pair = value.as_array()?;
    if pair.len() < 2 {
        return None;
    }
    let lng = number_from_value(&pair[0])?;
    let lat = number_from_value(&pair[1])?;
    Some([lng, lat])
}

fn number_from_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Unit square with corners (0,0) and (10,10), `[lng, lat]`.
    fn square() -> Vec<[f64; 2]> {
        vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]
    }

    /// Concave "U" shape open at the top between x=3..7.
    fn u_shape() -> Vec<[f64; 2]> {
        vec![
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [7.0, 10.0],
            [7.0, 3.0],
            [3.0, 3.0],
            [3.0, 10.0],
            [0.0, 10.0],
        ]
    }

    #[test]
    fn inside_square() {
        assert!(ring_contains(&square(), 5.0, 5.0));
        assert!(ring_contains(&square(), 0.5, 9.5));
    }

    #[test]
    fn outside_square() {
        assert!(!ring_contains(&square(), 15.0, 5.0));
        assert!(!ring_contains(&square(), -0.1, 5.0));
        assert!(!ring_contains(&square(), 5.0, 10.5));
    }

    #[test]
    fn concave_notch_is_outside() {
        let ring = u_shape();
        assert!(!ring_contains(&ring, 5.0, 6.0));
        assert!(ring_contains(&ring, 1.5, 6.0));
        assert!(ring_contains(&ring, 5.0, 1.5));
    }

    #[test]
    fn closed_ring_matches_open_ring() {
        let mut closed = square();
        closed.push([0.0, 0.0]);
        for (lng, lat) in [(5.0, 5.0), (15.0, 5.0), (9.9, 0.1)] {
            assert_eq!(ring_contains(&closed, lng, lat), ring_contains(&square(), lng, lat));
        }
    }

    #[test]
    fn containment_unchanged_by_rotation() {
        let ring = u_shape();
        let points = [(5.0, 6.0), (1.5, 6.0), (5.0, 1.5), (11.0, 5.0), (8.5, 9.0)];
        let expected: Vec<bool> = points.iter().map(|(x, y)| ring_contains(&ring, *x, *y)).collect();

        for shift in 1..ring.len() {
            let mut rotated = ring.clone();
            rotated.rotate_left(shift);
            let got: Vec<bool> = points.iter().map(|(x, y)| ring_contains(&rotated, *x, *y)).collect();
            assert_eq!(got, expected, "rotation by {shift} changed containment");
        }
    }

    #[test]
    fn degenerate_ring_never_contains() {
        assert!(!ring_contains(&[], 0.0, 0.0));
        assert!(!ring_contains(&[[0.0, 0.0], [10.0, 10.0]], 5.0, 5.0));
    }

    #[test]
    fn non_finite_vertices_are_skipped() {
        let mut ring = square();
        ring.insert(2, [f64::NAN, 5.0]);
        assert!(ring_contains(&ring, 5.0, 5.0));
    }

    #[test]
    fn non_finite_point_is_outside() {
        assert!(!ring_contains(&square(), f64::NAN, 5.0));
        assert!(!ring_contains(&square(), 5.0, f64::INFINITY));
    }

    #[test]
    fn parse_bare_ring() {
        let ring = parse_ring(&json!([[73.7, 18.5], [73.9, 18.5], [73.9, 18.7]]));
        assert_eq!(ring, vec![[73.7, 18.5], [73.9, 18.5], [73.9, 18.7]]);
    }

    #[test]
    fn parse_geojson_polygon_uses_outer_ring() {
        let ring = parse_ring(&json!({
            "type": "Polygon",
            "coordinates": [
                [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                [[4, 4], [6, 4], [6, 6], [4, 4]]
            ]
        }));
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[1], [10.0, 0.0]);
    }

    #[test]
    fn parse_drops_malformed_vertices() {
        let ring = parse_ring(&json!([[0, 0], ["x", 1], [10, "0"], [10], null, [10, 10]]));
        assert_eq!(ring, vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]);
    }

    #[test]
    fn parse_garbage_is_empty() {
        assert!(parse_ring(&json!(null)).is_empty());
        assert!(parse_ring(&json!({"type": "Point"})).is_empty());
        assert!(parse_ring(&json!("polygon")).is_empty());
    }
}
