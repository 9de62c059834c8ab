//! Primitive polygon operations built on the `geo` crate

use geo::algorithm::buffer::{BufferStyle, LineJoin};
use geo::{Area, BooleanOps, BoundingRect, Buffer, MultiPolygon, Polygon};
use rstar::AABB;

/// Corners sharper than this angle (radians) are bevelled; all others are mitred
const MITRE_MIN_ANGLE: f64 = 0.1;

pub fn empty() -> MultiPolygon<f64> {
    MultiPolygon::new(Vec::new())
}

/// Explode a multipolygon into its simple polygons
pub fn dump(geometry: &MultiPolygon<f64>) -> Vec<Polygon<f64>> {
    geometry.0.clone()
}

pub fn area(geometry: &MultiPolygon<f64>) -> f64 {
    geometry.unsigned_area()
}

/// Whether cutting left nothing with positive area
pub fn is_degenerate(geometry: &MultiPolygon<f64>) -> bool {
    geometry.0.is_empty() || area(geometry) <= 0.0
}

/// Union many geometries by pairwise reduction
pub fn union_all<I>(parts: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = MultiPolygon<f64>>,
{
    let mut layer: Vec<MultiPolygon<f64>> =
        parts.into_iter().filter(|part| !part.0.is_empty()).collect();

    while layer.len() > 1 {
        let mut next = Vec::with_capacity(layer.len() / 2 + 1);
        let mut parts = layer.into_iter();
        while let Some(a) = parts.next() {
            match parts.next() {
                Some(b) => next.push(a.union(&b)),
                None => next.push(a),
            }
        }
        layer = next;
    }

    layer.pop().unwrap_or_else(empty)
}

/// Mitre-joined buffer; negative distances shrink
pub fn buffer(geometry: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    if geometry.0.is_empty() || distance == 0.0 {
        return geometry.clone();
    }
    geometry.buffer_with_style(BufferStyle::new(distance).line_join(LineJoin::Miter(MITRE_MIN_ANGLE)))
}

/// Morphological closing: grow by `tolerance`, then shrink by it.
///
/// Gaps and zero-width slivers narrower than twice the tolerance disappear
/// while straight outer edges stay where they were.
pub fn close(geometry: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    buffer(&buffer(geometry, tolerance), -tolerance)
}

/// Area shared by two geometries
pub fn overlap_area(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> f64 {
    if !envelopes_intersect(a, b) {
        return 0.0;
    }
    a.intersection(b).unsigned_area()
}

/// Bounding box as an R-tree envelope
pub fn envelope(geometry: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    geometry
        .bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}

pub fn polygon_envelope(polygon: &Polygon<f64>) -> Option<AABB<[f64; 2]>> {
    polygon
        .bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}

/// Cheap pre-check before running boolean operations
pub fn envelopes_intersect(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    match (a.bounding_rect(), b.bounding_rect()) {
        (Some(a), Some(b)) => {
            a.min().x <= b.max().x
                && a.max().x >= b.min().x
                && a.min().y <= b.max().y
                && a.max().y >= b.min().y
        }
        _ => false,
    }
}

#[cfg(test)]
pub(crate) mod test_shapes {
    use geo::{polygon, MultiPolygon, Polygon};

    pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ]
    }

    pub fn rects(parts: &[(f64, f64, f64, f64)]) -> MultiPolygon<f64> {
        MultiPolygon::new(parts.iter().map(|&(x0, y0, x1, y1)| rect(x0, y0, x1, y1)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::test_shapes::rects;
    use super::*;

    #[test]
    fn test_union_all() {
        let parts = vec![
            rects(&[(0.0, 0.0, 2.0, 2.0)]),
            rects(&[(1.0, 0.0, 3.0, 2.0)]),
            rects(&[(10.0, 10.0, 11.0, 11.0)]),
            empty(),
        ];
        let union = union_all(parts);
        assert!((area(&union) - 7.0).abs() < 1e-9, "area was {}", area(&union));
        assert_eq!(union.0.len(), 2);
        assert!(union_all(Vec::new()).0.is_empty());
    }

    #[test]
    fn test_close_removes_narrow_gap() {
        // Two squares separated by a gap narrower than twice the tolerance
        let geometry = rects(&[(0.0, 0.0, 1.0, 1.0), (1.005, 0.0, 2.0, 1.0)]);
        let closed = close(&geometry, 0.01);

        assert_eq!(closed.0.len(), 1, "gap should close into one polygon");
        assert!((area(&closed) - 2.0).abs() < 1e-3, "area was {}", area(&closed));
    }

    #[test]
    fn test_close_keeps_square() {
        let geometry = rects(&[(0.0, 0.0, 10.0, 10.0)]);
        let closed = close(&geometry, 0.01);
        assert!((area(&closed) - 100.0).abs() < 1e-9, "area was {}", area(&closed));
    }

    #[test]
    fn test_buffer_mitres_corners() {
        let geometry = rects(&[(0.0, 0.0, 10.0, 10.0)]);
        let grown = buffer(&geometry, 0.01);
        assert!((area(&grown) - 10.02 * 10.02).abs() < 1e-9, "area was {}", area(&grown));
    }

    #[test]
    fn test_clip_against_closed_square_keeps_no_corner_area() {
        let first = rects(&[(0.0, 0.0, 10.0, 10.0)]);
        let second = rects(&[(5.0, 0.0, 15.0, 10.0)]);
        let residue = second.difference(&close(&first, 0.01));
        assert!((area(&residue) - 50.0).abs() < 1e-9, "area was {}", area(&residue));
    }

    #[test]
    fn test_overlap_area() {
        let a = rects(&[(0.0, 0.0, 2.0, 2.0)]);
        let b = rects(&[(1.0, 1.0, 3.0, 3.0)]);
        let c = rects(&[(5.0, 5.0, 6.0, 6.0)]);
        assert!((overlap_area(&a, &b) - 1.0).abs() < 1e-9);
        assert_eq!(overlap_area(&a, &c), 0.0);
    }

    #[test]
    fn test_degenerate() {
        assert!(is_degenerate(&empty()));
        assert!(!is_degenerate(&rects(&[(0.0, 0.0, 1.0, 1.0)])));
    }
}
