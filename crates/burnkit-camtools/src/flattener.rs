//! Curve flattener / path extractor.
//!
//! Turns a shape's transformed outline into polylines in machine coordinates:
//! every cubic span is subdivided at its midpoint until both control points
//! lie within the tolerance of the chord, then Y is inverted against the
//! viewport height (`y' = H - y`) so the output is Y-up.
//!
//! Results are cached per `(shape, viewport height)` until [`PathExtractor::clear_cache`].

use crate::error::{CamToolError, CamToolResult};
use crate::shape::{ControlPoint, Outline, ShapeArena, ShapeId};
use burnkit_core::constants::CURVE_TOLERANCE;
use burnkit_core::{PathSegment, Point, SegmentOrigin};
use lyon::geom::CubicBezierSegment;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Subdivision depth limit; 2^16 spans per curve is far below any tolerance.
const MAX_DEPTH: u32 = 16;

/// Extracts and caches flattened segments for shapes in an arena.
#[derive(Debug)]
pub struct PathExtractor {
    tolerance: f64,
    cache: HashMap<(ShapeId, u64), Arc<Vec<PathSegment>>>,
}

impl Default for PathExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PathExtractor {
    pub fn new() -> Self {
        Self::with_tolerance(CURVE_TOLERANCE)
    }

    /// Extractor with a custom chord tolerance in mm.
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            cache: HashMap::new(),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Flatten one shape into segments, one per surviving subpath.
    ///
    /// Repeated calls with the same shape and viewport height return the
    /// cached list. Subpaths that flatten to fewer than two points are dropped.
    pub fn extract(
        &mut self,
        arena: &ShapeArena,
        id: ShapeId,
        viewport_height: f64,
    ) -> CamToolResult<Arc<Vec<PathSegment>>> {
        let key = (id, viewport_height.to_bits());
        if let Some(cached) = self.cache.get(&key) {
            trace!("Extraction cache hit for shape {:?}", id);
            return Ok(Arc::clone(cached));
        }

        let shape = arena
            .get(id)
            .ok_or_else(|| CamToolError::Geometry(format!("unknown shape {:?}", id)))?;
        let outline = shape.document_outline();
        let origin = SegmentOrigin::new(shape.element_id.clone(), shape.kind.clone());

        let mut segments = Vec::new();
        for points in flatten_outline(&outline, self.tolerance) {
            if points.len() < 2 {
                continue;
            }
            if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
                return Err(CamToolError::Geometry(format!(
                    "{} produced non-finite coordinates",
                    origin
                )));
            }
            let points = points
                .into_iter()
                .map(|p| Point::new(p.x, viewport_height - p.y))
                .collect();
            segments.push(PathSegment::classified(points, origin.clone())?);
        }

        debug!(
            "Extracted {} segment(s) from {}",
            segments.len(),
            origin
        );

        let segments = Arc::new(segments);
        self.cache.insert(key, Arc::clone(&segments));
        Ok(segments)
    }

    /// Number of cached extraction results.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

/// Flatten every subpath of an outline into a vertex list.
pub fn flatten_outline(outline: &Outline, tolerance: f64) -> Vec<Vec<ControlPoint>> {
    outline
        .subpaths
        .iter()
        .map(|subpath| {
            let mut points = vec![subpath.start];
            for span in &subpath.spans {
                flatten_cubic(span, tolerance, &mut points, 0);
            }
            points
        })
        .collect()
}

/// Append the flattened vertices of `span`, excluding its start point.
fn flatten_cubic(
    span: &CubicBezierSegment<f64>,
    tolerance: f64,
    out: &mut Vec<ControlPoint>,
    depth: u32,
) {
    if depth >= MAX_DEPTH || control_deviation(span) <= tolerance {
        out.push(span.to);
        return;
    }
    let (first, second) = span.split(0.5);
    flatten_cubic(&first, tolerance, out, depth + 1);
    flatten_cubic(&second, tolerance, out, depth + 1);
}

/// Largest distance from either control point to the chord.
fn control_deviation(span: &CubicBezierSegment<f64>) -> f64 {
    let chord = span.to - span.from;
    let chord_len = chord.length();
    let distance_to_chord = |p: ControlPoint| {
        let rel = p - span.from;
        if chord_len <= f64::EPSILON {
            rel.length()
        } else {
            (chord.cross(rel) / chord_len).abs()
        }
    };
    distance_to_chord(span.ctrl1).max(distance_to_chord(span.ctrl2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{matrix_transform, Shape};
    use burnkit_core::PathKind;

    fn arena_with(d: &str) -> (ShapeArena, ShapeId) {
        let mut arena = ShapeArena::new();
        let id = arena.insert(Shape::new(
            "shape1",
            "path",
            Outline::from_path_data(d).unwrap(),
        ));
        (arena, id)
    }

    #[test]
    fn test_square_is_closed_and_y_inverted() {
        let (arena, id) = arena_with("M 0 0 L 10 0 L 10 10 L 0 10 Z");
        let mut extractor = PathExtractor::new();
        let segments = extractor.extract(&arena, id, 100.0).unwrap();
        assert_eq!(segments.len(), 1);
        let seg = &segments[0];
        assert_eq!(seg.kind(), PathKind::Closed);
        assert_eq!(seg.start_point(), Point::new(0.0, 100.0));
        assert_eq!(seg.points()[2], Point::new(10.0, 90.0));
        assert_eq!(seg.origin().element_id, "shape1");
    }

    #[test]
    fn test_open_line() {
        let (arena, id) = arena_with("M 0 0 L 10 0");
        let mut extractor = PathExtractor::new();
        let segments = extractor.extract(&arena, id, 0.0).unwrap();
        assert_eq!(segments[0].kind(), PathKind::Open);
        assert_eq!(segments[0].len(), 2);
    }

    #[test]
    fn test_lone_moveto_is_dropped() {
        let (arena, id) = arena_with("M 5 5 M 0 0 L 1 1");
        let mut extractor = PathExtractor::new();
        let segments = extractor.extract(&arena, id, 0.0).unwrap();
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_curve_within_tolerance() {
        let (arena, id) = arena_with("M 0 0 C 0 20 20 20 20 0");
        let mut extractor = PathExtractor::with_tolerance(0.1);
        let segments = extractor.extract(&arena, id, 0.0).unwrap();
        let seg = &segments[0];
        assert!(seg.len() > 4);
        assert_eq!(seg.start_point(), Point::new(0.0, 0.0));
        assert_eq!(seg.end_point(), Point::new(20.0, 0.0));
        // Apex of the symmetric curve is at y = 15 (inverted to -15).
        let lowest = seg.points().iter().map(|p| p.y).fold(f64::MAX, f64::min);
        assert!((lowest + 15.0).abs() < 0.1);
    }

    #[test]
    fn test_finer_tolerance_gives_more_points() {
        let (arena, id) = arena_with("M 0 0 C 0 20 20 20 20 0");
        let coarse = PathExtractor::with_tolerance(1.0)
            .extract(&arena, id, 0.0)
            .unwrap()[0]
            .len();
        let fine = PathExtractor::with_tolerance(0.01)
            .extract(&arena, id, 0.0)
            .unwrap()[0]
            .len();
        assert!(fine > coarse);
    }

    #[test]
    fn test_transform_applied_before_flattening() {
        let mut arena = ShapeArena::new();
        let id = arena.insert(
            Shape::new("t", "rect", Outline::rectangle(0.0, 0.0, 1.0, 1.0))
                .with_transform(matrix_transform([2.0, 0.0, 0.0, 2.0, 5.0, 5.0])),
        );
        let mut extractor = PathExtractor::new();
        let segments = extractor.extract(&arena, id, 10.0).unwrap();
        assert_eq!(segments[0].start_point(), Point::new(5.0, 5.0));
        assert_eq!(segments[0].points()[1], Point::new(7.0, 5.0));
        assert_eq!(segments[0].points()[2], Point::new(7.0, 3.0));
    }

    #[test]
    fn test_cache_returns_same_list() {
        let (arena, id) = arena_with("M 0 0 C 0 20 20 20 20 0");
        let mut extractor = PathExtractor::new();
        let first = extractor.extract(&arena, id, 50.0).unwrap();
        let second = extractor.extract(&arena, id, 50.0).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other_height = extractor.extract(&arena, id, 60.0).unwrap();
        assert!(!Arc::ptr_eq(&first, &other_height));
        assert_eq!(extractor.cached_entries(), 2);

        extractor.clear_cache();
        let third = extractor.extract(&arena, id, 50.0).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[test]
    fn test_unknown_shape() {
        let arena = ShapeArena::new();
        let (other, id) = arena_with("M 0 0 L 1 1");
        drop(other);
        let mut extractor = PathExtractor::new();
        assert!(matches!(
            extractor.extract(&arena, id, 0.0),
            Err(CamToolError::Geometry(_))
        ));
    }
}
