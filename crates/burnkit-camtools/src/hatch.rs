//! Hatch generator.
//!
//! Scanline fill of a closed polygon: the polygon is rotated by `-angle` so
//! hatch lines become horizontal, each scanline is intersected with the
//! edges using a half-open span test, intersections are sorted and paired,
//! and the pairs are rotated back into place.
//!
//! Self-intersecting or multiply-connected input can give an odd number of
//! crossings on a scanline; the unpaired trailing crossing is dropped.

use burnkit_core::{FillParams, PathKind, PathSegment, Point, SegmentOrigin};
use tracing::debug;

fn rotate(p: Point, cos_a: f64, sin_a: f64) -> Point {
    Point::new(p.x * cos_a - p.y * sin_a, p.x * sin_a + p.y * cos_a)
}

fn unrotate(x: f64, y: f64, cos_a: f64, sin_a: f64) -> Point {
    Point::new(x * cos_a + y * sin_a, -x * sin_a + y * cos_a)
}

/// X coordinates where the horizontal line at `y` crosses the polygon.
fn scanline_intersections(polygon: &[Point], y: f64) -> Vec<f64> {
    let n = polygon.len();
    let mut crossings = Vec::new();
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if a.y == b.y {
            continue;
        }
        if (a.y <= y && y < b.y) || (b.y <= y && y < a.y) {
            let t = (y - a.y) / (b.y - a.y);
            crossings.push(a.x + t * (b.x - a.x));
        }
    }
    crossings
}

/// Generate parallel hatch lines inside a closed polygon.
///
/// Returns open two-point segments. Fewer than three vertices or a
/// non-positive spacing yields an empty list.
pub fn generate_hatch_lines(
    polygon: &[Point],
    angle: f64,
    spacing: f64,
    alternate: bool,
) -> Vec<PathSegment> {
    if polygon.len() < 3 || spacing <= 0.0 || !spacing.is_finite() {
        return Vec::new();
    }

    let rad = (-angle).to_radians();
    let (sin_a, cos_a) = rad.sin_cos();
    let rotated: Vec<Point> = polygon.iter().map(|&p| rotate(p, cos_a, sin_a)).collect();

    let (y_min, y_max) = rotated
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });

    let origin = SegmentOrigin::new("hatch", "hatch");
    let mut segments = Vec::new();
    let mut line_index: u64 = 1;

    loop {
        let y = y_min + spacing * line_index as f64;
        if y >= y_max {
            break;
        }

        let mut crossings = scanline_intersections(&rotated, y);
        crossings.sort_by(f64::total_cmp);

        let mut spans: Vec<(f64, f64)> = crossings
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();

        // `line_index` is 1-based; the first scanline runs forward.
        let reverse = alternate && line_index % 2 == 0;
        if reverse {
            spans.reverse();
        }

        for (x_start, x_end) in spans {
            let mut points = vec![
                unrotate(x_start, y, cos_a, sin_a),
                unrotate(x_end, y, cos_a, sin_a),
            ];
            if reverse {
                points.reverse();
            }
            if let Ok(segment) = PathSegment::new(points, origin.clone(), PathKind::Open) {
                segments.push(segment);
            }
        }

        line_index += 1;
    }

    segments
}

/// Hatch every closed segment with the given fill parameters.
pub fn hatch_closed_segments(segments: &[PathSegment], params: &FillParams) -> Vec<PathSegment> {
    let hatches: Vec<PathSegment> = segments
        .iter()
        .filter(|seg| seg.kind() == PathKind::Closed && seg.len() >= 3)
        .flat_map(|seg| {
            generate_hatch_lines(seg.points(), params.angle, params.spacing, params.alternate)
        })
        .collect();
    debug!(
        "Generated {} hatch line(s) at {}° / {}mm",
        hatches.len(),
        params.angle,
        params.spacing
    );
    hatches
}
