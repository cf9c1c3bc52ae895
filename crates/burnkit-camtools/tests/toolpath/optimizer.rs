//! Regression fixture for the greedy tour.

use burnkit_camtools::PathOptimizer;
use burnkit_core::{PathSegment, Point, SegmentOrigin};

fn line(id: &str, from: (f64, f64), to: (f64, f64)) -> PathSegment {
    PathSegment::classified(
        vec![Point::from(from), Point::from(to)],
        SegmentOrigin::new(id, "path"),
    )
    .unwrap()
}

fn fixture() -> Vec<PathSegment> {
    vec![
        line("a", (0.0, 0.0), (10.0, 0.0)),
        line("b", (20.0, 0.0), (11.0, 0.0)),
        line("c", (0.0, 5.0), (0.0, 15.0)),
    ]
}

#[test]
fn test_fixture_order_with_reversal() {
    let (out, metrics) = PathOptimizer::default().optimize(fixture(), true);

    let order: Vec<&str> = out.iter().map(|s| s.origin().element_id.as_str()).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
    assert_eq!(out[1].start_point(), Point::new(11.0, 0.0));
    assert_eq!(out[1].end_point(), Point::new(20.0, 0.0));
    assert_eq!(metrics.paths_reversed, 1);

    let expected_original = 10.0 + 146.0_f64.sqrt();
    let expected_optimized = 1.0 + 425.0_f64.sqrt();
    assert!((metrics.original_travel_distance - expected_original).abs() < 1e-9);
    assert!((metrics.optimized_travel_distance - expected_optimized).abs() < 1e-9);
    assert!(metrics.travel_savings() > 0.0);
}

#[test]
fn test_fixture_without_reversal_keeps_directions() {
    let (out, metrics) = PathOptimizer::default().optimize(fixture(), false);

    assert_eq!(out, fixture());
    assert_eq!(metrics.paths_reversed, 0);
    assert_eq!(metrics.travel_savings(), 0.0);
}

#[test]
fn test_optimizer_is_deterministic() {
    let optimizer = PathOptimizer::new(Point::new(3.0, 3.0));
    let (first, _) = optimizer.optimize(fixture(), true);
    let (second, _) = optimizer.optimize(fixture(), true);
    assert_eq!(first, second);
}
