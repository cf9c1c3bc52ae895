//! Tour optimizer.
//!
//! Greedy nearest-neighbour ordering of segments with optional reversal of
//! open segments. The first segment encountered wins exact ties, so the
//! result depends on input order and is fully reproducible.

use burnkit_core::{distance, OptimizationMetrics, PathKind, PathSegment, Point};

/// Reorders segments to reduce non-cutting travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathOptimizer {
    pub start_position: Point,
}

impl Default for PathOptimizer {
    fn default() -> Self {
        Self::new(Point::origin())
    }
}

/// One stop of a tour: which input segment to visit and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TourStep {
    /// Position of the segment in the input slice.
    pub index: usize,
    pub reversed: bool,
}

/// Best next segment: its slot in the pool and whether to reverse it.
struct Candidate {
    slot: usize,
    reverse: bool,
    distance: f64,
}

impl PathOptimizer {
    pub fn new(start_position: Point) -> Self {
        Self { start_position }
    }

    /// Reorder `segments` and report travel before and after.
    ///
    /// With `direction_optimization`, open segments may be emitted reversed
    /// when their end point is closer. Closed segments are never reversed.
    pub fn optimize(
        &self,
        segments: Vec<PathSegment>,
        direction_optimization: bool,
    ) -> (Vec<PathSegment>, OptimizationMetrics) {
        let (steps, metrics) = self.tour(&segments, direction_optimization);

        let mut slots: Vec<Option<PathSegment>> = segments.into_iter().map(Some).collect();
        let optimized = steps
            .iter()
            .filter_map(|step| {
                let segment = slots.get_mut(step.index)?.take()?;
                Some(if step.reversed {
                    segment.reversed()
                } else {
                    segment
                })
            })
            .collect();

        (optimized, metrics)
    }

    /// Visiting order for `segments` without moving them.
    ///
    /// Every input index appears exactly once in the returned steps.
    pub fn tour(
        &self,
        segments: &[PathSegment],
        direction_optimization: bool,
    ) -> (Vec<TourStep>, OptimizationMetrics) {
        if segments.is_empty() {
            return (Vec::new(), OptimizationMetrics::new());
        }

        let mut metrics = OptimizationMetrics {
            original_engrave_distance: engrave_distance(segments),
            original_travel_distance: self.travel_distance(segments),
            ..OptimizationMetrics::new()
        };

        let mut pool: Vec<usize> = (0..segments.len()).collect();
        let mut steps = Vec::with_capacity(segments.len());
        let mut current = self.start_position;
        let mut travel = 0.0;
        let mut engrave = 0.0;

        while !pool.is_empty() {
            let best = find_nearest(current, segments, &pool, direction_optimization);
            let index = pool.remove(best.slot);
            let segment = &segments[index];
            current = if best.reverse {
                metrics.paths_reversed += 1;
                segment.start_point()
            } else {
                segment.end_point()
            };
            travel += best.distance;
            engrave += segment.length();
            steps.push(TourStep {
                index,
                reversed: best.reverse,
            });
        }

        metrics.optimized_travel_distance = travel;
        metrics.optimized_engrave_distance = engrave;
        (steps, metrics)
    }

    /// Travel from the start position through the segments in order.
    pub fn travel_distance(&self, segments: &[PathSegment]) -> f64 {
        let Some(first) = segments.first() else {
            return 0.0;
        };
        let lead_in = distance(self.start_position, first.start_point());
        lead_in
            + segments
                .windows(2)
                .map(|pair| distance(pair[0].end_point(), pair[1].start_point()))
                .sum::<f64>()
    }
}

fn engrave_distance(segments: &[PathSegment]) -> f64 {
    segments.iter().map(PathSegment::length).sum()
}

fn find_nearest(
    current: Point,
    segments: &[PathSegment],
    pool: &[usize],
    check_reverse: bool,
) -> Candidate {
    let mut best = Candidate {
        slot: 0,
        reverse: false,
        distance: f64::INFINITY,
    };

    for (slot, &index) in pool.iter().enumerate() {
        let segment = &segments[index];
        let forward = distance(current, segment.start_point());
        if forward < best.distance {
            best = Candidate {
                slot,
                reverse: false,
                distance: forward,
            };
        }

        if check_reverse && segment.kind() != PathKind::Closed {
            let backward = distance(current, segment.end_point());
            if backward < best.distance {
                best = Candidate {
                    slot,
                    reverse: true,
                    distance: backward,
                };
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use burnkit_core::SegmentOrigin;

    fn line(id: &str, from: (f64, f64), to: (f64, f64)) -> PathSegment {
        PathSegment::classified(
            vec![Point::from(from), Point::from(to)],
            SegmentOrigin::new(id, "path"),
        )
        .unwrap()
    }

    fn ids(segments: &[PathSegment]) -> Vec<&str> {
        segments
            .iter()
            .map(|s| s.origin().element_id.as_str())
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let (out, metrics) = PathOptimizer::default().optimize(Vec::new(), true);
        assert!(out.is_empty());
        assert_eq!(metrics, OptimizationMetrics::new());
    }

    #[test]
    fn test_nearest_first() {
        let segments = vec![
            line("far", (50.0, 0.0), (60.0, 0.0)),
            line("near", (1.0, 0.0), (2.0, 0.0)),
        ];
        let (out, metrics) = PathOptimizer::default().optimize(segments, false);
        assert_eq!(ids(&out), vec!["near", "far"]);
        assert_eq!(metrics.original_travel_distance, 50.0 + 59.0);
        assert_eq!(metrics.optimized_travel_distance, 1.0 + 48.0);
        assert_eq!(metrics.paths_reversed, 0);
    }

    #[test]
    fn test_reversal_of_open_segment() {
        let segments = vec![line("a", (10.0, 0.0), (0.5, 0.0))];
        let (out, metrics) = PathOptimizer::default().optimize(segments, true);
        assert_eq!(out[0].start_point(), Point::new(0.5, 0.0));
        assert_eq!(metrics.paths_reversed, 1);
    }

    #[test]
    fn test_reversal_disabled() {
        let segments = vec![line("a", (10.0, 0.0), (0.5, 0.0))];
        let (out, metrics) = PathOptimizer::default().optimize(segments, false);
        assert_eq!(out[0].start_point(), Point::new(10.0, 0.0));
        assert_eq!(metrics.paths_reversed, 0);
    }

    #[test]
    fn test_closed_segment_never_reversed() {
        let closed = PathSegment::classified(
            vec![
                Point::new(5.0, 5.0),
                Point::new(6.0, 5.0),
                Point::new(6.0, 6.0),
                Point::new(5.0, 5.0),
            ],
            SegmentOrigin::new("loop", "rect"),
        )
        .unwrap();
        let (out, metrics) = PathOptimizer::default().optimize(vec![closed.clone()], true);
        assert_eq!(out[0], closed);
        assert_eq!(metrics.paths_reversed, 0);
    }

    #[test]
    fn test_first_encountered_wins_ties() {
        let segments = vec![
            line("first", (1.0, 0.0), (1.0, 5.0)),
            line("second", (0.0, 1.0), (5.0, 1.0)),
        ];
        let (out, _) = PathOptimizer::default().optimize(segments, true);
        assert_eq!(ids(&out)[0], "first");
    }

    #[test]
    fn test_engrave_distance_invariant() {
        let segments = vec![
            line("a", (0.0, 0.0), (3.0, 4.0)),
            line("b", (20.0, 0.0), (10.0, 0.0)),
            line("c", (5.0, 5.0), (5.0, 7.0)),
        ];
        let (_, metrics) = PathOptimizer::default().optimize(segments, true);
        assert_eq!(
            metrics.original_engrave_distance,
            metrics.optimized_engrave_distance
        );
        assert!((metrics.original_engrave_distance - 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_tour_reports_input_positions() {
        let segments = vec![
            line("a", (30.0, 0.0), (40.0, 0.0)),
            line("a", (12.0, 0.0), (2.0, 0.0)),
            line("b", (41.0, 0.0), (45.0, 0.0)),
        ];
        let (steps, metrics) = PathOptimizer::default().tour(&segments, true);
        assert_eq!(
            steps,
            vec![
                TourStep { index: 1, reversed: true },
                TourStep { index: 0, reversed: false },
                TourStep { index: 2, reversed: false },
            ]
        );
        assert_eq!(metrics.paths_reversed, 1);
        assert_eq!(metrics.optimized_travel_distance, 2.0 + 18.0 + 1.0);

        let (optimized, same) = PathOptimizer::default().optimize(segments, true);
        assert_eq!(same, metrics);
        assert_eq!(optimized[0].start_point(), Point::new(2.0, 0.0));
    }

    #[test]
    fn test_travel_distance_includes_lead_in() {
        let optimizer = PathOptimizer::new(Point::new(0.0, 3.0));
        let segments = vec![line("a", (4.0, 0.0), (10.0, 0.0))];
        assert_eq!(optimizer.travel_distance(&segments), 5.0);
        assert_eq!(optimizer.travel_distance(&[]), 0.0);
    }
}
