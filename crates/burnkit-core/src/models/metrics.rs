//! Travel/engrave accounting for the tour optimizer.

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Metrics collected while reordering segments.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    /// Non-cutting travel over the input order (mm).
    pub original_travel_distance: f64,
    /// Non-cutting travel over the optimized order (mm).
    pub optimized_travel_distance: f64,
    /// Cutting length over the input order (mm).
    pub original_engrave_distance: f64,
    /// Cutting length over the optimized order (mm).
    pub optimized_engrave_distance: f64,
    /// Number of segments emitted in reverse.
    pub paths_reversed: usize,
}

impl OptimizationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative travel reduction in percent; 0 when there was no travel.
    pub fn travel_savings(&self) -> f64 {
        if self.original_travel_distance == 0.0 {
            return 0.0;
        }
        (self.original_travel_distance - self.optimized_travel_distance)
            / self.original_travel_distance
            * 100.0
    }
}

impl AddAssign for OptimizationMetrics {
    fn add_assign(&mut self, other: Self) {
        self.original_travel_distance += other.original_travel_distance;
        self.optimized_travel_distance += other.optimized_travel_distance;
        self.original_engrave_distance += other.original_engrave_distance;
        self.optimized_engrave_distance += other.optimized_engrave_distance;
        self.paths_reversed += other.paths_reversed;
    }
}
