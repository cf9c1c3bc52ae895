//! Machine bounds and optimization toggles.

use crate::constants::{MAX_SPEED, SMAX, TRAVEL_SPEED};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Machine-level limits used to clamp per-job values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// Maximum S value the controller accepts.
    pub max_power: u32,
    /// Maximum feed rate in mm/min.
    pub max_speed: u32,
    /// Rapid travel speed in mm/min.
    pub travel_speed: u32,
    /// Minimum positioning resolution in mm.
    pub resolution: f64,
    /// Kerf width in mm.
    pub kerf_width: f64,
    /// GRBL laser mode (`$32=1`) is enabled on the controller.
    pub laser_mode: bool,
    /// Reorder segments with the nearest-neighbour tour.
    pub path_optimization: bool,
    /// Allow open segments to be reversed during reordering.
    pub direction_optimization: bool,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            max_power: SMAX,
            max_speed: MAX_SPEED,
            travel_speed: TRAVEL_SPEED,
            resolution: 0.1,
            kerf_width: 0.0,
            laser_mode: true,
            path_optimization: true,
            direction_optimization: true,
        }
    }
}

impl MachineSettings {
    /// Power bounded to `[0, max_power]`, truncated, plus whether it changed.
    ///
    /// Does not log; callers that clamp per point report once themselves.
    pub fn bound_power(&self, value: f64) -> (u32, bool) {
        bound(value, 0.0, self.max_power)
    }

    /// Speed bounded to `[1, max_speed]`, truncated, plus whether it changed.
    pub fn bound_speed(&self, value: f64) -> (u32, bool) {
        bound(value, 1.0, self.max_speed)
    }

    /// Clamp a power value to `[0, max_power]`.
    pub fn clamp_power(&self, value: f64) -> u32 {
        let (clamped, changed) = self.bound_power(value);
        if changed {
            warn!(
                "Power value {:.0} clamped to {} (max_power={})",
                value, clamped, self.max_power
            );
        }
        clamped
    }

    /// Clamp a speed value to `[1, max_speed]`.
    pub fn clamp_speed(&self, value: f64) -> u32 {
        let (clamped, changed) = self.bound_speed(value);
        if changed {
            warn!(
                "Speed value {:.0} clamped to {} (max_speed={})",
                value, clamped, self.max_speed
            );
        }
        clamped
    }
}

fn bound(value: f64, lower: f64, upper: u32) -> (u32, bool) {
    let upper = f64::from(upper);
    let value = if value.is_nan() { lower } else { value };
    let clamped = value.min(upper).max(lower.min(upper)).trunc();
    (clamped as u32, clamped != value.trunc())
}
