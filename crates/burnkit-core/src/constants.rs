//! Shared numeric constants.

/// Maximum laser power (GRBL S value) assumed when no machine config is given.
pub const SMAX: u32 = 1000;

/// Default rapid travel speed in mm/min.
pub const TRAVEL_SPEED: u32 = 4000;

/// Default maximum feed rate in mm/min.
pub const MAX_SPEED: u32 = 6000;

/// Decimal places used for coordinates in emitted G-code.
pub const COORD_PRECISION: usize = 2;

/// Maximum chord deviation (mm) tolerated when flattening Bézier spans.
pub const CURVE_TOLERANCE: f64 = 0.1;

/// Start/end distance (mm) below which a polyline counts as closed.
pub const CLOSED_PATH_TOLERANCE: f64 = 0.01;

/// Millimetres per inch, used for DPI conversions.
pub const MM_PER_INCH: f64 = 25.4;
