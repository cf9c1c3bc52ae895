//! Laser jobs.
//!
//! A job is one laser operation (cut, fill or raster) over the shapes of a
//! layer. Kind-specific parameters are carried by [`JobOperation`], a tagged
//! union, so a fill job always has an angle and a spacing and a raster job
//! always has a resolution.
//!
//! The persisted form is a flat JSON object with a `type` discriminator and a
//! `params` object; missing fields fall back to per-kind defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Job kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    #[default]
    Cut,
    Fill,
    Raster,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cut => write!(f, "cut"),
            Self::Fill => write!(f, "fill"),
            Self::Raster => write!(f, "raster"),
        }
    }
}

/// Laser enable command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LaserMode {
    /// Constant power (`M3`).
    #[default]
    #[serde(rename = "M3")]
    Constant,
    /// Dynamic power scaled with feed (`M4`).
    #[serde(rename = "M4")]
    Dynamic,
}

impl LaserMode {
    /// The GRBL command word that enables the laser in this mode.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Constant => "M3",
            Self::Dynamic => "M4",
        }
    }
}

impl fmt::Display for LaserMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// Raster scan direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanDirection {
    /// Row-major scanning.
    #[default]
    Horizontal,
    /// Column-major scanning.
    Vertical,
}

impl fmt::Display for ScanDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Vertical => write!(f, "vertical"),
        }
    }
}

/// Fill (hatch) parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillParams {
    /// Hatch angle in degrees (0 = horizontal).
    pub angle: f64,
    /// Distance between hatch lines in mm.
    pub spacing: f64,
    /// Serpentine traversal of consecutive hatch lines.
    pub alternate: bool,
}

impl Default for FillParams {
    fn default() -> Self {
        Self {
            angle: 45.0,
            spacing: 0.5,
            alternate: true,
        }
    }
}

/// Raster parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterParams {
    /// Scan resolution in dots per inch.
    pub dpi: u32,
    pub direction: ScanDirection,
}

impl Default for RasterParams {
    fn default() -> Self {
        Self {
            dpi: 300,
            direction: ScanDirection::Horizontal,
        }
    }
}

/// Kind-specific part of a job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JobOperation {
    Cut,
    Fill(FillParams),
    Raster(RasterParams),
}

impl JobOperation {
    pub fn kind(&self) -> JobKind {
        match self {
            Self::Cut => JobKind::Cut,
            Self::Fill(_) => JobKind::Fill,
            Self::Raster(_) => JobKind::Raster,
        }
    }

    /// Default parameters for a job kind.
    pub fn default_for(kind: JobKind) -> Self {
        match kind {
            JobKind::Cut => Self::Cut,
            JobKind::Fill => Self::Fill(FillParams::default()),
            JobKind::Raster => Self::Raster(RasterParams::default()),
        }
    }
}

/// Single laser operation on a layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "JobRecord")]
pub struct Job {
    pub id: Uuid,
    pub operation: JobOperation,
    /// Whether this job participates in export.
    pub active: bool,
    /// Number of repeated passes.
    pub passes: u32,
    /// Feed rate in mm/min.
    pub speed: f64,
    /// Minimum laser power (S value).
    pub power_min: f64,
    /// Maximum laser power (S value).
    pub power_max: f64,
    pub air_assist: bool,
    /// Contour offset in mm (positive = outward). Carried, not applied.
    pub offset: f64,
    pub laser_mode: LaserMode,
}

impl Default for Job {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            operation: JobOperation::Cut,
            active: true,
            passes: 1,
            speed: 800.0,
            power_min: 0.0,
            power_max: 600.0,
            air_assist: true,
            offset: 0.0,
            laser_mode: LaserMode::Constant,
        }
    }
}

impl Job {
    /// Create a new job with defaults for the given kind.
    ///
    /// Raster jobs default to dynamic power mode.
    pub fn create_default(kind: JobKind) -> Self {
        let laser_mode = match kind {
            JobKind::Raster => LaserMode::Dynamic,
            _ => LaserMode::Constant,
        };
        Self {
            operation: JobOperation::default_for(kind),
            laser_mode,
            ..Self::default()
        }
    }

    pub fn kind(&self) -> JobKind {
        self.operation.kind()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Short human-readable description of the job.
    pub fn summary(&self) -> String {
        let active = if self.active { "✓" } else { "✗" };
        let mode = self.laser_mode;
        match self.operation {
            JobOperation::Cut => format!(
                "[{active}] Cut: S{:.0} F{:.0} {}× {mode}",
                self.power_max, self.speed, self.passes
            ),
            JobOperation::Fill(p) => format!(
                "[{active}] Fill: S{:.0} {}mm {:.0}° {mode}",
                self.power_max, p.spacing, p.angle
            ),
            JobOperation::Raster(p) => format!(
                "[{active}] Raster: {}DPI S{:.0}-{:.0} {} {mode}",
                p.dpi, self.power_min, self.power_max, p.direction
            ),
        }
    }
}

/// Flat persisted form of a job.
#[derive(Debug, Clone, Deserialize)]
struct JobRecord {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    #[serde(rename = "type", default)]
    kind: JobKind,
    #[serde(default = "default_true")]
    active: bool,
    #[serde(default = "default_passes")]
    passes: u32,
    #[serde(default = "default_speed")]
    speed: f64,
    #[serde(default)]
    power_min: f64,
    #[serde(default = "default_power_max")]
    power_max: f64,
    #[serde(default = "default_true")]
    air_assist: bool,
    #[serde(default)]
    offset: f64,
    #[serde(default)]
    laser_mode: LaserMode,
    #[serde(default)]
    params: serde_json::Value,
}

fn default_true() -> bool {
    true
}

fn default_passes() -> u32 {
    1
}

fn default_speed() -> f64 {
    800.0
}

fn default_power_max() -> f64 {
    600.0
}

fn params_or_default<T>(value: serde_json::Value) -> Result<T>
where
    T: Default + serde::de::DeserializeOwned,
{
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value).map_err(Error::from)
}

impl TryFrom<JobRecord> for Job {
    type Error = Error;

    fn try_from(record: JobRecord) -> Result<Self> {
        let operation = match record.kind {
            JobKind::Cut => JobOperation::Cut,
            JobKind::Fill => JobOperation::Fill(params_or_default(record.params)?),
            JobKind::Raster => JobOperation::Raster(params_or_default(record.params)?),
        };
        Ok(Self {
            id: record.id,
            operation,
            active: record.active,
            passes: record.passes,
            speed: record.speed,
            power_min: record.power_min,
            power_max: record.power_max,
            air_assist: record.air_assist,
            offset: record.offset,
            laser_mode: record.laser_mode,
        })
    }
}

/// Kind-specific `params` object of the persisted form.
#[derive(Serialize)]
#[serde(untagged)]
enum ParamsRef<'a> {
    Empty {},
    Fill(&'a FillParams),
    Raster(&'a RasterParams),
}

/// Borrowed counterpart of [`JobRecord`] used when writing.
#[derive(Serialize)]
struct JobRecordRef<'a> {
    id: &'a Uuid,
    #[serde(rename = "type")]
    kind: JobKind,
    active: bool,
    passes: u32,
    speed: f64,
    power_min: f64,
    power_max: f64,
    air_assist: bool,
    offset: f64,
    laser_mode: LaserMode,
    params: ParamsRef<'a>,
}

impl Serialize for Job {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let params = match &self.operation {
            JobOperation::Cut => ParamsRef::Empty {},
            JobOperation::Fill(p) => ParamsRef::Fill(p),
            JobOperation::Raster(p) => ParamsRef::Raster(p),
        };
        JobRecordRef {
            id: &self.id,
            kind: self.kind(),
            active: self.active,
            passes: self.passes,
            speed: self.speed,
            power_min: self.power_min,
            power_max: self.power_max,
            air_assist: self.air_assist,
            offset: self.offset,
            laser_mode: self.laser_mode,
            params,
        }
        .serialize(serializer)
    }
}
