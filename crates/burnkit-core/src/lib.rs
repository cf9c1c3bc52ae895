//! # BurnKit Core
//!
//! Core types shared by the BurnKit toolpath pipeline.
//! Provides the geometry primitives, the polyline segment model, job and
//! layer descriptions, and the machine bounds used to clamp feed and power.

pub mod constants;
pub mod error;
pub mod geometry;
pub mod models;

pub use error::{Error, Result};
pub use geometry::{distance, Point};
pub use models::{
    FillParams, Job, JobKind, JobOperation, LaserMode, Layer, MachineSettings,
    OptimizationMetrics, PathKind, PathSegment, RasterParams, ScanDirection, SegmentOrigin,
};
