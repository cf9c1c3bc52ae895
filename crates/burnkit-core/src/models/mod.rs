//! Data model shared by the toolpath pipeline.

pub mod job;
pub mod layer;
pub mod machine;
pub mod metrics;
pub mod path;

pub use job::{FillParams, Job, JobKind, JobOperation, LaserMode, RasterParams, ScanDirection};
pub use layer::Layer;
pub use machine::MachineSettings;
pub use metrics::OptimizationMetrics;
pub use path::{PathKind, PathSegment, SegmentOrigin};
