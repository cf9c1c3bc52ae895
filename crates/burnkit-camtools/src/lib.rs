//! # BurnKit CAM Tools
//!
//! The toolpath pipeline that turns a layered vector document into a laser
//! G-code program.
//!
//! ## Pipeline stages
//!
//! - **Path extractor**: flattens shape outlines into polylines in machine coordinates
//! - **Hatch generator**: fills closed outlines with parallel scanlines
//! - **Tour optimizer**: reorders and re-orients polylines to reduce travel
//! - **Raster scanner**: converts grayscale images into power-modulated scan lines
//! - **G-code generator**: emits the program with redundant words suppressed
//!
//! ## Supporting infrastructure
//!
//! - **Document**: the stored JSON form of a document and its resolved shapes
//! - **Layer exporter**: drives the stages for every visible layer and job
//! - **Shape reordering**: rewrites a document so shapes follow a short tour

pub mod document;
pub mod emitter;
pub mod error;
pub mod flattener;
pub mod hatch;
pub mod optimizer;
pub mod path_data;
pub mod pipeline;
pub mod raster;
pub mod reorder;
pub mod shape;

// Re-export commonly used items
pub use document::{Document, DocumentFile, DocumentLayer, ImageElement, LayerFile, ShapeFile};
pub use emitter::{EmitterPhase, GCodeGenerator};
pub use error::{
    CamToolError, CamToolResult, ParameterError, ParameterResult, PathDataError, PathDataResult,
};
pub use flattener::PathExtractor;
pub use hatch::{generate_hatch_lines, hatch_closed_segments};
pub use optimizer::{PathOptimizer, TourStep};
pub use path_data::parse_path_data;
pub use pipeline::{write_output, ExportOptions, ExportSummary, LayerExporter};
pub use raster::{
    decode_data_uri, load_image, pixel_to_power, ImagePlacement, ImageSource, RasterScanner,
};
pub use reorder::{reorder_shapes, ReorderSummary};
pub use shape::{matrix_transform, Outline, Shape, ShapeArena, ShapeId, Subpath, Transform};
