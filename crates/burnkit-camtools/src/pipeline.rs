//! Layer exporter.
//!
//! Drives the whole toolpath pipeline for one document: visible layers in
//! document order, active jobs in defined order. Cut jobs are extracted,
//! optimized and emitted; fill jobs hatch the closed outlines first; raster
//! jobs scan the layer's images and are emitted without reordering.
//!
//! Shape and image failures are logged and skipped. Only writing the final
//! program can fail the export.

use crate::document::{Document, DocumentLayer};
use crate::emitter::GCodeGenerator;
use crate::error::{CamToolError, CamToolResult, ParameterError, ParameterResult};
use crate::flattener::PathExtractor;
use crate::hatch::hatch_closed_segments;
use crate::optimizer::PathOptimizer;
use crate::raster::{load_image, RasterScanner};
use burnkit_core::constants::{COORD_PRECISION, CURVE_TOLERANCE};
use burnkit_core::{
    FillParams, Job, JobOperation, MachineSettings, OptimizationMetrics, PathSegment, Point,
    RasterParams,
};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Per-export knobs that are not machine properties.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Allow tour optimization; combined with the machine toggle.
    pub optimize: bool,
    /// Where the laser head starts.
    pub start_position: Point,
    /// Flattening tolerance in mm.
    pub curve_tolerance: f64,
    /// Decimal places for coordinates.
    pub coordinate_precision: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            start_position: Point::origin(),
            curve_tolerance: CURVE_TOLERANCE,
            coordinate_precision: COORD_PRECISION,
        }
    }
}

/// What an export did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    pub layers_exported: usize,
    pub jobs_emitted: usize,
    pub shapes_skipped: usize,
    pub images_skipped: usize,
    /// Optimization metrics summed over all optimized jobs.
    pub metrics: OptimizationMetrics,
}

/// Turns a [`Document`] into a G-code program.
#[derive(Debug)]
pub struct LayerExporter {
    settings: MachineSettings,
    options: ExportOptions,
    extractor: PathExtractor,
    generator: GCodeGenerator,
}

impl LayerExporter {
    pub fn new(settings: MachineSettings, options: ExportOptions) -> Self {
        let generator =
            GCodeGenerator::new(settings.clone()).with_precision(options.coordinate_precision);
        Self {
            extractor: PathExtractor::with_tolerance(options.curve_tolerance),
            settings,
            options,
            generator,
        }
    }

    /// Export every visible layer and return the program text.
    pub fn export(&mut self, document: &Document) -> CamToolResult<(String, ExportSummary)> {
        let mut summary = ExportSummary {
            shapes_skipped: document.skipped_shapes,
            ..ExportSummary::default()
        };

        self.extractor.clear_cache();
        self.generator.reset();
        self.generator.add_header(&document.name)?;

        for layer in &document.layers {
            if !layer.layer.visible || layer.layer.jobs.is_empty() {
                continue;
            }
            self.process_layer(document, layer, &mut summary)?;
            summary.layers_exported += 1;
        }

        self.generator.add_footer()?;
        let gcode = self.generator.finish()?;

        if self.optimization_enabled() && summary.metrics.original_travel_distance > 0.0 {
            let metrics = &summary.metrics;
            info!(
                "Optimization summary: travel reduced {:.1}% ({:.1}mm -> {:.1}mm), {} paths reversed",
                metrics.travel_savings(),
                metrics.original_travel_distance,
                metrics.optimized_travel_distance,
                metrics.paths_reversed
            );
        }

        Ok((gcode, summary))
    }

    fn optimization_enabled(&self) -> bool {
        self.options.optimize && self.settings.path_optimization
    }

    fn process_layer(
        &mut self,
        document: &Document,
        layer: &DocumentLayer,
        summary: &mut ExportSummary,
    ) -> CamToolResult<()> {
        for (index, job) in layer.layer.active_jobs().enumerate() {
            if let Err(err) = validate_job(job) {
                warn!(
                    "Layer '{}': skipping {} job {}: {}",
                    layer.layer.label,
                    job.kind(),
                    index,
                    err
                );
                continue;
            }
            let emitted = match job.operation {
                JobOperation::Cut => self.process_cut_job(document, layer, job, index, summary)?,
                JobOperation::Fill(params) => {
                    self.process_fill_job(document, layer, job, &params, index, summary)?
                }
                JobOperation::Raster(params) => {
                    self.process_raster_job(document, layer, job, &params, index, summary)?
                }
            };
            if emitted {
                summary.jobs_emitted += 1;
            }
        }
        Ok(())
    }

    fn process_cut_job(
        &mut self,
        document: &Document,
        layer: &DocumentLayer,
        job: &Job,
        index: usize,
        summary: &mut ExportSummary,
    ) -> CamToolResult<bool> {
        let segments = self.extract_segments(document, layer, summary);
        if segments.is_empty() {
            return Ok(false);
        }
        let segments = self.optimize_segments(segments, &layer.layer.label, summary);
        self.generator
            .add_comment(&format!("Layer: {}", layer.layer.label))?;
        self.generator.add_job(&segments, job, index)?;
        Ok(true)
    }

    fn process_fill_job(
        &mut self,
        document: &Document,
        layer: &DocumentLayer,
        job: &Job,
        params: &FillParams,
        index: usize,
        summary: &mut ExportSummary,
    ) -> CamToolResult<bool> {
        let segments = self.extract_segments(document, layer, summary);
        if segments.is_empty() {
            return Ok(false);
        }
        let hatches = hatch_closed_segments(&segments, params);
        if hatches.is_empty() {
            info!("Layer '{}': No closed paths for fill job", layer.layer.label);
            return Ok(false);
        }
        let hatches = self.optimize_segments(hatches, &layer.layer.label, summary);
        self.generator
            .add_comment(&format!("Layer: {}", layer.layer.label))?;
        self.generator.add_job(&hatches, job, index)?;
        Ok(true)
    }

    fn process_raster_job(
        &mut self,
        document: &Document,
        layer: &DocumentLayer,
        job: &Job,
        params: &RasterParams,
        index: usize,
        summary: &mut ExportSummary,
    ) -> CamToolResult<bool> {
        if layer.images.is_empty() {
            info!("Layer '{}': No images for raster job", layer.layer.label);
            return Ok(false);
        }

        let scanner = RasterScanner::from_params(params);
        let mut lines = Vec::new();
        for image in &layer.images {
            let scanned = load_image(&image.source).and_then(|pixels| {
                scanner.scan(
                    &pixels,
                    &image.placement,
                    document.viewport_height,
                    job.power_min,
                    job.power_max,
                    &image.id,
                )
            });
            match scanned {
                Ok(mut image_lines) => lines.append(&mut image_lines),
                Err(err) => {
                    warn!(
                        "Layer '{}': skipping image '{}': {}",
                        layer.layer.label, image.id, err
                    );
                    summary.images_skipped += 1;
                }
            }
        }

        if lines.is_empty() {
            return Ok(false);
        }
        self.generator
            .add_comment(&format!("Layer: {}", layer.layer.label))?;
        self.generator.add_job(&lines, job, index)?;
        Ok(true)
    }

    /// Flatten every shape of a layer; failing shapes are skipped.
    fn extract_segments(
        &mut self,
        document: &Document,
        layer: &DocumentLayer,
        summary: &mut ExportSummary,
    ) -> Vec<PathSegment> {
        let mut segments = Vec::new();
        for &id in &layer.shapes {
            match self
                .extractor
                .extract(&document.shapes, id, document.viewport_height)
            {
                Ok(extracted) => segments.extend(extracted.iter().cloned()),
                Err(err) => {
                    warn!("Layer '{}': skipping shape: {}", layer.layer.label, err);
                    summary.shapes_skipped += 1;
                }
            }
        }
        segments
    }

    fn optimize_segments(
        &self,
        segments: Vec<PathSegment>,
        label: &str,
        summary: &mut ExportSummary,
    ) -> Vec<PathSegment> {
        if !self.optimization_enabled() {
            return segments;
        }
        let optimizer = PathOptimizer::new(self.options.start_position);
        let (optimized, metrics) =
            optimizer.optimize(segments, self.settings.direction_optimization);
        info!(
            "Layer '{}': Travel reduced by {:.1}% ({} paths reversed)",
            label,
            metrics.travel_savings(),
            metrics.paths_reversed
        );
        summary.metrics += metrics;
        optimized
    }
}

/// Reject job parameters the pipeline cannot run with.
pub fn validate_job(job: &Job) -> ParameterResult<()> {
    if job.passes == 0 {
        return Err(ParameterError::InvalidValue {
            name: "passes".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if !(job.speed > 0.0) {
        return Err(ParameterError::InvalidValue {
            name: "speed".to_string(),
            reason: format!("{} is not a positive feed rate", job.speed),
        });
    }
    if job.power_min > job.power_max {
        return Err(ParameterError::InvalidValue {
            name: "power_min".to_string(),
            reason: format!("{} exceeds power_max {}", job.power_min, job.power_max),
        });
    }
    match job.operation {
        JobOperation::Fill(params) if !(params.spacing > 0.0) => {
            Err(ParameterError::OutOfRange {
                name: "spacing".to_string(),
                value: params.spacing,
                min: 0.0,
                max: f64::INFINITY,
            })
        }
        JobOperation::Raster(params) if params.dpi == 0 => Err(ParameterError::OutOfRange {
            name: "dpi".to_string(),
            value: 0.0,
            min: 1.0,
            max: f64::from(u32::MAX),
        }),
        _ => Ok(()),
    }
}

/// Write the program to a temporary file beside `path`, then rename it
/// into place.
///
/// A failed write never leaves a partial file at `path`.
pub fn write_output(path: &Path, gcode: &str) -> CamToolResult<()> {
    if path.file_name().is_none() {
        return Err(CamToolError::GenerationFailed(format!(
            "invalid output path {}",
            path.display()
        )));
    }
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(gcode.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
