//! # BurnKit
//!
//! Turns layered vector and raster artwork into G-code for GRBL-style laser
//! cutters.
//!
//! ## Architecture
//!
//! BurnKit is organized as a workspace with multiple crates:
//!
//! 1. **burnkit-core** - Segments, jobs, layers, machine bounds
//! 2. **burnkit-camtools** - Flattening, hatching, tour optimization, raster scanning, G-code emission
//! 3. **burnkit-settings** - Configuration files
//! 4. **burnkit** - Command line binary that integrates all crates

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

pub use burnkit_camtools::{
    Document, DocumentFile, ExportOptions, ExportSummary, LayerExporter, ReorderSummary,
};
pub use burnkit_core::{Job, JobKind, Layer, MachineSettings};
pub use burnkit_settings::{Config, LogLevel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging for the given verbosity
///
/// Sets up structured logging with:
/// - Console output on stderr
/// - RUST_LOG environment variable support
/// - A default directive derived from `level`
pub fn init_logging(level: LogLevel) -> anyhow::Result<()> {
    use tracing_subscriber::filter::Directive;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let directive: Directive = level
        .directive()
        .parse()
        .context("Invalid log directive")?;
    let env_filter = EnvFilter::from_default_env().add_directive(directive);

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Export options for a configuration.
pub fn export_options(config: &Config, optimize: bool) -> ExportOptions {
    ExportOptions {
        optimize,
        start_position: config.export.start_position(),
        curve_tolerance: config.export.curve_tolerance,
        coordinate_precision: config.export.coordinate_precision,
    }
}

/// Export a document file to G-code and return the path written.
///
/// Without `output`, the program is written next to the document using the
/// configured extension.
pub fn export_document(
    document_path: &Path,
    output: Option<&Path>,
    config: &Config,
    optimize: bool,
) -> anyhow::Result<(PathBuf, ExportSummary)> {
    let document = Document::load(document_path)
        .with_context(|| format!("Failed to load document {}", document_path.display()))?;

    let mut exporter = LayerExporter::new(config.machine.clone(), export_options(config, optimize));
    let (gcode, summary) = exporter
        .export(&document)
        .with_context(|| format!("Failed to generate G-code for '{}'", document.name))?;

    let output = output.map(Path::to_path_buf).unwrap_or_else(|| {
        document_path.with_extension(&config.export.output_extension)
    });
    burnkit_camtools::write_output(&output, &gcode)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        "Wrote {} ({} job(s) from {} layer(s))",
        output.display(),
        summary.jobs_emitted,
        summary.layers_exported
    );
    Ok((output, summary))
}

/// Command that opens `path` with the platform's default handler.
pub fn opener_command(path: &Path) -> Command {
    let mut command = if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };
    command.arg(path);
    command
}

/// Open a written program with the system handler.
///
/// The handler is spawned and left running; only a failure to start it is
/// reported.
pub fn launch_output(path: &Path) -> anyhow::Result<()> {
    let mut command = opener_command(path);
    debug!("Launching {:?}", command);
    command
        .spawn()
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(())
}

/// Reorder the shapes of a document file for shorter travel.
///
/// Without `output`, the document is rewritten in place.
pub fn reorder_document(
    document_path: &Path,
    output: Option<&Path>,
    config: &Config,
) -> anyhow::Result<ReorderSummary> {
    let mut file = DocumentFile::load(document_path)
        .with_context(|| format!("Failed to load document {}", document_path.display()))?;

    let summary = burnkit_camtools::reorder_shapes(&mut file, config.export.curve_tolerance);

    let output = output.unwrap_or(document_path);
    let json = file.to_json().context("Failed to serialize document")?;
    burnkit_camtools::write_output(output, &json)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(summary)
}
