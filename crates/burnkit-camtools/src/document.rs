//! Host document boundary.
//!
//! A document is stored as JSON: a name, the viewport height used for the
//! Y flip, and an ordered list of layers. Each layer carries its jobs, its
//! vector shapes (SVG path data plus an affine matrix) and its raster images
//! (file reference or inline data plus placement). [`Document::from_file`] turns the stored
//! form into shapes in a [`ShapeArena`] ready for extraction.

use crate::error::CamToolResult;
use crate::raster::{ImagePlacement, ImageSource};
use crate::shape::{matrix_transform, Outline, Shape, ShapeArena, ShapeId, Transform};
use burnkit_core::Layer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Identity matrix in SVG `matrix(a, b, c, d, e, f)` layout.
pub const IDENTITY_MATRIX: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn identity_matrix() -> [f64; 6] {
    IDENTITY_MATRIX
}

fn default_true() -> bool {
    true
}

fn default_shape_kind() -> String {
    "path".to_string()
}

/// Stored form of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFile {
    pub name: String,
    /// Height of the document viewport, used for `y' = H - y`.
    pub viewport_height: f64,
    #[serde(default)]
    pub layers: Vec<LayerFile>,
}

/// Stored form of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerFile {
    pub id: String,
    pub label: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Transform of the layer container, applied after each shape's own.
    #[serde(default = "identity_matrix")]
    pub matrix: [f64; 6],
    #[serde(default)]
    pub jobs: Vec<burnkit_core::Job>,
    #[serde(default)]
    pub shapes: Vec<ShapeFile>,
    #[serde(default)]
    pub images: Vec<ImageFile>,
}

/// Stored form of a vector shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeFile {
    pub id: String,
    #[serde(default = "default_shape_kind")]
    pub kind: String,
    /// SVG path data.
    pub d: String,
    #[serde(default = "identity_matrix")]
    pub matrix: [f64; 6],
}

impl ShapeFile {
    /// Parse the path data and compose the shape matrix with its container's.
    pub fn to_shape(&self, parent: &Transform) -> CamToolResult<Shape> {
        let outline = Outline::from_path_data(&self.d)?;
        let transform = matrix_transform(self.matrix).then(parent);
        Ok(Shape::new(self.id.clone(), self.kind.clone(), outline).with_transform(transform))
    }
}

/// Stored form of a raster image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFile {
    pub id: String,
    /// Image file path relative to the document file, or a base64 `data:` URI.
    pub href: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "identity_matrix")]
    pub matrix: [f64; 6],
}

impl DocumentFile {
    pub fn load(path: &Path) -> CamToolResult<Self> {
        let raw = fs::read_to_string(path)?;
        let document = serde_json::from_str(&raw)?;
        debug!("Loaded document {}", path.display());
        Ok(document)
    }

    pub fn to_json(&self) -> CamToolResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A raster image ready for scanning.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageElement {
    pub id: String,
    pub source: ImageSource,
    pub placement: ImagePlacement,
}

/// A layer with its shapes resolved into the document arena.
#[derive(Debug, Clone)]
pub struct DocumentLayer {
    pub layer: Layer,
    pub shapes: Vec<ShapeId>,
    pub images: Vec<ImageElement>,
}

/// A document ready for export.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub viewport_height: f64,
    pub layers: Vec<DocumentLayer>,
    pub shapes: ShapeArena,
    /// Shapes that could not be read and were left out.
    pub skipped_shapes: usize,
}

impl Document {
    /// Resolve a stored document. Image paths are resolved against `base_dir`.
    ///
    /// Shapes with unreadable path data are skipped with a warning.
    pub fn from_file(file: &DocumentFile, base_dir: &Path) -> Self {
        let mut shapes = ShapeArena::new();
        let mut skipped_shapes = 0;
        let mut layers = Vec::with_capacity(file.layers.len());

        for layer_file in &file.layers {
            let parent = matrix_transform(layer_file.matrix);
            let mut shape_ids = Vec::with_capacity(layer_file.shapes.len());
            for shape_file in &layer_file.shapes {
                match shape_file.to_shape(&parent) {
                    Ok(shape) => shape_ids.push(shapes.insert(shape)),
                    Err(err) => {
                        warn!(
                            "Skipping shape '{}' in layer '{}': {}",
                            shape_file.id, layer_file.label, err
                        );
                        skipped_shapes += 1;
                    }
                }
            }

            let images = layer_file
                .images
                .iter()
                .map(|image| ImageElement {
                    id: image.id.clone(),
                    source: ImageSource::from_href(&image.href, base_dir),
                    placement: ImagePlacement::new(image.x, image.y, image.width, image.height)
                        .with_transform(matrix_transform(image.matrix).then(&parent)),
                })
                .collect();

            layers.push(DocumentLayer {
                layer: Layer {
                    id: layer_file.id.clone(),
                    label: layer_file.label.clone(),
                    visible: layer_file.visible,
                    jobs: layer_file.jobs.clone(),
                },
                shapes: shape_ids,
                images,
            });
        }

        Self {
            name: file.name.clone(),
            viewport_height: file.viewport_height,
            layers,
            shapes,
            skipped_shapes,
        }
    }

    /// Load and resolve a document file in one step.
    pub fn load(path: &Path) -> CamToolResult<Self> {
        let file = DocumentFile::load(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::from_file(&file, base_dir))
    }
}
