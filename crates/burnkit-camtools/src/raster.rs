//! Raster scanner.
//!
//! Resamples a grayscale image to the requested DPI and turns it into
//! serpentine scan lines. Each scan line is an open segment carrying one
//! power value per point: white maps to `power_min`, black to `power_max`.

use crate::error::{CamToolError, CamToolResult, ParameterError};
use crate::shape::Transform;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use burnkit_core::constants::MM_PER_INCH;
use burnkit_core::{PathSegment, Point, RasterParams, ScanDirection, SegmentOrigin};
use image::imageops::{self, FilterType};
use image::GrayImage;
use lyon::geom::point;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the pixels of an image come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Image file on disk.
    File(PathBuf),
    /// Inline `data:` URI with a base64 payload.
    Data(String),
}

impl ImageSource {
    /// Resolve an image href. Anything but a `data:` URI is a path relative
    /// to `base_dir`.
    pub fn from_href(href: &str, base_dir: &Path) -> Self {
        if href.starts_with("data:") {
            Self::Data(href.to_string())
        } else {
            Self::File(base_dir.join(href))
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Data(uri) => {
                let header = uri.split(',').next().unwrap_or(uri);
                write!(f, "inline {}", header)
            }
        }
    }
}

/// Where an image sits in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    pub x: f64,
    pub y: f64,
    /// Physical width in document units (mm).
    pub width: f64,
    /// Physical height in document units (mm).
    pub height: f64,
    /// Composed transform of the image element.
    pub transform: Transform,
}

impl ImagePlacement {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            transform: Transform::identity(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Map a grayscale value to an S value. Black gives `power_max`.
pub fn pixel_to_power(value: u8, power_min: f64, power_max: f64) -> u32 {
    let intensity = 1.0 - f64::from(value) / 255.0;
    (power_min + intensity * (power_max - power_min)).trunc() as u32
}

/// Decode the base64 payload of a `data:` URI.
///
/// Whitespace inside the payload is ignored.
pub fn decode_data_uri(uri: &str) -> CamToolResult<Vec<u8>> {
    let (_, payload) = uri
        .split_once(',')
        .ok_or_else(|| CamToolError::Image("data URI has no payload".to_string()))?;
    let payload: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(payload)
        .map_err(|e| CamToolError::Image(format!("invalid base64 image data: {}", e)))
}

/// Decode an image and convert it to 8-bit grayscale.
pub fn load_image(source: &ImageSource) -> CamToolResult<GrayImage> {
    let image = match source {
        ImageSource::File(path) => {
            if !path.is_file() {
                return Err(CamToolError::MissingImageSource(
                    path.display().to_string(),
                ));
            }
            image::open(path)?
        }
        ImageSource::Data(uri) => image::load_from_memory(&decode_data_uri(uri)?)?,
    };
    Ok(image.to_luma8())
}

/// Converts grayscale images into power-modulated scan lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterScanner {
    dpi: u32,
    direction: ScanDirection,
}

impl RasterScanner {
    pub fn new(dpi: u32, direction: ScanDirection) -> Self {
        Self {
            dpi: dpi.max(1),
            direction,
        }
    }

    pub fn from_params(params: &RasterParams) -> Self {
        Self::new(params.dpi, params.direction)
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Pixel pitch in mm.
    pub fn mm_per_dot(&self) -> f64 {
        MM_PER_INCH / f64::from(self.dpi)
    }

    /// Sampling grid (columns, rows) for an image of the given physical size.
    pub fn grid_size(&self, width: f64, height: f64) -> (u32, u32) {
        let pitch = self.mm_per_dot();
        let cols = (width / pitch).trunc().max(1.0) as u32;
        let rows = (height / pitch).trunc().max(1.0) as u32;
        (cols, rows)
    }

    /// Scan an image into open segments with per-point power.
    ///
    /// Lines whose powers never exceed `power_min` are omitted.
    pub fn scan(
        &self,
        image: &GrayImage,
        placement: &ImagePlacement,
        viewport_height: f64,
        power_min: f64,
        power_max: f64,
        element_id: &str,
    ) -> CamToolResult<Vec<PathSegment>> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CamToolError::Image(format!("{} has no pixels", element_id)));
        }
        if !(placement.width > 0.0 && placement.height > 0.0) {
            return Err(ParameterError::InvalidDimensions(format!(
                "{} is placed at {}x{}mm",
                element_id, placement.width, placement.height
            ))
            .into());
        }

        let (cols, rows) = self.grid_size(placement.width, placement.height);
        let grid = imageops::resize(image, cols, rows, FilterType::Lanczos3);
        let pitch = self.mm_per_dot();
        let origin = SegmentOrigin::new(element_id, "raster");
        let threshold = power_min.trunc();

        debug!(
            "Scanning {} at {} DPI: {}x{} dots, {}",
            element_id, self.dpi, cols, rows, self.direction
        );

        let (lines, samples) = match self.direction {
            ScanDirection::Horizontal => (rows, cols),
            ScanDirection::Vertical => (cols, rows),
        };

        let mut segments = Vec::new();
        for line in 0..lines {
            let mut points = Vec::with_capacity(samples as usize);
            let mut powers = Vec::with_capacity(samples as usize);

            for step in 0..samples {
                let sample = if line % 2 == 0 { step } else { samples - 1 - step };
                let (col, row) = match self.direction {
                    ScanDirection::Horizontal => (sample, line),
                    ScanDirection::Vertical => (line, sample),
                };
                let local = point(
                    placement.x + f64::from(col) * pitch,
                    placement.y + f64::from(row) * pitch,
                );
                let doc = placement.transform.transform_point(local);
                points.push(Point::new(doc.x, viewport_height - doc.y));
                powers.push(pixel_to_power(
                    grid.get_pixel(col, row).0[0],
                    power_min,
                    power_max,
                ));
            }

            let peak = powers.iter().copied().max().unwrap_or(0);
            if points.len() >= 2 && f64::from(peak) > threshold {
                segments.push(PathSegment::with_powers(points, powers, origin.clone())?);
            }
        }

        debug!("{} produced {} scan line(s)", element_id, segments.len());
        Ok(segments)
    }
}
