//! Polyline segments produced by the flattener, the hatch generator and the
//! raster scanner, and consumed by the optimizer and the G-code emitter.

use crate::constants::CLOSED_PATH_TOLERANCE;
use crate::error::{Error, Result};
use crate::geometry::{distance, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Whether a segment forms a closed loop or is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    Closed,
    Open,
}

impl PathKind {
    /// Classify a point list: closed when it has at least three points and
    /// its first and last points are within [`CLOSED_PATH_TOLERANCE`].
    pub fn classify(points: &[Point]) -> Self {
        match (points.first(), points.last()) {
            (Some(first), Some(last))
                if points.len() >= 3 && distance(*first, *last) < CLOSED_PATH_TOLERANCE =>
            {
                Self::Closed
            }
            _ => Self::Open,
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// Where a segment came from, kept for diagnostics and G-code comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentOrigin {
    /// Identifier of the source shape or image.
    pub element_id: String,
    /// Kind of the source element (`path`, `rect`, `hatch`, `raster`, ...).
    pub element_kind: String,
}

impl SegmentOrigin {
    pub fn new(element_id: impl Into<String>, element_kind: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            element_kind: element_kind.into(),
        }
    }
}

impl fmt::Display for SegmentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element_kind, self.element_id)
    }
}

/// An immutable polyline with an open/closed classification.
///
/// Raster scan lines additionally carry one power value per point. The power
/// list lives inside the segment so reordering and reversal always keep it
/// aligned with the points.
#[derive(Debug, Clone)]
pub struct PathSegment {
    points: Vec<Point>,
    origin: SegmentOrigin,
    kind: PathKind,
    powers: Option<Vec<u32>>,
    length: OnceLock<f64>,
}

impl PathSegment {
    /// Creates a segment with an explicit classification.
    pub fn new(points: Vec<Point>, origin: SegmentOrigin, kind: PathKind) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::EmptySegment);
        }
        Ok(Self {
            points,
            origin,
            kind,
            powers: None,
            length: OnceLock::new(),
        })
    }

    /// Creates a segment and classifies it from its geometry.
    pub fn classified(points: Vec<Point>, origin: SegmentOrigin) -> Result<Self> {
        let kind = PathKind::classify(&points);
        Self::new(points, origin, kind)
    }

    /// Creates an open segment carrying one power value per point.
    pub fn with_powers(points: Vec<Point>, powers: Vec<u32>, origin: SegmentOrigin) -> Result<Self> {
        if points.len() != powers.len() {
            return Err(Error::PowerListMismatch {
                points: points.len(),
                powers: powers.len(),
            });
        }
        let mut segment = Self::new(points, origin, PathKind::Open)?;
        segment.powers = Some(powers);
        Ok(segment)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn origin(&self) -> &SegmentOrigin {
        &self.origin
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    /// Per-point power values, present only on raster scan lines.
    pub fn powers(&self) -> Option<&[u32]> {
        self.powers.as_deref()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; a segment holds at least one point.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start_point(&self) -> Point {
        self.points[0]
    }

    pub fn end_point(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Cumulative polyline length, computed on first use.
    pub fn length(&self) -> f64 {
        *self.length.get_or_init(|| {
            self.points
                .windows(2)
                .map(|pair| distance(pair[0], pair[1]))
                .sum()
        })
    }

    /// Geometric closed test, independent of the stored classification.
    pub fn is_closed(&self) -> bool {
        PathKind::classify(&self.points) == PathKind::Closed
    }

    /// Returns a reversed copy; points and powers are reversed together.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        let powers = self.powers.as_ref().map(|p| {
            let mut p = p.clone();
            p.reverse();
            p
        });
        let length = OnceLock::new();
        if let Some(len) = self.length.get() {
            let _ = length.set(*len);
        }
        Self {
            points,
            origin: self.origin.clone(),
            kind: self.kind,
            powers,
            length,
        }
    }
}

impl PartialEq for PathSegment {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points
            && self.origin == other.origin
            && self.kind == other.kind
            && self.powers == other.powers
    }
}
