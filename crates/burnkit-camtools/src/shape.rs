//! Shape geometry handed to the flattener.
//!
//! Shapes live in a [`ShapeArena`] and are addressed by a stable
//! [`ShapeId`], so extraction results can be cached by index rather than by
//! object identity.

use crate::error::PathDataResult;
use crate::path_data;
use lyon::geom::{point, CubicBezierSegment};

/// Affine transform in SVG `matrix(a, b, c, d, e, f)` layout.
pub type Transform = lyon::geom::Transform<f64>;

/// Point type used for control points before flattening.
pub type ControlPoint = lyon::geom::Point<f64>;

/// Build a transform from the six SVG matrix coefficients.
pub fn matrix_transform([a, b, c, d, e, f]: [f64; 6]) -> Transform {
    Transform::new(a, b, c, d, e, f)
}

/// One subpath: a start point followed by cubic Bézier spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Subpath {
    pub start: ControlPoint,
    pub spans: Vec<CubicBezierSegment<f64>>,
    pub closed: bool,
}

impl Subpath {
    pub fn new(start: ControlPoint) -> Self {
        Self {
            start,
            spans: Vec::new(),
            closed: false,
        }
    }

    /// Current pen position: the end of the last span, or the start.
    pub fn end_point(&self) -> ControlPoint {
        self.spans.last().map_or(self.start, |span| span.to)
    }

    /// Append a straight line as a degenerate cubic.
    pub fn line_to(&mut self, to: ControlPoint) {
        let from = self.end_point();
        self.spans.push(CubicBezierSegment {
            from,
            ctrl1: from,
            ctrl2: to,
            to,
        });
    }

    pub fn cubic_to(&mut self, ctrl1: ControlPoint, ctrl2: ControlPoint, to: ControlPoint) {
        let from = self.end_point();
        self.spans.push(CubicBezierSegment {
            from,
            ctrl1,
            ctrl2,
            to,
        });
    }

    /// Copy with every control point mapped through `transform`.
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            start: transform.transform_point(self.start),
            spans: self
                .spans
                .iter()
                .map(|span| CubicBezierSegment {
                    from: transform.transform_point(span.from),
                    ctrl1: transform.transform_point(span.ctrl1),
                    ctrl2: transform.transform_point(span.ctrl2),
                    to: transform.transform_point(span.to),
                })
                .collect(),
            closed: self.closed,
        }
    }
}

/// A shape outline as a list of subpaths in local coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    pub subpaths: Vec<Subpath>,
}

impl Outline {
    pub fn new(subpaths: Vec<Subpath>) -> Self {
        Self { subpaths }
    }

    /// Read an outline from SVG path data.
    pub fn from_path_data(data: &str) -> PathDataResult<Self> {
        path_data::parse_path_data(data)
    }

    /// Closed axis-aligned rectangle.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        let mut subpath = Subpath::new(point(x, y));
        subpath.line_to(point(x + width, y));
        subpath.line_to(point(x + width, y + height));
        subpath.line_to(point(x, y + height));
        subpath.line_to(point(x, y));
        subpath.closed = true;
        Self::new(vec![subpath])
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            subpaths: self
                .subpaths
                .iter()
                .map(|subpath| subpath.transformed(transform))
                .collect(),
        }
    }
}

/// Stable index of a shape inside a [`ShapeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u32);

impl ShapeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A vector shape with its composed document transform.
#[derive(Debug, Clone)]
pub struct Shape {
    /// Identifier in the host document.
    pub element_id: String,
    /// Element kind (`path`, `rect`, `circle`, ...).
    pub kind: String,
    pub outline: Outline,
    /// Shape transform composed with all ancestor transforms.
    pub transform: Transform,
}

impl Shape {
    pub fn new(element_id: impl Into<String>, kind: impl Into<String>, outline: Outline) -> Self {
        Self {
            element_id: element_id.into(),
            kind: kind.into(),
            outline,
            transform: Transform::identity(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Outline in document coordinates.
    pub fn document_outline(&self) -> Outline {
        self.outline.transformed(&self.transform)
    }
}

/// Owns every shape of a document.
#[derive(Debug, Clone, Default)]
pub struct ShapeArena {
    shapes: Vec<Shape>,
}

impl ShapeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, shape: Shape) -> ShapeId {
        let id = ShapeId(self.shapes.len() as u32);
        self.shapes.push(shape);
        id
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &Shape)> {
        self.shapes
            .iter()
            .enumerate()
            .map(|(index, shape)| (ShapeId(index as u32), shape))
    }
}
