//! Shape reordering.
//!
//! Rewrites the shape order of each visible layer so that the shapes form a
//! nearest-neighbour tour of their first segments. Shapes that produce no
//! geometry keep their relative order at the front of the layer.

use crate::document::{DocumentFile, ShapeFile};
use crate::flattener::PathExtractor;
use crate::optimizer::PathOptimizer;
use crate::shape::{matrix_transform, ShapeArena, Transform};
use burnkit_core::{OptimizationMetrics, PathSegment};
use tracing::{debug, info, warn};

/// What a reorder pass changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReorderSummary {
    pub layers_reordered: usize,
    /// Shapes that ended up at a different position.
    pub elements_moved: usize,
    pub metrics: OptimizationMetrics,
}

/// Reorder the shapes of every visible layer with two or more shapes.
pub fn reorder_shapes(file: &mut DocumentFile, tolerance: f64) -> ReorderSummary {
    let mut summary = ReorderSummary::default();
    let viewport_height = file.viewport_height;

    for layer in file.layers.iter_mut() {
        if !layer.visible || layer.shapes.len() < 2 {
            continue;
        }
        let parent = matrix_transform(layer.matrix);
        let (order, metrics) = tour_order(&layer.shapes, &parent, viewport_height, tolerance);

        let moved = order
            .iter()
            .enumerate()
            .filter(|(position, index)| position != *index)
            .count();
        debug!("Layer '{}': {} shape(s) moved", layer.label, moved);

        let mut slots: Vec<Option<ShapeFile>> =
            std::mem::take(&mut layer.shapes).into_iter().map(Some).collect();
        layer.shapes = order
            .into_iter()
            .filter_map(|index| slots.get_mut(index).and_then(Option::take))
            .collect();

        summary.layers_reordered += 1;
        summary.elements_moved += moved;
        summary.metrics += metrics;
    }

    if summary.elements_moved > 0 {
        info!(
            "Reordered {} elements: travel reduced by {:.1}%",
            summary.elements_moved,
            summary.metrics.travel_savings()
        );
    } else {
        info!("No reordering needed");
    }
    summary
}

/// New shape order for one layer, as indices into `shapes`.
fn tour_order(
    shapes: &[ShapeFile],
    parent: &Transform,
    viewport_height: f64,
    tolerance: f64,
) -> (Vec<usize>, OptimizationMetrics) {
    let mut arena = ShapeArena::new();
    let mut extractor = PathExtractor::with_tolerance(tolerance);
    let mut order = Vec::with_capacity(shapes.len());
    let mut firsts = Vec::new();
    let mut positions = Vec::new();

    for (index, shape_file) in shapes.iter().enumerate() {
        match first_segment(shape_file, parent, &mut arena, &mut extractor, viewport_height) {
            Some(segment) => {
                firsts.push(segment);
                positions.push(index);
            }
            None => order.push(index),
        }
    }

    let (steps, metrics) = PathOptimizer::default().tour(&firsts, true);
    order.extend(steps.iter().map(|step| positions[step.index]));
    (order, metrics)
}

fn first_segment(
    shape_file: &ShapeFile,
    parent: &Transform,
    arena: &mut ShapeArena,
    extractor: &mut PathExtractor,
    viewport_height: f64,
) -> Option<PathSegment> {
    let shape = match shape_file.to_shape(parent) {
        Ok(shape) => shape,
        Err(err) => {
            warn!("Leaving shape '{}' in place: {}", shape_file.id, err);
            return None;
        }
    };
    let id = arena.insert(shape);
    match extractor.extract(arena, id, viewport_height) {
        Ok(segments) => segments.first().cloned(),
        Err(err) => {
            warn!("Leaving shape '{}' in place: {}", shape_file.id, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{LayerFile, IDENTITY_MATRIX};

    fn shape(id: &str, d: &str) -> ShapeFile {
        ShapeFile {
            id: id.to_string(),
            kind: "path".to_string(),
            d: d.to_string(),
            matrix: IDENTITY_MATRIX,
        }
    }

    fn document(shapes: Vec<ShapeFile>) -> DocumentFile {
        DocumentFile {
            name: "reorder".to_string(),
            viewport_height: 100.0,
            layers: vec![LayerFile {
                id: "layer1".to_string(),
                label: "Cuts".to_string(),
                visible: true,
                matrix: IDENTITY_MATRIX,
                jobs: Vec::new(),
                shapes,
                images: Vec::new(),
            }],
        }
    }

    fn ids(file: &DocumentFile) -> Vec<&str> {
        file.layers[0].shapes.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_shapes_follow_nearest_neighbour_tour() {
        // Document Y is flipped against a height of 100, so y=100 is the machine origin.
        let mut file = document(vec![
            shape("far", "M50 100 L60 100"),
            shape("near", "M1 100 L2 100"),
            shape("middle", "M20 100 L30 100"),
        ]);
        let summary = reorder_shapes(&mut file, 0.1);

        assert_eq!(ids(&file), vec!["near", "middle", "far"]);
        assert_eq!(summary.layers_reordered, 1);
        assert_eq!(summary.elements_moved, 3);
        assert!(summary.metrics.travel_savings() > 0.0);
    }

    #[test]
    fn test_unreadable_shapes_stay_first() {
        let mut file = document(vec![
            shape("far", "M50 100 L60 100"),
            shape("broken", "M0 0 Q 1"),
            shape("near", "M1 100 L2 100"),
        ]);
        reorder_shapes(&mut file, 0.1);
        assert_eq!(ids(&file), vec!["broken", "near", "far"]);
    }

    #[test]
    fn test_duplicate_ids_keep_all_shapes() {
        let mut file = document(vec![
            shape("dup", "M50 100 L60 100"),
            shape("dup", "M1 100 L2 100"),
        ]);
        reorder_shapes(&mut file, 0.1);
        let layer = &file.layers[0];
        assert_eq!(layer.shapes.len(), 2);
        assert_eq!(layer.shapes[0].d, "M1 100 L2 100");
        assert_eq!(layer.shapes[1].d, "M50 100 L60 100");
    }

    #[test]
    fn test_ordered_layer_is_unchanged() {
        let mut file = document(vec![
            shape("a", "M1 100 L2 100"),
            shape("b", "M3 100 L4 100"),
        ]);
        let before = file.clone();
        let summary = reorder_shapes(&mut file, 0.1);
        assert_eq!(file, before);
        assert_eq!(summary.elements_moved, 0);
    }

    #[test]
    fn test_hidden_and_single_shape_layers_skipped() {
        let mut file = document(vec![
            shape("far", "M50 100 L60 100"),
            shape("near", "M1 100 L2 100"),
        ]);
        file.layers[0].visible = false;
        let summary = reorder_shapes(&mut file, 0.1);
        assert_eq!(ids(&file), vec!["far", "near"]);
        assert_eq!(summary.layers_reordered, 0);

        let mut single = document(vec![shape("only", "M0 0 L1 1")]);
        assert_eq!(reorder_shapes(&mut single, 0.1).layers_reordered, 0);
    }
}
