use burnkit_camtools::{hatch_closed_segments, Outline, PathExtractor, Shape, ShapeArena};
use burnkit_core::FillParams;

#[test]
fn test_square_outline_hatches_into_nine_lines() {
    let mut arena = ShapeArena::new();
    let id = arena.insert(Shape::new(
        "square",
        "rect",
        Outline::rectangle(0.0, 0.0, 10.0, 10.0),
    ));
    let mut extractor = PathExtractor::new();
    let segments = extractor.extract(&arena, id, 10.0).unwrap();
    assert_eq!(segments.len(), 1);
    assert!(segments[0].is_closed());

    let params = FillParams {
        angle: 0.0,
        spacing: 1.0,
        alternate: true,
    };
    let hatches = hatch_closed_segments(&segments, &params);

    assert_eq!(hatches.len(), 9);
    for (index, line) in hatches.iter().enumerate() {
        assert!((line.length() - 10.0).abs() < 1e-9);
        assert!((line.start_point().y - (index + 1) as f64).abs() < 1e-9);
        let forward = line.start_point().x < line.end_point().x;
        assert_eq!(forward, index % 2 == 0);
    }
}

#[test]
fn test_open_outline_has_nothing_to_fill() {
    let mut arena = ShapeArena::new();
    let outline = Outline::from_path_data("M0 0 L10 0 L10 10").unwrap();
    let id = arena.insert(Shape::new("open", "path", outline));
    let segments = PathExtractor::new().extract(&arena, id, 10.0).unwrap();

    assert!(hatch_closed_segments(&segments, &FillParams::default()).is_empty());
}
