use burnkit_camtools::{reorder_shapes, DocumentFile};

const DOCUMENT: &str = r#"{
    "name": "tour",
    "viewport_height": 50.0,
    "layers": [
        {
            "id": "layer1",
            "label": "Cuts",
            "shapes": [
                {"id": "right", "d": "M40 50 L45 50"},
                {"id": "left", "d": "M0 45 L0 40"},
                {"id": "centre", "d": "M20 50 L25 50"}
            ]
        }
    ]
}"#;

#[test]
fn test_reordered_document_survives_json() {
    let mut file: DocumentFile = serde_json::from_str(DOCUMENT).unwrap();
    let summary = reorder_shapes(&mut file, 0.1);
    assert_eq!(summary.layers_reordered, 1);

    let restored: DocumentFile = serde_json::from_str(&file.to_json().unwrap()).unwrap();
    let order: Vec<&str> = restored.layers[0]
        .shapes
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(order, vec!["left", "centre", "right"]);
}
