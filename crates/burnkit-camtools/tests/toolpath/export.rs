//! End-to-end export of a stored document.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use burnkit_camtools::{write_output, Document, ExportOptions, LayerExporter};
use burnkit_core::MachineSettings;
use image::{GrayImage, Luma};
use std::fs;
use std::path::Path;

const DOCUMENT: &str = r#"{
    "name": "workshop sign",
    "viewport_height": 100.0,
    "layers": [
        {
            "id": "cut",
            "label": "Outline",
            "jobs": [{"type": "cut", "power_max": 600, "speed": 800, "air_assist": false}],
            "shapes": [{"id": "frame", "kind": "rect", "d": "M0 0 H10 V10 H0 Z"}]
        },
        {
            "id": "fill",
            "label": "Engrave",
            "jobs": [{
                "type": "fill",
                "power_max": 600,
                "air_assist": false,
                "params": {"angle": 0, "spacing": 2, "alternate": true}
            }],
            "shapes": [{"id": "badge", "d": "M20 20 H30 V30 H20 Z"}]
        },
        {
            "id": "photo",
            "label": "Photo",
            "jobs": [{"type": "raster", "power_max": 500, "laser_mode": "M4", "params": {"dpi": 254}}],
            "images": [
                {"id": "logo", "href": "logo.png", "x": 50, "y": 50, "width": 0.45, "height": 0.25},
                {"id": "lost", "href": "missing.png", "x": 0, "y": 0, "width": 5, "height": 5}
            ]
        },
        {
            "id": "hidden",
            "label": "Guides",
            "visible": false,
            "jobs": [{"type": "cut"}],
            "shapes": [{"id": "guide", "d": "M0 0 L100 100"}]
        }
    ]
}"#;

fn write_document(dir: &Path) -> std::path::PathBuf {
    GrayImage::from_pixel(4, 2, Luma([0]))
        .save(dir.join("logo.png"))
        .unwrap();
    let path = dir.join("sign.json");
    fs::write(&path, DOCUMENT).unwrap();
    path
}

fn export(options: ExportOptions) -> (String, burnkit_camtools::ExportSummary) {
    let dir = tempfile::tempdir().unwrap();
    let document = Document::load(&write_document(dir.path())).unwrap();
    LayerExporter::new(MachineSettings::default(), options)
        .export(&document)
        .unwrap()
}

#[test]
fn test_program_frame() {
    let (gcode, summary) = export(ExportOptions::default());
    let lines: Vec<&str> = gcode.lines().collect();

    assert_eq!(lines[0], "; BurnKit laser G-code");
    assert!(lines[1].starts_with("; Generated: "));
    assert_eq!(lines[2], "; Document: workshop sign");
    assert_eq!(
        &lines[lines.len() - 4..],
        &[
            "M5 ; Laser off",
            "M9 ; Air assist off",
            "G0 X0 Y0 ; Return to origin",
            "M2 ; End of program",
        ]
    );

    assert_eq!(summary.layers_exported, 3);
    assert_eq!(summary.jobs_emitted, 3);
    assert_eq!(summary.images_skipped, 1);
    assert_eq!(summary.shapes_skipped, 0);
    assert!(!gcode.contains("; Layer: Guides"));
}

#[test]
fn test_laser_is_off_during_rapids() {
    let (gcode, _) = export(ExportOptions::default());
    let mut laser_on = false;

    for line in gcode.lines() {
        if line.starts_with("M3 ") || line.starts_with("M4 ") {
            assert!(!laser_on, "laser enabled twice: {line}");
            laser_on = true;
        } else if line.starts_with("M5") {
            laser_on = false;
        } else if line.starts_with("G0") {
            assert!(!laser_on, "rapid with laser on: {line}");
        } else if line.starts_with("G1") {
            assert!(laser_on, "cut with laser off: {line}");
        }
    }
    assert!(!laser_on);
}

#[test]
fn test_each_job_contributes_its_segments() {
    let (gcode, _) = export(ExportOptions::default());

    // One frame outline plus four hatch lines at y = 72, 74, 76, 78.
    let constant = gcode.lines().filter(|l| l.starts_with("M3 S600")).count();
    assert_eq!(constant, 5);

    // Two scan lines from the 4x2 logo, fully black.
    let dynamic = gcode.lines().filter(|l| l.starts_with("M4 S")).count();
    assert_eq!(dynamic, 2);
    assert!(gcode.contains("S500"));
    assert!(gcode.contains("; raster logo"));
}

#[test]
fn test_inline_image_is_rastered() {
    let mut png = Vec::new();
    image::DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 2, Luma([0])))
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let href = format!("data:image/png;base64,{}", STANDARD.encode(&png));
    let raw = format!(
        r#"{{
            "name": "inline",
            "viewport_height": 10.0,
            "layers": [{{
                "id": "photo",
                "label": "Photo",
                "jobs": [{{"type": "raster", "power_max": 700, "laser_mode": "M4", "air_assist": false, "params": {{"dpi": 254}}}}],
                "images": [{{"id": "badge", "href": "{}", "width": 0.45, "height": 0.25}}]
            }}]
        }}"#,
        href
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inline.json");
    fs::write(&path, raw).unwrap();
    let document = Document::load(&path).unwrap();

    let (gcode, summary) = LayerExporter::new(MachineSettings::default(), ExportOptions::default())
        .export(&document)
        .unwrap();
    assert_eq!(summary.images_skipped, 0);
    assert_eq!(summary.jobs_emitted, 1);
    assert_eq!(gcode.lines().filter(|l| l.starts_with("M4 S700")).count(), 2);
    assert!(gcode.contains("; raster badge"));
}

#[test]
fn test_disabled_optimization_keeps_document_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("order.json");
    fs::write(
        &path,
        r#"{
            "name": "order",
            "viewport_height": 100.0,
            "layers": [{
                "id": "l1",
                "label": "Cuts",
                "jobs": [{"type": "cut", "air_assist": false}],
                "shapes": [
                    {"id": "far", "d": "M80 100 L90 100"},
                    {"id": "near", "d": "M1 100 L2 100"}
                ]
            }]
        }"#,
    )
    .unwrap();
    let document = Document::load(&path).unwrap();

    let options = ExportOptions {
        optimize: false,
        ..ExportOptions::default()
    };
    let (plain, summary) = LayerExporter::new(MachineSettings::default(), options)
        .export(&document)
        .unwrap();
    assert!(plain.find("; path far").unwrap() < plain.find("; path near").unwrap());
    assert_eq!(summary.metrics.original_travel_distance, 0.0);

    let (optimized, _) = LayerExporter::new(MachineSettings::default(), ExportOptions::default())
        .export(&document)
        .unwrap();
    assert!(optimized.find("; path near").unwrap() < optimized.find("; path far").unwrap());
}

#[test]
fn test_write_output_replaces_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sign.nc");
    fs::write(&path, "old").unwrap();

    write_output(&path, "G21\nM2\n").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "G21\nM2\n");
    assert!(!dir.path().join("sign.nc.tmp").exists());
}

#[test]
fn test_write_output_leaves_only_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sign.nc");
    fs::write(dir.path().join("sign.nc.tmp"), "unrelated").unwrap();

    write_output(&path, "G21\n").unwrap();
    write_output(&path, "G21\nM2\n").unwrap();

    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["sign.nc", "sign.nc.tmp"]);
    assert_eq!(fs::read_to_string(dir.path().join("sign.nc.tmp")).unwrap(), "unrelated");
    assert_eq!(fs::read_to_string(&path).unwrap(), "G21\nM2\n");
}

#[test]
fn test_write_output_failure_leaves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("sign.nc");

    assert!(write_output(&path, "M2\n").is_err());
    assert!(!path.exists());
}
