use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn fieldplots() -> Command {
    Command::cargo_bin("fieldplots").expect("binary")
}

fn write_points(path: &Path, points: &[[f64; 2]]) {
    let features: Vec<serde_json::Value> = points
        .iter()
        .map(|p| {
            serde_json::json!({
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "Point", "coordinates": p},
            })
        })
        .collect();
    let collection = serde_json::json!({
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::32614"}},
        "features": features,
    });
    fs::write(path, collection.to_string()).expect("write points");
}

#[test]
fn help_lists_subcommands() {
    fieldplots()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("grid"))
        .stdout(predicate::str::contains("coverage"))
        .stdout(predicate::str::contains("subtract"));
}

#[test]
fn grid_command_writes_cells() {
    let dir = tempfile::tempdir().expect("tempdir");
    let corners = dir.path().join("corners.geojson");
    let out = dir.path().join("grid.geojson");
    write_points(&corners, &[[0.0, 0.0], [10.0, 0.0], [10.0, 20.0]]);

    fieldplots()
        .args(["--log-level", "warn", "grid", "--corners"])
        .arg(&corners)
        .arg("--out")
        .arg(&out)
        .args(["--ranges", "2", "--columns", "2", "--rows", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote 8 cells"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("read grid")).expect("json");
    assert_eq!(json["features"].as_array().map(Vec::len), Some(8));
    assert_eq!(
        json["crs"]["properties"]["name"],
        "urn:ogc:def:crs:EPSG::32614"
    );
}

#[test]
fn line_grid_needs_four_corners() {
    let dir = tempfile::tempdir().expect("tempdir");
    let corners = dir.path().join("corners.geojson");
    write_points(&corners, &[[0.0, 0.0], [10.0, 0.0], [10.0, 20.0]]);

    fieldplots()
        .args(["line-grid", "--first", "2", "--second", "3", "--corners"])
        .arg(&corners)
        .arg("--out")
        .arg(dir.path().join("quads.geojson"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("4 corners"));
}

#[test]
fn line_grid_writes_quads() {
    let dir = tempfile::tempdir().expect("tempdir");
    let corners = dir.path().join("corners.geojson");
    let out = dir.path().join("quads.geojson");
    write_points(
        &corners,
        &[[0.0, 0.0], [10.0, 0.0], [10.0, 20.0], [0.0, 20.0]],
    );

    fieldplots()
        .args(["line-grid", "--first", "2", "--second", "3", "--corners"])
        .arg(&corners)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote 6 polygons"));
    assert!(out.exists());
}

#[test]
fn missing_input_file_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    fieldplots()
        .args(["grid", "--corners"])
        .arg(dir.path().join("nope.geojson"))
        .arg("--out")
        .arg(dir.path().join("grid.geojson"))
        .assert()
        .failure();
    assert!(!dir.path().join("grid.geojson").exists());
}

#[test]
fn failed_transform_leaves_no_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let regions = dir.path().join("plots.geojson");
    let out = dir.path().join("pixels.json");
    write_points(&regions, &[[0.0, 0.0]]);

    fieldplots()
        .args(["transform", "--image"])
        .arg(dir.path().join("missing.tif"))
        .arg("--regions")
        .arg(&regions)
        .arg("--out")
        .arg(&out)
        .assert()
        .failure();
    assert!(!out.exists());
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .expect("read dir")
        .filter_map(Result::ok)
        .filter(|e| e.path() != regions)
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn flexible_without_anchors_is_rejected() {
    fieldplots()
        .args(["flexible", "--corners", "corners.geojson"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--anchors"));
}

#[test]
fn unknown_colorspace_is_a_usage_error() {
    fieldplots()
        .args(["color", "--colorspaces", "cmyk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cmyk"));
}
