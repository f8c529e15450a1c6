// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Helper façade: exports, text interchange and planar operations

use anyhow::Result;
use approx::assert_relative_eq;
use spatial_engine::{EngineConfig, Geometry, GeometryError, GeometryHelper, Point3, Polygon};
use std::fs;
use tempfile::TempDir;

fn square(min: f64, max: f64) -> Geometry {
    Geometry::Polygon(Polygon::new(
        vec![
            Point3::new(min, min, 0.0),
            Point3::new(max, min, 0.0),
            Point3::new(max, max, 0.0),
            Point3::new(min, max, 0.0),
        ],
        Vec::new(),
    ))
}

#[test]
fn test_obj_export_shares_vertices() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("nested/out.obj");
    let helper = GeometryHelper::default();

    // adjacent squares share two corners
    let summary = helper.export_obj(&[square(0.0, 1.0), helper.from_wkt("POLYGON ((1 0, 2 0, 2 1, 1 1, 1 0))")?], &path)?;
    assert_eq!(summary.vertex_count, 6);
    assert_eq!(summary.face_count, 4);

    let text = fs::read_to_string(&path)?;
    assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 6);
    assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), 4);
    assert!(!text.starts_with('#'));
    Ok(())
}

#[test]
fn test_obj_header_follows_config() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("out.obj");
    let helper = GeometryHelper::new(EngineConfig {
        obj_header: true,
        ..EngineConfig::default()
    });
    helper.export_obj(&[square(0.0, 1.0)], &path)?;
    assert!(fs::read_to_string(&path)?.starts_with("# spatial-engine OBJ export"));
    Ok(())
}

#[test]
fn test_empty_export_leaves_no_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("empty.obj");
    let helper = GeometryHelper::default();
    let result = helper.export_obj(&[Geometry::GeometryCollection(Vec::new())], &path);
    assert!(matches!(result, Err(GeometryError::EmptyInput)));
    assert!(!path.exists());
    Ok(())
}

#[test]
fn test_filter_with_no_candidates() {
    let helper = GeometryHelper::default();
    assert!(helper.filter_intersecting(&square(0.0, 1.0), &[]).is_empty());
    let far = [square(5.0, 6.0)];
    assert!(helper.filter_intersecting(&square(0.0, 1.0), &far).is_empty());
}

#[test]
fn test_text_interchange() -> Result<()> {
    let helper = GeometryHelper::default();
    let geometry = helper.from_wkt("MULTILINESTRING ((0 0 1, 2 0 1), (5 5 5, 6 6 6))")?;
    assert_relative_eq!(helper.length(&geometry), 2.0 + 3f64.sqrt(), epsilon = 1e-12);

    let wkt = helper.to_wkt(&geometry);
    assert_eq!(helper.from_wkt(&wkt)?, geometry);

    let json = helper.to_geojson(&geometry)?;
    assert_eq!(helper.from_geojson(&json)?, geometry);

    let merged = helper.as_text(&[Geometry::Point(Point3::ORIGIN), Geometry::Point(Point3::new(1.0, 2.0, 3.0))]);
    assert_eq!(merged, "MULTIPOINT Z ((0 0 0), (1 2 3))");

    assert!(matches!(helper.from_wkt("POLYGON ((0 0, 1"), Err(GeometryError::Parse { .. })));
    Ok(())
}

#[test]
fn test_planar_operations() -> Result<()> {
    let helper = GeometryHelper::default();
    let a = square(0.0, 2.0);
    let b = square(1.0, 3.0);

    assert_relative_eq!(helper.area(&helper.intersection(&a, &b)?), 1.0, epsilon = 1e-9);
    assert_relative_eq!(helper.area(&helper.union(&a, &b)?), 7.0, epsilon = 1e-9);
    assert_relative_eq!(helper.area(&helper.difference(&a, &b)?), 3.0, epsilon = 1e-9);
    assert_relative_eq!(helper.area(&helper.sym_difference(&a, &b)?), 6.0, epsilon = 1e-9);

    let line = Geometry::LineString(vec![Point3::ORIGIN, Point3::new(4.0, 0.0, 0.0)]);
    let flat = helper.buffer(&line, 1.0, 8, "flat")?;
    assert_relative_eq!(helper.area(&flat), 8.0, epsilon = 1e-9);
    let square_caps = helper.buffer(&line, 1.0, 8, "SQUARE")?;
    assert_relative_eq!(helper.area(&square_caps), 12.0, epsilon = 1e-9);

    let round = helper.buffer_default(&Geometry::Point(Point3::ORIGIN), 1.0)?;
    let area = helper.area(&round);
    assert!(area < std::f64::consts::PI && area > 3.1);
    Ok(())
}
