// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Subcommand implementations, independent of argument parsing

use super::input::{discover_inputs, load_input, load_mesh};
use crate::geometry::{AxisAlignedBoundingBox, Mesh, OrientedBoundingBox, Point3};
use crate::helper::GeometryHelper;
use crate::io::ObjSummary;
use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Bounding volumes of one input file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundsReport {
    pub path: PathBuf,
    pub aabb: AxisAlignedBoundingBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obb: Option<OrientedBoundingBox>,
}

/// Compute bounds for every input, in parallel
///
/// Directories are searched for `.json` and `.wkt` files. Results come back
/// in path order; the first failing input aborts the command.
pub fn bounds(paths: &[PathBuf], oriented: bool) -> Result<Vec<BoundsReport>> {
    let files = discover_inputs(paths, &["json", "geojson", "wkt"]);
    if files.is_empty() {
        bail!("No input files found");
    }

    files
        .par_iter()
        .map(|path| {
            let points = load_input(path)?.points();
            let aabb = AxisAlignedBoundingBox::from_points(&points)
                .with_context(|| format!("Failed to bound {}", path.display()))?;
            let obb = if oriented {
                Some(OrientedBoundingBox::from_points(&points)?)
            } else {
                None
            };
            Ok(BoundsReport {
                path: path.clone(),
                aabb,
                obb,
            })
        })
        .collect()
}

/// Relation of a probe point to a mesh and its bounding volumes
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub point: Point3,
    pub touches: bool,
    pub intersects: bool,
    pub in_aabb: bool,
    pub in_obb: bool,
    pub closed: bool,
}

pub fn probe(mesh: &Mesh, point: Point3, tol: f64) -> ProbeReport {
    ProbeReport {
        point,
        touches: mesh.touches_with(&point, tol),
        intersects: mesh.intersects_with(&point, tol),
        in_aabb: mesh.axis_aligned_bounds().contains(&point),
        in_obb: mesh.oriented_bounds().contains(&point),
        closed: mesh.is_closed(),
    }
}

pub fn probe_file(helper: &GeometryHelper, path: &Path, point: Point3) -> Result<ProbeReport> {
    Ok(probe(&load_mesh(path)?, point, helper.config().tolerance))
}

/// Merge the inputs and export them as one OBJ file
pub fn export_obj(helper: &GeometryHelper, inputs: &[PathBuf], output: &Path) -> Result<ObjSummary> {
    let geometries = inputs
        .iter()
        .map(|path| Ok(load_input(path)?.to_geometry()))
        .collect::<Result<Vec<_>>>()?;
    let summary = helper
        .export_obj(&geometries, output)
        .with_context(|| format!("Failed to export {}", output.display()))?;
    Ok(summary)
}

/// Target of the `convert` subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Wkt,
    GeoJson,
    Box3d,
}

impl FromStr for TextFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wkt" => Ok(TextFormat::Wkt),
            "geojson" | "json" => Ok(TextFormat::GeoJson),
            "box3d" => Ok(TextFormat::Box3d),
            other => bail!("Unsupported format: {other} (expected wkt, geojson or box3d)"),
        }
    }
}

pub fn convert(helper: &GeometryHelper, input: &Path, format: TextFormat) -> Result<String> {
    let loaded = load_input(input)?;
    let text = match format {
        TextFormat::Wkt => helper.to_wkt(&loaded.to_geometry()),
        TextFormat::GeoJson => helper.to_geojson(&loaded.to_geometry())?,
        TextFormat::Box3d => AxisAlignedBoundingBox::from_points(&loaded.points())?.to_text(),
    };
    Ok(text)
}

/// Scalar measures of an input, and its distance to a second one
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureReport {
    pub geometry_type: &'static str,
    pub area: f64,
    pub length: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intersects: Option<bool>,
}

pub fn measure(helper: &GeometryHelper, input: &Path, other: Option<&Path>) -> Result<MeasureReport> {
    let geometry = load_input(input)?.to_geometry();
    let mut report = MeasureReport {
        geometry_type: helper.geometry_type(&geometry),
        area: helper.area(&geometry),
        length: helper.length(&geometry),
        distance: None,
        intersects: None,
    };
    if let Some(other) = other {
        let other = load_input(other)?.to_geometry();
        report.distance = Some(helper.distance(&geometry, &other)?);
        report.intersects = Some(helper.intersects(&geometry, &other));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use std::fs;
    use tempfile::TempDir;

    const CUBE: &str = r#"{
        "vertices": [
            {"x":0,"y":0,"z":0},{"x":1,"y":0,"z":0},{"x":1,"y":1,"z":0},{"x":0,"y":1,"z":0},
            {"x":0,"y":0,"z":1},{"x":1,"y":0,"z":1},{"x":1,"y":1,"z":1},{"x":0,"y":1,"z":1}
        ],
        "faceIndexes": [0,1,2, 0,2,3, 4,5,6, 4,6,7, 1,2,6, 1,6,5, 3,2,6, 3,6,7, 0,3,7, 0,7,4, 0,1,5, 0,5,4]
    }"#;

    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cube.json"), CUBE).unwrap();
        fs::write(dir.path().join("far.wkt"), "POINT Z (5 0.5 0.5)").unwrap();
        dir
    }

    #[test]
    fn test_bounds_over_directory() {
        let dir = workspace();
        let reports = bounds(&[dir.path().to_path_buf()], true).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].aabb.max(), Point3::new(1.0, 1.0, 1.0));
        assert!(reports[0].obb.is_some());
    }

    #[test]
    fn test_probe_cube() {
        let dir = workspace();
        let path = dir.path().join("cube.json");
        let helper = GeometryHelper::default();
        let inside = probe_file(&helper, &path, Point3::new(0.5, 0.5, 0.5)).unwrap();
        assert!(inside.closed);
        assert!(inside.intersects && !inside.touches);
        let face = probe_file(&helper, &path, Point3::new(0.5, 0.5, 1.0)).unwrap();
        assert!(face.touches && face.in_aabb);
    }

    #[test]
    fn test_point_report_honours_configured_tolerance() {
        let dir = workspace();
        let path = dir.path().join("cube.json");
        let above = Point3::new(0.5, 0.5, 1.0 + 1e-6);

        let strict = probe_file(&GeometryHelper::default(), &path, above).unwrap();
        assert!(!strict.touches && !strict.intersects);

        let loose = GeometryHelper::new(EngineConfig {
            tolerance: 1e-3,
            ..EngineConfig::default()
        });
        let report = probe_file(&loose, &path, above).unwrap();
        assert!(report.touches && report.intersects);
    }

    #[test]
    fn test_convert_and_measure() {
        let dir = workspace();
        let helper = GeometryHelper::default();
        let cube = dir.path().join("cube.json");

        let box3d = convert(&helper, &cube, TextFormat::Box3d).unwrap();
        assert_eq!(box3d, "BOX3D(0 0 0, 1 1 1)");
        assert!(convert(&helper, &cube, "wkt".parse().unwrap())
            .unwrap()
            .starts_with("POLYHEDRALSURFACE Z"));

        let report = measure(&helper, &cube, Some(&dir.path().join("far.wkt"))).unwrap();
        assert!((report.area - 6.0).abs() < 1e-9);
        assert!((report.distance.unwrap() - 4.0).abs() < 1e-9);
        assert_eq!(report.intersects, Some(false));
    }

    #[test]
    fn test_export_merges_inputs() {
        let dir = workspace();
        let helper = GeometryHelper::default();
        let out = dir.path().join("out/model.obj");
        let summary = export_obj(
            &helper,
            &[dir.path().join("cube.json"), dir.path().join("far.wkt")],
            &out,
        )
        .unwrap();
        assert_eq!(summary.vertex_count, 9);
        assert_eq!(summary.face_count, 12);
    }
}
