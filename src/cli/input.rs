// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Input discovery and loading for the command-line front end

use crate::geometry::{Geometry, Mesh, Point3};
use crate::io;
use crate::item::ModelItem;
use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A loaded input file
#[derive(Debug, Clone)]
pub enum Input {
    /// Mesh JSON `{vertices, faceIndexes}` or a model item placed in world space
    Mesh(Mesh),
    /// WKT or GeoJSON geometry
    Geometry(Geometry),
}

impl Input {
    pub fn to_geometry(&self) -> Geometry {
        match self {
            Input::Mesh(mesh) => mesh.to_geometry(),
            Input::Geometry(geometry) => geometry.clone(),
        }
    }

    /// Points used for bounding-volume fitting: mesh vertices or every
    /// geometry coordinate
    pub fn points(&self) -> Vec<Point3> {
        match self {
            Input::Mesh(mesh) => mesh.vertices().to_vec(),
            Input::Geometry(geometry) => geometry.coordinates(),
        }
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// Expand files and directories into a sorted list of input files
pub fn discover_inputs(paths: &[PathBuf], extensions: &[&str]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if entry_path.is_file() && has_extension(entry_path, extensions) {
                    files.push(entry_path.to_path_buf());
                }
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

/// Read a JSON or text file into an [`Input`]
///
/// JSON is tried as a mesh, then as a model item, then as GeoJSON. Any
/// other file is read as WKT.
pub fn load_input(path: &Path) -> Result<Input> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    if has_extension(path, &["json", "geojson"]) {
        parse_json_input(&content).with_context(|| format!("Failed to load {}", path.display()))
    } else {
        let geometry = io::parse_wkt(&content)
            .with_context(|| format!("Failed to parse WKT in {}", path.display()))?;
        Ok(Input::Geometry(geometry))
    }
}

fn parse_json_input(content: &str) -> Result<Input> {
    let value: serde_json::Value = serde_json::from_str(content).context("Invalid JSON")?;

    if value.get("faceIndexes").is_some() {
        let mesh: Mesh = serde_json::from_value(value).context("Invalid mesh record")?;
        return Ok(Input::Mesh(mesh));
    }
    if value.get("mesh").is_some() {
        let item: ModelItem = serde_json::from_value(value).context("Invalid model item")?;
        return Ok(Input::Mesh(item.world_mesh()?));
    }
    if value.get("type").is_some() {
        return Ok(Input::Geometry(io::parse_geojson(content)?));
    }
    bail!("JSON is neither a mesh, a model item nor GeoJSON")
}

/// Load a file that must hold a mesh
pub fn load_mesh(path: &Path) -> Result<Mesh> {
    match load_input(path)? {
        Input::Mesh(mesh) => Ok(mesh),
        Input::Geometry(g) => Err(anyhow!(
            "{} holds a {} geometry, expected a mesh",
            path.display(),
            g.geometry_type()
        )),
    }
}

/// Parse `x,y,z` (or `x,y`) into a point
pub fn parse_point(text: &str) -> Result<Point3> {
    let values = text
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid point: {text}"))?;
    match values.as_slice() {
        [x, y] => Ok(Point3::new(*x, *y, 0.0)),
        [x, y, z] => Ok(Point3::new(*x, *y, *z)),
        _ => bail!("Point needs 2 or 3 comma-separated values: {text}"),
    }
}
