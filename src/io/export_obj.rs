// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Wavefront OBJ exporter with exact vertex deduplication

use crate::error::{GeometryError, Result};
use crate::geometry::predicates::newell_normal;
use crate::geometry::{Geometry, Point3, Polygon};
use ahash::AHashMap;
use geo::{Coord, LineString, TriangulateEarcut};
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Counts of what an export wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjSummary {
    pub vertex_count: usize,
    pub face_count: usize,
}

/// Vertex table keyed on exact coordinates plus triangle records
#[derive(Debug, Default)]
struct ObjDocument {
    vertices: Vec<Point3>,
    lookup: AHashMap<[u64; 3], usize>,
    faces: Vec<[usize; 3]>,
}

impl ObjDocument {
    fn vertex(&mut self, p: Point3) -> usize {
        let next = self.vertices.len();
        let index = *self.lookup.entry(p.bits()).or_insert(next);
        if index == next {
            self.vertices.push(p);
        }
        index
    }

    fn add_geometry(&mut self, geometry: &Geometry) {
        match geometry {
            Geometry::Point(p) => {
                self.vertex(*p);
            }
            Geometry::LineString(points) | Geometry::MultiPoint(points) => {
                for p in points {
                    self.vertex(*p);
                }
            }
            Geometry::MultiLineString(lines) => {
                for p in lines.iter().flatten() {
                    self.vertex(*p);
                }
            }
            Geometry::Polygon(polygon) => self.add_polygon(polygon),
            Geometry::MultiPolygon(polygons) | Geometry::PolyhedralSurface(polygons) => {
                for polygon in polygons {
                    self.add_polygon(polygon);
                }
            }
            Geometry::GeometryCollection(members) => {
                for member in members {
                    self.add_geometry(member);
                }
            }
        }
    }

    fn add_polygon(&mut self, polygon: &Polygon) {
        for [a, b, c] in triangulate(polygon) {
            let face = [self.vertex(a), self.vertex(b), self.vertex(c)];
            if face[0] != face[1] && face[1] != face[2] && face[0] != face[2] {
                self.faces.push(face);
            }
        }
    }

    fn write_to<W: Write>(&self, out: &mut W, header: bool) -> std::io::Result<()> {
        if header {
            writeln!(out, "# spatial-engine OBJ export")?;
            writeln!(out, "# vertices: {}", self.vertices.len())?;
            writeln!(out, "# faces: {}", self.faces.len())?;
        }
        for v in &self.vertices {
            writeln!(out, "v {} {} {}", v.x, v.y, v.z)?;
        }
        for [a, b, c] in &self.faces {
            writeln!(out, "f {} {} {}", a + 1, b + 1, c + 1)?;
        }
        Ok(())
    }

    fn summary(&self) -> ObjSummary {
        ObjSummary {
            vertex_count: self.vertices.len(),
            face_count: self.faces.len(),
        }
    }
}

/// Triangles covering a polygon, wound like its exterior ring
///
/// Rings are projected onto the plane of their dominant normal axis and
/// ear-clipped, so concave faces and holes are handled.
fn triangulate(polygon: &Polygon) -> Vec<[Point3; 3]> {
    let open = |ring: &[Point3]| -> Vec<Point3> {
        match ring.split_last() {
            Some((last, body)) if ring.len() > 1 && *last == ring[0] => body.to_vec(),
            _ => ring.to_vec(),
        }
    };
    let exterior = open(polygon.exterior());
    if exterior.len() < 3 {
        return Vec::new();
    }

    let na_ring: Vec<_> = exterior.iter().map(|p| p.to_na()).collect();
    let normal = newell_normal(&na_ring);
    if normal.norm() <= f64::EPSILON {
        return Vec::new();
    }
    if exterior.len() == 3 && polygon.interiors().is_empty() {
        return vec![[exterior[0], exterior[1], exterior[2]]];
    }

    let drop_axis = normal.iamax();
    let project = |p: &Point3| -> Coord<f64> {
        match drop_axis {
            0 => Coord { x: p.y, y: p.z },
            1 => Coord { x: p.z, y: p.x },
            _ => Coord { x: p.x, y: p.y },
        }
    };

    let rings: Vec<Vec<Point3>> = std::iter::once(exterior)
        .chain(polygon.interiors().iter().map(|r| open(r)))
        .filter(|r| r.len() >= 3)
        .collect();
    let mut lifted: AHashMap<[u64; 2], Point3> = AHashMap::new();
    for p in rings.iter().flatten() {
        let c = project(p);
        lifted.entry([c.x.to_bits(), c.y.to_bits()]).or_insert(*p);
    }

    let to_line = |ring: &Vec<Point3>| LineString::new(ring.iter().map(project).collect());
    let flat = geo::Polygon::new(
        to_line(&rings[0]),
        rings[1..].iter().map(to_line).collect(),
    );
    let raw = flat.earcut_triangles_raw();

    let corner = |i: usize| -> Option<Point3> {
        let x = *raw.vertices.get(2 * i)?;
        let y = *raw.vertices.get(2 * i + 1)?;
        lifted.get(&[x.to_bits(), y.to_bits()]).copied()
    };
    raw.triangle_indices
        .chunks_exact(3)
        .filter_map(|t| Some([corner(t[0])?, corner(t[1])?, corner(t[2])?]))
        .map(|[a, b, c]| {
            let n = (b.to_na() - a.to_na()).cross(&(c.to_na() - a.to_na()));
            if n.dot(&normal) < 0.0 {
                [a, c, b]
            } else {
                [a, b, c]
            }
        })
        .collect()
}

fn document(geometries: &[Geometry]) -> Result<ObjDocument> {
    if geometries.iter().all(Geometry::is_empty) {
        return Err(GeometryError::EmptyInput);
    }
    let mut doc = ObjDocument::default();
    for geometry in geometries {
        doc.add_geometry(geometry);
    }
    Ok(doc)
}

/// Write OBJ text for `geometries` to any writer
pub fn write_obj<W: Write>(geometries: &[Geometry], out: &mut W, header: bool) -> Result<ObjSummary> {
    let doc = document(geometries)?;
    doc.write_to(out, header)?;
    Ok(doc.summary())
}

/// Export `geometries` to an OBJ file at `path`
///
/// Missing parent directories are created. The file is written to a
/// temporary sibling and renamed into place, so a failed export leaves any
/// existing destination untouched.
pub fn export(geometries: &[Geometry], path: &Path, header: bool) -> Result<ObjSummary> {
    let doc = document(geometries)?;

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut staged = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        doc.write_to(&mut writer, header)?;
        writer.flush()?;
    }
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| GeometryError::Io(e.error))?;

    let summary = doc.summary();
    info!(
        path = %path.display(),
        vertices = summary.vertex_count,
        faces = summary.face_count,
        "exported OBJ"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj_text(geometries: &[Geometry]) -> String {
        let mut out = Vec::new();
        write_obj(geometries, &mut out, false).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_shared_vertices_are_deduplicated() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(1.0, 1.0, 0.0);
        let d = Point3::new(0.0, 1.0, 0.0);
        let surface = Geometry::PolyhedralSurface(vec![
            Polygon::triangle(a, b, c),
            Polygon::triangle(a, c, d),
        ]);
        let text = obj_text(&[surface]);
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 4);
        assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), 2);
        assert!(text.contains("f 1 2 3\nf 1 3 4\n"));
    }

    #[test]
    fn test_concave_polygon_with_hole() {
        // L shape with a square hole in its long arm
        let polygon = Polygon::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(6.0, 0.0, 0.0),
                Point3::new(6.0, 2.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
                Point3::new(2.0, 6.0, 0.0),
                Point3::new(0.0, 6.0, 0.0),
            ],
            vec![vec![
                Point3::new(3.0, 0.5, 0.0),
                Point3::new(4.0, 0.5, 0.0),
                Point3::new(4.0, 1.5, 0.0),
                Point3::new(3.0, 1.5, 0.0),
            ]],
        );
        let triangles = triangulate(&polygon);
        let area: f64 = triangles
            .iter()
            .map(|[a, b, c]| {
                crate::geometry::predicates::triangle_area(&a.to_na(), &b.to_na(), &c.to_na())
            })
            .sum();
        assert!((area - 19.0).abs() < 1e-9, "area {area}");
        for [a, b, c] in &triangles {
            let n = (b.to_na() - a.to_na()).cross(&(c.to_na() - a.to_na()));
            assert!(n.z > 0.0);
        }
    }

    #[test]
    fn test_points_emit_vertices_only() {
        let text = obj_text(&[Geometry::MultiPoint(vec![
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(1.0, 2.0, 3.0),
        ])]);
        assert_eq!(text, "v 1 2 3\n");
    }

    #[test]
    fn test_empty_input_rejected() {
        let mut out = Vec::new();
        assert!(matches!(
            write_obj(&[], &mut out, false),
            Err(GeometryError::EmptyInput)
        ));
        assert!(matches!(
            write_obj(&[Geometry::LineString(Vec::new())], &mut out, false),
            Err(GeometryError::EmptyInput)
        ));
    }

    #[test]
    fn test_export_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/model.obj");
        let tri = Geometry::Polygon(Polygon::triangle(
            Point3::ORIGIN,
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ));
        let summary = export(&[tri], &path, true).unwrap();
        assert_eq!(summary, ObjSummary { vertex_count: 3, face_count: 1 });
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# spatial-engine"));
        assert!(text.ends_with("f 1 2 3\n"));
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_failed_export_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.obj");
        fs::write(&path, "old contents\n").unwrap();

        let result = export(&[Geometry::GeometryCollection(Vec::new())], &path, false);
        assert!(matches!(result, Err(GeometryError::EmptyInput)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "old contents\n");
        assert_eq!(entries(dir.path()), ["model.obj"]);
    }

    #[test]
    fn test_failed_rename_leaves_no_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("model.obj");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), "old contents").unwrap();
        let tri = Geometry::Polygon(Polygon::triangle(
            Point3::ORIGIN,
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ));

        let result = export(&[tri], &target, false);
        assert!(matches!(result, Err(GeometryError::Io(_))));
        assert!(target.is_dir());
        assert_eq!(fs::read_to_string(target.join("keep.txt")).unwrap(), "old contents");
        assert_eq!(entries(dir.path()), ["model.obj"]);
    }
}
