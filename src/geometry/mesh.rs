// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Indexed mesh value and its point predicates

use super::boundary::Boundary;
use super::predicates::{Location, DEFAULT_TOLERANCE};
use super::{AxisAlignedBoundingBox, Geometry, OrientedBoundingBox, Point3};
use crate::error::{GeometryError, Result};
use crate::io::text;
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

/// Ordered vertex list plus a face-index loop over it
///
/// Every face index addresses a vertex and both lists are non-empty. The
/// boundary is rebuilt from the indices on each query; the stored data is
/// never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MeshRecord", into = "MeshRecord")]
pub struct Mesh {
    vertices: Vec<Point3>,
    face_indices: Vec<usize>,
}

/// Stored JSON shape
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeshRecord {
    vertices: Vec<Point3>,
    face_indexes: Vec<i64>,
}

impl TryFrom<MeshRecord> for Mesh {
    type Error = GeometryError;

    fn try_from(record: MeshRecord) -> Result<Self> {
        let len = record.vertices.len();
        let face_indices = record
            .face_indexes
            .into_iter()
            .map(|index| {
                usize::try_from(index).map_err(|_| GeometryError::IndexOutOfRange { index, len })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(record.vertices, face_indices)
    }
}

impl From<Mesh> for MeshRecord {
    fn from(mesh: Mesh) -> Self {
        MeshRecord {
            vertices: mesh.vertices,
            face_indexes: mesh.face_indices.into_iter().map(|i| i as i64).collect(),
        }
    }
}

impl Mesh {
    /// Validating constructor
    pub fn new(vertices: Vec<Point3>, face_indices: Vec<usize>) -> Result<Self> {
        if vertices.is_empty() {
            return Err(GeometryError::DegenerateMesh("mesh has no vertices".into()));
        }
        if face_indices.is_empty() {
            return Err(GeometryError::DegenerateMesh("mesh has no face indices".into()));
        }
        if let Some(&index) = face_indices.iter().find(|&&i| i >= vertices.len()) {
            return Err(GeometryError::IndexOutOfRange {
                index: index as i64,
                len: vertices.len(),
            });
        }
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::invalid("mesh vertices must be finite"));
        }
        Ok(Self {
            vertices,
            face_indices,
        })
    }

    /// Skip validation for meshes assembled from already valid parts
    pub(crate) fn from_trusted(vertices: Vec<Point3>, face_indices: Vec<usize>) -> Self {
        debug_assert!(!vertices.is_empty() && !face_indices.is_empty());
        debug_assert!(face_indices.iter().all(|&i| i < vertices.len()));
        Self {
            vertices,
            face_indices,
        }
    }

    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    pub fn face_indices(&self) -> &[usize] {
        &self.face_indices
    }

    /// Boundary traced by the face indices
    pub fn boundary(&self) -> Boundary {
        Boundary::classify(
            self.face_indices
                .iter()
                .map(|&i| self.vertices[i])
                .collect(),
        )
    }

    /// Where `point` lies relative to the boundary, with an explicit tolerance
    pub fn locate(&self, point: &Point3, tol: f64) -> Location {
        self.boundary().locate(point, tol)
    }

    /// On the boundary, not in the interior
    pub fn touches(&self, point: &Point3) -> bool {
        self.touches_with(point, DEFAULT_TOLERANCE)
    }

    pub fn touches_with(&self, point: &Point3, tol: f64) -> bool {
        self.locate(point, tol) == Location::Boundary
    }

    /// On the boundary or in the interior
    pub fn intersects(&self, point: &Point3) -> bool {
        self.intersects_with(point, DEFAULT_TOLERANCE)
    }

    pub fn intersects_with(&self, point: &Point3, tol: f64) -> bool {
        self.locate(point, tol) != Location::Exterior
    }

    /// Box over all vertices; face indices play no part
    pub fn axis_aligned_bounds(&self) -> AxisAlignedBoundingBox {
        AxisAlignedBoundingBox::scan(self.vertices[0], &self.vertices[1..])
    }

    /// Principal-axis box over all vertices
    pub fn oriented_bounds(&self) -> OrientedBoundingBox {
        OrientedBoundingBox::fit(&self.vertices)
    }

    /// Copy with every vertex mapped through a homogeneous transform
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Result<Self> {
        let vertices: Vec<Point3> = self
            .vertices
            .iter()
            .map(|v| Point3::from(matrix.transform_point(&v.to_na())))
            .collect();
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::invalid(
                "transform maps a vertex to a non-finite position",
            ));
        }
        Ok(Self::from_trusted(vertices, self.face_indices.clone()))
    }

    pub fn surface_area(&self) -> f64 {
        self.boundary().area()
    }

    /// Whether the faces form a closed shell around a solid
    pub fn is_closed(&self) -> bool {
        self.boundary().is_closed()
    }

    pub fn to_geometry(&self) -> Geometry {
        self.boundary().to_geometry()
    }

    pub fn to_wkt(&self) -> String {
        text::write_wkt(&self.to_geometry())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tetrahedron() -> Mesh {
        let s = 1.0 / 2f64.sqrt();
        Mesh::new(
            vec![
                Point3::new(1.0, 0.0, -s),
                Point3::new(-1.0, 0.0, -s),
                Point3::new(0.0, 1.0, s),
                Point3::new(0.0, -1.0, s),
            ],
            vec![0, 1, 2, 0, 3, 1, 0, 2, 3, 1, 3, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_tetrahedron_centroid_is_interior() {
        let mesh = tetrahedron();
        assert!(mesh.is_closed());
        let centroid = Point3::centroid(mesh.vertices()).unwrap();
        assert!(mesh.intersects(&centroid));
        assert!(!mesh.touches(&centroid));
    }

    #[test]
    fn test_face_centroid_touches() {
        let mesh = tetrahedron();
        for face in mesh.face_indices().chunks(3) {
            let corners: Vec<Point3> = face.iter().map(|&i| mesh.vertices()[i]).collect();
            let centroid = Point3::centroid(&corners).unwrap();
            assert!(mesh.touches(&centroid), "face {face:?}");
            assert!(mesh.intersects(&centroid));
        }
        assert!(!mesh.intersects(&Point3::new(3.0, 3.0, 3.0)));
    }

    #[test]
    fn test_near_vertex_within_tolerance() {
        let mesh = tetrahedron();
        let near = Point3::new(1.0 + 1e-6, 0.0, mesh.vertices()[0].z);
        assert!(!mesh.touches(&near));
        assert!(!mesh.intersects(&near));
        assert!(mesh.touches_with(&near, 1e-3));
        assert!(mesh.intersects_with(&near, 1e-3));
    }

    #[test]
    fn test_duplicate_vertices_behave_like_shared_ones() {
        let base = tetrahedron();
        // every face corner gets its own copy of the coordinate
        let vertices: Vec<Point3> = base
            .face_indices()
            .iter()
            .map(|&i| base.vertices()[i])
            .collect();
        let split = Mesh::new(vertices, (0..12).collect()).unwrap();
        assert!(split.is_closed());

        let probes = [
            Point3::ORIGIN,
            Point3::new(0.0, 0.0, -1.0 / 2f64.sqrt()),
            Point3::new(1.0, 0.0, -1.0 / 2f64.sqrt()),
            Point3::new(2.0, 2.0, 2.0),
        ];
        for probe in probes {
            assert_eq!(split.touches(&probe), base.touches(&probe), "probe {probe}");
            assert_eq!(split.intersects(&probe), base.intersects(&probe), "probe {probe}");
        }
    }

    #[test]
    fn test_open_ring_is_closed_by_boundary() {
        let mesh = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(4.0, 0.0, 0.0),
                Point3::new(4.0, 4.0, 0.0),
                Point3::new(0.0, 4.0, 0.0),
            ],
            vec![0, 1, 2, 3],
        )
        .unwrap();
        // closing edge from vertex 3 back to vertex 0
        assert!(mesh.touches(&Point3::new(0.0, 2.0, 0.0)));
        assert!(mesh.intersects(&Point3::new(2.0, 2.0, 0.0)));
        assert!(!mesh.touches(&Point3::new(2.0, 2.0, 0.0)));
        assert_relative_eq!(mesh.surface_area(), 16.0, epsilon = 1e-12);
        assert!(mesh.to_wkt().starts_with("POLYGON Z"));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            Mesh::new(Vec::new(), vec![0]),
            Err(GeometryError::DegenerateMesh(_))
        ));
        assert!(matches!(
            Mesh::new(vec![Point3::ORIGIN], Vec::new()),
            Err(GeometryError::DegenerateMesh(_))
        ));
        assert!(matches!(
            Mesh::new(vec![Point3::ORIGIN], vec![0, 1]),
            Err(GeometryError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(matches!(
            Mesh::new(vec![Point3::new(f64::NAN, 0.0, 0.0)], vec![0]),
            Err(GeometryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_json_record() {
        let json = r#"{
            "vertices": [{"x":0,"y":0,"z":0},{"x":1,"y":0,"z":0},{"x":0,"y":1,"z":0}],
            "faceIndexes": [0, 1, 2]
        }"#;
        let mesh: Mesh = serde_json::from_str(json).unwrap();
        assert_eq!(mesh.face_indices(), &[0, 1, 2]);

        let value = serde_json::to_value(&mesh).unwrap();
        assert_eq!(value["faceIndexes"], serde_json::json!([0, 1, 2]));

        let negative = r#"{"vertices":[{"x":0,"y":0,"z":0}],"faceIndexes":[-1]}"#;
        let err = serde_json::from_str::<Mesh>(negative).unwrap_err();
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_bounds_ignore_face_indices() {
        let mesh = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(9.0, 9.0, 9.0),
            ],
            vec![0, 1, 2],
        )
        .unwrap();
        let aabb = mesh.axis_aligned_bounds();
        assert_eq!(aabb.max(), Point3::new(9.0, 9.0, 9.0));
        let obb = mesh.oriented_bounds();
        assert!(obb.contains(&Point3::new(9.0, 9.0, 9.0)));
    }

    #[test]
    fn test_transformed_translation() {
        let mesh = tetrahedron();
        let matrix = Matrix4::new_translation(&nalgebra::Vector3::new(10.0, 0.0, 0.0));
        let moved = mesh.transformed(&matrix).unwrap();
        assert_eq!(moved.face_indices(), mesh.face_indices());
        assert!(moved.intersects(&Point3::new(10.0, 0.0, 0.0)));
        assert!(!moved.intersects(&Point3::ORIGIN));
    }
}
