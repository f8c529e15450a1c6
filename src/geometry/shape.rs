// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! General geometry value used for interchange and set operations

use super::Point3;

/// Polygon with an exterior ring and optional holes
///
/// Rings are stored closed: the last coordinate repeats the first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    exterior: Vec<Point3>,
    interiors: Vec<Vec<Point3>>,
}

impl Polygon {
    /// Build a polygon, closing any ring whose last point differs from its first
    pub fn new(exterior: Vec<Point3>, interiors: Vec<Vec<Point3>>) -> Self {
        Self {
            exterior: close_ring(exterior),
            interiors: interiors.into_iter().map(close_ring).collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Triangle face with a closed ring
    pub fn triangle(a: Point3, b: Point3, c: Point3) -> Self {
        Self::new(vec![a, b, c], Vec::new())
    }

    pub fn exterior(&self) -> &[Point3] {
        &self.exterior
    }

    pub fn interiors(&self) -> &[Vec<Point3>] {
        &self.interiors
    }

    pub fn is_empty(&self) -> bool {
        self.exterior.is_empty()
    }

    /// All rings, exterior first
    pub fn rings(&self) -> impl Iterator<Item = &[Point3]> {
        std::iter::once(self.exterior.as_slice()).chain(self.interiors.iter().map(Vec::as_slice))
    }
}

fn close_ring(mut ring: Vec<Point3>) -> Vec<Point3> {
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    ring
}

/// OGC-style geometry with 3D coordinates
///
/// 2D input is carried with `z = 0`.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point3),
    LineString(Vec<Point3>),
    Polygon(Polygon),
    MultiPoint(Vec<Point3>),
    MultiLineString(Vec<Vec<Point3>>),
    MultiPolygon(Vec<Polygon>),
    /// Polygonal faces forming a surface; a closed surface bounds a solid
    PolyhedralSurface(Vec<Polygon>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    /// OGC geometry type name
    pub fn geometry_type(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::PolyhedralSurface(_) => "PolyhedralSurface",
            Geometry::GeometryCollection(_) => "GeometryCollection",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(_) => false,
            Geometry::LineString(points) | Geometry::MultiPoint(points) => points.is_empty(),
            Geometry::Polygon(polygon) => polygon.is_empty(),
            Geometry::MultiLineString(lines) => lines.iter().all(Vec::is_empty),
            Geometry::MultiPolygon(polygons) | Geometry::PolyhedralSurface(polygons) => {
                polygons.iter().all(Polygon::is_empty)
            }
            Geometry::GeometryCollection(members) => members.iter().all(Geometry::is_empty),
        }
    }

    /// Every coordinate in storage order, closing ring points included
    pub fn coordinates(&self) -> Vec<Point3> {
        let mut out = Vec::new();
        self.collect_coordinates(&mut out);
        out
    }

    fn collect_coordinates(&self, out: &mut Vec<Point3>) {
        match self {
            Geometry::Point(p) => out.push(*p),
            Geometry::LineString(points) | Geometry::MultiPoint(points) => {
                out.extend_from_slice(points)
            }
            Geometry::Polygon(polygon) => {
                for ring in polygon.rings() {
                    out.extend_from_slice(ring);
                }
            }
            Geometry::MultiLineString(lines) => {
                for line in lines {
                    out.extend_from_slice(line);
                }
            }
            Geometry::MultiPolygon(polygons) | Geometry::PolyhedralSurface(polygons) => {
                for ring in polygons.iter().flat_map(Polygon::rings) {
                    out.extend_from_slice(ring);
                }
            }
            Geometry::GeometryCollection(members) => {
                for member in members {
                    member.collect_coordinates(out);
                }
            }
        }
    }

    /// Number of coordinates, matching `coordinates().len()`
    pub fn coordinate_count(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::LineString(points) | Geometry::MultiPoint(points) => points.len(),
            Geometry::Polygon(polygon) => polygon.rings().map(<[Point3]>::len).sum(),
            Geometry::MultiLineString(lines) => lines.iter().map(Vec::len).sum(),
            Geometry::MultiPolygon(polygons) | Geometry::PolyhedralSurface(polygons) => polygons
                .iter()
                .flat_map(Polygon::rings)
                .map(<[Point3]>::len)
                .sum(),
            Geometry::GeometryCollection(members) => {
                members.iter().map(Geometry::coordinate_count).sum()
            }
        }
    }
}

impl From<Point3> for Geometry {
    fn from(p: Point3) -> Self {
        Geometry::Point(p)
    }
}

impl From<Polygon> for Geometry {
    fn from(polygon: Polygon) -> Self {
        Geometry::Polygon(polygon)
    }
}
