// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! 3D predicates and measures over general geometry
//!
//! A geometry is decomposed into points, polylines, planar faces and
//! polyhedral surfaces. Pairwise tests run over those primitives; a closed
//! surface additionally contributes the solid it bounds.

use super::boundary::{closed_shell, edge_usage};
use super::predicates::{self, Location, PlanarPolygon};
use super::{Geometry, Point3, Polygon};
use nalgebra as na;

type P = na::Point3<f64>;

/// Primitive pieces of a geometry
#[derive(Debug, Default)]
struct Parts {
    points: Vec<P>,
    lines: Vec<Vec<P>>,
    faces: Vec<PlanarPolygon>,
    surfaces: Vec<SurfacePart>,
}

#[derive(Debug)]
struct SurfacePart {
    faces: Vec<PlanarPolygon>,
    border: Vec<(P, P)>,
    solid: Option<Vec<[P; 3]>>,
}

enum Primitive<'a> {
    Point(P),
    Segment(P, P),
    Face(&'a PlanarPolygon),
}

impl Parts {
    fn of(geometry: &Geometry, tol: f64) -> Self {
        let mut parts = Parts::default();
        parts.collect(geometry, tol);
        parts
    }

    fn collect(&mut self, geometry: &Geometry, tol: f64) {
        match geometry {
            Geometry::Point(p) => self.points.push(p.to_na()),
            Geometry::MultiPoint(points) => self.points.extend(points.iter().map(|p| p.to_na())),
            Geometry::LineString(line) => self.add_line(line),
            Geometry::MultiLineString(lines) => {
                for line in lines {
                    self.add_line(line);
                }
            }
            Geometry::Polygon(polygon) => self.add_polygon(polygon, tol),
            Geometry::MultiPolygon(polygons) => {
                for polygon in polygons {
                    self.add_polygon(polygon, tol);
                }
            }
            Geometry::PolyhedralSurface(faces) => self.add_surface(faces, tol),
            Geometry::GeometryCollection(members) => {
                for member in members {
                    self.collect(member, tol);
                }
            }
        }
    }

    fn add_line(&mut self, line: &[Point3]) {
        match line {
            [] => {}
            [single] => self.points.push(single.to_na()),
            _ => self.lines.push(line.iter().map(|p| p.to_na()).collect()),
        }
    }

    fn add_polygon(&mut self, polygon: &Polygon, tol: f64) {
        if polygon.is_empty() {
            return;
        }
        match planar_faces(polygon, tol) {
            Some(faces) => self.faces.extend(faces),
            // a polygon without area degenerates to its outline
            None => {
                for ring in polygon.rings() {
                    self.add_line(ring);
                }
            }
        }
    }

    fn add_surface(&mut self, polygons: &[Polygon], tol: f64) {
        let polygons: Vec<&Polygon> = polygons.iter().filter(|p| !p.is_empty()).collect();
        if polygons.is_empty() {
            return;
        }
        let rings: Vec<Vec<Point3>> = polygons
            .iter()
            .map(|p| {
                let ring = p.exterior();
                ring[..ring.len().saturating_sub(1).max(1)].to_vec()
            })
            .collect();
        let faces: Vec<PlanarPolygon> = polygons
            .iter()
            .filter_map(|p| planar_faces(p, tol))
            .flatten()
            .collect();
        let fans: Vec<[P; 3]> = faces.iter().flat_map(PlanarPolygon::signed_fans).collect();

        let usage = edge_usage(rings.iter().map(Vec::as_slice));
        let solid = closed_shell(&usage, &fans);
        let border = usage
            .into_iter()
            .filter(|(_, (count, _))| *count == 1)
            .map(|(_, (_, (a, b)))| (a.to_na(), b.to_na()))
            .collect();

        self.surfaces.push(SurfacePart {
            faces,
            border,
            solid,
        });
    }

    fn primitives(&self) -> impl Iterator<Item = Primitive<'_>> {
        let points = self.points.iter().map(|p| Primitive::Point(*p));
        let segments = self
            .lines
            .iter()
            .flat_map(|line| line.windows(2))
            .map(|w| Primitive::Segment(w[0], w[1]));
        let faces = self
            .faces
            .iter()
            .chain(self.surfaces.iter().flat_map(|s| s.faces.iter()))
            .map(Primitive::Face);
        points.chain(segments).chain(faces)
    }

    fn solids(&self) -> impl Iterator<Item = &[[P; 3]]> {
        self.surfaces.iter().filter_map(|s| s.solid.as_deref())
    }

    fn vertices(&self) -> impl Iterator<Item = &P> {
        self.points
            .iter()
            .chain(self.lines.iter().flatten())
            .chain(
                self.faces
                    .iter()
                    .chain(self.surfaces.iter().flat_map(|s| s.faces.iter()))
                    .flat_map(|f| f.rings().iter().flatten()),
            )
    }

    fn is_empty(&self) -> bool {
        self.points.is_empty()
            && self.lines.is_empty()
            && self.faces.is_empty()
            && self.surfaces.iter().all(|s| s.faces.is_empty())
    }
}

/// Planar faces covering a polygon; a non-planar polygon is fanned into
/// triangles. `None` when the polygon encloses no area.
fn planar_faces(polygon: &Polygon, tol: f64) -> Option<Vec<PlanarPolygon>> {
    let exterior: Vec<P> = polygon.exterior().iter().map(|p| p.to_na()).collect();
    let holes: Vec<Vec<P>> = polygon
        .interiors()
        .iter()
        .map(|ring| ring.iter().map(|p| p.to_na()).collect())
        .collect();
    let face = PlanarPolygon::new(&exterior, &holes)?;
    if face.is_planar(tol) {
        return Some(vec![face]);
    }
    let outer = PlanarPolygon::new(&exterior, &[])?;
    Some(
        outer
            .signed_fans()
            .iter()
            .filter_map(|t| PlanarPolygon::new(t, &[]))
            .collect(),
    )
}

fn primitives_meet(a: &Primitive<'_>, b: &Primitive<'_>, tol: f64) -> bool {
    primitive_distance(a, b, tol) <= tol
}

fn primitive_distance(a: &Primitive<'_>, b: &Primitive<'_>, tol: f64) -> f64 {
    use Primitive::*;
    match (a, b) {
        (Point(p), Point(q)) => na::distance(p, q),
        (Point(p), Segment(s, t)) | (Segment(s, t), Point(p)) => {
            predicates::point_segment_distance(p, s, t)
        }
        (Point(p), Face(f)) | (Face(f), Point(p)) => {
            if f.locate(p, tol) != Location::Exterior {
                0.0
            } else {
                f.distance(p)
            }
        }
        (Segment(a0, a1), Segment(b0, b1)) => predicates::segment_segment_distance(a0, a1, b0, b1),
        (Segment(s, t), Face(f)) | (Face(f), Segment(s, t)) => {
            predicates::segment_polygon_distance(s, t, f, tol)
        }
        (Face(f), Face(g)) => {
            let a_to_b = f
                .edges()
                .map(|(s, t)| predicates::segment_polygon_distance(&s, &t, g, tol));
            let b_to_a = g
                .edges()
                .map(|(s, t)| predicates::segment_polygon_distance(&s, &t, f, tol));
            a_to_b.chain(b_to_a).fold(f64::INFINITY, f64::min)
        }
    }
}

fn inside_any_solid(parts: &Parts, p: &P) -> bool {
    parts
        .solids()
        .any(|solid| predicates::winding_number(p, solid.iter()).abs() > 0.5)
}

fn parts_intersect(a: &Parts, b: &Parts, tol: f64) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let b_primitives: Vec<Primitive<'_>> = b.primitives().collect();
    let touching = a
        .primitives()
        .any(|pa| b_primitives.iter().any(|pb| primitives_meet(&pa, pb, tol)));
    touching
        || a.vertices().any(|v| inside_any_solid(b, v))
        || b.vertices().any(|v| inside_any_solid(a, v))
}

/// Whether the two geometries share at least one point
pub fn intersects(a: &Geometry, b: &Geometry, tol: f64) -> bool {
    parts_intersect(&Parts::of(a, tol), &Parts::of(b, tol), tol)
}

/// Minimum 3D distance, zero when the geometries intersect. `None` when
/// either geometry is empty.
pub fn distance(a: &Geometry, b: &Geometry, tol: f64) -> Option<f64> {
    let pa = Parts::of(a, tol);
    let pb = Parts::of(b, tol);
    if pa.is_empty() || pb.is_empty() {
        return None;
    }
    if parts_intersect(&pa, &pb, tol) {
        return Some(0.0);
    }
    let b_primitives: Vec<Primitive<'_>> = pb.primitives().collect();
    let d = pa
        .primitives()
        .flat_map(|x| {
            b_primitives
                .iter()
                .map(move |y| primitive_distance(&x, y, tol))
                .collect::<Vec<_>>()
        })
        .fold(f64::INFINITY, f64::min);
    Some(d)
}

/// Where `point` lies relative to a geometry
///
/// Parts are combined by precedence: interior of any part wins over the
/// boundary of another.
pub fn locate(geometry: &Geometry, point: &Point3, tol: f64) -> Location {
    let parts = Parts::of(geometry, tol);
    let p = point.to_na();
    let mut on_boundary = false;

    if parts.points.iter().any(|q| na::distance(q, &p) <= tol) {
        return Location::Interior;
    }

    for line in &parts.lines {
        let closed = line.len() > 2 && line.first() == line.last();
        if !closed {
            let ends = [line[0], line[line.len() - 1]];
            if ends.iter().any(|e| na::distance(e, &p) <= tol) {
                on_boundary = true;
                continue;
            }
        }
        if line
            .windows(2)
            .any(|w| predicates::point_segment_distance(&p, &w[0], &w[1]) <= tol)
        {
            return Location::Interior;
        }
    }

    for face in &parts.faces {
        match face.locate(&p, tol) {
            Location::Interior => return Location::Interior,
            Location::Boundary => on_boundary = true,
            Location::Exterior => {}
        }
    }

    for surface in &parts.surfaces {
        let on_face = surface
            .faces
            .iter()
            .any(|f| f.locate(&p, tol) != Location::Exterior);
        match &surface.solid {
            Some(solid) => {
                if on_face {
                    on_boundary = true;
                } else if predicates::winding_number(&p, solid.iter()).abs() > 0.5 {
                    return Location::Interior;
                }
            }
            None => {
                let on_border = surface
                    .border
                    .iter()
                    .any(|(a, b)| predicates::point_segment_distance(&p, a, b) <= tol);
                if on_border {
                    on_boundary = true;
                } else if on_face {
                    return Location::Interior;
                }
            }
        }
    }

    if on_boundary {
        Location::Boundary
    } else {
        Location::Exterior
    }
}

/// Whether `point` lies on the boundary of a geometry
pub fn touches_point(geometry: &Geometry, point: &Point3, tol: f64) -> bool {
    locate(geometry, point, tol) == Location::Boundary
}

/// Total 3D area of polygonal parts; points and lines contribute nothing
pub fn area(geometry: &Geometry) -> f64 {
    match geometry {
        Geometry::Polygon(polygon) => polygon_area(polygon),
        Geometry::MultiPolygon(polygons) | Geometry::PolyhedralSurface(polygons) => {
            polygons.iter().map(polygon_area).sum()
        }
        Geometry::GeometryCollection(members) => members.iter().map(area).sum(),
        _ => 0.0,
    }
}

fn polygon_area(polygon: &Polygon) -> f64 {
    if polygon.is_empty() {
        return 0.0;
    }
    planar_faces(polygon, predicates::DEFAULT_TOLERANCE)
        .map(|faces| faces.iter().map(PlanarPolygon::area).sum())
        .unwrap_or(0.0)
}

/// Total 3D length of linear parts; polygons contribute their ring perimeters
pub fn length(geometry: &Geometry) -> f64 {
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => 0.0,
        Geometry::LineString(line) => polyline_length(line),
        Geometry::MultiLineString(lines) => lines.iter().map(|l| polyline_length(l)).sum(),
        Geometry::Polygon(polygon) => polygon.rings().map(polyline_length).sum(),
        Geometry::MultiPolygon(polygons) | Geometry::PolyhedralSurface(polygons) => polygons
            .iter()
            .flat_map(Polygon::rings)
            .map(polyline_length)
            .sum(),
        Geometry::GeometryCollection(members) => members.iter().map(length).sum(),
    }
}

fn polyline_length(line: &[Point3]) -> f64 {
    line.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::AxisAlignedBoundingBox;
    use approx::assert_relative_eq;

    const TOL: f64 = predicates::DEFAULT_TOLERANCE;

    fn unit_square(z: f64) -> Geometry {
        Geometry::Polygon(Polygon::new(
            vec![
                Point3::new(0.0, 0.0, z),
                Point3::new(1.0, 0.0, z),
                Point3::new(1.0, 1.0, z),
                Point3::new(0.0, 1.0, z),
            ],
            Vec::new(),
        ))
    }

    fn cube(min: f64, max: f64) -> Geometry {
        AxisAlignedBoundingBox::new(Point3::new(min, min, min), Point3::new(max, max, max))
            .unwrap()
            .to_geometry()
    }

    #[test]
    fn test_point_polygon_intersection() {
        let square = unit_square(0.0);
        assert!(intersects(&square, &Geometry::Point(Point3::new(0.5, 0.5, 0.0)), TOL));
        assert!(!intersects(&square, &Geometry::Point(Point3::new(0.5, 0.5, 0.1)), TOL));
        assert_relative_eq!(
            distance(&square, &Geometry::Point(Point3::new(0.5, 0.5, 2.0)), TOL).unwrap(),
            2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_line_pierces_square() {
        let square = unit_square(0.0);
        let line = Geometry::LineString(vec![
            Point3::new(0.5, 0.5, -1.0),
            Point3::new(0.5, 0.5, 1.0),
        ]);
        assert!(intersects(&square, &line, TOL));
        assert_eq!(distance(&square, &line, TOL), Some(0.0));
    }

    #[test]
    fn test_parallel_faces_distance() {
        let d = distance(&unit_square(0.0), &unit_square(3.0), TOL).unwrap();
        assert_relative_eq!(d, 3.0, epsilon = 1e-12);
        assert!(!intersects(&unit_square(0.0), &unit_square(3.0), TOL));
    }

    #[test]
    fn test_point_inside_closed_surface() {
        let solid = cube(0.0, 2.0);
        let inside = Geometry::Point(Point3::new(1.0, 1.0, 1.0));
        assert!(intersects(&solid, &inside, TOL));
        assert_eq!(locate(&solid, &Point3::new(1.0, 1.0, 1.0), TOL), Location::Interior);
        assert!(touches_point(&solid, &Point3::new(2.0, 1.0, 1.0), TOL));
        assert_eq!(locate(&solid, &Point3::new(3.0, 1.0, 1.0), TOL), Location::Exterior);
    }

    #[test]
    fn test_two_sided_sheet_is_not_a_solid() {
        let Geometry::Polygon(front) = unit_square(0.0) else {
            unreachable!()
        };
        let mut reversed = front.exterior().to_vec();
        reversed.reverse();
        let sheet = Geometry::PolyhedralSurface(vec![front, Polygon::new(reversed, Vec::new())]);
        assert_eq!(locate(&sheet, &Point3::new(0.5, 0.5, 0.0), TOL), Location::Interior);
        assert_eq!(locate(&sheet, &Point3::new(0.5, 0.5, 0.5), TOL), Location::Exterior);
    }

    #[test]
    fn test_nested_solids_intersect() {
        assert!(intersects(&cube(0.0, 10.0), &cube(4.0, 5.0), TOL));
        assert!(intersects(&cube(4.0, 5.0), &cube(0.0, 10.0), TOL));
        assert!(!intersects(&cube(0.0, 1.0), &cube(2.0, 3.0), TOL));
    }

    #[test]
    fn test_linestring_endpoints_are_boundary() {
        let line = Geometry::LineString(vec![Point3::ORIGIN, Point3::new(2.0, 0.0, 0.0)]);
        assert!(touches_point(&line, &Point3::ORIGIN, TOL));
        assert_eq!(locate(&line, &Point3::new(1.0, 0.0, 0.0), TOL), Location::Interior);
    }

    #[test]
    fn test_measures() {
        let square = unit_square(5.0);
        assert_relative_eq!(area(&square), 1.0, epsilon = 1e-12);
        assert_relative_eq!(length(&square), 4.0, epsilon = 1e-12);
        assert_relative_eq!(area(&cube(0.0, 2.0)), 24.0, epsilon = 1e-9);

        let line = Geometry::LineString(vec![
            Point3::ORIGIN,
            Point3::new(3.0, 4.0, 0.0),
            Point3::new(3.0, 4.0, 12.0),
        ]);
        assert_relative_eq!(length(&line), 17.0, epsilon = 1e-12);
        assert_eq!(area(&line), 0.0);
    }

    #[test]
    fn test_empty_geometry() {
        let empty = Geometry::GeometryCollection(Vec::new());
        assert_eq!(distance(&empty, &unit_square(0.0), TOL), None);
        assert!(!intersects(&empty, &unit_square(0.0), TOL));
    }
}
