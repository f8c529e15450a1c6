// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Boundary reconstruction from indexed vertex data
//!
//! Every mesh predicate and export goes through [`Boundary::build`], so
//! touches, intersects and bounding-volume derivations all see the same
//! boundary.
//!
//! An index sequence is read one of two ways:
//! - as a single polygon ring when no coordinate repeats along it, apart from
//!   an optional closing repeat of the first coordinate;
//! - otherwise, when its length is a multiple of three, as a list of
//!   triangles. Coordinates, not indices, identify shared corners, so
//!   duplicated vertices behave like a single vertex.
//!
//! Any other sequence is read as a self-touching ring.

use super::predicates::{self, Location, PlanarPolygon};
use super::{Geometry, Point3, Polygon};
use crate::error::{GeometryError, Result};
use ahash::{AHashMap, AHashSet};
use nalgebra as na;
use tracing::debug;

type EdgeKey = ([u64; 3], [u64; 3]);

/// Boundary implied by an ordered index list over a vertex set
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    /// Closed ring; the last point repeats the first
    Ring(Vec<Point3>),
    /// Triangle surface
    Surface(Surface),
}

/// Triangle surface with its coordinate-keyed edge topology
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    triangles: Vec<[Point3; 3]>,
    border: Vec<(Point3, Point3)>,
    solid: Option<Vec<[na::Point3<f64>; 3]>>,
}

impl Boundary {
    /// Walk `indices` through `vertices` and classify the result
    pub fn build<I>(vertices: &[Point3], indices: I) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        if vertices.is_empty() {
            return Err(GeometryError::DegenerateMesh("mesh has no vertices".into()));
        }
        let walked = indices
            .into_iter()
            .map(|index| {
                vertices
                    .get(index)
                    .copied()
                    .ok_or(GeometryError::IndexOutOfRange {
                        index: index as i64,
                        len: vertices.len(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        if walked.is_empty() {
            return Err(GeometryError::DegenerateMesh("mesh has no face indices".into()));
        }
        Ok(Self::classify(walked))
    }

    /// Classify an already resolved coordinate loop
    pub(crate) fn classify(walked: Vec<Point3>) -> Self {
        if !traces_single_ring(&walked) && walked.len() % 3 == 0 {
            let triangles: Vec<[Point3; 3]> = walked
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .collect();
            let surface = Surface::new(triangles);
            debug!(
                triangles = surface.triangles.len(),
                closed = surface.is_closed(),
                "mesh boundary read as triangle surface"
            );
            return Boundary::Surface(surface);
        }

        let mut ring = walked;
        if ring.len() == 1 || ring.first() != ring.last() {
            ring.push(ring[0]);
        }
        debug!(points = ring.len(), "mesh boundary read as ring");
        Boundary::Ring(ring)
    }

    /// Where `point` lies relative to this boundary
    pub fn locate(&self, point: &Point3, tol: f64) -> Location {
        match self {
            Boundary::Ring(ring) => locate_in_ring(ring, point, tol),
            Boundary::Surface(surface) => surface.locate(point, tol),
        }
    }

    /// Whether the boundary encloses a solid
    pub fn is_closed(&self) -> bool {
        matches!(self, Boundary::Surface(surface) if surface.is_closed())
    }

    /// Area of the ring's planar region or the sum of triangle areas
    pub fn area(&self) -> f64 {
        match self {
            Boundary::Ring(ring) => {
                let points: Vec<_> = ring.iter().map(|p| p.to_na()).collect();
                PlanarPolygon::new(&points, &[])
                    .map(|polygon| polygon.area())
                    .unwrap_or(0.0)
            }
            Boundary::Surface(surface) => surface
                .triangles
                .iter()
                .map(|[a, b, c]| predicates::triangle_area(&a.to_na(), &b.to_na(), &c.to_na()))
                .sum(),
        }
    }

    /// Polygon for a ring, polyhedral surface of triangles otherwise
    pub fn to_geometry(&self) -> Geometry {
        match self {
            Boundary::Ring(ring) => Geometry::Polygon(Polygon::new(ring.clone(), Vec::new())),
            Boundary::Surface(surface) => Geometry::PolyhedralSurface(
                surface
                    .triangles
                    .iter()
                    .map(|[a, b, c]| Polygon::triangle(*a, *b, *c))
                    .collect(),
            ),
        }
    }
}

impl Surface {
    fn new(triangles: Vec<[Point3; 3]>) -> Self {
        let usage = edge_usage(triangles.iter().map(|t| t.as_slice()));
        let faces: Vec<[na::Point3<f64>; 3]> = triangles
            .iter()
            .map(|[a, b, c]| [a.to_na(), b.to_na(), c.to_na()])
            .collect();
        let solid = closed_shell(&usage, &faces);
        let border = usage
            .into_iter()
            .filter(|(_, (count, _))| *count == 1)
            .map(|(_, (_, edge))| edge)
            .collect();
        Self {
            triangles,
            border,
            solid,
        }
    }

    pub fn triangles(&self) -> &[[Point3; 3]] {
        &self.triangles
    }

    pub fn is_closed(&self) -> bool {
        self.solid.is_some()
    }

    /// Edges used by exactly one triangle
    pub fn border(&self) -> &[(Point3, Point3)] {
        &self.border
    }

    fn locate(&self, point: &Point3, tol: f64) -> Location {
        let p = point.to_na();
        let on_surface = self.triangles.iter().any(|[a, b, c]| {
            predicates::point_triangle_distance(&p, &a.to_na(), &b.to_na(), &c.to_na()) <= tol
        });

        if let Some(shell) = &self.solid {
            if on_surface {
                return Location::Boundary;
            }
            return if predicates::winding_number(&p, shell.iter()).abs() > 0.5 {
                Location::Interior
            } else {
                Location::Exterior
            };
        }

        let on_border = self
            .border
            .iter()
            .any(|(a, b)| predicates::point_segment_distance(&p, &a.to_na(), &b.to_na()) <= tol);
        if on_border {
            Location::Boundary
        } else if on_surface {
            Location::Interior
        } else {
            Location::Exterior
        }
    }
}

/// Count how many faces use each undirected edge, keyed on exact
/// coordinates. Zero-length edges are ignored.
pub(crate) fn edge_usage<'a, I>(faces: I) -> AHashMap<EdgeKey, (usize, (Point3, Point3))>
where
    I: IntoIterator<Item = &'a [Point3]>,
{
    let mut usage: AHashMap<EdgeKey, (usize, (Point3, Point3))> = AHashMap::new();
    for face in faces {
        let n = face.len();
        for i in 0..n {
            let a = face[i];
            let b = face[(i + 1) % n];
            if a == b {
                continue;
            }
            let (ka, kb) = (a.bits(), b.bits());
            let key = if ka <= kb { (ka, kb) } else { (kb, ka) };
            usage.entry(key).or_insert((0, (a, b))).0 += 1;
        }
    }
    usage
}

/// The faces, consistently oriented, when every edge is shared by exactly
/// two of them and they enclose a nonzero volume
pub(crate) fn closed_shell(
    usage: &AHashMap<EdgeKey, (usize, (Point3, Point3))>,
    faces: &[[na::Point3<f64>; 3]],
) -> Option<Vec<[na::Point3<f64>; 3]>> {
    if usage.is_empty() || usage.values().any(|(count, _)| *count != 2) {
        return None;
    }
    let shell = predicates::orient_shell(faces);
    predicates::encloses_volume(&shell).then_some(shell)
}

fn traces_single_ring(walked: &[Point3]) -> bool {
    let body = match walked.split_last() {
        Some((last, body)) if walked.len() > 1 && *last == walked[0] => body,
        _ => walked,
    };
    let mut seen = AHashSet::with_capacity(body.len());
    body.iter().all(|p| seen.insert(p.bits()))
}

fn locate_in_ring(ring: &[Point3], point: &Point3, tol: f64) -> Location {
    let p = point.to_na();
    let on_edge = ring
        .windows(2)
        .any(|w| predicates::point_segment_distance(&p, &w[0].to_na(), &w[1].to_na()) <= tol);
    if on_edge {
        return Location::Boundary;
    }

    let points: Vec<_> = ring.iter().map(|v| v.to_na()).collect();
    match PlanarPolygon::new(&points, &[]) {
        Some(polygon) if polygon.is_planar(tol) => match polygon.locate(&p, tol) {
            Location::Interior => Location::Interior,
            _ => Location::Exterior,
        },
        _ => Location::Exterior,
    }
}
