// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Geometric predicates and distance primitives
//!
//! All functions work on `nalgebra` points in f64. Boundary tests take an
//! absolute tolerance: a point within `tol` of a segment or face counts as
//! lying on it.

use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use std::collections::VecDeque;
use std::f64::consts::PI;

/// Default absolute tolerance for on-boundary tests
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Threshold below which the fast determinant is recomputed carefully
const EPS: f64 = 1e-12;

/// Six times the signed volume of tetrahedron (a, b, c, d)
///
/// Positive when d lies on the side of plane (a, b, c) its normal points to.
pub fn oriented_volume(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let ad = d - a;
    let result = ab.dot(&ac.cross(&ad));

    if result.abs() < EPS {
        careful_triple_product(&ab, &ac, &ad)
    } else {
        result
    }
}

/// Triple product with FMA cross terms and compensated summation
fn careful_triple_product(ab: &Vector3<f64>, ac: &Vector3<f64>, ad: &Vector3<f64>) -> f64 {
    let cx = diff_of_products(ac.y, ad.z, ac.z, ad.y);
    let cy = diff_of_products(ac.z, ad.x, ac.x, ad.z);
    let cz = diff_of_products(ac.x, ad.y, ac.y, ad.x);

    let mut terms = [ab.x * cx, ab.y * cy, ab.z * cz];
    terms.sort_by(|a, b| b.abs().total_cmp(&a.abs()));

    // Kahan summation
    let mut sum = 0.0;
    let mut c = 0.0;
    for term in terms {
        let y = term - c;
        let t = sum + y;
        c = (t - sum) - y;
        sum = t;
    }
    sum
}

/// `a * b - c * d` with a single rounding on the correction term
fn diff_of_products(a: f64, b: f64, c: f64, d: f64) -> f64 {
    let cd = c * d;
    let err = c.mul_add(-d, cd);
    a.mul_add(b, -cd) + err
}

/// Area of triangle (a, b, c)
pub fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    (b - a).cross(&(c - a)).norm() / 2.0
}

/// Newell normal of a ring; its length is twice the enclosed area.
///
/// The ring may or may not repeat its first point at the end.
pub fn newell_normal(ring: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    let n = ring.len();
    for i in 0..n {
        let cur = &ring[i];
        let next = &ring[(i + 1) % n];
        normal.x += (cur.y - next.y) * (cur.z + next.z);
        normal.y += (cur.z - next.z) * (cur.x + next.x);
        normal.z += (cur.x - next.x) * (cur.y + next.y);
    }
    normal
}

/// Closest point to `p` on segment [a, b]
pub fn closest_point_on_segment(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return *a;
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

pub fn point_segment_distance(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (p - closest_point_on_segment(p, a, b)).norm()
}

/// Distance from `p` to triangle (a, b, c); degenerate triangles fall back
/// to their edges
pub fn point_triangle_distance(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> f64 {
    let edges = point_segment_distance(p, a, b)
        .min(point_segment_distance(p, b, c))
        .min(point_segment_distance(p, c, a));

    let raw = (b - a).cross(&(c - a));
    let len = raw.norm();
    if len <= EPS {
        return edges;
    }
    let n = raw / len;
    let h = (p - a).dot(&n);
    let foot = p - n * h;

    let inside = (b - a).cross(&(foot - a)).dot(&n) >= 0.0
        && (c - b).cross(&(foot - b)).dot(&n) >= 0.0
        && (a - c).cross(&(foot - c)).dot(&n) >= 0.0;

    if inside {
        h.abs()
    } else {
        edges
    }
}

/// Minimum distance between segments [p1, q1] and [p2, q2]
pub fn segment_segment_distance(
    p1: &Point3<f64>,
    q1: &Point3<f64>,
    p2: &Point3<f64>,
    q2: &Point3<f64>,
) -> f64 {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    if a == 0.0 && e == 0.0 {
        return (p1 - p2).norm();
    }

    let (s, t) = if a == 0.0 {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e == 0.0 {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let mut s = if denom > 0.0 {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    let c1 = p1 + d1 * s;
    let c2 = p2 + d2 * t;
    (c1 - c2).norm()
}

/// Location of a point relative to a planar region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Interior,
    Boundary,
    Exterior,
}

/// A planar polygon with optional holes, prepared for point queries
///
/// Rings are stored open (no repeated closing point).
#[derive(Debug, Clone)]
pub struct PlanarPolygon {
    rings: Vec<Vec<Point3<f64>>>,
    normal: Vector3<f64>,
    offset: f64,
    drop_axis: usize,
}

impl PlanarPolygon {
    /// Build from an exterior ring and holes. Returns `None` when the exterior
    /// ring encloses no area (collinear or repeated points).
    pub fn new(exterior: &[Point3<f64>], holes: &[Vec<Point3<f64>>]) -> Option<Self> {
        let exterior = open_ring(exterior);
        if exterior.len() < 3 {
            return None;
        }
        let raw = newell_normal(&exterior);
        let norm = raw.norm();
        if norm <= EPS {
            return None;
        }
        let normal = raw / norm;
        let mean = exterior
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / exterior.len() as f64;
        let offset = normal.dot(&mean);
        let drop_axis = normal.iamax();

        let mut rings = vec![exterior];
        rings.extend(
            holes
                .iter()
                .map(|h| open_ring(h))
                .filter(|h| h.len() >= 3),
        );

        Some(Self {
            rings,
            normal,
            offset,
            drop_axis,
        })
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    pub fn rings(&self) -> &[Vec<Point3<f64>>] {
        &self.rings
    }

    pub fn exterior(&self) -> &[Point3<f64>] {
        &self.rings[0]
    }

    /// Signed distance of `p` from the polygon's plane
    pub fn plane_distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    /// All ring edges as closed segments
    pub fn edges(&self) -> impl Iterator<Item = (Point3<f64>, Point3<f64>)> + '_ {
        self.rings.iter().flat_map(|ring| {
            let n = ring.len();
            (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
        })
    }

    /// Area enclosed by the exterior minus holes
    pub fn area(&self) -> f64 {
        let outer = newell_normal(&self.rings[0]).norm() / 2.0;
        let holes: f64 = self.rings[1..]
            .iter()
            .map(|h| newell_normal(h).norm() / 2.0)
            .sum();
        (outer - holes).max(0.0)
    }

    /// Classify `p` against the closed region; points farther than `tol`
    /// from the plane are exterior.
    pub fn locate(&self, p: &Point3<f64>, tol: f64) -> Location {
        if self
            .edges()
            .any(|(a, b)| point_segment_distance(p, &a, &b) <= tol)
        {
            return Location::Boundary;
        }
        if self.plane_distance(p).abs() > tol {
            return Location::Exterior;
        }

        let (u, v) = self.project(p);
        let mut inside = false;
        for ring in &self.rings {
            let n = ring.len();
            for i in 0..n {
                let (ui, vi) = self.project(&ring[i]);
                let (uj, vj) = self.project(&ring[(i + 1) % n]);
                if (vi > v) != (vj > v) {
                    let cross_u = ui + (v - vi) * (uj - ui) / (vj - vi);
                    if u < cross_u {
                        inside = !inside;
                    }
                }
            }
        }

        if inside {
            Location::Interior
        } else {
            Location::Exterior
        }
    }

    /// Whether every ring vertex lies within `tol` of the plane
    pub fn is_planar(&self, tol: f64) -> bool {
        self.rings
            .iter()
            .flatten()
            .all(|v| self.plane_distance(v).abs() <= tol)
    }

    /// Distance from `p` to the closed region
    pub fn distance(&self, p: &Point3<f64>) -> f64 {
        let h = self.plane_distance(p);
        let foot = p - self.normal * h;
        if self.locate(&foot, DEFAULT_TOLERANCE) != Location::Exterior {
            return h.abs();
        }
        self.edges()
            .map(|(a, b)| point_segment_distance(p, &a, &b))
            .fold(f64::INFINITY, f64::min)
    }

    /// Fan triangles for each ring, holes wound opposite to the exterior
    pub fn signed_fans(&self) -> Vec<[Point3<f64>; 3]> {
        let mut triangles = Vec::new();
        for (index, ring) in self.rings.iter().enumerate() {
            let aligned = newell_normal(ring).dot(&self.normal) >= 0.0;
            let flip = if index == 0 { !aligned } else { aligned };
            for i in 1..ring.len() - 1 {
                if flip {
                    triangles.push([ring[0], ring[i + 1], ring[i]]);
                } else {
                    triangles.push([ring[0], ring[i], ring[i + 1]]);
                }
            }
        }
        triangles
    }

    fn project(&self, p: &Point3<f64>) -> (f64, f64) {
        match self.drop_axis {
            0 => (p.y, p.z),
            1 => (p.z, p.x),
            _ => (p.x, p.y),
        }
    }
}

/// Drop a repeated closing point
pub fn open_ring(ring: &[Point3<f64>]) -> Vec<Point3<f64>> {
    let mut open = ring.to_vec();
    if open.len() > 1 && open.first() == open.last() {
        open.pop();
    }
    open
}

/// Whether segment [a, b] meets the closed planar region
pub fn segment_meets_polygon(
    a: &Point3<f64>,
    b: &Point3<f64>,
    polygon: &PlanarPolygon,
    tol: f64,
) -> bool {
    let da = polygon.plane_distance(a);
    let db = polygon.plane_distance(b);

    if da.abs() <= tol && db.abs() <= tol {
        return polygon.locate(a, tol) != Location::Exterior
            || polygon.locate(b, tol) != Location::Exterior
            || polygon
                .edges()
                .any(|(p, q)| segment_segment_distance(a, b, &p, &q) <= tol);
    }
    if da.abs() <= tol {
        return polygon.locate(a, tol) != Location::Exterior;
    }
    if db.abs() <= tol {
        return polygon.locate(b, tol) != Location::Exterior;
    }
    if (da > 0.0) == (db > 0.0) {
        return false;
    }

    let t = da / (da - db);
    let hit = a + (b - a) * t;
    polygon.locate(&hit, tol) != Location::Exterior
}

/// Distance between segment [a, b] and the closed planar region
pub fn segment_polygon_distance(
    a: &Point3<f64>,
    b: &Point3<f64>,
    polygon: &PlanarPolygon,
    tol: f64,
) -> f64 {
    if segment_meets_polygon(a, b, polygon, tol) {
        return 0.0;
    }
    let endpoints = polygon.distance(a).min(polygon.distance(b));
    polygon
        .edges()
        .map(|(p, q)| segment_segment_distance(a, b, &p, &q))
        .fold(endpoints, f64::min)
}

/// Signed solid angle subtended by triangle (a, b, c) as seen from `p`
pub fn solid_angle(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ra = a - p;
    let rb = b - p;
    let rc = c - p;
    let la = ra.norm();
    let lb = rb.norm();
    let lc = rc.norm();

    let numerator = ra.dot(&rb.cross(&rc));
    let denominator = la * lb * lc + ra.dot(&rb) * lc + ra.dot(&rc) * lb + rb.dot(&rc) * la;
    2.0 * numerator.atan2(denominator)
}

/// Generalised winding number of a closed triangle set around `p`
///
/// Close to ±1 inside a consistently oriented closed surface and 0 outside.
/// Run the set through [`orient_shell`] first when face order is unknown.
pub fn winding_number<'a, I>(p: &Point3<f64>, triangles: I) -> f64
where
    I: IntoIterator<Item = &'a [Point3<f64>; 3]>,
{
    let total: f64 = triangles
        .into_iter()
        .map(|[a, b, c]| solid_angle(p, a, b, c))
        .sum();
    total / (4.0 * PI)
}

type EdgeKey = [u64; 6];

fn undirected_key(a: &Point3<f64>, b: &Point3<f64>) -> EdgeKey {
    let ka = [a.x.to_bits(), a.y.to_bits(), a.z.to_bits()];
    let kb = [b.x.to_bits(), b.y.to_bits(), b.z.to_bits()];
    let (lo, hi) = if ka <= kb { (ka, kb) } else { (kb, ka) };
    [lo[0], lo[1], lo[2], hi[0], hi[1], hi[2]]
}

fn triangle_edges(t: &[Point3<f64>; 3]) -> [(Point3<f64>, Point3<f64>); 3] {
    [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])]
}

/// Flip triangles so that every pair of neighbours walks their shared edge
/// in opposite directions
///
/// Each connected component keeps the orientation of its first triangle.
/// Non-manifold edges are followed but cannot always be made consistent.
pub fn orient_shell(triangles: &[[Point3<f64>; 3]]) -> Vec<[Point3<f64>; 3]> {
    let mut faces = triangles.to_vec();
    let mut adjacency: AHashMap<EdgeKey, Vec<usize>> = AHashMap::new();
    for (i, face) in faces.iter().enumerate() {
        for (a, b) in triangle_edges(face) {
            adjacency.entry(undirected_key(&a, &b)).or_default().push(i);
        }
    }

    let mut visited = vec![false; faces.len()];
    let mut queue = VecDeque::new();
    for seed in 0..faces.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        queue.push_back(seed);

        while let Some(i) = queue.pop_front() {
            let face = faces[i];
            for (a, b) in triangle_edges(&face) {
                let Some(neighbours) = adjacency.get(&undirected_key(&a, &b)) else {
                    continue;
                };
                for &j in neighbours {
                    if visited[j] {
                        continue;
                    }
                    visited[j] = true;
                    if triangle_edges(&faces[j]).iter().any(|(p, q)| *p == a && *q == b) {
                        faces[j].swap(1, 2);
                    }
                    queue.push_back(j);
                }
            }
        }
    }
    faces
}

/// Signed volume bounded by a consistently oriented closed triangle set
///
/// Positive when the faces wind counter-clockwise seen from outside.
pub fn enclosed_volume(triangles: &[[Point3<f64>; 3]]) -> f64 {
    let Some(apex) = triangles.first().map(|t| t[0]) else {
        return 0.0;
    };
    triangles
        .iter()
        .map(|[a, b, c]| oriented_volume(&apex, a, b, c))
        .sum::<f64>()
        / 6.0
}

/// Whether an oriented shell bounds a volume that is not negligible next to
/// its extent
pub fn encloses_volume(triangles: &[[Point3<f64>; 3]]) -> bool {
    let mut corners = triangles.iter().flatten();
    let Some(first) = corners.next() else {
        return false;
    };
    let (min, max) = corners.fold((first.coords, first.coords), |(lo, hi), p| {
        (lo.inf(&p.coords), hi.sup(&p.coords))
    });
    let span = (max - min).max();
    span > 0.0 && enclosed_volume(triangles).abs() > EPS * span.powi(3)
}
