// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Planar set operations and buffering
//!
//! Operands are projected onto the XY plane and handed to `geo`'s boolean
//! operations; results carry `z = 0`.

use super::{Geometry, Point3, Polygon};
use crate::error::{GeometryError, Result};
use geo::{BooleanOps, Coord, Intersects, LineString, MultiLineString, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// End treatment of buffered lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapStyle {
    #[default]
    Round,
    Flat,
    Square,
}

impl FromStr for CapStyle {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "round" => Ok(CapStyle::Round),
            "flat" => Ok(CapStyle::Flat),
            "square" => Ok(CapStyle::Square),
            other => Err(GeometryError::invalid(format!(
                "unknown cap style '{other}', expected round, flat or square"
            ))),
        }
    }
}

impl fmt::Display for CapStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CapStyle::Round => "round",
            CapStyle::Flat => "flat",
            CapStyle::Square => "square",
        })
    }
}

/// Set operation on two planar operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Intersection,
    Union,
    Difference,
    SymDifference,
}

/// A geometry projected to the plane, grouped by dimension
enum Planar {
    Points(Vec<geo::Point<f64>>),
    Lines(MultiLineString<f64>),
    Areas(MultiPolygon<f64>),
}

impl Planar {
    fn from_geometry(geometry: &Geometry) -> Result<Self> {
        let mut points = Vec::new();
        let mut lines = Vec::new();
        let mut areas = Vec::new();
        split(geometry, &mut points, &mut lines, &mut areas);

        match (points.is_empty(), lines.is_empty(), areas.is_empty()) {
            (_, true, true) => Ok(Planar::Points(points)),
            (true, false, true) => Ok(Planar::Lines(MultiLineString::new(lines))),
            (true, true, false) => Ok(Planar::Areas(dissolve(areas))),
            _ => Err(GeometryError::invalid(
                "set operations need operands of a single dimension",
            )),
        }
    }
}

fn coord(p: &Point3) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

fn line_string(points: &[Point3]) -> LineString<f64> {
    LineString::new(points.iter().map(coord).collect())
}

fn geo_polygon(polygon: &Polygon) -> geo::Polygon<f64> {
    geo::Polygon::new(
        line_string(polygon.exterior()),
        polygon.interiors().iter().map(|r| line_string(r)).collect(),
    )
}

fn split(
    geometry: &Geometry,
    points: &mut Vec<geo::Point<f64>>,
    lines: &mut Vec<LineString<f64>>,
    areas: &mut Vec<geo::Polygon<f64>>,
) {
    match geometry {
        Geometry::Point(p) => points.push(coord(p).into()),
        Geometry::MultiPoint(ps) => points.extend(ps.iter().map(|p| geo::Point::from(coord(p)))),
        Geometry::LineString(line) if !line.is_empty() => lines.push(line_string(line)),
        Geometry::LineString(_) => {}
        Geometry::MultiLineString(ls) => {
            lines.extend(ls.iter().filter(|l| !l.is_empty()).map(|l| line_string(l)))
        }
        Geometry::Polygon(polygon) if !polygon.is_empty() => areas.push(geo_polygon(polygon)),
        Geometry::Polygon(_) => {}
        Geometry::MultiPolygon(polygons) | Geometry::PolyhedralSurface(polygons) => areas.extend(
            polygons
                .iter()
                .filter(|p| !p.is_empty())
                .map(geo_polygon),
        ),
        Geometry::GeometryCollection(members) => {
            for member in members {
                split(member, points, lines, areas);
            }
        }
    }
}

/// Union a polygon list into a valid multipolygon
fn dissolve(polygons: Vec<geo::Polygon<f64>>) -> MultiPolygon<f64> {
    polygons
        .into_iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, p| {
            acc.union(&MultiPolygon::new(vec![p]))
        })
}

fn lift(c: Coord<f64>) -> Point3 {
    Point3::new(c.x, c.y, 0.0)
}

fn lift_line(line: &LineString<f64>) -> Vec<Point3> {
    line.coords().copied().map(lift).collect()
}

fn lift_polygon(polygon: &geo::Polygon<f64>) -> Polygon {
    Polygon::new(
        lift_line(polygon.exterior()),
        polygon.interiors().iter().map(lift_line).collect(),
    )
}

fn areas_to_geometry(areas: &MultiPolygon<f64>) -> Geometry {
    match areas.0.as_slice() {
        [single] => Geometry::Polygon(lift_polygon(single)),
        many => Geometry::MultiPolygon(many.iter().map(lift_polygon).collect()),
    }
}

fn lines_to_geometry(lines: &MultiLineString<f64>) -> Geometry {
    match lines.0.as_slice() {
        [single] => Geometry::LineString(lift_line(single)),
        many => Geometry::MultiLineString(many.iter().map(lift_line).collect()),
    }
}

fn points_to_geometry(points: Vec<geo::Point<f64>>) -> Geometry {
    match points.as_slice() {
        [single] => Geometry::Point(lift(single.0)),
        many => Geometry::MultiPoint(many.iter().map(|p| lift(p.0)).collect()),
    }
}

fn mixed(area: Geometry, rest: Geometry) -> Geometry {
    match (area.is_empty(), rest.is_empty()) {
        (_, true) => area,
        (true, false) => rest,
        (false, false) => Geometry::GeometryCollection(vec![area, rest]),
    }
}

/// Apply a set operation in the XY plane
///
/// Polygonal operands support every operation. Lines and points against a
/// polygonal operand are clipped or filtered; lines and points against each
/// other are rejected.
pub fn overlay(a: &Geometry, b: &Geometry, op: SetOp) -> Result<Geometry> {
    use Planar::*;
    let left = Planar::from_geometry(a)?;
    let right = Planar::from_geometry(b)?;

    let result = match (left, right, op) {
        (Areas(x), Areas(y), op) => areas_to_geometry(&match op {
            SetOp::Intersection => x.intersection(&y),
            SetOp::Union => x.union(&y),
            SetOp::Difference => x.difference(&y),
            SetOp::SymDifference => x.xor(&y),
        }),

        (Lines(l), Areas(area), SetOp::Intersection)
        | (Areas(area), Lines(l), SetOp::Intersection) => lines_to_geometry(&area.clip(&l, false)),
        (Lines(l), Areas(area), SetOp::Difference) => lines_to_geometry(&area.clip(&l, true)),
        (Areas(area), Lines(_), SetOp::Difference) => areas_to_geometry(&area),
        (Lines(l), Areas(area), _) | (Areas(area), Lines(l), _) => mixed(
            areas_to_geometry(&area),
            lines_to_geometry(&area.clip(&l, true)),
        ),

        (Points(ps), Areas(area), SetOp::Intersection)
        | (Areas(area), Points(ps), SetOp::Intersection) => {
            points_to_geometry(ps.into_iter().filter(|p| area.intersects(p)).collect())
        }
        (Points(ps), Areas(area), SetOp::Difference) => {
            points_to_geometry(ps.into_iter().filter(|p| !area.intersects(p)).collect())
        }
        (Areas(area), Points(_), SetOp::Difference) => areas_to_geometry(&area),
        (Points(ps), Areas(area), _) | (Areas(area), Points(ps), _) => {
            let outside = ps.into_iter().filter(|p| !area.intersects(p)).collect();
            mixed(areas_to_geometry(&area), points_to_geometry(outside))
        }

        _ => {
            return Err(GeometryError::invalid(format!(
                "{op:?} of {} and {} needs a polygonal operand",
                a.geometry_type(),
                b.geometry_type()
            )))
        }
    };
    Ok(result)
}

/// Outline of a circle as a closed ring, counter-clockwise
fn disk(center: Coord<f64>, radius: f64, segments: u32) -> geo::Polygon<f64> {
    let n = 4 * segments.max(1);
    let ring: Vec<Coord<f64>> = (0..n)
        .map(|i| {
            let a = 2.0 * PI * i as f64 / n as f64;
            Coord {
                x: center.x + radius * a.cos(),
                y: center.y + radius * a.sin(),
            }
        })
        .collect();
    geo::Polygon::new(LineString::new(ring), Vec::new())
}

/// Rectangle of half-width `radius` around segment [a, b], each end pushed
/// outward by the given extension
fn slab(
    a: Coord<f64>,
    b: Coord<f64>,
    radius: f64,
    extend_start: f64,
    extend_end: f64,
) -> Option<geo::Polygon<f64>> {
    let d = b - a;
    let len = d.x.hypot(d.y);
    if len <= f64::EPSILON {
        return None;
    }
    let u = Coord {
        x: d.x / len,
        y: d.y / len,
    };
    let n = Coord { x: -u.y, y: u.x } * radius;
    let s = a - u * extend_start;
    let e = b + u * extend_end;
    Some(geo::Polygon::new(
        LineString::new(vec![s - n, e - n, e + n, s + n]),
        Vec::new(),
    ))
}

/// Pieces whose union is the buffer of an open polyline
fn line_pieces(
    line: &[Coord<f64>],
    radius: f64,
    segments: u32,
    cap: CapStyle,
) -> Vec<geo::Polygon<f64>> {
    let mut pieces = Vec::new();
    let last = line.len().saturating_sub(2);
    for (i, w) in line.windows(2).enumerate() {
        let start = if i == 0 && cap == CapStyle::Square { radius } else { 0.0 };
        let end = if i == last && cap == CapStyle::Square { radius } else { 0.0 };
        pieces.extend(slab(w[0], w[1], radius, start, end));
    }
    // joins
    if line.len() > 2 {
        pieces.extend(line[1..line.len() - 1].iter().map(|c| disk(*c, radius, segments)));
    }
    if cap == CapStyle::Round {
        if let (Some(first), Some(last)) = (line.first(), line.last()) {
            pieces.push(disk(*first, radius, segments));
            pieces.push(disk(*last, radius, segments));
        }
    }
    pieces
}

/// Pieces whose union is the band of half-width `radius` around a closed ring
fn ring_pieces(ring: &LineString<f64>, radius: f64, segments: u32) -> Vec<geo::Polygon<f64>> {
    let coords: Vec<Coord<f64>> = ring.coords().copied().collect();
    let mut pieces: Vec<_> = coords
        .windows(2)
        .filter_map(|w| slab(w[0], w[1], radius, 0.0, 0.0))
        .collect();
    pieces.extend(coords.iter().map(|c| disk(*c, radius, segments)));
    pieces
}

/// Buffer by `radius` in the XY plane
///
/// `segments` is the number of segments per quarter circle. A negative
/// radius erodes polygons; points and lines have no negative buffer.
pub fn buffer(geometry: &Geometry, radius: f64, segments: u32, cap: CapStyle) -> Result<Geometry> {
    if !radius.is_finite() {
        return Err(GeometryError::invalid("buffer radius must be finite"));
    }
    if segments == 0 {
        return Err(GeometryError::invalid("buffer needs at least one segment"));
    }
    let mut points = Vec::new();
    let mut lines = Vec::new();
    let mut areas = Vec::new();
    split(geometry, &mut points, &mut lines, &mut areas);

    let areas = dissolve(areas);
    if radius == 0.0 {
        return Ok(areas_to_geometry(&areas));
    }

    let r = radius.abs();
    let band: Vec<geo::Polygon<f64>> = areas
        .iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .flat_map(|ring| ring_pieces(ring, r, segments))
        .collect();

    let result = if radius < 0.0 {
        areas.difference(&dissolve(band))
    } else {
        let mut pieces = band;
        for p in &points {
            match cap {
                CapStyle::Round => pieces.push(disk(p.0, r, segments)),
                CapStyle::Square => pieces.push(geo::Polygon::new(
                    LineString::new(vec![
                        p.0 + Coord { x: -r, y: -r },
                        p.0 + Coord { x: r, y: -r },
                        p.0 + Coord { x: r, y: r },
                        p.0 + Coord { x: -r, y: r },
                    ]),
                    Vec::new(),
                )),
                CapStyle::Flat => {}
            }
        }
        for line in &lines {
            let coords: Vec<Coord<f64>> = line.coords().copied().collect();
            if line.is_closed() && coords.len() > 2 {
                pieces.extend(ring_pieces(line, r, segments));
            } else if coords.iter().all(|c| *c == coords[0]) {
                // zero-length line buffers like a point
                if cap == CapStyle::Round {
                    pieces.push(disk(coords[0], r, segments));
                }
            } else {
                pieces.extend(line_pieces(&coords, r, segments, cap));
            }
        }
        areas.union(&dissolve(pieces))
    };

    debug!(
        radius,
        segments,
        cap = %cap,
        polygons = result.0.len(),
        "buffered geometry"
    );
    Ok(areas_to_geometry(&result))
}
