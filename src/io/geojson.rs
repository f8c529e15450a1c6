// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! GeoJSON geometry objects (RFC 7946)

use crate::error::{GeometryError, Result};
use crate::geometry::{Geometry, Point3, Polygon};
use serde::{Deserialize, Serialize};

type Position = Vec<f64>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum GeoJson {
    Point {
        coordinates: Position,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJson>,
    },
    /// Accepted on input only; the geometry is unwrapped
    #[serde(skip_serializing)]
    Feature {
        geometry: Option<Box<GeoJson>>,
    },
}

fn position(p: &Point3) -> Position {
    vec![p.x, p.y, p.z]
}

fn positions(points: &[Point3]) -> Vec<Position> {
    points.iter().map(position).collect()
}

fn rings(polygon: &Polygon) -> Vec<Vec<Position>> {
    if polygon.is_empty() {
        return Vec::new();
    }
    polygon.rings().map(positions).collect()
}

impl From<&Geometry> for GeoJson {
    fn from(geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Point(p) => GeoJson::Point {
                coordinates: position(p),
            },
            Geometry::LineString(line) => GeoJson::LineString {
                coordinates: positions(line),
            },
            Geometry::Polygon(polygon) => GeoJson::Polygon {
                coordinates: rings(polygon),
            },
            Geometry::MultiPoint(points) => GeoJson::MultiPoint {
                coordinates: positions(points),
            },
            Geometry::MultiLineString(lines) => GeoJson::MultiLineString {
                coordinates: lines.iter().map(|l| positions(l)).collect(),
            },
            // GeoJSON has no surface type; faces travel as polygons
            Geometry::MultiPolygon(polygons) | Geometry::PolyhedralSurface(polygons) => {
                GeoJson::MultiPolygon {
                    coordinates: polygons.iter().map(rings).collect(),
                }
            }
            Geometry::GeometryCollection(members) => GeoJson::GeometryCollection {
                geometries: members.iter().map(GeoJson::from).collect(),
            },
        }
    }
}

fn point(position: &[f64]) -> Result<Point3> {
    match position {
        [x, y] => Ok(Point3::new(*x, *y, 0.0)),
        [x, y, z, ..] => Ok(Point3::new(*x, *y, *z)),
        _ => Err(GeometryError::parse(
            "GeoJSON",
            format!("position needs 2 or 3 values, got {}", position.len()),
        )),
    }
}

fn points(positions: &[Position]) -> Result<Vec<Point3>> {
    positions.iter().map(|p| point(p)).collect()
}

fn polygon(rings: &[Vec<Position>]) -> Result<Polygon> {
    let mut rings = rings.iter().map(|r| points(r));
    match rings.next() {
        Some(exterior) => Ok(Polygon::new(exterior?, rings.collect::<Result<_>>()?)),
        None => Ok(Polygon::empty()),
    }
}

impl TryFrom<GeoJson> for Geometry {
    type Error = GeometryError;

    fn try_from(value: GeoJson) -> Result<Self> {
        Ok(match value {
            GeoJson::Point { coordinates } => Geometry::Point(point(&coordinates)?),
            GeoJson::LineString { coordinates } => Geometry::LineString(points(&coordinates)?),
            GeoJson::Polygon { coordinates } => Geometry::Polygon(polygon(&coordinates)?),
            GeoJson::MultiPoint { coordinates } => Geometry::MultiPoint(points(&coordinates)?),
            GeoJson::MultiLineString { coordinates } => Geometry::MultiLineString(
                coordinates
                    .iter()
                    .map(|l| points(l))
                    .collect::<Result<_>>()?,
            ),
            GeoJson::MultiPolygon { coordinates } => Geometry::MultiPolygon(
                coordinates
                    .iter()
                    .map(|p| polygon(p))
                    .collect::<Result<_>>()?,
            ),
            GeoJson::GeometryCollection { geometries } => Geometry::GeometryCollection(
                geometries
                    .into_iter()
                    .map(Geometry::try_from)
                    .collect::<Result<_>>()?,
            ),
            GeoJson::Feature { geometry } => match geometry {
                Some(inner) => Geometry::try_from(*inner)?,
                None => return Err(GeometryError::parse("GeoJSON", "feature has no geometry")),
            },
        })
    }
}

/// Parse a GeoJSON geometry or feature
pub fn parse_geojson(input: &str) -> Result<Geometry> {
    let value: GeoJson = serde_json::from_str(input)
        .map_err(|e| GeometryError::parse("GeoJSON", e.to_string()))?;
    Geometry::try_from(value)
}

/// Serialize a geometry as a GeoJSON geometry object with 3D positions
///
/// JSON has no encoding for NaN or infinity, so such coordinates are refused.
pub fn write_geojson(geometry: &Geometry) -> Result<String> {
    if geometry.coordinates().iter().any(|p| !p.is_finite()) {
        return Err(GeometryError::invalid("GeoJSON coordinates must be finite"));
    }
    Ok(serde_json::to_string(&GeoJson::from(geometry))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_json() {
        let text = write_geojson(&Geometry::Point(Point3::new(1.0, 2.0, 3.0))).unwrap();
        assert_eq!(text, r#"{"type":"Point","coordinates":[1.0,2.0,3.0]}"#);
    }

    #[test]
    fn test_non_finite_coordinates_are_refused() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let line = Geometry::LineString(vec![Point3::ORIGIN, Point3::new(1.0, bad, 0.0)]);
            assert!(
                matches!(write_geojson(&line), Err(GeometryError::InvalidArgument(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_polygon_round_trip() {
        let g = Geometry::MultiPolygon(vec![
            Polygon::new(
                vec![
                    Point3::new(0.0, 0.0, 1.0),
                    Point3::new(4.0, 0.0, 1.0),
                    Point3::new(4.0, 4.0, 1.0),
                ],
                vec![vec![
                    Point3::new(1.0, 1.0, 1.0),
                    Point3::new(2.0, 1.0, 1.0),
                    Point3::new(2.0, 2.0, 1.0),
                ]],
            ),
            Polygon::empty(),
        ]);
        let text = write_geojson(&g).unwrap();
        assert_eq!(parse_geojson(&text).unwrap(), g);
    }

    #[test]
    fn test_feature_is_unwrapped() {
        let text = r#"{"type":"Feature","properties":{"name":"a"},
                       "geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]}}"#;
        assert_eq!(
            parse_geojson(text).unwrap(),
            Geometry::LineString(vec![Point3::ORIGIN, Point3::new(1.0, 1.0, 0.0)])
        );
    }

    #[test]
    fn test_surface_written_as_multipolygon() {
        let surface = Geometry::PolyhedralSurface(vec![Polygon::triangle(
            Point3::ORIGIN,
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )]);
        let back = parse_geojson(&write_geojson(&surface).unwrap()).unwrap();
        assert_eq!(back.geometry_type(), "MultiPolygon");
    }

    #[test]
    fn test_malformed() {
        for bad in [
            "{",
            r#"{"type":"Circle","coordinates":[0,0]}"#,
            r#"{"type":"Point","coordinates":[1]}"#,
            r#"{"type":"Feature","geometry":null}"#,
        ] {
            assert!(
                matches!(parse_geojson(bad), Err(GeometryError::Parse { format: "GeoJSON", .. })),
                "{bad}"
            );
        }
    }
}
