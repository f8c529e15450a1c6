// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Well-known text and `BOX3D` reading and writing

use crate::error::{GeometryError, Result};
use crate::geometry::{Geometry, Point3, Polygon};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use std::fmt::Write;

#[derive(Parser)]
#[grammar = "io/text.pest"]
struct TextParser;

fn parse_error(format: &'static str) -> impl Fn(pest::error::Error<Rule>) -> GeometryError {
    move |err| GeometryError::parse(format, err.to_string())
}

fn next<'a>(pairs: &mut Pairs<'a, Rule>, what: &str) -> Result<Pair<'a, Rule>> {
    pairs
        .next()
        .ok_or_else(|| GeometryError::parse("WKT", format!("missing {what}")))
}

/// Parse well-known text; 2D coordinates get `z = 0`
pub fn parse_wkt(input: &str) -> Result<Geometry> {
    let mut pairs = TextParser::parse(Rule::wkt, input.trim()).map_err(parse_error("WKT"))?;
    let mut wkt = next(&mut pairs, "geometry")?.into_inner();
    parse_geometry(next(&mut wkt, "geometry")?)
}

fn parse_geometry(pair: Pair<Rule>) -> Result<Geometry> {
    let tagged = next(&mut pair.into_inner(), "geometry body")?;
    let rule = tagged.as_rule();
    let body = tagged
        .into_inner()
        .find(|p| p.as_rule() != Rule::z_tag)
        .ok_or_else(|| GeometryError::parse("WKT", "missing geometry body"))?;

    let geometry = match rule {
        Rule::point => Geometry::Point(parse_coord(next(&mut body.into_inner(), "coordinate")?)?),
        Rule::linestring => Geometry::LineString(parse_coords(body)?),
        Rule::polygon => Geometry::Polygon(parse_polygon(body)?),
        Rule::multipoint => Geometry::MultiPoint(
            body.into_inner()
                .filter(|p| p.as_rule() == Rule::mp_member)
                .map(|member| parse_coord(next(&mut member.into_inner(), "coordinate")?))
                .collect::<Result<_>>()?,
        ),
        Rule::multilinestring => Geometry::MultiLineString(
            body.into_inner()
                .filter(|p| p.as_rule() == Rule::linestring_text)
                .map(parse_coords)
                .collect::<Result<_>>()?,
        ),
        Rule::multipolygon => Geometry::MultiPolygon(parse_polygons(body)?),
        Rule::polyhedralsurface | Rule::tin => Geometry::PolyhedralSurface(parse_polygons(body)?),
        Rule::geometrycollection => Geometry::GeometryCollection(
            body.into_inner()
                .filter(|p| p.as_rule() == Rule::geometry)
                .map(parse_geometry)
                .collect::<Result<_>>()?,
        ),
        other => {
            return Err(GeometryError::parse(
                "WKT",
                format!("unexpected {other:?}"),
            ))
        }
    };
    Ok(geometry)
}

fn parse_number(pair: Pair<Rule>) -> Result<f64> {
    pair.as_str()
        .parse()
        .map_err(|e| GeometryError::parse("WKT", format!("bad number '{}': {e}", pair.as_str())))
}

fn parse_coord(pair: Pair<Rule>) -> Result<Point3> {
    let values = pair
        .into_inner()
        .map(parse_number)
        .collect::<Result<Vec<f64>>>()?;
    match values.as_slice() {
        [x, y] => Ok(Point3::new(*x, *y, 0.0)),
        [x, y, z] => Ok(Point3::new(*x, *y, *z)),
        _ => Err(GeometryError::parse("WKT", "coordinate needs 2 or 3 values")),
    }
}

/// Coordinates of a `linestring_text`; `EMPTY` gives none
fn parse_coords(pair: Pair<Rule>) -> Result<Vec<Point3>> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::coord)
        .map(parse_coord)
        .collect()
}

fn parse_polygon(pair: Pair<Rule>) -> Result<Polygon> {
    let mut rings = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::linestring_text)
        .map(parse_coords)
        .collect::<Result<Vec<_>>>()?
        .into_iter();
    let exterior = rings.next().unwrap_or_default();
    let interiors: Vec<Vec<Point3>> = rings.collect();
    if interiors.iter().any(Vec::is_empty) {
        return Err(GeometryError::parse("WKT", "polygon ring cannot be EMPTY"));
    }
    match (exterior.is_empty(), interiors.is_empty()) {
        (true, true) => Ok(Polygon::empty()),
        (true, false) => Err(GeometryError::parse(
            "WKT",
            "polygon with holes needs an exterior ring",
        )),
        (false, _) => Ok(Polygon::new(exterior, interiors)),
    }
}

fn parse_polygons(pair: Pair<Rule>) -> Result<Vec<Polygon>> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::polygon_text)
        .map(parse_polygon)
        .collect()
}

/// Well-known text in the `Z` form
pub fn write_wkt(geometry: &Geometry) -> String {
    let mut out = String::new();
    write_geometry(&mut out, geometry);
    out
}

fn write_geometry(out: &mut String, geometry: &Geometry) {
    let tag = geometry.geometry_type().to_ascii_uppercase();
    if geometry.is_empty() {
        let _ = write!(out, "{tag} Z EMPTY");
        return;
    }
    let _ = write!(out, "{tag} Z ");
    match geometry {
        Geometry::Point(p) => {
            let _ = write!(out, "({p})");
        }
        Geometry::LineString(line) => write_coords(out, line),
        Geometry::Polygon(polygon) => write_polygon(out, polygon),
        Geometry::MultiPoint(points) => {
            write_list(out, points, |out, p| {
                let _ = write!(out, "({p})");
            });
        }
        Geometry::MultiLineString(lines) => write_list(out, lines, |out, l| write_coords(out, l)),
        Geometry::MultiPolygon(polygons) | Geometry::PolyhedralSurface(polygons) => {
            write_list(out, polygons, write_polygon)
        }
        Geometry::GeometryCollection(members) => write_list(out, members, write_geometry),
    }
}

fn write_list<T>(out: &mut String, items: &[T], mut each: impl FnMut(&mut String, &T)) {
    out.push('(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        each(out, item);
    }
    out.push(')');
}

fn write_coords(out: &mut String, coords: &[Point3]) {
    if coords.is_empty() {
        out.push_str("EMPTY");
        return;
    }
    write_list(out, coords, |out, p| {
        let _ = write!(out, "{p}");
    });
}

fn write_polygon(out: &mut String, polygon: &Polygon) {
    if polygon.is_empty() {
        out.push_str("EMPTY");
        return;
    }
    let rings: Vec<&[Point3]> = polygon.rings().collect();
    write_list(out, &rings, |out, ring| write_coords(out, ring));
}

/// Parse `BOX3D(minx miny minz, maxx maxy maxz)` into its two corners
pub fn parse_box3d(input: &str) -> Result<(Point3, Point3)> {
    let mut pairs =
        TextParser::parse(Rule::box3d, input.trim()).map_err(parse_error("BOX3D"))?;
    let corners = next(&mut pairs, "box")?
        .into_inner()
        .filter(|p| p.as_rule() == Rule::coord3)
        .map(|c| {
            let v = c
                .into_inner()
                .map(parse_number)
                .collect::<Result<Vec<f64>>>()?;
            match v.as_slice() {
                [x, y, z] => Ok(Point3::new(*x, *y, *z)),
                _ => Err(GeometryError::parse("BOX3D", "corner needs 3 values")),
            }
        })
        .collect::<Result<Vec<Point3>>>()
        .map_err(|e| GeometryError::parse("BOX3D", e.to_string()))?;
    match corners.as_slice() {
        [min, max] => Ok((*min, *max)),
        _ => Err(GeometryError::parse("BOX3D", "expected two corners")),
    }
}

pub fn write_box3d(min: &Point3, max: &Point3) -> String {
    format!("BOX3D({min}, {max})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_2d_point() {
        assert_eq!(
            parse_wkt("POINT (1 2)").unwrap(),
            Geometry::Point(Point3::new(1.0, 2.0, 0.0))
        );
        assert_eq!(
            parse_wkt("point z(1 2 -3.5e1)").unwrap(),
            Geometry::Point(Point3::new(1.0, 2.0, -35.0))
        );
    }

    #[test]
    fn test_polygon_with_hole() {
        let g = parse_wkt(
            "POLYGON Z ((0 0 0, 10 0 0, 10 10 0, 0 10 0, 0 0 0), (2 2 0, 4 2 0, 4 4 0, 2 2 0))",
        )
        .unwrap();
        match &g {
            Geometry::Polygon(p) => {
                assert_eq!(p.exterior().len(), 5);
                assert_eq!(p.interiors().len(), 1);
            }
            other => panic!("expected polygon, got {other:?}"),
        }
        assert_eq!(parse_wkt(&write_wkt(&g)).unwrap(), g);
    }

    #[test]
    fn test_multipoint_forms() {
        let bare = parse_wkt("MULTIPOINT (1 2, 3 4)").unwrap();
        let wrapped = parse_wkt("MULTIPOINT ((1 2), (3 4))").unwrap();
        assert_eq!(bare, wrapped);
    }

    #[test]
    fn test_collection_round_trip() {
        let text = "GEOMETRYCOLLECTION Z (POINT Z (1 2 3), LINESTRING Z (0 0 0, 1 1 1), \
                    POLYHEDRALSURFACE Z (((0 0 0, 1 0 0, 0 1 0, 0 0 0))), MULTIPOLYGON Z EMPTY)";
        let g = parse_wkt(text).unwrap();
        assert_eq!(write_wkt(&g), text);
    }

    #[test]
    fn test_tin_reads_as_surface() {
        let g = parse_wkt("TIN Z (((0 0 0, 1 0 0, 0 1 0, 0 0 0)))").unwrap();
        assert_eq!(g.geometry_type(), "PolyhedralSurface");
    }

    #[test]
    fn test_empty_forms() {
        assert_eq!(parse_wkt("LINESTRING EMPTY").unwrap(), Geometry::LineString(Vec::new()));
        assert_eq!(write_wkt(&Geometry::LineString(Vec::new())), "LINESTRING Z EMPTY");
        assert!(parse_wkt("POINT EMPTY").is_err());
    }

    #[test]
    fn test_malformed_wkt() {
        for bad in ["", "POINT (1)", "LINESTRING (0 0, 1 1", "CIRCLE (0 0 1)", "POINT (1 2) x"] {
            assert!(
                matches!(parse_wkt(bad), Err(GeometryError::Parse { format: "WKT", .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_empty_polygon_rings_are_rejected() {
        for bad in [
            "POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0), EMPTY)",
            "POLYGON (EMPTY, (1 1, 2 1, 2 2, 1 1))",
            "MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0), EMPTY))",
        ] {
            assert!(
                matches!(parse_wkt(bad), Err(GeometryError::Parse { format: "WKT", .. })),
                "{bad}"
            );
        }
        assert_eq!(parse_wkt("POLYGON EMPTY").unwrap(), Geometry::Polygon(Polygon::empty()));
    }

    #[test]
    fn test_box3d() {
        let (min, max) = parse_box3d("BOX3D(0 -1.5 2, 3 4 5e2)").unwrap();
        assert_eq!(min, Point3::new(0.0, -1.5, 2.0));
        assert_eq!(max, Point3::new(3.0, 4.0, 500.0));
        assert_eq!(write_box3d(&min, &max), "BOX3D(0 -1.5 2, 3 4 500)");
        assert!(parse_box3d("BOX3D(0 0, 1 1)").is_err());
    }
}
