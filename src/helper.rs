// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Geometry helper façade
//!
//! Bundles the kernel, planar bridge and serializers behind one value that
//! carries an [`EngineConfig`]. Every method is a pure function of its
//! arguments apart from `export_obj`, which writes one file.

use crate::config::EngineConfig;
use crate::error::{GeometryError, Result};
use crate::geometry::planar::{self, SetOp};
use crate::geometry::{
    kernel, AxisAlignedBoundingBox, CapStyle, Geometry, OrientedBoundingBox, Point3,
};
use crate::io::{self, ObjSummary};
use crate::item::{self, ModelItem};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct GeometryHelper {
    config: EngineConfig,
}

impl GeometryHelper {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Combine geometries into one value without altering any of them
    ///
    /// A single input is returned as is; inputs of one simple type become the
    /// matching multi type; anything else becomes a collection.
    pub fn merge(&self, geometries: &[Geometry]) -> Geometry {
        if let [single] = geometries {
            return single.clone();
        }
        let points: Option<Vec<_>> = geometries
            .iter()
            .map(|g| match g {
                Geometry::Point(p) => Some(*p),
                _ => None,
            })
            .collect();
        let lines: Option<Vec<_>> = geometries
            .iter()
            .map(|g| match g {
                Geometry::LineString(l) => Some(l.clone()),
                _ => None,
            })
            .collect();
        let polygons: Option<Vec<_>> = geometries
            .iter()
            .map(|g| match g {
                Geometry::Polygon(p) => Some(p.clone()),
                _ => None,
            })
            .collect();

        match (geometries.is_empty(), points, lines, polygons) {
            (true, ..) => Geometry::GeometryCollection(Vec::new()),
            (false, Some(points), _, _) => Geometry::MultiPoint(points),
            (false, _, Some(lines), _) => Geometry::MultiLineString(lines),
            (false, _, _, Some(polygons)) => Geometry::MultiPolygon(polygons),
            _ => Geometry::GeometryCollection(geometries.to_vec()),
        }
    }

    /// Candidates sharing at least one point with `reference`, in input order
    pub fn filter_intersecting<'a>(
        &self,
        reference: &Geometry,
        candidates: &'a [Geometry],
    ) -> Vec<&'a Geometry> {
        candidates
            .iter()
            .filter(|candidate| kernel::intersects(reference, candidate, self.config.tolerance))
            .collect()
    }

    pub fn intersects(&self, a: &Geometry, b: &Geometry) -> bool {
        kernel::intersects(a, b, self.config.tolerance)
    }

    /// Placed items whose boundary passes through `point`
    pub fn items_touched_by<'a>(&self, items: &'a [ModelItem], point: &Point3) -> Result<Vec<&'a ModelItem>> {
        item::items_touched_within(items, point, self.config.tolerance)
    }

    /// Placed items containing `point` on their boundary or inside
    pub fn items_intersecting<'a>(&self, items: &'a [ModelItem], point: &Point3) -> Result<Vec<&'a ModelItem>> {
        item::items_intersecting_within(items, point, self.config.tolerance)
    }

    pub fn aabb_of(&self, geometries: &[Geometry]) -> Result<AxisAlignedBoundingBox> {
        AxisAlignedBoundingBox::from_geometry(&self.merge(geometries))
    }

    pub fn obb_of(&self, geometries: &[Geometry]) -> Result<OrientedBoundingBox> {
        OrientedBoundingBox::from_geometry(&self.merge(geometries))
    }

    /// Write the geometries to an OBJ file with shared vertices deduplicated
    pub fn export_obj(&self, geometries: &[Geometry], path: impl AsRef<Path>) -> Result<ObjSummary> {
        io::export_obj(geometries, path.as_ref(), self.config.obj_header)
    }

    /// Minimum 3D distance between two geometries
    pub fn distance(&self, a: &Geometry, b: &Geometry) -> Result<f64> {
        kernel::distance(a, b, self.config.tolerance).ok_or(GeometryError::EmptyInput)
    }

    pub fn area(&self, geometry: &Geometry) -> f64 {
        kernel::area(geometry)
    }

    pub fn length(&self, geometry: &Geometry) -> f64 {
        kernel::length(geometry)
    }

    pub fn geometry_type(&self, geometry: &Geometry) -> &'static str {
        geometry.geometry_type()
    }

    pub fn intersection(&self, a: &Geometry, b: &Geometry) -> Result<Geometry> {
        planar::overlay(a, b, SetOp::Intersection)
    }

    pub fn difference(&self, a: &Geometry, b: &Geometry) -> Result<Geometry> {
        planar::overlay(a, b, SetOp::Difference)
    }

    pub fn union(&self, a: &Geometry, b: &Geometry) -> Result<Geometry> {
        planar::overlay(a, b, SetOp::Union)
    }

    pub fn sym_difference(&self, a: &Geometry, b: &Geometry) -> Result<Geometry> {
        planar::overlay(a, b, SetOp::SymDifference)
    }

    /// Buffer with an explicit segment count and a cap style name
    /// (`round`, `flat` or `square`, case-insensitive)
    pub fn buffer(
        &self,
        geometry: &Geometry,
        radius: f64,
        segments: u32,
        cap_style: &str,
    ) -> Result<Geometry> {
        let cap: CapStyle = cap_style.parse()?;
        planar::buffer(geometry, radius, segments, cap)
    }

    /// Buffer with the configured segment count and cap style
    pub fn buffer_default(&self, geometry: &Geometry, radius: f64) -> Result<Geometry> {
        planar::buffer(
            geometry,
            radius,
            self.config.buffer_segments,
            self.config.buffer_cap_style,
        )
    }

    pub fn to_wkt(&self, geometry: &Geometry) -> String {
        io::write_wkt(geometry)
    }

    /// WKT of the merged geometries
    pub fn as_text(&self, geometries: &[Geometry]) -> String {
        io::write_wkt(&self.merge(geometries))
    }

    pub fn from_wkt(&self, text: &str) -> Result<Geometry> {
        io::parse_wkt(text)
    }

    pub fn to_geojson(&self, geometry: &Geometry) -> Result<String> {
        io::write_geojson(geometry)
    }

    pub fn from_geojson(&self, text: &str) -> Result<Geometry> {
        io::parse_geojson(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Mesh, Polygon};

    fn square(min: f64, max: f64) -> Geometry {
        Geometry::Polygon(Polygon::new(
            vec![
                Point3::new(min, min, 0.0),
                Point3::new(max, min, 0.0),
                Point3::new(max, max, 0.0),
                Point3::new(min, max, 0.0),
            ],
            Vec::new(),
        ))
    }

    #[test]
    fn test_merge_keeps_every_input() {
        let helper = GeometryHelper::default();
        let inputs = vec![
            Geometry::Point(Point3::ORIGIN),
            square(0.0, 1.0),
            Geometry::LineString(vec![Point3::ORIGIN, Point3::new(1.0, 1.0, 1.0)]),
        ];
        let merged = helper.merge(&inputs);
        assert_eq!(merged, Geometry::GeometryCollection(inputs.clone()));

        let polygons = helper.merge(&[square(0.0, 1.0), square(2.0, 3.0)]);
        assert_eq!(polygons.geometry_type(), "MultiPolygon");
        assert_eq!(helper.merge(&[square(0.0, 1.0)]), square(0.0, 1.0));
    }

    #[test]
    fn test_filter_intersecting_keeps_order() {
        let helper = GeometryHelper::default();
        let reference = square(0.0, 2.0);
        let candidates = vec![
            Geometry::Point(Point3::new(5.0, 5.0, 0.0)),
            Geometry::Point(Point3::new(1.0, 1.0, 0.0)),
            square(1.0, 3.0),
            Geometry::Point(Point3::new(2.0, 2.0, 0.0)),
        ];
        let hits = helper.filter_intersecting(&reference, &candidates);
        assert_eq!(hits, vec![&candidates[1], &candidates[2], &candidates[3]]);
        assert!(helper.filter_intersecting(&reference, &[]).is_empty());
    }

    #[test]
    fn test_buffer_cap_style_validation() {
        let helper = GeometryHelper::default();
        let point = Geometry::Point(Point3::ORIGIN);
        assert!(helper.buffer(&point, 1.0, 8, "Round").is_ok());
        assert!(matches!(
            helper.buffer(&point, 1.0, 8, "pointy"),
            Err(GeometryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_distance_to_empty_fails() {
        let helper = GeometryHelper::default();
        let empty = Geometry::MultiPoint(Vec::new());
        assert!(matches!(
            helper.distance(&empty, &square(0.0, 1.0)),
            Err(GeometryError::EmptyInput)
        ));
    }

    #[test]
    fn test_bounds_of_several_geometries() {
        let helper = GeometryHelper::default();
        let aabb = helper
            .aabb_of(&[square(0.0, 1.0), Geometry::Point(Point3::new(4.0, -1.0, 2.0))])
            .unwrap();
        assert_eq!(aabb.min(), Point3::new(0.0, -1.0, 0.0));
        assert_eq!(aabb.max(), Point3::new(4.0, 1.0, 2.0));
        assert!(matches!(helper.obb_of(&[]), Err(GeometryError::EmptyInput)));
    }

    #[test]
    fn test_item_hits_use_configured_tolerance() {
        let mesh = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2, 3],
        )
        .unwrap();
        let items = vec![ModelItem::new("square", mesh)];
        let near_edge = Point3::new(0.5, -1e-5, 0.0);

        let strict = GeometryHelper::default();
        assert!(strict.items_touched_by(&items, &near_edge).unwrap().is_empty());
        assert!(strict.items_intersecting(&items, &near_edge).unwrap().is_empty());

        let loose = GeometryHelper::new(EngineConfig {
            tolerance: 1e-3,
            ..EngineConfig::default()
        });
        assert_eq!(loose.items_touched_by(&items, &near_edge).unwrap().len(), 1);
        assert_eq!(loose.items_intersecting(&items, &near_edge).unwrap().len(), 1);
    }
}
