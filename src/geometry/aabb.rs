// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Axis-aligned bounding box

use super::{Geometry, Point3, Polygon};
use crate::error::{GeometryError, Result};
use crate::io::text;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Corner triples of the 12 boundary triangles of a box whose corners are
/// ordered `A..H` as returned by `corners()`
pub(crate) const BOX_TRIANGLES: [[usize; 3]; 12] = [
    [0, 1, 2], // A B C
    [0, 2, 3], // A C D
    [4, 5, 6], // E F G
    [4, 6, 7], // E G H
    [1, 2, 6], // B C G
    [1, 6, 5], // B G F
    [3, 2, 6], // D C G
    [3, 6, 7], // D G H
    [0, 3, 7], // A D H
    [0, 7, 4], // A H E
    [0, 1, 5], // A B F
    [0, 5, 4], // A F E
];

/// Closed polyhedral surface over eight box corners
pub(crate) fn box_surface(corners: &[Point3; 8]) -> Geometry {
    Geometry::PolyhedralSurface(
        BOX_TRIANGLES
            .iter()
            .map(|[a, b, c]| Polygon::triangle(corners[*a], corners[*b], corners[*c]))
            .collect(),
    )
}

/// Axis-aligned bounding box
///
/// Always satisfies `min <= max` on every axis. A box with `min == max` is a
/// single point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AabbRecord", into = "AabbRecord")]
pub struct AxisAlignedBoundingBox {
    min: Point3,
    max: Point3,
}

/// JSON shape of a stored box
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AabbRecord {
    min_point: Point3,
    max_point: Point3,
}

impl TryFrom<AabbRecord> for AxisAlignedBoundingBox {
    type Error = GeometryError;

    fn try_from(record: AabbRecord) -> Result<Self> {
        Self::new(record.min_point, record.max_point)
    }
}

impl From<AxisAlignedBoundingBox> for AabbRecord {
    fn from(aabb: AxisAlignedBoundingBox) -> Self {
        AabbRecord {
            min_point: aabb.min,
            max_point: aabb.max,
        }
    }
}

impl AxisAlignedBoundingBox {
    /// Box from two corners
    pub fn new(min: Point3, max: Point3) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(GeometryError::invalid("box corners must be finite"));
        }
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(GeometryError::invalid(format!(
                "box minimum ({min}) exceeds maximum ({max})"
            )));
        }
        Ok(Self { min, max })
    }

    /// Smallest box enclosing every point
    pub fn from_points(points: &[Point3]) -> Result<Self> {
        let (first, rest) = points.split_first().ok_or(GeometryError::EmptyInput)?;
        let aabb = Self::scan(*first, rest);
        if !aabb.min.is_finite() || !aabb.max.is_finite() {
            return Err(GeometryError::invalid("point coordinates must be finite"));
        }
        Ok(aabb)
    }

    /// Smallest box enclosing every coordinate of a geometry
    pub fn from_geometry(geometry: &Geometry) -> Result<Self> {
        Self::from_points(&geometry.coordinates())
    }

    pub(crate) fn scan(first: Point3, rest: &[Point3]) -> Self {
        let mut min = first;
        let mut max = first;
        for p in rest {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }
        Self { min, max }
    }

    pub fn min(&self) -> Point3 {
        self.min
    }

    pub fn max(&self) -> Point3 {
        self.max
    }

    /// Closed-interval containment on all three axes
    pub fn contains(&self, point: &Point3) -> bool {
        (self.min.x..=self.max.x).contains(&point.x)
            && (self.min.y..=self.max.y).contains(&point.y)
            && (self.min.z..=self.max.z).contains(&point.z)
    }

    /// Whether two boxes share at least one point
    pub fn overlaps(&self, other: &AxisAlignedBoundingBox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
            && self.min.z <= other.max.z
            && other.min.z <= self.max.z
    }

    /// Smallest box enclosing both boxes
    pub fn union(&self, other: &AxisAlignedBoundingBox) -> Self {
        Self::scan(self.min, &[self.max, other.min, other.max])
    }

    pub fn center(&self) -> Point3 {
        Point3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    pub fn size(&self) -> nalgebra::Vector3<f64> {
        self.max.to_na() - self.min.to_na()
    }

    pub fn volume(&self) -> f64 {
        let size = self.size();
        size.x * size.y * size.z
    }

    /// Corners in `A..H` order: the first four at `min.z` counter-clockwise
    /// from `min`, then the same four at `max.z`
    pub fn corners(&self) -> [Point3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
        ]
    }

    /// The box as a closed 12-triangle polyhedral surface
    pub fn to_geometry(&self) -> Geometry {
        box_surface(&self.corners())
    }

    /// `BOX3D(minx miny minz, maxx maxy maxz)`
    pub fn to_text(&self) -> String {
        text::write_box3d(&self.min, &self.max)
    }

    pub fn from_text(input: &str) -> Result<Self> {
        let (min, max) = text::parse_box3d(input)?;
        Self::new(min, max).map_err(|e| GeometryError::parse("BOX3D", e.to_string()))
    }
}

impl fmt::Display for AxisAlignedBoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for AxisAlignedBoundingBox {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_text(s)
    }
}
