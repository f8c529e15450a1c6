// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Oriented bounding box fitted by principal-axis analysis

use super::aabb::{box_surface, BOX_TRIANGLES};
use super::predicates::DEFAULT_TOLERANCE;
use super::{Geometry, Mesh, Point3};
use crate::error::{GeometryError, Result};
use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Tolerance on unit length and orthogonality of deserialized axes
const AXIS_TOLERANCE: f64 = 1e-6;

/// Oriented bounding box
///
/// Axes are ordered by descending variance of the fitted point set. `axis_x`
/// and `axis_y` are sign-normalised so their largest-magnitude component is
/// positive, and `axis_z = axis_x × axis_y`, giving a right-handed frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ObbRecord", into = "ObbRecord")]
pub struct OrientedBoundingBox {
    center: Point3,
    axes: [Vector3<f64>; 3],
    half_extent: Point3,
}

/// Diagnostic JSON shape
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObbRecord {
    center: Point3,
    axis_x: Point3,
    axis_y: Point3,
    axis_z: Point3,
    half_size_vector: Point3,
}

impl TryFrom<ObbRecord> for OrientedBoundingBox {
    type Error = GeometryError;

    fn try_from(record: ObbRecord) -> Result<Self> {
        Self::new(
            record.center,
            [record.axis_x, record.axis_y, record.axis_z],
            record.half_size_vector,
        )
    }
}

impl From<OrientedBoundingBox> for ObbRecord {
    fn from(obb: OrientedBoundingBox) -> Self {
        ObbRecord {
            center: obb.center,
            axis_x: obb.axis_x(),
            axis_y: obb.axis_y(),
            axis_z: obb.axis_z(),
            half_size_vector: obb.half_extent,
        }
    }
}

impl OrientedBoundingBox {
    /// Box from explicit parts; axes must be unit length and pairwise
    /// orthogonal, half extents non-negative
    pub fn new(center: Point3, axes: [Point3; 3], half_extent: Point3) -> Result<Self> {
        if !center.is_finite() || !half_extent.is_finite() || axes.iter().any(|a| !a.is_finite()) {
            return Err(GeometryError::invalid("box parameters must be finite"));
        }
        let axes = axes.map(Point3::to_vector);
        for (i, axis) in axes.iter().enumerate() {
            if (axis.norm() - 1.0).abs() > AXIS_TOLERANCE {
                return Err(GeometryError::invalid(format!("axis {i} is not unit length")));
            }
            for other in &axes[i + 1..] {
                if axis.dot(other).abs() > AXIS_TOLERANCE {
                    return Err(GeometryError::invalid("box axes are not orthogonal"));
                }
            }
        }
        if half_extent.x < 0.0 || half_extent.y < 0.0 || half_extent.z < 0.0 {
            return Err(GeometryError::invalid("half extents must be non-negative"));
        }
        Ok(Self {
            center,
            axes,
            half_extent,
        })
    }

    /// Fit a box to a point set
    ///
    /// Coincident or collinear input yields zero extents along the collapsed
    /// axes.
    pub fn from_points(points: &[Point3]) -> Result<Self> {
        if points.is_empty() {
            return Err(GeometryError::EmptyInput);
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(GeometryError::invalid("point coordinates must be finite"));
        }
        Ok(Self::fit(points))
    }

    /// Fit a box to every coordinate of a geometry
    pub fn from_geometry(geometry: &Geometry) -> Result<Self> {
        Self::from_points(&geometry.coordinates())
    }

    /// Principal-axis fit of a non-empty point set
    pub(crate) fn fit(points: &[Point3]) -> Self {
        let n = points.len() as f64;
        let mean = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.to_vector())
            / n;

        let mut covariance = Matrix3::zeros();
        for p in points {
            let d = p.to_vector() - mean;
            covariance += d * d.transpose();
        }
        covariance /= n;

        let eigen = SymmetricEigen::new(covariance);
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

        let axes = orthonormal_frame(
            eigen.eigenvectors.column(order[0]).into_owned(),
            eigen.eigenvectors.column(order[1]).into_owned(),
        );

        let mut lo = [f64::INFINITY; 3];
        let mut hi = [f64::NEG_INFINITY; 3];
        for p in points {
            let d = p.to_vector() - mean;
            for (i, axis) in axes.iter().enumerate() {
                let t = d.dot(axis);
                lo[i] = lo[i].min(t);
                hi[i] = hi[i].max(t);
            }
        }

        let mut center = mean;
        let mut half = [0.0; 3];
        for i in 0..3 {
            center += axes[i] * ((lo[i] + hi[i]) / 2.0);
            half[i] = (hi[i] - lo[i]) / 2.0;
        }

        let collapsed = half.iter().filter(|h| **h <= f64::EPSILON).count();
        debug!(
            points = points.len(),
            eigenvalues = ?[
                eigen.eigenvalues[order[0]],
                eigen.eigenvalues[order[1]],
                eigen.eigenvalues[order[2]]
            ],
            collapsed_axes = collapsed,
            "fitted oriented bounding box"
        );
        if collapsed > 0 {
            warn!(
                collapsed_axes = collapsed,
                "oriented bounding box has zero extent along some axes"
            );
        }

        Self {
            center: Point3::from(center),
            axes,
            half_extent: Point3::new(half[0], half[1], half[2]),
        }
    }

    pub fn center(&self) -> Point3 {
        self.center
    }

    pub fn axis_x(&self) -> Point3 {
        Point3::from(self.axes[0])
    }

    pub fn axis_y(&self) -> Point3 {
        Point3::from(self.axes[1])
    }

    pub fn axis_z(&self) -> Point3 {
        Point3::from(self.axes[2])
    }

    /// Half lengths along `axis_x`, `axis_y`, `axis_z`
    pub fn half_size_vector(&self) -> Point3 {
        self.half_extent
    }

    pub fn volume(&self) -> f64 {
        8.0 * self.half_extent.x * self.half_extent.y * self.half_extent.z
    }

    /// Corners in `A..H` order. With signs given as (x, y, z) half-extent
    /// multipliers: `A(-,-,-) B(+,-,-) C(+,+,-) D(-,+,-) E(-,-,+) F(+,-,+)
    /// G(+,+,+) H(-,+,+)`.
    pub fn corners(&self) -> [Point3; 8] {
        const SIGNS: [[f64; 3]; 8] = [
            [-1.0, -1.0, -1.0],
            [1.0, -1.0, -1.0],
            [1.0, 1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
        ];
        let h = [self.half_extent.x, self.half_extent.y, self.half_extent.z];
        let c = self.center.to_vector();
        SIGNS.map(|s| {
            Point3::from(
                c + self.axes[0] * (s[0] * h[0])
                    + self.axes[1] * (s[1] * h[1])
                    + self.axes[2] * (s[2] * h[2]),
            )
        })
    }

    /// Analytic containment with a tolerance scaled to the box's magnitude
    pub fn contains(&self, point: &Point3) -> bool {
        let scale = [
            self.center.x.abs(),
            self.center.y.abs(),
            self.center.z.abs(),
            self.half_extent.x,
            self.half_extent.y,
            self.half_extent.z,
        ]
        .into_iter()
        .fold(1.0, f64::max);
        self.contains_within(point, DEFAULT_TOLERANCE * scale)
    }

    /// Containment with the box grown by `tol` along each axis
    pub fn contains_within(&self, point: &Point3, tol: f64) -> bool {
        let d = point.to_vector() - self.center.to_vector();
        let h = [self.half_extent.x, self.half_extent.y, self.half_extent.z];
        self.axes
            .iter()
            .zip(h)
            .all(|(axis, half)| d.dot(axis).abs() <= half + tol)
    }

    /// The 12-triangle boundary mesh over `corners()`
    pub fn surface_mesh(&self) -> Mesh {
        let indices = BOX_TRIANGLES.iter().flatten().copied().collect();
        Mesh::from_trusted(self.corners().to_vec(), indices)
    }

    /// The box as a closed 12-triangle polyhedral surface
    pub fn to_geometry(&self) -> Geometry {
        box_surface(&self.corners())
    }
}

/// Right-handed orthonormal frame from the two leading eigenvectors
fn orthonormal_frame(first: Vector3<f64>, second: Vector3<f64>) -> [Vector3<f64>; 3] {
    let x = first
        .try_normalize(f64::EPSILON)
        .map(canonical_sign)
        .unwrap_or_else(Vector3::x);

    let y = (second - x * x.dot(&second))
        .try_normalize(1e-12)
        .unwrap_or_else(|| any_perpendicular(&x));
    let y = canonical_sign(y);

    let z = x.cross(&y);
    [x, y, z]
}

/// Flip `v` so that its largest-magnitude component is positive
fn canonical_sign(v: Vector3<f64>) -> Vector3<f64> {
    if v[v.iamax()] < 0.0 {
        -v
    } else {
        v
    }
}

fn any_perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let helper = match v.iamin() {
        0 => Vector3::x(),
        1 => Vector3::y(),
        _ => Vector3::z(),
    };
    v.cross(&helper).normalize()
}
