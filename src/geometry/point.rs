// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! 3D coordinate value type

use nalgebra as na;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable 3D coordinate
///
/// Equality is exact per component. Predicates that need a tolerance take one
/// explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component `i` (0 = x, 1 = y, anything else = z)
    pub fn coord(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Exact bit pattern of the coordinate, usable as a hash key.
    ///
    /// `-0.0` is folded onto `0.0` so that the key agrees with `==`.
    pub fn bits(&self) -> [u64; 3] {
        let fold = |v: f64| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() };
        [fold(self.x), fold(self.y), fold(self.z)]
    }

    pub fn distance(&self, other: &Point3) -> f64 {
        (self.to_na() - other.to_na()).norm()
    }

    pub fn to_na(self) -> na::Point3<f64> {
        na::Point3::new(self.x, self.y, self.z)
    }

    pub fn to_vector(self) -> na::Vector3<f64> {
        na::Vector3::new(self.x, self.y, self.z)
    }

    /// Arithmetic mean of a point set, `None` when empty
    pub fn centroid(points: &[Point3]) -> Option<Point3> {
        if points.is_empty() {
            return None;
        }
        let sum = points
            .iter()
            .fold(na::Vector3::zeros(), |acc, p| acc + p.to_vector());
        Some(Point3::from(sum / points.len() as f64))
    }
}

impl From<na::Point3<f64>> for Point3 {
    fn from(p: na::Point3<f64>) -> Self {
        Point3::new(p.x, p.y, p.z)
    }
}

impl From<na::Vector3<f64>> for Point3 {
    fn from(v: na::Vector3<f64>) -> Self {
        Point3::new(v.x, v.y, v.z)
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(c: [f64; 3]) -> Self {
        Point3::new(c[0], c[1], c[2])
    }
}

impl From<Point3> for [f64; 3] {
    fn from(p: Point3) -> Self {
        [p.x, p.y, p.z]
    }
}

impl fmt::Display for Point3 {
    /// Space-separated coordinates with shortest round-trip formatting
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(0.0, 0.0, 2.0),
        ];
        assert_eq!(Point3::centroid(&points), Some(Point3::new(0.5, 0.5, 0.5)));
        assert_eq!(Point3::centroid(&[]), None);
    }

    #[test]
    fn test_bits_fold_negative_zero() {
        assert_eq!(
            Point3::new(-0.0, 1.0, 2.0).bits(),
            Point3::new(0.0, 1.0, 2.0).bits()
        );
        assert_ne!(
            Point3::new(1.0, 1.0, 2.0).bits(),
            Point3::new(1.0 + f64::EPSILON, 1.0, 2.0).bits()
        );
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&Point3::new(1.0, 2.5, -3.0)).unwrap();
        assert_eq!(json, r#"{"x":1.0,"y":2.5,"z":-3.0}"#);
    }

    #[test]
    fn test_display_round_trips() {
        let p = Point3::new(0.1, 1.0 / 3.0, -2.0);
        let text = p.to_string();
        let parsed: Vec<f64> = text.split(' ').map(|s| s.parse().unwrap()).collect();
        assert_eq!(Point3::new(parsed[0], parsed[1], parsed[2]), p);
    }
}
