// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Geometry module - values, bounding volumes and spatial predicates

mod aabb;
pub mod boundary;
pub mod kernel;
mod mesh;
mod obb;
pub mod planar;
mod point;
pub mod predicates;
mod shape;

pub use aabb::AxisAlignedBoundingBox;
pub use boundary::{Boundary, Surface};
pub use mesh::Mesh;
pub use obb::OrientedBoundingBox;
pub use planar::CapStyle;
pub use point::Point3;
pub use predicates::{Location, DEFAULT_TOLERANCE};
pub use shape::{Geometry, Polygon};
