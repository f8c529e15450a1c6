// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Spatial geometry engine
//!
//! Bounding volumes, boundary-aware point predicates and geometry
//! interchange (WKT, GeoJSON, OBJ) for indexed triangle meshes and the
//! model-item records that carry them.

pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod helper;
pub mod io;
pub mod item;

pub use config::EngineConfig;
pub use error::{GeometryError, Result};
pub use geometry::{
    AxisAlignedBoundingBox, CapStyle, Geometry, Location, Mesh, OrientedBoundingBox, Point3,
    Polygon, DEFAULT_TOLERANCE,
};
pub use helper::GeometryHelper;
pub use item::{
    items_intersecting, items_intersecting_within, items_touched_by, items_touched_within, Color,
    ModelItem,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_to_text() {
        let mesh = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2],
        )
        .unwrap();
        let helper = GeometryHelper::default();
        let geometry = helper.from_wkt(&mesh.to_wkt()).unwrap();
        assert_eq!(geometry, mesh.to_geometry());
    }
}
