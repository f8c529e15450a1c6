// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Model-item geometry record
//!
//! The storage layer keeps one of these per model item. Colour and
//! properties are carried through untouched; the mesh, placement matrix and
//! stored box are what the engine reads.

use crate::error::{GeometryError, Result};
use crate::geometry::{AxisAlignedBoundingBox, Mesh, Point3, DEFAULT_TOLERANCE};
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

/// RGBA colour, stored as given
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ItemRecord", into = "ItemRecord")]
pub struct ModelItem {
    hierarchy_index: i32,
    display_name: String,
    path: String,
    color: Color,
    mesh: Mesh,
    matrix: Option<[f64; 16]>,
    aabb: Option<AxisAlignedBoundingBox>,
    properties: serde_json::Value,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRecord {
    #[serde(default)]
    hierarchy_index: i32,
    display_name: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    color: Color,
    mesh: Mesh,
    #[serde(default)]
    matrix: Option<Vec<f64>>,
    #[serde(default, rename = "AABB", alias = "aabb")]
    aabb: Option<AxisAlignedBoundingBox>,
    #[serde(default)]
    properties: serde_json::Value,
}

impl TryFrom<ItemRecord> for ModelItem {
    type Error = GeometryError;

    fn try_from(record: ItemRecord) -> Result<Self> {
        let mut item = ModelItem::new(record.display_name, record.mesh)
            .with_hierarchy(record.hierarchy_index, record.path)
            .with_color(record.color);
        if let Some(matrix) = record.matrix {
            item = item.with_matrix(&matrix)?;
        }
        item.aabb = record.aabb;
        item.properties = record.properties;
        Ok(item)
    }
}

impl From<ModelItem> for ItemRecord {
    fn from(item: ModelItem) -> Self {
        ItemRecord {
            hierarchy_index: item.hierarchy_index,
            display_name: item.display_name,
            path: item.path,
            color: item.color,
            mesh: item.mesh,
            matrix: item.matrix.map(|m| m.to_vec()),
            aabb: item.aabb,
            properties: item.properties,
        }
    }
}

impl ModelItem {
    pub fn new(display_name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            hierarchy_index: 0,
            display_name: display_name.into(),
            path: String::new(),
            color: Color::default(),
            mesh,
            matrix: None,
            aabb: None,
            properties: serde_json::Value::Null,
        }
    }

    pub fn with_hierarchy(mut self, index: i32, path: impl Into<String>) -> Self {
        self.hierarchy_index = index;
        self.path = path.into();
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Placement matrix, 16 finite values in column-major order
    pub fn with_matrix(mut self, values: &[f64]) -> Result<Self> {
        let matrix: [f64; 16] = values.try_into().map_err(|_| {
            GeometryError::invalid(format!(
                "matrix must contain exactly 16 values, got {}",
                values.len()
            ))
        })?;
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::invalid("matrix values must be finite"));
        }
        self.matrix = Some(matrix);
        Ok(self)
    }

    pub fn with_aabb(mut self, aabb: AxisAlignedBoundingBox) -> Self {
        self.aabb = Some(aabb);
        self
    }

    /// Attach a JSON properties blob; anything that is not JSON is rejected
    pub fn with_properties(mut self, json: &str) -> Result<Self> {
        self.properties = serde_json::from_str(json)
            .map_err(|e| GeometryError::parse("properties JSON", e.to_string()))?;
        Ok(self)
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn hierarchy_index(&self) -> i32 {
        self.hierarchy_index
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Mesh in local coordinates
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn matrix(&self) -> Option<&[f64; 16]> {
        self.matrix.as_ref()
    }

    pub fn properties(&self) -> &serde_json::Value {
        &self.properties
    }

    /// Mesh placed by the matrix, or the local mesh when there is none
    pub fn world_mesh(&self) -> Result<Mesh> {
        match &self.matrix {
            Some(values) => self.mesh.transformed(&Matrix4::from_column_slice(values)),
            None => Ok(self.mesh.clone()),
        }
    }

    /// The stored box, or one computed from the placed mesh
    pub fn derived_aabb(&self) -> Result<AxisAlignedBoundingBox> {
        match self.aabb {
            Some(aabb) => Ok(aabb),
            None => Ok(self.world_mesh()?.axis_aligned_bounds()),
        }
    }

    pub fn touched_by(&self, point: &Point3) -> Result<bool> {
        self.touched_within(point, DEFAULT_TOLERANCE)
    }

    pub fn touched_within(&self, point: &Point3, tol: f64) -> Result<bool> {
        Ok(self.world_mesh()?.touches_with(point, tol))
    }

    pub fn intersected_by(&self, point: &Point3) -> Result<bool> {
        self.intersected_within(point, DEFAULT_TOLERANCE)
    }

    pub fn intersected_within(&self, point: &Point3, tol: f64) -> Result<bool> {
        Ok(self.world_mesh()?.intersects_with(point, tol))
    }
}

/// Items whose placed mesh boundary passes through the hit point, in order
pub fn items_touched_by<'a>(items: &'a [ModelItem], point: &Point3) -> Result<Vec<&'a ModelItem>> {
    items_touched_within(items, point, DEFAULT_TOLERANCE)
}

pub fn items_touched_within<'a>(
    items: &'a [ModelItem],
    point: &Point3,
    tol: f64,
) -> Result<Vec<&'a ModelItem>> {
    select(items, |item| item.touched_within(point, tol))
}

/// Items whose placed mesh contains the hit point on its boundary or inside
pub fn items_intersecting<'a>(
    items: &'a [ModelItem],
    point: &Point3,
) -> Result<Vec<&'a ModelItem>> {
    items_intersecting_within(items, point, DEFAULT_TOLERANCE)
}

pub fn items_intersecting_within<'a>(
    items: &'a [ModelItem],
    point: &Point3,
    tol: f64,
) -> Result<Vec<&'a ModelItem>> {
    select(items, |item| item.intersected_within(point, tol))
}

fn select<'a, F>(items: &'a [ModelItem], keep: F) -> Result<Vec<&'a ModelItem>>
where
    F: Fn(&ModelItem) -> Result<bool>,
{
    let mut selected = Vec::new();
    for item in items {
        if keep(item)? {
            selected.push(item);
        }
    }
    Ok(selected)
}
