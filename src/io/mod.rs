// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! I/O module - text formats and exporters

pub mod export_obj;
pub mod geojson;
pub mod text;

pub use export_obj::{export as export_obj, write_obj, ObjSummary};
pub use geojson::{parse_geojson, write_geojson};
pub use text::{parse_box3d, parse_wkt, write_box3d, write_wkt};
