// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Command-line front end for the spatial engine

pub mod commands;
pub mod input;
pub mod reporter;

pub use commands::{BoundsReport, MeasureReport, ProbeReport, TextFormat};
pub use input::{discover_inputs, load_input, load_mesh, parse_point, Input};
pub use reporter::Reporter;
