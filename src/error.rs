// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Error types for the geometry engine
//!
//! Every fallible engine operation returns [`GeometryError`]. Numerically
//! marginal inputs (collapsed box axes, near-duplicate vertices) are not
//! errors; they produce well-defined degenerate results instead.

use std::io;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, GeometryError>;

/// Errors surfaced by geometric construction, parsing and export
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The operation needs at least one point or vertex
    #[error("operation requires at least one point, got none")]
    EmptyInput,

    /// A mesh without vertices or without face indices
    #[error("degenerate mesh: {0}")]
    DegenerateMesh(String),

    /// A face index that does not address a vertex
    #[error("face index {index} is out of range for {len} vertices")]
    IndexOutOfRange { index: i64, len: usize },

    /// Malformed textual or JSON geometry
    #[error("failed to parse {format}: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// An option or argument outside the accepted set
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The export destination could not be written
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl GeometryError {
    pub(crate) fn parse(format: &'static str, message: impl Into<String>) -> Self {
        GeometryError::Parse {
            format,
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        GeometryError::InvalidArgument(message.into())
    }
}

impl From<serde_json::Error> for GeometryError {
    fn from(err: serde_json::Error) -> Self {
        GeometryError::parse("JSON", err.to_string())
    }
}
