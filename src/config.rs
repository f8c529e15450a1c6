// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! Engine configuration

use crate::error::GeometryError;
use crate::geometry::{CapStyle, DEFAULT_TOLERANCE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File read by [`EngineConfig::load`] from the working directory
pub const CONFIG_FILE: &str = "spatial-engine.toml";

/// Tunables shared by the helper façade and the command-line front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Distance below which a point counts as lying on a boundary
    pub tolerance: f64,
    /// Segments per quarter circle when buffering
    pub buffer_segments: u32,
    /// Cap style used when a buffer call does not name one
    pub buffer_cap_style: CapStyle,
    /// Write a comment header at the top of OBJ exports
    pub obj_header: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            buffer_segments: 8,
            buffer_cap_style: CapStyle::Round,
            obj_header: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `spatial-engine.toml` when present, then apply environment
    /// overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `SPATIAL_*` overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tolerance) = lookup("SPATIAL_TOLERANCE") {
            self.tolerance = tolerance
                .parse()
                .with_context(|| format!("Invalid SPATIAL_TOLERANCE: {tolerance}"))?;
        }

        if let Some(segments) = lookup("SPATIAL_BUFFER_SEGMENTS") {
            self.buffer_segments = segments
                .parse()
                .with_context(|| format!("Invalid SPATIAL_BUFFER_SEGMENTS: {segments}"))?;
        }

        if let Some(cap) = lookup("SPATIAL_BUFFER_CAP_STYLE") {
            self.buffer_cap_style = cap.parse()?;
        }

        self.validate()?;
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(GeometryError::invalid(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if self.buffer_segments == 0 {
            return Err(GeometryError::invalid("buffer_segments must be at least 1"));
        }
        Ok(())
    }
}
