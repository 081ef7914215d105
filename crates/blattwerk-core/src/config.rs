// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Composer configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BlattwerkError, Result};
use crate::types::{FrameBox, MinSize, PageSize, StyleParams};

/// Settings for a composition session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Output page geometry.
    pub page: PageSize,
    /// Primary frame on a freshly created document.
    pub initial_box: FrameBox,
    /// Floor for frame width/height.
    pub min_box: MinSize,
    /// Style defaults for a fresh document.
    pub style: StyleParams,
    /// PDF rasterization scale (PDF points to pixels).
    pub oversampling: f32,
    /// Pixels whose RGB channels all exceed this value become transparent.
    pub near_white_threshold: u8,
    /// Raster pixels per page pixel on export.
    pub capture_scale: f32,
    /// Delay before the first page capture of an export, in milliseconds.
    pub settle_delay_ms: u64,
    /// File name used for persisted exports.
    pub default_output_name: String,
    /// Font family looked up among system fonts (e.g. "sans-serif", "DejaVu Sans").
    pub font_family: Option<String>,
    /// Explicit font file; takes precedence over `font_family`.
    pub font_path: Option<PathBuf>,
    /// Line height multiplier for flow text.
    pub line_height: f32,
    /// Gap after each flow block, in em.
    pub block_spacing_em: f32,
    /// Brightness lift per unit of contrast above 1.0.
    pub contrast_lift: f32,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            page: PageSize::A4,
            initial_box: FrameBox::default(),
            min_box: MinSize::default(),
            style: StyleParams::default(),
            oversampling: 2.0,
            near_white_threshold: 235,
            capture_scale: 2.0,
            settle_delay_ms: 200,
            default_output_name: "document.pdf".into(),
            font_family: Some("sans-serif".into()),
            font_path: None,
            line_height: 1.4,
            block_spacing_em: 0.5,
            contrast_lift: 24.0,
        }
    }
}

impl ComposerConfig {
    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(BlattwerkError::InvalidConfig(msg));

        if self.page.width_px == 0 || self.page.height_px == 0 {
            return invalid(format!(
                "page must have a non-zero size, got {}x{}",
                self.page.width_px, self.page.height_px
            ));
        }
        // Written as `!(x > 0.0)` so NaN is rejected along with zero.
        if !(self.min_box.width > 0.0 && self.min_box.height > 0.0) {
            return invalid("minimum frame size must be positive".into());
        }
        let frame = self.initial_box;
        if ![frame.x, frame.y, frame.width, frame.height]
            .iter()
            .all(|v| v.is_finite())
        {
            return invalid(format!("initial frame {:?} is not finite", frame));
        }
        if !(self.oversampling > 0.0 && self.oversampling <= 8.0) {
            return invalid(format!("oversampling {} outside (0, 8]", self.oversampling));
        }
        if !(self.capture_scale > 0.0 && self.capture_scale <= 8.0) {
            return invalid(format!("capture scale {} outside (0, 8]", self.capture_scale));
        }
        if !(self.style.font_size.is_finite() && self.style.font_size > 0.0) {
            return invalid(format!("font size {} must be positive", self.style.font_size));
        }
        if !(0.0..=1.0).contains(&self.style.opacity) {
            return invalid(format!("opacity {} outside [0, 1]", self.style.opacity));
        }
        if !(self.style.contrast.is_finite() && self.style.contrast >= 0.0) {
            return invalid(format!("contrast {} must not be negative", self.style.contrast));
        }
        if !(self.line_height.is_finite() && self.line_height > 0.0) {
            return invalid(format!("line height {} must be positive", self.line_height));
        }
        if !(self.block_spacing_em.is_finite() && self.block_spacing_em >= 0.0) {
            return invalid(format!(
                "block spacing {} must not be negative",
                self.block_spacing_em
            ));
        }
        if !self.contrast_lift.is_finite() {
            return invalid(format!("contrast lift {} is not finite", self.contrast_lift));
        }
        if self.default_output_name.trim().is_empty() {
            return invalid("default output name is empty".into());
        }
        Ok(())
    }
}
