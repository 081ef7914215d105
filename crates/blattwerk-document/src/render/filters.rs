// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filter policy — how the style's opacity and contrast map onto pixel filters.

use blattwerk_core::{ComposerConfig, StyleParams};
use image::RgbaImage;

use crate::image::ImageProcessor;

/// Upper bound on the brightness offset added at high contrast.
const MAX_LIFT: f32 = 64.0;

/// Tunable mapping from style parameters to the content-layer filters.
///
/// Contrast stretches each channel around mid-grey, then adds a brightness
/// offset that grows with contrast so dark scans do not collapse to black.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterPolicy {
    /// Brightness offset per unit of contrast above 1.0.
    pub lift_slope: f32,
}

impl FilterPolicy {
    pub fn new(lift_slope: f32) -> Self {
        Self { lift_slope }
    }

    pub fn from_config(config: &ComposerConfig) -> Self {
        Self::new(config.contrast_lift)
    }

    /// Brightness offset for a contrast factor, in channel units.
    pub fn lift(&self, contrast: f32) -> f32 {
        (self.lift_slope * (contrast - 1.0).max(0.0)).clamp(0.0, MAX_LIFT)
    }

    /// Apply contrast, then opacity, to a content layer.
    pub fn apply(&self, layer: RgbaImage, style: &StyleParams) -> RgbaImage {
        let identity = style.contrast == 1.0 && style.opacity >= 1.0;
        if identity {
            return layer;
        }
        ImageProcessor::from_rgba(layer)
            .adjust_contrast(style.contrast, self.lift(style.contrast))
            .apply_opacity(style.opacity)
            .into_rgba()
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self::from_config(&ComposerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn lift_is_zero_at_or_below_unit_contrast() {
        let policy = FilterPolicy::new(24.0);
        assert_eq!(policy.lift(1.0), 0.0);
        assert_eq!(policy.lift(0.5), 0.0);
        assert!((policy.lift(1.5) - 12.0).abs() < 1e-4);
    }

    #[test]
    fn lift_is_capped() {
        let policy = FilterPolicy::new(24.0);
        assert_eq!(policy.lift(10.0), MAX_LIFT);
    }

    #[test]
    fn neutral_style_leaves_pixels_alone() {
        let layer = RgbaImage::from_pixel(2, 2, Rgba([40, 90, 200, 180]));
        let out = FilterPolicy::default().apply(layer.clone(), &StyleParams::default());
        assert_eq!(out, layer);
    }

    #[test]
    fn opacity_scales_alpha_but_not_colour() {
        let layer = RgbaImage::from_pixel(1, 1, Rgba([40, 90, 200, 200]));
        let style = StyleParams {
            opacity: 0.5,
            ..StyleParams::default()
        };
        let out = FilterPolicy::default().apply(layer, &style);
        let Rgba([r, g, b, a]) = *out.get_pixel(0, 0);
        assert_eq!((r, g, b), (40, 90, 200));
        assert_eq!(a, 100);
    }

    #[test]
    fn high_contrast_darkens_dark_and_brightens_light() {
        let mut layer = RgbaImage::new(2, 1);
        layer.put_pixel(0, 0, Rgba([60, 60, 60, 255]));
        layer.put_pixel(1, 0, Rgba([200, 200, 200, 255]));
        let style = StyleParams {
            contrast: 1.5,
            ..StyleParams::default()
        };
        let out = FilterPolicy::new(0.0).apply(layer, &style);
        assert!(out.get_pixel(0, 0).0[0] < 60);
        assert!(out.get_pixel(1, 0).0[0] > 200);
        assert_eq!(out.get_pixel(0, 0).0[3], 255);
    }
}
