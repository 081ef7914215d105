// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render module — page compositing, glyph painting, and pixel filter policy.

pub mod compositor;
pub mod filters;
pub mod glyphs;

pub use compositor::{RenderCompositor, RenderTarget};
pub use filters::FilterPolicy;
pub use glyphs::GlyphPainter;

use image::RgbaImage;
use sha2::{Digest, Sha256};

/// A finalised page raster, ready for assembly.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 1-based output page number.
    pub number: usize,
    pub image: RgbaImage,
    /// SHA-256 (hex) of the raster dimensions and pixels.
    pub digest: String,
}

impl RenderedPage {
    pub fn new(number: usize, image: RgbaImage) -> Self {
        let digest = pixel_digest(&image);
        Self {
            number,
            image,
            digest,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

fn pixel_digest(image: &RgbaImage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image.width().to_le_bytes());
    hasher.update(image.height().to_le_bytes());
    hasher.update(image.as_raw());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn digest_tracks_pixels_and_shape() {
        let a = RenderedPage::new(1, RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255])));
        let b = RenderedPage::new(2, RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255])));
        let c = RenderedPage::new(1, RgbaImage::from_pixel(2, 8, Rgba([1, 2, 3, 255])));

        assert_eq!(a.digest, b.digest);
        assert_ne!(a.digest, c.digest);
        assert_eq!(a.digest.len(), 64);
    }
}
