// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — cover/contain scaling, near-white knock-out, contrast and
// opacity filters. Operates on in-memory images using the `image` and
// `imageproc` crates.

use blattwerk_core::error::BlattwerkError;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::map::map_colors;
use tracing::{debug, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// All operations consume `self` and return a new `ImageProcessor` wrapping
/// the transformed image, enabling method chaining.
///
/// ```ignore
/// let layer = ImageProcessor::from_bytes(&png)?
///     .contain(670, 1000)
///     .adjust_contrast(1.3, 7.2)
///     .apply_opacity(0.8)
///     .into_rgba();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes (JPEG, PNG).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, BlattwerkError> {
        let img = image::load_from_memory(data).map_err(|err| {
            BlattwerkError::DecodeError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an RGBA buffer.
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the image as RGBA.
    pub fn into_rgba(self) -> RgbaImage {
        self.image.into_rgba8()
    }

    // -- Scaling ---------------------------------------------------------------

    /// Scale to cover `width` x `height` entirely, centre-cropping the overflow.
    #[instrument(skip(self), fields(width, height))]
    pub fn cover(self, width: u32, height: u32) -> Self {
        if self.image.width() == width && self.image.height() == height {
            return self;
        }
        let covered =
            self.image
                .resize_to_fill(width, height, image::imageops::FilterType::Lanczos3);
        Self { image: covered }
    }

    /// Scale to fit within `max_width` x `max_height`, preserving aspect ratio.
    /// Upscales small images as well as downscaling large ones.
    #[instrument(skip(self), fields(max_width, max_height))]
    pub fn contain(self, max_width: u32, max_height: u32) -> Self {
        let fitted = self.image.resize(
            max_width.max(1),
            max_height.max(1),
            image::imageops::FilterType::Lanczos3,
        );
        debug!(
            new_w = fitted.width(),
            new_h = fitted.height(),
            "Contain-fit complete"
        );
        Self { image: fitted }
    }

    /// Resize the image to exactly `width` x `height`, ignoring aspect ratio.
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        if self.image.width() == width && self.image.height() == height {
            return self;
        }
        let resized = self.image.resize_exact(
            width.max(1),
            height.max(1),
            image::imageops::FilterType::Lanczos3,
        );
        Self { image: resized }
    }

    // -- Pixel filters ----------------------------------------------------------

    /// Make every pixel whose R, G and B all exceed `threshold` fully transparent.
    ///
    /// Lets a background template show through the white paper of a scan.
    #[instrument(skip(self), fields(threshold))]
    pub fn knock_out_near_white(self, threshold: u8) -> Self {
        let rgba = self.image.into_rgba8();
        let knocked = map_colors(&rgba, |pixel: Rgba<u8>| {
            let Rgba([r, g, b, a]) = pixel;
            if r > threshold && g > threshold && b > threshold {
                Rgba([r, g, b, 0])
            } else {
                Rgba([r, g, b, a])
            }
        });
        Self {
            image: DynamicImage::ImageRgba8(knocked),
        }
    }

    /// Stretch channels around mid-grey by `factor`, then add `lift`.
    ///
    /// Alpha is left untouched. `factor` 1.0 with `lift` 0.0 is a no-op.
    #[instrument(skip(self), fields(factor, lift))]
    pub fn adjust_contrast(self, factor: f32, lift: f32) -> Self {
        if factor == 1.0 && lift == 0.0 {
            return self;
        }
        let rgba = self.image.into_rgba8();
        let contrasted = map_colors(&rgba, |pixel: Rgba<u8>| {
            let Rgba([r, g, b, a]) = pixel;
            let adjust = |channel: u8| -> u8 {
                let val = factor * (channel as f32 - 128.0) + 128.0 + lift;
                val.round().clamp(0.0, 255.0) as u8
            };
            Rgba([adjust(r), adjust(g), adjust(b), a])
        });
        Self {
            image: DynamicImage::ImageRgba8(contrasted),
        }
    }

    /// Multiply every pixel's alpha by `opacity` (clamped to 0..=1).
    #[instrument(skip(self), fields(opacity))]
    pub fn apply_opacity(self, opacity: f32) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity == 1.0 {
            return self;
        }
        let rgba = self.image.into_rgba8();
        let faded = map_colors(&rgba, |pixel: Rgba<u8>| {
            let Rgba([r, g, b, a]) = pixel;
            Rgba([r, g, b, (a as f32 * opacity).round() as u8])
        });
        Self {
            image: DynamicImage::ImageRgba8(faded),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, BlattwerkError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(
    image: &DynamicImage,
    format: ImageFormat,
) -> Result<Vec<u8>, BlattwerkError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        BlattwerkError::ExportFailed(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, pixel: [u8; 4]) -> ImageProcessor {
        ImageProcessor::from_rgba(RgbaImage::from_pixel(width, height, Rgba(pixel)))
    }

    #[test]
    fn knock_out_only_clears_pixels_strictly_above_threshold() {
        let mut img = RgbaImage::from_pixel(3, 1, Rgba([255, 255, 255, 255]));
        img.put_pixel(1, 0, Rgba([235, 240, 250, 255]));
        img.put_pixel(2, 0, Rgba([10, 10, 10, 255]));

        let out = ImageProcessor::from_rgba(img)
            .knock_out_near_white(235)
            .into_rgba();

        assert_eq!(out.get_pixel(0, 0).0[3], 0);
        // One channel equals the threshold, so the pixel stays opaque.
        assert_eq!(out.get_pixel(1, 0).0[3], 255);
        assert_eq!(out.get_pixel(2, 0).0[3], 255);
    }

    #[test]
    fn identity_contrast_is_noop() {
        let out = solid(2, 2, [40, 128, 200, 255])
            .adjust_contrast(1.0, 0.0)
            .into_rgba();
        assert_eq!(out.get_pixel(0, 0).0, [40, 128, 200, 255]);
    }

    #[test]
    fn contrast_darkens_darks_and_lift_offsets() {
        let out = solid(1, 1, [100, 128, 200, 77])
            .adjust_contrast(2.0, 10.0)
            .into_rgba();
        // 2 * (100 - 128) + 128 + 10 = 82; 128 + 10 = 138; 2 * 72 + 138 = 282 → 255
        assert_eq!(out.get_pixel(0, 0).0, [82, 138, 255, 77]);
    }

    #[test]
    fn opacity_scales_alpha() {
        let out = solid(1, 1, [0, 0, 0, 200]).apply_opacity(0.5).into_rgba();
        assert_eq!(out.get_pixel(0, 0).0[3], 100);
    }

    #[test]
    fn cover_fills_exact_dimensions() {
        let out = solid(400, 100, [1, 2, 3, 255]).cover(100, 100);
        assert_eq!((out.width(), out.height()), (100, 100));
    }

    #[test]
    fn contain_preserves_aspect_ratio() {
        let out = solid(200, 100, [1, 2, 3, 255]).contain(100, 100);
        assert_eq!((out.width(), out.height()), (100, 50));
    }

    #[test]
    fn garbage_bytes_are_decode_errors() {
        let result = ImageProcessor::from_bytes(b"definitely not an image");
        assert!(matches!(result, Err(BlattwerkError::DecodeError(_))));
    }
}
