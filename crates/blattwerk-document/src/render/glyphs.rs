// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph painter — fills text lines into a `tiny-skia` pixmap.
//
// Loaded typefaces paint real outlines from `ttf-parser`. The fallback metric
// paints simple placeholder shapes at the same advances the typesetter
// measured with.

use image::{Rgba, RgbaImage};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};
use ttf_parser::OutlineBuilder;

use crate::layout::Typeface;
use crate::layout::typeface::{FALLBACK_ADVANCE_EM, Metrics};

/// Paints lines of text with one typeface and colour.
///
/// The face is parsed once, when the painter is created, and reused for
/// every line it paints.
pub struct GlyphPainter<'a> {
    metrics: Metrics<'a>,
    paint: Paint<'static>,
}

impl<'a> GlyphPainter<'a> {
    pub fn new(typeface: &'a Typeface, color: [u8; 4]) -> Self {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
        paint.anti_alias = true;
        Self {
            metrics: typeface.metrics(),
            paint,
        }
    }

    /// Distance from the top of a line box to the baseline.
    pub fn ascent(&self, font_px: f32) -> f32 {
        self.metrics.ascent(font_px)
    }

    /// Paint `text` with its left edge at `x` and baseline at `baseline`.
    pub fn paint_line(&self, pixmap: &mut Pixmap, text: &str, x: f32, baseline: f32, font_px: f32) {
        let mut builder = PathBuilder::new();
        match self.metrics.face() {
            Some(face) => {
                let scale = font_px / face.units_per_em() as f32;
                let mut pen_x = x;
                for ch in text.chars() {
                    match face.glyph_index(ch) {
                        Some(gid) => {
                            let mut outline = GlyphOutline {
                                builder: &mut builder,
                                origin_x: pen_x,
                                baseline,
                                scale,
                            };
                            face.outline_glyph(gid, &mut outline);
                            let advance = face
                                .glyph_hor_advance(gid)
                                .map(|adv| adv as f32 * scale)
                                .unwrap_or(FALLBACK_ADVANCE_EM * font_px);
                            pen_x += advance;
                        }
                        None => {
                            push_placeholder(&mut builder, ch, pen_x, baseline, font_px);
                            pen_x += FALLBACK_ADVANCE_EM * font_px;
                        }
                    }
                }
            }
            None => {
                let mut pen_x = x;
                for ch in text.chars() {
                    push_placeholder(&mut builder, ch, pen_x, baseline, font_px);
                    pen_x += FALLBACK_ADVANCE_EM * font_px;
                }
            }
        }

        if let Some(path) = builder.finish() {
            pixmap.fill_path(
                &path,
                &self.paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }
}

/// Adapts `ttf-parser` outline callbacks (font units, y up) to pixel space (y down).
struct GlyphOutline<'b> {
    builder: &'b mut PathBuilder,
    origin_x: f32,
    baseline: f32,
    scale: f32,
}

impl GlyphOutline<'_> {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.baseline - y * self.scale)
    }
}

impl OutlineBuilder for GlyphOutline<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Block shape standing in for a glyph: cap height for capitals and digits,
/// x-height for lower case, nothing for whitespace.
fn push_placeholder(builder: &mut PathBuilder, ch: char, x: f32, baseline: f32, font_px: f32) {
    if ch.is_whitespace() || ch.is_control() {
        return;
    }
    let height_em = if ch.is_uppercase() || ch.is_ascii_digit() {
        0.7
    } else if ch.is_lowercase() {
        0.5
    } else {
        0.6
    };
    let height = height_em * font_px;
    let width = FALLBACK_ADVANCE_EM * font_px * 0.8;
    if let Some(rect) = Rect::from_xywh(x, baseline - height, width, height) {
        builder.push_rect(rect);
    }
}

/// Copy a premultiplied pixmap into a straight-alpha RGBA image.
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image
}
