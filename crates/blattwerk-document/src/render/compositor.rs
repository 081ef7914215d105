// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render compositor — background, framed content, filters, and (for editing
// views only) the Box chrome, composited into one raster per page.
//
// Back-to-front: white paper, template covering the page, then the content
// layer placed at its frame with contrast and opacity applied. The capture
// target never draws chrome, so preview and persisted output are identical.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::{
    Block, BlockContent, ComposerConfig, FrameBox, Page, PageContent, RasterBlock,
};
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use tiny_skia::Pixmap;
use tracing::{debug, instrument};

use super::RenderedPage;
use super::filters::FilterPolicy;
use super::glyphs::{GlyphPainter, pixmap_to_rgba};
use crate::document::{Content, Document};
use crate::image::ImageProcessor;
use crate::layout::{BlockLayout, Typesetter};

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: [u8; 4] = [0, 0, 0, 255];
const CHROME: Rgba<u8> = Rgba([37, 99, 235, 255]);

/// Dash and gap length of the Box border, in page pixels.
const DASH: f32 = 6.0;
/// Side of the square resize handle, in page pixels.
const HANDLE: f32 = 12.0;

/// Whether the output is for on-screen editing or for capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// Draws the Box border and resize handle on the primary page.
    Editing,
    /// Finished page content only.
    Capture,
}

/// Composites pages from a `Document`.
///
/// Clones share one background cache, so every page of an export reuses the
/// template scaled for the first.
#[derive(Clone)]
pub struct RenderCompositor {
    typesetter: Arc<Typesetter>,
    policy: FilterPolicy,
    scale: f32,
    background: Arc<Mutex<Option<CoveredTemplate>>>,
}

/// A template already cover-scaled to a raster size.
struct CoveredTemplate {
    // Weak keeps the source allocation pinned, so its address cannot be
    // reused by a later template while this entry exists.
    source: Weak<RgbaImage>,
    size: (u32, u32),
    image: Arc<RgbaImage>,
}

impl RenderCompositor {
    /// `scale` is raster pixels per page pixel.
    pub fn new(typesetter: Arc<Typesetter>, policy: FilterPolicy, scale: f32) -> Self {
        Self {
            typesetter,
            policy,
            scale,
            background: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_config(config: &ComposerConfig, typesetter: Arc<Typesetter>) -> Self {
        Self::new(
            typesetter,
            FilterPolicy::from_config(config),
            config.capture_scale,
        )
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Render a page for capture.
    pub fn render_page(&self, page: &Page, doc: &Document) -> Result<RenderedPage> {
        self.render(page, doc, RenderTarget::Capture)
    }

    /// Render a page for the given target.
    #[instrument(skip(self, page, doc), fields(page = page.number))]
    pub fn render(&self, page: &Page, doc: &Document, target: RenderTarget) -> Result<RenderedPage> {
        let page_size = doc.page_size();
        let (width, height) = page_size.raster_dimensions(self.scale);
        let mut canvas = RgbaImage::from_pixel(width, height, PAPER);

        if let Some(template) = doc.template() {
            let background = self.covered(&template.image, (width, height));
            imageops::overlay(&mut canvas, background.as_ref(), 0, 0);
        }

        let frame = page.resolve_frame(doc.frame(), page_size);
        if let Some(layer) = self.content_layer(page, doc, frame)? {
            let layer = self.policy.apply(layer, doc.style());
            imageops::overlay(
                &mut canvas,
                &layer,
                (frame.x * self.scale).round() as i64,
                (frame.y * self.scale).round() as i64,
            );
        }

        if target == RenderTarget::Editing && page.number == 1 && doc.is_gesture_editable() {
            self.draw_chrome(&mut canvas, frame);
        }

        debug!(width, height, "Page composited");
        Ok(RenderedPage::new(page.number, canvas))
    }

    /// The template cover-scaled to `size`, computed once per template and size.
    fn covered(&self, template: &Arc<RgbaImage>, size: (u32, u32)) -> Arc<RgbaImage> {
        let mut cache = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = cache.as_ref() {
            if entry.size == size && std::ptr::eq(entry.source.as_ptr(), Arc::as_ptr(template)) {
                return entry.image.clone();
            }
        }

        let image = Arc::new(
            ImageProcessor::from_rgba(template.as_ref().clone())
                .cover(size.0, size.1)
                .into_rgba(),
        );
        debug!(width = size.0, height = size.1, "Template scaled to page");
        *cache = Some(CoveredTemplate {
            source: Arc::downgrade(template),
            size,
            image: image.clone(),
        });
        image
    }

    // -- Content layers -------------------------------------------------------

    fn content_layer(&self, page: &Page, doc: &Document, frame: FrameBox) -> Result<Option<RgbaImage>> {
        match (&page.content, doc.content()) {
            (PageContent::Blank, _) => Ok(None),
            (PageContent::Flow(range), Content::Flow(blocks)) => {
                let slice = blocks.get(range.clone()).ok_or_else(|| {
                    BlattwerkError::ExportFailed(format!(
                        "page {} refers to blocks {:?} beyond the {} ingested",
                        page.number,
                        range,
                        blocks.len()
                    ))
                })?;
                self.flow_layer(slice, frame, doc.style().font_size).map(Some)
            }
            (PageContent::Scan(index), Content::Scan(blocks)) => {
                let block = blocks.get(*index).ok_or_else(|| {
                    BlattwerkError::ExportFailed(format!(
                        "page {} refers to missing raster {}",
                        page.number, index
                    ))
                })?;
                Ok(Some(self.scan_layer(block, frame)))
            }
            _ => Err(BlattwerkError::ExportFailed(format!(
                "page {} does not match the document's content",
                page.number
            ))),
        }
    }

    /// Typeset flow blocks top-down into a frame-sized transparent layer.
    fn flow_layer(&self, blocks: &[Block], frame: FrameBox, font_size: f32) -> Result<RgbaImage> {
        let s = self.scale;
        let (w, h) = scaled(frame, s);
        let mut pixmap = Pixmap::new(w, h).ok_or_else(|| {
            BlattwerkError::ExportFailed(format!("cannot allocate {}x{} text layer", w, h))
        })?;
        let painter = GlyphPainter::new(self.typesetter.typeface(), INK);
        let mut pictures: Vec<(RgbaImage, i64)> = Vec::new();

        let mut y = 0.0f32;
        for block in blocks {
            let laid = self.typesetter.layout(&block.content, frame.width, font_size);
            match &laid.layout {
                BlockLayout::Text {
                    lines,
                    font_px,
                    line_px,
                    ..
                } => {
                    let ascent = painter.ascent(*font_px);
                    let leading = (line_px - font_px) / 2.0;
                    for (i, line) in lines.iter().enumerate() {
                        let baseline = y + i as f32 * line_px + leading + ascent;
                        painter.paint_line(&mut pixmap, line, 0.0, baseline * s, font_px * s);
                    }
                }
                BlockLayout::Image { width, height } => {
                    if let BlockContent::Image(image) = &block.content {
                        let pw = (width * s).round().max(1.0) as u32;
                        let ph = (height * s).round().max(1.0) as u32;
                        let picture = ImageProcessor::from_rgba(image.as_ref().clone())
                            .resize_exact(pw, ph)
                            .into_rgba();
                        pictures.push((picture, (y * s).round() as i64));
                    }
                }
            }
            y += laid.height();
        }

        let mut layer = pixmap_to_rgba(&pixmap);
        for (picture, top) in &pictures {
            imageops::overlay(&mut layer, picture, 0, *top);
        }
        Ok(layer)
    }

    /// Contain-fit a page raster in its frame, centred.
    fn scan_layer(&self, block: &RasterBlock, frame: FrameBox) -> RgbaImage {
        let (w, h) = scaled(frame, self.scale);
        let fitted = ImageProcessor::from_rgba(block.image.as_ref().clone())
            .contain(w, h)
            .into_rgba();
        let mut layer = RgbaImage::new(w, h);
        let x = (w.saturating_sub(fitted.width()) / 2) as i64;
        let y = (h.saturating_sub(fitted.height()) / 2) as i64;
        imageops::overlay(&mut layer, &fitted, x, y);
        layer
    }

    // -- Chrome ---------------------------------------------------------------

    /// Dashed Box border plus a filled resize handle at the bottom-right corner.
    fn draw_chrome(&self, canvas: &mut RgbaImage, frame: FrameBox) {
        let s = self.scale;
        let (left, top) = (frame.x * s, frame.y * s);
        let (right, bottom) = ((frame.x + frame.width) * s, (frame.y + frame.height) * s);
        let dash = DASH * s;

        let edges = [
            ((left, top), (right, top)),
            ((right, top), (right, bottom)),
            ((right, bottom), (left, bottom)),
            ((left, bottom), (left, top)),
        ];
        for (start, end) in edges {
            let length = ((end.0 - start.0).powi(2) + (end.1 - start.1).powi(2)).sqrt();
            if length <= 0.0 {
                continue;
            }
            let (ux, uy) = ((end.0 - start.0) / length, (end.1 - start.1) / length);
            let mut t = 0.0f32;
            while t < length {
                let t_end = (t + dash).min(length);
                draw_line_segment_mut(
                    canvas,
                    (start.0 + ux * t, start.1 + uy * t),
                    (start.0 + ux * t_end, start.1 + uy * t_end),
                    CHROME,
                );
                t += dash * 2.0;
            }
        }

        let side = (HANDLE * s).round().max(1.0) as u32;
        let handle = Rect::at(
            (right - side as f32 / 2.0).round() as i32,
            (bottom - side as f32 / 2.0).round() as i32,
        )
        .of_size(side, side);
        draw_filled_rect_mut(canvas, handle, CHROME);
    }
}

fn scaled(frame: FrameBox, scale: f32) -> (u32, u32) {
    (
        (frame.width * scale).round().max(1.0) as u32,
        (frame.height * scale).round().max(1.0) as u32,
    )
}
