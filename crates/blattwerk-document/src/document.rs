// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document — the aggregate threaded through ingestion, pagination, and render.
//
// Holds the two file slots (background template, content), the style, the
// primary Box, and the derived page list. In flow mode the pages are
// recomputed from scratch whenever the font size or the Box's width/height
// changes; in scan mode they are fixed at ingestion.

use std::sync::Arc;

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::{
    Block, ComposerConfig, DocumentId, FrameBox, IngestMode, IngestResult, Page, PageSize,
    Point, RasterBlock, StyleParams,
};
use image::RgbaImage;
use tracing::{debug, info};

use crate::layout::{TextMeasure, reflow, scan_pages};
use crate::overlay::{GestureKind, OverlayGeometry};

/// Background raster shown behind the content on every page.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: Option<String>,
    pub image: Arc<RgbaImage>,
}

/// The ingested content slot.
#[derive(Debug, Clone, Default)]
pub enum Content {
    #[default]
    Empty,
    Flow(Arc<[Block]>),
    Scan(Arc<[RasterBlock]>),
}

impl Content {
    pub fn mode(&self) -> Option<IngestMode> {
        match self {
            Content::Empty => None,
            Content::Flow(_) => Some(IngestMode::Flow),
            Content::Scan(_) => Some(IngestMode::Scan),
        }
    }
}

/// Inputs the current flow pages were computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LayoutKey {
    font_size: f32,
    width: f32,
    height: f32,
}

/// One composition: template, content, style, Box, and pages.
#[derive(Clone)]
pub struct Document {
    id: DocumentId,
    page_size: PageSize,
    template: Option<Template>,
    style: StyleParams,
    content: Content,
    content_name: Option<String>,
    pages: Vec<Page>,
    overlay: OverlayGeometry,
    measure: Arc<dyn TextMeasure>,
    paginated_for: Option<LayoutKey>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("template", &self.template.as_ref().map(|t| &t.name))
            .field("style", &self.style)
            .field("mode", &self.content.mode())
            .field("pages", &self.pages.len())
            .field("frame", &self.overlay.frame())
            .finish()
    }
}

impl Document {
    // -- Construction ---------------------------------------------------------

    /// A fresh document with no template and no content.
    pub fn new(config: &ComposerConfig, measure: Arc<dyn TextMeasure>) -> Self {
        Self {
            id: DocumentId::new(),
            page_size: config.page,
            template: None,
            style: config.style,
            content: Content::Empty,
            content_name: None,
            pages: Vec::new(),
            overlay: OverlayGeometry::new(config.initial_box, config.min_box),
            measure,
            paginated_for: None,
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn page_size(&self) -> &PageSize {
        &self.page_size
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn style(&self) -> &StyleParams {
        &self.style
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn content_name(&self) -> Option<&str> {
        self.content_name.as_deref()
    }

    pub fn mode(&self) -> Option<IngestMode> {
        self.content.mode()
    }

    /// The primary Box.
    pub fn frame(&self) -> FrameBox {
        self.overlay.frame()
    }

    pub fn overlay(&self) -> &OverlayGeometry {
        &self.overlay
    }

    pub fn measure(&self) -> &dyn TextMeasure {
        self.measure.as_ref()
    }

    /// Pages derived from the current content. Empty when there is no content.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Pages to export: the content pages, or one explicit blank page so a
    /// template-only document still produces output.
    pub fn output_pages(&self) -> Vec<Page> {
        if self.pages.is_empty() {
            vec![Page::blank()]
        } else {
            self.pages.clone()
        }
    }

    // -- Slots ----------------------------------------------------------------

    pub fn set_template(&mut self, template: Template) {
        info!(
            name = ?template.name,
            width = template.image.width(),
            height = template.image.height(),
            "Template set"
        );
        self.template = Some(template);
    }

    /// Replace the content slot wholesale with freshly ingested blocks.
    pub fn apply_ingest(&mut self, result: IngestResult, name: Option<String>) {
        self.content = match result {
            IngestResult::Flow { blocks } => Content::Flow(blocks.into()),
            IngestResult::Scan { blocks } => Content::Scan(blocks.into()),
        };
        self.content_name = name;
        self.paginated_for = None;

        if let Content::Scan(blocks) = &self.content {
            // Scan pages own the full page; any gesture in progress is moot.
            self.pages = scan_pages(blocks);
            self.overlay.end_gesture();
        } else {
            self.repaginate();
        }
        info!(mode = ?self.mode(), pages = self.pages.len(), "Content applied");
    }

    // -- Style ----------------------------------------------------------------

    /// Change the font size; flow pages are recomputed, scan pages are not.
    pub fn set_font_size(&mut self, font_size: f32) -> Result<()> {
        if !(font_size.is_finite() && font_size > 0.0) {
            return Err(BlattwerkError::InvalidConfig(format!(
                "font size {} must be positive",
                font_size
            )));
        }
        self.style.font_size = font_size;
        self.repaginate();
        Ok(())
    }

    pub fn set_opacity(&mut self, opacity: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(BlattwerkError::InvalidConfig(format!(
                "opacity {} outside [0, 1]",
                opacity
            )));
        }
        self.style.opacity = opacity;
        Ok(())
    }

    pub fn set_contrast(&mut self, contrast: f32) -> Result<()> {
        if !(contrast.is_finite() && contrast >= 0.0) {
            return Err(BlattwerkError::InvalidConfig(format!(
                "contrast {} must not be negative",
                contrast
            )));
        }
        self.style.contrast = contrast;
        Ok(())
    }

    // -- Geometry -------------------------------------------------------------

    /// Whether the primary Box accepts gestures (never in scan mode).
    pub fn is_gesture_editable(&self) -> bool {
        self.overlay.is_enabled() && self.mode() != Some(IngestMode::Scan)
    }

    pub fn begin_gesture(&mut self, kind: GestureKind, origin: Point) -> bool {
        if self.mode() == Some(IngestMode::Scan) {
            debug!("Gesture refused: scan pages are full-frame");
            return false;
        }
        let snapshot = self.overlay.frame();
        self.overlay.begin_gesture(kind, origin, snapshot)
    }

    pub fn update_gesture(&mut self, current: Point) -> Option<FrameBox> {
        let frame = self.overlay.update_gesture(current)?;
        self.repaginate();
        Some(frame)
    }

    pub fn end_gesture(&mut self) {
        self.overlay.end_gesture();
    }

    /// Centre the Box on the page.
    pub fn center(&mut self) -> FrameBox {
        let (w, h) = (self.page_size.width(), self.page_size.height());
        self.overlay.center(w, h)
    }

    /// Explicit geometry override (non-interactive entry point).
    pub fn set_frame(&mut self, frame: FrameBox) -> FrameBox {
        let frame = self.overlay.set_frame(frame);
        self.repaginate();
        frame
    }

    pub fn set_geometry_enabled(&mut self, enabled: bool) {
        self.overlay.set_enabled(enabled);
    }

    // -- Pagination -----------------------------------------------------------

    /// Recompute pages if any pagination input changed since the last pass.
    ///
    /// Depends on font size and Box width/height only, never on x/y.
    fn repaginate(&mut self) {
        match &self.content {
            Content::Empty => {
                self.pages.clear();
                self.paginated_for = None;
            }
            // Fixed at ingestion.
            Content::Scan(_) => {}
            Content::Flow(blocks) => {
                let frame = self.overlay.frame();
                let key = LayoutKey {
                    font_size: self.style.font_size,
                    width: frame.width,
                    height: frame.height,
                };
                if self.paginated_for == Some(key) {
                    return;
                }
                self.pages = reflow(
                    blocks,
                    key.width,
                    key.height,
                    key.font_size,
                    self.measure.as_ref(),
                );
                self.paginated_for = Some(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blattwerk_core::{BlockContent, PageContent, PageFrame};

    /// 20 px per block per 10 px of font, independent of width.
    struct FixedMeasure;

    impl TextMeasure for FixedMeasure {
        fn measure(&self, _content: &BlockContent, _width: f32, font_size: f32) -> f32 {
            font_size * 2.0
        }
    }

    fn document() -> Document {
        Document::new(&ComposerConfig::default(), Arc::new(FixedMeasure))
    }

    fn flow(n: usize) -> IngestResult {
        IngestResult::Flow {
            blocks: (0..n)
                .map(|i| Block::new(i, BlockContent::text(format!("line {}", i))))
                .collect(),
        }
    }

    fn scan(n: usize) -> IngestResult {
        IngestResult::Scan {
            blocks: (0..n)
                .map(|i| RasterBlock::new(i, RgbaImage::new(8, 8)))
                .collect(),
        }
    }

    #[test]
    fn fresh_document_exports_one_blank_page() {
        let doc = document();
        assert!(doc.pages().is_empty());
        let out = doc.output_pages();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content, PageContent::Blank);
    }

    #[test]
    fn flow_content_paginates_into_box() {
        let mut doc = document();
        // Box is 1000 high; 16 px font makes each block 32 px, so 31 per page.
        doc.apply_ingest(flow(100), Some("notes.txt".into()));
        assert_eq!(doc.pages().len(), 4);
        assert_eq!(doc.pages()[0].frame, PageFrame::Primary);
        assert_eq!(doc.pages()[3].frame, PageFrame::Mirror);
        assert_eq!(doc.content_name(), Some("notes.txt"));
    }

    #[test]
    fn font_change_repaginates_flow() {
        let mut doc = document();
        doc.apply_ingest(flow(100), None);
        let before = doc.pages().len();
        doc.set_font_size(32.0).expect("valid font size");
        assert!(doc.pages().len() > before);
    }

    #[test]
    fn resize_repaginates_but_drag_does_not() {
        let mut doc = document();
        doc.apply_ingest(flow(100), None);
        let before = doc.pages().to_vec();

        doc.begin_gesture(GestureKind::Drag, Point::new(0.0, 0.0));
        doc.update_gesture(Point::new(20.0, 30.0));
        doc.end_gesture();
        assert_eq!(doc.pages(), before.as_slice());

        doc.begin_gesture(GestureKind::Resize, Point::new(0.0, 0.0));
        doc.update_gesture(Point::new(0.0, -500.0));
        doc.end_gesture();
        assert!(doc.pages().len() > before.len());
    }

    #[test]
    fn scan_pages_ignore_font_and_gestures() {
        let mut doc = document();
        doc.apply_ingest(scan(3), Some("scan.pdf".into()));
        let before = doc.pages().to_vec();

        doc.set_font_size(40.0).expect("valid font size");
        assert_eq!(doc.pages(), before.as_slice());
        assert!(!doc.begin_gesture(GestureKind::Resize, Point::new(0.0, 0.0)));
        assert!(!doc.is_gesture_editable());
        assert_eq!(before.len(), 3);
    }

    #[test]
    fn new_content_replaces_old_pages_and_keeps_template() {
        let mut doc = document();
        doc.set_template(Template {
            name: Some("bg.png".into()),
            image: Arc::new(RgbaImage::new(4, 4)),
        });
        doc.apply_ingest(scan(2), None);
        doc.apply_ingest(flow(1), None);

        assert_eq!(doc.mode(), Some(IngestMode::Flow));
        assert_eq!(doc.pages().len(), 1);
        assert!(doc.template().is_some());
    }

    #[test]
    fn invalid_style_values_are_rejected_without_change() {
        let mut doc = document();
        assert!(doc.set_font_size(0.0).is_err());
        assert!(doc.set_opacity(1.5).is_err());
        assert!(doc.set_contrast(-1.0).is_err());
        assert_eq!(*doc.style(), StyleParams::default());
    }

    #[test]
    fn center_uses_page_bounds() {
        let mut doc = document();
        let frame = doc.center();
        assert_eq!((frame.x, frame.y), (62.0, 61.5));
    }

    #[test]
    fn frame_override_is_refused_while_geometry_is_disabled() {
        let mut doc = document();
        doc.apply_ingest(flow(100), None);
        let frame = doc.frame();
        let pages = doc.pages().to_vec();

        doc.set_geometry_enabled(false);
        assert_eq!(doc.set_frame(FrameBox::new(0.0, 0.0, 300.0, 300.0)), frame);
        assert_eq!(doc.center(), frame);
        assert_eq!(doc.frame(), frame);
        assert_eq!(doc.pages(), pages.as_slice());
    }
}
