// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-independent block model and the pages derived from it.
//
// Blocks are created once at ingestion and never mutated; pages only reference
// contiguous index ranges into the block sequence.

use std::ops::Range;
use std::sync::Arc;

use image::RgbaImage;

use crate::types::{FrameBox, IngestMode, PageSize};

/// Semantic role of a text block, used to scale its font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextRole {
    #[default]
    Body,
    /// Heading level 1..=6.
    Heading(u8),
    ListItem,
}

impl TextRole {
    /// Font size multiplier relative to the document font size.
    pub fn font_scale(&self) -> f32 {
        match self {
            Self::Heading(1) => 2.0,
            Self::Heading(2) => 1.5,
            Self::Heading(3) => 1.17,
            Self::Heading(5) => 0.83,
            Self::Heading(6) => 0.67,
            Self::Heading(_) | Self::Body | Self::ListItem => 1.0,
        }
    }
}

/// Content carried by a flow block.
#[derive(Debug, Clone)]
pub enum BlockContent {
    Text { text: String, role: TextRole },
    /// Inline picture; rendered at most frame-wide, aspect preserved.
    Image(Arc<RgbaImage>),
}

impl BlockContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            role: TextRole::Body,
        }
    }
}

/// An atomic, ordered unit of flowable content.
#[derive(Debug, Clone)]
pub struct Block {
    /// Stable position in the ingested sequence.
    pub index: usize,
    pub content: BlockContent,
}

impl Block {
    pub fn new(index: usize, content: BlockContent) -> Self {
        Self { index, content }
    }
}

/// A pre-rendered whole-page image (scan mode).
#[derive(Debug, Clone)]
pub struct RasterBlock {
    pub index: usize,
    pub image: Arc<RgbaImage>,
}

impl RasterBlock {
    pub fn new(index: usize, image: RgbaImage) -> Self {
        Self {
            index,
            image: Arc::new(image),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Normalized output of content ingestion.
#[derive(Debug, Clone)]
pub enum IngestResult {
    Flow { blocks: Vec<Block> },
    Scan { blocks: Vec<RasterBlock> },
}

impl IngestResult {
    pub fn mode(&self) -> IngestMode {
        match self {
            Self::Flow { .. } => IngestMode::Flow,
            Self::Scan { .. } => IngestMode::Scan,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Flow { blocks } => blocks.len(),
            Self::Scan { blocks } => blocks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which frame governs where a page's content renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFrame {
    /// The user-editable primary Box.
    Primary,
    /// Read-only reuse of the primary Box's geometry.
    Mirror,
    /// The full page bounds (scan mode).
    FullPage,
}

/// What a page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    /// Contiguous range of flow block indices.
    Flow(Range<usize>),
    /// Index of the single raster block on this page.
    Scan(usize),
    /// Nothing but the background.
    Blank,
}

/// One output page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based output page number.
    pub number: usize,
    pub content: PageContent,
    pub frame: PageFrame,
}

impl Page {
    pub fn blank() -> Self {
        Self {
            number: 1,
            content: PageContent::Blank,
            frame: PageFrame::Primary,
        }
    }

    /// Resolve the concrete frame geometry for this page.
    pub fn resolve_frame(&self, primary: FrameBox, page: &PageSize) -> FrameBox {
        match self.frame {
            PageFrame::Primary | PageFrame::Mirror => primary,
            PageFrame::FullPage => page.bounds(),
        }
    }

    /// Flow block indices on this page (empty for scan and blank pages).
    pub fn block_range(&self) -> Range<usize> {
        match &self.content {
            PageContent::Flow(range) => range.clone(),
            PageContent::Scan(_) | PageContent::Blank => 0..0,
        }
    }
}
