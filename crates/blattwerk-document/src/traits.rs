// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator seams for third-party conversion, rasterisation, and assembly.
//
// Each trait is narrow enough to be replaced by a fake in tests or by a
// different backend (e.g. pdfium instead of the embedded-image extractor).

use blattwerk_core::error::Result;
use blattwerk_core::{Block, PageSize};
use image::RgbaImage;

use crate::render::RenderedPage;

/// Turns a structured word document into ordered flow blocks.
pub trait DocumentConverter: Send + Sync {
    /// Convert document bytes. Block indices start at 0 and are contiguous.
    fn convert(&self, bytes: &[u8]) -> Result<Vec<Block>>;
}

/// Rasterises PDF pages one at a time.
pub trait PdfRasterizer: Send + Sync {
    /// Parse `pdf` once and render every page in order at `scale` pixels per
    /// PDF point. Each raster is handed to `each` with its 0-based index
    /// before the next page is rendered; an error from `each` stops the run.
    ///
    /// Returns the number of pages rendered.
    fn rasterize_pages(
        &self,
        pdf: &[u8],
        scale: f32,
        each: &mut dyn FnMut(usize, RgbaImage) -> Result<()>,
    ) -> Result<usize>;
}

/// Packs finished page rasters into an output document.
pub trait OutputAssembler: Send + Sync {
    /// Assemble pages in slice order; page 1 of the output is `pages[0]`.
    fn assemble(&self, pages: &[RenderedPage], page: &PageSize) -> Result<Vec<u8>>;

    /// MIME type of the assembled output.
    fn mime_type(&self) -> &'static str {
        "application/pdf"
    }
}
