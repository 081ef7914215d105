// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Full PDF rasteriser backed by the pdfium library (feature "pdfium").
//
// pdfium keeps thread-local state and is CPU-bound; callers in async code run
// it on a blocking thread.

use blattwerk_core::error::{BlattwerkError, Result};
use image::RgbaImage;
use pdfium_render::prelude::*;
use tracing::{debug, instrument};

use crate::traits::PdfRasterizer;

/// Renders any PDF page, vector or scanned, at the requested scale.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumRasterizer;

impl PdfiumRasterizer {
    fn bind() -> Pdfium {
        Pdfium::default()
    }
}

impl PdfRasterizer for PdfiumRasterizer {
    #[instrument(skip(self, pdf, each), fields(bytes_len = pdf.len()))]
    fn rasterize_pages(
        &self,
        pdf: &[u8],
        scale: f32,
        each: &mut dyn FnMut(usize, RgbaImage) -> Result<()>,
    ) -> Result<usize> {
        let pdfium = Self::bind();
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| BlattwerkError::DecodeError(format!("{:?}", e)))?;
        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);

        let mut count = 0;
        for (index, page) in document.pages().iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                BlattwerkError::DecodeError(format!("rasterising page {}: {:?}", index + 1, e))
            })?;
            let image = bitmap.as_image().into_rgba8();
            debug!(
                page = index + 1,
                width = image.width(),
                height = image.height(),
                "Rendered page"
            );
            each(index, image)?;
            count += 1;
        }
        Ok(count)
    }
}
