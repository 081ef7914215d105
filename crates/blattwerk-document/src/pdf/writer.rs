// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — assemble finished page rasters into a PDF using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use blattwerk_core::PageSize;
use blattwerk_core::error::BlattwerkError;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::render::RenderedPage;
use crate::traits::OutputAssembler;

/// Builds a PDF with one full-bleed raster image per page.
pub struct PdfWriter {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl PdfWriter {
    pub fn new() -> Self {
        Self::with_title("Blattwerk Document")
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Create a PDF from page rasters, first slice element first.
    #[instrument(skip(self, pages), fields(page_count = pages.len()))]
    pub fn create_from_pages(
        &self,
        pages: &[RenderedPage],
        page_size: &PageSize,
    ) -> Result<Vec<u8>, BlattwerkError> {
        if pages.is_empty() {
            return Err(BlattwerkError::ExportFailed(
                "no pages to assemble".into(),
            ));
        }

        let title = self.title.as_str();
        let page_w = Mm(page_size.width_mm);
        let page_h = Mm(page_size.height_mm);
        let page_w_pt = page_w.into_pt().0;
        let page_h_pt = page_h.into_pt().0;

        info!(title, pages = pages.len(), "Assembling PDF");

        let mut doc = PdfDocument::new(title);
        let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(pages.len());

        for page in pages {
            let (img_width, img_height) = page.image.dimensions();
            if img_width == 0 || img_height == 0 {
                return Err(BlattwerkError::ExportFailed(format!(
                    "page {} has an empty raster",
                    page.number
                )));
            }

            let rgb = image::DynamicImage::ImageRgba8(page.image.clone()).to_rgb8();
            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: img_width as usize,
                height: img_height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            // Pick the DPI that makes the raster exactly page-wide, then
            // stretch vertically for any rounding left in the height.
            let dpi = img_width as f32 / (page_size.width_mm / 25.4);
            let native_h_pt = img_height as f32 / dpi * 72.0;
            let scale_y = page_h_pt / native_h_pt;

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: Some(1.0),
                    scale_y: Some(scale_y),
                    dpi: Some(dpi),
                    rotate: None,
                },
            }];

            debug!(
                page = page.number,
                dpi,
                page_w_pt,
                scale_y,
                "Raster placed on page"
            );
            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }

        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings while saving");
        }

        Ok(output)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputAssembler for PdfWriter {
    fn assemble(
        &self,
        pages: &[RenderedPage],
        page: &PageSize,
    ) -> blattwerk_core::error::Result<Vec<u8>> {
        self.create_from_pages(pages, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn page(number: usize, shade: u8) -> RenderedPage {
        RenderedPage::new(
            number,
            RgbaImage::from_pixel(40, 56, Rgba([shade, shade, shade, 255])),
        )
    }

    #[test]
    fn assembles_one_pdf_page_per_raster() {
        let pages = vec![page(1, 0), page(2, 128), page(3, 255)];
        let bytes = PdfWriter::new()
            .create_from_pages(&pages, &PageSize::A4)
            .expect("assemble");

        assert!(bytes.starts_with(b"%PDF"));
        let reader = crate::pdf::PdfReader::from_bytes(&bytes).expect("reload");
        assert_eq!(reader.page_count(), 3);
    }

    #[test]
    fn empty_page_list_is_export_failure() {
        let result = PdfWriter::new().create_from_pages(&[], &PageSize::A4);
        assert!(matches!(result, Err(BlattwerkError::ExportFailed(_))));
    }
}
