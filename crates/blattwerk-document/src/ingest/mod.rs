// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content ingestion — raw file bytes to a normalized block sequence.
//
// Flow kinds (word documents, plain text) become ordered text/image blocks.
// Scan kinds (PDF, images used as content) become one transparent-backed
// raster per source page. PDF pages are processed strictly one at a time so
// at most one decoded page is alive alongside the finished rasters.

pub mod docx;
pub mod text;

use std::sync::Arc;

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::{ComposerConfig, ContentKind, IngestResult, RasterBlock};
use image::RgbaImage;
use tracing::{debug, info, instrument};

use crate::image::ImageProcessor;
use crate::pdf::EmbeddedImageRasterizer;
use crate::traits::{DocumentConverter, PdfRasterizer};

pub use docx::DocxConverter;
pub use text::text_blocks;

/// Rasterisation and transparency settings for scan-mode content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanPolicy {
    /// PDF points to raster pixels.
    pub oversampling: f32,
    /// Pixels with R, G and B all above this become transparent.
    pub near_white_threshold: u8,
}

impl ScanPolicy {
    pub fn from_config(config: &ComposerConfig) -> Self {
        Self {
            oversampling: config.oversampling,
            near_white_threshold: config.near_white_threshold,
        }
    }
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self::from_config(&ComposerConfig::default())
    }
}

/// Converts raw content into blocks using pluggable collaborators.
#[derive(Clone)]
pub struct ContentIngestor {
    converter: Arc<dyn DocumentConverter>,
    rasterizer: Arc<dyn PdfRasterizer>,
    policy: ScanPolicy,
}

impl ContentIngestor {
    pub fn new(
        converter: Arc<dyn DocumentConverter>,
        rasterizer: Arc<dyn PdfRasterizer>,
        policy: ScanPolicy,
    ) -> Self {
        Self {
            converter,
            rasterizer,
            policy,
        }
    }

    /// Ingestor with the default collaborators for this build.
    pub fn from_config(config: &ComposerConfig) -> Self {
        Self::new(
            Arc::new(DocxConverter),
            default_rasterizer(),
            ScanPolicy::from_config(config),
        )
    }

    pub fn policy(&self) -> &ScanPolicy {
        &self.policy
    }

    /// Normalize `bytes` of the declared `kind`.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub fn ingest(&self, bytes: &[u8], kind: ContentKind) -> Result<IngestResult> {
        let result = match kind {
            ContentKind::PlainText => IngestResult::Flow {
                blocks: text_blocks(bytes)?,
            },
            ContentKind::WordDocument => IngestResult::Flow {
                blocks: self.converter.convert(bytes)?,
            },
            ContentKind::Pdf => IngestResult::Scan {
                blocks: self.rasterize_pdf(bytes)?,
            },
            ContentKind::Image => {
                let image = ImageProcessor::from_bytes(bytes)?
                    .knock_out_near_white(self.policy.near_white_threshold)
                    .into_rgba();
                IngestResult::Scan {
                    blocks: vec![RasterBlock::new(0, image)],
                }
            }
        };

        info!(mode = ?result.mode(), blocks = result.len(), "Content ingested");
        Ok(result)
    }

    /// Decode a background template. Only raster images are accepted.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub fn load_template(&self, bytes: &[u8], kind: ContentKind) -> Result<RgbaImage> {
        if kind != ContentKind::Image {
            return Err(BlattwerkError::UnsupportedFormat(format!(
                "template must be a PNG or JPEG image, got {}",
                kind.mime_type()
            )));
        }
        let image = ImageProcessor::from_bytes(bytes)?.into_rgba();
        debug!(width = image.width(), height = image.height(), "Template decoded");
        Ok(image)
    }

    fn rasterize_pdf(&self, pdf: &[u8]) -> Result<Vec<RasterBlock>> {
        let threshold = self.policy.near_white_threshold;
        let mut blocks = Vec::new();

        self.rasterizer
            .rasterize_pages(pdf, self.policy.oversampling, &mut |index, page| {
                let page = ImageProcessor::from_rgba(page)
                    .knock_out_near_white(threshold)
                    .into_rgba();
                debug!(
                    page = index + 1,
                    width = page.width(),
                    height = page.height(),
                    "Page rasterised"
                );
                blocks.push(RasterBlock::new(index, page));
                Ok(())
            })?;

        Ok(blocks)
    }
}

#[cfg(feature = "pdfium")]
fn default_rasterizer() -> Arc<dyn PdfRasterizer> {
    Arc::new(crate::pdf::PdfiumRasterizer)
}

#[cfg(not(feature = "pdfium"))]
fn default_rasterizer() -> Arc<dyn PdfRasterizer> {
    Arc::new(EmbeddedImageRasterizer)
}

/// Pick the ingestor's default rasterizer explicitly (e.g. for tests).
pub fn embedded_rasterizer() -> Arc<dyn PdfRasterizer> {
    Arc::new(EmbeddedImageRasterizer)
}
