// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blattwerk-document — the page-composition engine.
//
// Ingests PDF, word document, plain text, and image content into a block model,
// paginates flow blocks into the content Box, tracks the Box's drag/resize
// geometry, and composites template + content + filters into page rasters that
// are assembled into a PDF.

pub mod document;
pub mod image;
pub mod ingest;
pub mod layout;
pub mod overlay;
pub mod pdf;
pub mod render;
pub mod traits;

// Re-export the primary types so callers can use `blattwerk_document::Document` etc.
pub use document::{Content, Document, Template};
pub use self::image::ImageProcessor;
pub use ingest::{ContentIngestor, DocxConverter, ScanPolicy};
pub use layout::{TextMeasure, Typeface, Typesetter, reflow};
pub use overlay::{GestureKind, OverlayGeometry};
pub use pdf::{EmbeddedImageRasterizer, PdfReader, PdfWriter};
pub use render::{FilterPolicy, RenderCompositor, RenderTarget, RenderedPage};
pub use traits::{DocumentConverter, OutputAssembler, PdfRasterizer};

#[cfg(feature = "pdfium")]
pub use pdf::PdfiumRasterizer;
