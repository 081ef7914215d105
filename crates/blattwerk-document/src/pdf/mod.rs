// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading scanned pages and assembling output documents.

#[cfg(feature = "pdfium")]
pub mod pdfium;
pub mod reader;
pub mod writer;

#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRasterizer;
pub use reader::{EmbeddedImageRasterizer, PdfReader};
pub use writer::PdfWriter;
