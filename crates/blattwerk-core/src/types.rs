// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core value types for the Blattwerk page composer.

use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Unique identifier for a composition session's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declared kind of a content file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    /// PDF, ingested page-by-page as rasters.
    Pdf,
    /// Office Open XML word document (.docx).
    WordDocument,
    PlainText,
    /// PNG or JPEG used as content rather than as template.
    Image,
}

impl ContentKind {
    /// MIME type string for this kind.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::WordDocument => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::PlainText => "text/plain",
            Self::Image => "image/png",
        }
    }

    /// Infer content kind from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::WordDocument),
            "txt" | "text" => Some(Self::PlainText),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            _ => None,
        }
    }

    /// Infer content kind from a MIME type (parameters such as `charset` are ignored).
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" => Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::WordDocument)
            }
            "text/plain" => Some(Self::PlainText),
            "image/png" | "image/jpeg" | "image/jpg" => Some(Self::Image),
            _ => None,
        }
    }

    /// Infer content kind from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// The ingestion mode this kind produces.
    pub fn mode(&self) -> IngestMode {
        match self {
            Self::Pdf | Self::Image => IngestMode::Scan,
            Self::WordDocument | Self::PlainText => IngestMode::Flow,
        }
    }
}

/// How ingested content is composed onto pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestMode {
    /// Pagination-driven composition of flowable blocks.
    Flow,
    /// One pre-rendered raster per page.
    Scan,
}

/// Which document slot a loaded file fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    /// Background page template (raster image).
    Template,
    /// Overlaid content.
    Content,
}

impl Slot {
    /// Route a dropped file: images become the template, everything else content.
    pub fn for_path(path: &Path) -> Self {
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
            .unwrap_or(false);
        if is_image { Self::Template } else { Self::Content }
    }
}

/// Fixed output page geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    /// Width in CSS pixels at 96 dpi.
    pub width_px: u32,
    /// Height in CSS pixels at 96 dpi.
    pub height_px: u32,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageSize {
    /// A4 portrait: 210×297 mm, 794×1123 px at 96 dpi.
    pub const A4: PageSize = PageSize {
        width_px: 794,
        height_px: 1123,
        width_mm: 210.0,
        height_mm: 297.0,
    };

    pub fn width(&self) -> f32 {
        self.width_px as f32
    }

    pub fn height(&self) -> f32 {
        self.height_px as f32
    }

    /// Raster dimensions at the given capture scale.
    pub fn raster_dimensions(&self, scale: f32) -> (u32, u32) {
        (
            (self.width_px as f32 * scale).round().max(1.0) as u32,
            (self.height_px as f32 * scale).round().max(1.0) as u32,
        )
    }

    /// The full page bounds as a frame.
    pub fn bounds(&self) -> FrameBox {
        FrameBox::new(0.0, 0.0, self.width(), self.height())
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Visual style parameters shared by every page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleParams {
    /// Flow text size in CSS pixels.
    pub font_size: f32,
    /// Content layer opacity, 0.0..=1.0.
    pub opacity: f32,
    /// Content contrast factor; 1.0 is a no-op.
    pub contrast: f32,
}

impl Default for StyleParams {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            opacity: 1.0,
            contrast: 1.0,
        }
    }
}

/// Pointer position in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Minimum width/height of a content frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinSize {
    pub width: f32,
    pub height: f32,
}

impl Default for MinSize {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
        }
    }
}

/// Geometry of the content frame in page coordinates (the "Box").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FrameBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Return a copy whose width and height respect the floor.
    pub fn clamped(self, min: MinSize) -> Self {
        Self {
            width: self.width.max(min.width),
            height: self.height.max(min.height),
            ..self
        }
    }

    /// Whether width and height match another frame's (position ignored).
    pub fn same_size(&self, other: &FrameBox) -> bool {
        self.width == other.width && self.height == other.height
    }
}

impl Default for FrameBox {
    fn default() -> Self {
        Self::new(60.0, 60.0, 670.0, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_detection_is_case_insensitive() {
        assert_eq!(ContentKind::from_extension("PDF"), Some(ContentKind::Pdf));
        assert_eq!(ContentKind::from_extension("Docx"), Some(ContentKind::WordDocument));
        assert_eq!(ContentKind::from_extension("txt"), Some(ContentKind::PlainText));
        assert_eq!(ContentKind::from_extension("jpeg"), Some(ContentKind::Image));
        assert_eq!(ContentKind::from_extension("odt"), None);
    }

    #[test]
    fn mime_detection_ignores_parameters() {
        assert_eq!(
            ContentKind::from_mime("text/plain; charset=utf-8"),
            Some(ContentKind::PlainText)
        );
        assert_eq!(ContentKind::from_mime("application/msword"), None);
    }

    #[test]
    fn modes_follow_kind() {
        assert_eq!(ContentKind::Pdf.mode(), IngestMode::Scan);
        assert_eq!(ContentKind::Image.mode(), IngestMode::Scan);
        assert_eq!(ContentKind::PlainText.mode(), IngestMode::Flow);
        assert_eq!(ContentKind::WordDocument.mode(), IngestMode::Flow);
    }

    #[test]
    fn images_route_to_template_slot() {
        assert_eq!(Slot::for_path(Path::new("bg.PNG")), Slot::Template);
        assert_eq!(Slot::for_path(Path::new("scan.pdf")), Slot::Content);
        assert_eq!(Slot::for_path(Path::new("notes")), Slot::Content);
    }

    #[test]
    fn a4_raster_dimensions_scale() {
        assert_eq!(PageSize::A4.raster_dimensions(1.0), (794, 1123));
        assert_eq!(PageSize::A4.raster_dimensions(2.0), (1588, 2246));
    }

    #[test]
    fn clamped_respects_floor_and_keeps_position() {
        let frame = FrameBox::new(5.0, 7.0, 20.0, 500.0).clamped(MinSize::default());
        assert_eq!(frame, FrameBox::new(5.0, 7.0, 100.0, 500.0));
    }
}
