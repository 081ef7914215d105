// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open existing PDF documents with `lopdf` and pull the page
// rasters out of scanned documents.
//
// A scanned PDF page is, in practice, one large image XObject painted over the
// page. Decoding that image directly avoids a full PDF renderer; documents with
// vector content need the `pdfium` feature instead.

use blattwerk_core::error::BlattwerkError;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage, RgbaImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, instrument, warn};

use crate::image::ImageProcessor;
use crate::traits::PdfRasterizer;

/// Reads existing PDF files.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, BlattwerkError> {
        let document = Document::load_mem(data).map_err(|err| {
            BlattwerkError::DecodeError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Width and height of page `page_number` (1-indexed) in PDF points, from
    /// its own or an inherited `/MediaBox`.
    pub fn page_size_points(&self, page_number: u32) -> Option<(f32, f32)> {
        let page_id = *self.document.get_pages().get(&page_number)?;
        let media_box = inherited(&self.document, page_id, b"MediaBox")?;
        let corners = media_box
            .as_array()
            .ok()?
            .iter()
            .map(|value| resolve(&self.document, value)?.as_float().ok())
            .collect::<Option<Vec<f32>>>()?;
        let [x0, y0, x1, y1] = corners[..] else {
            return None;
        };
        let (width, height) = ((x1 - x0).abs(), (y1 - y0).abs());
        (width > 0.0 && height > 0.0).then_some((width, height))
    }

    // -- Extraction -----------------------------------------------------------

    /// Decode the dominant (largest) image painted on page `page_number`
    /// (1-indexed).
    #[instrument(skip(self), fields(page_number))]
    pub fn page_raster(&self, page_number: u32) -> Result<RgbaImage, BlattwerkError> {
        let pages = self.document.get_pages();
        let page_id: ObjectId = *pages.get(&page_number).ok_or_else(|| {
            BlattwerkError::DecodeError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;

        let images = page_images(&self.document, page_id);
        let largest = images
            .into_iter()
            .max_by_key(|stream| {
                let (w, h) = stream_dimensions(stream).unwrap_or((0, 0));
                w as u64 * h as u64
            })
            .ok_or_else(|| {
                BlattwerkError::DecodeError(format!(
                    "page {} has no embedded raster image; vector pages need the `pdfium` feature",
                    page_number
                ))
            })?;

        let image = decode_image_stream(&self.document, largest)?;
        debug!(
            page_number,
            width = image.width(),
            height = image.height(),
            "Page raster decoded"
        );
        Ok(image)
    }
}

/// Rasteriser backed by the embedded page images of scanned PDFs.
///
/// Each page's scan is resampled to its `/MediaBox` times the requested
/// scale, so output size tracks the page and not the scanner's resolution.
/// Pages without a usable media box keep the scan's native size.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedImageRasterizer;

impl PdfRasterizer for EmbeddedImageRasterizer {
    #[instrument(skip(self, pdf, each), fields(bytes_len = pdf.len()))]
    fn rasterize_pages(
        &self,
        pdf: &[u8],
        scale: f32,
        each: &mut dyn FnMut(usize, RgbaImage) -> blattwerk_core::error::Result<()>,
    ) -> blattwerk_core::error::Result<usize> {
        let reader = PdfReader::from_bytes(pdf)?;
        let count = reader.page_count();

        for index in 0..count {
            let page_number = index as u32 + 1;
            let raster = reader.page_raster(page_number)?;
            let raster = match reader.page_size_points(page_number) {
                Some((width, height)) => scale_to(raster, width * scale, height * scale),
                None => raster,
            };
            each(index, raster)?;
        }
        Ok(count)
    }
}

/// Resample to the rounded target size; a no-op when it already matches.
fn scale_to(raster: RgbaImage, width: f32, height: f32) -> RgbaImage {
    let target = (
        (width.round() as u32).max(1),
        (height.round() as u32).max(1),
    );
    if raster.dimensions() == target {
        return raster;
    }
    debug!(
        from_width = raster.width(),
        from_height = raster.height(),
        width = target.0,
        height = target.1,
        "Resampling page raster"
    );
    ImageProcessor::from_rgba(raster)
        .resize_exact(target.0, target.1)
        .into_rgba()
}

// -- Helpers --------------------------------------------------------------

/// Follow a reference to its target object; non-references resolve to themselves.
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Find the page's resource dictionary, walking up `/Parent` for inherited
/// resources.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    // Page trees are shallow; the bound guards against malformed cycles.
    for _ in 0..32 {
        if let Ok(resources) = current.get(b"Resources") {
            return resolve(doc, resources).and_then(|obj| obj.as_dict().ok());
        }
        let parent = current.get(b"Parent").ok()?;
        current = resolve(doc, parent)?.as_dict().ok()?;
    }
    warn!(?page_id, "Page tree too deep while resolving resources");
    None
}

/// Look `key` up on the page, then on its ancestors in the page tree.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Ok(value) = current.get(key) {
            return resolve(doc, value);
        }
        let parent = current.get(b"Parent").ok()?;
        current = resolve(doc, parent)?.as_dict().ok()?;
    }
    None
}

/// All image XObject streams referenced by a page's resources.
fn page_images(doc: &Document, page_id: ObjectId) -> Vec<&Stream> {
    let Some(resources) = page_resources(doc, page_id) else {
        return Vec::new();
    };
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
    else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(_, value)| match resolve(doc, value) {
            Some(Object::Stream(stream)) => Some(stream),
            _ => None,
        })
        .filter(|stream| {
            stream
                .dict
                .get(b"Subtype")
                .and_then(|obj| obj.as_name())
                .map(|name| name == b"Image")
                .unwrap_or(false)
        })
        .collect()
}

fn stream_dimensions(stream: &Stream) -> Option<(u32, u32)> {
    let width = stream.dict.get(b"Width").ok()?.as_i64().ok()?;
    let height = stream.dict.get(b"Height").ok()?.as_i64().ok()?;
    Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?))
}

/// Names of the stream's filters, in application order.
fn stream_filters(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(|name| name.to_vec()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Number of colour components declared by the image's `/ColorSpace`.
fn color_components(doc: &Document, stream: &Stream) -> Result<usize, BlattwerkError> {
    let Ok(space) = stream.dict.get(b"ColorSpace") else {
        return Ok(3);
    };
    let space = resolve(doc, space)
        .ok_or_else(|| BlattwerkError::DecodeError("dangling /ColorSpace reference".into()))?;

    match space {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" => Ok(1),
            b"DeviceRGB" | b"CalRGB" => Ok(3),
            b"DeviceCMYK" => Ok(4),
            other => Err(BlattwerkError::DecodeError(format!(
                "unsupported colour space /{}",
                String::from_utf8_lossy(other)
            ))),
        },
        Object::Array(items) => {
            let family = items.first().and_then(|obj| obj.as_name().ok());
            match family {
                Some(b"ICCBased") => {
                    let n = items
                        .get(1)
                        .and_then(|obj| resolve(doc, obj))
                        .and_then(|obj| match obj {
                            Object::Stream(profile) => {
                                profile.dict.get(b"N").ok().and_then(|n| n.as_i64().ok())
                            }
                            _ => None,
                        })
                        .unwrap_or(3);
                    Ok(n as usize)
                }
                Some(b"CalRGB") => Ok(3),
                Some(b"CalGray") => Ok(1),
                _ => Err(BlattwerkError::DecodeError(
                    "indexed and special colour spaces are not supported".into(),
                )),
            }
        }
        _ => Err(BlattwerkError::DecodeError("malformed /ColorSpace".into())),
    }
}

/// Decode an image XObject into RGBA.
fn decode_image_stream(doc: &Document, stream: &Stream) -> Result<RgbaImage, BlattwerkError> {
    let (width, height) = stream_dimensions(stream)
        .ok_or_else(|| BlattwerkError::DecodeError("image without /Width or /Height".into()))?;
    let filters = stream_filters(stream);

    match filters.last().map(|f| f.as_slice()) {
        Some(b"DCTDecode") if filters.len() == 1 => {
            let decoded = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|err| {
                    BlattwerkError::DecodeError(format!("embedded JPEG is corrupt: {}", err))
                })?;
            Ok(decoded.into_rgba8())
        }
        None | Some(b"FlateDecode") => {
            let raw = if filters.is_empty() {
                stream.content.clone()
            } else {
                stream.decompressed_content().map_err(|err| {
                    BlattwerkError::DecodeError(format!("cannot inflate image stream: {}", err))
                })?
            };
            let bits = stream
                .dict
                .get(b"BitsPerComponent")
                .and_then(|obj| obj.as_i64())
                .unwrap_or(8);
            if bits != 8 {
                return Err(BlattwerkError::DecodeError(format!(
                    "{bits}-bit image samples are not supported"
                )));
            }
            let components = color_components(doc, stream)?;
            raw_to_rgba(&raw, width, height, components)
        }
        Some(other) => Err(BlattwerkError::DecodeError(format!(
            "unsupported image filter /{}",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Interpret 8-bit interleaved samples as an RGBA image.
fn raw_to_rgba(
    raw: &[u8],
    width: u32,
    height: u32,
    components: usize,
) -> Result<RgbaImage, BlattwerkError> {
    let expected = width as usize * height as usize * components;
    if raw.len() < expected {
        return Err(BlattwerkError::DecodeError(format!(
            "image data truncated: expected {} bytes, found {}",
            expected,
            raw.len()
        )));
    }
    let raw = &raw[..expected];

    let image = match components {
        1 => {
            let gray = GrayImage::from_fn(width, height, |x, y| {
                Luma([raw[(y * width + x) as usize]])
            });
            DynamicImage::ImageLuma8(gray)
        }
        3 => {
            let rgb = RgbImage::from_raw(width, height, raw.to_vec()).ok_or_else(|| {
                BlattwerkError::DecodeError("RGB buffer size mismatch".into())
            })?;
            DynamicImage::ImageRgb8(rgb)
        }
        4 => {
            let rgb = RgbImage::from_fn(width, height, |x, y| {
                let i = ((y * width + x) * 4) as usize;
                let k = 255 - raw[i + 3] as u32;
                let channel = |c: u8| ((255 - c as u32) * k / 255) as u8;
                Rgb([channel(raw[i]), channel(raw[i + 1]), channel(raw[i + 2])])
            });
            DynamicImage::ImageRgb8(rgb)
        }
        other => {
            return Err(BlattwerkError::DecodeError(format!(
                "unsupported component count {other}"
            )));
        }
    };

    info!(width, height, components, "Decoded raw page image");
    Ok(image.into_rgba8())
}
