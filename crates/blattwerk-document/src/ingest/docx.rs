// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Word document conversion — `.docx` (Office Open XML) to ordered flow blocks.
//
// A .docx is a ZIP archive; the body lives in `word/document.xml` and picture
// relationships in `word/_rels/document.xml.rels`. Paragraphs inside tables
// are emitted in reading order like any other paragraph.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::sync::Arc;

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::{Block, BlockContent, TextRole};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, instrument, warn};
use zip::ZipArchive;

use crate::image::ImageProcessor;
use crate::traits::DocumentConverter;

const DOCUMENT_PART: &str = "word/document.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";
const BULLET: &str = "\u{2022} ";

/// Converts `.docx` bytes to blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxConverter;

impl DocumentConverter for DocxConverter {
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    fn convert(&self, bytes: &[u8]) -> Result<Vec<Block>> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|err| {
            BlattwerkError::DecodeError(format!("not a word document archive: {}", err))
        })?;

        let body = read_part(&mut archive, DOCUMENT_PART)?.ok_or_else(|| {
            BlattwerkError::DecodeError(format!("archive has no {}", DOCUMENT_PART))
        })?;
        let rels = match read_part(&mut archive, RELS_PART)? {
            Some(xml) => parse_relationships(&xml)?,
            None => HashMap::new(),
        };

        let paragraphs = parse_body(&body)?;
        let mut blocks = Vec::new();
        for paragraph in paragraphs {
            if !paragraph.text.trim().is_empty() {
                let text = match paragraph.role {
                    TextRole::ListItem => format!("{}{}", BULLET, paragraph.text),
                    _ => paragraph.text,
                };
                let index = blocks.len();
                blocks.push(Block::new(
                    index,
                    BlockContent::Text {
                        text,
                        role: paragraph.role,
                    },
                ));
            }
            for rel_id in paragraph.images {
                match load_picture(&mut archive, &rels, &rel_id) {
                    Some(image) => {
                        let index = blocks.len();
                        blocks.push(Block::new(index, BlockContent::Image(Arc::new(image))));
                    }
                    None => warn!(%rel_id, "Skipping unresolvable picture"),
                }
            }
        }

        debug!(blocks = blocks.len(), "Word document converted");
        Ok(blocks)
    }
}

/// A paragraph as collected from the XML stream.
#[derive(Debug, Default)]
struct Paragraph {
    text: String,
    role: TextRole,
    /// Relationship ids of inline pictures, in order.
    images: Vec<String>,
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(err) => {
            return Err(BlattwerkError::DecodeError(format!(
                "cannot open {}: {}",
                name, err
            )));
        }
    };
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|err| BlattwerkError::DecodeError(format!("cannot read {}: {}", name, err)))?;
    Ok(Some(content))
}

/// Walk `word/document.xml` and collect paragraphs in document order.
///
/// Paragraphs nest inside text boxes and shapes (`w:txbxContent`). The outer
/// paragraph is split around a nested one, so its text before the box, the
/// box's paragraphs, and its text after the box come out in reading order.
/// `mc:Fallback` duplicates the preferred `mc:Choice` markup and is skipped.
fn parse_body(xml: &str) -> Result<Vec<Paragraph>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut paragraphs = Vec::new();
    let mut buf = Vec::new();
    let mut open: Vec<Paragraph> = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;
    let mut fallback_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Err(err) => return Err(malformed(&reader, err)),
            Ok(Event::Start(ref e)) if fallback_depth > 0 => {
                if e.local_name().as_ref() == b"Fallback" {
                    fallback_depth += 1;
                }
            }
            Ok(Event::End(ref e)) if fallback_depth > 0 => {
                if e.local_name().as_ref() == b"Fallback" {
                    fallback_depth -= 1;
                }
            }
            _ if fallback_depth > 0 => {}
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(outer) = open.last_mut() {
                        let before = Paragraph {
                            text: std::mem::take(&mut outer.text),
                            role: outer.role,
                            images: std::mem::take(&mut outer.images),
                        };
                        paragraphs.push(before);
                    }
                    open.push(Paragraph::default());
                }
                b"r" => run_depth += 1,
                b"t" => in_text = run_depth > 0,
                b"Fallback" => fallback_depth = 1,
                other => apply_element(other, e, open.last_mut(), run_depth > 0),
            },
            Ok(Event::Empty(ref e)) => {
                apply_element(e.local_name().as_ref(), e, open.last_mut(), run_depth > 0)
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(paragraph) = open.pop() {
                        paragraphs.push(paragraph);
                    }
                }
                b"r" => {
                    run_depth = run_depth.saturating_sub(1);
                    in_text = false;
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    if let Some(paragraph) = open.last_mut() {
                        let text = e.unescape().map_err(|err| {
                            BlattwerkError::DecodeError(format!("bad text in document: {}", err))
                        })?;
                        paragraph.text.push_str(&text);
                    }
                }
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn malformed(reader: &Reader<&[u8]>, err: quick_xml::Error) -> BlattwerkError {
    BlattwerkError::DecodeError(format!(
        "malformed document XML at byte {}: {}",
        reader.buffer_position(),
        err
    ))
}

/// Handle property and inline elements inside a paragraph.
fn apply_element(name: &[u8], e: &BytesStart, paragraph: Option<&mut Paragraph>, in_run: bool) {
    let Some(paragraph) = paragraph else {
        return;
    };
    match name {
        b"pStyle" => {
            if let Some(style) = get_attribute(e, "val") {
                if let Some(role) = style_role(&style) {
                    paragraph.role = role;
                }
            }
        }
        b"numPr" => {
            if paragraph.role == TextRole::Body {
                paragraph.role = TextRole::ListItem;
            }
        }
        // `tab` also names tab-stop definitions in paragraph properties.
        b"br" | b"cr" if in_run => paragraph.text.push('\n'),
        b"tab" if in_run => paragraph.text.push('\t'),
        b"blip" => {
            if let Some(rel_id) = get_attribute(e, "embed") {
                paragraph.images.push(rel_id);
            }
        }
        _ => {}
    }
}

/// Map a paragraph style id to a text role.
fn style_role(style: &str) -> Option<TextRole> {
    let lower = style.to_ascii_lowercase();
    if lower == "title" {
        return Some(TextRole::Heading(1));
    }
    let level = lower.strip_prefix("heading")?;
    let level: u8 = level.trim().parse().ok()?;
    Some(TextRole::Heading(level.clamp(1, 6)))
}

/// Relationship id -> target path from `document.xml.rels`.
fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut rels = HashMap::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    if let (Some(id), Some(target)) =
                        (get_attribute(e, "Id"), get_attribute(e, "Target"))
                    {
                        rels.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(BlattwerkError::DecodeError(format!(
                    "malformed relationships XML: {}",
                    err
                )));
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// Resolve and decode an embedded picture. `None` if missing or undecodable.
fn load_picture<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    rels: &HashMap<String, String>,
    rel_id: &str,
) -> Option<image::RgbaImage> {
    let target = rels.get(rel_id)?;
    let path = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("word/{}", target),
    };

    let mut file = archive.by_name(&path).ok()?;
    let mut data = Vec::new();
    file.read_to_end(&mut data).ok()?;
    match ImageProcessor::from_bytes(&data) {
        Ok(processor) => Some(processor.into_rgba()),
        Err(err) => {
            warn!(%path, %err, "Embedded picture could not be decoded");
            None
        }
    }
}

fn get_attribute(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Build a .docx archive from a body fragment and optional extra parts.
    pub(crate) fn docx(body: &str, extra: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let xml = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#,
                r#" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#,
                r#" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#,
                r#" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006""#,
                r#" xmlns:wps="http://schemas.microsoft.com/office/word/2010/wordprocessingShape""#,
                r#" xmlns:v="urn:schemas-microsoft-com:vml">"#,
                "<w:body>{}</w:body></w:document>"
            ),
            body
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file(DOCUMENT_PART, options).expect("start part");
        writer.write_all(xml.as_bytes()).expect("write part");
        for (name, data) in extra {
            writer.start_file(*name, options).expect("start extra");
            writer.write_all(data).expect("write extra");
        }
        writer.finish().expect("finish zip").into_inner()
    }

    fn para(inner: &str) -> String {
        format!("<w:p>{}</w:p>", inner)
    }

    fn run(text: &str) -> String {
        format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, text)
    }

    fn texts(blocks: &[Block]) -> Vec<(String, TextRole)> {
        blocks
            .iter()
            .filter_map(|b| match &b.content {
                BlockContent::Text { text, role } => Some((text.clone(), *role)),
                BlockContent::Image(_) => None,
            })
            .collect()
    }

    #[test]
    fn paragraphs_keep_order_and_join_runs() {
        let body = [
            para(&format!("{}{}", run("Hello "), run("world"))),
            para(&run("Second")),
        ]
        .concat();
        let blocks = DocxConverter.convert(&docx(&body, &[])).expect("convert");

        assert_eq!(
            texts(&blocks),
            vec![
                ("Hello world".to_string(), TextRole::Body),
                ("Second".to_string(), TextRole::Body)
            ]
        );
        assert_eq!(blocks[1].index, 1);
    }

    #[test]
    fn headings_lists_breaks_and_tabs() {
        let body = [
            para(&format!(
                r#"<w:pPr><w:pStyle w:val="Heading2"/></w:pPr>{}"#,
                run("Intro")
            )),
            para(&format!(
                r#"<w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr>{}"#,
                run("item")
            )),
            para(r#"<w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r>"#),
            para(&format!(r#"<w:pPr><w:pStyle w:val="Title"/></w:pPr>{}"#, run("Top"))),
        ]
        .concat();
        let blocks = DocxConverter.convert(&docx(&body, &[])).expect("convert");

        assert_eq!(
            texts(&blocks),
            vec![
                ("Intro".to_string(), TextRole::Heading(2)),
                ("\u{2022} item".to_string(), TextRole::ListItem),
                ("a\tb\nc".to_string(), TextRole::Body),
                ("Top".to_string(), TextRole::Heading(1)),
            ]
        );
    }

    #[test]
    fn empty_paragraphs_are_dropped_and_tables_flatten() {
        let body = format!(
            "{}<w:p/>{}<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>",
            para(&run("before")),
            para(&run("   ")),
            para(&run("cell 1")),
            para(&run("cell 2")),
        );
        let blocks = DocxConverter.convert(&docx(&body, &[])).expect("convert");
        let only_text: Vec<String> = texts(&blocks).into_iter().map(|(t, _)| t).collect();
        assert_eq!(only_text, vec!["before", "cell 1", "cell 2"]);
    }

    #[test]
    fn inline_pictures_become_image_blocks() {
        let png = ImageProcessor::from_rgba(image::RgbaImage::from_pixel(
            3,
            2,
            image::Rgba([9, 9, 9, 255]),
        ))
        .to_png_bytes()
        .expect("encode png");
        let rels = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>"#,
            r#"</Relationships>"#
        );
        let body = para(&format!(
            r#"{}<w:r><w:drawing><a:graphic><a:graphicData><a:blip r:embed="rId5"/></a:graphicData></a:graphic></w:drawing></w:r>"#,
            run("Figure")
        ));
        let bytes = docx(
            &body,
            &[
                (RELS_PART, rels.as_bytes().to_vec()),
                ("word/media/image1.png", png),
            ],
        );

        let blocks = DocxConverter.convert(&bytes).expect("convert");
        assert_eq!(blocks.len(), 2);
        match &blocks[1].content {
            BlockContent::Image(image) => assert_eq!(image.dimensions(), (3, 2)),
            other => panic!("expected image block, got {:?}", other),
        }
    }

    #[test]
    fn text_box_paragraphs_keep_reading_order() {
        let text_box = format!(
            concat!(
                "<w:r><mc:AlternateContent><mc:Choice Requires=\"wps\"><w:drawing><wps:txbx>",
                "<w:txbxContent>{}</w:txbxContent>",
                "</wps:txbx></w:drawing></mc:Choice><mc:Fallback><w:pict><v:textbox>",
                "<w:txbxContent>{}</w:txbxContent>",
                "</v:textbox></w:pict></mc:Fallback></mc:AlternateContent></w:r>"
            ),
            para(&run("Inside box")),
            para(&run("Inside box")),
        );
        let body = [
            para(&format!("{}{}{}", run("Before box"), text_box, run("After box"))),
            para(&run("Next")),
        ]
        .concat();
        let blocks = DocxConverter.convert(&docx(&body, &[])).expect("convert");

        let only_text: Vec<String> = texts(&blocks).into_iter().map(|(t, _)| t).collect();
        assert_eq!(only_text, vec!["Before box", "Inside box", "After box", "Next"]);
        let indices: Vec<usize> = blocks.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn split_heading_keeps_its_role() {
        let body = para(&format!(
            r#"<w:pPr><w:pStyle w:val="Heading1"/></w:pPr>{}<w:r><w:drawing><w:txbxContent>{}</w:txbxContent></w:drawing></w:r>{}"#,
            run("Chapter"),
            para(&run("aside")),
            run(" one"),
        ));
        let blocks = DocxConverter.convert(&docx(&body, &[])).expect("convert");
        assert_eq!(
            texts(&blocks),
            vec![
                ("Chapter".to_string(), TextRole::Heading(1)),
                ("aside".to_string(), TextRole::Body),
                (" one".to_string(), TextRole::Heading(1)),
            ]
        );
    }

    #[test]
    fn box_at_paragraph_edges_adds_no_blank_blocks() {
        let boxed = |text: &str| {
            format!(
                "<w:r><w:drawing><w:txbxContent>{}</w:txbxContent></w:drawing></w:r>",
                para(&run(text))
            )
        };
        let body = para(&format!("{}{}{}", boxed("first"), run("middle"), boxed("last")));
        let blocks = DocxConverter.convert(&docx(&body, &[])).expect("convert");
        let only_text: Vec<String> = texts(&blocks).into_iter().map(|(t, _)| t).collect();
        assert_eq!(only_text, vec!["first", "middle", "last"]);
    }

    #[test]
    fn not_a_zip_is_decode_error() {
        let result = DocxConverter.convert(b"plain bytes, not a zip");
        assert!(matches!(result, Err(BlattwerkError::DecodeError(_))));
    }

    #[test]
    fn malformed_xml_is_decode_error() {
        let bytes = docx("<w:p><w:r><w:t>unclosed</w:r>", &[]);
        let result = DocxConverter.convert(&bytes);
        assert!(matches!(result, Err(BlattwerkError::DecodeError(_))));
    }

    #[test]
    fn style_ids_map_to_roles() {
        assert_eq!(style_role("Heading1"), Some(TextRole::Heading(1)));
        assert_eq!(style_role("heading 3"), Some(TextRole::Heading(3)));
        assert_eq!(style_role("Heading9"), Some(TextRole::Heading(6)));
        assert_eq!(style_role("Normal"), None);
    }
}
