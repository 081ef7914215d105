// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typesetting — line wrapping and block height measurement.
//
// The same `Typesetter` feeds pagination (through `TextMeasure`) and the glyph
// painter, so a block always paints into exactly the height it was measured at.

use blattwerk_core::{BlockContent, ComposerConfig, TextRole};

use super::typeface::{Metrics, Typeface};

/// Columns a tab advances by, in spaces.
const TAB_WIDTH: usize = 4;

/// Measures how tall a block renders at a given frame width and font size.
pub trait TextMeasure: Send + Sync {
    fn measure(&self, content: &BlockContent, width: f32, font_size: f32) -> f32;
}

/// A block laid out for a specific width and font size.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockLayout {
    Text {
        lines: Vec<String>,
        /// Effective font size after the role's scale.
        font_px: f32,
        line_px: f32,
        role: TextRole,
    },
    Image {
        width: f32,
        height: f32,
    },
}

/// A laid-out block plus the gap that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutBlock {
    pub layout: BlockLayout,
    pub spacing: f32,
}

impl LaidOutBlock {
    /// Height of the content alone.
    pub fn content_height(&self) -> f32 {
        match &self.layout {
            BlockLayout::Text { lines, line_px, .. } => lines.len().max(1) as f32 * line_px,
            BlockLayout::Image { height, .. } => *height,
        }
    }

    /// Height including the trailing block gap.
    pub fn height(&self) -> f32 {
        self.content_height() + self.spacing
    }
}

/// Wraps text with a `Typeface` and converts blocks into measured layouts.
#[derive(Debug, Clone)]
pub struct Typesetter {
    typeface: Typeface,
    line_height: f32,
    block_spacing_em: f32,
}

impl Typesetter {
    pub fn new(typeface: Typeface, line_height: f32, block_spacing_em: f32) -> Self {
        Self {
            typeface,
            line_height,
            block_spacing_em,
        }
    }

    /// Typesetter using the configured font and spacing.
    pub fn from_config(config: &ComposerConfig) -> Self {
        Self::new(
            Typeface::resolve(config),
            config.line_height,
            config.block_spacing_em,
        )
    }

    /// Fixed-advance typesetter; independent of installed fonts.
    pub fn fallback(config: &ComposerConfig) -> Self {
        Self::new(Typeface::Fallback, config.line_height, config.block_spacing_em)
    }

    pub fn typeface(&self) -> &Typeface {
        &self.typeface
    }

    /// Lay out one block for a frame `width` at base `font_size`.
    pub fn layout(&self, content: &BlockContent, width: f32, font_size: f32) -> LaidOutBlock {
        let spacing = self.block_spacing_em * font_size;
        let layout = match content {
            BlockContent::Text { text, role } => {
                let font_px = font_size * role.font_scale();
                BlockLayout::Text {
                    lines: self.wrap(text, width, font_px),
                    font_px,
                    line_px: font_px * self.line_height,
                    role: *role,
                }
            }
            BlockContent::Image(image) => {
                let (w, h) = (image.width() as f32, image.height() as f32);
                if w > width && w > 0.0 {
                    BlockLayout::Image {
                        width,
                        height: h * width / w,
                    }
                } else {
                    BlockLayout::Image {
                        width: w,
                        height: h,
                    }
                }
            }
        };
        LaidOutBlock { layout, spacing }
    }

    /// Greedy word wrap to `max_width` pixels.
    ///
    /// Explicit newlines start a new line; a word wider than the line is
    /// broken between characters. An empty paragraph yields one empty line.
    pub fn wrap(&self, text: &str, max_width: f32, font_px: f32) -> Vec<String> {
        let metrics = self.typeface.metrics();
        let mut result = Vec::new();
        let space = metrics.advance(' ', font_px);

        for paragraph in text.split('\n') {
            let paragraph = expand_tabs(paragraph);
            let words: Vec<&str> = paragraph.split_whitespace().collect();
            if words.is_empty() {
                result.push(String::new());
                continue;
            }

            let mut current_line = String::new();
            let mut current_width = 0.0f32;

            for word in words {
                let word_width = metrics.text_width(word, font_px);
                if word_width > max_width {
                    if !current_line.is_empty() {
                        result.push(std::mem::take(&mut current_line));
                    }
                    let (chunks, rest) = break_word(&metrics, word, max_width, font_px);
                    result.extend(chunks);
                    current_width = metrics.text_width(&rest, font_px);
                    current_line = rest;
                } else if current_line.is_empty() {
                    current_line.push_str(word);
                    current_width = word_width;
                } else if current_width + space + word_width <= max_width {
                    current_line.push(' ');
                    current_line.push_str(word);
                    current_width += space + word_width;
                } else {
                    result.push(std::mem::take(&mut current_line));
                    current_line.push_str(word);
                    current_width = word_width;
                }
            }

            if !current_line.is_empty() {
                result.push(current_line);
            }
        }

        result
    }
}

/// Split an oversized word into full-width chunks plus a remainder.
fn break_word(
    metrics: &Metrics<'_>,
    word: &str,
    max_width: f32,
    font_px: f32,
) -> (Vec<String>, String) {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut width = 0.0f32;

    for ch in word.chars() {
        let adv = metrics.advance(ch, font_px);
        // Each chunk holds at least one character, even in a tiny frame.
        if width + adv > max_width && !chunk.is_empty() {
            chunks.push(std::mem::take(&mut chunk));
            width = 0.0;
        }
        chunk.push(ch);
        width += adv;
    }

    (chunks, chunk)
}

impl TextMeasure for Typesetter {
    fn measure(&self, content: &BlockContent, width: f32, font_size: f32) -> f32 {
        self.layout(content, width, font_size).height()
    }
}

fn expand_tabs(text: &str) -> String {
    if text.contains('\t') {
        text.replace('\t', &" ".repeat(TAB_WIDTH))
    } else {
        text.to_string()
    }
}
