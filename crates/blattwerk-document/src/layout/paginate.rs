// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagination — greedy linear fill of flow blocks into fixed-height frames.
//
// `reflow` is a pure function of its inputs: every call recomputes the split
// from scratch, so no stale page survives a change of font size or frame.

use blattwerk_core::{Block, Page, PageContent, PageFrame, RasterBlock};
use tracing::{debug, instrument};

use super::typeset::TextMeasure;

/// Split `blocks` into pages whose content fits `frame_height`.
///
/// A block that would overflow the current page closes it and starts the
/// next one. A block taller than the frame on its own still gets a page to
/// itself. The first page renders in the primary frame, the rest mirror it.
/// An empty block list yields no pages.
#[instrument(skip(blocks, measure), fields(blocks = blocks.len()))]
pub fn reflow(
    blocks: &[Block],
    frame_width: f32,
    frame_height: f32,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> Vec<Page> {
    let mut ranges: Vec<std::ops::Range<usize>> = Vec::new();
    let mut start = 0usize;
    let mut filled = 0.0f32;

    for (pos, block) in blocks.iter().enumerate() {
        let height = measure.measure(&block.content, frame_width, font_size);
        if pos > start && filled + height > frame_height {
            ranges.push(start..pos);
            start = pos;
            filled = 0.0;
        }
        filled += height;
    }
    if start < blocks.len() {
        ranges.push(start..blocks.len());
    }

    debug!(pages = ranges.len(), frame_width, frame_height, font_size, "Reflowed");

    ranges
        .into_iter()
        .enumerate()
        .map(|(i, range)| Page {
            number: i + 1,
            content: PageContent::Flow(range),
            frame: if i == 0 {
                PageFrame::Primary
            } else {
                PageFrame::Mirror
            },
        })
        .collect()
}

/// One full-page frame per raster block, in ingestion order.
pub fn scan_pages(blocks: &[RasterBlock]) -> Vec<Page> {
    blocks
        .iter()
        .enumerate()
        .map(|(i, _)| Page {
            number: i + 1,
            content: PageContent::Scan(i),
            frame: PageFrame::FullPage,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blattwerk_core::BlockContent;

    /// Every block is as tall as its text length, regardless of width or font.
    struct LengthMeasure;

    impl TextMeasure for LengthMeasure {
        fn measure(&self, content: &BlockContent, _width: f32, font_size: f32) -> f32 {
            match content {
                BlockContent::Text { text, .. } => text.len() as f32 * font_size / 10.0,
                BlockContent::Image(image) => image.height() as f32,
            }
        }
    }

    fn blocks(heights: &[usize]) -> Vec<Block> {
        heights
            .iter()
            .enumerate()
            .map(|(i, h)| Block::new(i, BlockContent::text("x".repeat(*h))))
            .collect()
    }

    fn flattened(pages: &[Page]) -> Vec<usize> {
        pages.iter().flat_map(|p| p.block_range()).collect()
    }

    #[test]
    fn greedy_fill_closes_page_before_overflowing_block() {
        let input = blocks(&[40, 40, 30, 50]);
        let pages = reflow(&input, 100.0, 100.0, 10.0, &LengthMeasure);

        let ranges: Vec<_> = pages.iter().map(|p| p.block_range()).collect();
        assert_eq!(ranges, vec![0..2, 2..4]);
        assert_eq!(pages[0].frame, PageFrame::Primary);
        assert_eq!(pages[1].frame, PageFrame::Mirror);
        assert_eq!(pages[1].number, 2);
    }

    #[test]
    fn exact_fit_stays_on_page() {
        let pages = reflow(&blocks(&[50, 50, 1]), 100.0, 100.0, 10.0, &LengthMeasure);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].block_range(), 0..2);
    }

    #[test]
    fn oversized_block_sits_alone() {
        let pages = reflow(&blocks(&[10, 250, 10]), 100.0, 100.0, 10.0, &LengthMeasure);
        let ranges: Vec<_> = pages.iter().map(|p| p.block_range()).collect();
        assert_eq!(ranges, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn leading_oversized_block_is_not_preceded_by_empty_page() {
        let pages = reflow(&blocks(&[500]), 100.0, 100.0, 10.0, &LengthMeasure);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].block_range(), 0..1);
    }

    #[test]
    fn conservation_and_determinism() {
        let heights: Vec<usize> = (0..200).map(|i| (i * 37) % 90 + 1).collect();
        let input = blocks(&heights);
        let first = reflow(&input, 300.0, 120.0, 12.0, &LengthMeasure);
        let second = reflow(&input, 300.0, 120.0, 12.0, &LengthMeasure);

        assert_eq!(first, second);
        assert_eq!(flattened(&first), (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn larger_font_never_reduces_page_count() {
        let input = blocks(&[30; 40]);
        let small = reflow(&input, 100.0, 100.0, 10.0, &LengthMeasure);
        let large = reflow(&input, 100.0, 100.0, 20.0, &LengthMeasure);
        assert!(large.len() > small.len());
        assert_eq!(flattened(&large), (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn empty_input_yields_no_pages() {
        assert!(reflow(&[], 100.0, 100.0, 10.0, &LengthMeasure).is_empty());
    }

    #[test]
    fn scan_pages_are_one_to_one() {
        let rasters: Vec<RasterBlock> = (0..3)
            .map(|i| RasterBlock::new(i, image::RgbaImage::new(2, 2)))
            .collect();
        let pages = scan_pages(&rasters);
        assert_eq!(pages.len(), 3);
        assert!(pages.iter().all(|p| p.frame == PageFrame::FullPage));
        assert_eq!(pages[2].content, PageContent::Scan(2));
    }
}
