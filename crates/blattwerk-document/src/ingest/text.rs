// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain text ingestion — one flow block per line, in file order.

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::{Block, BlockContent};

/// Split UTF-8 text into one block per line.
///
/// A leading byte-order mark is dropped and both `\n` and `\r\n` end a line.
/// Blank lines are kept as empty blocks so vertical spacing survives.
pub fn text_blocks(bytes: &[u8]) -> Result<Vec<Block>> {
    let text = std::str::from_utf8(bytes).map_err(|err| {
        BlattwerkError::DecodeError(format!("text is not valid UTF-8: {}", err))
    })?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    Ok(text
        .lines()
        .enumerate()
        .map(|(index, line)| Block::new(index, BlockContent::text(line)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(blocks: &[Block]) -> Vec<String> {
        blocks
            .iter()
            .map(|b| match &b.content {
                BlockContent::Text { text, .. } => text.clone(),
                BlockContent::Image(_) => "<image>".into(),
            })
            .collect()
    }

    #[test]
    fn one_block_per_line_in_order() {
        let blocks = text_blocks(b"alpha\r\nbeta\n\ngamma\n").expect("valid text");
        assert_eq!(texts(&blocks), vec!["alpha", "beta", "", "gamma"]);
        let indices: Vec<_> = blocks.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn byte_order_mark_is_stripped() {
        let blocks = text_blocks("\u{feff}hello".as_bytes()).expect("valid text");
        assert_eq!(texts(&blocks), vec!["hello"]);
    }

    #[test]
    fn empty_file_has_no_blocks() {
        assert!(text_blocks(b"").expect("valid text").is_empty());
    }

    #[test]
    fn invalid_utf8_is_decode_error() {
        let result = text_blocks(&[0x66, 0x6f, 0xff, 0xfe]);
        assert!(matches!(result, Err(BlattwerkError::DecodeError(_))));
    }
}
