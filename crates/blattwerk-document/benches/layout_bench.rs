// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the layout engine in the blattwerk-document crate.
// Measures a full reflow of a long plain-text document, and the capture of one
// flow page at the default export scale.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use blattwerk_core::{Block, BlockContent, ComposerConfig, IngestResult};
use blattwerk_document::{Document, RenderCompositor, Typeface, Typesetter, reflow};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 5,000 paragraphs of varying length, like a long converted manuscript.
fn manuscript() -> Vec<Block> {
    let sentence = "The quick brown fox jumps over the lazy dog. ";
    (0..5_000)
        .map(|i| Block::new(i, BlockContent::text(sentence.repeat(1 + i % 7))))
        .collect()
}

fn typesetter() -> Arc<Typesetter> {
    Arc::new(Typesetter::new(Typeface::Fallback, 1.4, 0.5))
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Reflow 5,000 blocks into the default 670x1000 Box at 16 px.
fn bench_reflow(c: &mut Criterion) {
    let blocks = manuscript();
    let measure = typesetter();

    c.bench_function("reflow (5000 blocks)", |b| {
        b.iter(|| {
            let pages = reflow(black_box(&blocks), 670.0, 1000.0, 16.0, measure.as_ref());
            black_box(pages.len());
        });
    });
}

/// Composite the first page of the manuscript at capture scale 2.
fn bench_render_page(c: &mut Criterion) {
    let config = ComposerConfig::default();
    let setter = typesetter();
    let mut doc = Document::new(&config, setter.clone());
    doc.apply_ingest(
        IngestResult::Flow {
            blocks: manuscript(),
        },
        None,
    );
    let compositor = RenderCompositor::from_config(&config, setter);
    let page = doc.pages()[0].clone();

    c.bench_function("render_page (A4 @2x)", |b| {
        b.iter(|| {
            let rendered = compositor.render_page(black_box(&page), &doc);
            black_box(rendered.is_ok());
        });
    });
}

criterion_group!(benches, bench_reflow, bench_render_page);
criterion_main!(benches);
