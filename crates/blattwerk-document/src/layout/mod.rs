// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout module — typefaces, typesetting, and pagination of flow blocks.

pub mod paginate;
pub mod typeface;
pub mod typeset;

pub use paginate::{reflow, scan_pages};
pub use typeface::Typeface;
pub use typeset::{BlockLayout, LaidOutBlock, TextMeasure, Typesetter};
