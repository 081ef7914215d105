// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — the async controller and output sinks front ends call into.

pub mod composer;
pub mod data_dir;
pub mod sink;

pub use composer::{Composer, ExportReport};
pub use sink::{FileSink, OutputSink, PreviewSink};
