// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blattwerk-app — session controller and output sinks shared by front ends.

pub mod services;

pub use services::{Composer, ExportReport, FileSink, OutputSink, PreviewSink};
