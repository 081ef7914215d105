// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blattwerk — Core types, block model, and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod model;
pub mod types;

pub use config::ComposerConfig;
pub use error::BlattwerkError;
pub use model::*;
pub use types::*;
