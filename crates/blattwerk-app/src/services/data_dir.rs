// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.
//
// Only read from: the composer keeps no durable state, but a user-provided
// `config.json` here is picked up when no `--config` is given.

use std::path::PathBuf;

/// The application data directory. Not created.
pub fn data_dir() -> PathBuf {
    base_dir(
        std::env::var("XDG_DATA_HOME").ok(),
        std::env::var("HOME").ok(),
    )
    .join("blattwerk")
}

/// Location of the user's `config.json`. The file may not exist.
pub fn config_file() -> PathBuf {
    data_dir().join("config.json")
}

/// XDG data dir, then `~/.local/share`, then the system temp dir.
fn base_dir(xdg: Option<String>, home: Option<String>) -> PathBuf {
    if let Some(xdg) = xdg.filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    if let Some(home) = home.filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".local").join("share");
    }
    std::env::temp_dir()
}
