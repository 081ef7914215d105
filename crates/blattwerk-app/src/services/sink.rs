// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output sinks — where an assembled document goes once every page succeeded.
//
// Both sinks receive the same bytes; they differ only in where the file lands
// and how long it is meant to live.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use blattwerk_core::error::{BlattwerkError, Result};
use tempfile::TempDir;
use tracing::{debug, info};

/// Receives a finished output document.
pub trait OutputSink: Send + Sync {
    /// Store `bytes`; `suggested_name` is the default file name.
    /// Returns where the document was written.
    fn deliver(&self, bytes: &[u8], suggested_name: &str) -> Result<PathBuf>;
}

/// Durable artifact at a chosen path.
///
/// The document is written to a sibling `.part` file and renamed into place,
/// so a failed write never leaves a truncated artifact behind.
#[derive(Debug, Clone)]
pub struct FileSink {
    target: PathBuf,
}

impl FileSink {
    /// Write to `target`; if it is an existing directory, the suggested name
    /// is used inside it.
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }

    fn resolve(&self, suggested_name: &str) -> PathBuf {
        if self.target.is_dir() {
            self.target.join(suggested_name)
        } else {
            self.target.clone()
        }
    }
}

impl OutputSink for FileSink {
    fn deliver(&self, bytes: &[u8], suggested_name: &str) -> Result<PathBuf> {
        let path = self.resolve(suggested_name);
        write_atomically(&path, bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Document saved");
        Ok(path)
    }
}

/// Transient copy for viewing.
///
/// A session sink owns a scratch directory that is deleted, with every
/// preview in it, when the last clone of the sink is dropped. Only the latest
/// preview is kept: each delivery removes the one before it.
#[derive(Debug, Clone)]
pub struct PreviewSink {
    dir: PathBuf,
    scratch: Option<Arc<TempDir>>,
    latest: Arc<Mutex<Option<PathBuf>>>,
}

impl PreviewSink {
    /// Previews in a fresh scratch directory under the system temp dir.
    pub fn session() -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("blattwerk-preview-")
            .tempdir()?;
        Ok(Self {
            dir: scratch.path().to_path_buf(),
            scratch: Some(Arc::new(scratch)),
            latest: Arc::new(Mutex::new(None)),
        })
    }

    /// Previews under an explicit directory, which outlives the sink.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            scratch: None,
            latest: Arc::new(Mutex::new(None)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the directory is removed when the sink is dropped.
    pub fn is_scratch(&self) -> bool {
        self.scratch.is_some()
    }
}

impl OutputSink for PreviewSink {
    fn deliver(&self, bytes: &[u8], suggested_name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let name = format!("{}-{}", uuid::Uuid::new_v4().simple(), suggested_name);
        let path = self.dir.join(name);
        write_atomically(&path, bytes)?;

        let previous = self
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(path.clone());
        if let Some(previous) = previous {
            if let Err(err) = std::fs::remove_file(&previous) {
                debug!(path = %previous.display(), %err, "Old preview already gone");
            }
        }

        info!(path = %path.display(), "Preview written");
        Ok(path)
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path.file_name().ok_or_else(|| {
        BlattwerkError::ExportFailed(format!("{} is not a file path", path.display()))
    })?;
    let mut part_name = file_name.to_os_string();
    part_name.push(".part");
    let part = path.with_file_name(part_name);

    std::fs::write(&part, bytes)?;
    if let Err(err) = std::fs::rename(&part, path) {
        let _ = std::fs::remove_file(&part);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sink_writes_exact_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("out.pdf");
        let path = FileSink::new(&target)
            .deliver(b"%PDF-1.7 test", "document.pdf")
            .expect("deliver");

        assert_eq!(path, target);
        assert_eq!(std::fs::read(&path).expect("read"), b"%PDF-1.7 test");
        assert!(!dir.path().join("out.pdf.part").exists());
    }

    #[test]
    fn file_sink_into_directory_uses_default_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = FileSink::new(dir.path())
            .deliver(b"x", "document.pdf")
            .expect("deliver");
        assert_eq!(path, dir.path().join("document.pdf"));
    }

    #[test]
    fn file_sink_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("missing").join("out.pdf");
        let result = FileSink::new(&target).deliver(b"x", "document.pdf");
        assert!(matches!(result, Err(BlattwerkError::Io(_))));
        assert!(!target.exists());
    }

    #[test]
    fn preview_replaces_the_previous_one() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = PreviewSink::in_dir(dir.path());
        let a = sink.deliver(b"a", "document.pdf").expect("first");
        let b = sink.deliver(b"b", "document.pdf").expect("second");

        assert_ne!(a, b);
        assert!(b.to_string_lossy().ends_with("-document.pdf"));
        assert!(!a.exists());
        assert_eq!(std::fs::read(&b).expect("read"), b"b");
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 1);
    }

    #[test]
    fn session_previews_vanish_with_the_sink() {
        let sink = PreviewSink::session().expect("session sink");
        assert!(sink.is_scratch());
        let dir = sink.dir().to_path_buf();
        let clone = sink.clone();
        let path = sink.deliver(b"%PDF-1.7", "document.pdf").expect("deliver");
        assert!(path.starts_with(&dir));

        drop(sink);
        assert!(path.exists(), "a live clone keeps the directory");
        drop(clone);
        assert!(!path.exists());
        assert!(!dir.exists());
    }
}
