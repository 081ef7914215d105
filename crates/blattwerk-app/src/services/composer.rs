// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Composer — owns the session Document and sequences ingestion and export.
//
// Decoding, rasterising, compositing and assembling are CPU-bound, so each
// step runs on the blocking pool while the caller awaits. Export renders one
// page at a time from an immutable snapshot, and writes nothing until every
// page and the assembly have succeeded.
//
// The Document sits behind a std `Mutex`: every critical section is a short,
// synchronous mutation, and no lock is ever held across an `.await`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::{ComposerConfig, ContentKind, FrameBox, Point, Slot};
use blattwerk_document::render::RenderedPage;
use blattwerk_document::{
    ContentIngestor, Document, GestureKind, OutputAssembler, PdfWriter, RenderCompositor,
    RenderTarget, Template, Typesetter,
};
use tracing::{debug, info, instrument, trace, warn};

use super::sink::OutputSink;

/// Outcome of a successful export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Number of pages in the output document.
    pub pages: usize,
    /// Per-page pixel digests, in output order.
    pub digests: Vec<String>,
    /// Size of the assembled document.
    pub bytes: usize,
    /// Where the sink stored it.
    pub location: PathBuf,
}

/// Session controller shared by every front end.
///
/// All fields are Arc-backed, so clones share one Document and one export
/// guard.
#[derive(Clone)]
pub struct Composer {
    config: Arc<ComposerConfig>,
    document: Arc<Mutex<Document>>,
    ingestor: ContentIngestor,
    typesetter: Arc<Typesetter>,
    compositor: RenderCompositor,
    assembler: Arc<dyn OutputAssembler>,
    exporting: Arc<AtomicBool>,
}

impl Composer {
    // -- Construction ---------------------------------------------------------

    /// Composer with the default collaborators: docx converter, the build's
    /// PDF rasterizer, and the PDF writer.
    pub fn new(config: ComposerConfig) -> Result<Self> {
        let ingestor = ContentIngestor::from_config(&config);
        let typesetter = Arc::new(Typesetter::from_config(&config));
        Self::with_collaborators(config, ingestor, typesetter, Arc::new(PdfWriter::new()))
    }

    /// Composer with explicit collaborators (alternate backends, test fakes).
    pub fn with_collaborators(
        config: ComposerConfig,
        ingestor: ContentIngestor,
        typesetter: Arc<Typesetter>,
        assembler: Arc<dyn OutputAssembler>,
    ) -> Result<Self> {
        config.validate()?;
        let document = Document::new(&config, typesetter.clone());
        let compositor = RenderCompositor::from_config(&config, typesetter.clone());
        info!(
            page_width = config.page.width_px,
            page_height = config.page.height_px,
            fallback_font = typesetter.typeface().is_fallback(),
            "Composer ready"
        );

        Ok(Self {
            config: Arc::new(config),
            document: Arc::new(Mutex::new(document)),
            ingestor,
            typesetter,
            compositor,
            assembler,
            exporting: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// A copy of the current Document state.
    pub fn snapshot(&self) -> Document {
        self.lock().clone()
    }

    /// Whether an export currently holds the guard.
    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::Acquire)
    }

    /// Discard everything and start over with a fresh Document.
    ///
    /// Refused with `ExportInProgress` while an export holds the guard, since
    /// the fresh Document would reopen geometry mid-export.
    pub fn reset(&self) -> Result<()> {
        let mut doc = self.lock();
        if self.is_exporting() {
            return Err(BlattwerkError::ExportInProgress);
        }
        *doc = Document::new(&self.config, self.typesetter.clone());
        info!("Document reset");
        Ok(())
    }

    // -- Ingestion ------------------------------------------------------------

    /// Decode and install a background template. On failure the current
    /// template and content are left exactly as they were.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub async fn load_template(
        &self,
        bytes: Vec<u8>,
        kind: ContentKind,
        name: Option<String>,
    ) -> Result<()> {
        let ingestor = self.ingestor.clone();
        let image = run_blocking(BlattwerkError::DecodeError, move || {
            ingestor.load_template(&bytes, kind)
        })
        .await?;

        self.lock().set_template(Template {
            name,
            image: Arc::new(image),
        });
        Ok(())
    }

    /// Ingest content and paginate it. Returns the resulting page count.
    /// On failure the previous content, pages, and template are untouched.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub async fn load_content(
        &self,
        bytes: Vec<u8>,
        kind: ContentKind,
        name: Option<String>,
    ) -> Result<usize> {
        let ingestor = self.ingestor.clone();
        let result = run_blocking(BlattwerkError::DecodeError, move || {
            ingestor.ingest(&bytes, kind)
        })
        .await?;

        let mut doc = self.lock();
        doc.apply_ingest(result, name);
        Ok(doc.pages().len())
    }

    /// Read a file from disk and route it to its slot by extension.
    pub async fn load_file(&self, path: &Path) -> Result<Slot> {
        let kind = ContentKind::from_path(path).ok_or_else(|| {
            BlattwerkError::UnsupportedFormat(format!("{} has no known file type", path.display()))
        })?;
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        let slot = Slot::for_path(path);
        match slot {
            Slot::Template => self.load_template(bytes, kind, name).await?,
            Slot::Content => {
                self.load_content(bytes, kind, name).await?;
            }
        }
        Ok(slot)
    }

    // -- Style ----------------------------------------------------------------

    pub fn set_font_size(&self, font_size: f32) -> Result<()> {
        self.lock().set_font_size(font_size)
    }

    pub fn set_opacity(&self, opacity: f32) -> Result<()> {
        self.lock().set_opacity(opacity)
    }

    pub fn set_contrast(&self, contrast: f32) -> Result<()> {
        self.lock().set_contrast(contrast)
    }

    // -- Geometry -------------------------------------------------------------

    pub fn begin_gesture(&self, kind: GestureKind, origin: Point) -> bool {
        trace!(?kind, x = origin.x, y = origin.y, "Gesture begin");
        self.lock().begin_gesture(kind, origin)
    }

    /// Apply the latest pointer position. Stale positions are never queued:
    /// each call recomputes from the gesture's starting snapshot.
    pub fn update_gesture(&self, current: Point) -> Option<FrameBox> {
        trace!(x = current.x, y = current.y, "Gesture update");
        self.lock().update_gesture(current)
    }

    pub fn end_gesture(&self) {
        trace!("Gesture end");
        self.lock().end_gesture();
    }

    pub fn center(&self) -> FrameBox {
        self.lock().center()
    }

    pub fn set_frame(&self, frame: FrameBox) -> FrameBox {
        self.lock().set_frame(frame)
    }

    // -- Rendering ------------------------------------------------------------

    /// Render one output page (1-based) for display.
    pub async fn render_page(&self, number: usize, target: RenderTarget) -> Result<RenderedPage> {
        let snapshot = self.snapshot();
        let page = snapshot
            .output_pages()
            .into_iter()
            .find(|page| page.number == number)
            .ok_or_else(|| {
                BlattwerkError::ExportFailed(format!(
                    "page {} does not exist ({} pages)",
                    number,
                    snapshot.pages().len().max(1)
                ))
            })?;

        let compositor = self.compositor.clone();
        run_blocking(BlattwerkError::ExportFailed, move || {
            compositor.render(&page, &snapshot, target)
        })
        .await
    }

    /// Capture every page, assemble the output document, and hand it to `sink`.
    ///
    /// At most one export runs at a time; a second call while one is in flight
    /// fails with `ExportInProgress`. Geometry edits are refused for the whole
    /// export and re-enabled on every exit path.
    #[instrument(skip(self, sink))]
    pub async fn export(&self, sink: Arc<dyn OutputSink>) -> Result<ExportReport> {
        let _guard = ExportGuard::acquire(self.exporting.clone(), self.document.clone())?;

        if self.config.settle_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
        }

        let snapshot = Arc::new(self.snapshot());
        let pages = snapshot.output_pages();
        let page_size = *snapshot.page_size();
        info!(pages = pages.len(), "Export started");

        let mut rendered = Vec::with_capacity(pages.len());
        for page in pages {
            let compositor = self.compositor.clone();
            let doc = snapshot.clone();
            let captured = run_blocking(BlattwerkError::ExportFailed, move || {
                compositor.render_page(&page, &doc)
            })
            .await
            .inspect_err(|err| warn!(%err, "Page capture failed"))?;
            debug!(page = captured.number, digest = %captured.digest, "Page captured");
            rendered.push(captured);
        }

        let assembler = self.assembler.clone();
        let (bytes, rendered) = run_blocking(BlattwerkError::ExportFailed, move || {
            let bytes = assembler.assemble(&rendered, &page_size)?;
            Ok((bytes, rendered))
        })
        .await?;

        let name = self.config.default_output_name.clone();
        let size = bytes.len();
        let location = run_blocking(BlattwerkError::ExportFailed, move || {
            sink.deliver(&bytes, &name)
        })
        .await?;
        info!(
            pages = rendered.len(),
            bytes = size,
            location = %location.display(),
            "Export complete"
        );

        Ok(ExportReport {
            pages: rendered.len(),
            digests: rendered.into_iter().map(|page| page.digest).collect(),
            bytes: size,
            location,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Document> {
        lock(&self.document)
    }
}

/// Holds the single-export flag and keeps geometry frozen while alive.
struct ExportGuard {
    flag: Arc<AtomicBool>,
    document: Arc<Mutex<Document>>,
}

impl ExportGuard {
    fn acquire(flag: Arc<AtomicBool>, document: Arc<Mutex<Document>>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BlattwerkError::ExportInProgress)?;
        lock(&document).set_geometry_enabled(false);
        Ok(Self { flag, document })
    }
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        lock(&self.document).set_geometry_enabled(true);
        self.flag.store(false, Ordering::Release);
    }
}

fn lock(document: &Mutex<Document>) -> MutexGuard<'_, Document> {
    // A panic mid-mutation leaves the Document usable; recover instead of
    // poisoning the whole session.
    document.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run CPU-bound work on the blocking pool, mapping a lost task to `on_join`.
async fn run_blocking<T, F>(on_join: fn(String) -> BlattwerkError, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| on_join(format!("worker task failed: {err}")))?
}
