// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blattwerk — page composer for templates and overlaid content.
//
// Non-interactive entry point. Loads a template and a content file, applies
// style and frame settings, and exports the composed document in one pass.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use blattwerk_app::services::data_dir;
use blattwerk_app::{Composer, FileSink, OutputSink, PreviewSink};
use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::human_errors::humanize_error;
use blattwerk_core::{ComposerConfig, ContentKind, FrameBox};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "blattwerk")]
#[command(version)]
#[command(about = "Compose a background template and content into fixed-size PDF pages", long_about = None)]
struct Cli {
    /// Background template image (PNG or JPEG)
    #[arg(short, long, value_name = "IMAGE")]
    template: Option<PathBuf>,

    /// Content file (PDF, .docx, .txt, PNG or JPEG)
    #[arg(short, long, value_name = "FILE")]
    content: Option<PathBuf>,

    /// Output file or directory (defaults to the configured name in the current directory)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Write a transient preview copy instead of a durable artifact
    #[arg(long, conflicts_with = "output")]
    preview: bool,

    /// Flow text size in CSS pixels
    #[arg(long)]
    font_size: Option<f32>,

    /// Content opacity, 0.0 to 1.0
    #[arg(long)]
    opacity: Option<f32>,

    /// Content contrast factor (1.0 leaves content unchanged)
    #[arg(long)]
    contrast: Option<f32>,

    /// Content frame left edge
    #[arg(long, allow_hyphen_values = true)]
    frame_x: Option<f32>,

    /// Content frame top edge
    #[arg(long, allow_hyphen_values = true)]
    frame_y: Option<f32>,

    /// Content frame width
    #[arg(long)]
    frame_width: Option<f32>,

    /// Content frame height
    #[arg(long)]
    frame_height: Option<f32>,

    /// Centre the content frame on the page (applied after explicit geometry)
    #[arg(long)]
    center: bool,

    /// Configuration file (JSON); defaults to `config.json` in the data directory
    #[arg(long, value_name = "FILE", env = "BLATTWERK_CONFIG")]
    config: Option<PathBuf>,

    /// Font file for flow text (overrides the configured family)
    #[arg(long, value_name = "TTF")]
    font: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    /// Explicit frame overrides on top of `base`, if any were given.
    fn frame(&self, base: FrameBox) -> Option<FrameBox> {
        if self.frame_x.is_none()
            && self.frame_y.is_none()
            && self.frame_width.is_none()
            && self.frame_height.is_none()
        {
            return None;
        }
        Some(FrameBox::new(
            self.frame_x.unwrap_or(base.x),
            self.frame_y.unwrap_or(base.y),
            self.frame_width.unwrap_or(base.width),
            self.frame_height.unwrap_or(base.height),
        ))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ComposerConfig::load(path)?,
        None => {
            let user = data_dir::config_file();
            if user.is_file() {
                info!(path = %user.display(), "Using user configuration");
                ComposerConfig::load(&user)?
            } else {
                ComposerConfig::default()
            }
        }
    };
    if let Some(font) = &cli.font {
        config.font_path = Some(font.clone());
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    info!("Blattwerk starting");
    let composer = Composer::new(config)?;

    if let Some(path) = &cli.template {
        let (bytes, kind, name) = read_input(path).await?;
        composer.load_template(bytes, kind, name).await?;
    }
    if let Some(path) = &cli.content {
        let (bytes, kind, name) = read_input(path).await?;
        composer.load_content(bytes, kind, name).await?;
    }

    if let Some(size) = cli.font_size {
        composer.set_font_size(size)?;
    }
    if let Some(opacity) = cli.opacity {
        composer.set_opacity(opacity)?;
    }
    if let Some(contrast) = cli.contrast {
        composer.set_contrast(contrast)?;
    }
    if let Some(frame) = cli.frame(composer.snapshot().frame()) {
        composer.set_frame(frame);
    }
    if cli.center {
        composer.center();
    }

    if cli.preview {
        let preview = PreviewSink::session()?;
        let report = composer.export(Arc::new(preview.clone())).await?;
        println!("{}", report.location.display());
        info!(pages = report.pages, bytes = report.bytes, "Preview ready");
        wait_for_enter().await?;
        // Dropping the last handle removes the scratch directory.
        drop(preview);
        return Ok(());
    }

    let sink: Arc<dyn OutputSink> = Arc::new(FileSink::new(
        cli.output.clone().unwrap_or_else(|| PathBuf::from(".")),
    ));
    let report = composer.export(sink).await?;
    println!("{}", report.location.display());
    info!(pages = report.pages, bytes = report.bytes, "Done");
    Ok(())
}

/// Block until the user presses Enter or stdin closes.
async fn wait_for_enter() -> Result<()> {
    use tokio::io::AsyncBufReadExt;

    eprintln!("Press Enter to discard the preview.");
    let mut line = String::new();
    tokio::io::BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(())
}

async fn read_input(path: &Path) -> Result<(Vec<u8>, ContentKind, Option<String>)> {
    let kind = ContentKind::from_path(path).ok_or_else(|| {
        BlattwerkError::UnsupportedFormat(format!("{} has no known file type", path.display()))
    })?;
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    Ok((bytes, kind, name))
}
