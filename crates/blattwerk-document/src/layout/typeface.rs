// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typeface resolution — explicit font file, system lookup via `fontdb`, or a
// fixed-advance fallback when no usable font is found.

use std::path::Path;
use std::sync::Arc;

use blattwerk_core::ComposerConfig;
use blattwerk_core::error::{BlattwerkError, Result};
use tracing::{debug, info, warn};
use ttf_parser::Face;

/// Advance of every glyph in the fallback metric, in em.
pub const FALLBACK_ADVANCE_EM: f32 = 0.5;

/// Ascent of the fallback metric, in em.
const FALLBACK_ASCENT_EM: f32 = 0.8;

/// The font used to measure and paint flow text.
#[derive(Clone)]
pub enum Typeface {
    /// No font available: every glyph is `FALLBACK_ADVANCE_EM` wide.
    Fallback,
    /// A parsed-on-demand TrueType/OpenType face.
    Loaded {
        data: Arc<Vec<u8>>,
        index: u32,
        family: String,
    },
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Typeface::Fallback => f.write_str("Typeface::Fallback"),
            Typeface::Loaded { index, family, .. } => f
                .debug_struct("Typeface::Loaded")
                .field("family", family)
                .field("index", index)
                .finish(),
        }
    }
}

impl Typeface {
    // -- Construction ---------------------------------------------------------

    /// Parse a font from raw bytes, validating that the face is readable.
    pub fn from_bytes(data: Vec<u8>, index: u32) -> Result<Self> {
        let family = {
            let face = Face::parse(&data, index).map_err(|err| {
                BlattwerkError::DecodeError(format!("unreadable font: {}", err))
            })?;
            family_name(&face).unwrap_or_else(|| "unnamed".into())
        };
        Ok(Typeface::Loaded {
            data: Arc::new(data),
            index,
            family,
        })
    }

    /// Load the first face of a font file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data, 0)
    }

    /// Look up an installed font by CSS-style family name.
    pub fn system(family: &str) -> Option<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        let families = [css_family(family)];
        let query = fontdb::Query {
            families: &families,
            ..fontdb::Query::default()
        };
        let id = db.query(&query)?;
        let (data, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;
        Self::from_bytes(data, index).ok()
    }

    /// Resolve the configured typeface: explicit path, then family, then fallback.
    pub fn resolve(config: &ComposerConfig) -> Self {
        if let Some(path) = &config.font_path {
            match Self::from_file(path) {
                Ok(face) => {
                    info!(path = %path.display(), "Using font file");
                    return face;
                }
                Err(err) => warn!(path = %path.display(), %err, "Font file unusable"),
            }
        }

        if let Some(family) = &config.font_family {
            if let Some(face) = Self::system(family) {
                debug!(?face, "Resolved system font");
                return face;
            }
            warn!(%family, "No system font matched; using fixed-advance metric");
        }

        Typeface::Fallback
    }

    // -- Metrics --------------------------------------------------------------

    pub fn is_fallback(&self) -> bool {
        matches!(self, Typeface::Fallback)
    }

    /// Parse the face for outline or metric queries. `None` for the fallback.
    pub fn face(&self) -> Option<Face<'_>> {
        match self {
            Typeface::Fallback => None,
            Typeface::Loaded { data, index, .. } => Face::parse(data, *index).ok(),
        }
    }

    /// Parse once for a run of metric queries. Hold on to the result for a
    /// whole paragraph or line instead of calling `advance` per glyph.
    pub fn metrics(&self) -> Metrics<'_> {
        Metrics { face: self.face() }
    }

    /// Horizontal advance of `ch` at `font_px`.
    pub fn advance(&self, ch: char, font_px: f32) -> f32 {
        self.metrics().advance(ch, font_px)
    }

    /// Width of a single line of text at `font_px`.
    pub fn text_width(&self, text: &str, font_px: f32) -> f32 {
        self.metrics().text_width(text, font_px)
    }

    /// Distance from the top of a line box to the baseline, at `font_px`.
    pub fn ascent(&self, font_px: f32) -> f32 {
        self.metrics().ascent(font_px)
    }
}

/// A parsed face borrowed from its `Typeface`; the fallback metric when
/// there is none.
pub struct Metrics<'a> {
    face: Option<Face<'a>>,
}

impl<'a> Metrics<'a> {
    pub fn face(&self) -> Option<&Face<'a>> {
        self.face.as_ref()
    }

    pub fn advance(&self, ch: char, font_px: f32) -> f32 {
        match &self.face {
            Some(face) => glyph_advance(face, ch, font_px),
            None => FALLBACK_ADVANCE_EM * font_px,
        }
    }

    pub fn text_width(&self, text: &str, font_px: f32) -> f32 {
        match &self.face {
            Some(face) => text.chars().map(|ch| glyph_advance(face, ch, font_px)).sum(),
            None => text.chars().count() as f32 * FALLBACK_ADVANCE_EM * font_px,
        }
    }

    pub fn ascent(&self, font_px: f32) -> f32 {
        match &self.face {
            Some(face) => face.ascender() as f32 / face.units_per_em() as f32 * font_px,
            None => FALLBACK_ASCENT_EM * font_px,
        }
    }
}

fn glyph_advance(face: &Face<'_>, ch: char, font_px: f32) -> f32 {
    let scale = font_px / face.units_per_em() as f32;
    face.glyph_index(ch)
        .and_then(|gid| face.glyph_hor_advance(gid))
        .map(|adv| adv as f32 * scale)
        .unwrap_or(FALLBACK_ADVANCE_EM * font_px)
}

fn family_name(face: &Face<'_>) -> Option<String> {
    face.names()
        .into_iter()
        .find(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .and_then(|name| name.to_string())
}

fn css_family(family: &str) -> fontdb::Family<'_> {
    match family.trim().to_ascii_lowercase().as_str() {
        "serif" => fontdb::Family::Serif,
        "sans-serif" => fontdb::Family::SansSerif,
        "monospace" => fontdb::Family::Monospace,
        "cursive" => fontdb::Family::Cursive,
        "fantasy" => fontdb::Family::Fantasy,
        _ => fontdb::Family::Name(family.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_metric_is_half_an_em_per_glyph() {
        let face = Typeface::Fallback;
        assert_eq!(face.advance('W', 20.0), 10.0);
        assert_eq!(face.text_width("abcd", 10.0), 20.0);
        assert_eq!(face.ascent(10.0), 8.0);
    }

    #[test]
    fn unparseable_loaded_face_measures_like_the_fallback() {
        let face = Typeface::Loaded {
            data: Arc::new(vec![0u8; 8]),
            index: 0,
            family: "broken".into(),
        };
        let metrics = face.metrics();
        assert!(metrics.face().is_none());
        assert_eq!(metrics.text_width("abcd", 10.0), 20.0);
        assert_eq!(metrics.advance(' ', 10.0), face.advance(' ', 10.0));
    }

    #[test]
    fn garbage_font_bytes_are_decode_errors() {
        let result = Typeface::from_bytes(vec![0u8; 16], 0);
        assert!(matches!(result, Err(BlattwerkError::DecodeError(_))));
    }

    #[test]
    fn unusable_font_path_falls_back() {
        let config = ComposerConfig {
            font_path: Some("/nonexistent/font.ttf".into()),
            font_family: None,
            ..ComposerConfig::default()
        };
        assert!(Typeface::resolve(&config).is_fallback());
    }
}
