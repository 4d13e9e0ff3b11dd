//! Typefaces used for tile text.
//!
//! A [`Typeface`] holds a regular and a bold face. Faces are either TrueType
//! fonts rasterized with `fontdue`, or the built-in block face used when no font
//! file is available. Both produce the same [`GlyphBitmap`] shape so the
//! rasterizer does not care which one it draws.

use fontdue::{Font, FontSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::model::FontWeight;
use crate::{Error, Result};

const SYSTEM_REGULAR: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/Library/Fonts/DejaVuSans.ttf",
];

const SYSTEM_BOLD: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans-Bold.ttf",
    "/Library/Fonts/DejaVuSans-Bold.ttf",
];

/// Block face advance: three fifths of the font size.
fn block_advance(size: f32) -> f32 {
    size * 3.0 / 5.0
}

/// Block face ascent: four fifths of the font size.
fn block_ascent(size: f32) -> f32 {
    size * 4.0 / 5.0
}

/// Where to find the tile fonts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// TrueType file for regular/medium weights
    pub regular: Option<PathBuf>,
    /// TrueType file for semibold/bold weights
    pub bold: Option<PathBuf>,
    /// Look for DejaVu Sans in the usual system locations when a path is unset
    pub search_system: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            regular: None,
            bold: None,
            search_system: true,
        }
    }
}

impl FontConfig {
    /// Only the built-in block face. Output does not depend on installed fonts.
    pub fn builtin() -> Self {
        Self {
            regular: None,
            bold: None,
            search_system: false,
        }
    }
}

#[derive(Clone)]
enum Face {
    Vector(Arc<Font>),
    Block,
}

impl std::fmt::Debug for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Face::Vector(_) => f.write_str("Vector"),
            Face::Block => f.write_str("Block"),
        }
    }
}

/// One glyph of a shaped run, positioned by its pen offset from the run origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    pub ch: char,
    pub pen_x: f32,
}

/// A shaped line of text. `width` is the advance width, as used for hit boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub glyphs: Vec<PlacedGlyph>,
    pub width: f32,
    pub ascent: f32,
    pub size: f32,
    pub weight: FontWeight,
}

/// Coverage bitmap of a single glyph, positioned relative to the pen and baseline.
///
/// `xmin` is the horizontal offset from the pen, `ymin` the offset of the bitmap's
/// bottom edge above the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    pub xmin: i32,
    pub ymin: i32,
    pub width: usize,
    pub height: usize,
    pub coverage: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Typeface {
    regular: Face,
    bold: Face,
}

impl Default for Typeface {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Typeface {
    pub fn builtin() -> Self {
        Self {
            regular: Face::Block,
            bold: Face::Block,
        }
    }

    /// Load faces per `config`.
    ///
    /// Explicitly configured files must load; a missing system font only logs a
    /// warning and falls back to the block face.
    pub fn load(config: &FontConfig) -> Result<Self> {
        let regular = resolve_face(config.regular.as_deref(), config.search_system, SYSTEM_REGULAR)?;
        let bold = resolve_face(config.bold.as_deref(), config.search_system, SYSTEM_BOLD)?;
        let (regular, bold) = match (regular, bold) {
            (Some(r), Some(b)) => (r, b),
            (Some(r), None) => (r.clone(), r),
            (None, Some(b)) => (b.clone(), b),
            (None, None) => {
                if config.search_system {
                    log::warn!("no TrueType font found, using the built-in block face");
                }
                (Face::Block, Face::Block)
            }
        };
        log::debug!("typeface: regular={:?} bold={:?}", regular, bold);
        Ok(Self { regular, bold })
    }

    /// Load a face from raw TrueType/OpenType bytes, used for every weight.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let face = Face::Vector(Arc::new(parse_font(data)?));
        Ok(Self {
            regular: face.clone(),
            bold: face,
        })
    }

    pub fn is_builtin(&self) -> bool {
        matches!((&self.regular, &self.bold), (Face::Block, Face::Block))
    }

    fn face(&self, weight: FontWeight) -> &Face {
        if weight.is_bold() {
            &self.bold
        } else {
            &self.regular
        }
    }

    /// Shape `text` on a single line. This is the one measuring operation shared
    /// by hit-testing and drawing.
    pub fn shape(&self, text: &str, size: f32, weight: FontWeight) -> TextRun {
        let mut glyphs = Vec::with_capacity(text.len());
        let (width, ascent) = match self.face(weight) {
            Face::Vector(font) => {
                let mut pen = 0.0f32;
                let mut prev: Option<char> = None;
                for ch in text.chars() {
                    if let Some(p) = prev {
                        pen += font.horizontal_kern(p, ch, size).unwrap_or(0.0);
                    }
                    glyphs.push(PlacedGlyph { ch, pen_x: pen });
                    pen += font.metrics(ch, size).advance_width;
                    prev = Some(ch);
                }
                let ascent = font
                    .horizontal_line_metrics(size)
                    .map(|m| m.ascent)
                    .unwrap_or_else(|| block_ascent(size));
                (pen, ascent)
            }
            Face::Block => {
                let advance = block_advance(size);
                for (i, ch) in text.chars().enumerate() {
                    glyphs.push(PlacedGlyph {
                        ch,
                        pen_x: i as f32 * advance,
                    });
                }
                (glyphs.len() as f32 * advance, block_ascent(size))
            }
        };
        TextRun {
            glyphs,
            width,
            ascent,
            size,
            weight,
        }
    }

    /// Advance width of `text`.
    pub fn measure(&self, text: &str, size: f32, weight: FontWeight) -> f32 {
        self.shape(text, size, weight).width
    }

    pub fn rasterize(&self, ch: char, size: f32, weight: FontWeight) -> GlyphBitmap {
        match self.face(weight) {
            Face::Vector(font) => {
                let (m, coverage) = font.rasterize(ch, size);
                GlyphBitmap {
                    xmin: m.xmin,
                    ymin: m.ymin,
                    width: m.width,
                    height: m.height,
                    coverage,
                }
            }
            Face::Block => block_glyph(ch, size),
        }
    }
}

fn block_glyph(ch: char, size: f32) -> GlyphBitmap {
    if ch.is_whitespace() {
        return GlyphBitmap {
            xmin: 0,
            ymin: 0,
            width: 0,
            height: 0,
            coverage: Vec::new(),
        };
    }
    let advance = block_advance(size);
    let width = (advance * 0.8).round().max(1.0) as usize;
    let height = (block_ascent(size) * 0.9).round().max(1.0) as usize;
    GlyphBitmap {
        xmin: (advance * 0.1).round() as i32,
        ymin: 0,
        width,
        height,
        coverage: vec![255; width * height],
    }
}

fn parse_font(data: &[u8]) -> Result<Font> {
    Font::from_bytes(data, FontSettings::default())
        .map_err(|e| Error::ConfigError(format!("Invalid font data: {}", e)))
}

fn load_face(path: &Path) -> Result<Face> {
    let data = std::fs::read(path)
        .map_err(|e| Error::ConfigError(format!("Cannot read font {}: {}", path.display(), e)))?;
    Ok(Face::Vector(Arc::new(parse_font(&data)?)))
}

fn resolve_face(explicit: Option<&Path>, search: bool, candidates: &[&str]) -> Result<Option<Face>> {
    if let Some(path) = explicit {
        return load_face(path).map(Some);
    }
    if !search {
        return Ok(None);
    }
    for candidate in candidates {
        let path = Path::new(candidate);
        if !path.exists() {
            continue;
        }
        match load_face(path) {
            Ok(face) => return Ok(Some(face)),
            Err(e) => log::warn!("skipping system font: {}", e),
        }
    }
    Ok(None)
}
