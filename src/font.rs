//! Font descriptors and text metrics
//!
//! Fonts are described by `"Family-Style-Size"` strings, e.g.
//! `"Monospaced-Bold-14"`. Any part may be `*` to keep the current value.

use crate::error::{GuiError, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Plain,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "normal" => Some(FontStyle::Plain),
            "bold" => Some(FontStyle::Bold),
            "italic" => Some(FontStyle::Italic),
            "bolditalic" | "italicbold" => Some(FontStyle::BoldItalic),
            _ => None,
        }
    }
}

/// A partially specified font; `None` fields inherit from a base font.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FontSpec {
    pub family: Option<String>,
    pub style: Option<FontStyle>,
    pub size: Option<f32>,
}

/// A fully specified font.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: String,
    pub style: FontStyle,
    pub size: f32,
}

impl FontSpec {
    /// Parse `"Family-Style-Size"`, `"Family-Size"` or `"Family"`.
    ///
    /// Returns `None` for an empty string or an unreadable style or size.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        let parts: Vec<&str> = spec.split('-').map(str::trim).collect();
        let wildcard = |s: &str| s.is_empty() || s == "*";

        let family = (!wildcard(parts[0])).then(|| parts[0].to_string());
        let (style, size) = match parts.len() {
            1 => (None, None),
            2 if wildcard(parts[1]) => (None, None),
            2 => match parts[1].parse::<f32>() {
                Ok(size) => (None, Some(size)),
                Err(_) => (Some(FontStyle::parse(parts[1])?), None),
            },
            3 => {
                let style = if wildcard(parts[1]) {
                    None
                } else {
                    Some(FontStyle::parse(parts[1])?)
                };
                let size = if wildcard(parts[2]) {
                    None
                } else {
                    Some(parts[2].parse::<f32>().ok()?)
                };
                (style, size)
            }
            _ => return None,
        };
        if size.is_some_and(|s| s <= 0.0) {
            return None;
        }
        Some(Self { family, style, size })
    }

    pub fn resolve(&self, base: &Font) -> Font {
        Font {
            family: self.family.clone().unwrap_or_else(|| base.family.clone()),
            style: self.style.unwrap_or(base.style),
            size: self.size.unwrap_or(base.size),
        }
    }
}

/// Measurements the text area needs from the toolkit's font engine.
pub trait FontMetrics {
    /// Horizontal advance of `text` in pixels.
    fn text_width(&self, text: &str) -> f32;
    /// Distance between consecutive baselines in pixels.
    fn line_spacing(&self) -> f32;
}

impl<M: FontMetrics + ?Sized> FontMetrics for Box<M> {
    fn text_width(&self, text: &str) -> f32 {
        (**self).text_width(text)
    }

    fn line_spacing(&self) -> f32 {
        (**self).line_spacing()
    }
}

/// Size of one character cell, used to convert rows/columns to pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSize {
    pub width: f32,
    pub height: f32,
}

impl CellSize {
    /// Column width is the average of ten `m`s; row height is line spacing
    /// plus two pixels of padding.
    pub fn from_metrics(metrics: &dyn FontMetrics) -> Self {
        Self {
            width: metrics.text_width("mmmmmmmmmm") / 10.0,
            height: metrics.line_spacing() + 2.0,
        }
    }

    /// Whole cells that fit in `extent` pixels, given a cell dimension.
    pub fn cells_in(extent: f32, cell: f32) -> u32 {
        if cell <= 0.0 || extent <= 0.0 {
            0
        } else {
            // Sizes set from `n * cell` must read back as `n`.
            (extent / cell + 1e-3) as u32
        }
    }
}

/// Metrics with a constant advance per character.
#[derive(Debug, Clone, Copy)]
pub struct FixedMetrics {
    pub advance: f32,
    pub line_spacing: f32,
}

impl FixedMetrics {
    /// Rough monospace metrics for a font of `size` pixels.
    pub fn for_size(size: f32) -> Self {
        Self {
            advance: size * 0.6,
            line_spacing: size * 1.2,
        }
    }
}

impl FontMetrics for FixedMetrics {
    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance
    }

    fn line_spacing(&self) -> f32 {
        self.line_spacing
    }
}

/// Metrics read from a TrueType/OpenType font with fontdue.
pub struct FontdueMetrics {
    font: fontdue::Font,
    px: f32,
}

impl FontdueMetrics {
    pub fn from_bytes(data: &[u8], px: f32) -> Result<Self> {
        let font = fontdue::Font::from_bytes(data, fontdue::FontSettings::default())
            .map_err(|e| GuiError::Font(e.to_string()))?;
        Ok(Self { font, px })
    }

    pub fn from_file(path: &Path, px: f32) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(&data, px)
    }
}

impl FontMetrics for FontdueMetrics {
    fn text_width(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| self.font.metrics(c, self.px).advance_width)
            .sum()
    }

    fn line_spacing(&self) -> f32 {
        self.font
            .horizontal_line_metrics(self.px)
            .map(|m| m.new_line_size)
            .unwrap_or(self.px * 1.2)
    }
}
