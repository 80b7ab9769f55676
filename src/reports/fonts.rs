// src/reports/fonts.rs
//! Embedded TrueType font: loading, shaping and the metrics the PDF writer
//! needs to declare it as a Type0 / Identity-H font.
//!
//! Text is split into direction runs, each run is shaped with rustybuzz, and
//! runs are laid out in visual order. Arabic labels come out joined and
//! right to left; digits and Latin text inside them stay left to right.

use std::path::Path;

use anyhow::{Context, Result};
use rustybuzz::{Direction, Feature, UnicodeBuffer};
use ttf_parser::{GlyphId, Tag};

/// Thousandths of an em, the unit PDF glyph widths are written in.
const PDF_UNITS: f32 = 1000.0;

pub struct ReportFont {
    data: Vec<u8>,
    postscript_name: String,
    scale: f32,
    pub metrics: FontMetrics,
}

impl std::fmt::Debug for ReportFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportFont")
            .field("postscript_name", &self.postscript_name)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// Font-wide values for the FontDescriptor, already in PDF units.
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: f32,
    pub bbox: [f32; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapedGlyph {
    pub id: u16,
    /// Advance and horizontal offset, in thousandths of an em.
    pub advance: f32,
    pub x_offset: f32,
    /// Source characters this glyph stands for; empty for the extra glyphs
    /// of a multi-glyph cluster.
    pub text: String,
}

/// Glyphs in visual (left to right) order.
#[derive(Debug, Clone, Default)]
pub struct ShapedText {
    pub glyphs: Vec<ShapedGlyph>,
    advance: f32,
}

impl ShapedText {
    pub fn width(&self, size: f32) -> f32 {
        self.advance * size / PDF_UNITS
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunDirection {
    Ltr,
    Rtl,
}

impl ReportFont {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read report font {}", path.display()))?;
        let font = Self::from_bytes(data)
            .with_context(|| format!("Invalid report font {}", path.display()))?;
        log::info!("Report font loaded: {} ({})", font.postscript_name, path.display());
        Ok(font)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, 0).context("Not a TrueType font")?;

        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            anyhow::bail!("Font declares zero units per em");
        }
        let scale = PDF_UNITS / units_per_em as f32;

        let postscript_name = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .and_then(|n| n.to_string())
            .or_else(|| {
                face.names()
                    .into_iter()
                    .find(|n| n.name_id == ttf_parser::name_id::FULL_NAME)
                    .and_then(|n| n.to_string())
                    .map(|name| name.replace(' ', ""))
            })
            .unwrap_or_else(|| "ReportFont".to_string());

        let bbox = face.global_bounding_box();
        let metrics = FontMetrics {
            ascent: face.ascender() as f32 * scale,
            descent: face.descender() as f32 * scale,
            cap_height: face.capital_height().unwrap_or(face.ascender()) as f32 * scale,
            bbox: [
                bbox.x_min as f32 * scale,
                bbox.y_min as f32 * scale,
                bbox.x_max as f32 * scale,
                bbox.y_max as f32 * scale,
            ],
        };

        if rustybuzz::Face::from_slice(&data, 0).is_none() {
            anyhow::bail!("Font cannot be used for shaping");
        }

        Ok(Self { data, postscript_name, scale, metrics })
    }

    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Default advance of each glyph from `hmtx`, in PDF units.
    pub fn advance_widths(&self, glyphs: impl IntoIterator<Item = u16>) -> Vec<(u16, f32)> {
        let Ok(face) = ttf_parser::Face::parse(&self.data, 0) else {
            return Vec::new();
        };
        glyphs
            .into_iter()
            .map(|id| {
                let advance = face.glyph_hor_advance(GlyphId(id)).unwrap_or(0);
                (id, advance as f32 * self.scale)
            })
            .collect()
    }

    pub fn shape(&self, text: &str) -> ShapedText {
        let mut shaped = ShapedText::default();
        if text.is_empty() {
            return shaped;
        }
        let Some(face) = rustybuzz::Face::from_slice(&self.data, 0) else {
            return shaped;
        };
        let features = [
            Feature::new(Tag::from_bytes(b"kern"), 1, ..),
            Feature::new(Tag::from_bytes(b"liga"), 1, ..),
        ];

        let (base, mut runs) = direction_runs(text);
        if base == RunDirection::Rtl {
            runs.reverse();
        }

        for (direction, run) in runs {
            let mut buffer = UnicodeBuffer::new();
            buffer.push_str(run);
            buffer.guess_segment_properties();
            buffer.set_direction(match direction {
                RunDirection::Ltr => Direction::LeftToRight,
                RunDirection::Rtl => Direction::RightToLeft,
            });

            let output = rustybuzz::shape(&face, &features, buffer);
            let mut clusters: Vec<usize> = output.glyph_infos().iter().map(|i| i.cluster as usize).collect();
            clusters.sort_unstable();
            clusters.dedup();

            let mut seen = Vec::with_capacity(clusters.len());
            for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
                let start = info.cluster as usize;
                let text = if seen.contains(&start) {
                    String::new()
                } else {
                    seen.push(start);
                    let end = clusters
                        .iter()
                        .copied()
                        .find(|&c| c > start)
                        .unwrap_or(run.len());
                    run.get(start..end).unwrap_or_default().to_string()
                };

                let advance = pos.x_advance as f32 * self.scale;
                shaped.advance += advance;
                shaped.glyphs.push(ShapedGlyph {
                    id: u16::try_from(info.glyph_id).unwrap_or(0),
                    advance,
                    x_offset: pos.x_offset as f32 * self.scale,
                    text,
                });
            }
        }

        shaped
    }
}

fn is_right_to_left(ch: char) -> bool {
    matches!(ch as u32,
        0x0590..=0x08FF | 0xFB1D..=0xFDFF | 0xFE70..=0xFEFF)
}

fn strong_direction(ch: char) -> Option<RunDirection> {
    if is_right_to_left(ch) {
        Some(RunDirection::Rtl)
    } else if ch.is_alphanumeric() {
        Some(RunDirection::Ltr)
    } else {
        None
    }
}

/// Splits `text` into runs of one direction, in logical order. Neutral
/// characters (spaces, punctuation) stay with the run before them. The base
/// direction is the one of the first strong character.
fn direction_runs(text: &str) -> (RunDirection, Vec<(RunDirection, &str)>) {
    let base = text
        .chars()
        .find_map(strong_direction)
        .unwrap_or(RunDirection::Ltr);

    let mut runs = Vec::new();
    let mut current = base;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        if let Some(direction) = strong_direction(ch) {
            if direction != current {
                if idx > start {
                    runs.push((current, &text[start..idx]));
                }
                start = idx;
                current = direction;
            }
        }
    }
    if start < text.len() {
        runs.push((current, &text[start..]));
    }
    (base, runs)
}

/// The font shipped in `assets/fonts`, loaded once per test binary.
#[cfg(test)]
pub fn bundled_font() -> std::sync::Arc<ReportFont> {
    use std::sync::{Arc, OnceLock};

    static FONT: OnceLock<Arc<ReportFont>> = OnceLock::new();
    FONT.get_or_init(|| {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fonts/DejaVuSans.ttf");
        Arc::new(ReportFont::load(path).expect("bundled font"))
    })
    .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_runs() {
        let (base, runs) = direction_runs("Total général");
        assert_eq!(base, RunDirection::Ltr);
        assert_eq!(runs, vec![(RunDirection::Ltr, "Total général")]);

        let (base, runs) = direction_runs("من 01/01/2024 إلى 03/01/2024");
        assert_eq!(base, RunDirection::Rtl);
        assert_eq!(
            runs,
            vec![
                (RunDirection::Rtl, "من "),
                (RunDirection::Ltr, "01/01/2024 "),
                (RunDirection::Rtl, "إلى "),
                (RunDirection::Ltr, "03/01/2024"),
            ]
        );

        let (base, runs) = direction_runs("12 500");
        assert_eq!(base, RunDirection::Ltr);
        assert_eq!(runs.len(), 1);
    }

    #[test]
    fn test_arabic_is_shaped_with_real_glyphs() {
        let font = bundled_font();
        let shaped = font.shape("دجاج");
        assert!(!shaped.is_empty());
        assert!(shaped.glyphs.iter().all(|g| g.id != 0), "missing glyph in {:?}", shaped.glyphs);
        assert!(shaped.width(10.0) > 0.0);

        // every source character is still recoverable for copy and search
        let text: String = shaped.glyphs.iter().rev().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "دجاج");
    }

    #[test]
    fn test_latin_keeps_logical_order() {
        let font = bundled_font();
        let shaped = font.shape("Pesée");
        let text: String = shaped.glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "Pesée");
        assert!(shaped.glyphs.iter().all(|g| g.id != 0));
    }

    #[test]
    fn test_width_scales_with_size() {
        let font = bundled_font();
        let shaped = font.shape("1 200");
        let narrow = shaped.width(8.0);
        assert!(narrow > 0.0);
        assert!((shaped.width(16.0) - 2.0 * narrow).abs() < 1e-3);
        assert_eq!(font.shape("").width(12.0), 0.0);
    }

    #[test]
    fn test_advance_widths_match_shaping_for_plain_text() {
        let font = bundled_font();
        let shaped = font.shape("2024");
        let widths = font.advance_widths(shaped.glyphs.iter().map(|g| g.id));
        assert_eq!(widths.len(), 4);
        for (glyph, (id, width)) in shaped.glyphs.iter().zip(widths) {
            assert_eq!(glyph.id, id);
            assert!(width > 0.0);
            assert!((glyph.advance - width).abs() < 0.5);
        }
    }

    #[test]
    fn test_rejects_non_font_data() {
        assert!(ReportFont::from_bytes(b"not a font".to_vec()).is_err());
        assert!(ReportFont::load("/nonexistent/font.ttf").is_err());
    }
}
