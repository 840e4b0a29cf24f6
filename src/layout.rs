//! Glyph collection and line reconstruction.
//!
//! pdf-extract interprets the content stream and reports each shown character
//! to a [`GlyphCollector`] with its horizontal extent and baseline in user
//! space. [`assemble_text`] then rebuilds reading-order lines from those
//! positions.

use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};

// ── TextLayout ───────────────────────────────────────────────────────────────

/// Tolerances used to turn positioned glyphs back into lines of text.
///
/// The horizontal tolerance is looser than the vertical one: runs sitting on
/// the same visual line merge, distinct lines stay apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    /// Largest gap, in points, between two glyphs of the same word. A wider
    /// gap becomes a space.
    pub x_tolerance: f32,

    /// Largest baseline difference, in points, between glyphs of the same
    /// line.
    pub y_tolerance: f32,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            x_tolerance: 1.5,
            y_tolerance: 1.0,
        }
    }
}

/// One shown character code in user space.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Glyph {
    pub text: String,
    pub x0: f32,
    pub x1: f32,
    pub y: f32,
}

// ── Glyph collection ─────────────────────────────────────────────────────────

/// Records every character pdf-extract shows on a page.
///
/// `trm` is the text rendering matrix without the font size, so the glyph
/// origin is its translation and the advance is scaled by the matrix's
/// horizontal scale.
#[derive(Debug, Default)]
pub(crate) struct GlyphCollector {
    glyphs: Vec<Glyph>,
}

impl GlyphCollector {
    pub(crate) fn into_glyphs(self) -> Vec<Glyph> {
        self.glyphs
    }
}

impl OutputDev for GlyphCollector {
    fn begin_page(
        &mut self,
        _page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> std::result::Result<(), OutputError> {
        self.glyphs.clear();
        Ok(())
    }

    fn end_page(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        text: &str,
    ) -> std::result::Result<(), OutputError> {
        let scale = (trm.m11 * trm.m11 + trm.m12 * trm.m12).sqrt();
        let x0 = trm.m31;
        self.glyphs.push(Glyph {
            text: text.to_owned(),
            x0: x0 as f32,
            x1: (x0 + width * font_size * scale) as f32,
            y: trm.m32 as f32,
        });
        Ok(())
    }

    fn begin_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }
}

// ── Line assembly ────────────────────────────────────────────────────────────

/// Rebuild page text from positioned glyphs.
///
/// Glyphs are taken top to bottom; a glyph whose baseline lies within
/// `y_tolerance` of the current line's baseline joins that line. Each line is
/// read left to right, with a space wherever the gap to the previous glyph
/// exceeds `x_tolerance`. Returns `None` when nothing but whitespace was
/// drawn.
pub(crate) fn assemble_text(glyphs: &[Glyph], layout: &TextLayout) -> Option<String> {
    let mut ordered: Vec<&Glyph> = glyphs.iter().filter(|g| !g.text.is_empty()).collect();
    ordered.sort_by(|a, b| b.y.total_cmp(&a.y));

    let mut lines: Vec<Vec<&Glyph>> = Vec::new();
    let mut baseline = 0.0_f32;
    for glyph in ordered {
        let same_line = !lines.is_empty() && (baseline - glyph.y).abs() <= layout.y_tolerance;
        match lines.last_mut() {
            Some(line) if same_line => line.push(glyph),
            _ => {
                baseline = glyph.y;
                lines.push(vec![glyph]);
            }
        }
    }

    let text = lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            join_line(&line, layout.x_tolerance)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}

fn join_line(line: &[&Glyph], x_tolerance: f32) -> String {
    let mut out = String::new();
    let mut right_edge: Option<f32> = None;

    for glyph in line {
        if let Some(edge) = right_edge {
            let separated = glyph.x0 - edge > x_tolerance;
            if separated && !out.ends_with(char::is_whitespace) && !glyph.text.starts_with(char::is_whitespace) {
                out.push(' ');
            }
        }
        out.push_str(&glyph.text);
        right_edge = Some(right_edge.map_or(glyph.x1, |edge| edge.max(glyph.x1)));
    }

    out.trim_end().to_owned()
}
