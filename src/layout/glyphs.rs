//! Atomic drawable descriptors and the metrics seam.
//!
//! The engine decomposes every rendered event into `Glyph` placements
//! and asks a `GlyphMetrics` implementation for each glyph's reported
//! width and height. It never rasterizes; font-specific geometry lives
//! entirely behind the trait.

use super::constants::*;
use crate::model::{ClefKind, MensSign, NoteType};
use serde::{Deserialize, Serialize};

/// Accidental shapes drawn outside clef sets (modern signatures and
/// editorial accidentals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccidentalGlyph {
    Flat,
    Sharp,
    Natural,
}

/// One atomic drawable. Presentation layers map these to font glyphs or
/// path primitives; the engine only needs their reported extents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Glyph {
    Notehead {
        note_type: NoteType,
        colored: bool,
        modern: bool,
    },
    /// Ligature body segment joined to the previous notehead
    LigatureSegment {
        note_type: NoteType,
        colored: bool,
    },
    Stem {
        up: bool,
    },
    Flag,
    Rest(NoteType),
    ClefSign(ClefKind),
    MensurationSign(MensSign),
    Accidental(AccidentalGlyph),
    Dot,
    Barline {
        num_lines: i32,
    },
    Text(String),
    LigatureBracket,
    TieArc,
    VariantBracket,
    EditorialBracket,
    Custos,
}

/// The metrics seam: the engine asks for a glyph's reported extents and
/// nothing else.
pub trait GlyphMetrics {
    fn width(&self, glyph: &Glyph) -> f64;
    fn height(&self, glyph: &Glyph) -> f64;
}

/// Reference metrics with fixed per-glyph constants. Every width fits
/// inside the default minim allotment, so purely proportional spacing
/// stays proportional.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMetrics;

impl GlyphMetrics for DefaultMetrics {
    fn width(&self, glyph: &Glyph) -> f64 {
        match glyph {
            Glyph::Notehead { .. } => NOTEHEAD_WIDTH,
            Glyph::LigatureSegment { .. } => LIGATURE_SEGMENT_WIDTH,
            Glyph::Stem { .. } => 0.0,
            Glyph::Flag => 0.0,
            Glyph::Rest(_) => REST_WIDTH,
            Glyph::ClefSign(kind) if kind.is_accidental() => ACCIDENTAL_WIDTH,
            Glyph::ClefSign(_) => CLEF_WIDTH,
            Glyph::MensurationSign(_) => MENS_SIGN_WIDTH,
            Glyph::Accidental(_) => ACCIDENTAL_WIDTH,
            Glyph::Dot => DOT_WIDTH,
            Glyph::Barline { num_lines } => *num_lines as f64 * BARLINE_GLYPH_WIDTH,
            Glyph::Text(s) => s.chars().count() as f64 * TEXT_CHAR_WIDTH,
            Glyph::LigatureBracket | Glyph::VariantBracket | Glyph::EditorialBracket => {
                BRACKET_WIDTH
            }
            Glyph::TieArc => 0.0,
            Glyph::Custos => DOT_WIDTH,
        }
    }

    fn height(&self, glyph: &Glyph) -> f64 {
        match glyph {
            Glyph::Notehead { note_type, .. } | Glyph::LigatureSegment { note_type, .. } => {
                if note_type.stemmed() {
                    STEMMED_NOTE_HEIGHT
                } else {
                    NOTEHEAD_HEIGHT
                }
            }
            Glyph::Stem { .. } => STEMMED_NOTE_HEIGHT,
            Glyph::ClefSign(_) => CLEF_HEIGHT,
            Glyph::Text(_) => TEXT_HEIGHT,
            _ => SIGN_HEIGHT,
        }
    }
}
