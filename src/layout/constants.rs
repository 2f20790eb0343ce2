//! Shared constants for the layout engine (all in layout units).

// ── Horizontal scale defaults ───────────────────────────────────────
pub(crate) const DEFAULT_MINIM_WIDTH: f64 = 25.0; // layout units per minim
pub(crate) const DEFAULT_BARLINE_PADDING: f64 = 8.0; // after every barline

// ── Reference glyph widths (reported by DefaultMetrics) ─────────────
pub(super) const NOTEHEAD_WIDTH: f64 = 9.0;
pub(super) const LIGATURE_SEGMENT_WIDTH: f64 = 12.0; // obliqua/recta body per member
pub(super) const REST_WIDTH: f64 = 7.0;
pub(super) const CLEF_WIDTH: f64 = 12.0;
pub(super) const ACCIDENTAL_WIDTH: f64 = 6.0;
pub(super) const MENS_SIGN_WIDTH: f64 = 12.0;
pub(super) const DOT_WIDTH: f64 = 3.0;
pub(super) const BARLINE_GLYPH_WIDTH: f64 = 2.0;
pub(super) const TEXT_CHAR_WIDTH: f64 = 5.5;
pub(super) const BRACKET_WIDTH: f64 = 4.0;

// ── Reference glyph heights ─────────────────────────────────────────
pub(super) const NOTEHEAD_HEIGHT: f64 = 5.0;
pub(super) const STEMMED_NOTE_HEIGHT: f64 = 20.0;
pub(super) const CLEF_HEIGHT: f64 = 20.0;
pub(super) const SIGN_HEIGHT: f64 = 12.0;
pub(super) const TEXT_HEIGHT: f64 = 10.0;
