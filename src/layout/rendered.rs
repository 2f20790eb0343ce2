//! The positioned decoration of one source event, plus its glyph
//! decomposition.

use super::glyphs::{AccidentalGlyph, Glyph, GlyphMetrics};
use super::policy::{position_policy, spacing_policy, PositionPolicy, SpacingPolicy};
use crate::model::{ClefSet, Coloration, Event, EventKind, Mensuration};
use crate::options::{DisplayOptions, NoteShapeMode, TextDisplay};
use crate::proportion::Proportion;
use serde::{Deserialize, Serialize};

/// Snapshot of the per-voice notational state active at one event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub clef_set: ClefSet,
    pub mensuration: Mensuration,
    pub coloration: Coloration,
    pub proportion: Proportion,
}

/// One atomic glyph placed relative to its owning event's coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphPlacement {
    pub glyph: Glyph,
    /// Horizontal offset from the event's x
    pub dx: f64,
    /// Vertical placement as a staff position (bottom line = 0)
    pub staff_pos: i32,
}

/// The positioned decoration of one source event within a voice's
/// output stream. Created in Phase 1; `x` is assigned in Phase 2.
///
/// Invariant: within one voice's output list, `x` is non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedEvent {
    /// The source event (or a synthesized substitute)
    pub event: Event,
    /// Index into the voice's source event list; `None` for synthesized
    /// events
    pub source_index: Option<usize>,
    /// Horizontal coordinate, assigned by the positioner
    pub x: f64,
    /// Musical time at which the event starts, in minims
    pub time: Proportion,
    /// Effective duration after proportion/tempo scaling and any variant
    /// respacing truncation
    pub length: Proportion,
    /// Owning measure number (0-based)
    pub measure: usize,
    pub state: StateSnapshot,
    /// Index into the voice's ligature span list, if a ligature is open
    /// at this event
    pub ligature: Option<usize>,
    pub tie: Option<usize>,
    pub variant: Option<usize>,
    /// Atomic placement descriptors presentation layers draw
    pub placements: Vec<GlyphPlacement>,
    /// Missing in the displayed version; forces grayed or suppressed
    /// rendering downstream
    pub missing: bool,
    /// Variant catch-up override: positioned immediately with zero
    /// proportional width regardless of declared policy
    pub catch_up: bool,
    /// Child events sharing this timeline slot (multi-events)
    pub children: Vec<RenderedEvent>,
}

impl RenderedEvent {
    pub(crate) fn new(
        event: Event,
        source_index: Option<usize>,
        time: Proportion,
        state: StateSnapshot,
    ) -> Self {
        RenderedEvent {
            event,
            source_index,
            x: 0.0,
            time,
            length: Proportion::zero(),
            measure: 0,
            state,
            ligature: None,
            tie: None,
            variant: None,
            placements: Vec::new(),
            missing: false,
            catch_up: false,
            children: Vec::new(),
        }
    }

    pub fn is_untimed(&self) -> bool {
        self.length.is_zero()
    }

    pub fn position_policy(&self) -> PositionPolicy {
        position_policy(&self.event.kind)
    }

    pub fn spacing_policy(&self) -> SpacingPolicy {
        spacing_policy(&self.event.kind)
    }

    /// Total reported width of the event's glyph decomposition.
    pub fn width(&self, metrics: &dyn GlyphMetrics) -> f64 {
        let own = self
            .placements
            .iter()
            .map(|p| p.dx + metrics.width(&p.glyph))
            .fold(0.0, f64::max);
        let children = self
            .children
            .iter()
            .map(|c| c.width(metrics))
            .fold(0.0, f64::max);
        own.max(children)
    }
}

/// Decompose an event into its atomic placements. Purely shape
/// bookkeeping; nothing here knows about coordinates.
pub(crate) fn decompose(
    event: &Event,
    state: &StateSnapshot,
    options: &DisplayOptions,
) -> Vec<GlyphPlacement> {
    let mut out = Vec::new();
    match &event.kind {
        EventKind::Note(n) => {
            let staff_pos = state
                .clef_set
                .principal
                .as_ref()
                .map_or(4, |c| n.pitch.staff_position(c));
            let modern = options.note_shape_mode == NoteShapeMode::Modern;
            if n.ligature {
                out.push(GlyphPlacement {
                    glyph: Glyph::LigatureSegment {
                        note_type: n.note_type,
                        colored: n.colored,
                    },
                    dx: 0.0,
                    staff_pos,
                });
            } else {
                out.push(GlyphPlacement {
                    glyph: Glyph::Notehead {
                        note_type: n.note_type,
                        colored: n.colored,
                        modern,
                    },
                    dx: 0.0,
                    staff_pos,
                });
            }
            if n.note_type.stemmed() {
                out.push(GlyphPlacement {
                    glyph: Glyph::Stem { up: staff_pos < 4 },
                    dx: 0.0,
                    staff_pos,
                });
            }
            if let Some(acc) = n.modern_accidental {
                let glyph = match acc.cmp(&0) {
                    std::cmp::Ordering::Less => AccidentalGlyph::Flat,
                    std::cmp::Ordering::Equal => AccidentalGlyph::Natural,
                    std::cmp::Ordering::Greater => AccidentalGlyph::Sharp,
                };
                out.push(GlyphPlacement {
                    glyph: Glyph::Accidental(glyph),
                    dx: 0.0,
                    staff_pos: staff_pos + 7,
                });
            }
            if options.text_display.shows_modern() {
                if let Some(syl) = &n.syllable {
                    out.push(GlyphPlacement {
                        glyph: Glyph::Text(syl.text.clone()),
                        dx: 0.0,
                        staff_pos: -6,
                    });
                }
            }
        }
        EventKind::Rest(r) => {
            out.push(GlyphPlacement {
                glyph: Glyph::Rest(r.note_type),
                dx: 0.0,
                staff_pos: 4,
            });
        }
        EventKind::Clef(c) => {
            out.push(GlyphPlacement {
                glyph: Glyph::ClefSign(c.kind),
                dx: 0.0,
                staff_pos: (c.line - 1) * 2,
            });
        }
        EventKind::Mensuration(m) => {
            if let Some(sign) = m.sign {
                out.push(GlyphPlacement {
                    glyph: Glyph::MensurationSign(sign),
                    dx: 0.0,
                    staff_pos: 4,
                });
            }
        }
        EventKind::ModernKeySignature { fifths } => {
            let glyph = if *fifths >= 0 {
                AccidentalGlyph::Sharp
            } else {
                AccidentalGlyph::Flat
            };
            for i in 0..fifths.unsigned_abs() {
                out.push(GlyphPlacement {
                    glyph: Glyph::Accidental(glyph),
                    dx: i as f64 * super::constants::ACCIDENTAL_WIDTH,
                    staff_pos: 4,
                });
            }
        }
        EventKind::Dot(_) => {
            out.push(GlyphPlacement {
                glyph: Glyph::Dot,
                dx: 0.0,
                staff_pos: 5,
            });
        }
        EventKind::Barline(b) => {
            out.push(GlyphPlacement {
                glyph: Glyph::Barline {
                    num_lines: b.num_lines,
                },
                dx: 0.0,
                staff_pos: 0,
            });
        }
        EventKind::OriginalText(text) => {
            if options.text_display.shows_original() {
                out.push(GlyphPlacement {
                    glyph: Glyph::Text(text.clone()),
                    dx: 0.0,
                    staff_pos: -6,
                });
            }
        }
        EventKind::Annotation(text) => {
            if options.editorial_tags {
                out.push(GlyphPlacement {
                    glyph: Glyph::Text(text.clone()),
                    dx: 0.0,
                    staff_pos: 10,
                });
            }
        }
        // Lacunae, markers, proportions, line ends and fillers have no
        // drawable of their own.
        EventKind::Lacuna(_)
        | EventKind::Proportion(_)
        | EventKind::ColorChange(_)
        | EventKind::LineEnd { .. }
        | EventKind::VariantStart(_)
        | EventKind::VariantEnd { .. }
        | EventKind::Multi(_)
        | EventKind::SectionEnd => {}
    }
    // Editorially supplied or error-flagged material gets the bracket.
    if (event.editorial || event.error)
        && options.editorial_tags
        && !matches!(event.kind, EventKind::Multi(_))
    {
        if !out.is_empty() {
            out.push(GlyphPlacement {
                glyph: Glyph::EditorialBracket,
                dx: 0.0,
                staff_pos: 9,
            });
        }
    }
    if options.text_display == TextDisplay::None {
        out.retain(|p| !matches!(p.glyph, Glyph::Text(_)));
    }
    out
}
