//! Positioning and spacing policy tables.
//!
//! One dispatch per pipeline concern: the positioner asks where an
//! event's coordinate comes from, and how much horizontal room it is
//! entitled to. Adding an event kind means updating these two matches
//! and nothing else.

use crate::model::EventKind;
use serde::{Deserialize, Serialize};

/// Where an event's coordinate comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionPolicy {
    /// At the voice's current running coordinate (the default).
    /// Vertical stacking on a shared coordinate goes through multi-event
    /// children instead of a policy of its own.
    BeforeNext,
    /// Directly after the preceding event's rendered width, no gap
    Immediate,
    /// Deferred: takes the coordinate of the next positioned event
    WithNext,
    /// Never constrains spacing; zero width
    Invisible,
}

/// How much horizontal room an event is entitled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpacingPolicy {
    /// Width proportional to musical time (timed events)
    Proportional,
    /// Glyph takes room but must not consume rhythmic time (clefs,
    /// signs); may overlap backward into earlier no-space slack
    NoSpace,
    /// Takes no room at all
    None,
}

pub(crate) fn position_policy(kind: &EventKind) -> PositionPolicy {
    match kind {
        EventKind::Dot(_) => PositionPolicy::Immediate,
        // Text position depends on the note it is sung under, not on its
        // own (zero) time.
        EventKind::OriginalText(_) | EventKind::Annotation(_) => PositionPolicy::WithNext,
        EventKind::Proportion(_)
        | EventKind::ColorChange(_)
        | EventKind::LineEnd { .. }
        | EventKind::VariantStart(_)
        | EventKind::VariantEnd { .. }
        | EventKind::SectionEnd => PositionPolicy::Invisible,
        EventKind::Clef(_)
        | EventKind::Mensuration(_)
        | EventKind::ModernKeySignature { .. }
        | EventKind::Barline(_)
        | EventKind::Note(_)
        | EventKind::Rest(_)
        | EventKind::Lacuna(_)
        | EventKind::Multi(_) => PositionPolicy::BeforeNext,
    }
}

pub(crate) fn spacing_policy(kind: &EventKind) -> SpacingPolicy {
    match kind {
        EventKind::Note(_) | EventKind::Rest(_) | EventKind::Lacuna(_) | EventKind::Multi(_) => {
            SpacingPolicy::Proportional
        }
        EventKind::Clef(_)
        | EventKind::Mensuration(_)
        | EventKind::ModernKeySignature { .. }
        | EventKind::Barline(_)
        | EventKind::Dot(_) => SpacingPolicy::NoSpace,
        EventKind::Proportion(_)
        | EventKind::ColorChange(_)
        | EventKind::OriginalText(_)
        | EventKind::Annotation(_)
        | EventKind::LineEnd { .. }
        | EventKind::VariantStart(_)
        | EventKind::VariantEnd { .. }
        | EventKind::SectionEnd => SpacingPolicy::None,
    }
}
