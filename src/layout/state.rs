//! Per-voice render state.
//!
//! One explicit context struct per voice per pass, threaded through the
//! builder instead of scattered mutable fields. The persistable subset
//! (`VoiceState`) is what chains from one section to the next.

use super::rendered::StateSnapshot;
use super::spans::SpanSet;
use crate::model::{ClefSet, Coloration, Mensuration, Voice};
use crate::options::VersionSelection;
use crate::proportion::Proportion;
use serde::{Deserialize, Serialize};

/// The per-voice state that survives a section boundary: active clefs,
/// mensuration, running proportion and coloration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VoiceState {
    pub clef_set: ClefSet,
    pub mensuration: Mensuration,
    pub proportion: Proportion,
    pub coloration: Coloration,
}

impl VoiceState {
    pub fn initial() -> Self {
        VoiceState {
            clef_set: ClefSet::default(),
            mensuration: Mensuration::default(),
            proportion: Proportion::one(),
            coloration: Coloration::default(),
        }
    }
}

/// All mutable per-voice state for one render pass. Exclusively owned
/// by the pass; dropped when the pass publishes its result.
#[derive(Debug, Clone)]
pub(crate) struct VoiceContext {
    /// 0-based voice index within the section
    pub voice: usize,
    pub clef_set: ClefSet,
    /// The signature as last actually displayed (skipped redundant
    /// signatures leave this unchanged)
    pub last_signature: ClefSet,
    /// Last displayed modern key signature, when the modern accidental
    /// system is active
    pub last_fifths: i32,
    pub mensuration: Mensuration,
    /// Running rhythmic proportion (nominal lengths divide by this)
    pub proportion: Proportion,
    /// Running tempo proportion from mensuration signs
    pub tempo: Proportion,
    pub coloration: Coloration,
    /// Inside an editorially supplied passage
    pub editorial: bool,
    /// Inside a lacuna
    pub lacuna: bool,
    /// Music-time cursor, in minims from the section start
    pub time: Proportion,
    /// Current measure index
    pub measure: usize,
    pub spans: SpanSet,
    /// Voice missing in the displayed version: render grayed
    pub missing: bool,
    /// Error-respacing deadline for an overlong variant reading
    pub catch_up_deadline: Option<Proportion>,
}

impl VoiceContext {
    pub fn new(voice_idx: usize, voice: &Voice, state: &VoiceState, version: &VersionSelection) -> Self {
        VoiceContext {
            voice: voice_idx,
            clef_set: state.clef_set.clone(),
            last_signature: state.clef_set.clone(),
            last_fifths: 0,
            mensuration: state.mensuration.clone(),
            proportion: if state.proportion.is_zero() {
                Proportion::one()
            } else {
                state.proportion
            },
            tempo: if state.mensuration.tempo_change.is_zero() {
                Proportion::one()
            } else {
                state.mensuration.tempo_change
            },
            coloration: state.coloration,
            editorial: false,
            lacuna: false,
            time: Proportion::zero(),
            measure: 0,
            spans: SpanSet::default(),
            missing: voice.is_missing_in(version.as_deref()),
            catch_up_deadline: None,
        }
    }

    /// The notational state snapshot recorded on rendered events and
    /// measure starts.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            clef_set: self.clef_set.clone(),
            mensuration: self.mensuration.clone(),
            coloration: self.coloration,
            proportion: self.proportion,
        }
    }

    /// The persistable ending state handed to the next section.
    pub fn ending_state(&self) -> VoiceState {
        VoiceState {
            clef_set: self.clef_set.clone(),
            mensuration: self.mensuration.clone(),
            proportion: self.proportion,
            coloration: self.coloration,
        }
    }

    /// Combined duration divisor: the running proportion times the
    /// mensuration's tempo ratio.
    pub fn time_scale(&self) -> Proportion {
        self.proportion * self.tempo
    }

    /// Length of one measure in effective minims under the current
    /// mensuration and tempo.
    pub fn measure_length(&self) -> Proportion {
        self.mensuration.breve_length() / self.tempo
    }

    /// Scale a nominal duration by the running proportion and tempo,
    /// then truncate against the catch-up deadline. Returns (effective
    /// length, whether the catch-up override applies to this event).
    pub fn scaled_length(&mut self, nominal: Proportion) -> (Proportion, bool) {
        let mut effective = nominal / self.time_scale();
        match self.catch_up_deadline {
            Some(deadline) => {
                let remaining = deadline - self.time;
                if effective > remaining {
                    effective = remaining.max(Proportion::zero());
                }
                (effective, true)
            }
            None => (effective, false),
        }
    }

    /// Advance the time cursor, clearing the catch-up deadline once it
    /// is reached. While a variant region is still open the deadline
    /// stays armed even at zero remaining, so the rest of the reading
    /// keeps truncating to nothing.
    pub fn advance(&mut self, effective: Proportion) {
        self.time += effective;
        if let Some(deadline) = self.catch_up_deadline {
            if self.time >= deadline && self.spans.open_variant_index().is_none() {
                self.catch_up_deadline = None;
            }
        }
    }
}
