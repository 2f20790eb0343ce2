//! Measure aggregates: the shared time-range grid all voices align to.

use super::rendered::StateSnapshot;
use crate::proportion::Proportion;
use serde::{Deserialize, Serialize};

/// One measure of the section.
///
/// Invariant: `width` covers whichever voice needed the most room in
/// this interval; the positioner widens it for all voices together so
/// barlines stay vertically aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    /// 0-based measure number within the section
    pub number: usize,
    /// Musical time at which the measure starts, in minims
    pub start_time: Proportion,
    /// Length in minims
    pub num_minims: Proportion,
    /// Per-voice index of the first rendered event in this measure
    pub voice_start: Vec<usize>,
    /// Per-voice notational state at the measure start
    pub voice_state: Vec<Option<StateSnapshot>>,
    /// Per-voice tempo proportion in effect at the measure start
    pub tempo: Vec<Proportion>,
    /// Horizontal width shared by all voices
    pub width: f64,
    /// Whether some voice has fully traversed the measure, fixing its
    /// horizontal scale against retroactive mensuration changes
    pub(crate) scale_fixed: bool,
}

impl Measure {
    fn new(number: usize, start_time: Proportion, num_minims: Proportion, num_voices: usize) -> Self {
        Measure {
            number,
            start_time,
            num_minims,
            voice_start: vec![0; num_voices],
            voice_state: vec![None; num_voices],
            tempo: vec![Proportion::one(); num_voices],
            width: 0.0,
            scale_fixed: false,
        }
    }

    pub fn end_time(&self) -> Proportion {
        self.start_time + self.num_minims
    }
}

/// The growing measure list shared by all voices of one section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasureList {
    pub measures: Vec<Measure>,
    num_voices: usize,
    /// Minim-to-unit scale used for initial proportional widths
    minim_width: f64,
}

impl MeasureList {
    pub(crate) fn new(num_voices: usize, minim_width: f64) -> Self {
        MeasureList {
            measures: Vec::new(),
            num_voices,
            minim_width,
        }
    }

    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    /// Get measure `idx`, creating it (and any gap before it) if
    /// needed. New measures take `num_minims` as their length and a
    /// purely proportional initial width.
    pub(crate) fn ensure(&mut self, idx: usize, num_minims: Proportion) -> &mut Measure {
        while self.measures.len() <= idx {
            let number = self.measures.len();
            let start_time = self
                .measures
                .last()
                .map_or(Proportion::zero(), Measure::end_time);
            let mut m = Measure::new(number, start_time, num_minims, self.num_voices);
            m.width = num_minims.as_f64() * self.minim_width;
            self.measures.push(m);
        }
        &mut self.measures[idx]
    }

    /// Retroactively rescale measure `idx` for a mensuration change that
    /// takes effect strictly inside it. Only allowed while no voice has
    /// fixed the measure's scale; later measures' start times shift
    /// accordingly because they are derived on creation only, so this
    /// must happen before any later measure exists.
    pub(crate) fn rescale(&mut self, idx: usize, new_minims: Proportion) {
        let can_rescale = idx == self.measures.len() - 1;
        let m = &mut self.measures[idx];
        if m.scale_fixed || !can_rescale {
            return;
        }
        if new_minims > m.num_minims {
            let delta = new_minims - m.num_minims;
            m.num_minims = new_minims;
            m.width += delta.as_f64() * self.minim_width;
        }
    }

    pub(crate) fn fix_scale(&mut self, idx: usize) {
        if let Some(m) = self.measures.get_mut(idx) {
            m.scale_fixed = true;
        }
    }
}
