//! Incremental span tracking for ligatures, ties and variant-reading
//! groups.
//!
//! Spans accumulate index ranges and pitch extremes during Phase 1;
//! Phase 2's coordinates later make them drawable. No horizontal
//! positioning happens here.

use serde::{Deserialize, Serialize};

/// A ligature or tie span over a voice's rendered-event list. `end` is
/// `None` while the span is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: Option<usize>,
    /// Whether presentation layers should draw the bracket or arc
    pub marked: bool,
    /// Highest staff position among member notes
    pub top: i32,
    /// Lowest staff position among member notes
    pub bottom: i32,
}

impl Span {
    fn open(start: usize, staff_pos: i32, marked: bool) -> Self {
        Span {
            start,
            end: None,
            marked,
            top: staff_pos,
            bottom: staff_pos,
        }
    }

    fn widen(&mut self, staff_pos: i32) {
        self.top = self.top.max(staff_pos);
        self.bottom = self.bottom.min(staff_pos);
    }
}

/// A variant-reading-group span, with a back-reference to its source
/// marker and the reading being shown (`None` = default reading).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSpan {
    pub start: usize,
    pub end: Option<usize>,
    pub marker_id: u32,
    pub reading: Option<usize>,
    /// Whether presentation layers should draw the bracket
    pub marked: bool,
    pub top: i32,
    pub bottom: i32,
}

/// All span bookkeeping for one voice during a render pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanSet {
    pub ligatures: Vec<Span>,
    pub ties: Vec<Span>,
    pub variants: Vec<VariantSpan>,
    open_ligature: Option<usize>,
    open_tie: Option<usize>,
    open_variant: Option<usize>,
}

impl SpanSet {
    /// Extend the open ligature with the note at `index`, opening a new
    /// span if none is open. `marked` controls whether the bracket is
    /// drawn. Returns the span index.
    pub fn ligature_member(&mut self, index: usize, staff_pos: i32, marked: bool) -> usize {
        match self.open_ligature {
            Some(s) => {
                self.ligatures[s].widen(staff_pos);
                s
            }
            None => {
                self.ligatures.push(Span::open(index, staff_pos, marked));
                let s = self.ligatures.len() - 1;
                self.open_ligature = Some(s);
                s
            }
        }
    }

    /// Close the open ligature at `index`. A single-member span is valid
    /// and closes immediately.
    pub fn close_ligature(&mut self, index: usize, staff_pos: i32) -> Option<usize> {
        let s = self.open_ligature.take()?;
        self.ligatures[s].widen(staff_pos);
        self.ligatures[s].end = Some(index);
        Some(s)
    }

    pub fn ligature_open(&self) -> bool {
        self.open_ligature.is_some()
    }

    pub fn tie_member(&mut self, index: usize, staff_pos: i32) -> usize {
        match self.open_tie {
            Some(s) => {
                self.ties[s].widen(staff_pos);
                s
            }
            None => {
                self.ties.push(Span::open(index, staff_pos, true));
                let s = self.ties.len() - 1;
                self.open_tie = Some(s);
                s
            }
        }
    }

    pub fn close_tie(&mut self, index: usize, staff_pos: i32) -> Option<usize> {
        let s = self.open_tie.take()?;
        self.ties[s].widen(staff_pos);
        self.ties[s].end = Some(index);
        Some(s)
    }

    pub fn tie_open(&self) -> bool {
        self.open_tie.is_some()
    }

    /// Open a variant-reading-group span at `index`.
    pub fn open_variant(
        &mut self,
        index: usize,
        marker_id: u32,
        reading: Option<usize>,
        marked: bool,
    ) -> usize {
        self.variants.push(VariantSpan {
            start: index,
            end: None,
            marker_id,
            reading,
            marked,
            top: i32::MIN,
            bottom: i32::MAX,
        });
        let s = self.variants.len() - 1;
        self.open_variant = Some(s);
        s
    }

    /// Close the open variant span at `index`; `None` if nothing is
    /// open (the stray-marker case).
    pub fn close_variant(&mut self, index: usize) -> Option<usize> {
        let s = self.open_variant.take()?;
        self.variants[s].end = Some(index);
        // A region with no pitched content gets a degenerate extent.
        if self.variants[s].top == i32::MIN {
            self.variants[s].top = 0;
            self.variants[s].bottom = 0;
        }
        Some(s)
    }

    pub fn open_variant_index(&self) -> Option<usize> {
        self.open_variant
    }

    /// Feed a pitched event's staff position to whatever spans are open.
    pub fn note_at(&mut self, staff_pos: i32) {
        if let Some(s) = self.open_ligature {
            self.ligatures[s].widen(staff_pos);
        }
        if let Some(s) = self.open_tie {
            self.ties[s].widen(staff_pos);
        }
        if let Some(s) = self.open_variant {
            let v = &mut self.variants[s];
            v.top = v.top.max(staff_pos);
            v.bottom = v.bottom.min(staff_pos);
        }
    }

    /// Force-close any spans still open at the end of a voice. Returns
    /// (ligature_was_open, tie_was_open) so the caller can diagnose.
    pub fn close_all(&mut self, last_index: usize) -> (bool, bool) {
        let lig = self.open_ligature.take().map(|s| {
            self.ligatures[s].end = Some(last_index);
        });
        let tie = self.open_tie.take().map(|s| {
            self.ties[s].end = Some(last_index);
        });
        if let Some(s) = self.open_variant.take() {
            self.variants[s].end = Some(last_index);
            if self.variants[s].top == i32::MIN {
                self.variants[s].top = 0;
                self.variants[s].bottom = 0;
            }
        }
        (lig.is_some(), tie.is_some())
    }
}
