//! Phase 1: render-list construction.
//!
//! Each voice's event sequence is walked independently, applying the
//! display-option-driven substitutions (clef replacement, redundant
//! signature elision, flat-cancellation naturals, text filtering) and
//! the variant-reading selection and length-reconciliation policy. The
//! output is an ordered list of decorated but not yet positioned
//! `RenderedEvent`s plus measure-boundary assignments; Phase 2 assigns
//! coordinates.

use super::measure::MeasureList;
use super::policy::{spacing_policy, SpacingPolicy};
use super::rendered::{decompose, RenderedEvent};
use super::state::VoiceContext;
use crate::error::Diagnostic;
use crate::model::{Clef, ClefKind, Event, EventKind, Mensuration, Voice, VariantMarker};
use crate::options::{AccidentalMode, ClefMode, DisplayOptions, VariantMarking, VersionSelection};
use crate::proportion::Proportion;

/// Build one voice's render list. Measures are created/extended in the
/// shared `MeasureList` as the voice reaches them; call `fill_to_end`
/// once the total measure count is known.
pub(crate) fn build_voice(
    voice: &Voice,
    options: &DisplayOptions,
    version: &VersionSelection,
    measures: &mut MeasureList,
    ctx: &mut VoiceContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<RenderedEvent> {
    let mut builder = Builder {
        options,
        version,
        measures,
        ctx,
        diagnostics,
        out: Vec::new(),
    };

    // Open measure 0 for this voice.
    let breve = builder.ctx.measure_length();
    let m = builder.measures.ensure(0, breve);
    m.voice_start[builder.ctx.voice] = 0;
    m.voice_state[builder.ctx.voice] = Some(builder.ctx.snapshot());
    m.tempo[builder.ctx.voice] = builder.ctx.tempo;

    builder.walk(&voice.events, Some(0));
    builder.out
}

/// Pad a voice whose events ended early with "no further content"
/// fillers so every voice traverses every measure and downstream layout
/// stays rectangular. Also force-closes any dangling spans.
pub(crate) fn fill_to_end(
    total_measures: usize,
    measures: &mut MeasureList,
    ctx: &mut VoiceContext,
    out: &mut Vec<RenderedEvent>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    loop {
        let end = measures.measures[ctx.measure].end_time();
        if ctx.time < end {
            let gap = end - ctx.time;
            let mut filler = RenderedEvent::new(
                Event::new(EventKind::SectionEnd),
                None,
                ctx.time,
                ctx.snapshot(),
            );
            filler.measure = ctx.measure;
            filler.missing = ctx.missing;
            filler.length = gap;
            out.push(filler);
            ctx.time += gap;
        }
        if ctx.measure + 1 >= total_measures {
            break;
        }
        measures.fix_scale(ctx.measure);
        ctx.measure += 1;
        let breve = ctx.measure_length();
        let m = measures.ensure(ctx.measure, breve);
        m.voice_start[ctx.voice] = out.len();
        m.voice_state[ctx.voice] = Some(ctx.snapshot());
        m.tempo[ctx.voice] = ctx.tempo;
    }

    let last = out.len().saturating_sub(1);
    let (lig_open, tie_open) = ctx.spans.close_all(last);
    if lig_open {
        Diagnostic::UnclosedLigature { voice: ctx.voice }.emit(diagnostics);
    }
    if tie_open {
        Diagnostic::UnclosedTie { voice: ctx.voice }.emit(diagnostics);
    }
}

struct Builder<'a> {
    options: &'a DisplayOptions,
    version: &'a VersionSelection,
    measures: &'a mut MeasureList,
    ctx: &'a mut VoiceContext,
    diagnostics: &'a mut Vec<Diagnostic>,
    out: Vec<RenderedEvent>,
}

impl<'a> Builder<'a> {
    /// Walk a run of events. `source_base` is the index of the first
    /// event within the voice's source list, or `None` when walking a
    /// variant reading's substitute events (which have no source
    /// indices and in which nested variant markers are ignored).
    fn walk(&mut self, events: &[Event], source_base: Option<usize>) {
        let mut i = 0;
        let mut skipped_markers: Vec<u32> = Vec::new();
        while i < events.len() {
            let src = source_base.map(|b| b + i);
            match &events[i].kind {
                EventKind::Clef(c) if c.signature => {
                    i = self.signature_block(events, i, src);
                }
                EventKind::VariantStart(marker) => {
                    if source_base.is_some() {
                        i = self.variant_region(events, i, marker.clone(), src);
                    } else {
                        // Markers inside substitute readings carry no
                        // region of their own; remember the id so the
                        // paired end marker passes silently.
                        skipped_markers.push(marker.id);
                        i += 1;
                    }
                }
                EventKind::VariantEnd { marker_id } => {
                    // Matched end markers are consumed by
                    // `variant_region`; reaching an unpaired one here
                    // means it is stray.
                    match skipped_markers.iter().rposition(|id| id == marker_id) {
                        Some(p) => {
                            skipped_markers.remove(p);
                        }
                        None => {
                            Diagnostic::UnmatchedVariantEnd {
                                voice: self.ctx.voice,
                                index: src.unwrap_or(i),
                                marker_id: *marker_id,
                            }
                            .emit(self.diagnostics);
                        }
                    }
                    i += 1;
                }
                _ => {
                    self.process(&events[i], src);
                    i += 1;
                }
            }
        }
    }

    /// Create a rendered event stamped with the voice's current time,
    /// measure and state. Events inside an editorially supplied passage
    /// inherit the editorial flag.
    fn make(&self, mut event: Event, src: Option<usize>) -> RenderedEvent {
        event.editorial = event.editorial || self.ctx.editorial;
        let snapshot = self.ctx.snapshot();
        let mut re = RenderedEvent::new(event, src, self.ctx.time, snapshot);
        re.measure = self.ctx.measure;
        re.missing = self.ctx.missing || self.ctx.lacuna;
        re.catch_up = self.ctx.catch_up_deadline.is_some();
        re.placements = decompose(&re.event, &re.state, self.options);
        re
    }

    /// Close and open measures until the voice's time cursor sits inside
    /// the current one. Untimed no-space events whose time lands exactly
    /// on a boundary stay in the closing measure (they spill into the
    /// next measure's left edge visually).
    fn cross_measures(&mut self, spills: bool) {
        loop {
            let end = self.measures.measures[self.ctx.measure].end_time();
            let crossing = if spills {
                self.ctx.time > end
            } else {
                self.ctx.time >= end
            };
            if !crossing {
                break;
            }
            self.measures.fix_scale(self.ctx.measure);
            self.ctx.measure += 1;
            let breve = self.ctx.measure_length();
            let next_start = self.out.len();
            let snapshot = self.ctx.snapshot();
            let tempo = self.ctx.tempo;
            let voice = self.ctx.voice;
            let m = self.measures.ensure(self.ctx.measure, breve);
            m.voice_start[voice] = next_start;
            m.voice_state[voice] = Some(snapshot);
            m.tempo[voice] = tempo;
        }
    }

    /// Process one non-signature, non-variant event.
    fn process(&mut self, event: &Event, src: Option<usize>) {
        let untimed_nospace =
            event.is_untimed() && spacing_policy(&event.kind) == SpacingPolicy::NoSpace;
        self.cross_measures(untimed_nospace);

        match &event.kind {
            EventKind::Note(n) => {
                let clef = self
                    .ctx
                    .clef_set
                    .principal
                    .unwrap_or(Clef::new(ClefKind::C, 3, true));
                let staff_pos = n.pitch.staff_position(&clef);
                let out_idx = self.out.len();

                let mut re = self.make(event.clone(), src);
                let (effective, catch_up) = self.ctx.scaled_length(n.length);
                re.length = effective;
                re.catch_up = catch_up;

                // Ligature/tie grouping: a note flagged as joined to the
                // next extends (or opens) the span; the first unflagged
                // note after an open span closes it.
                self.ctx.spans.note_at(staff_pos);
                if n.ligature {
                    re.ligature = Some(self.ctx.spans.ligature_member(
                        out_idx,
                        staff_pos,
                        self.options.ligature_brackets,
                    ));
                } else if self.ctx.spans.ligature_open() {
                    re.ligature = self.ctx.spans.close_ligature(out_idx, staff_pos);
                }
                if n.tie != crate::model::TieType::None {
                    re.tie = Some(self.ctx.spans.tie_member(out_idx, staff_pos));
                } else if self.ctx.spans.tie_open() {
                    re.tie = self.ctx.spans.close_tie(out_idx, staff_pos);
                }
                re.variant = self.ctx.spans.open_variant_index();

                self.out.push(re);
                self.ctx.advance(effective);
            }
            EventKind::Rest(r) => {
                let mut re = self.make(event.clone(), src);
                let (effective, catch_up) = self.ctx.scaled_length(r.length);
                re.length = effective;
                re.catch_up = catch_up;
                re.variant = self.ctx.spans.open_variant_index();
                self.out.push(re);
                self.ctx.advance(effective);
            }
            EventKind::Lacuna(l) => {
                let mut re = self.make(event.clone(), src);
                let (effective, catch_up) = self.ctx.scaled_length(l.length);
                re.length = effective;
                re.catch_up = catch_up;
                re.missing = true;
                self.out.push(re);
                self.ctx.advance(effective);
            }
            EventKind::Multi(children) => {
                let mut re = self.make(event.clone(), src);
                for child in children {
                    let mut child_re = self.make(child.clone(), src);
                    child_re.length = child.nominal_length() / self.ctx.time_scale();
                    re.children.push(child_re);
                }
                let (effective, catch_up) = self.ctx.scaled_length(event.nominal_length());
                re.length = effective;
                re.catch_up = catch_up;
                self.out.push(re);
                self.ctx.advance(effective);
            }
            EventKind::Clef(c) => {
                // Non-signature clef: a one-off sign or mid-staff clef
                // change.
                let shown = self.displayed_clef(c);
                self.ctx.clef_set.apply(&shown);
                let re = self.make(Event::new(EventKind::Clef(shown)), src);
                self.out.push(re);
            }
            EventKind::Mensuration(m) => {
                let mens = if m.minims_per_breve <= 0 {
                    Diagnostic::DegenerateMensuration {
                        voice: self.ctx.voice,
                        index: src.unwrap_or(0),
                        minims: m.minims_per_breve,
                    }
                    .emit(self.diagnostics);
                    Mensuration::default()
                } else {
                    m.clone()
                };
                self.ctx.mensuration = mens.clone();
                if !mens.tempo_change.is_zero() {
                    self.ctx.tempo = mens.tempo_change;
                }
                // A sign taking effect strictly inside the measure
                // rescales it, unless some voice already fixed the
                // measure's scale.
                let measure_start = self.measures.measures[self.ctx.measure].start_time;
                if self.ctx.time > measure_start {
                    let elapsed = self.ctx.time - measure_start;
                    self.measures
                        .rescale(self.ctx.measure, elapsed + self.ctx.measure_length());
                }
                let re = self.make(event.clone(), src);
                self.out.push(re);
            }
            EventKind::Proportion(p) => {
                if !p.is_zero() {
                    self.ctx.proportion = self.ctx.proportion * *p;
                }
                let re = self.make(event.clone(), src);
                self.out.push(re);
            }
            EventKind::ColorChange(c) => {
                self.ctx.coloration = *c;
                let re = self.make(event.clone(), src);
                self.out.push(re);
            }
            EventKind::Dot(_) => {
                let has_note = self
                    .out
                    .iter()
                    .rev()
                    .take_while(|r| r.measure == self.ctx.measure)
                    .any(|r| matches!(r.event.kind, EventKind::Note(_)));
                if !has_note {
                    Diagnostic::StrayDot {
                        voice: self.ctx.voice,
                        index: src.unwrap_or(0),
                    }
                    .emit(self.diagnostics);
                }
                let re = self.make(event.clone(), src);
                self.out.push(re);
            }
            EventKind::OriginalText(_) => {
                if self.options.text_display.shows_original() {
                    let re = self.make(event.clone(), src);
                    self.out.push(re);
                }
            }
            EventKind::Annotation(_) => {
                if self.options.editorial_tags {
                    let re = self.make(event.clone(), src);
                    self.out.push(re);
                }
            }
            EventKind::ModernKeySignature { fifths } => {
                if self.options.accidental_mode == AccidentalMode::Modern {
                    let cancels = cancellation_natural_count(self.ctx.last_fifths, *fifths);
                    for _ in 0..cancels {
                        let natural = Event::new(EventKind::Clef(Clef::new(
                            ClefKind::Natural,
                            3,
                            false,
                        )));
                        let re = self.make(natural, None);
                        self.out.push(re);
                    }
                    self.ctx.last_fifths = *fifths;
                }
                let re = self.make(event.clone(), src);
                self.out.push(re);
            }
            EventKind::Barline(_) | EventKind::LineEnd { .. } => {
                let re = self.make(event.clone(), src);
                self.out.push(re);
            }
            // Handled by `walk`; unreachable here.
            EventKind::VariantStart(_) | EventKind::VariantEnd { .. } => {}
            EventKind::SectionEnd => {}
        }
    }

    fn displayed_clef(&self, c: &Clef) -> Clef {
        if self.options.clef_mode == ClefMode::Modern && !c.kind.is_accidental() {
            let kind = c.kind.modern_equivalent();
            // Modern clefs sit on their conventional lines.
            let line = match kind {
                ClefKind::G | ClefKind::G8 => 2,
                ClefKind::F => 4,
                _ => c.line,
            };
            Clef::new(kind, line, c.signature)
        } else {
            *c
        }
    }

    /// Consume a run of consecutive signature-clef events as one block
    /// and decide: render, skip as redundant, or precede with
    /// synthesized naturals when the modern accidental system cancels
    /// flats. Returns the index after the block.
    fn signature_block(&mut self, events: &[Event], start: usize, src: Option<usize>) -> usize {
        let mut end = start;
        let mut block: Vec<Clef> = Vec::new();
        while end < events.len() {
            match &events[end].kind {
                EventKind::Clef(c) if c.signature => {
                    block.push(self.displayed_clef(c));
                    end += 1;
                }
                _ => break,
            }
        }
        // The incoming signature as a whole: a new signature replaces the
        // previous accidental set even when it carries no principal clef.
        let mut new_sig = self.ctx.clef_set.clone();
        new_sig.accidentals.clear();
        for clef in &block {
            new_sig.apply(clef);
        }

        let redundant = !self.options.show_all_newline_clefs
            && new_sig.same_accidentals(&self.ctx.last_signature)
            && new_sig.principal == self.ctx.last_signature.principal;

        if redundant {
            self.ctx.clef_set = new_sig;
            return end;
        }

        self.cross_measures(true);

        // Switching accidental systems with strictly fewer flats:
        // cancel the difference with explicit naturals rather than a
        // bare signature swap.
        if self.options.accidental_mode == AccidentalMode::Modern {
            let old_flats = self.ctx.last_signature.flat_count();
            let new_flats = new_sig.flat_count();
            if new_flats < old_flats {
                for _ in 0..(old_flats - new_flats) {
                    let natural =
                        Event::new(EventKind::Clef(Clef::new(ClefKind::Natural, 3, false)));
                    let re = self.make(natural, None);
                    self.out.push(re);
                }
            }
        }

        if block.iter().all(|c| c.kind.is_accidental()) {
            self.ctx.clef_set.accidentals.clear();
        }
        for clef in &block {
            self.ctx.clef_set.apply(clef);
            let re = self.make(Event::new(EventKind::Clef(*clef)), src);
            self.out.push(re);
        }
        self.ctx.last_signature = new_sig;
        end
    }

    /// Handle one variant region: pick the displayed reading, walk it,
    /// and reconcile its length against the default reading so the
    /// voice leaves the region exactly in sync with the others.
    fn variant_region(
        &mut self,
        events: &[Event],
        start: usize,
        marker: VariantMarker,
        src: Option<usize>,
    ) -> usize {
        let end = events[start + 1..]
            .iter()
            .position(|e| matches!(&e.kind, EventKind::VariantEnd { marker_id } if *marker_id == marker.id))
            .map(|p| start + 1 + p);
        let Some(end) = end else {
            Diagnostic::UnclosedVariant {
                voice: self.ctx.voice,
                index: src.unwrap_or(start),
                marker_id: marker.id,
            }
            .emit(self.diagnostics);
            return start + 1;
        };

        let default_events = &events[start + 1..end];
        let default_len = sum_lengths(default_events) / self.ctx.time_scale();
        let selected = self
            .version
            .as_deref()
            .and_then(|v| marker.reading_for(v).map(|(i, r)| (i, r.clone())));
        let marked = self.variant_marked(&marker);

        self.cross_measures(false);
        let start_out = self.out.len();
        let span_idx = self.ctx.spans.open_variant(
            start_out,
            marker.id,
            selected.as_ref().map(|(i, _)| *i),
            marked,
        );
        let mut re_start = self.make(Event::new(EventKind::VariantStart(marker.clone())), src);
        re_start.variant = Some(span_idx);
        self.out.push(re_start);

        let entry_time = self.ctx.time;
        match &selected {
            None => {
                self.walk(default_events, src.map(|s| s + 1));
            }
            Some((_, reading)) => {
                let reading_len = sum_lengths(&reading.events) / self.ctx.time_scale();
                if reading_len > default_len {
                    // Overlong reading: cram it into the default's time
                    // slot and truncate whatever would overshoot.
                    self.ctx.catch_up_deadline = Some(entry_time + default_len);
                }
                let saved_lacuna = self.ctx.lacuna;
                let saved_editorial = self.ctx.editorial;
                self.ctx.lacuna |= reading.lacuna;
                self.ctx.editorial |= reading.error;
                self.walk(&reading.events, None);
                self.ctx.lacuna = saved_lacuna;
                self.ctx.editorial = saved_editorial;
            }
        }

        let used = self.ctx.time - entry_time;
        let rendered_content = self.out.len() > start_out + 1;
        // An armed deadline means the catch-up machinery owns the
        // reconciliation; the shortfall path handles the rest.
        let shortfall = if selected.is_some()
            && used < default_len
            && self.ctx.catch_up_deadline.is_none()
        {
            default_len - used
        } else {
            Proportion::zero()
        };

        if !rendered_content && used.is_zero() && shortfall.is_zero() {
            // Nothing at all would appear between the brackets: elide
            // the whole region rather than leave an empty bracket.
            self.ctx.spans.close_variant(start_out);
            self.ctx.spans.variants.pop();
            self.out.truncate(start_out);
            return end + 1;
        }

        self.cross_measures(false);
        let end_out = self.out.len();
        let mut re_end = self.make(
            Event::new(EventKind::VariantEnd {
                marker_id: marker.id,
            }),
            src.map(|s| s - start + end),
        );
        re_end.variant = Some(span_idx);
        if !shortfall.is_zero() {
            // Shorter reading: the shortfall rides on the closing event,
            // pushing this voice's later content back into alignment.
            re_end.length = shortfall;
            re_end.catch_up = false;
        }
        self.ctx.spans.close_variant(end_out);
        self.out.push(re_end);
        if !shortfall.is_zero() {
            self.ctx.advance(shortfall);
        }
        // A deadline already met expires with the region; one still in
        // the future keeps truncating whatever follows until the voice
        // has caught up.
        if let Some(deadline) = self.ctx.catch_up_deadline {
            if self.ctx.time >= deadline {
                self.ctx.catch_up_deadline = None;
            }
        }

        end + 1
    }

    fn variant_marked(&self, marker: &VariantMarker) -> bool {
        match self.options.variant_marking {
            VariantMarking::None => false,
            VariantMarking::All => true,
            VariantMarking::Custom(c) => {
                let has_error = marker.readings.iter().any(|r| r.error);
                let has_lacuna = marker.readings.iter().any(|r| r.lacuna);
                let has_substantive = marker.readings.iter().any(|r| !r.error && !r.lacuna);
                (c.error && has_error)
                    || (c.lacuna && has_lacuna)
                    || (c.substantive && has_substantive)
            }
        }
    }
}

fn sum_lengths(events: &[Event]) -> Proportion {
    events
        .iter()
        .fold(Proportion::zero(), |acc, e| acc + e.nominal_length())
}

/// Number of naturals needed to cancel an old key signature down to a
/// new one (same-direction shrink cancels the difference; a direction
/// change cancels everything).
fn cancellation_natural_count(old_fifths: i32, new_fifths: i32) -> u32 {
    if old_fifths == 0 {
        return 0;
    }
    let same_direction =
        (old_fifths > 0 && new_fifths > 0) || (old_fifths < 0 && new_fifths < 0);
    if same_direction {
        let old_abs = old_fifths.unsigned_abs();
        let new_abs = new_fifths.unsigned_abs();
        old_abs.saturating_sub(new_abs)
    } else {
        old_fifths.unsigned_abs()
    }
}
