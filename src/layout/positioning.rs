//! Phase 2: multi-voice synchronization and horizontal positioning.
//!
//! One cursor per voice sweeps the render lists in lockstep. A single
//! global coordinate `cur_x` tracks the horizontal position of the
//! earliest unplaced musical time; timed events starting at that time
//! land on it, so simultaneous events in different voices share an x.
//! Advancement between time slices is proportional to elapsed musical
//! time, raised to the widest glyph overhang placed in the slice, so an
//! oversized symbol in one voice pushes every voice's later content
//! rightward. Measures are closed as the sweep passes their end time,
//! which fixes their shared width.

use super::glyphs::GlyphMetrics;
use super::measure::MeasureList;
use super::policy::{PositionPolicy, SpacingPolicy};
use super::rendered::RenderedEvent;
use crate::options::LayoutScale;
use crate::proportion::Proportion;

/// Per-voice sweep state.
struct Cursor {
    /// Index of the next unplaced rendered event
    idx: usize,
    /// Right edge of everything this voice has drawn so far
    x_used: f64,
    /// Coordinate of the most recently placed event, for monotonicity
    /// and for events that stack on their predecessor
    last_x: f64,
    /// Deferred events waiting to adopt the next placed coordinate
    pending: Vec<usize>,
}

impl Cursor {
    fn new() -> Self {
        Cursor {
            idx: 0,
            x_used: 0.0,
            last_x: 0.0,
            pending: Vec::new(),
        }
    }
}

/// Assign x coordinates to every rendered event and final widths to
/// every measure. Render lists must already be time-complete (padded to
/// the section end), which Phase 1 guarantees.
pub(crate) fn position_voices(
    voices: &mut [Vec<RenderedEvent>],
    measures: &mut MeasureList,
    scale: &LayoutScale,
    metrics: &dyn GlyphMetrics,
) {
    if measures.is_empty() {
        return;
    }
    let mut cursors: Vec<Cursor> = (0..voices.len()).map(|_| Cursor::new()).collect();
    let mut cur_x = 0.0f64;
    let mut t = Proportion::zero();
    let mut measure_idx = 0usize;
    let mut measure_x = 0.0f64;
    // Widest glyph overhang past cur_x placed since the last advance;
    // every voice is advanced by at least this much.
    let mut excess = 0.0f64;

    loop {
        untimed_pass(voices, &mut cursors, measure_idx, t, cur_x, metrics, &mut excess);

        // Clamp the slice coordinate so no voice's due event starts left
        // of its own drawn content, then place the slice.
        for (v, c) in cursors.iter().enumerate() {
            if let Some(ev) = voices[v].get(c.idx) {
                if !ev.is_untimed() && ev.time <= t && ev.measure <= measure_idx && !ev.catch_up {
                    cur_x = cur_x.max(c.x_used);
                }
            }
        }
        for v in 0..voices.len() {
            let c = &mut cursors[v];
            let due = match voices[v].get(c.idx) {
                Some(ev) => !ev.is_untimed() && ev.time <= t && ev.measure <= measure_idx,
                None => false,
            };
            if !due {
                continue;
            }
            let i = c.idx;
            let catching = voices[v][i].catch_up;
            let x = if catching {
                c.x_used.max(c.last_x)
            } else {
                cur_x.max(c.last_x)
            };
            place(&mut voices[v], c, i, x, metrics);
            if !catching {
                excess = excess.max(c.x_used - cur_x);
            }
            c.idx += 1;
        }

        // Earliest remaining event time across all voices.
        let next_time = cursors
            .iter()
            .enumerate()
            .filter_map(|(v, c)| voices[v].get(c.idx).map(|ev| ev.time))
            .min();
        let Some(next_time) = next_time else { break };

        let end = measures.measures[measure_idx].end_time();
        if next_time >= end && measure_idx + 1 < measures.len() {
            if t < end {
                // Reach the boundary first so spill events still get
                // placed inside the closing measure.
                let step = (end - t).as_f64() * scale.minim_width;
                cur_x += step.max(excess);
                excess = 0.0;
                t = end;
                continue;
            }
            cur_x = close_measure(measures, measure_idx, measure_x, cur_x, &cursors, scale);
            measure_x = cur_x;
            measure_idx += 1;
            continue;
        }

        if next_time > t {
            let step = (next_time - t).as_f64() * scale.minim_width;
            cur_x += step.max(excess);
            excess = 0.0;
            t = next_time;
        }
    }

    // Flush text still waiting for a carrier and close what remains.
    for (v, c) in cursors.iter_mut().enumerate() {
        let x = c.last_x;
        for &p in c.pending.iter() {
            set_x(&mut voices[v][p], x);
        }
        c.pending.clear();
    }
    while measure_idx < measures.len() {
        let end = measures.measures[measure_idx].end_time();
        if t < end {
            cur_x += (end - t).as_f64() * scale.minim_width;
            t = end;
        }
        cur_x = close_measure(measures, measure_idx, measure_x, cur_x, &cursors, scale);
        measure_x = cur_x;
        measure_idx += 1;
    }
}

/// Place every due untimed event. No-space glyph runs pack together and
/// slide backward into whatever slack the voice has left of the slice
/// coordinate; whatever will not fit becomes shared advance excess.
fn untimed_pass(
    voices: &mut [Vec<RenderedEvent>],
    cursors: &mut [Cursor],
    measure_idx: usize,
    t: Proportion,
    cur_x: f64,
    metrics: &dyn GlyphMetrics,
    excess: &mut f64,
) {
    for v in 0..voices.len() {
        loop {
            let c = &mut cursors[v];
            let Some(ev) = voices[v].get(c.idx) else { break };
            if !(ev.is_untimed() && ev.time <= t && ev.measure <= measure_idx) {
                break;
            }
            if ev.spacing_policy() == SpacingPolicy::NoSpace
                && ev.position_policy() == PositionPolicy::BeforeNext
                && !ev.catch_up
            {
                let run = nospace_run(&voices[v], c.idx, measure_idx, t);
                let run_width: f64 = voices[v][c.idx..c.idx + run]
                    .iter()
                    .map(|e| e.width(metrics))
                    .sum();
                let mut x = (cur_x - run_width).max(c.x_used).max(c.last_x);
                for _ in 0..run {
                    let i = c.idx;
                    let w = voices[v][i].width(metrics);
                    place_raw(&mut voices[v], c, i, x);
                    c.x_used = c.x_used.max(x + w);
                    x += w;
                    c.idx += 1;
                }
                *excess = (*excess).max(x - cur_x);
                continue;
            }
            let i = c.idx;
            match voices[v][i].position_policy() {
                PositionPolicy::WithNext => {
                    c.pending.push(i);
                    c.idx += 1;
                }
                PositionPolicy::Immediate => {
                    let x = c.x_used.max(c.last_x);
                    let w = voices[v][i].width(metrics);
                    place_raw(&mut voices[v], c, i, x);
                    c.x_used = c.x_used.max(x + w);
                    if !voices[v][i].catch_up {
                        *excess = (*excess).max(x + w - cur_x);
                    }
                    c.idx += 1;
                }
                // Invisible markers, plus zero-length catch-up events,
                // sit at the voice's running edge without taking room.
                PositionPolicy::Invisible | PositionPolicy::BeforeNext => {
                    let x = if voices[v][i].catch_up {
                        c.x_used.max(c.last_x)
                    } else {
                        cur_x.max(c.last_x)
                    };
                    if voices[v][i].catch_up {
                        let w = voices[v][i].width(metrics);
                        c.x_used = c.x_used.max(x + w);
                    }
                    place_raw(&mut voices[v], c, i, x);
                    c.idx += 1;
                }
            }
        }
    }
}

/// Length of the run of consecutive due no-space untimed events starting
/// at `from`.
fn nospace_run(voice: &[RenderedEvent], from: usize, measure_idx: usize, t: Proportion) -> usize {
    voice[from..]
        .iter()
        .take_while(|ev| {
            ev.is_untimed()
                && ev.time <= t
                && ev.measure <= measure_idx
                && ev.spacing_policy() == SpacingPolicy::NoSpace
                && ev.position_policy() == PositionPolicy::BeforeNext
                && !ev.catch_up
        })
        .count()
}

/// Assign a coordinate to a timed event and record its occupied width.
fn place(
    voice: &mut Vec<RenderedEvent>,
    cursor: &mut Cursor,
    index: usize,
    x: f64,
    metrics: &dyn GlyphMetrics,
) {
    let w = voice[index].width(metrics);
    place_raw(voice, cursor, index, x);
    cursor.x_used = cursor.x_used.max(x + w);
}

/// Assign a coordinate, resolve any deferred events onto it, and keep
/// per-voice monotonicity bookkeeping.
fn place_raw(voice: &mut Vec<RenderedEvent>, cursor: &mut Cursor, index: usize, x: f64) {
    set_x(&mut voice[index], x);
    cursor.last_x = cursor.last_x.max(x);
    for &p in cursor.pending.iter() {
        set_x(&mut voice[p], x);
    }
    cursor.pending.clear();
}

fn set_x(ev: &mut RenderedEvent, x: f64) {
    ev.x = x;
    for child in &mut ev.children {
        child.x = x;
    }
}

/// Fix a measure's final width: whichever is larger of its proportional
/// width and the content actually drawn, plus the barline padding.
/// Returns the coordinate at which the next measure starts.
fn close_measure(
    measures: &mut MeasureList,
    idx: usize,
    measure_x: f64,
    cur_x: f64,
    cursors: &[Cursor],
    scale: &LayoutScale,
) -> f64 {
    let drawn = cursors
        .iter()
        .map(|c| c.x_used)
        .fold(cur_x, f64::max)
        - measure_x;
    let m = &mut measures.measures[idx];
    m.width = m.width.max(drawn) + scale.barline_padding;
    measure_x + m.width
}
