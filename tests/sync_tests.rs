//! Integration tests for the positioner: proportional spacing,
//! cross-voice alignment, glyph-room clamping and measure widths.

use mensurlib::model::{
    Clef, ClefKind, Event, EventKind, NoteData, NoteType, Pitch, Section, Syllable, Voice,
};
use mensurlib::{rendered_to_json, Proportion, ScoreRenderer};
use pretty_assertions::assert_eq;

fn minim(step: char, octave: i32) -> Event {
    Event::note(NoteData::simple(NoteType::Minim, Pitch::new(step, octave)))
}

fn semibreve(step: char, octave: i32) -> Event {
    Event::note(NoteData::simple(NoteType::Semibreve, Pitch::new(step, octave)))
}

fn render(voices: Vec<Vec<Event>>) -> mensurlib::RenderedSection {
    let voices = voices
        .into_iter()
        .enumerate()
        .map(|(i, events)| Voice::new(i + 1, format!("Voice {}", i + 1), events))
        .collect();
    ScoreRenderer::new().render_section(&Section::mensural(voices), &[])
}

fn xs(rendered: &mensurlib::RenderedSection, voice: usize) -> Vec<f64> {
    rendered.voices[voice].events.iter().map(|e| e.x).collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Proportional spacing
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn single_voice_minims_space_evenly() {
    let rendered = render(vec![(0..4).map(|_| minim('A', 4)).collect()]);
    assert_eq!(xs(&rendered, 0), vec![0.0, 25.0, 50.0, 75.0]);
    // Proportional width plus the barline padding.
    assert_eq!(rendered.measures.measures[0].width, 108.0);
}

#[test]
fn second_measure_starts_after_the_padded_barline() {
    let rendered = render(vec![(0..8).map(|_| minim('A', 4)).collect()]);
    let positions = xs(&rendered, 0);
    assert_eq!(positions[4], 108.0);
    assert_eq!(positions[5], 133.0);
}

#[test]
fn proportion_sign_halves_the_spacing() {
    let mut events = vec![Event::new(EventKind::Proportion(Proportion::from_int(2)))];
    events.extend((0..4).map(|_| minim('A', 4)));
    let rendered = render(vec![events]);
    let positions = xs(&rendered, 0);
    // The proportion marker itself, then notes at half a minim each.
    assert_eq!(positions[1..5].to_vec(), vec![0.0, 12.5, 25.0, 37.5]);
    let notes = &rendered.voices[0].events;
    assert_eq!(notes[1].length, Proportion::new(1, 2));
}

// ═══════════════════════════════════════════════════════════════════════
// Cross-voice alignment
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn faster_voice_interleaves_between_shared_onsets() {
    let slow = vec![semibreve('D', 4), semibreve('E', 4)];
    let fast = (0..4).map(|_| minim('A', 4)).collect();
    let rendered = render(vec![slow, fast]);
    assert_eq!(xs(&rendered, 0), vec![0.0, 50.0]);
    assert_eq!(xs(&rendered, 1), vec![0.0, 25.0, 50.0, 75.0]);
}

#[test]
fn simultaneous_onsets_share_an_x() {
    let rendered = render(vec![
        (0..4).map(|_| minim('A', 4)).collect(),
        (0..4).map(|_| minim('D', 3)).collect(),
    ]);
    assert_eq!(xs(&rendered, 0), xs(&rendered, 1));
}

#[test]
fn wide_glyph_pushes_every_voice() {
    let mut wide = NoteData::simple(NoteType::Minim, Pitch::new('A', 4));
    wide.syllable = Some(Syllable {
        text: "miserationu".into(), // 11 chars at 5.5 units
        word_end: false,
    });
    let rendered = render(vec![
        vec![Event::note(wide), minim('B', 4)],
        vec![minim('D', 3), minim('E', 3)],
    ]);
    // 60.5 units of text beat the 25-unit proportional step.
    assert_eq!(xs(&rendered, 0)[1], 60.5);
    assert_eq!(xs(&rendered, 1)[1], 60.5);
}

#[test]
fn glyph_excess_reaches_voices_without_a_simultaneous_onset() {
    let mut wide = NoteData::simple(NoteType::Semibreve, Pitch::new('A', 4));
    wide.syllable = Some(Syllable {
        text: "miserationu".into(),
        word_end: false,
    });
    let rendered = render(vec![
        vec![Event::note(wide), semibreve('B', 4)],
        (0..4).map(|_| minim('D', 3)).collect(),
    ]);
    // The lower voice's second minim starts mid-semibreve, with no event
    // of the wide voice at that instant; the text width must still push
    // it clear of the glyph.
    assert_eq!(xs(&rendered, 0), vec![0.0, 85.5]);
    assert_eq!(xs(&rendered, 1), vec![0.0, 60.5, 85.5, 110.5]);
}

// ═══════════════════════════════════════════════════════════════════════
// Untimed placement
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn mid_staff_clef_absorbs_into_slack() {
    let events = vec![
        minim('A', 4),
        Event::new(EventKind::Clef(Clef::new(ClefKind::C, 4, false))),
        minim('B', 4),
    ];
    let rendered = render(vec![events]);
    let positions = xs(&rendered, 0);
    // The clef backs into the room the minim left, ending flush against
    // the next note.
    assert_eq!(positions[1], 13.0);
    assert_eq!(positions[2], 25.0);
}

#[test]
fn dot_glues_to_its_note() {
    let events = vec![
        semibreve('A', 4),
        Event::new(EventKind::Dot(mensurlib::model::DotData { addition: true })),
        minim('B', 4),
    ];
    let rendered = render(vec![events]);
    let positions = xs(&rendered, 0);
    // Right edge of the 9-unit notehead.
    assert_eq!(positions[1], 9.0);
    assert!(positions[2] > positions[1]);
}

#[test]
fn x_is_monotone_within_each_voice() {
    let events = vec![
        Event::new(EventKind::Clef(Clef::new(ClefKind::C, 3, true))),
        Event::new(EventKind::Clef(Clef::new(ClefKind::Flat, 3, true))),
        semibreve('A', 4),
        Event::new(EventKind::Dot(mensurlib::model::DotData { addition: true })),
        minim('B', 4),
        Event::new(EventKind::OriginalText("lux".into())),
        minim('C', 5),
        semibreve('D', 5),
    ];
    let rendered = render(vec![events.clone(), events]);
    for voice in &rendered.voices {
        for pair in voice.events.windows(2) {
            assert!(
                pair[1].x >= pair[0].x,
                "x went backwards: {} then {}",
                pair[0].x,
                pair[1].x
            );
        }
    }
}

#[test]
fn text_adopts_the_next_note_position() {
    let events = vec![
        minim('A', 4),
        Event::new(EventKind::OriginalText("Kyrie".into())),
        minim('B', 4),
    ];
    let rendered = render(vec![events]);
    let voice = &rendered.voices[0].events;
    assert!(matches!(voice[1].event.kind, EventKind::OriginalText(_)));
    assert_eq!(voice[1].x, voice[2].x);
}

// ═══════════════════════════════════════════════════════════════════════
// Structural properties
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn filler_keeps_short_voice_traversing_all_measures() {
    let rendered = render(vec![
        (0..8).map(|_| minim('A', 4)).collect(),
        (0..2).map(|_| minim('D', 3)).collect(),
    ]);
    assert_eq!(rendered.measures.len(), 2);
    let short = &rendered.voices[1].events;
    let fillers: Vec<_> = short
        .iter()
        .filter(|e| matches!(e.event.kind, EventKind::SectionEnd))
        .collect();
    assert!(!fillers.is_empty());
    let total: Proportion = short
        .iter()
        .fold(Proportion::zero(), |acc, e| acc + e.length);
    assert_eq!(total, Proportion::from_int(8));
}

#[test]
fn rendering_is_deterministic() {
    let voices: Vec<Vec<Event>> = vec![
        vec![semibreve('A', 4), semibreve('B', 4)],
        (0..4).map(|_| minim('D', 3)).collect(),
    ];
    let a = render(voices.clone());
    let b = render(voices);
    assert_eq!(
        rendered_to_json(&a).unwrap(),
        rendered_to_json(&b).unwrap()
    );
}

#[test]
fn measure_widths_are_shared_across_voices() {
    let rendered = render(vec![
        (0..8).map(|_| minim('A', 4)).collect(),
        vec![semibreve('D', 3), semibreve('E', 3), semibreve('F', 3), semibreve('G', 3)],
    ]);
    // One grid for everyone: the faster voice's last note of measure 1
    // still sits left of the total width.
    let total: f64 = rendered.measures.measures.iter().map(|m| m.width).sum();
    for voice in &rendered.voices {
        for event in &voice.events {
            assert!(event.x <= total);
        }
    }
}
