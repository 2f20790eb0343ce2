//! Integration tests for the render-list builder: display
//! substitutions, measure bookkeeping, span tracking and diagnostics.

use mensurlib::error::Diagnostic;
use mensurlib::model::{
    Clef, ClefKind, Event, EventKind, Mensuration, NoteData, NoteType, Pitch, Section, Syllable,
    Voice,
};
use mensurlib::options::{AccidentalMode, ClefMode, DisplayOptions, TextDisplay};
use mensurlib::{ScoreRenderer, VersionSelection};
use pretty_assertions::assert_eq;

fn minim(step: char, octave: i32) -> Event {
    Event::note(NoteData::simple(NoteType::Minim, Pitch::new(step, octave)))
}

fn c_clef(signature: bool) -> Event {
    Event::new(EventKind::Clef(Clef::new(ClefKind::C, 3, signature)))
}

fn flat_sig() -> Event {
    Event::new(EventKind::Clef(Clef::new(ClefKind::Flat, 3, true)))
}

fn render(voice_events: Vec<Event>) -> mensurlib::RenderedSection {
    let section = Section::mensural(vec![Voice::new(1, "Superius", voice_events)]);
    ScoreRenderer::new().render_section(&section, &[])
}

fn render_with(
    voice_events: Vec<Event>,
    options: DisplayOptions,
) -> mensurlib::RenderedSection {
    let section = Section::mensural(vec![Voice::new(1, "Superius", voice_events)]);
    ScoreRenderer::new()
        .with_options(options)
        .render_section(&section, &[])
}

fn clef_kinds(rendered: &mensurlib::RenderedSection) -> Vec<ClefKind> {
    rendered.voices[0]
        .events
        .iter()
        .filter_map(|e| match &e.event.kind {
            EventKind::Clef(c) => Some(c.kind),
            _ => None,
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Display substitutions
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn modern_clef_mode_substitutes_octave_treble() {
    let options = DisplayOptions {
        clef_mode: ClefMode::Modern,
        ..DisplayOptions::default()
    };
    let rendered = render_with(vec![c_clef(true), minim('A', 4)], options);
    assert_eq!(clef_kinds(&rendered), vec![ClefKind::G8]);
}

#[test]
fn original_clef_mode_keeps_c_clef() {
    let rendered = render(vec![c_clef(true), minim('A', 4)]);
    assert_eq!(clef_kinds(&rendered), vec![ClefKind::C]);
}

#[test]
fn redundant_newline_signature_is_elided() {
    let options = DisplayOptions {
        show_all_newline_clefs: false,
        ..DisplayOptions::default()
    };
    let events = vec![
        c_clef(true),
        minim('A', 4),
        Event::new(EventKind::LineEnd { page_end: false }),
        c_clef(true),
        minim('B', 4),
    ];
    let rendered = render_with(events, options);
    assert_eq!(clef_kinds(&rendered).len(), 1, "second identical signature should vanish");
}

#[test]
fn changed_signature_survives_elision() {
    let options = DisplayOptions {
        show_all_newline_clefs: false,
        ..DisplayOptions::default()
    };
    let events = vec![
        c_clef(true),
        minim('A', 4),
        c_clef(true),
        flat_sig(),
        minim('B', 4),
    ];
    let rendered = render_with(events, options);
    // First signature, then the new one with its flat.
    assert_eq!(
        clef_kinds(&rendered),
        vec![ClefKind::C, ClefKind::C, ClefKind::Flat]
    );
}

#[test]
fn cancelled_flat_synthesizes_a_natural() {
    let options = DisplayOptions {
        accidental_mode: AccidentalMode::Modern,
        ..DisplayOptions::default()
    };
    let events = vec![
        c_clef(true),
        flat_sig(),
        minim('A', 4),
        c_clef(true), // new signature without the flat
        minim('B', 4),
    ];
    let rendered = render_with(events, options);
    let naturals: Vec<_> = rendered.voices[0]
        .events
        .iter()
        .filter(|e| matches!(&e.event.kind, EventKind::Clef(c) if c.kind == ClefKind::Natural))
        .collect();
    assert_eq!(naturals.len(), 1);
    // Synthesized, so it points at no source event.
    assert_eq!(naturals[0].source_index, None);
}

#[test]
fn original_accidental_mode_never_synthesizes_naturals() {
    let events = vec![
        c_clef(true),
        flat_sig(),
        minim('A', 4),
        c_clef(true),
        minim('B', 4),
    ];
    let rendered = render(events);
    assert!(!clef_kinds(&rendered).contains(&ClefKind::Natural));
}

#[test]
fn text_display_none_drops_original_text() {
    let options = DisplayOptions {
        text_display: TextDisplay::None,
        ..DisplayOptions::default()
    };
    let events = vec![
        Event::new(EventKind::OriginalText("Kyrie".into())),
        minim('A', 4),
    ];
    let rendered = render_with(events, options);
    assert!(rendered.voices[0]
        .events
        .iter()
        .all(|e| !matches!(e.event.kind, EventKind::OriginalText(_))));
}

#[test]
fn syllables_survive_under_both_text_display() {
    let mut data = NoteData::simple(NoteType::Minim, Pitch::new('A', 4));
    data.syllable = Some(Syllable {
        text: "Ky".into(),
        word_end: false,
    });
    let rendered = render(vec![Event::note(data)]);
    let note = &rendered.voices[0].events[0];
    assert!(note
        .placements
        .iter()
        .any(|p| matches!(&p.glyph, mensurlib::layout::glyphs::Glyph::Text(t) if t == "Ky")));
}

// ═══════════════════════════════════════════════════════════════════════
// Measures
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn eight_minims_make_two_measures() {
    let events: Vec<Event> = (0..8).map(|_| minim('A', 4)).collect();
    let rendered = render(events);
    assert_eq!(rendered.measures.len(), 2);
    assert_eq!(rendered.voices[0].events[3].measure, 0);
    assert_eq!(rendered.voices[0].events[4].measure, 1);
}

#[test]
fn mid_measure_mensuration_rescales_the_measure() {
    let events = vec![
        Event::note(NoteData::simple(NoteType::Semibreve, Pitch::new('A', 4))),
        Event::new(EventKind::Mensuration(Mensuration {
            sign: None,
            minims_per_breve: 3,
            tempo_change: mensurlib::Proportion::one(),
        })),
        minim('A', 4),
        minim('B', 4),
        minim('C', 5),
    ];
    let rendered = render(events);
    // Two minims elapsed plus a full 3-minim breve from the sign.
    assert_eq!(
        rendered.measures.measures[0].num_minims,
        mensurlib::Proportion::from_int(5)
    );
}

#[test]
fn tempo_change_stretches_durations_and_the_measure() {
    let events = vec![
        Event::note(NoteData::simple(NoteType::Semibreve, Pitch::new('A', 4))),
        Event::new(EventKind::Mensuration(Mensuration {
            sign: None,
            minims_per_breve: 4,
            tempo_change: mensurlib::Proportion::new(1, 2),
        })),
        minim('A', 4),
        minim('B', 4),
    ];
    let rendered = render(events);
    let last = rendered.voices[0]
        .events
        .iter()
        .rev()
        .find(|e| matches!(e.event.kind, EventKind::Note(_)))
        .unwrap();
    // Half tempo: a minim lasts two effective minims.
    assert_eq!(last.length, mensurlib::Proportion::from_int(2));
    assert_eq!(last.time, mensurlib::Proportion::from_int(4));
    // Two minims elapsed plus a full breve at the stretched tempo.
    assert_eq!(
        rendered.measures.measures[0].num_minims,
        mensurlib::Proportion::from_int(10)
    );
}

#[test]
fn short_voice_is_padded_with_fillers() {
    let long: Vec<Event> = (0..8).map(|_| minim('A', 4)).collect();
    let short: Vec<Event> = (0..4).map(|_| minim('G', 4)).collect();
    let section = Section::mensural(vec![
        Voice::new(1, "Superius", long),
        Voice::new(2, "Tenor", short),
    ]);
    let rendered = ScoreRenderer::new().render_section(&section, &[]);
    assert_eq!(rendered.measures.len(), 2);
    let tenor = &rendered.voices[1].events;
    let filler = tenor.last().unwrap();
    assert!(matches!(filler.event.kind, EventKind::SectionEnd));
    assert_eq!(filler.length, mensurlib::Proportion::from_int(4));
    assert_eq!(filler.measure, 1);
}

// ═══════════════════════════════════════════════════════════════════════
// Spans
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn ligature_span_covers_its_members() {
    let mut a = NoteData::simple(NoteType::Breve, Pitch::new('D', 4));
    a.ligature = true;
    let mut b = NoteData::simple(NoteType::Breve, Pitch::new('F', 4));
    b.ligature = true;
    let c = NoteData::simple(NoteType::Breve, Pitch::new('E', 4));
    let rendered = render(vec![Event::note(a), Event::note(b), Event::note(c)]);
    let spans = &rendered.voices[0].ligatures;
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].start, 0);
    assert_eq!(spans[0].end, Some(2));
}

#[test]
fn unclosed_ligature_is_diagnosed_and_closed() {
    let mut a = NoteData::simple(NoteType::Breve, Pitch::new('D', 4));
    a.ligature = true;
    let mut b = NoteData::simple(NoteType::Breve, Pitch::new('F', 4));
    b.ligature = true;
    let rendered = render(vec![Event::note(a), Event::note(b)]);
    assert!(rendered
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::UnclosedLigature { voice: 0 })));
    let spans = &rendered.voices[0].ligatures;
    assert_eq!(spans.len(), 1);
    assert!(spans[0].end.is_some());
}

#[test]
fn ligature_brackets_option_controls_span_marking() {
    let ligated = || {
        let mut a = NoteData::simple(NoteType::Breve, Pitch::new('D', 4));
        a.ligature = true;
        let mut b = NoteData::simple(NoteType::Breve, Pitch::new('F', 4));
        b.ligature = true;
        let c = NoteData::simple(NoteType::Breve, Pitch::new('E', 4));
        vec![Event::note(a), Event::note(b), Event::note(c)]
    };
    let rendered = render(ligated());
    assert!(rendered.voices[0].ligatures[0].marked);
    let options = DisplayOptions {
        ligature_brackets: false,
        ..DisplayOptions::default()
    };
    let rendered = render_with(ligated(), options);
    assert!(!rendered.voices[0].ligatures[0].marked);
}

#[test]
fn tie_span_tracks_tied_pair() {
    let mut a = NoteData::simple(NoteType::Semibreve, Pitch::new('G', 4));
    a.tie = mensurlib::model::TieType::Over;
    let b = NoteData::simple(NoteType::Semibreve, Pitch::new('G', 4));
    let rendered = render(vec![Event::note(a), Event::note(b)]);
    let ties = &rendered.voices[0].ties;
    assert_eq!(ties.len(), 1);
    assert_eq!((ties[0].start, ties[0].end), (0, Some(1)));
}

// ═══════════════════════════════════════════════════════════════════════
// Diagnostics
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn stray_dot_is_diagnosed_but_rendered() {
    let _ = env_logger::builder().is_test(true).try_init();
    let rendered = render(vec![Event::new(EventKind::Dot(
        mensurlib::model::DotData { addition: true },
    ))]);
    assert!(rendered
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::StrayDot { voice: 0, .. })));
    assert!(rendered.voices[0]
        .events
        .iter()
        .any(|e| matches!(e.event.kind, EventKind::Dot(_))));
}

#[test]
fn error_flagged_event_carries_an_editorial_bracket() {
    let mut flagged = minim('A', 4);
    flagged.error = true;
    let rendered = render(vec![flagged, minim('B', 4)]);
    let bracketed = |e: &mensurlib::layout::rendered::RenderedEvent| {
        e.placements
            .iter()
            .any(|p| matches!(p.glyph, mensurlib::layout::glyphs::Glyph::EditorialBracket))
    };
    assert!(bracketed(&rendered.voices[0].events[0]));
    assert!(!bracketed(&rendered.voices[0].events[1]));
}

#[test]
fn degenerate_mensuration_falls_back_to_default() {
    let events = vec![
        Event::new(EventKind::Mensuration(Mensuration {
            sign: None,
            minims_per_breve: 0,
            tempo_change: mensurlib::Proportion::one(),
        })),
        minim('A', 4),
    ];
    let rendered = render(events);
    assert!(rendered
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::DegenerateMensuration { minims: 0, .. })));
    // Default 4 minims per breve governs the measure.
    assert_eq!(
        rendered.measures.measures[0].num_minims,
        mensurlib::Proportion::from_int(4)
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Missing voices
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn voice_missing_in_version_renders_grayed() {
    let mut voice = Voice::new(1, "Contratenor", vec![minim('A', 4)]);
    voice.missing_in.push("Trent92".into());
    let section = Section::mensural(vec![voice]);
    let rendered = ScoreRenderer::new()
        .with_version(VersionSelection::named("Trent92"))
        .render_section(&section, &[]);
    assert!(rendered.voices[0].events.iter().all(|e| e.missing));
}

#[test]
fn voice_present_in_default_version_is_not_grayed() {
    let mut voice = Voice::new(1, "Contratenor", vec![minim('A', 4)]);
    voice.missing_in.push("Trent92".into());
    let section = Section::mensural(vec![voice]);
    let rendered = ScoreRenderer::new().render_section(&section, &[]);
    assert!(rendered.voices[0].events.iter().all(|e| !e.missing));
}
