//! Data model for the abstract, time-ordered event streams the layout
//! engine consumes.
//!
//! These structures are supplied by an external source parser and are
//! read-only to the engine during a render pass. Every event carries a
//! nominal duration (possibly zero); the engine decides where things go,
//! never how they look.

use crate::proportion::Proportion;
use serde::{Deserialize, Serialize};

/// A pitch in the gamut, identified by letter name and octave
/// (middle C = C4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    /// Note name: 'A'..='G'
    pub step: char,
    /// Octave number
    pub octave: i32,
}

impl Pitch {
    pub fn new(step: char, octave: i32) -> Self {
        Pitch { step, octave }
    }

    /// Diatonic index with C0 = 0 (one step per letter name).
    pub fn diatonic(&self) -> i32 {
        let step_index = match self.step.to_ascii_uppercase() {
            'C' => 0,
            'D' => 1,
            'E' => 2,
            'F' => 3,
            'G' => 4,
            'A' => 5,
            'B' => 6,
            _ => 0,
        };
        self.octave * 7 + step_index
    }

    /// Staff position relative to the bottom line of a five-line staff
    /// under the given clef (bottom line = 0, one step per line/space).
    pub fn staff_position(&self, clef: &Clef) -> i32 {
        let clef_ref = match clef.kind {
            ClefKind::C => 4 * 7,      // c'
            ClefKind::F => 3 * 7 + 3,  // f
            ClefKind::G => 4 * 7 + 4,  // g'
            ClefKind::G8 => 3 * 7 + 4, // g (octave-transposing treble)
            // Accidental clefs mark the pitch they sign.
            ClefKind::Flat | ClefKind::Sharp | ClefKind::Natural => 3 * 7 + 6,
        };
        self.diatonic() - clef_ref + (clef.line - 1) * 2
    }
}

/// Clef kinds, including the accidental "clefs" that make up a mensural
/// signature (a flat on the b line is a signature element, not a one-off
/// accidental).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClefKind {
    C,
    F,
    G,
    /// Modern treble clef sounding an octave lower
    G8,
    Flat,
    Sharp,
    Natural,
}

impl ClefKind {
    pub fn is_accidental(&self) -> bool {
        matches!(self, ClefKind::Flat | ClefKind::Sharp | ClefKind::Natural)
    }

    /// The clef drawn when modern-clef substitution is on. C clefs become
    /// octave-transposing treble clefs; everything else keeps its shape.
    pub fn modern_equivalent(&self) -> ClefKind {
        match self {
            ClefKind::C => ClefKind::G8,
            other => *other,
        }
    }
}

/// A clef event: principal (C/F/G) or accidental (signature flat etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clef {
    pub kind: ClefKind,
    /// Staff line the clef sits on (bottom line = 1)
    pub line: i32,
    /// Whether this clef is part of the running signature (stays in
    /// effect until replaced) as opposed to a one-off sign
    pub signature: bool,
}

impl Clef {
    pub fn new(kind: ClefKind, line: i32, signature: bool) -> Self {
        Clef { kind, line, signature }
    }
}

/// The full clef state of a voice: one principal clef plus any signature
/// accidentals currently in effect.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClefSet {
    pub principal: Option<Clef>,
    pub accidentals: Vec<Clef>,
}

impl ClefSet {
    pub fn flat_count(&self) -> usize {
        self.accidentals
            .iter()
            .filter(|c| c.kind == ClefKind::Flat)
            .count()
    }

    /// Whether two signatures carry the same accidental set (kind and
    /// line both matter; a flat moved to another line is a real change).
    pub fn same_accidentals(&self, other: &ClefSet) -> bool {
        self.accidentals.len() == other.accidentals.len()
            && self
                .accidentals
                .iter()
                .zip(&other.accidentals)
                .all(|(a, b)| a.kind == b.kind && a.line == b.line)
    }

    /// Fold one clef into the set. A new principal clef starts a fresh
    /// signature; accidentals accumulate onto the current one.
    pub fn apply(&mut self, clef: &Clef) {
        if clef.kind.is_accidental() {
            self.accidentals.push(*clef);
        } else {
            self.principal = Some(*clef);
            self.accidentals.clear();
        }
    }
}

/// Mensuration signs as written in the sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MensSign {
    O,
    C,
    OCut,
    CCut,
}

/// A notational regime: how many minims make a breve, and the tempo
/// ratio the sign implies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mensuration {
    pub sign: Option<MensSign>,
    pub minims_per_breve: i64,
    pub tempo_change: Proportion,
}

impl Default for Mensuration {
    fn default() -> Self {
        Mensuration {
            sign: None,
            minims_per_breve: 4,
            tempo_change: Proportion::one(),
        }
    }
}

impl Mensuration {
    /// Breve length in minims as an exact value.
    pub fn breve_length(&self) -> Proportion {
        Proportion::from_int(self.minims_per_breve)
    }
}

/// Ink colors used for coloration passages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InkColor {
    Black,
    Red,
    Blue,
}

/// The coloration scheme currently in effect for a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coloration {
    pub color: InkColor,
    pub filled: bool,
}

impl Default for Coloration {
    fn default() -> Self {
        Coloration {
            color: InkColor::Black,
            filled: true,
        }
    }
}

/// Mensural note values, longest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoteType {
    Maxima,
    Longa,
    Breve,
    Semibreve,
    Minim,
    Semiminim,
    Fusa,
    Semifusa,
}

impl NoteType {
    /// Nominal length in minims under imperfect defaults. The duration of
    /// a source event always comes from the event itself; this is only a
    /// convenience for constructing event data.
    pub fn default_minims(&self) -> Proportion {
        match self {
            NoteType::Maxima => Proportion::from_int(16),
            NoteType::Longa => Proportion::from_int(8),
            NoteType::Breve => Proportion::from_int(4),
            NoteType::Semibreve => Proportion::from_int(2),
            NoteType::Minim => Proportion::one(),
            NoteType::Semiminim => Proportion::new(1, 2),
            NoteType::Fusa => Proportion::new(1, 4),
            NoteType::Semifusa => Proportion::new(1, 8),
        }
    }

    /// Whether the notehead is stemmed (minim and shorter).
    pub fn stemmed(&self) -> bool {
        matches!(
            self,
            NoteType::Minim | NoteType::Semiminim | NoteType::Fusa | NoteType::Semifusa
        )
    }
}

/// Tie connection from a note to the one that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieType {
    None,
    Over,
    Under,
}

/// One syllable of modern texting attached to a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syllable {
    pub text: String,
    /// Whether this syllable ends its word
    pub word_end: bool,
}

/// Payload of a note event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteData {
    pub note_type: NoteType,
    /// Nominal duration in minims, before proportion scaling
    pub length: Proportion,
    pub pitch: Pitch,
    /// Whether this note is joined to the next one in a ligature
    pub ligature: bool,
    /// Tie to the following note
    pub tie: TieType,
    /// Whether the note is written in the secondary coloration
    pub colored: bool,
    /// Editorially supplied accidental for modern display
    /// (-1 = flat, 0 = natural, 1 = sharp)
    pub modern_accidental: Option<i32>,
    /// Modern-texting syllable sung under this note
    pub syllable: Option<Syllable>,
}

impl NoteData {
    /// A plain note of the given value at its default length.
    pub fn simple(note_type: NoteType, pitch: Pitch) -> Self {
        NoteData {
            note_type,
            length: note_type.default_minims(),
            pitch,
            ligature: false,
            tie: TieType::None,
            colored: false,
            modern_accidental: None,
            syllable: None,
        }
    }
}

/// Payload of a rest event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestData {
    pub note_type: NoteType,
    pub length: Proportion,
}

/// A dot event. Dots of addition glue to the note they augment; dots of
/// division are purely notational separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DotData {
    pub addition: bool,
}

/// A barline written in the source (chant and text sections; mensural
/// barlines come from the measure grid, not from events).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarlineData {
    pub num_lines: i32,
    pub repeat_sign: bool,
}

/// A stretch where the source is physically damaged or missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LacunaData {
    pub length: Proportion,
}

/// One alternate reading inside a variant region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantReading {
    /// Version identifiers this reading belongs to
    pub versions: Vec<String>,
    /// Whether the editor regards this reading as a scribal error
    pub error: bool,
    /// Whether this reading is a lacuna in its sources
    pub lacuna: bool,
    /// Substitute event sequence for the bracketed region
    pub events: Vec<Event>,
}

/// A variant-region start marker. The default (editorially preferred)
/// reading is the event run between this marker and its matching end
/// marker; alternates are stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantMarker {
    pub id: u32,
    pub readings: Vec<VariantReading>,
}

impl VariantMarker {
    /// Find the reading shown under the given version, if any.
    pub fn reading_for(&self, version: &str) -> Option<(usize, &VariantReading)> {
        self.readings
            .iter()
            .enumerate()
            .find(|(_, r)| r.versions.iter().any(|v| v == version))
    }
}

/// The closed set of event kinds the engine understands. Builder
/// substitution, positioning policy and spacing policy each dispatch on
/// this tag exactly once (see `layout::policy`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    Note(NoteData),
    Rest(RestData),
    Clef(Clef),
    Mensuration(Mensuration),
    Proportion(Proportion),
    ColorChange(Coloration),
    Dot(DotData),
    Barline(BarlineData),
    OriginalText(String),
    Annotation(String),
    Lacuna(LacunaData),
    LineEnd { page_end: bool },
    VariantStart(VariantMarker),
    VariantEnd { marker_id: u32 },
    /// Modern key signature (positive fifths = sharps, negative = flats)
    ModernKeySignature { fifths: i32 },
    /// Several simultaneous source events occupying one timeline slot
    Multi(Vec<Event>),
    /// Synthesized "no further content" filler (never present in input)
    SectionEnd,
}

/// One source event: a kind tag plus editorial flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    /// Whether the event is an editorial emendation
    pub editorial: bool,
    /// Whether the editor flags the source text as erroneous here
    pub error: bool,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Event {
            kind,
            editorial: false,
            error: false,
        }
    }

    pub fn note(data: NoteData) -> Self {
        Event::new(EventKind::Note(data))
    }

    pub fn rest(note_type: NoteType, length: Proportion) -> Self {
        Event::new(EventKind::Rest(RestData { note_type, length }))
    }

    /// Nominal duration before proportion scaling; zero for untimed
    /// events.
    pub fn nominal_length(&self) -> Proportion {
        match &self.kind {
            EventKind::Note(n) => n.length,
            EventKind::Rest(r) => r.length,
            EventKind::Lacuna(l) => l.length,
            EventKind::Multi(events) => events
                .iter()
                .map(Event::nominal_length)
                .fold(Proportion::zero(), Proportion::max),
            _ => Proportion::zero(),
        }
    }

    pub fn is_untimed(&self) -> bool {
        self.nominal_length().is_zero()
    }
}

/// One voice: an identity, its ordered event sequence, and the versions
/// in which it is missing entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    /// 1-based voice number as presented to users
    pub number: usize,
    pub name: String,
    pub events: Vec<Event>,
    /// Version identifiers under which this voice has no source
    pub missing_in: Vec<String>,
}

impl Voice {
    pub fn new(number: usize, name: impl Into<String>, events: Vec<Event>) -> Self {
        Voice {
            number,
            name: name.into(),
            events,
            missing_in: Vec::new(),
        }
    }

    pub fn is_missing_in(&self, version: Option<&str>) -> bool {
        match version {
            Some(v) => self.missing_in.iter().any(|m| m == v),
            None => false,
        }
    }
}

/// Notational system of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionType {
    MensuralMusic,
    Plainchant,
    Text,
}

/// A contiguous run of measures sharing one music-time base and one
/// notational system. Sections chain: each section's ending per-voice
/// state seeds the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub section_type: SectionType,
    pub voices: Vec<Voice>,
}

impl Section {
    pub fn mensural(voices: Vec<Voice>) -> Self {
        Section {
            section_type: SectionType::MensuralMusic,
            voices,
        }
    }
}
