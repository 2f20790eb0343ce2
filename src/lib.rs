//! mensurlib: layout engine for scores in pre-modern (mensural) music
//! notation.
//!
//! The engine consumes abstract per-voice event streams and produces a
//! fully positioned render list per voice plus a shared measure grid,
//! with exact rational time arithmetic throughout. It never draws;
//! presentation layers consume the glyph placements it reports.
//!
//! # Example
//! ```
//! use mensurlib::model::{Event, NoteData, NoteType, Pitch, Section, Voice};
//! use mensurlib::ScoreRenderer;
//!
//! let voice = Voice::new(
//!     1,
//!     "Superius",
//!     vec![Event::note(NoteData::simple(NoteType::Semibreve, Pitch::new('G', 4)))],
//! );
//! let section = Section::mensural(vec![voice]);
//! let rendered = ScoreRenderer::new().render_section(&section, &[]);
//! assert_eq!(rendered.voices.len(), 1);
//! ```

pub mod error;
pub mod layout;
pub mod model;
pub mod options;
pub mod proportion;

pub use error::Diagnostic;
pub use layout::state::VoiceState;
pub use layout::{rendered_to_json, RenderedSection, RenderedVoice, ScoreRenderer};
pub use options::{DisplayOptions, LayoutScale, VersionSelection};
pub use proportion::Proportion;
