//! Diagnostic taxonomy for the layout engine.
//!
//! Every condition here is recoverable: the engine records the
//! diagnostic, logs it, and continues with best-effort state. Nothing in
//! a render pass aborts or panics on malformed input.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A structural anomaly found while rendering. Carried on the render
/// result and also emitted through `log::warn!`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A variant-end marker with no open region; the marker is treated
    /// as absent.
    #[error("voice {voice}: variant end marker {marker_id} at event {index} without an open region")]
    UnmatchedVariantEnd {
        voice: usize,
        index: usize,
        marker_id: u32,
    },

    /// A variant-start marker whose end marker never arrives; the region
    /// is treated as extending to the end of the voice.
    #[error("voice {voice}: variant region {marker_id} opened at event {index} is never closed")]
    UnclosedVariant {
        voice: usize,
        index: usize,
        marker_id: u32,
    },

    /// A mensuration whose minim count cannot define a measure scale;
    /// the default mensuration is substituted.
    #[error("voice {voice}: mensuration with {minims} minims per breve at event {index}; using default")]
    DegenerateMensuration {
        voice: usize,
        index: usize,
        minims: i64,
    },

    /// A dot with nothing before it to augment or divide.
    #[error("voice {voice}: dot at event {index} with no preceding note")]
    StrayDot { voice: usize, index: usize },

    /// A ligature still open when the voice's events ran out; closed at
    /// the final member.
    #[error("voice {voice}: ligature left open at end of section")]
    UnclosedLigature { voice: usize },

    /// A tie still open when the voice's events ran out.
    #[error("voice {voice}: tie left open at end of section")]
    UnclosedTie { voice: usize },
}

impl Diagnostic {
    /// Record into the pass's diagnostic list and the log in one step.
    pub(crate) fn emit(self, sink: &mut Vec<Diagnostic>) {
        log::warn!("{self}");
        sink.push(self);
    }
}
