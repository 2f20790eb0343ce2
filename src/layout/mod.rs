//! The two-phase layout engine.
//!
//! Phase 1 (`event_list`) walks each voice independently, applying
//! display substitutions and variant selection, and produces a list of
//! decorated rendered events plus measure assignments. Phase 2
//! (`positioning`) sweeps all voices together and assigns the x
//! coordinate of every event and the width of every measure. The split
//! means per-voice semantics never depend on other voices, and
//! cross-voice alignment never depends on event semantics.

pub(crate) mod constants;
mod event_list;
pub mod glyphs;
pub mod measure;
pub mod policy;
mod positioning;
pub mod rendered;
pub mod spans;
pub mod state;

use crate::error::Diagnostic;
use crate::model::Section;
use crate::options::{DisplayOptions, LayoutScale, VersionSelection};
use glyphs::{DefaultMetrics, GlyphMetrics};
use measure::MeasureList;
use rendered::RenderedEvent;
use serde::{Deserialize, Serialize};
use spans::{Span, VariantSpan};
use state::{VoiceContext, VoiceState};

/// One voice's complete render output: the positioned event list plus
/// the spans presentation layers draw over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedVoice {
    pub events: Vec<RenderedEvent>,
    pub ligatures: Vec<Span>,
    pub ties: Vec<Span>,
    pub variants: Vec<VariantSpan>,
}

/// The full render result for one section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedSection {
    pub voices: Vec<RenderedVoice>,
    pub measures: MeasureList,
    pub diagnostics: Vec<Diagnostic>,
    /// Per-voice notational state at the section end, fed to the next
    /// section
    pub ending_state: Vec<VoiceState>,
}

/// The engine facade: display options, scale and version selection for
/// one or more render passes.
pub struct ScoreRenderer {
    options: DisplayOptions,
    scale: LayoutScale,
    version: VersionSelection,
    metrics: Box<dyn GlyphMetrics>,
}

impl Default for ScoreRenderer {
    fn default() -> Self {
        ScoreRenderer::new()
    }
}

impl ScoreRenderer {
    pub fn new() -> Self {
        ScoreRenderer {
            options: DisplayOptions::default(),
            scale: LayoutScale::default(),
            version: VersionSelection::default(),
            metrics: Box::new(DefaultMetrics),
        }
    }

    pub fn with_options(mut self, options: DisplayOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_scale(mut self, scale: LayoutScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_version(mut self, version: VersionSelection) -> Self {
        self.version = version;
        self
    }

    pub fn with_metrics(mut self, metrics: Box<dyn GlyphMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Render one section. `starting` supplies each voice's carried-over
    /// notational state; missing entries fall back to the conventional
    /// initial state.
    pub fn render_section(&self, section: &Section, starting: &[VoiceState]) -> RenderedSection {
        let num_voices = section.voices.len();
        let mut measures = MeasureList::new(num_voices, self.scale.minim_width);
        let mut diagnostics = Vec::new();
        let initial = VoiceState::initial();

        let mut contexts: Vec<VoiceContext> = Vec::with_capacity(num_voices);
        let mut lists: Vec<Vec<RenderedEvent>> = Vec::with_capacity(num_voices);
        for (i, voice) in section.voices.iter().enumerate() {
            let state = starting.get(i).unwrap_or(&initial);
            let mut ctx = VoiceContext::new(i, voice, state, &self.version);
            let list = event_list::build_voice(
                voice,
                &self.options,
                &self.version,
                &mut measures,
                &mut ctx,
                &mut diagnostics,
            );
            contexts.push(ctx);
            lists.push(list);
        }

        if !lists.is_empty() {
            let total = measures.len();
            for (ctx, list) in contexts.iter_mut().zip(lists.iter_mut()) {
                event_list::fill_to_end(total, &mut measures, ctx, list, &mut diagnostics);
            }
            positioning::position_voices(
                &mut lists,
                &mut measures,
                &self.scale,
                self.metrics.as_ref(),
            );
        }

        let ending_state = contexts.iter().map(VoiceContext::ending_state).collect();
        let voices = lists
            .into_iter()
            .zip(contexts)
            .map(|(events, ctx)| RenderedVoice {
                events,
                ligatures: ctx.spans.ligatures,
                ties: ctx.spans.ties,
                variants: ctx.spans.variants,
            })
            .collect();

        RenderedSection {
            voices,
            measures,
            diagnostics,
            ending_state,
        }
    }

    /// Render a whole score: sections in order, each seeded with the
    /// previous section's ending state.
    pub fn render_score(&self, sections: &[Section]) -> Vec<RenderedSection> {
        let mut states: Vec<VoiceState> = Vec::new();
        let mut out = Vec::with_capacity(sections.len());
        for section in sections {
            let rendered = self.render_section(section, &states);
            states = rendered.ending_state.clone();
            out.push(rendered);
        }
        out
    }
}

/// Serialize a render result for external consumers.
pub fn rendered_to_json(section: &RenderedSection) -> Result<String, String> {
    serde_json::to_string_pretty(section).map_err(|e| e.to_string())
}
