//! Display options and render parameters.
//!
//! The engine only reads these; it never mutates them. Scale values are
//! threaded explicitly (no global render constants) so repeated renders
//! with different scales can coexist.

use serde::{Deserialize, Serialize};

/// Which clef shapes to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClefMode {
    #[default]
    Original,
    Modern,
}

/// Which accidental system governs signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccidentalMode {
    #[default]
    Original,
    Modern,
}

/// Which note shapes to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoteShapeMode {
    #[default]
    Original,
    Modern,
}

/// Which underlaid text to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextDisplay {
    None,
    Original,
    Modern,
    #[default]
    Both,
}

impl TextDisplay {
    pub fn shows_original(&self) -> bool {
        matches!(self, TextDisplay::Original | TextDisplay::Both)
    }

    pub fn shows_modern(&self) -> bool {
        matches!(self, TextDisplay::Modern | TextDisplay::Both)
    }
}

/// Custom selection of variant-reading categories to mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VariantCategories {
    pub substantive: bool,
    pub error: bool,
    pub lacuna: bool,
}

/// Which variant regions get visible brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VariantMarking {
    None,
    #[default]
    All,
    Custom(VariantCategories),
}

/// The full display-options object consumed by the builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayOptions {
    pub clef_mode: ClefMode,
    pub accidental_mode: AccidentalMode,
    pub note_shape_mode: NoteShapeMode,
    pub text_display: TextDisplay,
    /// Draw every clef repeated at a line break, even when identical to
    /// the running signature
    pub show_all_newline_clefs: bool,
    pub ligature_brackets: bool,
    pub editorial_tags: bool,
    pub variant_marking: VariantMarking,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            clef_mode: ClefMode::default(),
            accidental_mode: AccidentalMode::default(),
            note_shape_mode: NoteShapeMode::default(),
            text_display: TextDisplay::default(),
            show_all_newline_clefs: true,
            ligature_brackets: true,
            editorial_tags: true,
            variant_marking: VariantMarking::default(),
        }
    }
}

/// Horizontal scale parameters, passed explicitly per render pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutScale {
    /// Layout units per minim of musical time
    pub minim_width: f64,
    /// Fixed padding added after every barline
    pub barline_padding: f64,
}

impl Default for LayoutScale {
    fn default() -> Self {
        LayoutScale {
            minim_width: crate::layout::constants::DEFAULT_MINIM_WIDTH,
            barline_padding: crate::layout::constants::DEFAULT_BARLINE_PADDING,
        }
    }
}

/// Selects which reading each variant region displays. `None` shows the
/// default (editorially preferred) reading everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VersionSelection {
    pub version: Option<String>,
}

impl VersionSelection {
    pub fn default_version() -> Self {
        VersionSelection { version: None }
    }

    pub fn named(version: impl Into<String>) -> Self {
        VersionSelection {
            version: Some(version.into()),
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.version.as_deref()
    }
}
