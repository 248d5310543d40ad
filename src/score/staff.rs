// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Staves and their layout configuration.

use serde::{Deserialize, Serialize};

use super::instrument::{BracketType, ClefType, Instrument};
use super::types::{LinkId, PartId, StaffId, MAX_STAVES, VOICES};

/// Staff type presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffType {
    /// Five-line pitched staff
    #[default]
    Standard,
    /// Unpitched percussion staff
    Percussion,
    /// Six-string tablature
    Tablature,
}

/// When an empty staff is hidden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HideMode {
    /// Use the score-wide setting
    #[default]
    Auto,
    /// Hide whenever the whole system is empty for this staff
    Always,
    /// Never hide
    Never,
    /// Hide only together with the rest of the instrument
    Instrument,
}

/// Notehead rendering scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteheadScheme {
    /// Regular noteheads
    #[default]
    Normal,
    /// Pitch names inside the head
    PitchName,
    /// Shape notes
    ShapeNote,
}

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8, pub u8);

impl Default for Color {
    fn default() -> Self {
        Color(0, 0, 0, 255)
    }
}

/// Settings carried by the staff type at the start of the score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffTypeSettings {
    /// Preset the settings derive from
    pub preset: StaffType,
    /// Reduced size
    pub small: bool,
    /// Number of lines
    pub lines: u8,
    /// Distance between lines in spatium
    pub line_distance: f64,
    /// Generate clefs
    pub gen_clef: bool,
    /// Generate time signatures
    pub gen_timesig: bool,
    /// Generate key signatures
    pub gen_keysig: bool,
    /// Show barlines
    pub show_barlines: bool,
    /// Draw without stems
    pub stemless: bool,
    /// Show ledger lines
    pub show_ledger_lines: bool,
    /// Notehead scheme
    pub notehead_scheme: NoteheadScheme,
}

impl StaffTypeSettings {
    /// Settings of a preset
    pub fn preset(preset: StaffType) -> Self {
        let standard = Self {
            preset,
            small: false,
            lines: 5,
            line_distance: 1.0,
            gen_clef: true,
            gen_timesig: true,
            gen_keysig: true,
            show_barlines: true,
            stemless: false,
            show_ledger_lines: true,
            notehead_scheme: NoteheadScheme::Normal,
        };

        match preset {
            StaffType::Standard => standard,
            StaffType::Percussion => Self {
                gen_keysig: false,
                ..standard
            },
            StaffType::Tablature => Self {
                lines: 6,
                line_distance: 1.5,
                gen_keysig: false,
                show_ledger_lines: false,
                ..standard
            },
        }
    }
}

impl Default for StaffTypeSettings {
    fn default() -> Self {
        Self::preset(StaffType::Standard)
    }
}

/// Layout configuration applied in one go by the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffConfig {
    pub visible: bool,
    pub lines_color: Color,
    pub visible_lines: bool,
    pub user_distance: f64,
    pub scale: f64,
    pub show_if_empty: bool,
    pub lines_count: u8,
    pub line_distance: f64,
    pub show_clef: bool,
    pub show_time_signature: bool,
    pub show_key_signature: bool,
    pub show_barlines: bool,
    pub show_stemless: bool,
    pub show_ledger_lines_pitched: bool,
    pub notehead_scheme: NoteheadScheme,
    pub hide_system_barline: bool,
    pub merge_matching_rests: bool,
    pub hide_mode: HideMode,
    pub clef_type: ClefType,
}

impl Default for StaffConfig {
    fn default() -> Self {
        let settings = StaffTypeSettings::default();
        Self {
            visible: true,
            lines_color: Color::default(),
            visible_lines: true,
            user_distance: 0.0,
            scale: 1.0,
            show_if_empty: false,
            lines_count: settings.lines,
            line_distance: settings.line_distance,
            show_clef: settings.gen_clef,
            show_time_signature: settings.gen_timesig,
            show_key_signature: settings.gen_keysig,
            show_barlines: settings.show_barlines,
            show_stemless: settings.stemless,
            show_ledger_lines_pitched: settings.show_ledger_lines,
            notehead_scheme: settings.notehead_scheme,
            hide_system_barline: false,
            merge_matching_rests: false,
            hide_mode: HideMode::Auto,
            clef_type: ClefType::G,
        }
    }
}

/// One notation line belonging to a part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    /// Staff identifier
    pub id: StaffId,
    /// Owning part
    pub part: PartId,
    /// Staff type at the start of the score
    pub staff_type: StaffTypeSettings,
    /// Whether the staff is shown
    pub visible: bool,
    /// Whether the staff lines are hidden
    pub invisible_lines: bool,
    /// Staff line color
    pub color: Color,
    /// Extra distance above the staff
    pub user_distance: f64,
    /// Magnification
    pub scale: f64,
    /// Show even when the score hides empty staves
    pub show_if_empty: bool,
    /// Hide the system barline
    pub hide_system_barline: bool,
    /// Merge rests that match across voices
    pub merge_matching_rests: bool,
    /// Empty-staff hiding mode
    pub hide_mode: HideMode,
    /// Cutaway (hide empty measures)
    pub cutaway: bool,
    /// Default clef
    pub default_clef: ClefType,
    /// Bracket drawn for this staff
    pub bracket: BracketType,
    /// Number of staves spanned by the bracket
    pub bracket_span: usize,
    /// Barline connects to the next staff
    pub barline_span: bool,
    /// Per-voice visibility
    pub voices_visible: [bool; VOICES],
    /// Link group shared with staves holding the same content
    pub link: Option<LinkId>,
}

impl Staff {
    /// Create a standard staff for a part
    pub fn new(id: StaffId, part: PartId) -> Self {
        Self {
            id,
            part,
            staff_type: StaffTypeSettings::default(),
            visible: true,
            invisible_lines: false,
            color: Color::default(),
            user_distance: 0.0,
            scale: 1.0,
            show_if_empty: false,
            hide_system_barline: false,
            merge_matching_rests: false,
            hide_mode: HideMode::Auto,
            cutaway: false,
            default_clef: ClefType::G,
            bracket: BracketType::None,
            bracket_span: 0,
            barline_span: false,
            voices_visible: [true; VOICES],
            link: None,
        }
    }

    /// Initialize layout from the instrument's settings for staff slot `index`
    pub fn init_from_instrument(&mut self, instrument: &Instrument, preset: Option<StaffType>, index: usize) {
        let preset = preset
            .or(instrument.staff_type)
            .unwrap_or_default();
        self.staff_type = StaffTypeSettings::preset(preset);

        if index >= MAX_STAVES {
            self.staff_type.small = false;
        } else {
            self.staff_type.small = instrument.small_staff(index);
            self.bracket = instrument.bracket(index);
            self.bracket_span = instrument.bracket_span(index);
            self.barline_span = instrument.barline_span(index);
        }
        self.default_clef = instrument.clef(index);
    }

    /// Copy of this staff under a new identifier, not linked to anything
    pub fn clone_as(&self, id: StaffId) -> Self {
        Self {
            id,
            link: None,
            ..self.clone()
        }
    }

    /// Whether the staff shares content with another staff
    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    /// Whether a voice is visible
    pub fn is_voice_visible(&self, voice: usize) -> bool {
        self.voices_visible.get(voice).copied().unwrap_or(false)
    }

    /// Apply a full layout configuration
    pub fn apply_config(&mut self, config: &StaffConfig) {
        self.visible = config.visible;
        self.color = config.lines_color;
        self.invisible_lines = !config.visible_lines;
        self.user_distance = config.user_distance;
        self.scale = config.scale;
        self.show_if_empty = config.show_if_empty;
        self.staff_type.lines = config.lines_count;
        self.staff_type.line_distance = config.line_distance;
        self.staff_type.gen_clef = config.show_clef;
        self.staff_type.gen_timesig = config.show_time_signature;
        self.staff_type.gen_keysig = config.show_key_signature;
        self.staff_type.show_barlines = config.show_barlines;
        self.staff_type.stemless = config.show_stemless;
        self.staff_type.show_ledger_lines = config.show_ledger_lines_pitched;
        self.staff_type.notehead_scheme = config.notehead_scheme;
        self.hide_system_barline = config.hide_system_barline;
        self.merge_matching_rests = config.merge_matching_rests;
        self.hide_mode = config.hide_mode;
        self.default_clef = config.clef_type;
    }

    /// Current layout as a configuration
    pub fn config(&self) -> StaffConfig {
        StaffConfig {
            visible: self.visible,
            lines_color: self.color,
            visible_lines: !self.invisible_lines,
            user_distance: self.user_distance,
            scale: self.scale,
            show_if_empty: self.show_if_empty,
            lines_count: self.staff_type.lines,
            line_distance: self.staff_type.line_distance,
            show_clef: self.staff_type.gen_clef,
            show_time_signature: self.staff_type.gen_timesig,
            show_key_signature: self.staff_type.gen_keysig,
            show_barlines: self.staff_type.show_barlines,
            show_stemless: self.staff_type.stemless,
            show_ledger_lines_pitched: self.staff_type.show_ledger_lines,
            notehead_scheme: self.staff_type.notehead_scheme,
            hide_system_barline: self.hide_system_barline,
            merge_matching_rests: self.merge_matching_rests,
            hide_mode: self.hide_mode,
            clef_type: self.default_clef,
        }
    }
}
