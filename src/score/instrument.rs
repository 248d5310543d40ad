// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Instrument definitions and part-level musical preferences.

use serde::{Deserialize, Serialize};

use super::staff::StaffType;
use super::types::{InstrumentId, MAX_STAVES};

/// Clef assigned to a staff by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClefType {
    /// Treble clef
    #[default]
    G,
    /// Treble clef sounding an octave lower (guitar, tenor voice)
    G8Vb,
    /// Bass clef
    F,
    /// Alto clef
    C3,
    /// Tenor clef
    C4,
    /// Neutral percussion clef
    Percussion,
    /// Tablature clef
    Tab,
}

/// Bracket drawn to the left of a staff group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketType {
    /// No bracket
    #[default]
    None,
    /// Straight bracket
    Normal,
    /// Curly brace (keyboards)
    Brace,
    /// Thin square bracket
    Square,
    /// Single line
    Line,
}

/// Whether accidentals are spelled with sharps or flats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharpFlat {
    /// Follow the key signature
    #[default]
    Auto,
    /// Prefer sharps
    Sharps,
    /// Prefer flats
    Flats,
}

/// Transposition interval of a part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Interval {
    /// Diatonic steps
    pub diatonic: i32,
    /// Chromatic semitones
    pub chromatic: i32,
}

impl Interval {
    /// Create an interval
    pub fn new(diatonic: i32, chromatic: i32) -> Self {
        Self { diatonic, chromatic }
    }

    /// Check if this is the identity interval
    pub fn is_zero(&self) -> bool {
        self.diatonic == 0 && self.chromatic == 0
    }
}

/// A named sound/notation configuration assignable to a part.
///
/// Per-staff settings are indexed by the staff's position inside the part;
/// missing slots fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Instrument identifier (e.g. "violin")
    pub id: InstrumentId,
    /// Track name, used to derive the part title
    pub name: String,
    /// Long name printed at the start of the first system
    #[serde(default)]
    pub long_name: String,
    /// Abbreviation printed on following systems
    #[serde(default)]
    pub short_name: String,
    /// Number of staves the instrument needs
    #[serde(default = "default_staff_count")]
    pub staff_count: usize,
    /// Default clef per staff
    #[serde(default)]
    pub clefs: Vec<ClefType>,
    /// Bracket per staff
    #[serde(default)]
    pub brackets: Vec<BracketType>,
    /// Bracket span per staff
    #[serde(default)]
    pub bracket_spans: Vec<usize>,
    /// Whether the barline connects to the next staff, per staff
    #[serde(default)]
    pub barline_spans: Vec<bool>,
    /// Small staff flag per staff
    #[serde(default)]
    pub small_staves: Vec<bool>,
    /// Preferred staff type preset
    #[serde(default)]
    pub staff_type: Option<StaffType>,
}

fn default_staff_count() -> usize {
    1
}

impl Instrument {
    /// Create a single-staff instrument whose names all equal `name`
    pub fn new(id: impl Into<InstrumentId>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            long_name: name.clone(),
            short_name: String::new(),
            name,
            staff_count: default_staff_count(),
            clefs: Vec::new(),
            brackets: Vec::new(),
            bracket_spans: Vec::new(),
            barline_spans: Vec::new(),
            small_staves: Vec::new(),
            staff_type: None,
        }
    }

    /// Builder: set the abbreviation
    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = short_name.into();
        self
    }

    /// Builder: set the number of staves and their clefs
    pub fn with_staves(mut self, clefs: &[ClefType]) -> Self {
        self.staff_count = clefs.len().max(1);
        self.clefs = clefs.to_vec();
        self
    }

    /// Builder: set the bracket for the first staff and its span
    pub fn with_bracket(mut self, bracket: BracketType, span: usize) -> Self {
        self.brackets = vec![bracket];
        self.bracket_spans = vec![span];
        self
    }

    /// Builder: set the preferred staff type
    pub fn with_staff_type(mut self, staff_type: StaffType) -> Self {
        self.staff_type = Some(staff_type);
        self
    }

    /// Default clef of the staff at `index`
    pub fn clef(&self, index: usize) -> ClefType {
        self.clefs.get(index).copied().unwrap_or_default()
    }

    /// Assign the default clef of the staff at `index`
    pub fn set_clef(&mut self, index: usize, clef: ClefType) {
        if index >= MAX_STAVES {
            return;
        }
        if self.clefs.len() <= index {
            self.clefs.resize(index + 1, ClefType::default());
        }
        self.clefs[index] = clef;
    }

    /// Bracket of the staff at `index`
    pub fn bracket(&self, index: usize) -> BracketType {
        self.brackets.get(index).copied().unwrap_or_default()
    }

    /// Bracket span of the staff at `index`
    pub fn bracket_span(&self, index: usize) -> usize {
        self.bracket_spans.get(index).copied().unwrap_or(0)
    }

    /// Barline span of the staff at `index`
    pub fn barline_span(&self, index: usize) -> bool {
        self.barline_spans.get(index).copied().unwrap_or(false)
    }

    /// Small staff flag of the staff at `index`
    pub fn small_staff(&self, index: usize) -> bool {
        self.small_staves.get(index).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_defaults() {
        let violin = Instrument::new("violin", "Violin");
        assert_eq!(violin.id.as_str(), "violin");
        assert_eq!(violin.long_name, "Violin");
        assert_eq!(violin.staff_count, 1);
        assert_eq!(violin.clef(0), ClefType::G);
        assert_eq!(violin.clef(3), ClefType::G);
        assert!(!violin.small_staff(0));
    }

    #[test]
    fn test_instrument_builder() {
        let piano = Instrument::new("piano", "Piano")
            .with_short_name("Pno.")
            .with_staves(&[ClefType::G, ClefType::F])
            .with_bracket(BracketType::Brace, 2);

        assert_eq!(piano.staff_count, 2);
        assert_eq!(piano.clef(1), ClefType::F);
        assert_eq!(piano.bracket(0), BracketType::Brace);
        assert_eq!(piano.bracket_span(0), 2);
        assert_eq!(piano.bracket(1), BracketType::None);
        assert_eq!(piano.short_name, "Pno.");
    }

    #[test]
    fn test_set_clef_grows_slots() {
        let mut cello = Instrument::new("cello", "Violoncello");
        cello.set_clef(2, ClefType::C4);
        assert_eq!(cello.clefs.len(), 3);
        assert_eq!(cello.clef(2), ClefType::C4);

        cello.set_clef(MAX_STAVES, ClefType::F);
        assert_eq!(cello.clefs.len(), 3);
    }

    #[test]
    fn test_interval() {
        assert!(Interval::default().is_zero());
        assert!(!Interval::new(-1, -2).is_zero());
    }
}
