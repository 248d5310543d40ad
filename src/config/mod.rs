// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration files.
//!
//! Editor settings are TOML; score descriptions and edit scripts are YAML.

pub mod script;

pub use script::{EditOp, EditScript};

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::score::{
    ChordRest, Element, Instrument, InstrumentChange, MasterScore, Part, PartId, Score, ScoreView, Staff,
    StaffId, Tick, DEFAULT_MEASURE_TICKS, PRIMARY_TICK,
};

/// Editor settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorConfig {
    /// Undo steps kept before the oldest is dropped
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Joins instrument names into a part title
    #[serde(default = "default_separator")]
    pub part_name_separator: String,
    /// Length of measures created by the editor
    #[serde(default = "default_measure_ticks")]
    pub measure_ticks: Tick,
}

fn default_history_limit() -> usize {
    100
}
fn default_separator() -> String {
    " & ".to_string()
}
fn default_measure_ticks() -> Tick {
    DEFAULT_MEASURE_TICKS
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            part_name_separator: default_separator(),
            measure_ticks: default_measure_ticks(),
        }
    }
}

impl EditorConfig {
    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read editor config: {:?}", path.as_ref()))?;
        Self::from_toml(&contents)
    }

    /// Parse settings from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse editor config")?;
        if config.measure_ticks == 0 {
            bail!("measure_ticks must be greater than zero");
        }
        Ok(config)
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize editor config")
    }
}

/// Description of a score with its parts and excerpts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreFile {
    /// Score-level settings
    #[serde(default)]
    pub score: ScoreSettings,
    /// Parts in score order
    #[serde(default)]
    pub parts: Vec<PartEntry>,
    /// Excerpts built from the parts
    #[serde(default)]
    pub excerpts: Vec<ExcerptEntry>,
}

/// Score-level settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreSettings {
    #[serde(default)]
    pub title: String,
    /// Number of measures
    #[serde(default = "default_measures")]
    pub measures: usize,
    /// Length of each measure
    #[serde(default = "default_measure_ticks")]
    pub measure_ticks: Tick,
}

fn default_measures() -> usize {
    4
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            measures: default_measures(),
            measure_ticks: default_measure_ticks(),
        }
    }
}

/// A part of the score file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartEntry {
    pub id: PartId,
    /// Display name; defaults to the primary instrument's name
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Instrument entries; the earliest becomes the primary instrument
    pub instruments: Vec<InstrumentEntry>,
    /// Staves; when empty the primary instrument's staff count is used
    #[serde(default)]
    pub staves: Vec<StaffEntry>,
}

fn default_visible() -> bool {
    true
}

/// An instrument placed at a tick
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentEntry {
    #[serde(default)]
    pub tick: Tick,
    #[serde(flatten)]
    pub instrument: Instrument,
}

/// A staff of the score file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StaffEntry {
    #[serde(default)]
    pub id: Option<StaffId>,
    /// Chords and rests; when empty every measure gets a whole-measure rest
    #[serde(default)]
    pub notes: Vec<NoteEntry>,
}

/// A chord, or a rest when `pitches` is empty
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteEntry {
    pub tick: Tick,
    pub duration: Tick,
    #[serde(default)]
    pub voice: usize,
    #[serde(default)]
    pub pitches: Vec<u8>,
}

/// An excerpt of the score file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExcerptEntry {
    pub title: String,
    pub parts: Vec<PartId>,
}

impl ScoreFile {
    /// Load a score description from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read score file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a score description from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse score YAML")
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize score to YAML")
    }

    /// Save to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write score file: {:?}", path.as_ref()))
    }

    /// Describe the master score and its excerpts
    pub fn from_score(score: &MasterScore) -> Self {
        let master = score.master();
        let settings = ScoreSettings {
            title: String::new(),
            measures: master.measures().len(),
            measure_ticks: master.first_measure().map_or(DEFAULT_MEASURE_TICKS, |m| m.ticks),
        };

        let parts = master
            .parts()
            .iter()
            .map(|part| PartEntry {
                id: part.id.clone(),
                name: Some(part.name.clone()),
                visible: part.visible,
                instruments: part
                    .instruments
                    .iter()
                    .map(|(tick, instrument)| InstrumentEntry {
                        tick: *tick,
                        instrument: instrument.clone(),
                    })
                    .collect(),
                staves: staff_entries(master, part),
            })
            .collect();

        let excerpts = score
            .excerpts()
            .iter()
            .map(|e| ExcerptEntry {
                title: e.title.clone(),
                parts: e.score.parts().iter().map(|p| p.id.clone()).collect(),
            })
            .collect();

        Self {
            score: settings,
            parts,
            excerpts,
        }
    }

    /// Build a master score. The construction is not part of the undo history.
    pub fn build(&self, history_limit: usize) -> Result<MasterScore> {
        if self.score.measure_ticks == 0 {
            bail!("measure_ticks must be greater than zero");
        }

        let mut score = MasterScore::with_history_limit(history_limit);
        score.begin_transaction();
        if let Err(err) = self.populate(&mut score) {
            score.rollback_transaction();
            return Err(err);
        }
        score.commit_transaction();
        score.clear_history();
        Ok(score)
    }

    fn populate(&self, score: &mut MasterScore) -> Result<()> {
        let view = ScoreView::Master;
        for _ in 0..self.score.measures {
            score.append_measure(self.score.measure_ticks)?;
        }

        for entry in &self.parts {
            let Some(first) = entry.instruments.iter().min_by_key(|i| i.tick) else {
                bail!("part {} has no instruments", entry.id);
            };
            let primary = first.instrument.clone();

            let mut part = Part::new(entry.id.clone(), primary.clone());
            part.instruments.clear();
            for (index, instrument) in entry.instruments.iter().enumerate() {
                // The earliest entry always sits at the primary tick
                let tick = if std::ptr::eq(instrument, first) {
                    PRIMARY_TICK
                } else {
                    instrument.tick
                };
                if part.instruments.insert(tick, instrument.instrument.clone()).is_some() {
                    bail!("part {}: two instruments at tick {} (entry {})", entry.id, tick, index);
                }
            }
            if let Some(name) = &entry.name {
                part.name = name.clone();
            }
            part.visible = entry.visible;
            let secondaries: Vec<(Tick, Instrument)> = part
                .instruments
                .iter()
                .skip(1)
                .map(|(tick, instrument)| (*tick, instrument.clone()))
                .collect();

            score
                .insert_part(view, part, usize::MAX)
                .with_context(|| format!("Failed to add part {}", entry.id))?;

            let staves = if entry.staves.is_empty() {
                vec![StaffEntry::default(); primary.staff_count.max(1)]
            } else {
                entry.staves.clone()
            };
            for (index, staff_entry) in staves.iter().enumerate() {
                let id = match &staff_entry.id {
                    Some(id) => id.clone(),
                    None => score.new_staff_id(),
                };
                let mut staff = Staff::new(id.clone(), entry.id.clone());
                staff.init_from_instrument(&primary, None, index);
                score.insert_staff(view, staff, index, staff_entry.notes.is_empty())?;

                for note in &staff_entry.notes {
                    let chord_rest = ChordRest {
                        id: score.new_element_id(),
                        staff: id.clone(),
                        voice: note.voice,
                        tick: note.tick,
                        duration: note.duration,
                        visible: true,
                        pitches: note.pitches.clone(),
                    };
                    let element = if note.pitches.is_empty() {
                        Element::Rest(chord_rest)
                    } else {
                        Element::Chord(chord_rest)
                    };
                    score.add_element(view, element)?;
                }
            }

            for (tick, instrument) in secondaries {
                let marker = InstrumentChange {
                    id: score.new_element_id(),
                    part: entry.id.clone(),
                    tick,
                    instrument,
                    init: true,
                };
                score.add_element(view, Element::InstrumentChange(marker))?;
            }
        }

        for excerpt in &self.excerpts {
            score
                .add_excerpt(excerpt.title.clone(), &excerpt.parts)
                .with_context(|| format!("Failed to build excerpt {:?}", excerpt.title))?;
        }
        Ok(())
    }
}

fn staff_entries(score: &Score, part: &Part) -> Vec<StaffEntry> {
    score
        .part_staves(&part.id)
        .into_iter()
        .map(|staff| StaffEntry {
            id: Some(staff.id.clone()),
            notes: score
                .staff_content(&staff.id)
                .into_iter()
                .map(|cr| NoteEntry {
                    tick: cr.tick,
                    duration: cr.duration,
                    voice: cr.voice,
                    pitches: cr.pitches.clone(),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const QUARTET: &str = r#"
score:
  title: "Quartet"
  measures: 2

parts:
  - id: violin
    instruments:
      - id: violin
        name: Violin
        short_name: Vln.
      - tick: 1920
        id: viola
        name: Viola
  - id: piano
    instruments:
      - id: piano
        name: Piano
        clefs: [g, f]
        staff_count: 2
  - id: cello
    name: "Cello I"
    instruments:
      - id: cello
        name: Violoncello
    staves:
      - id: vc-1
        notes:
          - { tick: 0, duration: 960, pitches: [48] }
          - { tick: 960, duration: 960 }

excerpts:
  - title: "Strings"
    parts: [violin, cello]
"#;

    #[test]
    fn test_parse_score_file() {
        let file = ScoreFile::from_yaml(QUARTET).unwrap();
        assert_eq!(file.score.title, "Quartet");
        assert_eq!(file.score.measure_ticks, DEFAULT_MEASURE_TICKS);
        assert_eq!(file.parts.len(), 3);
        assert_eq!(file.parts[0].instruments[1].tick, 1920);
        assert_eq!(file.parts[0].instruments[0].instrument.short_name, "Vln.");
        assert_eq!(file.parts[1].instruments[0].instrument.staff_count, 2);
        assert_eq!(file.excerpts[0].parts.len(), 2);
    }

    #[test]
    fn test_build_score() {
        let score = ScoreFile::from_yaml(QUARTET).unwrap().build(10).unwrap();
        let master = score.master();

        assert!(!score.undo_stack().can_undo());
        assert_eq!(master.measures().len(), 2);
        assert_eq!(master.nstaves(), 4);

        let violin = master.part(&PartId::from("violin")).unwrap();
        assert_eq!(violin.instruments.len(), 2);
        assert!(master.unanchored_instrument_ticks(&violin.id).is_empty());

        let cello = master.part(&PartId::from("cello")).unwrap();
        assert_eq!(cello.name, "Cello I");
        assert_eq!(master.staff_content(&StaffId::from("vc-1")).len(), 2);

        assert_eq!(score.excerpts().len(), 1);
        assert_eq!(score.excerpts()[0].score.nstaves(), 2);
    }

    #[test]
    fn test_build_rejects_part_without_instruments() {
        let yaml = r#"
parts:
  - id: empty
    instruments: []
"#;
        let result = ScoreFile::from_yaml(yaml).unwrap().build(10);
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("score.yaml");

        let score = ScoreFile::from_yaml(QUARTET).unwrap().build(10).unwrap();
        let file = ScoreFile::from_score(&score);
        file.save(&path).unwrap();

        let reloaded = ScoreFile::load(&path).unwrap();
        assert_eq!(reloaded, file);
        let rebuilt = reloaded.build(10).unwrap();
        assert_eq!(rebuilt.master().parts(), score.master().parts());
    }

    #[test]
    fn test_editor_config() {
        let config = EditorConfig::from_toml("history_limit = 5\n").unwrap();
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.part_name_separator, " & ");
        assert_eq!(config.measure_ticks, DEFAULT_MEASURE_TICKS);

        assert!(EditorConfig::from_toml("measure_ticks = 0\n").is_err());

        let text = EditorConfig::default().to_toml().unwrap();
        assert_eq!(EditorConfig::from_toml(&text).unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_editor_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("editor.toml");
        fs::write(&path, "part_name_separator = \" / \"\n").unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.part_name_separator, " / ");
        assert!(EditorConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
