// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Edit scripts: a YAML list of editor operations applied in order.
//!
//! ```yaml
//! ops:
//!   - op: append_doubling_instrument
//!     part: violin
//!     instrument: { id: viola, name: Viola }
//!   - op: move_parts
//!     parts: [cello]
//!     destination: violin
//!     mode: before
//! ```

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::parts::{InsertMode, InteractionEvent, PartsEditor};
use crate::score::{
    Instrument, InstrumentId, Interval, PartId, ScoreView, SharpFlat, StaffConfig, StaffId, StaffType, Tick,
};

/// One editor operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    SetInstruments {
        instruments: Vec<Instrument>,
    },
    SetPartVisible {
        part: PartId,
        visible: bool,
    },
    SetPartName {
        part: PartId,
        name: String,
    },
    SetPartSharpFlat {
        part: PartId,
        sharp_flat: SharpFlat,
    },
    SetPartTransposition {
        part: PartId,
        transposition: Interval,
    },
    RemoveParts {
        parts: Vec<PartId>,
    },
    MoveParts {
        parts: Vec<PartId>,
        destination: PartId,
        #[serde(default)]
        mode: InsertMode,
    },
    SetInstrumentVisible {
        part: PartId,
        instrument: InstrumentId,
        visible: bool,
    },
    SetInstrumentName {
        part: PartId,
        instrument: InstrumentId,
        name: String,
    },
    SetInstrumentAbbreviature {
        part: PartId,
        instrument: InstrumentId,
        abbreviature: String,
    },
    AppendDoublingInstrument {
        part: PartId,
        instrument: Instrument,
    },
    ReplaceInstrument {
        part: PartId,
        instrument: InstrumentId,
        with: Instrument,
    },
    RemoveInstruments {
        part: PartId,
        instruments: Vec<InstrumentId>,
    },
    MoveInstruments {
        instruments: Vec<InstrumentId>,
        from: PartId,
        to: PartId,
        destination: InstrumentId,
        #[serde(default)]
        mode: InsertMode,
    },
    AssignInstrumentToSelectedChord {
        part: PartId,
        instrument: InstrumentId,
    },
    AppendStaff {
        part: PartId,
    },
    AppendLinkedStaff {
        staff: StaffId,
    },
    RemoveStaves {
        staves: Vec<StaffId>,
    },
    MoveStaves {
        staves: Vec<StaffId>,
        destination: StaffId,
        #[serde(default)]
        mode: InsertMode,
    },
    SetStaffVisible {
        staff: StaffId,
        visible: bool,
    },
    SetStaffType {
        staff: StaffId,
        staff_type: StaffType,
    },
    SetCutawayEnabled {
        staff: StaffId,
        enabled: bool,
    },
    SetSmallStaff {
        staff: StaffId,
        small: bool,
    },
    SetStaffConfig {
        staff: StaffId,
        config: StaffConfig,
    },
    SetVoiceVisible {
        voice: usize,
        visible: bool,
    },
    SetStaffVoiceVisible {
        staff: StaffId,
        voice: usize,
        visible: bool,
    },
    /// Select the first chord or rest of a staff starting at `tick`
    Select {
        staff: StaffId,
        tick: Tick,
    },
    ClearSelection,
    /// Edit an excerpt by title, or the master when no title is given
    SetView {
        #[serde(default)]
        excerpt: Option<String>,
    },
    /// Re-derive part titles as after a drag and drop
    UpdatePartTitles,
    Undo,
    Redo,
}

/// A list of operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditScript {
    #[serde(default)]
    pub ops: Vec<EditOp>,
}

impl EditScript {
    /// Load a script from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read edit script: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a script from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse edit script YAML")
    }

    /// Run every operation against `editor`. Fails only on operations that
    /// cannot be resolved against the score (selection or view lookups);
    /// operations before the failing one stay applied.
    pub fn apply(&self, editor: &mut PartsEditor) -> Result<usize> {
        for (index, op) in self.ops.iter().enumerate() {
            info!(index, ?op, "apply");
            op.apply(editor)
                .with_context(|| format!("Edit script operation {} failed", index + 1))?;
        }
        Ok(self.ops.len())
    }
}

impl EditOp {
    /// Run this operation against `editor`
    pub fn apply(&self, editor: &mut PartsEditor) -> Result<()> {
        match self {
            EditOp::SetInstruments { instruments } => editor.set_instruments(instruments),
            EditOp::SetPartVisible { part, visible } => editor.set_part_visible(part, *visible),
            EditOp::SetPartName { part, name } => editor.set_part_name(part, name),
            EditOp::SetPartSharpFlat { part, sharp_flat } => editor.set_part_sharp_flat(part, *sharp_flat),
            EditOp::SetPartTransposition { part, transposition } => {
                editor.set_part_transposition(part, *transposition)
            }
            EditOp::RemoveParts { parts } => editor.remove_parts(parts),
            EditOp::MoveParts {
                parts,
                destination,
                mode,
            } => editor.move_parts(parts, destination, *mode),
            EditOp::SetInstrumentVisible {
                part,
                instrument,
                visible,
            } => editor.set_instrument_visible(instrument, part, *visible),
            EditOp::SetInstrumentName { part, instrument, name } => {
                editor.set_instrument_name(instrument, part, name)
            }
            EditOp::SetInstrumentAbbreviature {
                part,
                instrument,
                abbreviature,
            } => editor.set_instrument_abbreviature(instrument, part, abbreviature),
            EditOp::AppendDoublingInstrument { part, instrument } => {
                editor.append_doubling_instrument(instrument.clone(), part)
            }
            EditOp::ReplaceInstrument { part, instrument, with } => {
                editor.replace_instrument(instrument, part, with.clone())
            }
            EditOp::RemoveInstruments { part, instruments } => editor.remove_instruments(instruments, part),
            EditOp::MoveInstruments {
                instruments,
                from,
                to,
                destination,
                mode,
            } => editor.move_instruments(instruments, from, to, destination, *mode),
            EditOp::AssignInstrumentToSelectedChord { part, instrument } => {
                editor.assign_instrument_to_selected_chord(instrument, part)
            }
            EditOp::AppendStaff { part } => editor.append_staff(part),
            EditOp::AppendLinkedStaff { staff } => editor.append_linked_staff(staff),
            EditOp::RemoveStaves { staves } => editor.remove_staves(staves),
            EditOp::MoveStaves {
                staves,
                destination,
                mode,
            } => editor.move_staves(staves, destination, *mode),
            EditOp::SetStaffVisible { staff, visible } => editor.set_staff_visible(staff, *visible),
            EditOp::SetStaffType { staff, staff_type } => editor.set_staff_type(staff, *staff_type),
            EditOp::SetCutawayEnabled { staff, enabled } => editor.set_cutaway_enabled(staff, *enabled),
            EditOp::SetSmallStaff { staff, small } => editor.set_small_staff(staff, *small),
            EditOp::SetStaffConfig { staff, config } => editor.set_staff_config(staff, config),
            EditOp::SetVoiceVisible { voice, visible } => editor.set_voice_visible(*voice, *visible),
            EditOp::SetStaffVoiceVisible { staff, voice, visible } => {
                editor.set_staff_voice_visible(staff, *voice, *visible)
            }
            EditOp::Select { staff, tick } => {
                let element = editor
                    .current_score()
                    .staff_content(staff)
                    .into_iter()
                    .find(|cr| cr.tick == *tick)
                    .map(|cr| cr.id)
                    .ok_or_else(|| anyhow!("No chord or rest on staff {} at tick {}", staff, tick))?;
                editor.set_selection(vec![element]);
            }
            EditOp::ClearSelection => editor.clear_selection(),
            EditOp::SetView { excerpt } => {
                let view = match excerpt {
                    None => ScoreView::Master,
                    Some(title) => editor
                        .score()
                        .excerpts()
                        .iter()
                        .find(|e| &e.title == title)
                        .map(|e| ScoreView::Excerpt(e.id))
                        .ok_or_else(|| anyhow!("No excerpt titled {:?}", title))?,
                };
                editor.set_current_view(view);
            }
            EditOp::UpdatePartTitles => editor.handle_interaction(InteractionEvent::DropChanged),
            EditOp::Undo => editor.undo(),
            EditOp::Redo => editor.redo(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoreFile;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const STRINGS: &str = r#"
score:
  measures: 2
parts:
  - id: violin
    instruments:
      - { id: violin, name: Violin }
  - id: cello
    instruments:
      - { id: cello, name: Cello }
    staves:
      - id: vc-1
excerpts:
  - title: Cello
    parts: [cello]
"#;

    fn editor() -> PartsEditor {
        PartsEditor::new(ScoreFile::from_yaml(STRINGS).unwrap().build(100).unwrap())
    }

    #[test]
    fn test_parse_ops() {
        let script = EditScript::from_yaml(
            r#"
ops:
  - op: move_parts
    parts: [cello]
    destination: violin
  - op: set_part_transposition
    part: cello
    transposition: { diatonic: -7, chromatic: -12 }
  - op: set_staff_config
    staff: vc-1
    config: { lines_count: 1, hide_mode: never }
  - op: undo
"#,
        )
        .unwrap();

        assert_eq!(script.ops.len(), 4);
        assert_eq!(
            script.ops[0],
            EditOp::MoveParts {
                parts: vec![PartId::from("cello")],
                destination: PartId::from("violin"),
                mode: InsertMode::Before,
            }
        );
        match &script.ops[2] {
            EditOp::SetStaffConfig { config, .. } => {
                assert_eq!(config.lines_count, 1);
                assert!(config.visible);
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(EditScript::from_yaml("ops:\n  - op: explode\n").is_err());
    }

    #[test]
    fn test_apply_script() {
        let mut editor = editor();
        let script = EditScript::from_yaml(
            r#"
ops:
  - op: append_doubling_instrument
    part: violin
    instrument: { id: viola, name: Viola }
  - op: select
    staff: vc-1
    tick: 1920
  - op: set_view
    excerpt: Cello
  - op: set_staff_visible
    staff: vc-1
    visible: false
  - op: set_view
  - op: move_parts
    parts: [cello]
    destination: violin
"#,
        )
        .unwrap();

        assert_eq!(script.apply(&mut editor).unwrap(), 6);
        let master = editor.score().master();
        assert_eq!(master.parts()[0].id.as_str(), "cello");
        assert_eq!(master.part(&PartId::from("violin")).unwrap().name, "Violin & Viola");
        assert!(master.staff(&StaffId::from("vc-1")).unwrap().visible);
        assert!(!editor.score().excerpts()[0].score.staff(&StaffId::from("vc-1")).unwrap().visible);
    }

    #[test]
    fn test_apply_stops_on_unresolved_selection() {
        let mut editor = editor();
        let script = EditScript::from_yaml(
            r#"
ops:
  - op: set_part_name
    part: violin
    name: Violino
  - op: select
    staff: vc-1
    tick: 5
  - op: set_part_name
    part: violin
    name: Never
"#,
        )
        .unwrap();

        let err = script.apply(&mut editor).unwrap_err();
        assert!(format!("{:#}", err).contains("operation 2"));
        assert_eq!(editor.current_score().part(&PartId::from("violin")).unwrap().name, "Violino");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ops:\n  - op: redo\n  - op: clear_selection").unwrap();
        let script = EditScript::load(file.path()).unwrap();
        assert_eq!(script.ops, vec![EditOp::Redo, EditOp::ClearSelection]);
    }
}
