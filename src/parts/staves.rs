// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Staff editing: append, link, remove, move and layout changes.

use tracing::{debug, warn};

use super::{logged, InsertMode, PartsEditor};
use crate::notify::{ChangeEvent, InstrumentKey};
use crate::score::{PartId, ScoreView, Staff, StaffConfig, StaffId, StaffType, StaffTypeSettings};

impl PartsEditor {
    /// Add a staff at the end of a part, shaped like its first staff
    pub fn append_staff(&mut self, part_id: &PartId) {
        if self.part(part_id).is_none() {
            return;
        }
        let view = self.part_view(part_id);
        let score = self.score.score(view);
        let Some(part) = score.part(part_id) else {
            return;
        };
        let Some(primary) = part.instrument().cloned() else {
            return;
        };
        let index = part.nstaves();
        let template = score.part_staves(part_id).first().map(|s| (*s).clone());

        let staff_id = self.score.new_staff_id();
        let staff = match template {
            Some(template) => template.clone_as(staff_id.clone()),
            None => {
                let mut staff = Staff::new(staff_id.clone(), part_id.clone());
                staff.init_from_instrument(&primary, None, index);
                staff
            }
        };
        let clef = staff.default_clef;

        debug!(part = %part_id, staff = %staff_id, index, "append staff");
        self.begin();
        logged(self.score.insert_staff(view, staff, index, true), "append staff");
        logged(
            self.score.change_part(view, part_id, "clefs", |p| {
                if let Some(instrument) = p.instruments.values_mut().next() {
                    instrument.set_clef(index, clef);
                }
            }),
            "set staff clef",
        );
        self.commit();

        if let Some(staff) = self.score.score(view).staff(&staff_id) {
            let key = InstrumentKey::new(part_id.clone(), primary.id);
            self.notifiers
                .notify_staves(&key, ChangeEvent::Added(staff.clone()));
        }
        self.notifiers.notify_structure_changed();
    }

    /// Add a staff linked to `origin` at the end of its part
    pub fn append_linked_staff(&mut self, origin: &StaffId) {
        let Some(source) = self.staff(origin).cloned() else {
            return;
        };
        let view = self.current_view();
        let Some(index) = self.current_score().part(&source.part).map(|p| p.nstaves()) else {
            return;
        };

        let staff_id = self.score.new_staff_id();
        let linked = source.clone_as(staff_id.clone());

        debug!(origin = %origin, staff = %staff_id, "append linked staff");
        self.begin();
        if logged(self.score.insert_staff(view, linked, index, false), "append linked staff").is_some() {
            logged(
                self.score.clone_staff_content((view, origin), (view, &staff_id), None),
                "clone staff content",
            );
            logged(self.score.link_staves(view, origin, &staff_id), "link staves");
        }
        self.commit();

        if let Some(staff) = self.staff(&staff_id) {
            if let Some(key) = self.staff_key(staff) {
                self.notifiers
                    .notify_staves(&key, ChangeEvent::Added(staff.clone()));
            }
        }
        self.notifiers.notify_structure_changed();
    }

    /// Remove staves; a staff that cannot be removed is skipped
    pub fn remove_staves(&mut self, staff_ids: &[StaffId]) {
        if staff_ids.is_empty() {
            return;
        }
        let view = self.current_view();

        self.begin();
        for staff_id in staff_ids {
            logged(self.score.remove_staff(view, staff_id), "remove staff");
        }
        self.commit();

        self.notifiers.notify_structure_changed();
    }

    /// Move staves next to a destination staff, possibly into another part.
    ///
    /// Each staff is re-created at the destination with its content and
    /// the original removed afterwards, so moved staves get new ids.
    pub fn move_staves(&mut self, staff_ids: &[StaffId], destination: &StaffId, mode: InsertMode) {
        if staff_ids.is_empty() {
            return;
        }
        let score = self.current_score();
        let Some(dest) = score.staff(destination) else {
            return;
        };
        let (Some(global), Some(part_start)) = (score.staff_idx(destination), score.part_staff_idx(&dest.part))
        else {
            return;
        };
        let index = match mode {
            InsertMode::Before => global,
            InsertMode::After => global + 1,
        } - part_start;
        let to_part = dest.part.clone();
        let view = self.current_view();

        debug!(count = staff_ids.len(), %destination, ?mode, "move staves");
        self.begin();
        self.do_move_staves(view, staff_ids, &to_part, index);
        self.commit();

        self.notifiers.notify_structure_changed();
    }

    /// Replace the staff type with a preset
    pub fn set_staff_type(&mut self, staff_id: &StaffId, preset: StaffType) {
        self.update_staff(staff_id, "staff_type", |s| {
            s.staff_type = StaffTypeSettings::preset(preset)
        });
    }

    pub fn set_cutaway_enabled(&mut self, staff_id: &StaffId, enabled: bool) {
        self.update_staff(staff_id, "cutaway", |s| s.cutaway = enabled);
    }

    pub fn set_small_staff(&mut self, staff_id: &StaffId, small: bool) {
        self.update_staff(staff_id, "small", |s| s.staff_type.small = small);
    }

    /// Apply a whole layout configuration as one undo step
    pub fn set_staff_config(&mut self, staff_id: &StaffId, config: &StaffConfig) {
        self.update_staff(staff_id, "config", |s| s.apply_config(config));
    }

    // ----------------------------------------------------------------------
    // Helpers
    // ----------------------------------------------------------------------

    fn update_staff(&mut self, staff_id: &StaffId, property: &'static str, f: impl FnOnce(&mut Staff)) {
        if self.staff(staff_id).is_none() {
            return;
        }
        let view = self.current_view();

        self.begin();
        let changed = logged(self.score.change_staff(view, staff_id, property, f), "change staff").unwrap_or(false);
        self.commit();

        if changed {
            self.notify_staff_changed(staff_id);
            self.notifiers.notify_structure_changed();
        }
    }

    fn do_move_staves(&mut self, view: ScoreView, staff_ids: &[StaffId], to_part: &PartId, mut index: usize) {
        let mut moved = Vec::with_capacity(staff_ids.len());

        for staff_id in staff_ids {
            let Some(staff) = self.score.score(view).staff(staff_id).cloned() else {
                warn!(staff = %staff_id, "staff not found");
                continue;
            };
            let new_id = self.score.new_staff_id();
            let mut copy = staff.clone_as(new_id.clone());
            copy.part = to_part.clone();

            if logged(self.score.insert_staff(view, copy, index, false), "insert moved staff").is_none() {
                continue;
            }
            logged(
                self.score.clone_staff_content((view, staff_id), (view, &new_id), None),
                "clone staff content",
            );
            logged(self.score.link_staves(view, staff_id, &new_id), "link staves");
            if !staff.is_linked() {
                logged(self.score.unlink_staff(view, &new_id), "unlink staff");
            }

            index += 1;
            moved.push(staff_id.clone());
        }

        for staff_id in &moved {
            logged(self.score.remove_staff(view, staff_id), "remove moved staff");
        }
    }

    /// Key of the staff channel a staff is announced on
    fn staff_key(&self, staff: &Staff) -> Option<InstrumentKey> {
        let part = self.current_score().part(&staff.part)?;
        let instrument_id = part.instrument_id()?;
        Some(InstrumentKey::new(part.id.clone(), instrument_id.clone()))
    }

    pub(super) fn notify_staff_changed(&self, staff_id: &StaffId) {
        let Some(staff) = self.staff(staff_id) else {
            return;
        };
        if let Some(key) = self.staff_key(staff) {
            self.notifiers
                .notify_staves(&key, ChangeEvent::Changed(staff.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::tests::{record, trio};
    use crate::score::{ClefType, InstrumentId};

    fn staff_ids(editor: &PartsEditor, part: &str) -> Vec<StaffId> {
        editor
            .current_score()
            .part_staves(&PartId::from(part))
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    #[test]
    fn test_append_staff_copies_first_staff() {
        let mut editor = trio();
        let cello = PartId::from("cello");
        let first = staff_ids(&editor, "cello")[0].clone();
        editor.set_cutaway_enabled(&first, true);

        let channel = record(
            &editor
                .staff_list(&cello, &InstrumentId::from("cello"))
                .notifier()
                .unwrap()
                .clone(),
        );
        editor.append_staff(&cello);

        let staves = editor.current_score().part_staves(&cello);
        assert_eq!(staves.len(), 2);
        assert!(staves[1].cutaway);
        assert_ne!(staves[1].id, first);
        assert_eq!(editor.current_score().staff_content(&staves[1].id).len(), 2);
        assert!(matches!(channel.borrow()[0], ChangeEvent::Added(_)));

        let part = editor.current_score().part(&cello).unwrap();
        assert_eq!(part.instrument().unwrap().clefs.len(), 2);
    }

    #[test]
    fn test_append_linked_staff() {
        let mut editor = trio();
        let origin = staff_ids(&editor, "violin")[0].clone();
        editor.append_linked_staff(&origin);

        let staves = staff_ids(&editor, "violin");
        assert_eq!(staves.len(), 2);
        let score = editor.current_score();
        assert_eq!(score.linked_staves(&origin)[0].id, staves[1]);
        assert_eq!(score.staff_content(&staves[1]).len(), 2);
    }

    #[test]
    fn test_remove_staves_skips_unknown() {
        let mut editor = trio();
        let flute = staff_ids(&editor, "flute")[0].clone();
        editor.remove_staves(&[StaffId::from("nope"), flute.clone()]);
        assert!(staff_ids(&editor, "flute").is_empty());
        assert_eq!(editor.current_score().nstaves(), 2);

        editor.undo();
        assert_eq!(staff_ids(&editor, "flute"), vec![flute]);
    }

    #[test]
    fn test_move_staff_to_other_part() {
        let mut editor = trio();
        let flute = staff_ids(&editor, "flute")[0].clone();
        let cello = staff_ids(&editor, "cello")[0].clone();
        let before: Vec<Vec<u8>> = editor
            .current_score()
            .staff_content(&flute)
            .iter()
            .map(|cr| cr.pitches.clone())
            .collect();

        editor.move_staves(&[flute.clone()], &cello, InsertMode::After);

        assert!(staff_ids(&editor, "flute").is_empty());
        let cello_staves = staff_ids(&editor, "cello");
        assert_eq!(cello_staves.len(), 2);
        assert_eq!(cello_staves[0], cello);

        let moved = &cello_staves[1];
        let after: Vec<Vec<u8>> = editor
            .current_score()
            .staff_content(moved)
            .iter()
            .map(|cr| cr.pitches.clone())
            .collect();
        assert_eq!(before, after);
        assert!(editor.current_score().staff(moved).unwrap().link.is_none());
        assert_eq!(editor.current_score().staff(moved).unwrap().part, PartId::from("cello"));
    }

    #[test]
    fn test_move_staff_within_part() {
        let mut editor = trio();
        let cello = PartId::from("cello");
        editor.append_staff(&cello);
        let staves = staff_ids(&editor, "cello");

        editor.move_staves(&[staves[0].clone()], &staves[1], InsertMode::After);
        let after = staff_ids(&editor, "cello");
        assert_eq!(after.len(), 2);
        assert_eq!(after[0], staves[1]);
    }

    #[test]
    fn test_layout_setters() {
        let mut editor = trio();
        let staff = staff_ids(&editor, "violin")[0].clone();
        let structure = record(&editor.parts_changed());

        editor.set_staff_type(&staff, StaffType::Tablature);
        editor.set_small_staff(&staff, true);
        editor.set_small_staff(&staff, true);
        let config = StaffConfig {
            clef_type: ClefType::C3,
            ..editor.current_score().staff(&staff).unwrap().config()
        };
        editor.set_staff_config(&staff, &config);

        let s = editor.current_score().staff(&staff).unwrap();
        assert_eq!(s.staff_type.lines, 6);
        assert!(s.staff_type.small);
        assert_eq!(s.default_clef, ClefType::C3);
        assert_eq!(structure.borrow().len(), 3);
        assert_eq!(editor.score().undo_stack().undo_count(), 3);
    }

    #[test]
    fn test_staff_visible_notifies_staff_channel() {
        let mut editor = trio();
        let violin = PartId::from("violin");
        let staff = staff_ids(&editor, "violin")[0].clone();
        let channel = record(
            &editor
                .staff_list(&violin, &InstrumentId::from("violin"))
                .notifier()
                .unwrap()
                .clone(),
        );

        editor.set_staff_visible(&staff, false);
        editor.set_staff_visible(&staff, false);
        assert_eq!(channel.borrow().len(), 1);
        assert!(!editor.current_score().staff(&staff).unwrap().visible);
    }
}
