// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Structural editing of parts, instruments and staves.
//!
//! Every public operation takes identifiers, brackets its primitive changes
//! in one [`EditSession`] so it undoes as a single step, and fires its
//! notifications after the commit. Missing identifiers make an operation a
//! silent no-op; inside a batch, a failing element is logged and skipped.

pub mod instruments;
pub mod naming;
pub mod session;
pub mod staves;
pub mod visibility;

pub use session::EditSession;
pub use visibility::InteractionEvent;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::error::ScoreResult;
use crate::notify::{ChangeEvent, InstrumentKey, Notification, NotifierRegistry, NotifyList, Watched};
use crate::score::{
    Instrument, InstrumentId, Interval, MasterScore, Part, PartId, Score, ScoreView, SharpFlat, Staff, StaffId,
};

/// Log a failed primitive and carry on
fn logged<T>(result: ScoreResult<T>, action: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(%err, action, "score primitive failed");
            None
        }
    }
}

/// Where an item goes relative to the destination item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertMode {
    #[default]
    Before,
    After,
}

/// Editor over a master score and its excerpts
#[derive(Debug)]
pub struct PartsEditor {
    score: MasterScore,
    view: ScoreView,
    session: EditSession,
    notifiers: NotifierRegistry,
    visibility_cache: BTreeMap<InstrumentKey, Watched<bool>>,
    config: EditorConfig,
}

impl PartsEditor {
    /// Edit `score` with default settings
    pub fn new(score: MasterScore) -> Self {
        Self::with_config(score, EditorConfig::default())
    }

    /// Edit `score` with the given settings
    pub fn with_config(score: MasterScore, config: EditorConfig) -> Self {
        Self {
            score,
            view: ScoreView::Master,
            session: EditSession::new(),
            notifiers: NotifierRegistry::new(),
            visibility_cache: BTreeMap::new(),
            config,
        }
    }

    /// The edited score family
    pub fn score(&self) -> &MasterScore {
        &self.score
    }

    /// Give the score back
    pub fn into_score(self) -> MasterScore {
        self.score
    }

    /// Settings in use
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// View being edited; an excerpt that no longer exists reads as the master
    pub fn current_view(&self) -> ScoreView {
        self.score.resolve(self.view)
    }

    /// Switch the edited view
    pub fn set_current_view(&mut self, view: ScoreView) {
        self.view = view;
    }

    /// Score of the current view
    pub fn current_score(&self) -> &Score {
        self.score.score(self.current_view())
    }

    // ----------------------------------------------------------------------
    // Read views
    // ----------------------------------------------------------------------

    /// Parts of the current view followed by excerpt parts when editing the
    /// master, each identifier listed once in first-seen order
    pub fn part_list(&self) -> NotifyList<Part> {
        let mut seen = HashSet::new();
        let parts = self
            .available_parts()
            .into_iter()
            .filter(|p| seen.insert(p.id.clone()))
            .cloned()
            .collect();
        NotifyList::new(parts).with_notifier(self.notifiers.parts())
    }

    /// Instrument entries of a part in tick order
    pub fn instrument_list(&mut self, part_id: &PartId) -> NotifyList<Instrument> {
        let Some(part) = self.part(part_id) else {
            return NotifyList::default();
        };
        let instruments = part.instruments.values().cloned().collect();
        NotifyList::new(instruments).with_notifier(self.notifiers.part_notifier(part_id))
    }

    /// Staves of an instrument of a part
    pub fn staff_list(&mut self, part_id: &PartId, instrument_id: &InstrumentId) -> NotifyList<Staff> {
        if self.part(part_id).is_none() {
            return NotifyList::default();
        }
        let staves = self.part_staves(part_id);
        let key = InstrumentKey::new(part_id.clone(), instrument_id.clone());
        NotifyList::new(staves).with_notifier(self.notifiers.instrument_notifier(&key))
    }

    /// Signal fired once per completed structural operation
    pub fn parts_changed(&self) -> Notification {
        self.notifiers.structure()
    }

    // ----------------------------------------------------------------------
    // Part operations
    // ----------------------------------------------------------------------

    /// Show or hide a part. Showing a part that exists only in the master
    /// while an excerpt is edited copies it into the excerpt.
    pub fn set_part_visible(&mut self, part_id: &PartId, visible: bool) {
        match self.part(part_id).map(|p| p.visible) {
            None => {
                if visible {
                    self.materialize_part(part_id);
                }
                return;
            }
            Some(current) if current == visible => return,
            Some(_) => {}
        }

        let view = self.part_view(part_id);
        self.begin();
        logged(
            self.score
                .change_part(view, part_id, "visible", |p| p.visible = visible),
            "set part visible",
        );
        self.commit();

        self.notify_part_changed(part_id);
        self.notifiers.notify_structure_changed();
    }

    pub fn set_part_name(&mut self, part_id: &PartId, name: &str) {
        match self.part(part_id) {
            Some(part) if part.name != name => {}
            _ => return,
        }

        self.begin();
        self.rename_part(part_id, name.to_string());
        self.commit();

        self.notify_part_changed(part_id);
        self.notifiers.notify_structure_changed();
    }

    pub fn set_part_sharp_flat(&mut self, part_id: &PartId, sharp_flat: SharpFlat) {
        if self.part(part_id).is_none() {
            return;
        }

        let view = self.part_view(part_id);
        self.begin();
        let changed = logged(
            self.score
                .change_part(view, part_id, "sharp_flat", |p| p.sharp_flat = sharp_flat),
            "set sharp/flat",
        )
        .unwrap_or(false);
        self.commit();

        if !changed {
            return;
        }
        self.notify_part_changed(part_id);
        self.notifiers.notify_structure_changed();
    }

    pub fn set_part_transposition(&mut self, part_id: &PartId, transposition: Interval) {
        if self.part(part_id).is_none() {
            return;
        }

        let view = self.part_view(part_id);
        self.begin();
        let changed = logged(
            self.score
                .change_part(view, part_id, "transposition", |p| p.transposition = transposition),
            "set transposition",
        )
        .unwrap_or(false);
        self.commit();

        if !changed {
            return;
        }
        self.notify_part_changed(part_id);
        self.notifiers.notify_structure_changed();
    }

    /// Remove parts. Removing from the master also removes them from every
    /// excerpt.
    pub fn remove_parts(&mut self, part_ids: &[PartId]) {
        if part_ids.is_empty() {
            return;
        }

        self.begin();
        self.do_remove_parts(part_ids);
        self.commit();

        self.notifiers.notify_parts(ChangeEvent::Reset);
        self.notifiers.notify_structure_changed();
    }

    /// Move parts next to a destination part, one after another
    pub fn move_parts(&mut self, part_ids: &[PartId], destination: &PartId, mode: InsertMode) {
        if part_ids.is_empty() {
            return;
        }

        self.begin();
        for part_id in part_ids {
            self.do_move_part(part_id, destination, mode);
        }
        self.commit();

        self.notifiers.notify_parts(ChangeEvent::Reset);
        self.notifiers.notify_structure_changed();
    }

    /// Step back in the undo history
    pub fn undo(&mut self) {
        if self.session.is_open() {
            return;
        }
        match self.score.undo() {
            Ok(()) => self.notify_reset(),
            Err(err) => debug!(%err, "undo skipped"),
        }
    }

    /// Step forward in the undo history
    pub fn redo(&mut self) {
        if self.session.is_open() {
            return;
        }
        match self.score.redo() {
            Ok(()) => self.notify_reset(),
            Err(err) => debug!(%err, "redo skipped"),
        }
    }

    // ----------------------------------------------------------------------
    // Helpers shared by the operation modules
    // ----------------------------------------------------------------------

    fn begin(&mut self) {
        self.session.begin(&mut self.score);
    }

    fn commit(&mut self) -> bool {
        self.session.commit(&mut self.score)
    }

    /// Current parts, plus excerpt parts when the master is edited
    fn available_parts(&self) -> Vec<&Part> {
        let view = self.current_view();
        let mut parts: Vec<&Part> = self.score.score(view).parts().iter().collect();
        if view == ScoreView::Master {
            for excerpt in self.score.excerpts() {
                parts.extend(excerpt.score.parts());
            }
        }
        parts
    }

    /// Part by id among the available parts
    fn part(&self, part_id: &PartId) -> Option<&Part> {
        self.available_parts().into_iter().find(|p| &p.id == part_id)
    }

    /// View holding the part found by [`Self::part`]
    fn part_view(&self, part_id: &PartId) -> ScoreView {
        let view = self.current_view();
        if self.score.score(view).part(part_id).is_some() || view != ScoreView::Master {
            return view;
        }
        self.score
            .excerpts()
            .iter()
            .find(|e| e.score.part(part_id).is_some())
            .map_or(view, |e| ScoreView::Excerpt(e.id))
    }

    fn part_staves(&self, part_id: &PartId) -> Vec<Staff> {
        let view = self.part_view(part_id);
        self.score
            .score(view)
            .part_staves(part_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Staff of the current view
    fn staff(&self, staff_id: &StaffId) -> Option<&Staff> {
        self.current_score().staff(staff_id)
    }

    fn do_remove_parts(&mut self, part_ids: &[PartId]) {
        let view = self.current_view();
        for part_id in part_ids {
            logged(self.score.remove_part(view, part_id), "remove part");

            if view != ScoreView::Master {
                continue;
            }
            for other in self.score.views().into_iter().skip(1) {
                if self.score.score(other).part(part_id).is_some() {
                    logged(self.score.remove_part(other, part_id), "remove excerpt part");
                }
            }
        }
    }

    fn do_move_part(&mut self, part_id: &PartId, destination: &PartId, mode: InsertMode) {
        if part_id == destination {
            return;
        }
        let view = self.current_view();
        let score = self.score.score(view);
        if score.part(part_id).is_none() {
            return;
        }

        let mut order: Vec<&PartId> = score.parts().iter().map(|p| &p.id).collect();
        order.retain(|id| *id != part_id);
        let Some(to) = order.iter().position(|id| *id == destination) else {
            return;
        };
        let index = match mode {
            InsertMode::Before => to,
            InsertMode::After => to + 1,
        };

        debug!(part = %part_id, %destination, ?mode, "move part");
        logged(self.score.move_part(view, part_id, index), "move part");
    }

    fn notify_part_changed(&self, part_id: &PartId) {
        if let Some(part) = self.part(part_id) {
            self.notifiers.notify_parts(ChangeEvent::Changed(part.clone()));
        }
    }

    /// Send a change for every instrument of a part on its channel
    fn notify_instruments_changed(&self, part_id: &PartId) {
        let Some(part) = self.part(part_id) else {
            return;
        };
        for instrument in part.instruments.values() {
            self.notifiers
                .notify_instruments(part_id, ChangeEvent::Changed(instrument.clone()));
        }
    }

    fn notify_reset(&self) {
        self.notifiers.notify_parts(ChangeEvent::Reset);
        self.notifiers.notify_structure_changed();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ScoreFile;
    use std::cell::RefCell;
    use std::rc::Rc;

    pub(crate) const TRIO: &str = r#"
score:
  measures: 2
parts:
  - id: flute
    instruments:
      - { id: flute, name: Flute }
  - id: violin
    instruments:
      - { id: violin, name: Violin }
  - id: cello
    instruments:
      - { id: cello, name: Cello }
excerpts:
  - title: "Strings"
    parts: [violin, cello]
"#;

    pub(crate) fn trio() -> PartsEditor {
        PartsEditor::new(ScoreFile::from_yaml(TRIO).unwrap().build(100).unwrap())
    }

    pub(crate) fn part_ids(editor: &PartsEditor) -> Vec<String> {
        editor.part_list().iter().map(|p| p.id.to_string()).collect()
    }

    pub(crate) fn record<E: Clone + 'static>(channel: &crate::notify::Channel<E>) -> Rc<RefCell<Vec<E>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        channel.subscribe(move |e: &E| sink.borrow_mut().push(e.clone()));
        seen
    }

    #[test]
    fn test_part_list_is_deduplicated() {
        let editor = trio();
        assert_eq!(editor.available_parts().len(), 5);
        assert_eq!(part_ids(&editor), vec!["flute", "violin", "cello"]);
    }

    #[test]
    fn test_part_list_of_excerpt_view() {
        let mut editor = trio();
        let excerpt = editor.score().excerpts()[0].id;
        editor.set_current_view(ScoreView::Excerpt(excerpt));
        assert_eq!(part_ids(&editor), vec!["violin", "cello"]);
    }

    #[test]
    fn test_set_part_name_notifies() {
        let mut editor = trio();
        let parts = record(&editor.part_list().notifier().unwrap().clone());
        let structure = record(&editor.parts_changed());

        let flute = PartId::from("flute");
        editor.set_part_name(&flute, "Flauto");
        editor.set_part_name(&flute, "Flauto");
        editor.set_part_name(&PartId::from("missing"), "x");

        assert_eq!(editor.current_score().part(&flute).unwrap().name, "Flauto");
        assert_eq!(parts.borrow().len(), 1);
        assert_eq!(structure.borrow().len(), 1);
        assert_eq!(editor.score().undo_stack().undo_count(), 1);
    }

    #[test]
    fn test_part_properties() {
        let mut editor = trio();
        let violin = PartId::from("violin");

        editor.set_part_visible(&violin, false);
        editor.set_part_sharp_flat(&violin, SharpFlat::Flats);
        editor.set_part_transposition(&violin, Interval::new(-1, -2));

        let part = editor.current_score().part(&violin).unwrap();
        assert!(!part.visible);
        assert_eq!(part.sharp_flat, SharpFlat::Flats);
        assert_eq!(part.transposition, Interval::new(-1, -2));
        assert_eq!(editor.score().undo_stack().undo_count(), 3);
    }

    #[test]
    fn test_unchanged_part_properties_are_quiet() {
        let mut editor = trio();
        let violin = PartId::from("violin");
        editor.set_part_sharp_flat(&violin, SharpFlat::Sharps);
        editor.set_part_transposition(&violin, Interval::new(1, 2));
        let steps = editor.score().undo_stack().undo_count();
        let parts = record(&editor.part_list().notifier().unwrap().clone());
        let structure = record(&editor.parts_changed());

        editor.set_part_sharp_flat(&violin, SharpFlat::Sharps);
        editor.set_part_transposition(&violin, Interval::new(1, 2));

        assert!(parts.borrow().is_empty());
        assert!(structure.borrow().is_empty());
        assert_eq!(editor.score().undo_stack().undo_count(), steps);
    }

    #[test]
    fn test_channels_survive_part_recreation() {
        let mut editor = trio();
        let violin = PartId::from("violin");
        let violin_id = InstrumentId::from("violin");
        let instruments = record(&editor.instrument_list(&violin).notifier().unwrap().clone());
        let staves = record(&editor.staff_list(&violin, &violin_id).notifier().unwrap().clone());
        let staff = editor.current_score().part_staves(&violin)[0].id.clone();

        editor.remove_parts(&[violin.clone()]);
        assert!(editor.current_score().part(&violin).is_none());
        editor.undo();

        editor.set_instrument_name(&violin_id, &violin, "Violino I");
        editor.set_staff_visible(&staff, false);

        assert_eq!(instruments.borrow().len(), 1);
        assert!(matches!(&instruments.borrow()[0], ChangeEvent::Changed(i) if i.long_name == "Violino I"));
        assert_eq!(staves.borrow().len(), 1);
        assert!(matches!(&staves.borrow()[0], ChangeEvent::Changed(s) if s.id == staff && !s.visible));
    }

    #[test]
    fn test_remove_parts_cascades_to_excerpts() {
        let mut editor = trio();
        editor.remove_parts(&[PartId::from("violin")]);

        assert_eq!(part_ids(&editor), vec!["flute", "cello"]);
        assert_eq!(editor.score().excerpts()[0].score.parts().len(), 1);

        editor.undo();
        assert_eq!(part_ids(&editor), vec!["flute", "violin", "cello"]);
        editor.redo();
        assert_eq!(part_ids(&editor), vec!["flute", "cello"]);
    }

    #[test]
    fn test_move_parts() {
        let mut editor = trio();
        editor.move_parts(&[PartId::from("flute")], &PartId::from("cello"), InsertMode::After);
        let master: Vec<&str> = editor.current_score().parts().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(master, vec!["violin", "cello", "flute"]);

        editor.move_parts(&[PartId::from("cello")], &PartId::from("violin"), InsertMode::Before);
        let master: Vec<&str> = editor.current_score().parts().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(master, vec!["cello", "violin", "flute"]);

        // Staff order follows part order
        let staves = editor.current_score().staves();
        assert_eq!(staves[0].part.as_str(), "cello");
    }

    #[test]
    fn test_undo_without_history_is_quiet() {
        let mut editor = trio();
        let structure = record(&editor.parts_changed());
        editor.undo();
        editor.redo();
        assert!(structure.borrow().is_empty());
    }
}
