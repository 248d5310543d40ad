// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Showing and hiding parts, instruments, staves and voices, plus the
//! selection-driven assignment of doubling instruments.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{logged, PartsEditor};
use crate::notify::{ChangeEvent, InstrumentKey, Watched};
use crate::score::{
    Element, ElementId, InstrumentChange, InstrumentId, PartId, ScoreView, Staff, StaffId, VOICES,
};

/// Events from the surrounding interaction layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionEvent {
    /// The selection changed
    SelectionChanged,
    /// A drag and drop finished
    DropChanged,
}

impl PartsEditor {
    /// React to an interaction event
    pub fn handle_interaction(&mut self, event: InteractionEvent) {
        debug!(?event, "interaction");
        match event {
            InteractionEvent::SelectionChanged => self.refresh_visibility_cache(),
            InteractionEvent::DropChanged => self.update_part_titles(),
        }
    }

    /// Select elements of the current view
    pub fn set_selection(&mut self, elements: Vec<ElementId>) {
        let view = self.current_view();
        self.score.select(view, elements);
        self.handle_interaction(InteractionEvent::SelectionChanged);
    }

    /// Drop the selection
    pub fn clear_selection(&mut self) {
        self.score.clear_selection();
        self.handle_interaction(InteractionEvent::SelectionChanged);
    }

    /// Whether the visibility toggle of an instrument can act right now.
    ///
    /// The returned value is shared with the editor and updated whenever
    /// the selection changes.
    pub fn can_change_instrument_visibility(
        &mut self,
        instrument_id: &InstrumentId,
        part_id: &PartId,
    ) -> Watched<bool> {
        let value = self.resolve_can_change(instrument_id, part_id);
        let key = InstrumentKey::new(part_id.clone(), instrument_id.clone());
        let watched = self
            .visibility_cache
            .entry(key)
            .or_insert_with(|| Watched::new(value))
            .clone();
        watched.set(value);
        watched
    }

    /// A doubling instrument without a change marker has no place in the
    /// score yet and must be anchored to a chord before it can be shown
    pub fn need_assign_instrument_to_chord(&self, instrument_id: &InstrumentId, part_id: &PartId) -> bool {
        let Some(part) = self.part(part_id) else {
            return false;
        };
        if part.instrument_id() == Some(instrument_id) {
            return false;
        }

        let view = self.part_view(part_id);
        !self
            .score
            .score(view)
            .instrument_changes(part_id)
            .values()
            .any(|ic| &ic.instrument.id == instrument_id)
    }

    /// Anchor a doubling instrument at the selected chord or rest of its
    /// part. Only instruments still waiting for a change marker qualify.
    pub fn assign_instrument_to_selected_chord(&mut self, instrument_id: &InstrumentId, part_id: &PartId) {
        if !self.need_assign_instrument_to_chord(instrument_id, part_id) {
            debug!(part = %part_id, instrument = %instrument_id, "instrument needs no assignment");
            return;
        }
        let view = self.current_view();
        let Some(chord_rest) = self.score.selected_chord_rest(view).chord_rest() else {
            return;
        };
        let score = self.score.score(view);
        if score.chord_rest_part(chord_rest) != Some(part_id) {
            return;
        }
        let tick = chord_rest.tick;

        let Some(part) = score.part(part_id) else {
            return;
        };
        if part.instruments.contains_key(&tick) {
            debug!(part = %part_id, tick, "instrument slot taken");
            return;
        }
        let Some(instrument) = part.find_instrument(instrument_id).map(|(_, i)| i.clone()) else {
            return;
        };

        self.begin();
        logged(self.score.remove_instrument(view, part_id, instrument_id), "unassign instrument");
        logged(
            self.score.set_instrument(view, part_id, tick, instrument.clone()),
            "assign instrument",
        );
        let change = InstrumentChange {
            id: self.score.new_element_id(),
            part: part_id.clone(),
            tick,
            instrument: instrument.clone(),
            init: true,
        };
        logged(
            self.score.add_element(view, Element::InstrumentChange(change)),
            "add instrument change",
        );
        self.commit();

        self.notifiers
            .notify_instruments(part_id, ChangeEvent::Changed(instrument));
        self.notifiers.notify_structure_changed();
    }

    /// Show or hide the staves of an instrument
    pub fn set_instrument_visible(&mut self, instrument_id: &InstrumentId, part_id: &PartId, visible: bool) {
        if self.need_assign_instrument_to_chord(instrument_id, part_id) {
            self.assign_instrument_to_selected_chord(instrument_id, part_id);
            return;
        }

        let Some(instrument) = self
            .part(part_id)
            .and_then(|p| p.find_instrument(instrument_id))
            .map(|(_, i)| i.clone())
        else {
            return;
        };
        let view = self.part_view(part_id);
        let staves: Vec<StaffId> = self
            .score
            .score(view)
            .part_staves(part_id)
            .into_iter()
            .filter(|s| s.visible != visible)
            .map(|s| s.id.clone())
            .collect();
        if staves.is_empty() {
            return;
        }

        self.begin();
        for staff_id in &staves {
            logged(
                self.score
                    .change_staff(view, staff_id, "visible", |s| s.visible = visible),
                "set instrument visible",
            );
        }
        self.commit();

        self.notifiers
            .notify_instruments(part_id, ChangeEvent::Changed(instrument));
        self.notifiers.notify_structure_changed();
    }

    pub fn set_staff_visible(&mut self, staff_id: &StaffId, visible: bool) {
        match self.staff(staff_id) {
            Some(staff) if staff.visible != visible => {}
            _ => return,
        }

        let view = self.current_view();
        self.begin();
        logged(
            self.score
                .change_staff(view, staff_id, "visible", |s| s.visible = visible),
            "set staff visible",
        );
        self.commit();

        self.notify_staff_changed(staff_id);
        self.notifiers.notify_structure_changed();
    }

    /// Whether a voice is shown on any staff of the current view
    pub fn voice_visible(&self, voice: usize) -> bool {
        self.current_score()
            .staves()
            .iter()
            .any(|s| s.is_voice_visible(voice))
    }

    /// Show or hide a voice on every staff of the current view
    pub fn set_voice_visible(&mut self, voice: usize, visible: bool) {
        if voice >= VOICES || self.voice_visible(voice) == visible {
            return;
        }

        let view = self.current_view();
        let staves: Vec<StaffId> = self.current_score().staves().iter().map(|s| s.id.clone()).collect();

        self.begin();
        for staff_id in &staves {
            self.do_set_staff_voice_visible(view, staff_id, voice, visible);
        }
        self.commit();

        self.notifiers.notify_structure_changed();
    }

    /// Show or hide a voice on one staff
    pub fn set_staff_voice_visible(&mut self, staff_id: &StaffId, voice: usize, visible: bool) {
        match self.staff(staff_id) {
            Some(staff) if voice < VOICES && staff.is_voice_visible(voice) != visible => {}
            _ => return,
        }

        let view = self.current_view();
        self.begin();
        self.do_set_staff_voice_visible(view, staff_id, voice, visible);
        self.commit();

        self.notify_staff_changed(staff_id);
        self.notifiers.notify_structure_changed();
    }

    fn do_set_staff_voice_visible(&mut self, view: ScoreView, staff_id: &StaffId, voice: usize, visible: bool) {
        let score = self.score.score(view);
        match score.staff(staff_id) {
            Some(staff) if voice < VOICES && staff.is_voice_visible(voice) != visible => {}
            _ => return,
        }

        for element in score.voice_elements(staff_id, voice) {
            logged(
                self.score.change_element(view, element, "visible", |e| {
                    if let Some(cr) = e.as_chord_rest_mut() {
                        cr.visible = visible;
                    }
                }),
                "set element visible",
            );
        }
        logged(
            self.score
                .change_staff(view, staff_id, "voices_visible", |s| s.voices_visible[voice] = visible),
            "set voice visible",
        );
    }

    /// Copy a master part into the edited excerpt
    pub(super) fn materialize_part(&mut self, part_id: &PartId) {
        let view = self.current_view();
        if view == ScoreView::Master {
            return;
        }
        let master = self.score.master();
        let Some(mut part) = master.part(part_id).cloned() else {
            return;
        };
        part.visible = true;
        let staves: Vec<Staff> = master.part_staves(part_id).into_iter().cloned().collect();
        let range = master.tick_range();
        let index = self.resolve_part_index(part_id);

        debug!(part = %part_id, index, "materialize part");
        self.begin();
        if logged(self.score.insert_part(view, part, index), "insert part").is_some() {
            for (local, staff) in staves.iter().enumerate() {
                let mut copy = staff.clone();
                copy.link = None;
                if logged(self.score.insert_staff(view, copy, local, false), "insert staff").is_none() {
                    continue;
                }
                if let Some(range) = range.clone() {
                    logged(
                        self.score.clone_staff_content(
                            (ScoreView::Master, &staff.id),
                            (view, &staff.id),
                            Some(range),
                        ),
                        "clone staff content",
                    );
                }
            }
        }
        self.commit();

        self.notify_part_changed(part_id);
        self.notifiers.notify_structure_changed();
    }

    /// Insert position in the current view that keeps master order
    pub(super) fn resolve_part_index(&self, part_id: &PartId) -> usize {
        let master = self.score.master();
        let origin = master.part_index(part_id);
        let parts = self.current_score().parts();
        parts
            .iter()
            .position(|p| master.part_index(&p.id) >= origin)
            .unwrap_or(parts.len())
    }

    fn resolve_can_change(&self, instrument_id: &InstrumentId, part_id: &PartId) -> bool {
        if !self.need_assign_instrument_to_chord(instrument_id, part_id) {
            return true;
        }
        let view = self.current_view();
        self.score
            .selected_chord_rest(view)
            .chord_rest()
            .and_then(|cr| self.score.score(view).chord_rest_part(cr))
            == Some(part_id)
    }

    fn refresh_visibility_cache(&mut self) {
        let keys: Vec<InstrumentKey> = self.visibility_cache.keys().cloned().collect();
        for key in keys {
            let value = self.resolve_can_change(&key.instrument_id, &key.part_id);
            if let Some(watched) = self.visibility_cache.get(&key) {
                watched.set(value);
            }
        }
    }
}
