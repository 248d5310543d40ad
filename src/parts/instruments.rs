// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Instrument assignment: replacing the whole instrument set, doubling,
//! replacing, removing and moving instrument entries between parts.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, error, warn};

use super::{logged, InsertMode, PartsEditor};
use crate::notify::ChangeEvent;
use crate::score::{
    Element, Instrument, InstrumentChange, InstrumentId, Part, PartId, ScoreView, Staff, Tick, PRIMARY_TICK,
};

impl PartsEditor {
    /// Make the score hold exactly the given instruments, one part per
    /// instrument that is not yet present, ordered like `instruments`
    pub fn set_instruments(&mut self, instruments: &[Instrument]) {
        if instruments.is_empty() {
            return;
        }
        let ids: Vec<InstrumentId> = instruments.iter().map(|i| i.id.clone()).collect();

        self.begin();
        self.remove_missing_instruments(&ids);

        let existing = self.all_instrument_ids();
        for instrument in instruments {
            if !existing.contains(&instrument.id) {
                self.append_new_part(instrument);
            }
        }

        if self.current_score().measures().is_empty() {
            logged(self.score.append_measure(self.config.measure_ticks), "append measure");
        }

        self.sort_parts(&ids);
        self.remove_empty_excerpts();
        let changed = self.commit();

        debug!(instruments = ids.len(), changed, "set instruments");
        if changed {
            self.notifiers.notify_parts(ChangeEvent::Reset);
            self.notifiers.notify_structure_changed();
        }
    }

    /// Change the long name of an instrument entry
    pub fn set_instrument_name(&mut self, instrument_id: &InstrumentId, part_id: &PartId, name: &str) {
        self.change_instrument(instrument_id, part_id, "long_name", |i| i.long_name = name.to_string());
    }

    /// Change the abbreviation of an instrument entry
    pub fn set_instrument_abbreviature(&mut self, instrument_id: &InstrumentId, part_id: &PartId, abbreviature: &str) {
        self.change_instrument(instrument_id, part_id, "short_name", |i| {
            i.short_name = abbreviature.to_string()
        });
    }

    /// Add an instrument after every existing entry of a part
    pub fn append_doubling_instrument(&mut self, instrument: Instrument, part_id: &PartId) {
        let Some(last) = self.part(part_id).and_then(Part::last_instrument_tick) else {
            return;
        };
        let view = self.part_view(part_id);
        let tick = last + 1;

        debug!(part = %part_id, instrument = %instrument.id, tick, "append doubling instrument");
        self.begin();
        logged(
            self.score.set_instrument(view, part_id, tick, instrument.clone()),
            "append doubling instrument",
        );
        self.refresh_part_name(view, part_id);
        self.commit();

        self.notifiers
            .notify_instruments(part_id, ChangeEvent::Added(instrument));
        self.notify_part_changed(part_id);
        self.notifiers.notify_structure_changed();
    }

    /// Swap an instrument entry for another at the same tick
    pub fn replace_instrument(&mut self, instrument_id: &InstrumentId, part_id: &PartId, instrument: Instrument) {
        let Some((tick, old)) = self
            .part(part_id)
            .and_then(|p| p.find_instrument(instrument_id))
            .map(|(tick, i)| (tick, i.clone()))
        else {
            return;
        };
        let view = self.part_view(part_id);

        self.begin();
        logged(
            self.score.set_instrument(view, part_id, tick, instrument.clone()),
            "replace instrument",
        );
        let marker = self
            .score
            .score(view)
            .instrument_changes(part_id)
            .get(&tick)
            .map(|ic| ic.id);
        if let Some(marker) = marker {
            let replacement = instrument.clone();
            logged(
                self.score.change_element(view, marker, "instrument", |e| {
                    if let Element::InstrumentChange(ic) = e {
                        ic.instrument = replacement;
                    }
                }),
                "update instrument change",
            );
        }
        self.refresh_part_name(view, part_id);
        self.commit();

        self.notifiers.notify_instruments(
            part_id,
            ChangeEvent::Replaced {
                old,
                new: instrument,
            },
        );
        self.notify_part_changed(part_id);
        self.notifiers.notify_structure_changed();
    }

    /// Remove instrument entries with their change markers. A part left
    /// without instruments is not removed here.
    pub fn remove_instruments(&mut self, instrument_ids: &[InstrumentId], part_id: &PartId) {
        if instrument_ids.is_empty() || self.part(part_id).is_none() {
            return;
        }
        let view = self.part_view(part_id);

        self.begin();
        self.do_remove_instruments(view, part_id, instrument_ids);
        self.refresh_part_name(view, part_id);
        self.commit();

        self.notify_part_changed(part_id);
        self.notifiers.notify_structure_changed();
    }

    /// Move instrument entries into another part (or within one) next to a
    /// destination instrument
    pub fn move_instruments(
        &mut self,
        instrument_ids: &[InstrumentId],
        from: &PartId,
        to: &PartId,
        destination: &InstrumentId,
        mode: InsertMode,
    ) {
        if instrument_ids.is_empty() || self.part(to).is_none() {
            return;
        }
        let Some(moving) = self.part(from).map(|p| p.instruments_filtered(instrument_ids)) else {
            return;
        };
        if moving.is_empty() {
            return;
        }
        let from_view = self.part_view(from);
        let to_view = self.part_view(to);
        let moving_ids: Vec<InstrumentId> = moving.values().map(|i| i.id.clone()).collect();

        debug!(%from, %to, %destination, ?mode, count = moving.len(), "move instruments");
        self.begin();
        self.do_remove_instruments(from_view, from, &moving_ids);
        self.do_insert_instruments(to_view, to, &moving, destination, mode);
        self.refresh_part_name(from_view, from);
        if from != to {
            self.refresh_part_name(to_view, to);
        }
        self.commit();

        self.notify_part_changed(from);
        self.notify_instruments_changed(from);
        if from != to {
            self.notify_instruments_changed(to);
            self.notify_part_changed(to);
        }
        self.notifiers.notify_structure_changed();
    }

    // ----------------------------------------------------------------------
    // Helpers
    // ----------------------------------------------------------------------

    /// Instrument ids of every listed part, with repeats
    fn all_instrument_ids(&self) -> Vec<InstrumentId> {
        self.part_list()
            .iter()
            .flat_map(|p| p.instruments.values().map(|i| i.id.clone()))
            .collect()
    }

    /// Drop parts whose every instrument is missing from `ids` and the
    /// missing entries of the other parts
    fn remove_missing_instruments(&mut self, ids: &[InstrumentId]) {
        let mut parts_to_remove = Vec::new();

        for part in self.part_list().iter() {
            let missing: Vec<InstrumentId> = part
                .instruments
                .values()
                .filter(|i| !ids.contains(&i.id))
                .map(|i| i.id.clone())
                .collect();

            if missing.len() == part.instruments.len() {
                parts_to_remove.push(part.id.clone());
            } else if !missing.is_empty() {
                let view = self.part_view(&part.id);
                self.do_remove_instruments(view, &part.id, &missing);
                self.refresh_part_name(view, &part.id);
            }
        }

        self.do_remove_parts(&parts_to_remove);
    }

    /// Append a part for `instrument` with its staves at the end of the score
    fn append_new_part(&mut self, instrument: &Instrument) {
        let view = self.current_view();
        let part_id = self.score.new_part_id();
        let index = self.current_score().parts().len();

        debug!(part = %part_id, instrument = %instrument.id, "append part");
        let part = Part::new(part_id.clone(), instrument.clone());
        if logged(self.score.insert_part(view, part, index), "insert part").is_none() {
            return;
        }

        for local in 0..instrument.staff_count.max(1) {
            let mut staff = Staff::new(self.score.new_staff_id(), part_id.clone());
            staff.init_from_instrument(instrument, None, local);
            logged(self.score.insert_staff(view, staff, local, true), "insert staff");
        }
    }

    /// Reorder parts so that their primary instruments follow `ids`.
    ///
    /// Only the slot that is wrong gets fixed, by pulling forward the first
    /// later part that belongs there.
    fn sort_parts(&mut self, ids: &[InstrumentId]) {
        let view = self.current_view();
        let parts = self.current_score().parts();

        let mut seen = HashSet::new();
        let mut ordering: Vec<InstrumentId> = Vec::with_capacity(parts.len());
        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            let count = parts.iter().filter(|p| p.instrument_id() == Some(id)).count();
            ordering.extend(std::iter::repeat(id.clone()).take(count));
        }
        assert_eq!(
            ordering.len(),
            parts.len(),
            "instrument ordering must cover every part"
        );

        for (slot, id) in ordering.iter().enumerate() {
            let parts = self.current_score().parts();
            if parts[slot].instrument_id() == Some(id) {
                continue;
            }
            let Some(found) = parts[slot..]
                .iter()
                .find(|p| p.instrument_id() == Some(id))
                .map(|p| p.id.clone())
            else {
                continue;
            };
            logged(self.score.move_part(view, &found, slot), "sort parts");
        }
    }

    fn remove_empty_excerpts(&mut self) {
        let empty: Vec<_> = self
            .score
            .excerpts()
            .iter()
            .filter(|e| e.score.nstaves() == 0)
            .map(|e| e.id)
            .collect();
        for excerpt in empty {
            debug!(%excerpt, "remove empty excerpt");
            logged(self.score.remove_excerpt(excerpt), "remove excerpt");
        }
    }

    /// Undoable edit of one instrument entry, found by id
    fn change_instrument(
        &mut self,
        instrument_id: &InstrumentId,
        part_id: &PartId,
        property: &'static str,
        f: impl FnOnce(&mut Instrument),
    ) {
        let Some(tick) = self
            .part(part_id)
            .and_then(|p| p.find_instrument(instrument_id))
            .map(|(tick, _)| tick)
        else {
            return;
        };
        let view = self.part_view(part_id);

        self.begin();
        let changed = logged(
            self.score.change_part(view, part_id, property, |p| {
                if let Some(instrument) = p.instruments.get_mut(&tick) {
                    f(instrument);
                }
            }),
            "change instrument",
        )
        .unwrap_or(false);
        self.commit();

        if !changed {
            return;
        }
        let updated = self
            .score
            .score(view)
            .part(part_id)
            .and_then(|p| p.instruments.get(&tick))
            .cloned();
        if let Some(instrument) = updated {
            self.notifiers
                .notify_instruments(part_id, ChangeEvent::Changed(instrument));
        }
        self.notifiers.notify_structure_changed();
    }

    /// Remove the first entry of each id and the change marker at its tick
    pub(super) fn do_remove_instruments(&mut self, view: ScoreView, part_id: &PartId, ids: &[InstrumentId]) {
        for instrument_id in ids {
            let score = self.score.score(view);
            let Some(tick) = score
                .part(part_id)
                .and_then(|p| p.find_instrument(instrument_id))
                .map(|(tick, _)| tick)
            else {
                warn!(part = %part_id, instrument = %instrument_id, "instrument not found");
                continue;
            };

            let marker = score.instrument_changes(part_id).get(&tick).map(|ic| ic.id);
            if let Some(marker) = marker {
                logged(self.score.remove_element(view, marker), "remove instrument change");
            }
            logged(self.score.remove_instrument(view, part_id, instrument_id), "remove instrument");
        }
    }

    /// Merge `moving` into the mapping of `part_id` next to `destination`.
    ///
    /// The merged list keeps its order and is laid over the sorted union of
    /// ticks; an incoming tick that is already taken is replaced by one past
    /// the last tick. Every entry after the first is anchored by a change
    /// marker.
    fn do_insert_instruments(
        &mut self,
        view: ScoreView,
        part_id: &PartId,
        moving: &BTreeMap<Tick, Instrument>,
        destination: &InstrumentId,
        mode: InsertMode,
    ) {
        let Some(part) = self.score.score(view).part(part_id) else {
            return;
        };
        let mut instruments: Vec<Instrument> = part.instruments.values().cloned().collect();
        let mut ticks: Vec<Tick> = part.instruments.keys().copied().collect();

        let destination_index = instruments
            .iter()
            .position(|i| &i.id == destination)
            .unwrap_or(0);
        let insert_at = match mode {
            InsertMode::Before => destination_index,
            InsertMode::After => destination_index + 1,
        }
        .min(instruments.len());
        for (offset, instrument) in moving.values().enumerate() {
            instruments.insert(insert_at + offset, instrument.clone());
        }

        for tick in moving.keys() {
            if ticks.contains(tick) {
                let bumped = ticks.iter().max().map_or(PRIMARY_TICK, |max| max + 1);
                ticks.push(bumped);
            } else {
                ticks.push(*tick);
            }
        }
        ticks.sort_unstable();

        let mapping: BTreeMap<Tick, Instrument> = instruments
            .into_iter()
            .zip(ticks)
            .enumerate()
            .map(|(i, (instrument, tick))| (if i == 0 { PRIMARY_TICK } else { tick }, instrument))
            .collect();

        logged(
            self.score
                .change_part(view, part_id, "instruments", |p| p.instruments = mapping.clone()),
            "merge instruments",
        );

        for (&tick, instrument) in mapping.iter().skip(1) {
            self.anchor_instrument(view, part_id, tick, instrument);
        }
    }

    /// Point the change marker at `tick` to `instrument`, creating one on the
    /// chord/rest at that tick if needed
    fn anchor_instrument(&mut self, view: ScoreView, part_id: &PartId, tick: Tick, instrument: &Instrument) {
        let score = self.score.score(view);
        let existing = score
            .instrument_changes(part_id)
            .get(&tick)
            .map(|ic| (ic.id, ic.init));
        let has_anchor = score.chord_rest_at(part_id, tick).is_some();

        let init = match existing {
            Some((marker, init)) => {
                logged(self.score.remove_element(view, marker), "remove instrument change");
                init
            }
            None if has_anchor => true,
            None => {
                error!(part = %part_id, tick, instrument = %instrument.id, "no chord/rest at tick; instrument left unanchored");
                return;
            }
        };

        let change = InstrumentChange {
            id: self.score.new_element_id(),
            part: part_id.clone(),
            tick,
            instrument: instrument.clone(),
            init,
        };
        logged(
            self.score.add_element(view, Element::InstrumentChange(change)),
            "add instrument change",
        );
    }
}
