// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! A single score tree: ordered parts, their staves, measures and segments.
//!
//! Staves live in an arena keyed by [`StaffId`]; the global staff order is the
//! part order followed by each part's local order. Every `pub(crate)` mutator
//! here is raw: undo recording and transaction checks happen in
//! [`super::MasterScore`].

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::element::{ChordRest, Element, InstrumentChange, Measure, Segment};
use super::part::Part;
use super::staff::Staff;
use super::types::{ElementId, IdGenerator, PartId, StaffId, Tick};

/// One score of a master/excerpt family
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Score {
    parts: Vec<Part>,
    staves: BTreeMap<StaffId, Staff>,
    measures: Vec<Measure>,
    segments: BTreeMap<Tick, Segment>,
}

impl Score {
    /// Create an empty score
    pub fn new() -> Self {
        Self::default()
    }

    // ----------------------------------------------------------------------
    // Parts
    // ----------------------------------------------------------------------

    /// Parts in score order
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Part by id
    pub fn part(&self, id: &PartId) -> Option<&Part> {
        self.parts.iter().find(|p| &p.id == id)
    }

    /// Position of a part in score order
    pub fn part_index(&self, id: &PartId) -> Option<usize> {
        self.parts.iter().position(|p| &p.id == id)
    }

    /// Global index of a part's first staff slot
    pub fn part_staff_idx(&self, id: &PartId) -> Option<usize> {
        let index = self.part_index(id)?;
        Some(self.parts[..index].iter().map(Part::nstaves).sum())
    }

    pub(crate) fn part_mut(&mut self, id: &PartId) -> Option<&mut Part> {
        self.parts.iter_mut().find(|p| &p.id == id)
    }

    pub(crate) fn insert_part(&mut self, part: Part, index: usize) {
        let index = index.min(self.parts.len());
        self.parts.insert(index, part);
    }

    /// Remove a part with its staves, their content and its instrument changes
    pub(crate) fn remove_part(&mut self, id: &PartId) -> Option<Part> {
        let index = self.part_index(id)?;
        let part = self.parts.remove(index);

        for staff_id in &part.staves {
            self.drop_staff_data(staff_id);
        }
        for segment in self.segments.values_mut() {
            segment
                .annotations
                .retain(|e| e.as_instrument_change().map_or(true, |ic| &ic.part != id));
        }
        self.prune_segments();

        Some(part)
    }

    pub(crate) fn move_part(&mut self, id: &PartId, index: usize) -> Option<usize> {
        let from = self.part_index(id)?;
        let part = self.parts.remove(from);
        let index = index.min(self.parts.len());
        self.parts.insert(index, part);
        Some(from)
    }

    // ----------------------------------------------------------------------
    // Staves
    // ----------------------------------------------------------------------

    /// Staff by id
    pub fn staff(&self, id: &StaffId) -> Option<&Staff> {
        self.staves.get(id)
    }

    /// All staves in global order
    pub fn staves(&self) -> Vec<&Staff> {
        self.parts
            .iter()
            .flat_map(|p| p.staves.iter())
            .filter_map(|id| self.staves.get(id))
            .collect()
    }

    /// Staves of one part in local order
    pub fn part_staves(&self, id: &PartId) -> Vec<&Staff> {
        self.part(id)
            .map(|p| p.staves.iter().filter_map(|s| self.staves.get(s)).collect())
            .unwrap_or_default()
    }

    /// Total number of staves
    pub fn nstaves(&self) -> usize {
        self.parts.iter().map(Part::nstaves).sum()
    }

    /// Global index of a staff
    pub fn staff_idx(&self, id: &StaffId) -> Option<usize> {
        self.parts
            .iter()
            .flat_map(|p| p.staves.iter())
            .position(|s| s == id)
    }

    /// Staves sharing a link group with `id`, excluding itself
    pub fn linked_staves(&self, id: &StaffId) -> Vec<&Staff> {
        let Some(link) = self.staff(id).and_then(|s| s.link) else {
            return Vec::new();
        };
        self.staves
            .values()
            .filter(|s| s.link == Some(link) && &s.id != id)
            .collect()
    }

    pub(crate) fn staff_mut(&mut self, id: &StaffId) -> Option<&mut Staff> {
        self.staves.get_mut(id)
    }

    /// Insert a staff at a part-local index. Returns the index used.
    pub(crate) fn insert_staff(&mut self, staff: Staff, local_index: usize) -> Option<usize> {
        let part = self.parts.iter_mut().find(|p| p.id == staff.part)?;
        let index = local_index.min(part.staves.len());
        part.staves.insert(index, staff.id.clone());
        self.staves.insert(staff.id.clone(), staff);
        Some(index)
    }

    /// Remove a staff and its content. The owning part stays.
    pub(crate) fn remove_staff(&mut self, id: &StaffId) -> Option<Staff> {
        let part_id = self.staves.get(id)?.part.clone();
        if let Some(part) = self.part_mut(&part_id) {
            part.staves.retain(|s| s != id);
        }
        self.drop_staff_data(id)
    }

    fn drop_staff_data(&mut self, id: &StaffId) -> Option<Staff> {
        self.unlink_staff(id);
        for segment in self.segments.values_mut() {
            segment
                .elements
                .retain(|e| e.as_chord_rest().map_or(true, |cr| &cr.staff != id));
        }
        self.prune_segments();
        self.staves.remove(id)
    }

    /// Put `dst` into the link group of `src`, creating the group if needed
    pub(crate) fn link_staves(&mut self, src: &StaffId, dst: &StaffId, ids: &mut IdGenerator) -> bool {
        if !self.staves.contains_key(dst) {
            return false;
        }
        let Some(source) = self.staves.get_mut(src) else {
            return false;
        };
        let link = *source.link.get_or_insert_with(|| ids.link_id());
        if let Some(target) = self.staves.get_mut(dst) {
            target.link = Some(link);
        }
        true
    }

    /// Leave the link group; a group left with a single staff dissolves
    pub(crate) fn unlink_staff(&mut self, id: &StaffId) -> bool {
        let Some(link) = self.staves.get_mut(id).and_then(|s| s.link.take()) else {
            return false;
        };
        let remaining: Vec<StaffId> = self
            .staves
            .values()
            .filter(|s| s.link == Some(link))
            .map(|s| s.id.clone())
            .collect();
        if remaining.len() == 1 {
            if let Some(last) = self.staves.get_mut(&remaining[0]) {
                last.link = None;
            }
        }
        true
    }

    // ----------------------------------------------------------------------
    // Measures and content
    // ----------------------------------------------------------------------

    /// Measures in order
    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    /// First measure
    pub fn first_measure(&self) -> Option<&Measure> {
        self.measures.first()
    }

    /// Last measure
    pub fn last_measure(&self) -> Option<&Measure> {
        self.measures.last()
    }

    /// Tick range covered by all measures
    pub fn tick_range(&self) -> Option<Range<Tick>> {
        let first = self.first_measure()?;
        let last = self.last_measure()?;
        Some(first.tick..last.end_tick())
    }

    /// Append a measure and fill it with whole-measure rests on every staff
    pub(crate) fn append_measure(&mut self, ticks: Tick, ids: &mut IdGenerator) -> Measure {
        let tick = self.last_measure().map_or(0, Measure::end_tick);
        let measure = Measure { tick, ticks };
        self.measures.push(measure);

        let staff_ids: Vec<StaffId> = self.staves().iter().map(|s| s.id.clone()).collect();
        for staff_id in staff_ids {
            self.add_rest(&staff_id, measure, ids);
        }
        measure
    }

    pub(crate) fn push_measure(&mut self, measure: Measure) {
        self.measures.push(measure);
    }

    /// Fill every measure with a whole-measure rest on `staff`
    pub(crate) fn fill_rests(&mut self, staff: &StaffId, ids: &mut IdGenerator) {
        let measures = self.measures.clone();
        for measure in measures {
            self.add_rest(staff, measure, ids);
        }
    }

    fn add_rest(&mut self, staff: &StaffId, measure: Measure, ids: &mut IdGenerator) {
        self.add_element(Element::Rest(ChordRest {
            id: ids.element_id(),
            staff: staff.clone(),
            voice: 0,
            tick: measure.tick,
            duration: measure.ticks,
            visible: true,
            pitches: Vec::new(),
        }));
    }

    /// Segments in tick order
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    /// First segment holding a chord or rest
    pub fn first_segment(&self) -> Option<&Segment> {
        self.segments.values().find(|s| !s.elements.is_empty())
    }

    /// Chords and rests of a staff in tick order
    pub fn staff_content(&self, staff: &StaffId) -> Vec<&ChordRest> {
        self.segments
            .values()
            .flat_map(Segment::chord_rests)
            .filter(|cr| &cr.staff == staff)
            .collect()
    }

    /// Element by id
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.segments
            .values()
            .flat_map(|s| s.elements.iter().chain(s.annotations.iter()))
            .find(|e| e.id() == id)
    }

    /// Owning part of a chord/rest
    pub fn chord_rest_part(&self, chord_rest: &ChordRest) -> Option<&PartId> {
        self.staff(&chord_rest.staff).map(|s| &s.part)
    }

    /// First chord/rest of a part starting exactly at `tick`
    pub fn chord_rest_at(&self, part: &PartId, tick: Tick) -> Option<&ChordRest> {
        let segment = self.segments.get(&tick)?;
        segment
            .chord_rests()
            .find(|cr| self.chord_rest_part(cr) == Some(part))
    }

    /// Instrument changes of a part keyed by tick
    pub fn instrument_changes(&self, part: &PartId) -> BTreeMap<Tick, &InstrumentChange> {
        self.segments
            .values()
            .flat_map(|s| s.annotations.iter())
            .filter_map(Element::as_instrument_change)
            .filter(|ic| &ic.part == part)
            .map(|ic| (ic.tick, ic))
            .collect()
    }

    /// Secondary instrument entries of a part lacking an anchored change marker
    pub fn unanchored_instrument_ticks(&self, part: &PartId) -> Vec<Tick> {
        let Some(p) = self.part(part) else {
            return Vec::new();
        };
        let changes = self.instrument_changes(part);
        p.instruments
            .keys()
            .skip(1)
            .copied()
            .filter(|tick| !changes.contains_key(tick) || self.chord_rest_at(part, *tick).is_none())
            .collect()
    }

    pub(crate) fn add_element(&mut self, element: Element) {
        let tick = element.tick();
        let segment = self.segments.entry(tick).or_insert_with(|| Segment::new(tick));
        match element {
            Element::InstrumentChange(_) => segment.annotations.push(element),
            _ => segment.elements.push(element),
        }
    }

    pub(crate) fn remove_element(&mut self, id: ElementId) -> Option<Element> {
        let mut removed = None;
        for segment in self.segments.values_mut() {
            if let Some(pos) = segment.elements.iter().position(|e| e.id() == id) {
                removed = Some(segment.elements.remove(pos));
                break;
            }
            if let Some(pos) = segment.annotations.iter().position(|e| e.id() == id) {
                removed = Some(segment.annotations.remove(pos));
                break;
            }
        }
        self.prune_segments();
        removed
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.segments
            .values_mut()
            .flat_map(|s| s.elements.iter_mut().chain(s.annotations.iter_mut()))
            .find(|e| e.id() == id)
    }

    /// Chords and rests of a staff inside a tick range, as cloneable elements
    pub(crate) fn staff_elements(&self, staff: &StaffId, range: Range<Tick>) -> Vec<Element> {
        self.segments
            .range(range)
            .flat_map(|(_, s)| s.elements.iter())
            .filter(|e| e.as_chord_rest().map_or(false, |cr| &cr.staff == staff))
            .cloned()
            .collect()
    }

    /// Add copies of `elements` onto `staff`. Returns the number added.
    pub(crate) fn add_cloned(&mut self, elements: &[Element], staff: &StaffId, ids: &mut IdGenerator) -> usize {
        let mut added = 0;
        for element in elements {
            if let Some(copy) = element.cloned_onto(ids.element_id(), staff) {
                self.add_element(copy);
                added += 1;
            }
        }
        added
    }

    /// Chord/rest ids of a staff voice
    pub(crate) fn voice_elements(&self, staff: &StaffId, voice: usize) -> Vec<ElementId> {
        self.staff_content(staff)
            .into_iter()
            .filter(|cr| cr.voice == voice)
            .map(|cr| cr.id)
            .collect()
    }

    fn prune_segments(&mut self) {
        self.segments.retain(|_, s| !s.is_empty());
    }
}
