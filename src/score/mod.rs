// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! In-memory score model: a master score, its excerpts, the undo history
//! and the current selection.
//!
//! Structural mutation goes through the primitives on [`MasterScore`]. Each
//! one requires an open transaction and records a [`Change`] into it, so a
//! batch of primitives between `begin_transaction` and `commit_transaction`
//! undoes as a single step.

pub mod element;
pub mod instrument;
pub mod part;
pub mod selection;
pub mod staff;
pub mod tree;
pub mod types;
pub mod undo;

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ScoreError, ScoreResult};

pub use element::{ChordRest, Element, ElementKind, InstrumentChange, Measure, Segment};
pub use instrument::{BracketType, ClefType, Instrument, Interval, SharpFlat};
pub use part::Part;
pub use selection::{Selection, SelectionQuery};
pub use staff::{Color, HideMode, NoteheadScheme, Staff, StaffConfig, StaffType, StaffTypeSettings};
pub use tree::Score;
pub use types::*;
pub use undo::{Change, Transaction, UndoStack};

/// Which score an operation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScoreView {
    /// The master score
    #[default]
    Master,
    /// One of the excerpts
    Excerpt(ExcerptId),
}

/// A score derived from the master holding a subset of its parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Excerpt {
    pub id: ExcerptId,
    pub title: String,
    pub score: Score,
}

/// Everything an undo step restores
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreState {
    pub master: Score,
    pub excerpts: Vec<Excerpt>,
}

impl ScoreState {
    fn score(&self, view: ScoreView) -> ScoreResult<&Score> {
        match view {
            ScoreView::Master => Ok(&self.master),
            ScoreView::Excerpt(id) => self
                .excerpts
                .iter()
                .find(|e| e.id == id)
                .map(|e| &e.score)
                .ok_or(ScoreError::ExcerptNotFound(id)),
        }
    }

    fn score_mut(&mut self, view: ScoreView) -> ScoreResult<&mut Score> {
        match view {
            ScoreView::Master => Ok(&mut self.master),
            ScoreView::Excerpt(id) => self
                .excerpts
                .iter_mut()
                .find(|e| e.id == id)
                .map(|e| &mut e.score)
                .ok_or(ScoreError::ExcerptNotFound(id)),
        }
    }

    fn scores(&self) -> impl Iterator<Item = &Score> {
        std::iter::once(&self.master).chain(self.excerpts.iter().map(|e| &e.score))
    }
}

/// Master score with its excerpts, history and selection
#[derive(Debug, Clone, Default)]
pub struct MasterScore {
    state: ScoreState,
    undo: UndoStack,
    ids: IdGenerator,
    selection: Selection,
}

impl MasterScore {
    /// Create an empty master score
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty master score keeping at most `history_limit` undo steps
    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            undo: UndoStack::with_capacity(history_limit),
            ..Self::default()
        }
    }

    // ----------------------------------------------------------------------
    // Reading
    // ----------------------------------------------------------------------

    /// Full score state
    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    /// The master score
    pub fn master(&self) -> &Score {
        &self.state.master
    }

    /// All excerpts
    pub fn excerpts(&self) -> &[Excerpt] {
        &self.state.excerpts
    }

    /// Excerpt by id
    pub fn excerpt(&self, id: ExcerptId) -> Option<&Excerpt> {
        self.state.excerpts.iter().find(|e| e.id == id)
    }

    /// `view` if it still exists, otherwise the master
    pub fn resolve(&self, view: ScoreView) -> ScoreView {
        match view {
            ScoreView::Excerpt(id) if self.excerpt(id).is_none() => ScoreView::Master,
            _ => view,
        }
    }

    /// Score of a view, falling back to the master
    pub fn score(&self, view: ScoreView) -> &Score {
        self.state.score(view).unwrap_or(&self.state.master)
    }

    /// Master followed by every excerpt
    pub fn views(&self) -> Vec<ScoreView> {
        std::iter::once(ScoreView::Master)
            .chain(self.state.excerpts.iter().map(|e| ScoreView::Excerpt(e.id)))
            .collect()
    }

    /// Undo history
    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    // ----------------------------------------------------------------------
    // Identifiers
    // ----------------------------------------------------------------------

    /// Part id unused in every score
    pub fn new_part_id(&mut self) -> PartId {
        loop {
            let id = self.ids.part_id();
            if self.state.scores().all(|s| s.part(&id).is_none()) {
                return id;
            }
        }
    }

    /// Staff id unused in every score
    pub fn new_staff_id(&mut self) -> StaffId {
        loop {
            let id = self.ids.staff_id();
            if self.state.scores().all(|s| s.staff(&id).is_none()) {
                return id;
            }
        }
    }

    /// Fresh element id
    pub fn new_element_id(&mut self) -> ElementId {
        self.ids.element_id()
    }

    // ----------------------------------------------------------------------
    // Selection
    // ----------------------------------------------------------------------

    /// Replace the selection
    pub fn select(&mut self, view: ScoreView, elements: Vec<ElementId>) {
        self.selection = Selection::new(view, elements);
    }

    /// Clear the selection
    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }

    /// Current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Resolve the selection as a single chord/rest in `view`
    pub fn selected_chord_rest(&self, view: ScoreView) -> SelectionQuery<'_> {
        self.selection.query(view, self.score(view))
    }

    // ----------------------------------------------------------------------
    // Transactions
    // ----------------------------------------------------------------------

    /// Open a transaction. A no-op while one is open.
    pub fn begin_transaction(&mut self) {
        if !self.undo.is_open() {
            self.undo.prepare_changes(self.state.clone());
        }
    }

    /// Close the transaction. Returns whether anything changed.
    pub fn commit_transaction(&mut self) -> bool {
        self.undo.commit_changes(self.state.clone())
    }

    /// Abandon the transaction and restore the state it started from
    pub fn rollback_transaction(&mut self) {
        if let Some(before) = self.undo.rollback_changes() {
            self.state = before;
        }
    }

    /// Whether a transaction is open
    pub fn in_transaction(&self) -> bool {
        self.undo.is_open()
    }

    /// Revert the last undo step
    pub fn undo(&mut self) -> ScoreResult<()> {
        self.state = self.undo.undo()?;
        Ok(())
    }

    /// Reapply the last reverted step
    pub fn redo(&mut self) -> ScoreResult<()> {
        self.state = self.undo.redo()?;
        Ok(())
    }

    /// Forget all undo history
    pub fn clear_history(&mut self) {
        self.undo.clear();
    }

    fn edit(&mut self, view: ScoreView) -> ScoreResult<&mut Score> {
        self.undo.ensure_open()?;
        self.state.score_mut(view)
    }

    // ----------------------------------------------------------------------
    // Part primitives
    // ----------------------------------------------------------------------

    /// Insert a part at `index`. Its staves are added with [`Self::insert_staff`].
    pub fn insert_part(&mut self, view: ScoreView, mut part: Part, index: usize) -> ScoreResult<()> {
        let score = self.edit(view)?;
        if score.part(&part.id).is_some() {
            return Err(ScoreError::DuplicatePart(part.id));
        }

        part.staves.clear();
        let id = part.id.clone();
        let index = index.min(score.parts().len());
        score.insert_part(part, index);

        debug!(part = %id, index, "insert part");
        self.undo.record(Change::InsertPart { view, part: id, index })
    }

    /// Remove a part together with its staves and content
    pub fn remove_part(&mut self, view: ScoreView, id: &PartId) -> ScoreResult<Part> {
        let score = self.edit(view)?;
        let part = score
            .remove_part(id)
            .ok_or_else(|| ScoreError::PartNotFound(id.clone()))?;

        debug!(part = %id, "remove part");
        self.undo.record(Change::RemovePart { view, part: id.clone() })?;
        Ok(part)
    }

    /// Move a part to `index` of the resulting order
    pub fn move_part(&mut self, view: ScoreView, id: &PartId, index: usize) -> ScoreResult<()> {
        let score = self.edit(view)?;
        let from = score
            .part_index(id)
            .ok_or_else(|| ScoreError::PartNotFound(id.clone()))?;
        let len = score.parts().len();
        if index >= len {
            return Err(ScoreError::IndexOutOfRange { index, len });
        }
        if from == index {
            return Ok(());
        }
        score.move_part(id, index);

        debug!(part = %id, from, to = index, "move part");
        self.undo.record(Change::MovePart {
            view,
            part: id.clone(),
            from,
            to: index,
        })
    }

    /// Undoable property change of a part. Nothing is recorded when `f`
    /// leaves the part unchanged.
    pub fn change_part(
        &mut self,
        view: ScoreView,
        id: &PartId,
        property: &'static str,
        f: impl FnOnce(&mut Part),
    ) -> ScoreResult<bool> {
        let score = self.edit(view)?;
        let part = score
            .part_mut(id)
            .ok_or_else(|| ScoreError::PartNotFound(id.clone()))?;

        let before = part.clone();
        f(part);
        if *part == before {
            return Ok(false);
        }

        debug!(part = %id, property, "change part");
        self.undo.record(Change::PartProperty {
            view,
            part: id.clone(),
            property,
        })?;
        Ok(true)
    }

    /// Put an instrument entry at `tick`, returning the one it displaced
    pub fn set_instrument(
        &mut self,
        view: ScoreView,
        id: &PartId,
        tick: Tick,
        instrument: Instrument,
    ) -> ScoreResult<Option<Instrument>> {
        let score = self.edit(view)?;
        let part = score
            .part_mut(id)
            .ok_or_else(|| ScoreError::PartNotFound(id.clone()))?;
        let previous = part.instruments.insert(tick, instrument);

        debug!(part = %id, tick, "set instrument");
        self.undo.record(Change::SetInstrument {
            view,
            part: id.clone(),
            tick,
        })?;
        Ok(previous)
    }

    /// Remove the first entry carrying `instrument_id`
    pub fn remove_instrument(
        &mut self,
        view: ScoreView,
        id: &PartId,
        instrument_id: &InstrumentId,
    ) -> ScoreResult<(Tick, Instrument)> {
        let score = self.edit(view)?;
        let part = score
            .part_mut(id)
            .ok_or_else(|| ScoreError::PartNotFound(id.clone()))?;
        let (tick, instrument) = part
            .remove_instrument(instrument_id)
            .ok_or_else(|| ScoreError::InstrumentNotFound {
                part: id.clone(),
                instrument: instrument_id.clone(),
            })?;

        debug!(part = %id, instrument = %instrument_id, tick, "remove instrument");
        self.undo.record(Change::RemoveInstrument {
            view,
            part: id.clone(),
            tick,
        })?;
        Ok((tick, instrument))
    }

    // ----------------------------------------------------------------------
    // Staff primitives
    // ----------------------------------------------------------------------

    /// Insert a staff at a part-local index. With `fill_rests` every measure
    /// gets a whole-measure rest on the new staff.
    pub fn insert_staff(
        &mut self,
        view: ScoreView,
        staff: Staff,
        local_index: usize,
        fill_rests: bool,
    ) -> ScoreResult<usize> {
        self.undo.ensure_open()?;
        let score = self.state.score_mut(view)?;
        if score.part(&staff.part).is_none() {
            return Err(ScoreError::PartNotFound(staff.part));
        }

        let id = staff.id.clone();
        let index = score
            .insert_staff(staff, local_index)
            .ok_or_else(|| ScoreError::StaffNotFound(id.clone()))?;
        if fill_rests {
            score.fill_rests(&id, &mut self.ids);
        }

        debug!(staff = %id, index, "insert staff");
        self.undo.record(Change::InsertStaff { view, staff: id, index })?;
        Ok(index)
    }

    /// Remove a staff with its content, leaving its link group
    pub fn remove_staff(&mut self, view: ScoreView, id: &StaffId) -> ScoreResult<Staff> {
        let score = self.edit(view)?;
        let staff = score
            .remove_staff(id)
            .ok_or_else(|| ScoreError::StaffNotFound(id.clone()))?;

        debug!(staff = %id, "remove staff");
        self.undo.record(Change::RemoveStaff { view, staff: id.clone() })?;
        Ok(staff)
    }

    /// Undoable property change of a staff. Nothing is recorded when `f`
    /// leaves the staff unchanged.
    pub fn change_staff(
        &mut self,
        view: ScoreView,
        id: &StaffId,
        property: &'static str,
        f: impl FnOnce(&mut Staff),
    ) -> ScoreResult<bool> {
        let score = self.edit(view)?;
        let staff = score
            .staff_mut(id)
            .ok_or_else(|| ScoreError::StaffNotFound(id.clone()))?;

        let before = staff.clone();
        f(staff);
        if *staff == before {
            return Ok(false);
        }

        debug!(staff = %id, property, "change staff");
        self.undo.record(Change::StaffProperty {
            view,
            staff: id.clone(),
            property,
        })?;
        Ok(true)
    }

    /// Copy chords and rests from one staff onto another, possibly across
    /// scores. `range` limits the copy to a tick range; `None` copies all.
    pub fn clone_staff_content(
        &mut self,
        from: (ScoreView, &StaffId),
        to: (ScoreView, &StaffId),
        range: Option<Range<Tick>>,
    ) -> ScoreResult<usize> {
        self.undo.ensure_open()?;
        let (from_view, src) = from;
        let (to_view, dst) = to;

        let source = self.state.score(from_view)?;
        if source.staff(src).is_none() {
            return Err(ScoreError::StaffNotFound(src.clone()));
        }
        let elements = source.staff_elements(src, range.unwrap_or(0..Tick::MAX));

        let target = self.state.score_mut(to_view)?;
        if target.staff(dst).is_none() {
            return Err(ScoreError::StaffNotFound(dst.clone()));
        }
        let count = target.add_cloned(&elements, dst, &mut self.ids);

        debug!(from = %src, to = %dst, count, "clone staff content");
        self.undo.record(Change::CloneStaff {
            from: src.clone(),
            to: dst.clone(),
            elements: count,
        })?;
        Ok(count)
    }

    /// Put `dst` into the link group of `src`
    pub fn link_staves(&mut self, view: ScoreView, src: &StaffId, dst: &StaffId) -> ScoreResult<()> {
        self.undo.ensure_open()?;
        let score = self.state.score_mut(view)?;
        for id in [src, dst] {
            if score.staff(id).is_none() {
                return Err(ScoreError::StaffNotFound(id.clone()));
            }
        }
        score.link_staves(src, dst, &mut self.ids);

        self.undo.record(Change::Link {
            view,
            staff: dst.clone(),
            linked: true,
        })
    }

    /// Take a staff out of its link group
    pub fn unlink_staff(&mut self, view: ScoreView, id: &StaffId) -> ScoreResult<()> {
        let score = self.edit(view)?;
        if score.staff(id).is_none() {
            return Err(ScoreError::StaffNotFound(id.clone()));
        }
        if !score.unlink_staff(id) {
            return Ok(());
        }

        self.undo.record(Change::Link {
            view,
            staff: id.clone(),
            linked: false,
        })
    }

    // ----------------------------------------------------------------------
    // Element primitives
    // ----------------------------------------------------------------------

    /// Add an element to its segment
    pub fn add_element(&mut self, view: ScoreView, element: Element) -> ScoreResult<ElementId> {
        let score = self.edit(view)?;
        let id = element.id();
        score.add_element(element);

        self.undo.record(Change::AddElement { view, element: id })?;
        Ok(id)
    }

    /// Remove an element
    pub fn remove_element(&mut self, view: ScoreView, id: ElementId) -> ScoreResult<Element> {
        let score = self.edit(view)?;
        let element = score.remove_element(id).ok_or(ScoreError::ElementNotFound(id))?;

        self.undo.record(Change::RemoveElement { view, element: id })?;
        Ok(element)
    }

    /// Undoable property change of an element
    pub fn change_element(
        &mut self,
        view: ScoreView,
        id: ElementId,
        property: &'static str,
        f: impl FnOnce(&mut Element),
    ) -> ScoreResult<bool> {
        let score = self.edit(view)?;
        let element = score.element_mut(id).ok_or(ScoreError::ElementNotFound(id))?;

        let before = element.clone();
        f(element);
        if *element == before {
            return Ok(false);
        }

        self.undo.record(Change::ElementProperty {
            view,
            element: id,
            property,
        })?;
        Ok(true)
    }

    /// Append a measure to the master and every excerpt
    pub fn append_measure(&mut self, ticks: Tick) -> ScoreResult<Measure> {
        self.undo.ensure_open()?;
        let measure = self.state.master.append_measure(ticks, &mut self.ids);
        for excerpt in &mut self.state.excerpts {
            excerpt.score.append_measure(ticks, &mut self.ids);
        }

        debug!(tick = measure.tick, ticks, "append measure");
        self.undo.record(Change::InsertMeasure { tick: measure.tick })?;
        Ok(measure)
    }

    // ----------------------------------------------------------------------
    // Excerpts
    // ----------------------------------------------------------------------

    /// Create an excerpt holding copies of the given master parts. Part and
    /// staff ids are kept; content is copied.
    pub fn add_excerpt(&mut self, title: impl Into<String>, parts: &[PartId]) -> ScoreResult<ExcerptId> {
        self.undo.ensure_open()?;
        let master = &self.state.master;
        let mut score = Score::new();

        for measure in master.measures() {
            score.push_measure(*measure);
        }
        for part_id in parts {
            let part = master
                .part(part_id)
                .ok_or_else(|| ScoreError::PartNotFound(part_id.clone()))?;
            let mut copy = part.clone();
            copy.staves.clear();
            score.insert_part(copy, usize::MAX);

            for staff in master.part_staves(part_id) {
                let mut staff_copy = staff.clone();
                staff_copy.link = None;
                score.insert_staff(staff_copy, usize::MAX);
                let elements = master.staff_elements(&staff.id, 0..Tick::MAX);
                score.add_cloned(&elements, &staff.id, &mut self.ids);
            }
        }

        let id = self.ids.excerpt_id();
        self.state.excerpts.push(Excerpt {
            id,
            title: title.into(),
            score,
        });

        debug!(excerpt = %id, parts = parts.len(), "add excerpt");
        self.undo.record(Change::AddExcerpt { excerpt: id })?;
        Ok(id)
    }

    /// Drop an excerpt
    pub fn remove_excerpt(&mut self, id: ExcerptId) -> ScoreResult<Excerpt> {
        self.undo.ensure_open()?;
        let index = self
            .state
            .excerpts
            .iter()
            .position(|e| e.id == id)
            .ok_or(ScoreError::ExcerptNotFound(id))?;
        let excerpt = self.state.excerpts.remove(index);

        debug!(excerpt = %id, "remove excerpt");
        self.undo.record(Change::RemoveExcerpt { excerpt: id })?;
        Ok(excerpt)
    }
}
