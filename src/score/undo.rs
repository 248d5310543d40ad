// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Undo history of score edits.
//!
//! A transaction is opened with a snapshot of the score state, collects the
//! primitive changes made while open, and on commit becomes one undo step
//! holding both the before and after state.

use std::collections::VecDeque;

use super::types::{ElementId, ExcerptId, PartId, StaffId, Tick};
use super::{ScoreState, ScoreView};
use crate::error::{ScoreError, ScoreResult};

/// Default number of undo steps kept
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A primitive change recorded inside a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    InsertPart { view: ScoreView, part: PartId, index: usize },
    RemovePart { view: ScoreView, part: PartId },
    MovePart { view: ScoreView, part: PartId, from: usize, to: usize },
    PartProperty { view: ScoreView, part: PartId, property: &'static str },
    SetInstrument { view: ScoreView, part: PartId, tick: Tick },
    RemoveInstrument { view: ScoreView, part: PartId, tick: Tick },
    InsertStaff { view: ScoreView, staff: StaffId, index: usize },
    RemoveStaff { view: ScoreView, staff: StaffId },
    StaffProperty { view: ScoreView, staff: StaffId, property: &'static str },
    CloneStaff { from: StaffId, to: StaffId, elements: usize },
    Link { view: ScoreView, staff: StaffId, linked: bool },
    AddElement { view: ScoreView, element: ElementId },
    RemoveElement { view: ScoreView, element: ElementId },
    ElementProperty { view: ScoreView, element: ElementId, property: &'static str },
    InsertMeasure { tick: Tick },
    AddExcerpt { excerpt: ExcerptId },
    RemoveExcerpt { excerpt: ExcerptId },
}

/// A committed undo step
#[derive(Debug, Clone)]
pub struct Transaction {
    changes: Vec<Change>,
    before: ScoreState,
    after: ScoreState,
}

impl Transaction {
    /// Changes recorded in this step, in order
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }
}

#[derive(Debug, Clone)]
struct OpenTransaction {
    before: ScoreState,
    changes: Vec<Change>,
}

/// Stack of committed transactions with redo support
#[derive(Debug, Clone)]
pub struct UndoStack {
    undo_stack: VecDeque<Transaction>,
    redo_stack: Vec<Transaction>,
    open: Option<OpenTransaction>,
    max_history: usize,
}

impl UndoStack {
    /// Create a stack with the default history limit
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_LIMIT)
    }

    /// Create a stack keeping at most `max_history` steps
    pub fn with_capacity(max_history: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            open: None,
            max_history: max_history.max(1),
        }
    }

    /// Open a transaction. A no-op if one is already open.
    pub fn prepare_changes(&mut self, before: ScoreState) {
        if self.open.is_none() {
            self.open = Some(OpenTransaction {
                before,
                changes: Vec::new(),
            });
        }
    }

    /// Whether a transaction is open
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Record a change into the open transaction
    pub fn record(&mut self, change: Change) -> ScoreResult<()> {
        let open = self.open.as_mut().ok_or(ScoreError::NoOpenTransaction)?;
        open.changes.push(change);
        Ok(())
    }

    /// Fail unless a transaction is open
    pub fn ensure_open(&self) -> ScoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ScoreError::NoOpenTransaction)
        }
    }

    /// Changes recorded so far in the open transaction
    pub fn pending(&self) -> &[Change] {
        self.open.as_ref().map_or(&[], |open| open.changes.as_slice())
    }

    /// Close the open transaction. Returns false if nothing was recorded, in
    /// which case no undo step is created.
    pub fn commit_changes(&mut self, after: ScoreState) -> bool {
        let Some(open) = self.open.take() else {
            return false;
        };
        if open.changes.is_empty() {
            return false;
        }

        self.undo_stack.push_back(Transaction {
            changes: open.changes,
            before: open.before,
            after,
        });
        self.redo_stack.clear();

        while self.undo_stack.len() > self.max_history {
            self.undo_stack.pop_front();
        }
        true
    }

    /// Abandon the open transaction, returning the state it started from
    pub fn rollback_changes(&mut self) -> Option<ScoreState> {
        self.open.take().map(|open| open.before)
    }

    /// Step back. Returns the state to restore.
    pub fn undo(&mut self) -> ScoreResult<ScoreState> {
        let transaction = self.undo_stack.pop_back().ok_or(ScoreError::NothingToUndo)?;
        let state = transaction.before.clone();
        self.redo_stack.push(transaction);
        Ok(state)
    }

    /// Step forward again. Returns the state to restore.
    pub fn redo(&mut self) -> ScoreResult<ScoreState> {
        let transaction = self.redo_stack.pop().ok_or(ScoreError::NothingToRedo)?;
        let state = transaction.after.clone();
        self.undo_stack.push_back(transaction);
        Ok(state)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Most recent undo step
    pub fn last(&self) -> Option<&Transaction> {
        self.undo_stack.back()
    }

    /// Drop all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::tree::Score;

    fn state(measures: usize) -> ScoreState {
        let mut master = Score::new();
        let mut ids = crate::score::types::IdGenerator::new();
        for _ in 0..measures {
            master.append_measure(1920, &mut ids);
        }
        ScoreState {
            master,
            excerpts: Vec::new(),
        }
    }

    fn change() -> Change {
        Change::InsertMeasure { tick: 0 }
    }

    #[test]
    fn test_record_requires_open_transaction() {
        let mut stack = UndoStack::new();
        assert_eq!(stack.record(change()), Err(ScoreError::NoOpenTransaction));

        stack.prepare_changes(state(0));
        assert!(stack.record(change()).is_ok());
        assert_eq!(stack.pending().len(), 1);
    }

    #[test]
    fn test_empty_transaction_leaves_no_step() {
        let mut stack = UndoStack::new();
        stack.prepare_changes(state(0));
        assert!(!stack.commit_changes(state(0)));
        assert!(!stack.can_undo());
        assert!(!stack.is_open());
    }

    #[test]
    fn test_undo_redo() {
        let mut stack = UndoStack::new();
        stack.prepare_changes(state(0));
        stack.record(change()).unwrap();
        assert!(stack.commit_changes(state(1)));

        assert_eq!(stack.undo().unwrap().master.measures().len(), 0);
        assert!(stack.can_redo());
        assert_eq!(stack.redo().unwrap().master.measures().len(), 1);
        assert_eq!(stack.redo().unwrap_err(), ScoreError::NothingToRedo);
    }

    #[test]
    fn test_commit_clears_redo() {
        let mut stack = UndoStack::new();
        for n in 0..2 {
            stack.prepare_changes(state(n));
            stack.record(change()).unwrap();
            stack.commit_changes(state(n + 1));
        }
        stack.undo().unwrap();
        assert_eq!(stack.redo_count(), 1);

        stack.prepare_changes(state(1));
        stack.record(change()).unwrap();
        stack.commit_changes(state(2));
        assert_eq!(stack.redo_count(), 0);
        assert_eq!(stack.undo_count(), 2);
    }

    #[test]
    fn test_history_limit() {
        let mut stack = UndoStack::with_capacity(3);
        for n in 0..5 {
            stack.prepare_changes(state(n));
            stack.record(change()).unwrap();
            stack.commit_changes(state(n + 1));
        }
        assert_eq!(stack.undo_count(), 3);
        assert_eq!(stack.last().map(|t| t.changes().len()), Some(1));
    }

    #[test]
    fn test_nested_prepare_keeps_first_snapshot() {
        let mut stack = UndoStack::new();
        stack.prepare_changes(state(0));
        stack.prepare_changes(state(5));
        stack.record(change()).unwrap();
        stack.commit_changes(state(1));
        assert_eq!(stack.undo().unwrap().master.measures().len(), 0);
    }
}
