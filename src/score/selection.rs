// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Current selection and the query result describing it.

use super::element::ChordRest;
use super::tree::Score;
use super::types::ElementId;
use super::ScoreView;

/// Selected elements of one score view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    view: ScoreView,
    elements: Vec<ElementId>,
}

/// What the selection resolves to when a single chord or rest is required
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionQuery<'a> {
    /// Nothing is selected
    Nothing,
    /// Exactly one chord or rest is selected
    ChordRest(&'a ChordRest),
    /// Something is selected but it is not a single chord or rest
    NotChordRest,
}

impl<'a> SelectionQuery<'a> {
    /// The selected chord/rest, if any
    pub fn chord_rest(self) -> Option<&'a ChordRest> {
        match self {
            SelectionQuery::ChordRest(cr) => Some(cr),
            _ => None,
        }
    }
}

impl Selection {
    /// Select elements of a view
    pub fn new(view: ScoreView, elements: Vec<ElementId>) -> Self {
        Self { view, elements }
    }

    /// View the selection belongs to
    pub fn view(&self) -> ScoreView {
        self.view
    }

    /// Selected element ids
    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Resolve against `score`, which must be the score of `view`.
    /// Ids that no longer exist are ignored.
    pub fn query<'a>(&self, view: ScoreView, score: &'a Score) -> SelectionQuery<'a> {
        if view != self.view {
            return SelectionQuery::Nothing;
        }

        let live: Vec<_> = self.elements.iter().filter_map(|id| score.element(*id)).collect();
        match live.as_slice() {
            [] => SelectionQuery::Nothing,
            [single] => single
                .as_chord_rest()
                .map_or(SelectionQuery::NotChordRest, SelectionQuery::ChordRest),
            _ => SelectionQuery::NotChordRest,
        }
    }
}
