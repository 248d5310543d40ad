// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Begin/commit framing that turns a composed edit into one undo step.

use tracing::trace;

use crate::score::MasterScore;

/// Tracks how deeply edits are nested.
///
/// Only the outermost `begin` opens a transaction on the score and only the
/// matching `commit` closes it, so helpers that bracket their own work can be
/// called from inside a larger operation.
#[derive(Debug, Default)]
pub struct EditSession {
    depth: usize,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter an edit
    pub fn begin(&mut self, score: &mut MasterScore) {
        if self.depth == 0 {
            score.begin_transaction();
        }
        self.depth += 1;
        trace!(depth = self.depth, "begin edit");
    }

    /// Leave an edit. Returns true when the outermost edit closed and
    /// recorded at least one change.
    pub fn commit(&mut self, score: &mut MasterScore) -> bool {
        match self.depth {
            0 => false,
            1 => {
                self.depth = 0;
                let changed = score.commit_transaction();
                trace!(changed, "commit edit");
                changed
            }
            _ => {
                self.depth -= 1;
                false
            }
        }
    }

    /// Whether an edit is in progress
    pub fn is_open(&self) -> bool {
        self.depth > 0
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{Instrument, Part, PartId, ScoreView};

    fn part(id: &str) -> Part {
        Part::new(PartId::from(id), Instrument::new(id, id))
    }

    #[test]
    fn test_nested_edits_make_one_step() {
        let mut score = MasterScore::new();
        let mut session = EditSession::new();

        session.begin(&mut score);
        score.insert_part(ScoreView::Master, part("a"), 0).unwrap();
        session.begin(&mut score);
        score.insert_part(ScoreView::Master, part("b"), 1).unwrap();
        assert!(!session.commit(&mut score));
        assert!(session.is_open());
        assert!(session.commit(&mut score));

        assert_eq!(session.depth(), 0);
        assert_eq!(score.undo_stack().undo_count(), 1);
        score.undo().unwrap();
        assert!(score.master().parts().is_empty());
    }

    #[test]
    fn test_empty_edit_leaves_no_step() {
        let mut score = MasterScore::new();
        let mut session = EditSession::new();
        session.begin(&mut score);
        assert!(!session.commit(&mut score));
        assert!(!score.undo_stack().can_undo());
    }

    #[test]
    fn test_unbalanced_commit_is_ignored() {
        let mut score = MasterScore::new();
        let mut session = EditSession::new();
        assert!(!session.commit(&mut score));
        assert_eq!(session.depth(), 0);
    }
}
