// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Part titles derived from the instruments a part carries.

use tracing::debug;

use super::{logged, PartsEditor};
use crate::score::{Part, PartId, ScoreView};

/// Join the track names of a part's instruments in tick order
pub fn format_part_name(part: &Part, separator: &str) -> String {
    part.instruments
        .values()
        .map(|instrument| instrument.name.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

impl PartsEditor {
    /// Title a part would get from its current instruments
    pub fn format_part_name(&self, part: &Part) -> String {
        format_part_name(part, &self.config.part_name_separator)
    }

    /// Re-derive every part title from its instruments
    pub fn update_part_titles(&mut self) {
        let titles: Vec<(PartId, String)> = self
            .current_score()
            .parts()
            .iter()
            .map(|part| (part.id.clone(), self.format_part_name(part)))
            .collect();

        for (part_id, title) in titles {
            self.set_part_name(&part_id, &title);
        }
    }

    /// Undoable rename inside the open edit
    pub(super) fn rename_part(&mut self, part_id: &PartId, name: String) -> bool {
        let view = self.part_view(part_id);
        logged(
            self.score.change_part(view, part_id, "name", |p| p.name = name),
            "rename part",
        )
        .unwrap_or(false)
    }

    /// Recompute a part's title after its instruments changed
    pub(super) fn refresh_part_name(&mut self, view: ScoreView, part_id: &PartId) {
        let Some(part) = self.score.score(view).part(part_id) else {
            return;
        };
        let name = self.format_part_name(part);
        debug!(part = %part_id, %name, "refresh part name");
        logged(
            self.score.change_part(view, part_id, "name", |p| p.name = name),
            "refresh part name",
        );
    }
}
