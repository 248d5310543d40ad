// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Parts: a named instrumental line owning staves and a time-indexed
//! instrument assignment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::instrument::{Instrument, Interval, SharpFlat};
use super::types::{InstrumentId, PartId, StaffId, Tick, PRIMARY_TICK};

/// A part of the score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Stable identifier
    pub id: PartId,
    /// Display name
    pub name: String,
    /// Whether the part is shown
    pub visible: bool,
    /// Accidental spelling preference
    pub sharp_flat: SharpFlat,
    /// Written-to-concert transposition
    pub transposition: Interval,
    /// Staves in part-local order
    pub staves: Vec<StaffId>,
    /// Instrument entries by starting tick
    pub instruments: BTreeMap<Tick, Instrument>,
}

impl Part {
    /// Create a part whose primary instrument starts at tick 0
    pub fn new(id: PartId, instrument: Instrument) -> Self {
        let mut instruments = BTreeMap::new();
        let name = instrument.name.clone();
        instruments.insert(PRIMARY_TICK, instrument);
        Self {
            id,
            name,
            visible: true,
            sharp_flat: SharpFlat::Auto,
            transposition: Interval::default(),
            staves: Vec::new(),
            instruments,
        }
    }

    /// Primary instrument (earliest entry)
    pub fn instrument(&self) -> Option<&Instrument> {
        self.instruments.values().next()
    }

    /// Identifier of the primary instrument
    pub fn instrument_id(&self) -> Option<&InstrumentId> {
        self.instrument().map(|i| &i.id)
    }

    /// Instrument active at `tick`
    pub fn instrument_at(&self, tick: Tick) -> Option<&Instrument> {
        self.instruments
            .range(..=tick)
            .next_back()
            .map(|(_, instrument)| instrument)
            .or_else(|| self.instrument())
    }

    /// First entry carrying `instrument_id`, with its tick
    pub fn find_instrument(&self, instrument_id: &InstrumentId) -> Option<(Tick, &Instrument)> {
        self.instruments
            .iter()
            .find(|(_, instrument)| &instrument.id == instrument_id)
            .map(|(tick, instrument)| (*tick, instrument))
    }

    /// Whether any entry carries `instrument_id`
    pub fn has_instrument(&self, instrument_id: &InstrumentId) -> bool {
        self.find_instrument(instrument_id).is_some()
    }

    /// Instrument entries, optionally filtered by identifier
    pub fn instruments_filtered(&self, filter: &[InstrumentId]) -> BTreeMap<Tick, Instrument> {
        self.instruments
            .iter()
            .filter(|(_, instrument)| filter.is_empty() || filter.contains(&instrument.id))
            .map(|(tick, instrument)| (*tick, instrument.clone()))
            .collect()
    }

    /// Highest tick in the instrument mapping
    pub fn last_instrument_tick(&self) -> Option<Tick> {
        self.instruments.keys().next_back().copied()
    }

    /// Number of staves
    pub fn nstaves(&self) -> usize {
        self.staves.len()
    }

    /// Part-local index of a staff
    pub fn staff_index(&self, staff_id: &StaffId) -> Option<usize> {
        self.staves.iter().position(|s| s == staff_id)
    }

    pub(crate) fn remove_instrument(&mut self, instrument_id: &InstrumentId) -> Option<(Tick, Instrument)> {
        let tick = self.find_instrument(instrument_id).map(|(tick, _)| tick)?;
        self.instruments.remove(&tick).map(|instrument| (tick, instrument))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violin_part() -> Part {
        let mut part = Part::new(PartId::from("p1"), Instrument::new("violin", "Violin"));
        part.instruments.insert(960, Instrument::new("viola", "Viola"));
        part.instruments.insert(1920, Instrument::new("violin", "Violin"));
        part
    }

    #[test]
    fn test_part_creation() {
        let part = Part::new(PartId::from("p1"), Instrument::new("flute", "Flute"));
        assert_eq!(part.name, "Flute");
        assert!(part.visible);
        assert_eq!(part.instrument_id().map(|i| i.as_str()), Some("flute"));
        assert_eq!(part.last_instrument_tick(), Some(PRIMARY_TICK));
    }

    #[test]
    fn test_instrument_at() {
        let part = violin_part();
        assert_eq!(part.instrument_at(0).map(|i| i.name.as_str()), Some("Violin"));
        assert_eq!(part.instrument_at(959).map(|i| i.name.as_str()), Some("Violin"));
        assert_eq!(part.instrument_at(960).map(|i| i.name.as_str()), Some("Viola"));
        assert_eq!(part.instrument_at(5000).map(|i| i.name.as_str()), Some("Violin"));
    }

    #[test]
    fn test_find_and_remove_first_entry() {
        let mut part = violin_part();
        let violin = InstrumentId::from("violin");

        assert_eq!(part.find_instrument(&violin).map(|(t, _)| t), Some(0));
        let removed = part.remove_instrument(&violin);
        assert_eq!(removed.map(|(t, _)| t), Some(0));

        // The later doubling of the same instrument remains
        assert_eq!(part.find_instrument(&violin).map(|(t, _)| t), Some(1920));
        assert_eq!(part.instrument_id().map(|i| i.as_str()), Some("viola"));
    }

    #[test]
    fn test_filtered() {
        let part = violin_part();
        let all = part.instruments_filtered(&[]);
        assert_eq!(all.len(), 3);

        let violas = part.instruments_filtered(&[InstrumentId::from("viola")]);
        assert_eq!(violas.keys().copied().collect::<Vec<_>>(), vec![960]);
    }
}
