// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Channels of the parts editor, keyed by part and instrument identifiers.
//!
//! Keyed channels are created on first request and kept for the registry's
//! lifetime, so a subscriber keeps receiving events after the part or
//! instrument behind its key is deleted and re-created.

use std::collections::BTreeMap;

use super::{ChangeEvent, Notification, Notifier};
use crate::score::{Instrument, InstrumentId, Part, PartId, Staff};

/// Identifies one instrument of one part
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrumentKey {
    pub part_id: PartId,
    pub instrument_id: InstrumentId,
}

impl InstrumentKey {
    pub fn new(part_id: impl Into<PartId>, instrument_id: impl Into<InstrumentId>) -> Self {
        Self {
            part_id: part_id.into(),
            instrument_id: instrument_id.into(),
        }
    }
}

/// All channels published by the parts editor
#[derive(Debug, Default)]
pub struct NotifierRegistry {
    parts: Notifier<Part>,
    instruments_by_part: BTreeMap<PartId, Notifier<Instrument>>,
    staves_by_instrument: BTreeMap<InstrumentKey, Notifier<Staff>>,
    structure: Notification,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel for the part list
    pub fn parts(&self) -> Notifier<Part> {
        self.parts.clone()
    }

    /// Coarse signal fired once per completed structural operation
    pub fn structure(&self) -> Notification {
        self.structure.clone()
    }

    /// Channel for the instrument list of a part, created on first use
    pub fn part_notifier(&mut self, part_id: &PartId) -> Notifier<Instrument> {
        self.instruments_by_part
            .entry(part_id.clone())
            .or_default()
            .clone()
    }

    /// Channel for the staff list of an instrument, created on first use
    pub fn instrument_notifier(&mut self, key: &InstrumentKey) -> Notifier<Staff> {
        self.staves_by_instrument
            .entry(key.clone())
            .or_default()
            .clone()
    }

    /// Number of keyed channels created so far
    pub fn channel_count(&self) -> usize {
        self.instruments_by_part.len() + self.staves_by_instrument.len()
    }

    pub fn notify_parts(&self, event: ChangeEvent<Part>) {
        self.parts.send(event);
    }

    /// Send on a part's instrument channel. Nobody can be listening on a
    /// channel that was never requested, so none is created here.
    pub fn notify_instruments(&self, part_id: &PartId, event: ChangeEvent<Instrument>) {
        if let Some(channel) = self.instruments_by_part.get(part_id) {
            channel.send(event);
        }
    }

    /// Send on an instrument's staff channel if it exists
    pub fn notify_staves(&self, key: &InstrumentKey, event: ChangeEvent<Staff>) {
        if let Some(channel) = self.staves_by_instrument.get(key) {
            channel.send(event);
        }
    }

    pub fn notify_structure_changed(&self) {
        self.structure.notify();
    }
}
