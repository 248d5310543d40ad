// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Musical content: measures, segments and the elements they hold.
//!
//! Elements are a tagged variant. Traversals match on [`ElementKind`] or use
//! the `as_*` accessors instead of probing concrete types.

use serde::{Deserialize, Serialize};

use super::instrument::Instrument;
use super::types::{ElementId, PartId, StaffId, Tick};

/// A measure of the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    /// Start tick
    pub tick: Tick,
    /// Length in ticks
    pub ticks: Tick,
}

impl Measure {
    /// Tick just past the end of the measure
    pub fn end_tick(&self) -> Tick {
        self.tick + self.ticks
    }
}

/// Chord or rest on one voice of one staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordRest {
    pub id: ElementId,
    pub staff: StaffId,
    pub voice: usize,
    pub tick: Tick,
    pub duration: Tick,
    pub visible: bool,
    /// MIDI pitches; empty for rests
    pub pitches: Vec<u8>,
}

/// Marker switching a part to a different instrument from its tick onwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentChange {
    pub id: ElementId,
    pub part: PartId,
    pub tick: Tick,
    pub instrument: Instrument,
    /// Created by the parts editor rather than by the user
    pub init: bool,
}

/// Kind of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Chord,
    Rest,
    InstrumentChange,
}

/// Score element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    Chord(ChordRest),
    Rest(ChordRest),
    InstrumentChange(InstrumentChange),
}

impl Element {
    /// Element kind
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Chord(_) => ElementKind::Chord,
            Element::Rest(_) => ElementKind::Rest,
            Element::InstrumentChange(_) => ElementKind::InstrumentChange,
        }
    }

    /// Element identifier
    pub fn id(&self) -> ElementId {
        match self {
            Element::Chord(cr) | Element::Rest(cr) => cr.id,
            Element::InstrumentChange(ic) => ic.id,
        }
    }

    /// Start tick
    pub fn tick(&self) -> Tick {
        match self {
            Element::Chord(cr) | Element::Rest(cr) => cr.tick,
            Element::InstrumentChange(ic) => ic.tick,
        }
    }

    /// Chord/rest payload, if this is one
    pub fn as_chord_rest(&self) -> Option<&ChordRest> {
        match self {
            Element::Chord(cr) | Element::Rest(cr) => Some(cr),
            Element::InstrumentChange(_) => None,
        }
    }

    pub(crate) fn as_chord_rest_mut(&mut self) -> Option<&mut ChordRest> {
        match self {
            Element::Chord(cr) | Element::Rest(cr) => Some(cr),
            Element::InstrumentChange(_) => None,
        }
    }

    /// Instrument change payload, if this is one
    pub fn as_instrument_change(&self) -> Option<&InstrumentChange> {
        match self {
            Element::InstrumentChange(ic) => Some(ic),
            _ => None,
        }
    }

    /// Copy of this chord/rest moved onto another staff under a new id
    pub(crate) fn cloned_onto(&self, id: ElementId, staff: &StaffId) -> Option<Element> {
        let cr = self.as_chord_rest()?;
        let copy = ChordRest {
            id,
            staff: staff.clone(),
            ..cr.clone()
        };
        Some(match self {
            Element::Chord(_) => Element::Chord(copy),
            _ => Element::Rest(copy),
        })
    }
}

/// All elements starting at one tick
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Segment {
    pub tick: Tick,
    /// Chords and rests
    pub elements: Vec<Element>,
    /// Attached markers (instrument changes)
    pub annotations: Vec<Element>,
}

impl Segment {
    /// Empty segment at `tick`
    pub fn new(tick: Tick) -> Self {
        Self {
            tick,
            elements: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Whether nothing is attached to the segment
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.annotations.is_empty()
    }

    /// Chords and rests of every staff
    pub fn chord_rests(&self) -> impl Iterator<Item = &ChordRest> {
        self.elements.iter().filter_map(Element::as_chord_rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rest(id: u64, staff: &str, tick: Tick) -> Element {
        Element::Rest(ChordRest {
            id: ElementId(id),
            staff: StaffId::from(staff),
            voice: 0,
            tick,
            duration: 1920,
            visible: true,
            pitches: Vec::new(),
        })
    }

    #[test]
    fn test_element_kind() {
        let r = rest(1, "s1", 0);
        assert_eq!(r.kind(), ElementKind::Rest);
        assert_eq!(r.id(), ElementId(1));
        assert!(r.as_chord_rest().is_some());
        assert!(r.as_instrument_change().is_none());

        let ic = Element::InstrumentChange(InstrumentChange {
            id: ElementId(2),
            part: PartId::from("p1"),
            tick: 960,
            instrument: Instrument::new("viola", "Viola"),
            init: true,
        });
        assert_eq!(ic.kind(), ElementKind::InstrumentChange);
        assert_eq!(ic.tick(), 960);
        assert!(ic.as_chord_rest().is_none());
    }

    #[test]
    fn test_cloned_onto() {
        let chord = Element::Chord(ChordRest {
            id: ElementId(1),
            staff: StaffId::from("s1"),
            voice: 1,
            tick: 480,
            duration: 480,
            visible: true,
            pitches: vec![60, 64],
        });

        let copy = chord.cloned_onto(ElementId(9), &StaffId::from("s2")).unwrap();
        assert_eq!(copy.kind(), ElementKind::Chord);
        let cr = copy.as_chord_rest().unwrap();
        assert_eq!(cr.staff.as_str(), "s2");
        assert_eq!(cr.pitches, vec![60, 64]);
        assert_eq!(cr.voice, 1);
    }

    #[test]
    fn test_segment_filter() {
        let mut segment = Segment::new(0);
        segment.elements.push(rest(1, "s1", 0));
        segment.elements.push(rest(2, "s2", 0));

        let s1 = StaffId::from("s1");
        assert_eq!(segment.chord_rests().filter(|cr| cr.staff == s1).count(), 1);
        assert_eq!(segment.chord_rests().count(), 2);
        assert!(!segment.is_empty());
        assert_eq!(Measure { tick: 1920, ticks: 1920 }.end_tick(), 3840);
    }
}
