// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Identifiers and tick constants shared by the score model.
//!
//! Every entity is addressed by an identifier rather than a reference so that
//! callers can never alias into the score's internal state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Absolute musical position
pub type Tick = u32;

/// Resolution of the tick grid
pub const TICKS_PER_QUARTER: Tick = 480;

/// Length of a default 4/4 measure
pub const DEFAULT_MEASURE_TICKS: Tick = TICKS_PER_QUARTER * 4;

/// Position of a part's primary instrument entry
pub const PRIMARY_TICK: Tick = 0;

/// Voices per staff
pub const VOICES: usize = 4;

/// Number of per-staff slots an instrument definition carries
pub const MAX_STAVES: usize = 4;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from any string
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id! {
    /// Stable part identifier, unique within one score
    PartId
}

string_id! {
    /// Staff identifier, unique within one score
    StaffId
}

string_id! {
    /// Instrument identifier. Not unique: the same instrument may be
    /// assigned several times ("doubling") or in several parts.
    InstrumentId
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id! {
    /// Identifier of a chord, rest or annotation
    ElementId
}

numeric_id! {
    /// Group of staves sharing musical content
    LinkId
}

numeric_id! {
    /// Identifier of an excerpt score
    ExcerptId
}

/// Hands out fresh identifiers.
///
/// Lives next to the undo stack but is never rewound by it, so identifiers
/// stay unique across undo/redo.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Create a generator starting at 1
    pub fn new() -> Self {
        Self { next: 0 }
    }

    fn bump(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    /// Fresh part identifier
    pub fn part_id(&mut self) -> PartId {
        PartId::new(format!("part-{}", self.bump()))
    }

    /// Fresh staff identifier
    pub fn staff_id(&mut self) -> StaffId {
        StaffId::new(format!("staff-{}", self.bump()))
    }

    /// Fresh element identifier
    pub fn element_id(&mut self) -> ElementId {
        ElementId(self.bump())
    }

    /// Fresh link group identifier
    pub fn link_id(&mut self) -> LinkId {
        LinkId(self.bump())
    }

    /// Fresh excerpt identifier
    pub fn excerpt_id(&mut self) -> ExcerptId {
        ExcerptId(self.bump())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_ids() {
        let id = PartId::from("violin");
        assert_eq!(id.as_str(), "violin");
        assert_eq!(id.to_string(), "violin");
        assert_eq!(id, PartId::new(String::from("violin")));
    }

    #[test]
    fn test_generator_is_monotonic() {
        let mut ids = IdGenerator::new();
        let a = ids.staff_id();
        let b = ids.staff_id();
        let c = ids.element_id();
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "staff-1");
        assert_eq!(b.as_str(), "staff-2");
        assert_eq!(c, ElementId(3));
    }
}
