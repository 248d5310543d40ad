// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Errors raised by score model primitives.

use thiserror::Error;

use crate::score::{ElementId, ExcerptId, InstrumentId, PartId, StaffId};

/// Failure of a single score model primitive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("no transaction is open")]
    NoOpenTransaction,

    #[error("part not found: {0}")]
    PartNotFound(PartId),

    #[error("staff not found: {0}")]
    StaffNotFound(StaffId),

    #[error("element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("excerpt not found: {0}")]
    ExcerptNotFound(ExcerptId),

    #[error("instrument {instrument} not found in part {part}")]
    InstrumentNotFound { part: PartId, instrument: InstrumentId },

    #[error("part already exists: {0}")]
    DuplicatePart(PartId),

    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

pub type ScoreResult<T> = Result<T, ScoreError>;
