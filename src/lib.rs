// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Structural editing of a score's parts, instruments and staves.
//!
//! A [`MasterScore`] holds the master score, its excerpts and the undo
//! history. A [`PartsEditor`] drives it through undoable edit operations and
//! announces every change on the channels it hands out with its list views.

pub mod config;
pub mod error;
pub mod notify;
pub mod parts;
pub mod score;

pub use config::{EditOp, EditScript, EditorConfig, ScoreFile};
pub use error::{ScoreError, ScoreResult};
pub use notify::{Channel, ChangeEvent, Notification, Notifier, NotifyList, Watched};
pub use parts::{InsertMode, InteractionEvent, PartsEditor};
pub use score::{MasterScore, ScoreView};
