//! The aggregation engine: one pipeline fed by one serialized message queue.

pub mod clock;
pub mod pipeline;
pub mod runtime;

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::mpsc::Sender;
use thiserror::Error;

use crate::filter::BoundField;
use crate::model::RawEvent;

/// Everything that can start a propagation pass.
#[derive(Debug, Clone)]
pub enum EngineMsg {
    Event { channel: usize, event: RawEvent },
    Tick(i64),
    EditBound { field: BoundField, text: String },
    Confirm,
    /// Replies with the state after every message queued before it.
    Snapshot(Sender<DisplaySnapshot>),
    Shutdown,
}

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("engine has stopped")]
    Stopped,
    #[error("no channel {index} (engine has {channels})")]
    UnknownChannel { index: usize, channels: usize },
}

/// Last event of one channel with altitude dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimpleRow {
    pub id: String,
    pub latitude: String,
    pub longitude: String,
}

/// One channel's row in the range-filtered view. All text is blank when the
/// channel's last event fell outside the active range.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilteredRow {
    pub id: String,
    pub latitude: String,
    pub longitude: String,
    pub time: String,
    pub distance: String,
    #[serde(skip)]
    pub distance_m: f64,
}

impl FilteredRow {
    pub fn is_blank(&self) -> bool {
        self.id.is_empty()
    }
}

/// Consistent view of every derived value after one propagation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DisplaySnapshot {
    pub current: String,
    pub restriction: String,
    pub simplified: Vec<SimpleRow>,
    pub filtered: Vec<FilteredRow>,
    pub committed: BTreeMap<String, f64>,
}
