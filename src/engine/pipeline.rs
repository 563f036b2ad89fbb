//! Single-pass propagation.
//!
//! Every input runs to completion before the next is looked at, and derived
//! values are updated in a fixed order: simplified row, current event, range
//! gate, distance accounting, filtered row. A snapshot taken between inputs
//! never sees a partially applied one.

use log::{debug, info, warn};

use super::clock::Clock;
use super::{DisplaySnapshot, EngineError, EngineMsg, FilteredRow, SimpleRow};
use crate::config::EngineConfig;
use crate::current::CurrentEvent;
use crate::filter::{BoundField, BoundsError, RangeGate};
use crate::format;
use crate::model::RawEvent;
use crate::tracker::DistanceTracker;

/// What the caller should do after a message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

#[derive(Debug, Clone)]
struct Arrival {
    event: RawEvent,
    at_ms: i64,
}

pub struct Pipeline<C: Clock> {
    clock: C,
    current: CurrentEvent,
    gate: RangeGate,
    distances: DistanceTracker,
    last: Vec<Option<Arrival>>,
    simplified: Vec<SimpleRow>,
    filtered: Vec<FilteredRow>,
}

impl<C: Clock> Pipeline<C> {
    pub fn new(cfg: &EngineConfig, channels: usize, clock: C) -> Self {
        let started = clock.now_ms();
        Self {
            current: CurrentEvent::new(cfg.idle_ms, started),
            gate: RangeGate::new(cfg.boundary, cfg.strict_confirm),
            distances: DistanceTracker::new(cfg.window_ms),
            last: vec![None; channels],
            simplified: vec![SimpleRow::default(); channels],
            filtered: vec![FilteredRow::default(); channels],
            clock,
        }
    }

    pub fn channels(&self) -> usize {
        self.last.len()
    }

    pub fn handle(&mut self, msg: EngineMsg) -> Control {
        match msg {
            EngineMsg::Event { channel, event } => {
                if let Err(e) = self.on_event(channel, event) {
                    warn!("dropping event: {e}");
                }
            }
            EngineMsg::Tick(now_ms) => self.on_tick(now_ms),
            EngineMsg::EditBound { field, text } => self.edit_bound(field, &text),
            EngineMsg::Confirm => {
                if let Err(e) = self.confirm() {
                    warn!("range not applied: {e}");
                }
            }
            EngineMsg::Snapshot(reply) => {
                // requester may have given up waiting
                let _ = reply.send(self.snapshot());
            }
            EngineMsg::Shutdown => return Control::Stop,
        }
        Control::Continue
    }

    /// Applies one tracker report arriving on `channel`, stamped with the
    /// engine clock, and returns the channel's updated filtered row.
    pub fn on_event(&mut self, channel: usize, event: RawEvent) -> Result<&FilteredRow, EngineError> {
        let channels = self.channels();
        if channel >= channels {
            return Err(EngineError::UnknownChannel {
                index: channel,
                channels,
            });
        }
        let at_ms = self.clock.now_ms();

        self.simplified[channel] = SimpleRow {
            id: event.tracker_id.clone(),
            latitude: event.latitude_text(),
            longitude: event.longitude_text(),
        };

        self.current.on_event(&event, at_ms);

        let row = if self.gate.in_range(&event) {
            let dist = self.distances.accept(&event, at_ms);
            debug!("{} accepted on channel {channel}, reporting {dist:.1} m", event.tracker_id);
            accepted_row(&event, at_ms, dist)
        } else {
            FilteredRow::default()
        };
        self.filtered[channel] = row;
        self.last[channel] = Some(Arrival { event, at_ms });

        Ok(&self.filtered[channel])
    }

    pub fn on_tick(&mut self, now_ms: i64) {
        self.current.on_tick(now_ms);
    }

    pub fn edit_bound(&mut self, field: BoundField, text: &str) {
        self.gate.edit(field, text);
    }

    /// Applies the pending bounds and re-renders every filtered row from its
    /// channel's last event. The re-render never touches distance state.
    pub fn confirm(&mut self) -> Result<(), BoundsError> {
        self.gate.confirm()?;
        info!("range confirmed: {}", self.gate.restriction_label());

        for (row, last) in self.filtered.iter_mut().zip(&self.last) {
            *row = match last {
                Some(a) if self.gate.in_range(&a.event) => {
                    accepted_row(&a.event, a.at_ms, self.distances.committed(&a.event.tracker_id))
                }
                _ => FilteredRow::default(),
            };
        }
        Ok(())
    }

    pub fn current_display(&self) -> String {
        self.current.display()
    }

    pub fn simplified(&self) -> &[SimpleRow] {
        &self.simplified
    }

    pub fn filtered(&self) -> &[FilteredRow] {
        &self.filtered
    }

    pub fn distances(&self) -> &DistanceTracker {
        &self.distances
    }

    pub fn gate(&self) -> &RangeGate {
        &self.gate
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            current: self.current.display(),
            restriction: self.gate.restriction_label().to_string(),
            simplified: self.simplified.clone(),
            filtered: self.filtered.clone(),
            committed: self.distances.committed_distances(),
        }
    }
}

fn accepted_row(ev: &RawEvent, at_ms: i64, distance_m: f64) -> FilteredRow {
    FilteredRow {
        id: ev.tracker_id.clone(),
        latitude: ev.latitude_text(),
        longitude: ev.longitude_text(),
        time: format::clock_time(at_ms),
        distance: format::number(distance_m),
        distance_m,
    }
}
