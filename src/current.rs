//! The single "current event" line, merged across all tracker channels.
//!
//! Holds the most recent *distinct* event and blanks the line once the
//! wall clock (advanced only by ticks) is more than `idle_ms` past the moment
//! that event arrived. Expiry is computed on read; the held value itself is
//! only replaced by a different event.

use crate::model::{DisplayEvent, RawEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum CurrentState {
    Empty,
    Holding(DisplayEvent),
}

#[derive(Debug)]
pub struct CurrentEvent {
    idle_ms: i64,
    state: CurrentState,
    last_tick_ms: i64,
}

impl CurrentEvent {
    /// `started_ms` seeds the tick clock until the first tick arrives.
    pub fn new(idle_ms: u64, started_ms: i64) -> Self {
        Self {
            idle_ms: idle_ms as i64,
            state: CurrentState::Empty,
            last_tick_ms: started_ms,
        }
    }

    /// Returns true when the held event was replaced.
    ///
    /// A repeat of the held event (same id and coordinate text) is dropped and
    /// does not refresh the idle timer.
    pub fn on_event(&mut self, ev: &RawEvent, arrived_ms: i64) -> bool {
        let next = DisplayEvent::from_raw(ev, arrived_ms);
        if let CurrentState::Holding(held) = &self.state {
            if *held == next {
                return false;
            }
        }
        self.state = CurrentState::Holding(next);
        true
    }

    pub fn on_tick(&mut self, now_ms: i64) {
        self.last_tick_ms = now_ms;
    }

    pub fn state(&self) -> &CurrentState {
        &self.state
    }

    pub fn is_expired(&self) -> bool {
        match &self.state {
            CurrentState::Empty => true,
            CurrentState::Holding(held) => self.last_tick_ms - held.timestamp_ms > self.idle_ms,
        }
    }

    /// Text for the display: empty once expired.
    pub fn display(&self) -> String {
        match &self.state {
            CurrentState::Holding(held) if !self.is_expired() => held.render(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: u64 = 3000;
    const T0: i64 = 1_700_000_000_000;

    fn ticks(cur: &mut CurrentEvent, from_ms: i64, to_ms: i64) {
        let mut t = from_ms;
        while t <= to_ms {
            cur.on_tick(t);
            t += 1000;
        }
    }

    #[test]
    fn starts_empty() {
        let cur = CurrentEvent::new(IDLE, T0);
        assert_eq!(cur.state(), &CurrentState::Empty);
        assert_eq!(cur.display(), "");
    }

    #[test]
    fn shows_event_immediately() {
        let mut cur = CurrentEvent::new(IDLE, T0);
        assert!(cur.on_event(&RawEvent::new("ContentTestTracker1", 34.05, -118.25, 100.0), T0 + 500));
        let text = cur.display();
        assert!(text.starts_with("ContentTestTracker1, Latitude 34.05, Longitude -118.25, Time: "));
    }

    #[test]
    fn clears_after_idle_period() {
        let mut cur = CurrentEvent::new(IDLE, T0);
        cur.on_event(&RawEvent::new("ContentTestTracker1", 34.05, -118.25, 100.0), T0 + 500);
        ticks(&mut cur, T0 + 1000, T0 + 3000);
        assert!(!cur.display().is_empty());
        ticks(&mut cur, T0 + 4000, T0 + 4500);
        assert_eq!(cur.display(), "");
        // read-side only: the held value survives expiry
        assert!(matches!(cur.state(), CurrentState::Holding(_)));
    }

    #[test]
    fn exactly_idle_period_is_not_expired() {
        let mut cur = CurrentEvent::new(IDLE, T0);
        cur.on_event(&RawEvent::new("T", 1.0, 2.0, 0.0), T0);
        cur.on_tick(T0 + 3000);
        assert!(!cur.is_expired());
        cur.on_tick(T0 + 3001);
        assert!(cur.is_expired());
    }

    #[test]
    fn new_distinct_event_resets_timer() {
        let mut cur = CurrentEvent::new(IDLE, T0);
        cur.on_event(&RawEvent::new("Tracker1", 34.05, -118.25, 100.0), T0);
        ticks(&mut cur, T0 + 1000, T0 + 2000);
        assert!(cur.on_event(&RawEvent::new("Tracker2", 40.71, -74.01, 200.0), T0 + 2000));

        let text = cur.display();
        assert!(text.contains("Tracker2"));
        assert!(!text.contains("Tracker1"));

        ticks(&mut cur, T0 + 3000, T0 + 4000);
        assert!(!cur.display().is_empty());
    }

    #[test]
    fn duplicate_event_does_not_reset_timer() {
        let mut cur = CurrentEvent::new(IDLE, T0);
        let ev = RawEvent::new("Tracker1", 34.05, -118.25, 100.0);
        cur.on_event(&ev, T0);
        ticks(&mut cur, T0 + 1000, T0 + 2000);
        assert!(!cur.on_event(&ev, T0 + 2000));
        ticks(&mut cur, T0 + 3000, T0 + 4000);
        assert_eq!(cur.display(), "");
    }

    #[test]
    fn altitude_change_alone_is_a_repeat() {
        let mut cur = CurrentEvent::new(IDLE, T0);
        cur.on_event(&RawEvent::new("Tracker1", 34.05, -118.25, 100.0), T0);
        assert!(!cur.on_event(&RawEvent::new("Tracker1", 34.05, -118.25, 900.0), T0 + 10));
    }

    #[test]
    fn reappearing_after_expiry() {
        let mut cur = CurrentEvent::new(IDLE, T0);
        cur.on_event(&RawEvent::new("Tracker1", 1.0, 1.0, 0.0), T0);
        ticks(&mut cur, T0 + 1000, T0 + 5000);
        assert_eq!(cur.display(), "");

        assert!(cur.on_event(&RawEvent::new("Tracker1", 1.5, 1.0, 0.0), T0 + 5200));
        assert!(!cur.display().is_empty());
    }
}
