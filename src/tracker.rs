//! Per-tracker distance accounting over a rolling window.

use log::debug;
use std::collections::{BTreeMap, HashMap};

use crate::distance;
use crate::model::{Position, RawEvent};

#[derive(Debug, Clone, Default)]
pub struct TrackerAggregate {
    pub last_position: Option<Position>,
    pub cumulative_m: f64,
    pub elapsed_ms: i64,
    pub committed_m: f64,
}

impl TrackerAggregate {
    /// Folds one accepted sample in. The first sample only sets the baseline.
    fn advance(&mut self, current: Position, window_ms: i64) -> Option<f64> {
        let mut committed = None;
        if let Some(last) = &self.last_position {
            self.cumulative_m += distance::between(last, &current);
            self.elapsed_ms += current.timestamp_ms - last.timestamp_ms;

            if self.elapsed_ms >= window_ms {
                self.committed_m = self.cumulative_m;
                // keep the overflow for the next window
                self.elapsed_ms -= window_ms;
                committed = Some(self.committed_m);
            }
        }
        self.last_position = Some(current);
        committed
    }
}

/// Owns the aggregate of every tracker id seen in range so far.
#[derive(Debug)]
pub struct DistanceTracker {
    window_ms: i64,
    aggregates: HashMap<String, TrackerAggregate>,
}

impl DistanceTracker {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms: window_ms as i64,
            aggregates: HashMap::new(),
        }
    }

    /// Records an accepted event and returns the distance to report for it:
    /// the last committed window total, not the running one.
    ///
    /// Callers must only pass events that passed the range gate.
    pub fn accept(&mut self, ev: &RawEvent, at_ms: i64) -> f64 {
        let current = ev.position_at(at_ms);
        let agg = self.aggregates.entry(ev.tracker_id.clone()).or_default();
        if let Some(total) = agg.advance(current, self.window_ms) {
            debug!(
                "window committed for {}: {:.1} m (carry {} ms)",
                ev.tracker_id, total, agg.elapsed_ms
            );
        }
        agg.committed_m
    }

    pub fn aggregate(&self, tracker_id: &str) -> Option<&TrackerAggregate> {
        self.aggregates.get(tracker_id)
    }

    pub fn committed(&self, tracker_id: &str) -> f64 {
        self.aggregates.get(tracker_id).map_or(0.0, |a| a.committed_m)
    }

    pub fn committed_distances(&self) -> BTreeMap<String, f64> {
        self.aggregates
            .iter()
            .map(|(k, a)| (k.clone(), a.committed_m))
            .collect()
    }

    pub fn cumulative_distances(&self) -> BTreeMap<String, f64> {
        self.aggregates
            .iter()
            .map(|(k, a)| (k.clone(), a.cumulative_m))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    fn leg(a: &RawEvent, b: &RawEvent) -> f64 {
        distance::between(&a.position_at(0), &b.position_at(0))
    }

    #[test]
    fn first_sample_sets_baseline_only() {
        let mut t = DistanceTracker::new(5000);
        let d = t.accept(&RawEvent::new("A", 7.8, 98.37, 100.0), 0);
        assert_eq!(d, 0.0);
        let agg = t.aggregate("A").unwrap();
        assert_eq!(agg.cumulative_m, 0.0);
        assert_eq!(agg.elapsed_ms, 0);
        assert!(agg.last_position.is_some());
    }

    #[test]
    fn cumulative_is_sum_of_consecutive_legs() {
        let evs = [
            RawEvent::new("Test1Tracker1", 7.8, 98.37, 100.0),
            RawEvent::new("Test1Tracker1", 8.0, 98.40, 105.0),
            RawEvent::new("Test1Tracker1", 9.0, 98.50, 110.0),
            RawEvent::new("Test1Tracker1", 10.0, 98.6, 110.0),
        ];
        let mut t = DistanceTracker::new(5000);
        for (i, ev) in evs.iter().enumerate() {
            t.accept(ev, i as i64 * 100);
        }
        let expected: f64 = evs.windows(2).map(|w| leg(&w[0], &w[1])).sum();
        assert!((t.cumulative_distances()["Test1Tracker1"] - expected).abs() < TOL);
        // 300 ms elapsed, nothing committed yet
        assert_eq!(t.committed("Test1Tracker1"), 0.0);
    }

    #[test]
    fn trackers_do_not_contaminate_each_other() {
        let e1 = RawEvent::new("Test2Tracker1", 7.8, 98.37, 100.0);
        let e2 = RawEvent::new("Test2Tracker2", 8.0, 98.40, 105.0);
        let e3 = RawEvent::new("Test2Tracker3", 9.0, 98.50, 110.0);
        let e4 = RawEvent::new("Test2Tracker2", 8.2, 98.42, 107.0);
        let e5 = RawEvent::new("Test2Tracker1", 8.5, 98.45, 102.0);

        let mut t = DistanceTracker::new(5000);
        for (i, ev) in [&e1, &e2, &e3, &e4, &e5].into_iter().enumerate() {
            t.accept(ev, i as i64);
        }

        let cum = t.cumulative_distances();
        assert!((cum["Test2Tracker1"] - leg(&e1, &e5)).abs() < TOL);
        assert!((cum["Test2Tracker2"] - leg(&e2, &e4)).abs() < TOL);
        assert_eq!(cum["Test2Tracker3"], 0.0);
        assert!((cum["Test2Tracker1"] - leg(&e1, &e2)).abs() > 1.0);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn commits_only_when_window_crossed() {
        let mut t = DistanceTracker::new(5000);
        let a = RawEvent::new("A", 0.0, 0.0, 0.0);
        let b = RawEvent::new("A", 0.0, 0.0, 10.0 / 0.3048);
        let c = RawEvent::new("A", 0.0, 0.0, 25.0 / 0.3048);
        assert_eq!(t.accept(&a, 0), 0.0);
        assert_eq!(t.accept(&b, 1000), 0.0);
        assert_eq!(t.accept(&c, 2000), 0.0);
        let agg = t.aggregate("A").unwrap();
        assert!((agg.cumulative_m - 25.0).abs() < TOL);
        assert_eq!(agg.elapsed_ms, 2000);

        // still below the window
        let d = RawEvent::new("A", 0.0, 0.0, 30.0 / 0.3048);
        assert_eq!(t.accept(&d, 4999), 0.0);

        // crosses: commit the running total, keep the overflow
        let e = RawEvent::new("A", 0.0, 0.0, 31.0 / 0.3048);
        let reported = t.accept(&e, 5600);
        assert!((reported - 31.0).abs() < TOL);
        let agg = t.aggregate("A").unwrap();
        assert_eq!(agg.elapsed_ms, 600);

        // further movement does not change the report until the next crossing
        let f = RawEvent::new("A", 0.0, 0.0, 40.0 / 0.3048);
        let reported = t.accept(&f, 6000);
        assert!((reported - 31.0).abs() < TOL);
        assert!((t.cumulative_distances()["A"] - 40.0).abs() < TOL);
    }

    #[test]
    fn single_long_gap_commits_once() {
        let mut t = DistanceTracker::new(1000);
        t.accept(&RawEvent::new("A", 0.0, 0.0, 0.0), 0);
        t.accept(&RawEvent::new("A", 0.0, 0.0, 100.0), 3500);
        // one subtraction per accepted sample
        assert_eq!(t.aggregate("A").unwrap().elapsed_ms, 2500);
    }

    #[test]
    fn stationary_tracker_accumulates_nothing() {
        let mut t = DistanceTracker::new(1000);
        let ev = RawEvent::new("A", 12.0, 34.0, 500.0);
        t.accept(&ev, 0);
        t.accept(&ev, 1500);
        assert_eq!(t.committed("A"), 0.0);
        assert_eq!(t.aggregate("A").unwrap().elapsed_ms, 500);
    }

    #[test]
    fn unknown_tracker_reports_zero() {
        let t = DistanceTracker::new(1000);
        assert_eq!(t.committed("nobody"), 0.0);
        assert!(t.committed_distances().is_empty());
    }
}
