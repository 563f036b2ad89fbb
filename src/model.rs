//! Tracker reports and the derived values the engine keeps.

use crate::format;

pub const FEET_TO_METERS: f64 = 0.3048;

/// One report as produced by a tracker source. Altitude is in feet.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub tracker_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_ft: f64,
}

impl RawEvent {
    pub fn new(tracker_id: impl Into<String>, latitude: f64, longitude: f64, altitude_ft: f64) -> Self {
        Self {
            tracker_id: tracker_id.into(),
            latitude,
            longitude,
            altitude_ft,
        }
    }

    pub fn altitude_m(&self) -> f64 {
        self.altitude_ft * FEET_TO_METERS
    }

    pub fn position_at(&self, timestamp_ms: i64) -> Position {
        Position::new(self.latitude, self.longitude, self.altitude_m(), timestamp_ms)
    }

    pub fn latitude_text(&self) -> String {
        format::number(self.latitude)
    }

    pub fn longitude_text(&self) -> String {
        format::number(self.longitude)
    }
}

/// A position sample. Altitude is in meters.
///
/// Two samples at the same place compare equal regardless of when they were taken.
#[derive(Debug, Clone, Copy)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
    pub timestamp_ms: i64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, altitude_m: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            altitude_m,
            timestamp_ms,
        }
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.latitude.total_cmp(&other.latitude).is_eq()
            && self.longitude.total_cmp(&other.longitude).is_eq()
            && self.altitude_m.total_cmp(&other.altitude_m).is_eq()
    }
}

/// The "current event" as shown on the single-line display.
#[derive(Debug, Clone)]
pub struct DisplayEvent {
    pub tracker_id: String,
    pub latitude: String,
    pub longitude: String,
    pub timestamp_ms: i64,
}

impl DisplayEvent {
    pub fn from_raw(ev: &RawEvent, timestamp_ms: i64) -> Self {
        Self {
            tracker_id: ev.tracker_id.clone(),
            latitude: ev.latitude_text(),
            longitude: ev.longitude_text(),
            timestamp_ms,
        }
    }

    pub fn render(&self) -> String {
        format!(
            "{}, Latitude {}, Longitude {}, Time: {}",
            self.tracker_id,
            self.latitude,
            self.longitude,
            format::clock_time(self.timestamp_ms)
        )
    }
}

// timestamp is not part of identity
impl PartialEq for DisplayEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tracker_id == other.tracker_id
            && self.latitude == other.latitude
            && self.longitude == other.longitude
    }
}

impl Eq for DisplayEvent {}
