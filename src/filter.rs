//! Geographic range gate.
//!
//! The four bound inputs can be edited freely; nothing changes for the gate
//! until `confirm` snapshots them into the active bounds. Until then every
//! event is rejected, as is every event while any active bound is absent.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::format;
use crate::model::RawEvent;

pub const LAT_DOMAIN: (f64, f64) = (-90.0, 90.0);
pub const LON_DOMAIN: (f64, f64) = (-180.0, 180.0);

pub const NO_RESTRICTION_LABEL: &str = "Input must: numeric(include -); max > min";

/// Whether an event sitting exactly on a bound passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    #[default]
    Inclusive,
    Exclusive,
}

impl Boundary {
    fn within(self, v: f64, min: f64, max: f64) -> bool {
        match self {
            Boundary::Inclusive => min <= v && v <= max,
            Boundary::Exclusive => min < v && v < max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundField {
    LatMax,
    LatMin,
    LonMax,
    LonMin,
}

impl BoundField {
    pub const ALL: [BoundField; 4] = [
        BoundField::LatMax,
        BoundField::LatMin,
        BoundField::LonMax,
        BoundField::LonMin,
    ];

    pub fn domain(self) -> (f64, f64) {
        match self {
            BoundField::LatMax | BoundField::LatMin => LAT_DOMAIN,
            BoundField::LonMax | BoundField::LonMin => LON_DOMAIN,
        }
    }

    fn index(self) -> usize {
        match self {
            BoundField::LatMax => 0,
            BoundField::LatMin => 1,
            BoundField::LonMax => 2,
            BoundField::LonMin => 3,
        }
    }
}

impl fmt::Display for BoundField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BoundField::LatMax => "latitude max",
            BoundField::LatMin => "latitude min",
            BoundField::LonMax => "longitude max",
            BoundField::LonMin => "longitude min",
        };
        f.write_str(s)
    }
}

/// Parses one bound as typed by the user. Blank, non-numeric, non-finite or
/// out-of-domain text is an absent bound rather than an error.
pub fn parse_bound(text: &str, min: f64, max: f64) -> Option<f64> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }
    let v: f64 = t.parse().ok()?;
    if v.is_finite() && v >= min && v <= max {
        Some(v)
    } else {
        None
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BoundsError {
    #[error("{0} is missing or outside its domain")]
    Missing(BoundField),
    #[error("{axis} max ({max}) must be greater than min ({min})")]
    Inverted { axis: &'static str, min: f64, max: f64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RangeBounds {
    pub lat_max: Option<f64>,
    pub lat_min: Option<f64>,
    pub lon_max: Option<f64>,
    pub lon_min: Option<f64>,
}

impl RangeBounds {
    pub fn new(lat_max: f64, lat_min: f64, lon_max: f64, lon_min: f64) -> Self {
        Self {
            lat_max: Some(lat_max),
            lat_min: Some(lat_min),
            lon_max: Some(lon_max),
            lon_min: Some(lon_min),
        }
    }

    pub fn get(&self, field: BoundField) -> Option<f64> {
        match field {
            BoundField::LatMax => self.lat_max,
            BoundField::LatMin => self.lat_min,
            BoundField::LonMax => self.lon_max,
            BoundField::LonMin => self.lon_min,
        }
    }

    pub fn is_complete(&self) -> bool {
        BoundField::ALL.iter().all(|f| self.get(*f).is_some())
    }

    pub fn contains(&self, lat: f64, lon: f64, boundary: Boundary) -> bool {
        match (self.lat_max, self.lat_min, self.lon_max, self.lon_min) {
            (Some(lat_max), Some(lat_min), Some(lon_max), Some(lon_min)) => {
                boundary.within(lat, lat_min, lat_max) && boundary.within(lon, lon_min, lon_max)
            }
            _ => false,
        }
    }

    /// Both axes present with max strictly above min.
    pub fn validate(&self) -> Result<(), BoundsError> {
        for f in BoundField::ALL {
            if self.get(f).is_none() {
                return Err(BoundsError::Missing(f));
            }
        }
        let axes = [
            ("latitude", self.lat_min, self.lat_max),
            ("longitude", self.lon_min, self.lon_max),
        ];
        for (axis, min, max) in axes {
            if let (Some(min), Some(max)) = (min, max) {
                if max <= min {
                    return Err(BoundsError::Inverted { axis, min, max });
                }
            }
        }
        Ok(())
    }

    pub fn label(&self) -> String {
        let show = |v: Option<f64>| v.map(format::number).unwrap_or_else(|| "-".to_string());
        format!(
            "Latitude({}, {}) Longitude({}, {})",
            show(self.lat_min),
            show(self.lat_max),
            show(self.lon_min),
            show(self.lon_max)
        )
    }
}

/// Pending, unconfirmed text of the four bound inputs.
#[derive(Debug, Clone, Default)]
pub struct BoundsInput {
    texts: [String; 4],
}

impl BoundsInput {
    pub fn set_text(&mut self, field: BoundField, text: &str) {
        self.texts[field.index()] = text.to_string();
    }

    pub fn text(&self, field: BoundField) -> &str {
        &self.texts[field.index()]
    }

    pub fn value(&self, field: BoundField) -> Option<f64> {
        let (min, max) = field.domain();
        parse_bound(self.text(field), min, max)
    }

    pub fn bounds(&self) -> RangeBounds {
        RangeBounds {
            lat_max: self.value(BoundField::LatMax),
            lat_min: self.value(BoundField::LatMin),
            lon_max: self.value(BoundField::LonMax),
            lon_min: self.value(BoundField::LonMin),
        }
    }
}

#[derive(Debug)]
pub struct RangeGate {
    boundary: Boundary,
    strict_confirm: bool,
    pending: BoundsInput,
    active: RangeBounds,
    label: String,
}

impl RangeGate {
    pub fn new(boundary: Boundary, strict_confirm: bool) -> Self {
        Self {
            boundary,
            strict_confirm,
            pending: BoundsInput::default(),
            active: RangeBounds::default(),
            label: NO_RESTRICTION_LABEL.to_string(),
        }
    }

    /// Edits one pending input. Has no effect on filtering until `confirm`.
    pub fn edit(&mut self, field: BoundField, text: &str) {
        self.pending.set_text(field, text);
    }

    /// Snapshots the pending inputs into the active bounds.
    ///
    /// In strict mode an incomplete or inverted range is refused and the
    /// previous bounds stay active.
    pub fn confirm(&mut self) -> Result<&RangeBounds, BoundsError> {
        let next = self.pending.bounds();
        if self.strict_confirm {
            next.validate()?;
        }
        self.set_range(next);
        Ok(&self.active)
    }

    /// Replaces all four active bounds at once.
    pub fn set_range(&mut self, bounds: RangeBounds) {
        self.active = bounds;
        self.label = bounds.label();
    }

    pub fn active(&self) -> &RangeBounds {
        &self.active
    }

    pub fn restriction_label(&self) -> &str {
        &self.label
    }

    pub fn in_range(&self, ev: &RawEvent) -> bool {
        self.active.contains(ev.latitude, ev.longitude, self.boundary)
    }
}
