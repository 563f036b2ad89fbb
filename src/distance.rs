//! Distance between two position samples.
//!
//! The horizontal leg is the haversine great-circle distance on a spherical
//! Earth; the vertical leg is the altitude difference. The two are combined
//! as orthogonal axes.

use crate::model::Position;

/// Mean Earth radius for the spherical approximation, meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// 3-D distance in meters between two samples. A missing sample yields 0.
pub fn distance(a: Option<&Position>, b: Option<&Position>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => between(a, b),
        _ => 0.0,
    }
}

/// 3-D distance in meters between two samples.
pub fn between(a: &Position, b: &Position) -> f64 {
    let horiz = haversine(a.latitude, a.longitude, b.latitude, b.longitude);
    let vert = (b.altitude_m - a.altitude_m).abs();
    (horiz * horiz + vert * vert).sqrt()
}

/// Great-circle distance in meters between two lat/lon points given in degrees.
pub fn haversine(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> f64 {
    let phi0 = lat0.to_radians();
    let phi1 = lat1.to_radians();
    let dphi = (lat1 - lat0).to_radians();
    let dlambda = (lon1 - lon0).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi0.cos() * phi1.cos() * (dlambda / 2.0).sin().powi(2);
    // rounding can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}
