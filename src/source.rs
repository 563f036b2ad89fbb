//! Simulated tracker sources: one random walk per channel, each on its own thread.

use anyhow::Result;
use log::{debug, info};
use rand::Rng;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::config::SourceConfig;
use crate::engine::runtime::ChannelHandle;
use crate::filter::{LAT_DOMAIN, LON_DOMAIN};
use crate::model::RawEvent;

// roughly 50 m of latitude
const MAX_STEP_DEG: f64 = 0.0005;
const MAX_CLIMB_FT: f64 = 40.0;

#[derive(Debug, Clone)]
pub struct Walker {
    id: String,
    lat: f64,
    lon: f64,
    alt_ft: f64,
    heading: f64,
}

impl Walker {
    /// Starts somewhere within about a kilometre of the origin.
    pub fn new<R: Rng>(index: usize, origin_lat: f64, origin_lon: f64, rng: &mut R) -> Self {
        Self {
            id: format!("Tracker{}", index + 1),
            lat: (origin_lat + rng.gen_range(-0.01..0.01)).clamp(LAT_DOMAIN.0, LAT_DOMAIN.1),
            lon: wrap_lon(origin_lon + rng.gen_range(-0.01..0.01)),
            alt_ft: rng.gen_range(0.0..3000.0),
            heading: rng.gen_range(0.0..std::f64::consts::TAU),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Moves one step, mostly along the current heading, and reports the new fix.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> RawEvent {
        self.heading += rng.gen_range(-0.5..0.5);
        let len = rng.gen_range(0.0..MAX_STEP_DEG);
        self.lat = (self.lat + len * self.heading.cos()).clamp(LAT_DOMAIN.0, LAT_DOMAIN.1);
        self.lon = wrap_lon(self.lon + len * self.heading.sin());
        self.alt_ft = (self.alt_ft + rng.gen_range(-MAX_CLIMB_FT..MAX_CLIMB_FT)).max(0.0);
        RawEvent::new(self.id.clone(), self.lat, self.lon, self.alt_ft)
    }
}

fn wrap_lon(lon: f64) -> f64 {
    let span = LON_DOMAIN.1 - LON_DOMAIN.0;
    let mut v = (lon - LON_DOMAIN.0).rem_euclid(span) + LON_DOMAIN.0;
    if v == LON_DOMAIN.0 && lon > 0.0 {
        v = LON_DOMAIN.1;
    }
    v
}

/// Starts one emitter thread per channel. Threads exit when `stop` is set or
/// the engine goes away.
pub fn spawn(
    cfg: &SourceConfig,
    channels: Vec<ChannelHandle>,
    stop: Arc<AtomicBool>,
) -> Result<Vec<JoinHandle<()>>> {
    let mut handles = Vec::with_capacity(channels.len());
    let mut rng = rand::thread_rng();
    let interval = cfg.interval_ms;

    for ch in channels {
        let mut walker = Walker::new(ch.index(), cfg.origin_lat, cfg.origin_lon, &mut rng);
        let stop = stop.clone();
        let h = thread::Builder::new()
            .name(format!("geotrack-source-{}", ch.index()))
            .spawn(move || {
                let mut rng = rand::thread_rng();
                while !stop.load(Ordering::SeqCst) {
                    // jitter so channels drift out of phase
                    let wait = rng.gen_range(interval / 2..=interval + interval / 2);
                    thread::sleep(Duration::from_millis(wait));
                    if ch.send(walker.step(&mut rng)).is_err() {
                        debug!("source {}: engine gone", walker.id());
                        break;
                    }
                }
            })?;
        handles.push(h);
    }
    info!("started {} simulated sources", handles.len());
    Ok(handles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn walker_ids_are_one_based() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(Walker::new(0, 0.0, 0.0, &mut rng).id(), "Tracker1");
        assert_eq!(Walker::new(9, 0.0, 0.0, &mut rng).id(), "Tracker10");
    }

    #[test]
    fn steps_stay_near_and_in_domain() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut w = Walker::new(0, 89.9999, 179.9999, &mut rng);
        let mut prev = w.step(&mut rng);
        for _ in 0..500 {
            let ev = w.step(&mut rng);
            assert!((LAT_DOMAIN.0..=LAT_DOMAIN.1).contains(&ev.latitude));
            assert!((LON_DOMAIN.0..=LON_DOMAIN.1).contains(&ev.longitude));
            assert!(ev.altitude_ft >= 0.0);
            assert!((ev.latitude - prev.latitude).abs() <= MAX_STEP_DEG + 1e-12);
            prev = ev;
        }
    }

    #[test]
    fn wrap_lon_keeps_domain() {
        assert_eq!(wrap_lon(10.0), 10.0);
        assert!((wrap_lon(181.0) - -179.0).abs() < 1e-9);
        assert!((wrap_lon(-181.0) - 179.0).abs() < 1e-9);
        assert_eq!(wrap_lon(180.0), 180.0);
        assert_eq!(wrap_lon(-180.0), -180.0);
    }
}
