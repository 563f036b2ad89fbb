use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::filter::{Boundary, LAT_DOMAIN, LON_DOMAIN};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub window_ms: u64,
    pub idle_ms: u64,
    pub tick_ms: u64,
    #[serde(default)]
    pub boundary: Boundary,
    #[serde(default)]
    pub strict_confirm: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_ms: 30_000,
            idle_ms: 3_000,
            tick_ms: 1_000,
            boundary: Boundary::Inclusive,
            strict_confirm: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub trackers: usize,
    pub interval_ms: u64,
    pub origin_lat: f64,
    pub origin_lon: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            trackers: 10,
            interval_ms: 1_000,
            origin_lat: -27.47,
            origin_lon: 153.02,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

pub const MAX_TRACKERS: usize = 64;

fn config_dir() -> Result<PathBuf> {
    let dirs = UserDirs::new().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(dirs.home_dir().join(".config").join("geotrack"))
}

fn default_config_text() -> &'static str {
    include_str!("../config/default.toml")
}

impl Config {
    /// Loads `path` if given, otherwise the per-user file, installing the
    /// default there on first use.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf)> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => install_default()?,
        };
        let cfg = Self::load_from(&path)?;
        Ok((cfg, path))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        Self::parse(&txt).map_err(|e| anyhow!("{}: {e}", path.display()))
    }

    pub fn parse(txt: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(txt).map_err(|e| anyhow!("failed to parse: {e}"))?;
        validate(&cfg)?;
        Ok(cfg)
    }
}

fn install_default() -> Result<PathBuf> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir)?;
    let path = dir.join("config.toml");
    if !path.exists() {
        fs::write(&path, default_config_text())?;
        info!("installed default config at {}", path.display());
    }
    Ok(path)
}

fn validate(cfg: &Config) -> Result<()> {
    let e = &cfg.engine;
    if e.window_ms == 0 || e.idle_ms == 0 || e.tick_ms == 0 {
        return Err(anyhow!("engine durations must be positive"));
    }
    if e.tick_ms > e.idle_ms {
        return Err(anyhow!(
            "engine.tick_ms ({}) must not exceed engine.idle_ms ({})",
            e.tick_ms,
            e.idle_ms
        ));
    }

    let s = &cfg.source;
    if s.trackers == 0 || s.trackers > MAX_TRACKERS {
        return Err(anyhow!("source.trackers must be in 1..={MAX_TRACKERS}"));
    }
    if s.interval_ms == 0 {
        return Err(anyhow!("source.interval_ms must be positive"));
    }
    if !(LAT_DOMAIN.0..=LAT_DOMAIN.1).contains(&s.origin_lat) {
        return Err(anyhow!("source.origin_lat must be within [-90, 90]"));
    }
    if !(LON_DOMAIN.0..=LON_DOMAIN.1).contains(&s.origin_lon) {
        return Err(anyhow!("source.origin_lon must be within [-180, 180]"));
    }
    Ok(())
}
