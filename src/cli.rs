use anyhow::{Result, anyhow};
use log::{info, warn};
use pico_args::Arguments;
use std::{
    env,
    path::PathBuf,
    sync::atomic::Ordering,
    thread,
    time::{Duration, Instant},
};

use crate::config::Config;
use crate::distance;
use crate::engine::runtime::{self, Runtime};
use crate::filter::BoundField;
use crate::model::RawEvent;
use crate::source;

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            match topic {
                Some(t) => print_subcmd_help(&t),
                None => print_help(),
            }
            Ok(())
        }

        Some("run") => {
            let config: Option<PathBuf> = pargs.opt_value_from_str("--config")?;
            let seconds: Option<u64> = pargs.opt_value_from_str("--seconds")?;
            let bounds: Option<String> = pargs.opt_value_from_str("--bounds")?;
            warn_unused(pargs);
            run_engine(config, seconds, bounds)
        }

        Some("config") => {
            let path: Option<PathBuf> = pargs.opt_value_from_str("--config")?;
            warn_unused(pargs);
            let (cfg, path) = Config::load(path.as_deref())?;
            print_response(&serde_json::json!({ "path": path, "config": cfg }));
            Ok(())
        }

        Some("distance") => {
            // usage: geotrack distance LAT1 LON1 ALT1_FT LAT2 LON2 ALT2_FT
            let mut nums = [0.0f64; 6];
            for n in nums.iter_mut() {
                *n = pargs.free_from_str().map_err(|_| {
                    anyhow!("usage: geotrack distance LAT1 LON1 ALT1_FT LAT2 LON2 ALT2_FT")
                })?;
            }
            let a = RawEvent::new("a", nums[0], nums[1], nums[2]).position_at(0);
            let b = RawEvent::new("b", nums[3], nums[4], nums[5]).position_at(0);
            println!("{}", distance::between(&a, &b));
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn run_engine(config: Option<PathBuf>, seconds: Option<u64>, bounds: Option<String>) -> Result<()> {
    let (cfg, path) = Config::load(config.as_deref())?;
    info!("config: {}", path.display());

    let stop = runtime::stop_on_signal()?;
    let mut rt = Runtime::start(&cfg.engine, cfg.source.trackers)?;

    if let Some(spec) = bounds {
        let texts = split_bounds(&spec)?;
        for (field, text) in BoundField::ALL.iter().zip(&texts) {
            rt.edit_bound(*field, text)?;
        }
        rt.confirm()?;
    }

    let sources = source::spawn(&cfg.source, rt.channels(), stop.clone())?;

    let deadline = seconds.map(|s| Instant::now() + Duration::from_secs(s));
    let period = Duration::from_millis(cfg.engine.tick_ms);
    while !stop.load(Ordering::SeqCst) {
        thread::sleep(period);
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        let snap = rt.snapshot()?;
        print_response(&serde_json::to_value(&snap)?);
    }

    stop.store(true, Ordering::SeqCst);
    for h in sources {
        if h.join().is_err() {
            warn!("a source thread panicked");
        }
    }
    rt.shutdown()
}

/// `LATMAX,LATMIN,LONMAX,LONMIN`; individual entries may be blank.
fn split_bounds(spec: &str) -> Result<Vec<String>> {
    let parts: Vec<String> = spec.split(',').map(|s| s.trim().to_string()).collect();
    if parts.len() != BoundField::ALL.len() {
        return Err(anyhow!(
            "--bounds expects LATMAX,LATMIN,LONMAX,LONMIN, got {} value(s)",
            parts.len()
        ));
    }
    Ok(parts)
}

fn warn_unused(pargs: Arguments) {
    let rest = pargs.finish();
    if !rest.is_empty() {
        warn!("ignoring unexpected arguments: {rest:?}");
    }
}

fn print_help() {
    println!(
        r#"geotrack: live GPS tracker aggregation

USAGE:
  geotrack help [command]                      Show general or command-specific help
  geotrack run [--config PATH] [--seconds N] [--bounds LATMAX,LATMIN,LONMAX,LONMIN]
                                               Run the engine against simulated trackers
  geotrack config [--config PATH]              Show the effective configuration
  geotrack distance LAT1 LON1 ALT1 LAT2 LON2 ALT2
                                               3-D distance in meters (altitudes in feet)

TIPS:
  - Config: ~/.config/geotrack/config.toml (installed on first run)
  - Log level: RUST_LOG=debug geotrack run
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "run" => println!(
            "usage: geotrack run [--config PATH] [--seconds N] [--bounds LATMAX,LATMIN,LONMAX,LONMIN]\n\
             Starts the engine with simulated sources and prints the displays every tick.\n\
             --bounds sets and confirms the geographic range at start-up."
        ),
        "config" => println!(
            "usage: geotrack config [--config PATH]\nPrints the configuration file in use and its values."
        ),
        "distance" => println!(
            "usage: geotrack distance LAT1 LON1 ALT1 LAT2 LON2 ALT2\n\
             Haversine horizontal distance combined with the altitude difference (feet in, meters out)."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_response(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_bounds_needs_four_values() {
        assert_eq!(split_bounds("9, 8,98.46,98.30").unwrap(), ["9", "8", "98.46", "98.30"]);
        assert_eq!(split_bounds("9,,98.46,98.30").unwrap()[1], "");
        assert!(split_bounds("9,8,98.46").is_err());
        assert!(split_bounds("1,2,3,4,5").is_err());
    }
}
