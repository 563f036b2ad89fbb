use anyhow::{Result, anyhow};
use log::{error, info};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Sender},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use super::clock::{Clock, SystemClock};
use super::pipeline::{Control, Pipeline};
use super::{DisplaySnapshot, EngineError, EngineMsg};
use crate::config::EngineConfig;
use crate::filter::BoundField;
use crate::model::RawEvent;

/// Push side of one tracker source.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    index: usize,
    tx: Sender<EngineMsg>,
}

impl ChannelHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn send(&self, event: RawEvent) -> Result<(), EngineError> {
        self.tx
            .send(EngineMsg::Event {
                channel: self.index,
                event,
            })
            .map_err(|_| EngineError::Stopped)
    }
}

/// Engine thread plus the one ticker feeding it.
pub struct Runtime {
    tx: Sender<EngineMsg>,
    channels: usize,
    engine: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
}

impl Runtime {
    pub fn start(cfg: &EngineConfig, channels: usize) -> Result<Self> {
        Self::start_with_clock(cfg, channels, SystemClock)
    }

    pub fn start_with_clock<C>(cfg: &EngineConfig, channels: usize, clock: C) -> Result<Self>
    where
        C: Clock + Clone + 'static,
    {
        if channels == 0 {
            return Err(anyhow!("at least one source channel is required"));
        }
        let (tx, rx) = mpsc::channel::<EngineMsg>();
        let mut pipeline = Pipeline::new(cfg, channels, clock.clone());
        let running = Arc::new(AtomicBool::new(true));

        let engine = {
            let running = running.clone();
            thread::Builder::new()
                .name("geotrack-engine".into())
                .spawn(move || {
                    info!("engine: started with {channels} channels");
                    while let Ok(msg) = rx.recv() {
                        if pipeline.handle(msg) == Control::Stop {
                            break;
                        }
                    }
                    running.store(false, Ordering::SeqCst);
                    info!("engine: stopped");
                })?
        };

        let ticker = {
            let tx = tx.clone();
            let period = Duration::from_millis(cfg.tick_ms);
            thread::Builder::new()
                .name("geotrack-ticker".into())
                .spawn(move || {
                    while running.load(Ordering::SeqCst) {
                        if tx.send(EngineMsg::Tick(clock.now_ms())).is_err() {
                            break;
                        }
                        thread::sleep(period);
                    }
                })?
        };

        Ok(Self {
            tx,
            channels,
            engine: Some(engine),
            ticker: Some(ticker),
        })
    }

    pub fn channel(&self, index: usize) -> Result<ChannelHandle, EngineError> {
        if index >= self.channels {
            return Err(EngineError::UnknownChannel {
                index,
                channels: self.channels,
            });
        }
        Ok(ChannelHandle {
            index,
            tx: self.tx.clone(),
        })
    }

    pub fn channels(&self) -> Vec<ChannelHandle> {
        (0..self.channels)
            .map(|index| ChannelHandle {
                index,
                tx: self.tx.clone(),
            })
            .collect()
    }

    pub fn edit_bound(&self, field: BoundField, text: &str) -> Result<(), EngineError> {
        self.post(EngineMsg::EditBound {
            field,
            text: text.to_string(),
        })
    }

    pub fn confirm(&self) -> Result<(), EngineError> {
        self.post(EngineMsg::Confirm)
    }

    /// Waits for the engine to drain everything queued so far and returns the result.
    pub fn snapshot(&self) -> Result<DisplaySnapshot, EngineError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.post(EngineMsg::Snapshot(reply_tx))?;
        reply_rx.recv().map_err(|_| EngineError::Stopped)
    }

    pub fn shutdown(&mut self) -> Result<()> {
        let _ = self.tx.send(EngineMsg::Shutdown);
        if let Some(h) = self.engine.take() {
            h.join().map_err(|_| anyhow!("engine thread panicked"))?;
        }
        if let Some(h) = self.ticker.take() {
            h.join().map_err(|_| anyhow!("ticker thread panicked"))?;
        }
        Ok(())
    }

    fn post(&self, msg: EngineMsg) -> Result<(), EngineError> {
        self.tx.send(msg).map_err(|_| EngineError::Stopped)
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if self.engine.is_some() {
            if let Err(e) = self.shutdown() {
                error!("runtime shutdown: {e}");
            }
        }
    }
}

/// Returns a flag that flips once SIGINT or SIGTERM arrives.
pub fn stop_on_signal() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let flag = stop.clone();
    thread::Builder::new()
        .name("geotrack-signals".into())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!("received signal {sig}, shutting down");
                flag.store(true, Ordering::SeqCst);
            }
        })?;
    Ok(stop)
}
