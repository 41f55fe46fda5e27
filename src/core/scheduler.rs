// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Fixed-period ticker for timed operations

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use super::EngineError;

/// A running periodic task.
///
/// The first tick fires one full period after spawning. Dropping the ticker
/// (or calling [`Ticker::shutdown`]) stops future ticks; a tick already
/// executing runs to completion.
pub struct Ticker {
    shutdown: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawn on the current tokio runtime
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Result<Self, EngineError>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        if period.is_zero() {
            return Err(EngineError::InvalidPeriod);
        }
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        let (shutdown, mut shutdown_rx) = broadcast::channel(1);
        let first = Instant::now() + period;

        let handle = runtime.spawn(async move {
            let mut ticks = interval_at(first, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    _ = ticks.tick() => {
                        if on_tick().is_break() {
                            break;
                        }
                    }
                }
            }
            debug!("Ticker stopped");
        });

        debug!("Ticker spawned with period {:?}", period);
        Ok(Self { shutdown, handle })
    }

    pub fn shutdown(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
    }
}
