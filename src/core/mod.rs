//! Core engine module - tick loop and subscriber fan-out

mod engine;
mod event_bus;
mod scheduler;

pub use engine::{SimulationEngine, TickReport};
pub use event_bus::{
    BroadcastSubscriber, DeliveryReport, EventKind, SimulationEvent, Subscriber, SubscriberSet,
    SubscriptionId,
};
pub use scheduler::Ticker;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engine errors
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// `start()` was called outside a tokio runtime
    #[error("no tokio runtime available to drive the simulation clock")]
    NoRuntime,
    #[error("{name} must be within [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("tick period must be greater than zero")]
    InvalidPeriod,
}

/// Snapshot of engine state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub running: bool,
    pub subscribers: usize,
    pub ticks: u64,
    pub threats_emitted: u64,
    pub delivery_failures: u64,
}
