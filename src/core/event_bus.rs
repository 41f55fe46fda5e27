// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Event bus for engine-to-consumer fan-out

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;

use crate::simulation::{AudioBin, MetricsSample, ThreatEvent};

/// Event kinds in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ThreatDetected,
    MetricsUpdate,
    AudioUpdate,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ThreatDetected => "threat_detected",
            EventKind::MetricsUpdate => "metrics_update",
            EventKind::AudioUpdate => "audio_update",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload delivered to subscribers, tagged with its kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum SimulationEvent {
    ThreatDetected(ThreatEvent),
    MetricsUpdate(MetricsSample),
    AudioUpdate(Vec<AudioBin>),
}

impl SimulationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SimulationEvent::ThreatDetected(_) => EventKind::ThreatDetected,
            SimulationEvent::MetricsUpdate(_) => EventKind::MetricsUpdate,
            SimulationEvent::AudioUpdate(_) => EventKind::AudioUpdate,
        }
    }
}

/// Consumer of simulation events.
///
/// Invoked synchronously from the engine's tick. An `Err` (or a panic) is
/// logged by the bus and never reaches other subscribers.
pub trait Subscriber: Send + Sync {
    fn on_event(&self, event: &SimulationEvent) -> Result<()>;
}

impl<F> Subscriber for F
where
    F: Fn(&SimulationEvent) -> Result<()> + Send + Sync,
{
    fn on_event(&self, event: &SimulationEvent) -> Result<()> {
        self(event)
    }
}

/// Handle returned by a registration; the identity used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Outcome of publishing one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
    /// Removed after the delivery snapshot was taken
    pub skipped: usize,
}

impl DeliveryReport {
    pub fn merge(&mut self, other: DeliveryReport) {
        self.delivered += other.delivered;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

type Entry = (SubscriptionId, Arc<dyn Subscriber>);

/// Ordered subscriber registry.
///
/// The lock is never held while a subscriber runs, so subscribers may
/// register or remove entries (including themselves) during delivery.
pub struct SubscriberSet {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append a subscriber. The same `Arc` may be registered more than once.
    pub fn insert(&self, subscriber: Arc<dyn Subscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push((id, subscriber));
        id
    }

    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Remove every registration of this subscriber instance, returning how many
    pub fn remove_all(&self, subscriber: &Arc<dyn Subscriber>) -> usize {
        let target = Arc::as_ptr(subscriber) as *const ();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(_, entry)| Arc::as_ptr(entry) as *const () != target);
        before - entries.len()
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.entries.lock().iter().any(|(entry_id, _)| *entry_id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Deliver `event` to every subscriber in registration order
    pub fn publish(&self, event: &SimulationEvent) -> DeliveryReport {
        let snapshot: Vec<Entry> = self.entries.lock().clone();
        let mut report = DeliveryReport::default();

        for (id, subscriber) in snapshot {
            if !self.contains(id) {
                report.skipped += 1;
                continue;
            }

            match catch_unwind(AssertUnwindSafe(|| subscriber.on_event(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(subscription = %id, kind = %event.kind(), "Simulation subscriber error: {:#}", e);
                }
                Err(panic) => {
                    report.failed += 1;
                    warn!(
                        subscription = %id,
                        kind = %event.kind(),
                        "Simulation subscriber panicked: {}",
                        panic_message(panic.as_ref())
                    );
                }
            }
        }

        report
    }
}

impl Default for SubscriberSet {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Bridges synchronous delivery into a tokio broadcast channel for async consumers
pub struct BroadcastSubscriber {
    tx: broadcast::Sender<SimulationEvent>,
}

impl BroadcastSubscriber {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SimulationEvent> {
        self.tx.subscribe()
    }
}

impl Subscriber for BroadcastSubscriber {
    fn on_event(&self, event: &SimulationEvent) -> Result<()> {
        // No receivers is not a failure
        let _ = self.tx.send(event.clone());
        Ok(())
    }
}
