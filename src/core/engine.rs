//! Simulation engine - drives the clock and fans out synthetic events

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::event_bus::{DeliveryReport, SimulationEvent, Subscriber, SubscriberSet, SubscriptionId};
use super::scheduler::Ticker;
use super::{EngineError, EngineStatus};
use crate::config::SimulationConfig;
use crate::simulation::EventGenerator;

/// What one tick produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub sequence: u64,
    pub threat: bool,
    pub deliveries: DeliveryReport,
}

struct EngineInner {
    tick_period: Duration,
    threat_probability: f64,
    subscribers: SubscriberSet,
    generator: Mutex<EventGenerator>,
    ticker: Mutex<Option<Ticker>>,
    ticks: AtomicU64,
    threats: AtomicU64,
    failures: AtomicU64,
}

/// Main simulation engine.
///
/// Cloning yields another handle to the same engine, which lets subscribers
/// call back into it (unsubscribe, stop) while being notified.
#[derive(Clone)]
pub struct SimulationEngine {
    inner: Arc<EngineInner>,
}

impl SimulationEngine {
    /// Build from configuration; seeded when `config.seed` is set
    pub fn new(config: &SimulationConfig) -> Result<Self, EngineError> {
        let generator = match config.seed {
            Some(seed) => EventGenerator::from_seed(seed),
            None => EventGenerator::from_entropy(),
        };
        Self::with_generator(config, generator)
    }

    /// Build with an explicit seed, ignoring `config.seed`
    pub fn with_seed(config: &SimulationConfig, seed: u64) -> Result<Self, EngineError> {
        Self::with_generator(config, EventGenerator::from_seed(seed))
    }

    fn with_generator(config: &SimulationConfig, generator: EventGenerator) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::build(config, generator))
    }

    /// Assemble from an already validated config
    fn build(config: &SimulationConfig, generator: EventGenerator) -> Self {
        let generator = generator.with_audio_threat_probability(config.audio_threat_probability);

        Self {
            inner: Arc::new(EngineInner {
                tick_period: config.tick_period(),
                threat_probability: config.threat_probability,
                subscribers: SubscriberSet::new(),
                generator: Mutex::new(generator),
                ticker: Mutex::new(None),
                ticks: AtomicU64::new(0),
                threats: AtomicU64::new(0),
                failures: AtomicU64::new(0),
            }),
        }
    }

    /// Begin ticking every period, first tick one period from now.
    ///
    /// Calling `start` on a running engine does nothing.
    pub fn start(&self) -> Result<(), EngineError> {
        let mut ticker = self.inner.ticker.lock();
        if ticker.is_some() {
            debug!("Simulation engine already running");
            return Ok(());
        }

        let weak: Weak<EngineInner> = Arc::downgrade(&self.inner);
        *ticker = Some(Ticker::spawn(self.inner.tick_period, move || {
            match weak.upgrade() {
                Some(inner) => {
                    inner.tick();
                    ControlFlow::Continue(())
                }
                None => ControlFlow::Break(()),
            }
        })?);

        info!(
            "Simulation engine started (period {:?}, threat probability {})",
            self.inner.tick_period, self.inner.threat_probability
        );
        Ok(())
    }

    /// Cancel future ticks. Calling `stop` on a stopped engine does nothing.
    pub fn stop(&self) {
        let ticker = self.inner.ticker.lock().take();
        if let Some(ticker) = ticker {
            ticker.shutdown();
            info!("Simulation engine stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.ticker.lock().is_some()
    }

    /// Register a subscriber for future ticks. No deduplication is done.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> SubscriptionId {
        let id = self.inner.subscribers.insert(subscriber);
        debug!(subscription = %id, "Subscriber added");
        id
    }

    pub fn subscribe_fn<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&SimulationEvent) -> Result<()> + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(handler))
    }

    /// Remove a subscriber; unknown ids are ignored
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.inner.subscribers.remove(id);
        if removed {
            debug!(subscription = %id, "Subscriber removed");
        }
        removed
    }

    /// Remove every registration of `subscriber`
    pub fn unsubscribe_all(&self, subscriber: &Arc<dyn Subscriber>) -> usize {
        let removed = self.inner.subscribers.remove_all(subscriber);
        if removed > 0 {
            debug!(count = removed, "Subscriber removed");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    pub fn tick_period(&self) -> Duration {
        self.inner.tick_period
    }

    pub fn threat_probability(&self) -> f64 {
        self.inner.threat_probability
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            running: self.is_running(),
            subscribers: self.subscriber_count(),
            ticks: self.inner.ticks.load(Ordering::Relaxed),
            threats_emitted: self.inner.threats.load(Ordering::Relaxed),
            delivery_failures: self.inner.failures.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn tick(&self) -> TickReport {
        self.inner.tick()
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::build(&SimulationConfig::default(), EventGenerator::from_entropy())
    }
}

impl EngineInner {
    fn tick(&self) -> TickReport {
        let sequence = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;

        // Draw everything up front so the random stream does not depend on subscribers
        let (threat, metrics, audio) = {
            let mut generator = self.generator.lock();
            let threat = generator
                .roll_threat(self.threat_probability)
                .then(|| generator.threat(Utc::now()));
            (threat, generator.metrics(), generator.audio())
        };

        let mut report = TickReport {
            sequence,
            threat: threat.is_some(),
            deliveries: DeliveryReport::default(),
        };

        if let Some(threat) = threat {
            self.threats.fetch_add(1, Ordering::Relaxed);
            debug!(tick = sequence, id = %threat.id, kind = %threat.kind, severity = %threat.severity, "Threat generated");
            report.deliveries.merge(self.subscribers.publish(&SimulationEvent::ThreatDetected(threat)));
        }
        report.deliveries.merge(self.subscribers.publish(&SimulationEvent::MetricsUpdate(metrics)));
        report.deliveries.merge(self.subscribers.publish(&SimulationEvent::AudioUpdate(audio)));

        if report.deliveries.failed > 0 {
            self.failures.fetch_add(report.deliveries.failed as u64, Ordering::Relaxed);
        }
        debug!(
            tick = sequence,
            delivered = report.deliveries.delivered,
            failed = report.deliveries.failed,
            "Tick complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EventKind;
    use crate::simulation::AUDIO_FREQUENCIES;
    use anyhow::bail;
    use chrono::TimeZone;

    async fn advance(d: Duration) {
        tokio::time::advance(d).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    fn seeded(seed: u64) -> SimulationEngine {
        SimulationEngine::with_seed(&SimulationConfig::default(), seed).unwrap()
    }

    fn collect(engine: &SimulationEngine) -> Arc<Mutex<Vec<SimulationEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        engine.subscribe_fn(move |event| {
            sink.lock().push(event.clone());
            Ok(())
        });
        events
    }

    fn count_kind(events: &[SimulationEvent], kind: EventKind) -> usize {
        events.iter().filter(|e| e.kind() == kind).count()
    }

    #[test]
    fn test_stop_before_start_is_noop() {
        let engine = seeded(1);
        engine.stop();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_default_engine() {
        let engine = SimulationEngine::default();
        assert_eq!(engine.tick_period(), Duration::from_millis(2000));
        assert_eq!(engine.threat_probability(), 0.1);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_start_outside_runtime() {
        let engine = seeded(1);
        assert_eq!(engine.start(), Err(EngineError::NoRuntime));
        assert!(!engine.is_running());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimulationConfig {
            threat_probability: 1.5,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            SimulationEngine::new(&config),
            Err(EngineError::InvalidProbability { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_single_clock() {
        let engine = seeded(2);
        let events = collect(&engine);
        let period = engine.tick_period();

        engine.start().unwrap();
        engine.start().unwrap();
        assert!(engine.is_running());

        advance(period - Duration::from_millis(1)).await;
        assert_eq!(count_kind(&events.lock(), EventKind::MetricsUpdate), 0);

        advance(Duration::from_millis(1)).await;
        assert_eq!(count_kind(&events.lock(), EventKind::MetricsUpdate), 1);

        advance(period).await;
        assert_eq!(count_kind(&events.lock(), EventKind::MetricsUpdate), 2);
        engine.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks() {
        let engine = seeded(3);
        let events = collect(&engine);
        let period = engine.tick_period();

        engine.start().unwrap();
        advance(period).await;
        engine.stop();
        engine.stop();
        assert!(!engine.is_running());

        for _ in 0..5 {
            advance(period).await;
        }
        assert_eq!(count_kind(&events.lock(), EventKind::MetricsUpdate), 1);
        assert_eq!(engine.status().ticks, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let engine = seeded(4);
        let events = collect(&engine);
        let period = engine.tick_period();

        engine.start().unwrap();
        advance(period).await;
        engine.stop();
        engine.start().unwrap();
        advance(period).await;
        engine.stop();

        assert_eq!(count_kind(&events.lock(), EventKind::MetricsUpdate), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_from_subscriber() {
        let engine = seeded(5);
        let events = collect(&engine);
        let handle = engine.clone();
        engine.subscribe_fn(move |event| {
            if event.kind() == EventKind::AudioUpdate {
                handle.stop();
            }
            Ok(())
        });
        let period = engine.tick_period();

        engine.start().unwrap();
        for _ in 0..3 {
            advance(period).await;
        }
        assert!(!engine.is_running());
        assert_eq!(count_kind(&events.lock(), EventKind::AudioUpdate), 1);
    }

    #[test]
    fn test_threat_rate_over_1000_ticks() {
        let engine = seeded(2024);
        let events = collect(&engine);
        let threats = (0..1000).filter(|_| engine.tick().threat).count();

        // mean 100, sd ~9.5
        assert!((60..=140).contains(&threats), "threats = {}", threats);
        assert_eq!(count_kind(&events.lock(), EventKind::ThreatDetected), threats);
        assert_eq!(engine.status().threats_emitted, threats as u64);
    }

    #[test]
    fn test_zero_and_certain_threat_probability() {
        let never = SimulationEngine::with_seed(
            &SimulationConfig { threat_probability: 0.0, ..SimulationConfig::default() },
            1,
        )
        .unwrap();
        let always = SimulationEngine::with_seed(
            &SimulationConfig { threat_probability: 1.0, ..SimulationConfig::default() },
            1,
        )
        .unwrap();
        assert!((0..100).all(|_| !never.tick().threat));
        assert!((0..100).all(|_| always.tick().threat));
    }

    #[test]
    fn test_payload_bounds_and_order() {
        let engine = seeded(77);
        let events = collect(&engine);
        for _ in 0..300 {
            engine.tick();
        }

        let events = events.lock();
        let mut last_kind = None;
        for event in events.iter() {
            match event {
                SimulationEvent::ThreatDetected(t) => {
                    assert!((80..=99).contains(&t.confidence));
                    assert!(last_kind.is_none() || last_kind == Some(EventKind::AudioUpdate));
                }
                SimulationEvent::MetricsUpdate(m) => {
                    assert!((90..=94).contains(&m.accuracy));
                    assert!((30..=37).contains(&m.cpu_usage));
                    assert!((65..=74).contains(&m.memory_usage));
                    assert!((10..=17).contains(&m.network_latency));
                    assert!((20..=29).contains(&m.response_time));
                }
                SimulationEvent::AudioUpdate(bins) => {
                    assert_eq!(last_kind, Some(EventKind::MetricsUpdate));
                    let freqs: Vec<u32> = bins.iter().map(|b| b.frequency).collect();
                    assert_eq!(freqs, AUDIO_FREQUENCIES.to_vec());
                    assert!(bins.iter().all(|b| (0.0..1.0).contains(&b.amplitude)));
                }
            }
            last_kind = Some(event.kind());
        }
        assert_eq!(count_kind(&events, EventKind::AudioUpdate), 300);
    }

    #[test]
    fn test_unsubscribe_mid_delivery() {
        let engine = seeded(8);
        let victim_log = Arc::new(Mutex::new(0usize));
        let victim_id = Arc::new(Mutex::new(None::<SubscriptionId>));

        let handle = engine.clone();
        let target = victim_id.clone();
        engine.subscribe_fn(move |_| {
            if let Some(id) = *target.lock() {
                handle.unsubscribe(id);
            }
            Ok(())
        });

        let log = victim_log.clone();
        *victim_id.lock() = Some(engine.subscribe_fn(move |_| {
            *log.lock() += 1;
            Ok(())
        }));

        let report = engine.tick();
        assert!(report.deliveries.skipped >= 1);
        engine.tick();
        assert_eq!(*victim_log.lock(), 0);
        assert_eq!(engine.subscriber_count(), 1);
    }

    #[test]
    fn test_unsubscribe_all_by_instance() {
        let engine = seeded(10);
        let hits = Arc::new(Mutex::new(0usize));
        let counter = hits.clone();
        let sub: Arc<dyn Subscriber> = Arc::new(move |_: &SimulationEvent| -> Result<()> {
            *counter.lock() += 1;
            Ok(())
        });
        engine.subscribe(sub.clone());
        engine.subscribe(sub.clone());
        let others = collect(&engine);

        assert_eq!(engine.unsubscribe_all(&sub), 2);
        engine.tick();
        assert_eq!(*hits.lock(), 0);
        assert!(!others.lock().is_empty());
        assert_eq!(engine.subscriber_count(), 1);
    }

    #[test]
    fn test_failing_subscriber_does_not_block_others() {
        let engine = seeded(9);
        engine.subscribe_fn(|_| bail!("consumer exploded"));
        let events = collect(&engine);

        let report = engine.tick();
        assert_eq!(report.deliveries.failed, if report.threat { 3 } else { 2 });
        assert_eq!(events.lock().len(), if report.threat { 3 } else { 2 });
        assert_eq!(engine.status().delivery_failures, report.deliveries.failed as u64);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        fn run(seed: u64) -> Vec<String> {
            let engine = SimulationEngine::with_seed(
                &SimulationConfig { threat_probability: 0.3, ..SimulationConfig::default() },
                seed,
            )
            .unwrap();
            let events = collect(&engine);
            for _ in 0..200 {
                engine.tick();
            }
            let epoch = Utc.timestamp_opt(0, 0).unwrap();
            let normalized = events
                .lock()
                .iter()
                .cloned()
                .map(|event| match event {
                    SimulationEvent::ThreatDetected(mut t) => {
                        t.id.clear();
                        t.timestamp = epoch;
                        SimulationEvent::ThreatDetected(t)
                    }
                    other => other,
                })
                .map(|event| serde_json::to_string(&event).unwrap())
                .collect();
            normalized
        }

        let first = run(31337);
        assert_eq!(first, run(31337));
        assert_ne!(first, run(31338));
    }
}
