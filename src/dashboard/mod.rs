//! Dashboard module - consumer state fed by the simulation engine

mod panels;
mod settings;

pub use panels::*;
pub use settings::{AdminSettings, SettingToggle, SettingsError};

use std::collections::VecDeque;

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::core::{SimulationEvent, Subscriber};
use crate::fixtures;
use crate::simulation::{AudioBin, MetricsSample, ThreatEvent};

/// Running system metrics shown in the header and metrics panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub overall_accuracy: u32,
    pub cpu_usage: u32,
    pub memory_usage: u32,
    pub network_latency: u32,
    pub active_cameras: u32,
    pub total_cameras: u32,
    pub threats_detected: u32,
    pub alerts_sent: u32,
    pub response_time_avg: u32,
}

impl SystemMetrics {
    /// Overwrite only the fields a live sample carries
    pub fn merge(&mut self, sample: &MetricsSample) {
        self.overall_accuracy = sample.accuracy;
        self.cpu_usage = sample.cpu_usage;
        self.memory_usage = sample.memory_usage;
        self.network_latency = sample.network_latency;
        self.response_time_avg = sample.response_time;
    }
}

impl Default for SystemMetrics {
    fn default() -> Self {
        fixtures::initial_metrics()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    SilentAlert,
    TestAlert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Sent,
    Pending,
    Failed,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Sent => "sent",
            AlertStatus::Pending => "pending",
            AlertStatus::Failed => "failed",
        }
    }
}

/// Alert raised for a medium or high severity threat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub threat_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub status: AlertStatus,
    /// Seconds, 20-29
    pub response_time: u32,
}

/// Count of flagged audio bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioSummary {
    pub threat_count: usize,
    pub total: usize,
    /// Rounded percentage of flagged bands
    pub threat_percentage: u32,
}

impl AudioSummary {
    pub fn from_bins(bins: &[AudioBin]) -> Self {
        let threat_count = bins.iter().filter(|b| b.threat).count();
        let threat_percentage = if bins.is_empty() {
            0
        } else {
            (threat_count as f64 / bins.len() as f64 * 100.0).round() as u32
        };
        Self {
            threat_count,
            total: bins.len(),
            threat_percentage,
        }
    }
}

struct DashboardState {
    threats: VecDeque<ThreatEvent>,
    alerts: VecDeque<Alert>,
    metrics: SystemMetrics,
    audio: Vec<AudioBin>,
    last_alert_millis: i64,
    updates: u64,
}

/// Headless dashboard.
///
/// Keeps bounded threat/alert history, merges metrics samples and replaces
/// audio bins wholesale. Registered with the engine as a [`Subscriber`].
pub struct Dashboard {
    config: DashboardConfig,
    settings: RwLock<AdminSettings>,
    state: RwLock<DashboardState>,
    rng: Mutex<ChaCha8Rng>,
}

impl Dashboard {
    pub fn new(config: DashboardConfig, settings: AdminSettings) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            config,
            settings: RwLock::new(settings),
            state: RwLock::new(DashboardState {
                threats: VecDeque::new(),
                alerts: VecDeque::new(),
                metrics: SystemMetrics::default(),
                audio: Vec::new(),
                last_alert_millis: i64::MIN,
                updates: 0,
            }),
            rng: Mutex::new(rng),
        }
    }

    /// Apply one engine event
    pub fn apply(&self, event: &SimulationEvent) {
        match event {
            SimulationEvent::ThreatDetected(threat) => self.record_threat(threat),
            SimulationEvent::MetricsUpdate(sample) => {
                let mut state = self.state.write();
                state.metrics.merge(sample);
                state.updates += 1;
            }
            SimulationEvent::AudioUpdate(bins) => {
                if !self.settings.read().audio_analysis {
                    debug!("Audio analysis disabled, ignoring update");
                    return;
                }
                let mut state = self.state.write();
                state.audio = bins.clone();
                state.updates += 1;
            }
        }
    }

    fn record_threat(&self, threat: &ThreatEvent) {
        let alert_threshold = self.settings.read().alert_threshold;
        let raises_alert = threat.severity.raises_alert() && threat.confidence >= alert_threshold;
        let response_time = 20 + self.rng.lock().gen_range(0..10);

        let mut state = self.state.write();
        state.updates += 1;
        state.metrics.threats_detected += 1;
        push_bounded(&mut state.threats, threat.clone(), self.config.threat_history);

        if raises_alert {
            let now = Utc::now();
            let id = next_alert_id(&mut state.last_alert_millis, now);
            let alert = Alert {
                id,
                threat_id: Some(threat.id.clone()),
                kind: AlertKind::SilentAlert,
                message: format!("{} detected at {}", threat.kind, threat.camera_id),
                timestamp: now,
                status: AlertStatus::Sent,
                response_time,
            };
            info!(alert = %alert.id, threat = %threat.id, "{}", alert.message);
            state.metrics.alerts_sent += 1;
            push_bounded(&mut state.alerts, alert, self.config.alert_history);
        }
    }

    /// Queue a test alert, as the alert panel's test button does
    pub fn test_alert(&self) -> Alert {
        let response_time = 20 + self.rng.lock().gen_range(0..10);
        let mut state = self.state.write();
        let now = Utc::now();
        let alert = Alert {
            id: next_alert_id(&mut state.last_alert_millis, now),
            threat_id: None,
            kind: AlertKind::TestAlert,
            message: "Test alert dispatched to all emergency contacts".to_string(),
            timestamp: now,
            status: AlertStatus::Pending,
            response_time,
        };
        push_bounded(&mut state.alerts, alert.clone(), self.config.alert_history);
        alert
    }

    /// Most recent threats, newest first
    pub fn threats(&self) -> Vec<ThreatEvent> {
        self.state.read().threats.iter().cloned().collect()
    }

    /// Most recent alerts, newest first
    pub fn alerts(&self) -> Vec<Alert> {
        self.state.read().alerts.iter().cloned().collect()
    }

    pub fn metrics(&self) -> SystemMetrics {
        self.state.read().metrics
    }

    pub fn has_live_audio(&self) -> bool {
        !self.state.read().audio.is_empty()
    }

    /// Live audio bins, or the fixture set before the first update
    pub fn audio_bins(&self) -> Vec<AudioBin> {
        let state = self.state.read();
        if state.audio.is_empty() {
            fixtures::DEFAULT_AUDIO_BINS.to_vec()
        } else {
            state.audio.clone()
        }
    }

    pub fn audio_summary(&self) -> AudioSummary {
        AudioSummary::from_bins(&self.audio_bins())
    }

    /// Events applied so far
    pub fn updates(&self) -> u64 {
        self.state.read().updates
    }

    pub fn settings(&self) -> AdminSettings {
        self.settings.read().clone()
    }

    /// Mutate admin settings in place
    pub fn update_settings<T>(&self, f: impl FnOnce(&mut AdminSettings) -> T) -> T {
        f(&mut self.settings.write())
    }
}

impl Subscriber for Dashboard {
    fn on_event(&self, event: &SimulationEvent) -> Result<()> {
        self.apply(event);
        Ok(())
    }
}

fn push_bounded<T>(items: &mut VecDeque<T>, item: T, limit: usize) {
    items.push_front(item);
    items.truncate(limit);
}

fn next_alert_id(last_millis: &mut i64, now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().max(last_millis.saturating_add(1));
    *last_millis = millis;
    format!("ALT_{}", millis)
}
