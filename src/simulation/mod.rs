//! Simulation module - synthetic threat, metrics and audio payloads

mod generator;

pub use generator::EventGenerator;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Width of the simulated video frame in pixels
pub const FRAME_WIDTH: u32 = 640;

/// Height of the simulated video frame in pixels
pub const FRAME_HEIGHT: u32 = 480;

/// Cameras that can report a simulated threat (`cam_004` is in maintenance)
pub const THREAT_CAMERAS: [&str; 4] = ["cam_001", "cam_002", "cam_003", "cam_005"];

/// Fixed audio analysis bands in Hz
/// Chance that an audio band is flagged as a threat
pub const DEFAULT_AUDIO_THREAT_PROBABILITY: f64 = 0.2;

pub const AUDIO_FREQUENCIES: [u32; 8] = [100, 200, 300, 400, 500, 600, 700, 800];

/// Threat categories the detector can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreatKind {
    #[serde(rename = "Aggressive Behavior")]
    AggressiveBehavior,
    #[serde(rename = "Weapon Detection")]
    WeaponDetection,
    #[serde(rename = "Distress Audio")]
    DistressAudio,
    #[serde(rename = "Panic Gesture")]
    PanicGesture,
    #[serde(rename = "Glass Breaking")]
    GlassBreaking,
}

impl ThreatKind {
    /// All kinds in catalog order
    pub const ALL: [ThreatKind; 5] = [
        ThreatKind::AggressiveBehavior,
        ThreatKind::WeaponDetection,
        ThreatKind::DistressAudio,
        ThreatKind::PanicGesture,
        ThreatKind::GlassBreaking,
    ];

    /// Human readable name
    pub fn name(&self) -> &'static str {
        match self {
            ThreatKind::AggressiveBehavior => "Aggressive Behavior",
            ThreatKind::WeaponDetection => "Weapon Detection",
            ThreatKind::DistressAudio => "Distress Audio",
            ThreatKind::PanicGesture => "Panic Gesture",
            ThreatKind::GlassBreaking => "Glass Breaking",
        }
    }
}

impl fmt::Display for ThreatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Whether a threat of this severity raises a silent alert
    pub fn raises_alert(&self) -> bool {
        matches!(self, Severity::Medium | Severity::High)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel position of a detection inside the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: u32,
    pub y: u32,
}

/// A simulated threat detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatEvent {
    /// `THR_<unix millis>`, unique per generator
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ThreatKind,
    pub camera_id: String,
    pub severity: Severity,
    /// Confidence percentage, 80-99
    pub confidence: u8,
    pub timestamp: DateTime<Utc>,
    pub coordinates: Coordinates,
}

/// One sample of simulated system health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSample {
    /// Detection accuracy percent, 90-94
    pub accuracy: u32,
    /// CPU usage percent, 30-37
    pub cpu_usage: u32,
    /// Memory usage percent, 65-74
    pub memory_usage: u32,
    /// Network latency in ms, 10-17
    pub network_latency: u32,
    /// Response time in seconds, 20-29
    pub response_time: u32,
}

/// A single audio frequency band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioBin {
    pub frequency: u32,
    /// Normalized amplitude in [0, 1)
    pub amplitude: f64,
    pub threat: bool,
}
