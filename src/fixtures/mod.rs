//! Static reference data owned by the presentation layer

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::dashboard::SystemMetrics;
use crate::simulation::{AudioBin, Severity, ThreatKind};

/// Catalog entry describing how a threat kind is displayed
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThreatType {
    pub id: u32,
    pub kind: ThreatKind,
    pub color: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraStatus {
    Active,
    Maintenance,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CameraFeed {
    pub id: &'static str,
    pub name: &'static str,
    pub location: &'static str,
    pub status: CameraStatus,
    pub threats: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactRole {
    Primary,
    Emergency,
    Secondary,
    Medical,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EmergencyContact {
    pub id: u32,
    pub name: &'static str,
    pub phone: &'static str,
    pub email: &'static str,
    pub role: ContactRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Resolved,
    Investigating,
    FalsePositive,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: &'static str,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ThreatKind,
    pub location: &'static str,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub response_time: u32,
    pub confidence: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PerformancePoint {
    pub time: &'static str,
    pub accuracy: u32,
    pub cpu: u32,
    pub threats: u32,
}

pub const THREAT_TYPES: [ThreatType; 5] = [
    ThreatType { id: 1, kind: ThreatKind::AggressiveBehavior, color: "#ef4444", icon: "⚠️" },
    ThreatType { id: 2, kind: ThreatKind::WeaponDetection, color: "#dc2626", icon: "🔫" },
    ThreatType { id: 3, kind: ThreatKind::DistressAudio, color: "#f59e0b", icon: "🔊" },
    ThreatType { id: 4, kind: ThreatKind::PanicGesture, color: "#f97316", icon: "🙋" },
    ThreatType { id: 5, kind: ThreatKind::GlassBreaking, color: "#eab308", icon: "💥" },
];

pub const CAMERA_FEEDS: [CameraFeed; 5] = [
    CameraFeed { id: "cam_001", name: "Main Entrance", location: "Building A - Floor 1", status: CameraStatus::Active, threats: 0 },
    CameraFeed { id: "cam_002", name: "Cafeteria", location: "Building A - Floor 2", status: CameraStatus::Active, threats: 1 },
    CameraFeed { id: "cam_003", name: "Parking Lot", location: "Outdoor - West", status: CameraStatus::Active, threats: 0 },
    CameraFeed { id: "cam_004", name: "Conference Room", location: "Building B - Floor 3", status: CameraStatus::Maintenance, threats: 0 },
    CameraFeed { id: "cam_005", name: "Hallway Central", location: "Building A - Floor 1", status: CameraStatus::Active, threats: 2 },
];

pub const EMERGENCY_CONTACTS: [EmergencyContact; 4] = [
    EmergencyContact { id: 1, name: "Security Team", phone: "+1-555-0101", email: "security@company.com", role: ContactRole::Primary },
    EmergencyContact { id: 2, name: "Local Police", phone: "911", email: "dispatch@police.gov", role: ContactRole::Emergency },
    EmergencyContact { id: 3, name: "Building Manager", phone: "+1-555-0102", email: "manager@building.com", role: ContactRole::Secondary },
    EmergencyContact { id: 4, name: "Medical Team", phone: "+1-555-0103", email: "medical@company.com", role: ContactRole::Medical },
];

pub const PERFORMANCE_HISTORY: [PerformancePoint; 6] = [
    PerformancePoint { time: "00:00", accuracy: 91, cpu: 32, threats: 0 },
    PerformancePoint { time: "04:00", accuracy: 93, cpu: 35, threats: 1 },
    PerformancePoint { time: "08:00", accuracy: 89, cpu: 38, threats: 2 },
    PerformancePoint { time: "12:00", accuracy: 94, cpu: 33, threats: 1 },
    PerformancePoint { time: "16:00", accuracy: 92, cpu: 34, threats: 3 },
    PerformancePoint { time: "20:00", accuracy: 90, cpu: 36, threats: 1 },
];

/// Shown by the audio panel until the first live update
pub const DEFAULT_AUDIO_BINS: [AudioBin; 8] = [
    AudioBin { frequency: 100, amplitude: 0.2, threat: false },
    AudioBin { frequency: 200, amplitude: 0.4, threat: false },
    AudioBin { frequency: 300, amplitude: 0.8, threat: true },
    AudioBin { frequency: 400, amplitude: 0.6, threat: false },
    AudioBin { frequency: 500, amplitude: 0.9, threat: true },
    AudioBin { frequency: 600, amplitude: 0.3, threat: false },
    AudioBin { frequency: 700, amplitude: 0.5, threat: false },
    AudioBin { frequency: 800, amplitude: 0.7, threat: true },
];

pub fn threat_type(kind: ThreatKind) -> Option<&'static ThreatType> {
    THREAT_TYPES.iter().find(|t| t.kind == kind)
}

pub fn camera(id: &str) -> Option<&'static CameraFeed> {
    CAMERA_FEEDS.iter().find(|c| c.id == id)
}

pub fn active_camera_count() -> u32 {
    CAMERA_FEEDS.iter().filter(|c| c.status == CameraStatus::Active).count() as u32
}

/// Metrics shown before the first live sample
pub fn initial_metrics() -> SystemMetrics {
    SystemMetrics {
        overall_accuracy: 92,
        cpu_usage: 34,
        memory_usage: 68,
        network_latency: 12,
        active_cameras: active_camera_count(),
        total_cameras: CAMERA_FEEDS.len() as u32,
        threats_detected: 3,
        alerts_sent: 2,
        response_time_avg: 27,
    }
}

/// Historical incidents, timestamped relative to `now`
pub fn recent_incidents(now: DateTime<Utc>) -> Vec<Incident> {
    vec![
        Incident {
            id: "INC_001",
            timestamp: now - Duration::minutes(15),
            kind: ThreatKind::AggressiveBehavior,
            location: "Cafeteria - Cam 002",
            severity: Severity::Medium,
            status: IncidentStatus::Resolved,
            response_time: 28,
            confidence: 94,
        },
        Incident {
            id: "INC_002",
            timestamp: now - Duration::minutes(45),
            kind: ThreatKind::DistressAudio,
            location: "Hallway Central - Cam 005",
            severity: Severity::High,
            status: IncidentStatus::Investigating,
            response_time: 22,
            confidence: 89,
        },
        Incident {
            id: "INC_003",
            timestamp: now - Duration::minutes(120),
            kind: ThreatKind::PanicGesture,
            location: "Conference Room - Cam 004",
            severity: Severity::Low,
            status: IncidentStatus::FalsePositive,
            response_time: 31,
            confidence: 76,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{AUDIO_FREQUENCIES, THREAT_CAMERAS};

    #[test]
    fn test_catalog_covers_every_kind() {
        for kind in ThreatKind::ALL {
            assert!(threat_type(kind).is_some(), "{} missing", kind);
        }
    }

    #[test]
    fn test_threat_cameras_are_active() {
        for id in THREAT_CAMERAS {
            assert_eq!(camera(id).map(|c| c.status), Some(CameraStatus::Active));
        }
        assert_eq!(camera("cam_004").map(|c| c.status), Some(CameraStatus::Maintenance));
        assert!(camera("cam_999").is_none());
    }

    #[test]
    fn test_initial_metrics() {
        let m = initial_metrics();
        assert_eq!(m.active_cameras, 4);
        assert_eq!(m.total_cameras, 5);
    }

    #[test]
    fn test_default_audio_matches_bands() {
        let freqs: Vec<u32> = DEFAULT_AUDIO_BINS.iter().map(|b| b.frequency).collect();
        assert_eq!(freqs, AUDIO_FREQUENCIES.to_vec());
    }

    #[test]
    fn test_incidents_ordered_newest_first() {
        let now = Utc::now();
        let incidents = recent_incidents(now);
        assert_eq!(incidents.len(), 3);
        assert!(incidents.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
        assert_eq!(incidents[0].timestamp, now - Duration::minutes(15));
    }
}
