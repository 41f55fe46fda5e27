//! Text panels for the headless console

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::{Alert, AudioSummary, Dashboard, SystemMetrics};
use crate::fixtures::{self, CameraStatus};
use crate::simulation::{AudioBin, ThreatEvent};

/// Health band of a metric where lower is better
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricHealth {
    Good,
    Warning,
    Critical,
}

impl MetricHealth {
    pub fn classify(value: u32, good: u32, warning: u32) -> Self {
        if value <= good {
            MetricHealth::Good
        } else if value <= warning {
            MetricHealth::Warning
        } else {
            MetricHealth::Critical
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricHealth::Good => "ok",
            MetricHealth::Warning => "warn",
            MetricHealth::Critical => "CRIT",
        }
    }
}

pub fn cpu_health(value: u32) -> MetricHealth {
    MetricHealth::classify(value, 35, 50)
}

pub fn memory_health(value: u32) -> MetricHealth {
    MetricHealth::classify(value, 70, 85)
}

pub fn latency_health(value: u32) -> MetricHealth {
    MetricHealth::classify(value, 15, 25)
}

/// Dashboard tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Monitoring,
    Alerts,
    Analytics,
    Admin,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Monitoring, Tab::Alerts, Tab::Analytics, Tab::Admin];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Monitoring => "Live Monitoring",
            Tab::Alerts => "Alert System",
            Tab::Analytics => "Analytics",
            Tab::Admin => "Admin Panel",
        }
    }
}

/// Render one tab of the dashboard
pub fn render_tab(dashboard: &Dashboard, tab: Tab) -> String {
    let metrics = dashboard.metrics();
    let mut out = render_header(&metrics);
    out.push('\n');

    match tab {
        Tab::Monitoring => {
            out.push_str(&render_threat_panel(&dashboard.threats()));
            out.push('\n');
            out.push_str(&render_audio_panel(&dashboard.audio_bins()));
            out.push('\n');
            out.push_str(&render_camera_panel());
            out.push('\n');
            out.push_str(&render_metrics_panel(&metrics, false));
        }
        Tab::Alerts => {
            out.push_str(&render_alert_panel(&dashboard.alerts()));
            out.push('\n');
            out.push_str(&render_contact_panel());
            out.push('\n');
            out.push_str(&render_incident_panel(Utc::now()));
        }
        Tab::Analytics => out.push_str(&render_metrics_panel(&metrics, true)),
        Tab::Admin => {
            out.push_str(&render_settings_panel(dashboard));
            out.push('\n');
            out.push_str(&render_camera_panel());
            out.push('\n');
            out.push_str(&render_contact_panel());
        }
    }
    out
}

pub fn render_header(metrics: &SystemMetrics) -> String {
    format!(
        "== AI Emergency Detection System == accuracy {}% | avg response {}s | cpu {}%\n",
        metrics.overall_accuracy, metrics.response_time_avg, metrics.cpu_usage
    )
}

pub fn render_threat_panel(threats: &[ThreatEvent]) -> String {
    let mut out = String::from("-- Threat Detection --\n");
    if threats.is_empty() {
        out.push_str("No threats detected\nSystem is monitoring for suspicious activity\n");
        return out;
    }

    for threat in threats {
        let icon = fixtures::threat_type(threat.kind).map_or("⚠️", |t| t.icon);
        let camera = fixtures::camera(&threat.camera_id).map_or(threat.camera_id.as_str(), |c| c.name);
        let _ = writeln!(
            out,
            "{} {} [{}] {}% @ {} ({}, {}) {} {}",
            icon,
            threat.kind,
            threat.severity.as_str().to_uppercase(),
            threat.confidence,
            camera,
            threat.coordinates.x,
            threat.coordinates.y,
            threat.timestamp.format("%H:%M:%S"),
            threat.id
        );
    }
    out
}

pub fn render_audio_panel(bins: &[AudioBin]) -> String {
    let summary = AudioSummary::from_bins(bins);
    let mut out = String::from("-- Audio Threat Analysis --\n");
    let _ = writeln!(
        out,
        "{} ({} of {} bands flagged, {}%)",
        if summary.threat_count > 0 { "Threats Detected" } else { "Normal Audio" },
        summary.threat_count,
        summary.total,
        summary.threat_percentage
    );

    for bin in bins {
        let width = (bin.amplitude * 20.0).round() as usize;
        let _ = writeln!(
            out,
            "{:>4}Hz {:<20} {:>3}%{}",
            bin.frequency,
            "#".repeat(width),
            (bin.amplitude * 100.0).round() as u32,
            if bin.threat { " !" } else { "" }
        );
    }
    out
}

pub fn render_metrics_panel(metrics: &SystemMetrics, detailed: bool) -> String {
    let mut out = String::from("-- System Performance --\n");
    let _ = writeln!(
        out,
        "accuracy {}% | response {}s | cameras {}/{} | threats {} | alerts {}",
        metrics.overall_accuracy,
        metrics.response_time_avg,
        metrics.active_cameras,
        metrics.total_cameras,
        metrics.threats_detected,
        metrics.alerts_sent
    );
    let _ = writeln!(
        out,
        "cpu {}% [{}] | memory {}% [{}] | latency {}ms [{}]",
        metrics.cpu_usage,
        cpu_health(metrics.cpu_usage).label(),
        metrics.memory_usage,
        memory_health(metrics.memory_usage).label(),
        metrics.network_latency,
        latency_health(metrics.network_latency).label()
    );

    if detailed {
        out.push_str("time  accuracy cpu threats\n");
        for point in fixtures::PERFORMANCE_HISTORY.iter() {
            let _ = writeln!(
                out,
                "{} {:>7}% {:>2}% {:>7}",
                point.time, point.accuracy, point.cpu, point.threats
            );
        }
    }
    out
}

pub fn render_alert_panel(alerts: &[Alert]) -> String {
    let mut out = String::from("-- Recent Alerts --\n");
    if alerts.is_empty() {
        out.push_str("No recent alerts\nSystem is monitoring silently\n");
        return out;
    }

    for alert in alerts {
        let _ = writeln!(
            out,
            "[{}] {} | {} | response {}s | {}",
            alert.status.as_str().to_uppercase(),
            alert.message,
            alert.id,
            alert.response_time,
            alert.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
    }
    out
}

pub fn render_camera_panel() -> String {
    let mut out = String::from("-- Live Feeds --\n");
    for camera in fixtures::CAMERA_FEEDS.iter() {
        let status = match camera.status {
            CameraStatus::Active => "active",
            CameraStatus::Maintenance => "maintenance",
        };
        let _ = writeln!(
            out,
            "{} {:<16} {:<22} {:<11} threats {}",
            camera.id, camera.name, camera.location, status, camera.threats
        );
    }
    out
}

pub fn render_contact_panel() -> String {
    let mut out = String::from("-- Emergency Contacts --\n");
    for contact in fixtures::EMERGENCY_CONTACTS.iter() {
        let _ = writeln!(
            out,
            "{:<17} {:<12} {:<22} {:?}",
            contact.name, contact.phone, contact.email, contact.role
        );
    }
    out
}

pub fn render_incident_panel(now: DateTime<Utc>) -> String {
    let mut out = String::from("-- Incident History --\n");
    for incident in fixtures::recent_incidents(now) {
        let _ = writeln!(
            out,
            "{} {} {} [{}] {:?} response {}s confidence {}% ({} min ago)",
            incident.id,
            incident.kind,
            incident.location,
            incident.severity,
            incident.status,
            incident.response_time,
            incident.confidence,
            (now - incident.timestamp).num_minutes()
        );
    }
    out
}

pub fn render_settings_panel(dashboard: &Dashboard) -> String {
    let settings = dashboard.settings();
    let mut out = String::from("-- System Settings --\n");
    let _ = writeln!(out, "detection sensitivity {}%", settings.detection_sensitivity);
    let _ = writeln!(out, "alert threshold {}%", settings.alert_threshold);
    let _ = writeln!(
        out,
        "silent mode {} | auto response {} | recording {} | audio analysis {}",
        on_off(settings.silent_mode),
        on_off(settings.auto_response),
        on_off(settings.recording_enabled),
        on_off(settings.audio_analysis)
    );
    out
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
