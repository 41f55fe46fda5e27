// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Emergency Sim - simulated AI emergency detection backend
//!
//! A timer-driven engine that fabricates plausible detection activity and
//! fans it out to in-process subscribers:
//! - `threat_detected` events with a configurable per-tick probability
//! - `metrics_update` samples every tick
//! - `audio_update` frequency spectra every tick
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                  Simulation Engine                     │
//! ├───────────────────────────────────────────────────────┤
//! │  ┌─────────┐   ┌───────────┐   ┌──────────────────┐   │
//! │  │ Ticker  │ → │ Generator │ → │  Subscriber Set  │   │
//! │  └─────────┘   └───────────┘   └──────────────────┘   │
//! │                                   ↓      ↓      ↓     │
//! │                          Dashboard  Exporter  Broadcast│
//! └───────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod dashboard;
pub mod fixtures;
pub mod simulation;
pub mod streaming;

// Re-exports for convenience
pub use config::{Config, DashboardConfig, SimulationConfig};
pub use core::{EngineError, EngineStatus, EventKind, SimulationEngine, SimulationEvent, Subscriber, SubscriptionId};
pub use dashboard::{AdminSettings, Dashboard, SystemMetrics};
pub use simulation::{AudioBin, MetricsSample, Severity, ThreatEvent, ThreatKind};
pub use streaming::{EventExporter, ExportConfig, ExportFormat};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = "emergency-sim";
