// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Configuration module

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::core::EngineError;
use crate::dashboard::AdminSettings;
use crate::simulation::DEFAULT_AUDIO_THREAT_PROBABILITY;
use crate::streaming::ExportConfig;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Log level
    pub log_level: String,

    /// Simulation engine configuration
    pub simulation: SimulationConfig,

    /// Dashboard configuration
    pub dashboard: DashboardConfig,

    /// Event export configuration
    pub export: ExportConfig,

    /// Admin panel settings
    pub admin: AdminSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: crate::NAME.to_string(),
            log_level: "info".to_string(),
            simulation: SimulationConfig::default(),
            dashboard: DashboardConfig::default(),
            export: ExportConfig::default(),
            admin: AdminSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {:?}", path))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.admin.validate()?;
        Ok(())
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("emergency-sim"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Simulation engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Clock period in milliseconds
    pub tick_period_ms: u64,

    /// Chance of a threat per tick
    pub threat_probability: f64,

    /// Chance that an audio band is flagged
    pub audio_threat_probability: f64,

    /// Seed for a reproducible run; entropy when unset
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 2000,
            threat_probability: 0.1,
            audio_threat_probability: DEFAULT_AUDIO_THREAT_PROBABILITY,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.tick_period_ms == 0 {
            return Err(EngineError::InvalidPeriod);
        }
        check_probability("threat_probability", self.threat_probability)?;
        check_probability("audio_threat_probability", self.audio_threat_probability)?;
        Ok(())
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), EngineError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::InvalidProbability { name, value })
    }
}

/// Dashboard retention configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Most recent threats kept
    pub threat_history: usize,

    /// Most recent alerts kept
    pub alert_history: usize,

    /// Seed for alert response times
    pub seed: Option<u64>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            threat_history: 10,
            alert_history: 5,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.simulation.tick_period(), Duration::from_millis(2000));
        assert_eq!(config.simulation.threat_probability, 0.1);
        assert_eq!(config.simulation.audio_threat_probability, 0.2);
        assert_eq!(config.dashboard.threat_history, 10);
        assert_eq!(config.dashboard.alert_history, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.simulation.seed = Some(42);
        config.simulation.tick_period_ms = 250;

        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[simulation]\nthreat_probability = 0.5\n").unwrap();
        assert_eq!(config.simulation.threat_probability, 0.5);
        assert_eq!(config.simulation.tick_period_ms, 2000);
        assert_eq!(config.admin, AdminSettings::default());
    }

    #[test]
    fn test_validation_errors() {
        let mut sim = SimulationConfig::default();
        sim.tick_period_ms = 0;
        assert_eq!(sim.validate(), Err(EngineError::InvalidPeriod));

        let sim = SimulationConfig {
            audio_threat_probability: -0.1,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            sim.validate(),
            Err(EngineError::InvalidProbability { name: "audio_threat_probability", .. })
        ));
    }

    #[test]
    fn test_load_or_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_or_create(&path).unwrap();
        assert!(path.exists());

        let loaded = Config::load_or_create(&path).unwrap();
        assert_eq!(created, loaded);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[simulation]\nthreat_probability = 2.0\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
