//! Admin panel settings

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{name} must be between 0 and 100, got {value}")]
    OutOfRange { name: &'static str, value: u8 },
}

/// Boolean switches exposed by the admin panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingToggle {
    SilentMode,
    AutoResponse,
    RecordingEnabled,
    AudioAnalysis,
}

/// Admin-controlled system settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    /// Detection sensitivity percent
    pub detection_sensitivity: u8,
    /// Minimum threat confidence that raises an alert
    pub alert_threshold: u8,
    pub silent_mode: bool,
    pub auto_response: bool,
    pub recording_enabled: bool,
    /// When off, live audio updates are ignored
    pub audio_analysis: bool,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            detection_sensitivity: 85,
            alert_threshold: 75,
            silent_mode: true,
            auto_response: true,
            recording_enabled: true,
            audio_analysis: true,
        }
    }
}

impl AdminSettings {
    pub fn set_detection_sensitivity(&mut self, value: u8) -> Result<(), SettingsError> {
        self.detection_sensitivity = percent("detection_sensitivity", value)?;
        Ok(())
    }

    pub fn set_alert_threshold(&mut self, value: u8) -> Result<(), SettingsError> {
        self.alert_threshold = percent("alert_threshold", value)?;
        Ok(())
    }

    pub fn get(&self, toggle: SettingToggle) -> bool {
        match toggle {
            SettingToggle::SilentMode => self.silent_mode,
            SettingToggle::AutoResponse => self.auto_response,
            SettingToggle::RecordingEnabled => self.recording_enabled,
            SettingToggle::AudioAnalysis => self.audio_analysis,
        }
    }

    pub fn set(&mut self, toggle: SettingToggle, value: bool) {
        let slot = match toggle {
            SettingToggle::SilentMode => &mut self.silent_mode,
            SettingToggle::AutoResponse => &mut self.auto_response,
            SettingToggle::RecordingEnabled => &mut self.recording_enabled,
            SettingToggle::AudioAnalysis => &mut self.audio_analysis,
        };
        *slot = value;
    }

    /// Flip a switch and return its new value
    pub fn toggle(&mut self, toggle: SettingToggle) -> bool {
        let value = !self.get(toggle);
        self.set(toggle, value);
        value
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        percent("detection_sensitivity", self.detection_sensitivity)?;
        percent("alert_threshold", self.alert_threshold)?;
        Ok(())
    }
}

fn percent(name: &'static str, value: u8) -> Result<u8, SettingsError> {
    if value <= 100 {
        Ok(value)
    } else {
        Err(SettingsError::OutOfRange { name, value })
    }
}
