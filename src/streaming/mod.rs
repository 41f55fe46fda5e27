//! Streaming module - event export

mod export;

pub use export::*;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Export format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "jsonl",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Event export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Record every simulation event to disk
    pub enabled: bool,
    pub format: ExportFormat,
    /// Directory receiving export files
    pub path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            format: ExportFormat::Json,
            path: PathBuf::from("./data"),
        }
    }
}
