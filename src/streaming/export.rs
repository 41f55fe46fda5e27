//! Simulation event export

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use super::ExportFormat;
use crate::core::{SimulationEvent, Subscriber};

const CSV_HEADER: &str = "recorded_at,kind,summary";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRecord<'a> {
    recorded_at: DateTime<Utc>,
    event: &'a SimulationEvent,
}

/// Appends every received event to a file under the export directory.
///
/// The file is opened on the first event, so a run that emits nothing
/// leaves no empty file behind.
pub struct EventExporter {
    dir: PathBuf,
    format: ExportFormat,
    file: Mutex<Option<(PathBuf, BufWriter<File>)>>,
    count: AtomicUsize,
}

impl EventExporter {
    pub fn create(dir: &Path, format: ExportFormat) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            format,
            file: Mutex::new(None),
            count: AtomicUsize::new(0),
        })
    }

    /// Export a single event
    pub fn export(&self, event: &SimulationEvent) -> Result<()> {
        let mut file_lock = self.file.lock();

        if file_lock.is_none() {
            let path = self.next_filename();
            let mut writer = BufWriter::new(open_export_file(&path)?);
            if self.format == ExportFormat::Csv {
                writeln!(writer, "{}", CSV_HEADER)?;
            }
            info!("Exporting simulation events to {:?}", path);
            *file_lock = Some((path, writer));
        }

        if let Some((_, ref mut writer)) = *file_lock {
            let recorded_at = Utc::now();
            match self.format {
                ExportFormat::Json => {
                    let json = serde_json::to_string(&ExportRecord { recorded_at, event })?;
                    writeln!(writer, "{}", json)?;
                }
                ExportFormat::Csv => {
                    writeln!(
                        writer,
                        "{},{},{}",
                        recorded_at.to_rfc3339(),
                        event.kind(),
                        csv_summary(event)
                    )?;
                }
            }
            writer.flush()?;
        }

        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn exported_count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Path of the current export file, once one has been opened
    pub fn current_path(&self) -> Option<PathBuf> {
        self.file.lock().as_ref().map(|(path, _)| path.clone())
    }

    /// Flush and close the current file; the next event opens a new one
    pub fn close(&self) -> Result<()> {
        if let Some((_, mut writer)) = self.file.lock().take() {
            writer.flush()?;
        }
        Ok(())
    }

    fn next_filename(&self) -> PathBuf {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S%.3f");
        self.dir
            .join(format!("events_{}.{}", timestamp, self.format.extension()))
    }
}

impl Subscriber for EventExporter {
    fn on_event(&self, event: &SimulationEvent) -> Result<()> {
        self.export(event)
    }
}

fn open_export_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow!("Failed to open export file {:?}: {}", path, e))
}

/// Semicolon-joined `key=value` pairs, so the summary never contains a comma
fn csv_summary(event: &SimulationEvent) -> String {
    match event {
        SimulationEvent::ThreatDetected(t) => format!(
            "id={};type={};camera={};severity={};confidence={};x={};y={}",
            t.id,
            t.kind,
            t.camera_id,
            t.severity.as_str(),
            t.confidence,
            t.coordinates.x,
            t.coordinates.y
        ),
        SimulationEvent::MetricsUpdate(m) => format!(
            "accuracy={};cpu={};memory={};latency={};response={}",
            m.accuracy, m.cpu_usage, m.memory_usage, m.network_latency, m.response_time
        ),
        SimulationEvent::AudioUpdate(bins) => bins
            .iter()
            .map(|b| format!("{}={:.3}{}", b.frequency, b.amplitude, if b.threat { "!" } else { "" }))
            .collect::<Vec<_>>()
            .join(";"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{AudioBin, MetricsSample};

    fn metrics() -> SimulationEvent {
        SimulationEvent::MetricsUpdate(MetricsSample {
            accuracy: 90,
            cpu_usage: 31,
            memory_usage: 66,
            network_latency: 14,
            response_time: 22,
        })
    }

    fn audio() -> SimulationEvent {
        SimulationEvent::AudioUpdate(vec![
            AudioBin { frequency: 100, amplitude: 0.25, threat: false },
            AudioBin { frequency: 200, amplitude: 0.5, threat: true },
        ])
    }

    #[test]
    fn test_no_file_until_first_event() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = EventExporter::create(dir.path(), ExportFormat::Json).unwrap();
        assert!(exporter.current_path().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = EventExporter::create(dir.path(), ExportFormat::Json).unwrap();
        exporter.export(&metrics()).unwrap();
        exporter.on_event(&audio()).unwrap();
        assert_eq!(exporter.exported_count(), 2);

        let path = exporter.current_path().unwrap();
        assert_eq!(path.extension().unwrap(), "jsonl");
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0]["recordedAt"].is_string());
        assert_eq!(lines[0]["event"]["kind"], "metrics_update");
        assert_eq!(lines[0]["event"]["payload"]["cpuUsage"], 31);
        assert_eq!(lines[1]["event"]["kind"], "audio_update");
    }

    #[test]
    fn test_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = EventExporter::create(&dir.path().join("out"), ExportFormat::Csv).unwrap();
        exporter.export(&metrics()).unwrap();
        exporter.export(&audio()).unwrap();
        exporter.close().unwrap();
        assert!(exporter.current_path().is_none());

        let path = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].ends_with(",metrics_update,accuracy=90;cpu=31;memory=66;latency=14;response=22"));
        assert!(lines[2].ends_with(",audio_update,100=0.250;200=0.500!"));
        assert!(lines.iter().all(|l| l.split(',').count() == 3));
    }
}
