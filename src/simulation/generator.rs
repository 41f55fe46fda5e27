// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Event generator for demo/testing

use chrono::{DateTime, Utc};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use super::{
    AudioBin, Coordinates, MetricsSample, Severity, ThreatEvent, ThreatKind, AUDIO_FREQUENCIES,
    DEFAULT_AUDIO_THREAT_PROBABILITY, FRAME_HEIGHT, FRAME_WIDTH, THREAT_CAMERAS,
};

/// Produces synthetic payloads from a single random stream.
///
/// Every value is derived from uniform draws in `[0, 1)` so a seeded generator
/// replays the exact same sequence of events (apart from wall-clock fields).
pub struct EventGenerator {
    rng: ChaCha8Rng,
    audio_threat_probability: f64,
    last_threat_millis: i64,
}

impl EventGenerator {
    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(ChaCha8Rng::from_entropy())
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        Self {
            rng,
            audio_threat_probability: DEFAULT_AUDIO_THREAT_PROBABILITY,
            last_threat_millis: i64::MIN,
        }
    }

    /// Override the chance that an audio band is flagged
    pub fn with_audio_threat_probability(mut self, probability: f64) -> Self {
        self.audio_threat_probability = probability;
        self
    }

    /// Draw once and decide whether this cycle carries a threat
    pub fn roll_threat(&mut self, probability: f64) -> bool {
        self.uniform() < probability
    }

    pub fn threat(&mut self, now: DateTime<Utc>) -> ThreatEvent {
        let kind = self.pick(&ThreatKind::ALL);
        let camera = self.pick(&THREAT_CAMERAS);
        let severity = self.pick(&Severity::ALL);
        let confidence = 80 + self.scaled(20) as u8;
        let coordinates = Coordinates {
            x: self.scaled(FRAME_WIDTH),
            y: self.scaled(FRAME_HEIGHT),
        };

        // ids are time based; bump within the same millisecond
        let millis = now.timestamp_millis().max(self.last_threat_millis.saturating_add(1));
        self.last_threat_millis = millis;

        ThreatEvent {
            id: format!("THR_{}", millis),
            kind,
            camera_id: camera.to_string(),
            severity,
            confidence,
            timestamp: now,
            coordinates,
        }
    }

    pub fn metrics(&mut self) -> MetricsSample {
        MetricsSample {
            accuracy: 90 + self.scaled(5),
            cpu_usage: 30 + self.scaled(8),
            memory_usage: 65 + self.scaled(10),
            network_latency: 10 + self.scaled(8),
            response_time: 20 + self.scaled(10),
        }
    }

    pub fn audio(&mut self) -> Vec<AudioBin> {
        AUDIO_FREQUENCIES
            .iter()
            .map(|&frequency| {
                let amplitude = self.uniform();
                let threat = self.uniform() < self.audio_threat_probability;
                AudioBin {
                    frequency,
                    amplitude,
                    threat,
                }
            })
            .collect()
    }

    fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// floor(u * n), clamped so float rounding never yields `n`
    fn scaled(&mut self, n: u32) -> u32 {
        ((self.uniform() * n as f64) as u32).min(n - 1)
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.scaled(items.len() as u32) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_within_bounds() {
        let mut gen = EventGenerator::from_seed(7);
        for _ in 0..2000 {
            let m = gen.metrics();
            assert!((90..=94).contains(&m.accuracy));
            assert!((30..=37).contains(&m.cpu_usage));
            assert!((65..=74).contains(&m.memory_usage));
            assert!((10..=17).contains(&m.network_latency));
            assert!((20..=29).contains(&m.response_time));
        }
    }

    #[test]
    fn test_threat_fields_within_bounds() {
        let mut gen = EventGenerator::from_seed(11);
        let now = Utc::now();
        for _ in 0..1000 {
            let t = gen.threat(now);
            assert!((80..=99).contains(&t.confidence));
            assert!(t.coordinates.x < FRAME_WIDTH);
            assert!(t.coordinates.y < FRAME_HEIGHT);
            assert!(THREAT_CAMERAS.contains(&t.camera_id.as_str()));
            assert_eq!(t.timestamp, now);
        }
    }

    #[test]
    fn test_threat_ids_unique_within_millisecond() {
        let mut gen = EventGenerator::from_seed(3);
        let now = Utc::now();
        let a = gen.threat(now);
        let b = gen.threat(now);
        assert_ne!(a.id, b.id);
        assert_eq!(a.id, format!("THR_{}", now.timestamp_millis()));
        assert!(b.id.starts_with("THR_"));
    }

    #[test]
    fn test_audio_bands() {
        let mut gen = EventGenerator::from_seed(5);
        let bins = gen.audio();
        let freqs: Vec<u32> = bins.iter().map(|b| b.frequency).collect();
        assert_eq!(freqs, AUDIO_FREQUENCIES.to_vec());
        assert!(bins.iter().all(|b| (0.0..1.0).contains(&b.amplitude)));
    }

    #[test]
    fn test_audio_threat_probability_extremes() {
        let mut never = EventGenerator::from_seed(1).with_audio_threat_probability(0.0);
        let mut always = EventGenerator::from_seed(1).with_audio_threat_probability(1.0);
        assert!(never.audio().iter().all(|b| !b.threat));
        assert!(always.audio().iter().all(|b| b.threat));
    }

    #[test]
    fn test_audio_threat_rate_near_default() {
        let mut gen = EventGenerator::from_seed(2020);
        let bins: Vec<AudioBin> = (0..1000).flat_map(|_| gen.audio()).collect();
        let flagged = bins.iter().filter(|b| b.threat).count();
        let share = flagged as f64 / bins.len() as f64;

        // 8000 draws at p = 0.2, sd ~0.0045
        assert!((0.18..=0.22).contains(&share), "share = {}", share);
    }

    #[test]
    fn test_all_kinds_eventually_drawn() {
        let mut gen = EventGenerator::from_seed(99);
        let now = Utc::now();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(gen.threat(now).kind);
        }
        assert_eq!(seen.len(), ThreatKind::ALL.len());
    }
}
