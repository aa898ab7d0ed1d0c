//! Propeller signature classifier with temporal smoothing.

use diveguard_signal::SpectralFeatures;

use super::rules::{best_match, score_all};
use crate::domain::{RingBuffer, SignatureTable, VesselClassification, VesselType};
use crate::{Result, ThreatError};

/// Number of raw classifications averaged into the smoothed output
pub const CLASSIFIER_HISTORY: usize = 5;

/// Configuration for the vessel classifier
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassifierConfig {
    /// Confidence at which a classification is trusted
    pub confidence_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
        }
    }
}

impl ClassifierConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ThreatError::Config(format!(
                "confidence threshold {} outside [0, 1]",
                self.confidence_threshold
            )));
        }
        Ok(())
    }
}

/// Scores spectral features against the signature table and smooths the
/// result over the last [`CLASSIFIER_HISTORY`] classifications.
#[derive(Debug, Clone)]
pub struct VesselClassifier {
    config: ClassifierConfig,
    table: &'static SignatureTable,
    history: RingBuffer<VesselClassification, CLASSIFIER_HISTORY>,
}

impl VesselClassifier {
    /// Create a classifier over the standard signature table
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            table: SignatureTable::standard(),
            history: RingBuffer::new(),
        })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: ClassifierConfig::default(),
            table: SignatureTable::standard(),
            history: RingBuffer::new(),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one block and return the smoothed classification.
    ///
    /// Insufficient-data features yield [`VesselClassification::unknown`]
    /// and leave the history untouched.
    pub fn classify(&mut self, features: &SpectralFeatures) -> VesselClassification {
        if !features.is_complete() {
            tracing::debug!("No acoustic signature, classification unknown");
            return VesselClassification::unknown();
        }

        let raw = self.classify_single(features);
        tracing::debug!(
            vessel = %raw.vessel_type,
            confidence = raw.confidence,
            rpm = raw.rpm_estimate,
            "Raw propeller classification"
        );
        self.history.push(raw);
        self.smoothed()
    }

    /// Unsmoothed classification of one feature set
    pub fn classify_single(&self, features: &SpectralFeatures) -> VesselClassification {
        let scores = score_all(features, self.table);
        let (vessel_type, score) = best_match(&scores);

        let bpf = features.bpf_hz;
        let rpm_estimate = estimate_rpm(bpf, self.table.typical_blades(vessel_type));
        let blade_count = estimate_blade_count(bpf, rpm_estimate);

        VesselClassification {
            vessel_type,
            confidence: score.clamp(0.0, 1.0),
            rpm_estimate,
            blade_count,
            cavitation_level: features.cavitation_level,
            threat_level: threat_level(vessel_type, features.cavitation_level),
        }
    }

    /// Smoothed view of the current history
    pub fn smoothed(&self) -> VesselClassification {
        smooth(&self.history)
    }

    /// Number of raw classifications retained
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Most recent raw classification
    pub fn last(&self) -> Option<&VesselClassification> {
        self.history.latest()
    }

    /// Forget the smoothing history
    pub fn reset(&mut self) {
        self.history.clear();
    }
}

/// `bpf * 60 / blades`, 0 below 1 Hz
pub fn estimate_rpm(bpf_hz: f64, typical_blades: u8) -> f64 {
    if bpf_hz < 1.0 || typical_blades == 0 {
        return 0.0;
    }
    bpf_hz * 60.0 / f64::from(typical_blades)
}

/// `round(bpf * 60 / rpm)` clamped to [2, 8], 0 below 1 RPM
pub fn estimate_blade_count(bpf_hz: f64, rpm: f64) -> u8 {
    if rpm < 1.0 {
        return 0;
    }
    let blades = (bpf_hz * 60.0 / rpm.max(1.0)).round().max(1.0);
    blades.clamp(2.0, 8.0) as u8
}

/// Base threat of the archetype raised by cavitation, capped at 10
pub fn threat_level(vessel: VesselType, cavitation_level: f64) -> u8 {
    let base = vessel.base_threat();
    let bump = if cavitation_level > 0.3 {
        2
    } else if cavitation_level > 0.1 {
        1
    } else {
        0
    };
    (base + bump).min(10)
}

fn smooth(history: &RingBuffer<VesselClassification, CLASSIFIER_HISTORY>) -> VesselClassification {
    if history.is_empty() {
        return VesselClassification::unknown();
    }
    let n = history.len() as f64;

    let mean = |f: fn(&VesselClassification) -> f64| history.iter().map(f).sum::<f64>() / n;

    let blades: Vec<f64> = history
        .iter()
        .filter(|c| c.blade_count > 0)
        .map(|c| f64::from(c.blade_count))
        .collect();
    let blade_count = if blades.is_empty() {
        0
    } else {
        (blades.iter().sum::<f64>() / blades.len() as f64) as u8
    };

    VesselClassification {
        vessel_type: majority_vessel(history),
        confidence: mean(|c| c.confidence),
        rpm_estimate: mean(|c| c.rpm_estimate),
        blade_count,
        cavitation_level: mean(|c| c.cavitation_level),
        threat_level: mean(|c| f64::from(c.threat_level)) as u8,
    }
}

/// Most frequent vessel type; ties go to the type seen most recently.
fn majority_vessel(history: &RingBuffer<VesselClassification, CLASSIFIER_HISTORY>) -> VesselType {
    let mut best = (VesselType::Unknown, 0usize);
    // Newest first, so an equal count never displaces a more recent type
    for candidate in history.iter().rev().map(|c| c.vessel_type) {
        let count = history.iter().filter(|c| c.vessel_type == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}
