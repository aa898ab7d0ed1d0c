//! Per-cycle sensor fusion.
//!
//! One cycle runs predict → range update → acoustic update → read-out →
//! heading correction. The cycle works on a copy of the estimator and
//! swaps it in only when every step succeeded.

use diveguard_signal::{AcousticBuffer, FeatureExtractor, SpectralFeatures};

use crate::domain::{absolute_azimuth, validate_heading, FusedThreat, RangeBearing, RingBuffer};
use crate::tracking::{EstimatorConfig, KinematicEstimator};
use crate::{Result, ThreatError};

/// Fused states retained for inspection (one minute at 10 Hz)
pub const FUSION_HISTORY: usize = 600;

/// Configuration for the fusion orchestrator
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FusionConfig {
    /// Nominal cycle period (s)
    pub dt_secs: f64,
    /// Strongest peaks handed to the acoustic update
    pub acoustic_peak_limit: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            dt_secs: 0.1,
            acoustic_peak_limit: 5,
        }
    }
}

impl FusionConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.dt_secs.is_finite() || self.dt_secs <= 0.0 {
            return Err(ThreatError::Config(format!(
                "cycle period must be positive, got {}",
                self.dt_secs
            )));
        }
        if self.acoustic_peak_limit == 0 {
            return Err(ThreatError::Config("acoustic peak limit must be at least 1".into()));
        }
        Ok(())
    }
}

/// Sequences the estimator steps of one processing cycle
#[derive(Debug, Clone)]
pub struct FusionEngine {
    config: FusionConfig,
    estimator: KinematicEstimator,
    extractor: FeatureExtractor,
    history: RingBuffer<FusedThreat, FUSION_HISTORY>,
    cycles: u64,
}

impl FusionEngine {
    /// Create a fusion engine
    pub fn new(
        config: FusionConfig,
        estimator: EstimatorConfig,
        extractor: FeatureExtractor,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            estimator: KinematicEstimator::new(estimator)?,
            extractor,
            history: RingBuffer::new(),
            cycles: 0,
        })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: FusionConfig::default(),
            estimator: KinematicEstimator::with_defaults(),
            extractor: FeatureExtractor::with_defaults(),
            history: RingBuffer::new(),
            cycles: 0,
        }
    }

    /// Get configuration
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// The underlying estimator
    pub fn estimator(&self) -> &KinematicEstimator {
        &self.estimator
    }

    /// Feature extractor used for raw acoustic buffers
    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Run one cycle from a raw acoustic buffer.
    pub fn fuse(
        &mut self,
        range: Option<&RangeBearing>,
        acoustic: Option<AcousticBuffer<'_>>,
        heading_deg: Option<f64>,
    ) -> Result<FusedThreat> {
        let features = match acoustic {
            Some(buffer) => self.extractor.extract(buffer)?,
            None => SpectralFeatures::insufficient(),
        };
        self.fuse_features(range, &features, heading_deg)
    }

    /// Run one cycle from already extracted spectral features.
    ///
    /// Malformed readings are rejected before anything runs; a numerical
    /// failure in any step discards the whole cycle.
    pub fn fuse_features(
        &mut self,
        range: Option<&RangeBearing>,
        features: &SpectralFeatures,
        heading_deg: Option<f64>,
    ) -> Result<FusedThreat> {
        if let Some(reading) = range {
            reading.validate()?;
        }
        if let Some(heading) = heading_deg {
            validate_heading(heading)?;
        }

        let mut candidate = self.estimator.clone();
        candidate.predict(self.config.dt_secs)?;

        if let Some(reading) = range {
            candidate.update_range(
                reading.distance_m,
                reading.azimuth_rad(),
                reading.elevation_rad(),
            )?;
        }

        if features.is_complete() {
            let ranked = features.ranked_peaks(self.config.acoustic_peak_limit);
            candidate.update_acoustic(&ranked)?;
        }

        let mut fused = candidate.read_out();
        if let Some(heading) = heading_deg {
            fused.azimuth_deg = absolute_azimuth(fused.azimuth_deg, heading);
        }

        self.estimator = candidate;
        self.history.push(fused);
        self.cycles += 1;

        tracing::debug!(
            cycle = self.cycles,
            distance_m = fused.distance_m,
            azimuth_deg = fused.azimuth_deg,
            closing_mps = fused.closing_speed_mps,
            "Fused threat state"
        );
        Ok(fused)
    }

    /// State produced by the last successful cycle
    pub fn previous(&self) -> Option<&FusedThreat> {
        self.history.latest()
    }

    /// Retained fused states, oldest first
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &FusedThreat> + '_ {
        self.history.iter()
    }

    /// Number of retained fused states
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Successful cycles since creation or reset
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Return the estimator to its prior and drop the history
    pub fn reset(&mut self) {
        self.estimator.reset();
        self.history.clear();
        self.cycles = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MeasurementError;
    use std::f64::consts::PI;

    fn boat_block(n: usize) -> Vec<i16> {
        (0..n)
            .map(|i| {
                let t = i as f64 / 48_000.0;
                let v = (2.0 * PI * 100.0 * t).sin()
                    + 0.5 * (2.0 * PI * 200.0 * t).sin()
                    + 0.3 * (2.0 * PI * 300.0 * t).sin();
                (v * 0.4 * 32767.0) as i16
            })
            .collect()
    }

    #[test]
    fn test_cycle_without_measurements_only_predicts() {
        let mut engine = FusionEngine::with_defaults();
        let fused = engine.fuse(None, None, None).unwrap();

        // 100 m closing at 1 m/s for 0.1 s
        assert!((fused.distance_m - 99.9).abs() < 1e-9);
        assert!((fused.timestamp_secs - 0.1).abs() < 1e-12);
        assert_eq!(engine.history_len(), 1);
        assert_eq!(engine.previous(), Some(&fused));
    }

    #[test]
    fn test_range_fix_dominates_prior() {
        let mut engine = FusionEngine::with_defaults();
        let reading = RangeBearing::new(150.5, 45.2, -10.0);
        let mut fused = engine.fuse(Some(&reading), None, None).unwrap();
        for _ in 0..20 {
            fused = engine.fuse(Some(&reading), None, None).unwrap();
        }

        assert!((fused.distance_m - 150.5).abs() < 2.0, "distance {}", fused.distance_m);
        assert!((fused.azimuth_deg - 45.2).abs() < 1.0, "azimuth {}", fused.azimuth_deg);
        assert!((fused.elevation_deg + 10.0).abs() < 1.0, "elevation {}", fused.elevation_deg);
    }

    #[test]
    fn test_acoustic_update_from_buffer() {
        let mut engine = FusionEngine::with_defaults();
        let block = boat_block(4800);
        engine.fuse(None, Some(AcousticBuffer::Pcm16(&block)), None).unwrap();

        // 100 Hz BPF matches the Doppler reference: vx pulled from -1 toward 0
        let vx = engine.estimator().state().x[3];
        assert!(vx > -0.1 && vx < 0.0, "vx = {}", vx);
    }

    #[test]
    fn test_short_buffer_skips_acoustic_update() {
        let mut engine = FusionEngine::with_defaults();
        let block = boat_block(511);
        engine.fuse(None, Some(AcousticBuffer::Pcm16(&block)), None).unwrap();
        assert!((engine.estimator().state().x[3] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_heading_correction_wraps() {
        let mut engine = FusionEngine::with_defaults();
        let reading = RangeBearing::new(100.0, 350.0, 0.0);
        let relative = {
            let mut probe = engine.clone();
            probe.fuse(Some(&reading), None, None).unwrap().azimuth_deg
        };
        let fused = engine.fuse(Some(&reading), None, Some(20.0)).unwrap();

        let expected = (relative + 20.0) % 360.0;
        assert!((fused.azimuth_deg - expected).abs() < 1e-9);
        assert!(fused.azimuth_deg < 20.0);
    }

    #[test]
    fn test_malformed_reading_rejected_without_mutation() {
        let mut engine = FusionEngine::with_defaults();
        engine.fuse(None, None, None).unwrap();
        let before = engine.estimator().state().clone();

        let bad = RangeBearing::new(-5.0, 0.0, 0.0);
        let err = engine.fuse(Some(&bad), None, None).unwrap_err();
        assert!(matches!(
            err,
            ThreatError::Measurement(MeasurementError::InvalidRange(_))
        ));
        assert!(engine.fuse(None, None, Some(f64::NAN)).is_err());

        assert_eq!(engine.estimator().state(), &before);
        assert_eq!(engine.history_len(), 1);
        assert_eq!(engine.cycles(), 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut engine = FusionEngine::with_defaults();
        for _ in 0..(FUSION_HISTORY + 50) {
            engine.fuse(None, None, None).unwrap();
        }
        assert_eq!(engine.history_len(), FUSION_HISTORY);
        assert_eq!(engine.cycles(), (FUSION_HISTORY + 50) as u64);

        engine.reset();
        assert_eq!(engine.history_len(), 0);
        assert!(engine.previous().is_none());
    }
}
