//! Per-cycle threat pipeline.
//!
//! Feature extraction → fusion → classification → assessment, plus the
//! bookkeeping counters exposed to observability tooling.

use std::time::{Duration, Instant};

use diveguard_signal::{AcousticBuffer, FeatureExtractor};

use crate::assessment::ThreatAssessmentEngine;
use crate::classification::VesselClassifier;
use crate::domain::{
    EvasionManeuver, RangeBearing, RingBuffer, RiskTrend, ThreatAssessment, VesselClassification,
};
use crate::fusion::FusionEngine;
use crate::{DiveGuardConfig, Result};

/// Cycle latencies kept for statistics
pub const LATENCY_WINDOW: usize = 100;

/// Inputs of one processing cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorFrame<'a> {
    /// Sonar reading, if one arrived this cycle
    pub range: Option<RangeBearing>,
    /// Hydrophone block, if one arrived this cycle
    pub acoustic: Option<AcousticBuffer<'a>>,
    /// Compass heading (degrees), if available
    pub heading_deg: Option<f64>,
}

impl<'a> SensorFrame<'a> {
    /// Frame with a sonar reading and an acoustic block
    pub fn new(range: RangeBearing, acoustic: AcousticBuffer<'a>) -> Self {
        Self {
            range: Some(range),
            acoustic: Some(acoustic),
            heading_deg: None,
        }
    }

    /// Attach a compass heading
    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.heading_deg = Some(heading_deg);
        self
    }
}

/// Aggregate counters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineStatistics {
    /// Assessments with risk level 1 or more
    pub threats_detected: u64,
    /// Assessments at or above the critical risk level
    pub critical_events: u64,
    /// Cycles discarded because of an error
    pub failed_cycles: u64,
    /// Mean latency over the latency window (ms)
    pub avg_processing_ms: f64,
    /// Worst latency over the latency window (ms)
    pub max_processing_ms: f64,
    /// Fused states retained by the orchestrator
    pub fusion_history_len: usize,
    /// Risk direction over the assessment history
    pub risk_trend: RiskTrend,
}

/// Complete detection pipeline
#[derive(Debug, Clone)]
pub struct ThreatPipeline {
    config: DiveGuardConfig,
    fusion: FusionEngine,
    classifier: VesselClassifier,
    assessor: ThreatAssessmentEngine,
    threats_detected: u64,
    critical_events: u64,
    failed_cycles: u64,
    latencies: RingBuffer<Duration, LATENCY_WINDOW>,
}

impl ThreatPipeline {
    /// Build a pipeline, validating every component's configuration
    pub fn new(config: DiveGuardConfig) -> Result<Self> {
        let extractor = FeatureExtractor::new(config.extractor.clone())?;
        let fusion = FusionEngine::new(config.fusion.clone(), config.estimator.clone(), extractor)?;
        let classifier = VesselClassifier::new(config.classifier.clone())?;
        let assessor = ThreatAssessmentEngine::new(config.assessment.clone())?;

        tracing::info!(
            sample_rate_hz = config.extractor.sample_rate_hz,
            dt_secs = config.fusion.dt_secs,
            "DiveGuard pipeline ready"
        );

        Ok(Self {
            config,
            fusion,
            classifier,
            assessor,
            threats_detected: 0,
            critical_events: 0,
            failed_cycles: 0,
            latencies: RingBuffer::new(),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &DiveGuardConfig {
        &self.config
    }

    /// Run one cycle. Failures are logged and yield `None`; no component
    /// state changes on a failed cycle.
    pub fn process(&mut self, frame: SensorFrame<'_>) -> Option<ThreatAssessment> {
        match self.try_process(frame) {
            Ok(assessment) => Some(assessment),
            Err(e) => {
                self.failed_cycles += 1;
                tracing::warn!(error = %e, "Processing cycle discarded");
                None
            }
        }
    }

    /// Run one cycle, returning the error instead of logging it.
    pub fn try_process(&mut self, frame: SensorFrame<'_>) -> Result<ThreatAssessment> {
        let started = Instant::now();

        let features = match frame.acoustic {
            Some(buffer) => self.fusion.extractor().extract(buffer)?,
            None => diveguard_signal::SpectralFeatures::insufficient(),
        };
        let fused = self
            .fusion
            .fuse_features(frame.range.as_ref(), &features, frame.heading_deg)?;
        let classification = self.classifier.classify(&features);
        let assessment = self.assessor.assess(&fused, &classification);

        if assessment.risk_level >= 1 {
            self.threats_detected += 1;
            if self.assessor.is_critical(&assessment) {
                self.critical_events += 1;
            }
        }

        let elapsed = started.elapsed();
        self.latencies.push(elapsed);
        tracing::debug!(latency_us = elapsed.as_micros() as u64, "Cycle complete");

        Ok(assessment)
    }

    /// Evasion maneuver for the latest assessment
    pub fn evasion_maneuver(&self, current_depth_m: f64) -> Option<EvasionManeuver> {
        self.assessor
            .last()
            .map(|a| self.assessor.get_evasion_maneuver(a, current_depth_m))
    }

    /// Latest smoothed classification
    pub fn classification(&self) -> VesselClassification {
        self.classifier.smoothed()
    }

    /// Fusion orchestrator
    pub fn fusion(&self) -> &FusionEngine {
        &self.fusion
    }

    /// Vessel classifier
    pub fn classifier(&self) -> &VesselClassifier {
        &self.classifier
    }

    /// Assessment engine
    pub fn assessor(&self) -> &ThreatAssessmentEngine {
        &self.assessor
    }

    /// Snapshot of the aggregate counters
    pub fn statistics(&self) -> PipelineStatistics {
        let (sum, max) = self
            .latencies
            .iter()
            .fold((Duration::ZERO, Duration::ZERO), |(sum, max), &d| (sum + d, max.max(d)));
        let avg_processing_ms = if self.latencies.is_empty() {
            0.0
        } else {
            sum.as_secs_f64() * 1000.0 / self.latencies.len() as f64
        };

        PipelineStatistics {
            threats_detected: self.threats_detected,
            critical_events: self.critical_events,
            failed_cycles: self.failed_cycles,
            avg_processing_ms,
            max_processing_ms: max.as_secs_f64() * 1000.0,
            fusion_history_len: self.fusion.history_len(),
            risk_trend: self.assessor.risk_trend(),
        }
    }

    /// Reset every component and counter
    pub fn reset(&mut self) {
        self.fusion.reset();
        self.classifier.reset();
        self.assessor.reset();
        self.threats_detected = 0;
        self.critical_events = 0;
        self.failed_cycles = 0;
        self.latencies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VesselType;
    use std::f64::consts::PI;

    fn boat_block(n: usize, cavitation: f64) -> Vec<i16> {
        (0..n)
            .map(|i| {
                let t = i as f64 / 48_000.0;
                let v = (2.0 * PI * 100.0 * t).sin()
                    + 0.5 * (2.0 * PI * 200.0 * t).sin()
                    + 0.3 * (2.0 * PI * 300.0 * t).sin()
                    + cavitation * (2.0 * PI * 15_000.0 * t).sin();
                (v * 0.3 * 32767.0) as i16
            })
            .collect()
    }

    #[test]
    fn test_cycle_produces_assessment_and_counts() {
        let mut pipeline = ThreatPipeline::new(DiveGuardConfig::default()).unwrap();
        let block = boat_block(4800, 0.2);
        let frame = SensorFrame::new(RangeBearing::new(200.0, 45.0, 0.0), AcousticBuffer::Pcm16(&block));

        let assessment = pipeline.process(frame).unwrap();
        assert!(assessment.risk_level >= 1);
        assert_ne!(assessment.vessel_type, VesselType::Unknown);
        assert_eq!(pipeline.classifier().history_len(), 1);

        let stats = pipeline.statistics();
        assert_eq!(stats.threats_detected, 1);
        assert_eq!(stats.failed_cycles, 0);
        assert_eq!(stats.fusion_history_len, 1);
        assert!(stats.max_processing_ms >= stats.avg_processing_ms);
        assert!(pipeline.evasion_maneuver(30.0).is_some());
    }

    #[test]
    fn test_failed_cycle_is_discarded() {
        let mut pipeline = ThreatPipeline::new(DiveGuardConfig::default()).unwrap();
        let block = boat_block(4800, 0.0);
        pipeline
            .process(SensorFrame::new(RangeBearing::new(80.0, 10.0, 0.0), AcousticBuffer::Pcm16(&block)))
            .unwrap();
        let state_before = pipeline.fusion().estimator().state().clone();
        let classifier_before = pipeline.classifier().history_len();

        let bad = SensorFrame::new(RangeBearing::new(f64::NAN, 10.0, 0.0), AcousticBuffer::Pcm16(&block));
        assert!(pipeline.process(bad).is_none());

        assert_eq!(pipeline.fusion().estimator().state(), &state_before);
        assert_eq!(pipeline.classifier().history_len(), classifier_before);
        let stats = pipeline.statistics();
        assert_eq!(stats.failed_cycles, 1);
        assert_eq!(stats.threats_detected, 1);
    }

    #[test]
    fn test_silence_yields_unknown_vessel() {
        let mut pipeline = ThreatPipeline::new(DiveGuardConfig::default()).unwrap();
        let frame = SensorFrame {
            range: Some(RangeBearing::new(300.0, 0.0, 0.0)),
            ..SensorFrame::default()
        };
        let assessment = pipeline.process(frame).unwrap();
        assert_eq!(assessment.vessel_type, VesselType::Unknown);
        assert!(pipeline.classification().is_unknown());

        pipeline.reset();
        assert_eq!(pipeline.statistics().threats_detected, 0);
        assert_eq!(pipeline.statistics().avg_processing_ms, 0.0);
    }
}
