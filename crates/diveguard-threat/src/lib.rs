//! # DiveGuard Threat
//!
//! Propeller collision-threat detection for diver-worn and autonomous
//! underwater platforms.
//!
//! The crate fuses ranging-sonar fixes and hydrophone acoustics into a single
//! kinematic estimate of the nearest vessel, classifies that vessel from its
//! propeller signature, and turns both into a risk level, a diver-facing
//! recommendation and, on demand, an evasive maneuver.
//!
//! ## Features
//!
//! - **Vessel Classification**: Transparent rule table over spectral features, smoothed over 5 blocks
//! - **Kinematic Tracking**: 6-state constant-velocity EKF with transactional updates
//! - **Sensor Fusion**: Predict / sonar update / Doppler update / compass correction per cycle
//! - **Threat Assessment**: Time-to-collision, 1-10 risk, probability, recommendation, evasion
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     diveguard-threat                      │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌────────────────┐  ┌──────────┐  ┌──────────────────┐  │
//! │  │ Classification │  │  Fusion  │  │    Assessment    │  │
//! │  │    Context     │  │ Context  │  │     Context      │  │
//! │  └───────┬────────┘  └────┬─────┘  └────────┬─────────┘  │
//! │          └────────────────┼─────────────────┘            │
//! │                  ┌────────▼────────┐                     │
//! │                  │ ThreatPipeline  │                     │
//! │                  └─────────────────┘                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use diveguard_signal::AcousticBuffer;
//! use diveguard_threat::{DiveGuardConfig, RangeBearing, SensorFrame, ThreatPipeline};
//!
//! # fn main() -> diveguard_threat::Result<()> {
//! let config = DiveGuardConfig::builder()
//!     .sample_rate_hz(48_000.0)
//!     .dt_secs(0.1)
//!     .build();
//! let mut pipeline = ThreatPipeline::new(config)?;
//!
//! let block: Vec<i16> = (0..4800)
//!     .map(|i| ((2.0 * std::f64::consts::PI * 100.0 * i as f64 / 48_000.0).sin() * 8000.0) as i16)
//!     .collect();
//! let frame = SensorFrame::new(RangeBearing::new(120.0, 45.0, 0.0), AcousticBuffer::Pcm16(&block));
//!
//! if let Some(assessment) = pipeline.process(frame) {
//!     println!("risk {}/10: {}", assessment.risk_level, assessment.recommendation);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod assessment;
pub mod classification;
pub mod domain;
pub mod fusion;
pub mod pipeline;
pub mod tracking;

pub use assessment::{AssessmentConfig, ThreatAssessmentEngine, ASSESSMENT_HISTORY};
pub use classification::{ClassifierConfig, VesselClassifier, CLASSIFIER_HISTORY};
pub use domain::{
    EvasionManeuver, FusedThreat, MeasurementError, Quadrant, RangeBearing, RecommendationTier,
    RiskTrend, SignatureTable, ThreatAssessment, Urgency, VesselClassification, VesselSignature,
    VesselType,
};
pub use fusion::{FusionConfig, FusionEngine, FUSION_HISTORY};
pub use pipeline::{PipelineStatistics, SensorFrame, ThreatPipeline, LATENCY_WINDOW};
pub use tracking::{EstimatorConfig, EstimatorError, KinematicEstimator, KinematicState};

use diveguard_signal::FeatureExtractorConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common result type for threat operations
pub type Result<T> = std::result::Result<T, ThreatError>;

/// Unified error type for threat operations
#[derive(Debug, thiserror::Error)]
pub enum ThreatError {
    /// Signal processing error
    #[error("Signal processing error: {0}")]
    Signal(#[from] diveguard_signal::SignalError),

    /// Estimator error
    #[error("Estimator error: {0}")]
    Estimator(#[from] EstimatorError),

    /// Malformed measurement
    #[error("Measurement error: {0}")]
    Measurement(#[from] MeasurementError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Configuration for the complete pipeline
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiveGuardConfig {
    /// Spectral feature extraction
    pub extractor: FeatureExtractorConfig,
    /// Vessel classifier
    pub classifier: ClassifierConfig,
    /// Kinematic estimator
    pub estimator: EstimatorConfig,
    /// Fusion orchestrator
    pub fusion: FusionConfig,
    /// Threat assessment
    pub assessment: AssessmentConfig,
}

impl DiveGuardConfig {
    /// Create a new configuration builder
    pub fn builder() -> DiveGuardConfigBuilder {
        DiveGuardConfigBuilder::default()
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.extractor.validate()?;
        self.classifier.validate()?;
        self.estimator.validate()?;
        self.fusion.validate()?;
        self.assessment.validate()
    }
}

/// Builder for DiveGuardConfig
#[derive(Debug, Default)]
pub struct DiveGuardConfigBuilder {
    config: DiveGuardConfig,
}

impl DiveGuardConfigBuilder {
    /// Set hydrophone sample rate
    pub fn sample_rate_hz(mut self, rate: f64) -> Self {
        self.config.extractor.sample_rate_hz = rate;
        self
    }

    /// Set the fusion cycle period
    pub fn dt_secs(mut self, dt: f64) -> Self {
        self.config.fusion.dt_secs = dt;
        self
    }

    /// Set the classifier confidence threshold
    pub fn confidence_threshold(mut self, threshold: f64) -> Self {
        self.config.classifier.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the estimator prior [x, y, z, vx, vy, vz]
    pub fn initial_state(mut self, state: [f64; 6]) -> Self {
        self.config.estimator.initial_state = state;
        self
    }

    /// Set the risk level counted as critical
    pub fn critical_risk_level(mut self, level: u8) -> Self {
        self.config.assessment.critical_risk_level = level.clamp(1, 10);
        self
    }

    /// Replace the feature extractor section
    pub fn extractor(mut self, extractor: FeatureExtractorConfig) -> Self {
        self.config.extractor = extractor;
        self
    }

    /// Replace the estimator section
    pub fn estimator(mut self, estimator: EstimatorConfig) -> Self {
        self.config.estimator = estimator;
        self
    }

    /// Replace the assessment section
    pub fn assessment(mut self, assessment: AssessmentConfig) -> Self {
        self.config.assessment = assessment;
        self
    }

    /// Build the configuration
    pub fn build(self) -> DiveGuardConfig {
        self.config
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        DiveGuardConfig, EvasionManeuver, FusedThreat, RangeBearing, Result, SensorFrame,
        ThreatAssessment, ThreatError, ThreatPipeline, VesselClassification, VesselType,
    };
    pub use diveguard_signal::AcousticBuffer;
}
