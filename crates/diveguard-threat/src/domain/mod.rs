//! Domain model for threat detection.
//!
//! This module contains the value types shared by the classifier, the
//! estimator and the assessment engine:
//!
//! - **Vessel**: archetypes, signature table, classifications
//! - **Kinematics**: sensor readings and the fused threat view
//! - **Assessment**: risk assessments and evasive maneuvers
//! - **History**: fixed-capacity ring used for bounded histories

pub mod assessment;
pub mod history;
pub mod kinematics;
pub mod vessel;

pub use assessment::{
    EvasionManeuver, Quadrant, RecommendationTier, RiskTrend, ThreatAssessment, Urgency,
};
pub use history::RingBuffer;
pub use kinematics::{
    absolute_azimuth, normalize_degrees, spherical_to_cartesian, validate_heading, FusedThreat,
    MeasurementError, RangeBearing,
};
pub use vessel::{
    Band, SignatureTable, VesselClassification, VesselSignature, VesselType, DEFAULT_BLADE_COUNT,
};
