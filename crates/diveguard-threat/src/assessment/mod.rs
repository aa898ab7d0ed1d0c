//! Collision threat assessment.
//!
//! - [`risk`]: time-to-collision, risk level and probability functions
//! - [`engine`]: stateful engine with history, recommendations and evasion

pub mod engine;
pub mod risk;

pub use engine::{AssessmentConfig, ThreatAssessmentEngine, ASSESSMENT_HISTORY};
pub use risk::{
    adjust_risk, base_risk, threat_probability, time_to_collision, DEFAULT_CLOSING_FLOOR_MPS,
};
