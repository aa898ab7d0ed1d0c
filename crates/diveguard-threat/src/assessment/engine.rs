//! Threat assessment engine.
//!
//! Combines the fused kinematic state with the vessel classification into a
//! [`ThreatAssessment`], keeps the last [`ASSESSMENT_HISTORY`] assessments
//! for trend queries, and derives evasive maneuvers on demand.

use super::risk::{
    adjust_risk, base_risk, threat_probability, time_to_collision, DEFAULT_CLOSING_FLOOR_MPS,
};
use crate::domain::{
    normalize_degrees, EvasionManeuver, FusedThreat, Quadrant, RecommendationTier, RingBuffer,
    RiskTrend, ThreatAssessment, Urgency, VesselClassification,
};
use crate::{Result, ThreatError};

/// Assessments retained for trend queries
pub const ASSESSMENT_HISTORY: usize = 10;

/// Configuration for threat assessment and evasion
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssessmentConfig {
    /// Closing speed at or below which time-to-collision is infinite (m/s)
    pub closing_speed_floor_mps: f64,
    /// Depth added when the threat is above (m)
    pub dive_offset_m: f64,
    /// Depth removed when the threat is below (m)
    pub climb_offset_m: f64,
    /// Elevation beyond which the maneuver changes depth (degrees)
    pub elevation_threshold_deg: f64,
    /// Pitch magnitude for depth changes (degrees)
    pub pitch_deg: f64,
    /// Risk level counted as a critical event
    pub critical_risk_level: u8,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            closing_speed_floor_mps: DEFAULT_CLOSING_FLOOR_MPS,
            dive_offset_m: 20.0,
            climb_offset_m: 10.0,
            elevation_threshold_deg: 30.0,
            pitch_deg: 10.0,
            critical_risk_level: 8,
        }
    }
}

impl AssessmentConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.closing_speed_floor_mps,
            self.dive_offset_m,
            self.climb_offset_m,
            self.elevation_threshold_deg,
            self.pitch_deg,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ThreatError::Config("assessment parameters must be finite".into()));
        }
        if !(1..=10).contains(&self.critical_risk_level) {
            return Err(ThreatError::Config(format!(
                "critical risk level {} outside 1-10",
                self.critical_risk_level
            )));
        }
        Ok(())
    }
}

/// Computes time-to-collision, risk, probability and recommendations
#[derive(Debug, Clone)]
pub struct ThreatAssessmentEngine {
    config: AssessmentConfig,
    history: RingBuffer<ThreatAssessment, ASSESSMENT_HISTORY>,
}

impl ThreatAssessmentEngine {
    /// Create an engine
    pub fn new(config: AssessmentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            history: RingBuffer::new(),
        })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: AssessmentConfig::default(),
            history: RingBuffer::new(),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    /// Assess one fused state against one classification.
    pub fn assess(
        &mut self,
        state: &FusedThreat,
        classification: &VesselClassification,
    ) -> ThreatAssessment {
        let assessment = self.evaluate(state, classification);
        tracing::info!(
            vessel = %assessment.vessel_type,
            distance_m = assessment.distance_m,
            ttc_secs = assessment.time_to_collision_secs,
            risk = assessment.risk_level,
            "Threat assessed"
        );
        self.history.push(assessment.clone());
        assessment
    }

    /// Same as [`assess`](Self::assess) without recording history.
    pub fn evaluate(
        &self,
        state: &FusedThreat,
        classification: &VesselClassification,
    ) -> ThreatAssessment {
        let floor = self.config.closing_speed_floor_mps;
        let vessel = classification.vessel_type;
        let closing = state.closing_speed_mps;

        let ttc = time_to_collision(state.distance_m, closing, floor);
        let risk_level = adjust_risk(base_risk(ttc), vessel, closing, classification.cavitation_level);
        let threat_probability = threat_probability(ttc, closing, vessel, floor);

        let tier = RecommendationTier::select(risk_level, ttc);
        let recommendation = tier.render(vessel, Quadrant::from_azimuth(state.azimuth_deg), ttc);

        ThreatAssessment {
            distance_m: state.distance_m,
            azimuth_deg: state.azimuth_deg,
            elevation_deg: state.elevation_deg,
            closing_speed_mps: closing,
            time_to_collision_secs: ttc,
            risk_level,
            vessel_type: vessel,
            threat_probability,
            tier,
            recommendation,
        }
    }

    /// Maneuver directly away from the threat, changing depth when it
    /// approaches steeply from above or below.
    pub fn get_evasion_maneuver(
        &self,
        assessment: &ThreatAssessment,
        current_depth_m: f64,
    ) -> EvasionManeuver {
        let threshold = self.config.elevation_threshold_deg;
        let (depth_m, pitch_deg) = if assessment.elevation_deg > threshold {
            (current_depth_m + self.config.dive_offset_m, -self.config.pitch_deg)
        } else if assessment.elevation_deg < -threshold {
            (current_depth_m - self.config.climb_offset_m, self.config.pitch_deg)
        } else {
            (current_depth_m, 0.0)
        };
        let urgency = Urgency::from_risk(assessment.risk_level);

        EvasionManeuver {
            yaw_deg: normalize_degrees(assessment.azimuth_deg + 180.0),
            pitch_deg,
            depth_m,
            speed_percent: urgency.speed_percent(),
            urgency,
        }
    }

    /// True when `assessment` counts as a critical event
    pub fn is_critical(&self, assessment: &ThreatAssessment) -> bool {
        assessment.risk_level >= self.config.critical_risk_level
    }

    /// Latest risk compared with the oldest retained one
    pub fn risk_trend(&self) -> RiskTrend {
        match (self.history.oldest(), self.history.latest()) {
            (Some(first), Some(last)) if self.history.len() >= 2 => {
                match last.risk_level.cmp(&first.risk_level) {
                    std::cmp::Ordering::Greater => RiskTrend::Escalating,
                    std::cmp::Ordering::Less => RiskTrend::Easing,
                    std::cmp::Ordering::Equal => RiskTrend::Steady,
                }
            }
            _ => RiskTrend::Steady,
        }
    }

    /// Previous assessment
    pub fn last(&self) -> Option<&ThreatAssessment> {
        self.history.latest()
    }

    /// Retained assessments, oldest first
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &ThreatAssessment> + '_ {
        self.history.iter()
    }

    /// Drop the history
    pub fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VesselType;

    fn state(distance: f64, azimuth: f64, elevation: f64, closing: f64) -> FusedThreat {
        FusedThreat {
            distance_m: distance,
            azimuth_deg: azimuth,
            elevation_deg: elevation,
            closing_speed_mps: closing,
            confidence: 0.85,
            timestamp_secs: 0.0,
        }
    }

    fn classification(vessel: VesselType, cavitation: f64) -> VesselClassification {
        VesselClassification {
            vessel_type: vessel,
            confidence: 0.88,
            rpm_estimate: 1500.0,
            blade_count: 4,
            cavitation_level: cavitation,
            threat_level: 6,
        }
    }

    #[test]
    fn test_receding_vessel_is_informational() {
        let mut engine = ThreatAssessmentEngine::with_defaults();
        let a = engine.assess(&state(500.0, 90.0, 0.0, -1.0), &classification(VesselType::Ship, 0.0));

        assert!(a.time_to_collision_secs.is_infinite());
        assert_eq!(a.risk_level, 1);
        assert_eq!(a.tier, RecommendationTier::Informational);
        assert!(!a.on_collision_course());
    }

    #[test]
    fn test_approaching_boat() {
        let mut engine = ThreatAssessmentEngine::with_defaults();
        let a = engine.assess(&state(100.0, 30.0, 0.0, 3.5), &classification(VesselType::Boat, 0.25));

        assert!((a.time_to_collision_secs - 28.571428571428573).abs() < 1e-9);
        assert_eq!(a.risk_level, 8);
        assert!((a.threat_probability - 0.40).abs() < 1e-12);
        assert_eq!(a.tier, RecommendationTier::PrepareToManeuver);
        assert_eq!(a.quadrant(), Quadrant::Front);
    }

    #[test]
    fn test_evasion_from_above() {
        let engine = ThreatAssessmentEngine::with_defaults();
        let a = engine.evaluate(&state(20.0, 30.0, 45.0, 6.0), &classification(VesselType::Boat, 0.5));
        let m = engine.get_evasion_maneuver(&a, 50.0);

        assert!((m.yaw_deg - 210.0).abs() < 1e-12);
        assert_eq!(m.depth_m, 70.0);
        assert_eq!(m.pitch_deg, -10.0);
        assert_eq!(m.urgency, Urgency::Emergency);
        assert_eq!(m.speed_percent, 100);
    }

    #[test]
    fn test_evasion_from_below_and_level() {
        let engine = ThreatAssessmentEngine::with_defaults();
        let below = engine.evaluate(&state(100.0, 300.0, -40.0, 1.0), &classification(VesselType::Rov, 0.0));
        let m = engine.get_evasion_maneuver(&below, 50.0);
        assert!((m.yaw_deg - 120.0).abs() < 1e-12);
        assert_eq!(m.depth_m, 40.0);
        assert_eq!(m.pitch_deg, 10.0);
        assert_eq!(m.urgency, Urgency::Slow);

        let level = engine.evaluate(&state(100.0, 180.0, 30.0, 1.0), &classification(VesselType::Ship, 0.0));
        let m = engine.get_evasion_maneuver(&level, 12.0);
        assert_eq!(m.yaw_deg, 0.0);
        assert_eq!(m.depth_m, 12.0);
        assert_eq!(m.pitch_deg, 0.0);
    }

    #[test]
    fn test_history_and_trend() {
        let mut engine = ThreatAssessmentEngine::with_defaults();
        assert_eq!(engine.risk_trend(), RiskTrend::Steady);

        let boat = classification(VesselType::Boat, 0.0);
        for distance in [400.0, 300.0, 200.0, 100.0, 20.0] {
            engine.assess(&state(distance, 0.0, 0.0, 2.0), &boat);
        }
        assert_eq!(engine.risk_trend(), RiskTrend::Escalating);
        assert_eq!(engine.last().map(|a| a.risk_level), Some(8));

        for _ in 0..ASSESSMENT_HISTORY {
            engine.assess(&state(500.0, 0.0, 0.0, -1.0), &boat);
        }
        assert_eq!(engine.history().count(), ASSESSMENT_HISTORY);
        assert_eq!(engine.risk_trend(), RiskTrend::Steady);

        engine.assess(&state(5.0, 0.0, 0.0, 2.0), &boat);
        engine.reset();
        assert!(engine.last().is_none());
    }

    #[test]
    fn test_easing_trend_and_critical_flag() {
        let mut engine = ThreatAssessmentEngine::with_defaults();
        let sub = classification(VesselType::Submarine, 0.4);
        let first = engine.assess(&state(10.0, 0.0, 0.0, 5.0), &sub);
        assert!(engine.is_critical(&first));

        engine.assess(&state(500.0, 0.0, 0.0, -2.0), &classification(VesselType::Auv, 0.0));
        assert_eq!(engine.risk_trend(), RiskTrend::Easing);
    }
}
