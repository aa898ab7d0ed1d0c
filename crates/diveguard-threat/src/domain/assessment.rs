//! Threat assessment records and evasive maneuver commands.

use super::vessel::VesselType;

/// Compass quadrant of a threat relative to the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Quadrant {
    /// Azimuth below 45° or above 315°
    Front,
    /// 45° to 135°
    Right,
    /// 135° to 225°
    Behind,
    /// 225° to 315°
    Left,
}

impl Quadrant {
    /// Quadrant of an azimuth in degrees
    pub fn from_azimuth(azimuth_deg: f64) -> Self {
        if azimuth_deg < 45.0 || azimuth_deg > 315.0 {
            Quadrant::Front
        } else if azimuth_deg < 135.0 {
            Quadrant::Right
        } else if azimuth_deg < 225.0 {
            Quadrant::Behind
        } else {
            Quadrant::Left
        }
    }

    /// Phrase used in recommendations
    pub fn phrase(&self) -> &'static str {
        match self {
            Quadrant::Front => "ahead",
            Quadrant::Right => "to starboard",
            Quadrant::Behind => "astern",
            Quadrant::Left => "to port",
        }
    }
}

/// Severity tier of the recommendation text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecommendationTier {
    /// Risk below 3
    Informational,
    /// Risk 3-4
    LowRisk,
    /// Risk 5-6
    Monitor,
    /// Risk 7-8 with time to spare
    PrepareToManeuver,
    /// Risk 7-8 and under 10 s to collision
    HighRiskEvade,
    /// Risk 9 and above
    Critical,
}

impl RecommendationTier {
    /// Tier for a risk level and time-to-collision
    pub fn select(risk_level: u8, ttc_secs: f64) -> Self {
        if risk_level >= 9 {
            RecommendationTier::Critical
        } else if risk_level >= 7 {
            if ttc_secs < 10.0 {
                RecommendationTier::HighRiskEvade
            } else {
                RecommendationTier::PrepareToManeuver
            }
        } else if risk_level >= 5 {
            RecommendationTier::Monitor
        } else if risk_level >= 3 {
            RecommendationTier::LowRisk
        } else {
            RecommendationTier::Informational
        }
    }

    /// Render the diver-facing message
    pub fn render(&self, vessel: VesselType, quadrant: Quadrant, ttc_secs: f64) -> String {
        let dir = quadrant.phrase();
        match self {
            RecommendationTier::Critical => format!(
                "CRITICAL! {} closing {} at speed! EVADE IMMEDIATELY!",
                vessel.as_str().to_uppercase(),
                dir
            ),
            RecommendationTier::HighRiskEvade => format!(
                "HIGH RISK! {} approaching {} (TTC {:.1}s). EVADE!",
                vessel, dir, ttc_secs
            ),
            RecommendationTier::PrepareToManeuver => {
                format!("RISK: {} detected {}. Prepare to maneuver.", vessel, dir)
            }
            RecommendationTier::Monitor => {
                format!("MEDIUM RISK: {} at distance, {}. Monitor.", vessel, dir)
            }
            RecommendationTier::LowRisk => {
                format!("LOW RISK: {} detected {}. Stay alert.", vessel, dir)
            }
            RecommendationTier::Informational => {
                format!("Vessel detected {}, no danger.", dir)
            }
        }
    }
}

impl std::fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RecommendationTier::Informational => "INFO",
            RecommendationTier::LowRisk => "LOW",
            RecommendationTier::Monitor => "MEDIUM",
            RecommendationTier::PrepareToManeuver => "HIGH",
            RecommendationTier::HighRiskEvade => "HIGH (EVADE)",
            RecommendationTier::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

/// Full collision threat assessment for one cycle
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreatAssessment {
    /// Distance to threat (m)
    pub distance_m: f64,
    /// Azimuth (degrees)
    pub azimuth_deg: f64,
    /// Elevation (degrees)
    pub elevation_deg: f64,
    /// Closing speed (m/s)
    pub closing_speed_mps: f64,
    /// Time to collision (s), infinite when not closing
    pub time_to_collision_secs: f64,
    /// Risk level 1-10
    pub risk_level: u8,
    /// Classified vessel
    pub vessel_type: VesselType,
    /// Threat probability in [0, 1]
    pub threat_probability: f64,
    /// Recommendation severity
    pub tier: RecommendationTier,
    /// Recommendation text
    pub recommendation: String,
}

impl ThreatAssessment {
    /// Quadrant the threat sits in
    pub fn quadrant(&self) -> Quadrant {
        Quadrant::from_azimuth(self.azimuth_deg)
    }

    /// True when a finite time-to-collision exists
    pub fn on_collision_course(&self) -> bool {
        self.time_to_collision_secs.is_finite()
    }
}

/// Maneuver speed tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Urgency {
    /// 40 % speed
    Slow,
    /// 60 % speed
    Normal,
    /// 80 % speed
    Fast,
    /// Full speed
    Emergency,
}

impl Urgency {
    /// Urgency for a risk level
    pub fn from_risk(risk_level: u8) -> Self {
        match risk_level {
            9.. => Urgency::Emergency,
            7..=8 => Urgency::Fast,
            5..=6 => Urgency::Normal,
            _ => Urgency::Slow,
        }
    }

    /// Commanded speed, percent of maximum
    pub fn speed_percent(&self) -> u8 {
        match self {
            Urgency::Slow => 40,
            Urgency::Normal => 60,
            Urgency::Fast => 80,
            Urgency::Emergency => 100,
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Slow => write!(f, "slow"),
            Urgency::Normal => write!(f, "normal"),
            Urgency::Fast => write!(f, "fast"),
            Urgency::Emergency => write!(f, "emergency"),
        }
    }
}

/// Evasive maneuver command for the navigation layer
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvasionManeuver {
    /// Target yaw, directly away from the threat (degrees)
    pub yaw_deg: f64,
    /// Target pitch, negative is nose down (degrees)
    pub pitch_deg: f64,
    /// Target depth (m)
    pub depth_m: f64,
    /// Commanded speed (percent)
    pub speed_percent: u8,
    /// Speed tier
    pub urgency: Urgency,
}

/// Direction of risk across the assessment history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RiskTrend {
    /// Latest risk above the oldest retained
    Escalating,
    /// No change, or fewer than two assessments
    Steady,
    /// Latest risk below the oldest retained
    Easing,
}

impl std::fmt::Display for RiskTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTrend::Escalating => write!(f, "escalating"),
            RiskTrend::Steady => write!(f, "steady"),
            RiskTrend::Easing => write!(f, "easing"),
        }
    }
}
