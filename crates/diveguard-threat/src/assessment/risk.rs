//! Collision timing, risk level and threat probability.

use crate::domain::VesselType;

/// Closing speed at or below which a target is treated as not approaching (m/s)
pub const DEFAULT_CLOSING_FLOOR_MPS: f64 = 0.1;

/// Probability ceiling after speed / vessel boosts
const PROBABILITY_CAP: f64 = 0.99;

/// `distance / closing_speed`, infinite unless closing faster than `floor`
pub fn time_to_collision(distance_m: f64, closing_speed_mps: f64, floor_mps: f64) -> f64 {
    if closing_speed_mps > floor_mps {
        distance_m / closing_speed_mps
    } else {
        f64::INFINITY
    }
}

/// Step function of time-to-collision, 1-10
pub fn base_risk(ttc_secs: f64) -> u8 {
    match ttc_secs {
        t if t < 5.0 => 10,
        t if t < 15.0 => 8,
        t if t < 30.0 => 6,
        t if t < 60.0 => 4,
        t if t < 120.0 => 2,
        _ => 1,
    }
}

/// Vessel-specific adjustment of a base risk, clamped to [1, 10]
pub fn adjust_risk(base: u8, vessel: VesselType, closing_speed_mps: f64, cavitation: f64) -> u8 {
    let mut risk = i16::from(base);
    match vessel {
        VesselType::Submarine => {
            risk = (risk + 2).min(10);
            if cavitation > 0.3 {
                risk = 10;
            }
        }
        VesselType::Ship => {
            if closing_speed_mps > 5.0 {
                risk += 1;
            }
        }
        VesselType::Boat => {
            if closing_speed_mps > 3.0 {
                risk += 1;
            }
            if cavitation > 0.2 {
                risk += 1;
            }
        }
        VesselType::Rov | VesselType::Auv => risk -= 1,
        VesselType::Unknown => {}
    }
    risk.clamp(1, 10) as u8
}

/// Probability in [0, 1] that the target is a genuine collision threat
pub fn threat_probability(
    ttc_secs: f64,
    closing_speed_mps: f64,
    vessel: VesselType,
    floor_mps: f64,
) -> f64 {
    let mut p: f64 = match ttc_secs {
        t if t < 5.0 => 0.95,
        t if t < 15.0 => 0.70,
        t if t < 60.0 => 0.40,
        t if t < 300.0 => 0.10,
        _ => 0.01,
    };

    if closing_speed_mps < floor_mps {
        p *= 0.1;
    } else if closing_speed_mps > 5.0 {
        p = (p * 1.5).min(PROBABILITY_CAP);
    }

    match vessel {
        VesselType::Submarine => p = (p * 1.3).min(PROBABILITY_CAP),
        VesselType::Rov | VesselType::Auv => p *= 0.5,
        _ => {}
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttc_floor() {
        assert!((time_to_collision(100.0, 3.5, 0.1) - 28.571428571428573).abs() < 1e-9);
        assert!(time_to_collision(100.0, 0.1, 0.1).is_infinite());
        assert!(time_to_collision(500.0, -1.0, 0.1).is_infinite());
    }

    #[test]
    fn test_base_risk_steps() {
        assert_eq!(base_risk(0.0), 10);
        assert_eq!(base_risk(4.99), 10);
        assert_eq!(base_risk(5.0), 8);
        assert_eq!(base_risk(15.0), 6);
        assert_eq!(base_risk(30.0), 4);
        assert_eq!(base_risk(60.0), 2);
        assert_eq!(base_risk(120.0), 1);
        assert_eq!(base_risk(f64::INFINITY), 1);
    }

    #[test]
    fn test_base_risk_is_monotone() {
        let mut last = u8::MAX;
        for i in 0..2000 {
            let risk = base_risk(i as f64 * 0.1);
            assert!(risk <= last);
            last = risk;
        }
    }

    #[test]
    fn test_vessel_adjustments() {
        assert_eq!(adjust_risk(6, VesselType::Boat, 3.5, 0.25), 8);
        assert_eq!(adjust_risk(6, VesselType::Boat, 3.0, 0.2), 6);
        assert_eq!(adjust_risk(10, VesselType::Boat, 9.0, 0.9), 10);
        assert_eq!(adjust_risk(6, VesselType::Submarine, 1.0, 0.0), 8);
        assert_eq!(adjust_risk(1, VesselType::Submarine, 0.0, 0.31), 10);
        assert_eq!(adjust_risk(4, VesselType::Ship, 5.1, 0.0), 5);
        assert_eq!(adjust_risk(4, VesselType::Ship, 5.0, 0.0), 4);
        assert_eq!(adjust_risk(1, VesselType::Rov, 9.0, 0.0), 1);
        assert_eq!(adjust_risk(8, VesselType::Auv, 9.0, 0.0), 7);
        assert_eq!(adjust_risk(6, VesselType::Unknown, 9.0, 0.9), 6);
    }

    #[test]
    fn test_probability_modifiers() {
        // receding: 0.01 · 0.1
        let p = threat_probability(f64::INFINITY, -1.0, VesselType::Boat, 0.1);
        assert!((p - 0.001).abs() < 1e-12);

        let p = threat_probability(28.6, 3.5, VesselType::Boat, 0.1);
        assert!((p - 0.40).abs() < 1e-12);

        // fast and critical: 0.95 · 1.5 capped
        let p = threat_probability(2.0, 10.0, VesselType::Ship, 0.1);
        assert!((p - 0.99).abs() < 1e-12);

        let p = threat_probability(10.0, 1.0, VesselType::Submarine, 0.1);
        assert!((p - 0.91).abs() < 1e-12);

        let p = threat_probability(10.0, 1.0, VesselType::Rov, 0.1);
        assert!((p - 0.35).abs() < 1e-12);
    }
}
